//! Parsing of watcher log lines into beacon events.

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::ParseError;
use crate::detect::Timestamp;

/// Layout of the input log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineFormat {
    /// `ioclic1:5064   2004-05-18 12:17:02.418826640`
    #[default]
    Casw,
    /// `iocs3vp:5064  2004/05/12 00:08:08.0134  2004/05/12 00:08:08.0000`
    Oag,
}

impl LineFormat {
    fn date_separator(&self) -> char {
        match self {
            LineFormat::Casw => '-',
            LineFormat::Oag => '/',
        }
    }
}

/// One beacon anomaly reported by the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconEvent {
    pub server: String,
    pub time: Timestamp,
}

/// Parse `<server> <date> <time>`; anything after the third field is ignored.
pub fn parse_line(line: &str, format: LineFormat) -> Result<BeaconEvent, ParseError> {
    let mut fields = line.split_whitespace();
    let server = fields.next().ok_or(ParseError::MissingField("server"))?;
    let date = fields.next().ok_or(ParseError::MissingField("date"))?;
    let time = fields.next().ok_or(ParseError::MissingField("time"))?;

    let date = parse_date(date, format.date_separator())?;
    let (clock, nanos) = parse_clock(time)?;
    // A fraction that rounds up can carry past the last representable instant.
    let time = date
        .and_time(clock)
        .checked_add_signed(Duration::nanoseconds(nanos))
        .ok_or_else(|| ParseError::InvalidTime(time.to_string()))?;

    Ok(BeaconEvent {
        server: server.to_string(),
        time,
    })
}

fn parse_date(field: &str, separator: char) -> Result<NaiveDate, ParseError> {
    let invalid = || ParseError::InvalidDate(field.to_string());
    let mut parts = field.split(separator);
    let (Some(y), Some(m), Some(d), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let month: u32 = m.parse().map_err(|_| invalid())?;
    let day: u32 = d.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Whole-second clock time plus the fractional part in nanoseconds.
fn parse_clock(field: &str) -> Result<(NaiveTime, i64), ParseError> {
    let invalid = || ParseError::InvalidTime(field.to_string());
    let mut parts = field.split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let hour: u32 = h.parse().map_err(|_| invalid())?;
    let minute: u32 = m.parse().map_err(|_| invalid())?;
    let secs: f64 = s.parse().map_err(|_| invalid())?;
    if !secs.is_finite() || !(0.0..60.0).contains(&secs) {
        return Err(invalid());
    }

    let whole = secs.trunc();
    // Rounded to the nearest nanosecond.
    let nanos = ((secs - whole) * 1e9 + 0.5) as i64;
    let clock = NaiveTime::from_hms_opt(hour, minute, whole as u32).ok_or_else(invalid)?;
    Ok((clock, nanos))
}
