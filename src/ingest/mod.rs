//! Line ingestion: read a watcher log, parse each line, and feed the monitor.

pub mod parse;

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};
use tracing::{debug, info};

use crate::monitor::BeaconMonitor;

pub use self::parse::{parse_line, BeaconEvent, LineFormat};

/// Why a log line was not usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing {0} field")]
    MissingField(&'static str),
    #[error("invalid date '{0}'")]
    InvalidDate(String),
    #[error("invalid time '{0}'")]
    InvalidTime(String),
}

#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub format: LineFormat,
    /// Copy every input line to stdout before processing it.
    pub echo: bool,
}

/// Counters for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub lines_read: u64,
    pub events_recorded: u64,
    pub lines_skipped: u64,
}

/// Read `reader` to EOF, recording every parseable line in `monitor`.
///
/// Malformed lines are counted and dropped. The monitor lock is held for
/// one event at a time, so a concurrent sweep can interleave freely.
pub async fn ingest<R>(
    mut reader: R,
    monitor: &BeaconMonitor,
    options: &IngestOptions,
) -> Result<IngestStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = IngestStats::default();
    let mut stdout = tokio::io::stdout();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .with_context(|| format!("failed to read line {}", stats.lines_read + 1))?;
        if n == 0 {
            break;
        }
        stats.lines_read += 1;

        if options.echo {
            stdout.write_all(&buf).await.context("failed to echo input line")?;
            stdout.flush().await?;
        }

        let line = String::from_utf8_lossy(&buf);
        match parse_line(&line, options.format) {
            Ok(event) => {
                monitor.record_event(&event.server, event.time).await;
                stats.events_recorded += 1;
            }
            Err(e) => {
                debug!(line = stats.lines_read, error = %e, "skipping line");
                stats.lines_skipped += 1;
            }
        }
    }

    info!(
        lines = stats.lines_read,
        events = stats.events_recorded,
        skipped = stats.lines_skipped,
        "input exhausted"
    );
    Ok(stats)
}
