//! Human-readable rendering of reports.

use std::fmt::{self, Write};

use crate::detect::{elapsed_secs, Monotonicity, Timestamp};

use super::{GroupReport, Report, ServerReport};

/// How much detail to print per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// One line per group.
    Terse,
    #[default]
    Normal,
    /// Full statistics.
    Verbose,
}

fn stamp(time: Timestamp) -> String {
    time.format("%b %d %H:%M:%S").to_string()
}

/// `12.00 sec = 0.20 min = 0.00 hours`
pub fn format_duration(secs: f64) -> String {
    format!(
        "{:.2} sec = {:.2} min = {:.2} hours",
        secs,
        secs / 60.0,
        secs / 3600.0
    )
}

fn out_of_order_note(group: &GroupReport) -> String {
    if group.out_of_order > 0 {
        format!(" ({} event(s) out of order)", group.out_of_order)
    } else {
        String::new()
    }
}

fn stats_line(group: &GroupReport) -> String {
    let trend = match group.monotonicity {
        Monotonicity::MonotonicIncreasing => " Monotonically increasing",
        Monotonicity::MonotonicDecreasing => " Monotonically decreasing",
        Monotonicity::None | Monotonicity::Mixed => "",
    };
    format!(
        "Mean={:.2} Sigma={:.2} Min={:.2} Max={:.2} Increasing={}{}",
        group.mean, group.std_dev, group.min, group.max, group.increasing, trend
    )
}

/// Write one group in the by-group layout.
pub fn write_group(out: &mut impl Write, group: &GroupReport, verbosity: Verbosity) -> fmt::Result {
    let start = stamp(group.first_time);
    match verbosity {
        Verbosity::Terse => writeln!(out, "{} {} {}", group.server, start, group.label),
        Verbosity::Normal => {
            writeln!(out, "\n{}\n {}", group.server, group.label)?;
            if group.event_count == 1 {
                writeln!(out, " {} {} event(s)", start, group.event_count)
            } else {
                writeln!(
                    out,
                    " {} {} event(s) for {}",
                    start,
                    group.event_count,
                    format_duration(group.duration_secs)
                )
            }
        }
        Verbosity::Verbose => {
            writeln!(out, "\n{}\n {}", group.server, group.label)?;
            writeln!(out, " {} event(s){}", group.event_count, out_of_order_note(group))?;
            writeln!(
                out,
                " {} to {} ({})",
                start,
                stamp(group.last_time),
                format_duration(group.duration_secs)
            )?;
            if group.event_count > 1 {
                writeln!(out, " {}", stats_line(group))?;
            }
            Ok(())
        }
    }
}

/// Write one server block in the by-server layout.
pub fn write_server(
    out: &mut impl Write,
    server: &ServerReport,
    verbosity: Verbosity,
) -> fmt::Result {
    writeln!(out, "\n{}", server.server)?;
    if verbosity == Verbosity::Verbose {
        let span = elapsed_secs(server.last_seen, server.first_seen);
        writeln!(
            out,
            " {} to {} ({})",
            stamp(server.first_seen),
            stamp(server.last_seen),
            format_duration(span)
        )?;
    }
    writeln!(out, " {} group(s) of beacon anomalies", server.groups.len())?;

    for (i, group) in server.groups.iter().enumerate() {
        writeln!(
            out,
            " Group {}: {} event(s){}",
            i + 1,
            group.event_count,
            out_of_order_note(group)
        )?;
        let start = stamp(group.first_time);
        match verbosity {
            Verbosity::Terse | Verbosity::Normal => {
                writeln!(out, "  {} {}", start, group.label)?;
            }
            Verbosity::Verbose if group.event_count == 1 => {
                writeln!(out, "  {}\n  {}", group.label, start)?;
            }
            Verbosity::Verbose => {
                writeln!(out, "  {}", group.label)?;
                writeln!(
                    out,
                    "  {} to {} ({})",
                    start,
                    stamp(group.last_time),
                    format_duration(group.duration_secs)
                )?;
                writeln!(out, "  {}", stats_line(group))?;
            }
        }
    }
    Ok(())
}

/// Write a whole report.
pub fn write_report(out: &mut impl Write, report: &Report, verbosity: Verbosity) -> fmt::Result {
    match report {
        Report::ByGroup(groups) => groups
            .iter()
            .try_for_each(|group| write_group(out, group, verbosity)),
        Report::ByServer(servers) => servers
            .iter()
            .try_for_each(|server| write_server(out, server, verbosity)),
    }
}

/// Render a whole report as text.
pub fn render(report: &Report, verbosity: Verbosity) -> String {
    let mut out = String::new();
    // Formatting into a String cannot fail.
    let _ = write_report(&mut out, report, verbosity);
    out
}
