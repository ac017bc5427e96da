//! beaconwatch -- groups and classifies server beacon anomalies.
//!
//! This crate reads the output of a beacon-anomaly watcher (CASW or the OAG
//! data logger), splits each server's events into runs separated by quiet
//! gaps, keeps running interval statistics per run, and classifies each run
//! (server coming up, regular beacons, out-of-order data, ...). It works
//! either as a batch post-processor over a file or live over stdin with a
//! periodic sweep that reports and forgets finished runs.

pub mod config;
pub mod detect;
pub mod ingest;
pub mod monitor;
pub mod report;
pub mod scheduler;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing::{error, info};

use crate::config::MonitorConfig;
use crate::ingest::{IngestOptions, IngestStats};
use crate::monitor::BeaconMonitor;
use crate::report::format::{render, Verbosity};
use crate::report::{Report, ReportMode};

/// How reports are written to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Printer {
    pub verbosity: Verbosity,
    /// Emit JSON instead of text.
    pub json: bool,
}

impl Printer {
    pub fn print(&self, report: &Report) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        if self.json {
            let doc = serde_json::to_string(report)?;
            writeln!(stdout, "{}", doc)?;
        } else {
            write!(stdout, "{}", render(report, self.verbosity))?;
        }
        stdout.flush()?;
        Ok(())
    }
}

/// Everything a run needs beyond the monitor configuration.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Log file to post-process. `None` reads stdin in live mode.
    pub input: Option<PathBuf>,
    /// Batch output layout: one block per server instead of per group.
    pub by_server: bool,
    pub echo: bool,
    pub printer: Printer,
}

/// Run beaconwatch in batch mode (file input) or live mode (stdin).
pub async fn run(config: MonitorConfig, options: RunOptions) -> Result<IngestStats> {
    config.validate()?;
    let ingest_options = IngestOptions {
        format: config.grouping.format,
        echo: options.echo,
    };
    let printer = options.printer;

    let stats = match &options.input {
        Some(path) => {
            info!(path = %path.display(), "batch mode");
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("cannot read file: {}", path.display()))?;
            let monitor = BeaconMonitor::new(config);
            let stats = ingest::ingest(BufReader::new(file), &monitor, &ingest_options).await?;

            let mode = if options.by_server {
                ReportMode::ByServer
            } else {
                ReportMode::ByGroup
            };
            printer.print(&monitor.report(mode).await)?;
            stats
        }
        None => {
            let period = Duration::from_secs(config.sweep.interval_secs);
            info!(interval_secs = config.sweep.interval_secs, "live mode on stdin");
            let monitor = Arc::new(BeaconMonitor::new(config));

            let sweeper = scheduler::spawn_sweeper(
                monitor.clone(),
                period,
                scheduler::local_clock(),
                move |report| {
                    if let Err(e) = printer.print(&report) {
                        error!(error = %e, "failed to write sweep report");
                    }
                },
            );

            let ingested =
                ingest::ingest(BufReader::new(tokio::io::stdin()), &monitor, &ingest_options)
                    .await;
            sweeper.stop().await?;
            let stats = ingested?;

            // Whatever is still held when input ends.
            printer.print(&monitor.report(ReportMode::ByGroup).await)?;
            stats
        }
    };

    if stats.lines_skipped > 0 && !printer.json {
        println!("\n\nLines skipped: {}", stats.lines_skipped);
    }
    Ok(stats)
}
