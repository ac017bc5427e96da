use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use beaconwatch::config::MonitorConfig;
use beaconwatch::ingest::LineFormat;
use beaconwatch::report::format::Verbosity;
use beaconwatch::{Printer, RunOptions};

#[derive(Parser)]
#[command(
    name = "beaconwatch",
    about = "Group and classify beacon anomalies from CASW or OAG logs",
    version,
    long_about = "Reads beacon anomaly lines from FILE (batch mode) or from stdin \
                  (live mode), groups each server's anomalies into runs separated \
                  by quiet gaps, and reports a classification for every run."
)]
struct Cli {
    /// Log file to post-process. Reads stdin in live mode when omitted.
    file: Option<PathBuf>,

    /// Echo each input line to stdout as it is read
    #[arg(short, long)]
    echo: bool,

    /// Seconds between live-mode reports
    #[arg(short, long, value_name = "SECS", value_parser = parse_interval)]
    interval: Option<u64>,

    /// Input is OAG data logger output instead of CASW
    #[arg(short, long)]
    oag: bool,

    /// Group the batch report by server instead of by time
    #[arg(short, long)]
    server: bool,

    /// One line per group
    #[arg(short, long, conflicts_with = "verbose")]
    terse: bool,

    /// Include interval statistics
    #[arg(short, long)]
    verbose: bool,

    /// Emit reports as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Gap in seconds that starts a new group
    #[arg(long, value_name = "SECS")]
    group_timeout: Option<f64>,

    /// Path to a TOML config file (default: $BEACONWATCH_CONFIG)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn parse_interval(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("interval must be greater than zero".to_string()),
        Ok(secs) => Ok(secs),
        Err(e) => Err(format!("invalid interval '{}': {}", s, e)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = MonitorConfig::resolve(cli.config.as_deref())?;
    if cli.oag {
        config.grouping.format = LineFormat::Oag;
    }
    if let Some(secs) = cli.group_timeout {
        config.grouping.group_timeout_secs = secs;
    }
    if let Some(secs) = cli.interval {
        config.sweep.interval_secs = secs;
    }
    config.validate()?;

    let verbosity = if cli.terse {
        Verbosity::Terse
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };

    let options = RunOptions {
        input: cli.file,
        by_server: cli.server,
        echo: cli.echo,
        printer: Printer {
            verbosity,
            json: cli.json,
        },
    };

    let stats = beaconwatch::run(config, options).await?;
    tracing::info!(
        lines = stats.lines_read,
        events = stats.events_recorded,
        skipped = stats.lines_skipped,
        "done"
    );
    Ok(())
}
