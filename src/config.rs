//! TOML configuration for beaconwatch.
//!
//! Every section has compiled-in defaults, so an empty file (or no file at
//! all) is a valid configuration. Command-line flags are applied on top by
//! the binary.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::detect::Thresholds;
use crate::ingest::LineFormat;

/// Environment variable naming a config file to load when none is given.
pub const CONFIG_ENV: &str = "BEACONWATCH_CONFIG";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub grouping: GroupingConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
}

impl MonitorConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load from `explicit` if given (errors are fatal), else from the file
    /// named by `BEACONWATCH_CONFIG` (errors fall back to defaults), else
    /// use defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return Ok(cfg),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "{} set but file could not be loaded, using defaults",
                        CONFIG_ENV
                    );
                }
            }
        }

        debug!("no config file given, using compiled-in defaults");
        Ok(Self::default())
    }

    /// Reject settings the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let timeout = self.grouping.group_timeout_secs;
        if !timeout.is_finite() || timeout <= 0.0 {
            bail!("grouping.group_timeout_secs must be a positive number, got {timeout}");
        }
        if self.sweep.interval_secs == 0 {
            bail!("sweep.interval_secs must be greater than zero");
        }
        let t = &self.thresholds;
        if !(t.short_points < t.medium_points && t.medium_points < t.long_points) {
            bail!(
                "thresholds must satisfy short_points < medium_points < long_points ({} / {} / {})",
                t.short_points,
                t.medium_points,
                t.long_points
            );
        }
        if !(t.regular_tolerance >= 0.0 && t.max_min_ratio > 0.0) {
            bail!("thresholds.regular_tolerance and thresholds.max_min_ratio must be positive");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Gap in seconds beyond which a server's events start a new group.
    pub group_timeout_secs: f64,
    /// Input line layout.
    pub format: LineFormat,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            group_timeout_secs: 60.0,
            format: LineFormat::Casw,
        }
    }
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Seconds between live-mode sweeps.
    pub interval_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
