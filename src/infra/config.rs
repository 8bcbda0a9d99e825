//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use anyhow::{bail, Context};
use chrono::{FixedOffset, NaiveTime, TimeDelta};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

use crate::domain::types::parse_wall_time;

/// Reference timezone for all wall-clock decisions.
///
/// "local" follows the host clock, "utc" pins to UTC, and a fixed offset
/// like "+02:00" pins to that offset year-round. Threaded explicitly into
/// the tolerance evaluator and the sweeper; nothing reads ambient zone
/// state beyond this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockZone {
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl ClockZone {
    fn parse(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(ClockZone::Local),
            "utc" => Ok(ClockZone::Utc),
            other => other
                .parse::<FixedOffset>()
                .map(ClockZone::Fixed)
                .with_context(|| format!("invalid timezone '{s}' (expected \"local\", \"utc\" or an offset like \"+02:00\")")),
        }
    }
}

impl std::fmt::Display for ClockZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClockZone::Local => write!(f, "local"),
            ClockZone::Utc => write!(f, "utc"),
            ClockZone::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClockSection {
    /// "local", "utc", or a fixed offset like "+02:00"
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Allowed deviation around a theoretical time, in minutes
    #[serde(default = "default_tolerance_minutes")]
    pub tolerance_minutes: u32,
    /// Wall-clock time at which dangling sessions are deemed ended
    #[serde(default = "default_business_close")]
    pub business_close: String,
    /// Wall-clock time at which the daily sweep triggers
    #[serde(default = "default_sweep_at")]
    pub sweep_at: String,
}

impl Default for ClockSection {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            tolerance_minutes: default_tolerance_minutes(),
            business_close: default_business_close(),
            sweep_at: default_sweep_at(),
        }
    }
}

fn default_timezone() -> String {
    "local".to_string()
}

fn default_tolerance_minutes() -> u32 {
    15
}

fn default_business_close() -> String {
    "22:59".to_string()
}

fn default_sweep_at() -> String {
    "23:05".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterSection {
    /// Path to the TOML roster of enrolled persons
    #[serde(default = "default_roster_file")]
    pub file: String,
}

impl Default for RosterSection {
    fn default() -> Self {
        Self { file: default_roster_file() }
    }
}

fn default_roster_file() -> String {
    "config/roster.toml".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionLogSection {
    /// File path for the closed-session audit trail (JSONL format)
    #[serde(default = "default_session_log_file")]
    pub file: String,
}

impl Default for SessionLogSection {
    fn default() -> Self {
        Self { file: default_session_log_file() }
    }
}

fn default_session_log_file() -> String {
    "sessions.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntakeSection {
    /// Bounded depth of the scan queue between the reader and the worker
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for IntakeSection {
    fn default() -> Self {
        Self { queue_depth: default_queue_depth() }
    }
}

fn default_queue_depth() -> usize {
    64
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSection {
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

fn default_metrics_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub clock: ClockSection,
    #[serde(default)]
    pub roster: RosterSection,
    #[serde(default)]
    pub session_log: SessionLogSection,
    #[serde(default)]
    pub intake: IntakeSection,
    #[serde(default)]
    pub metrics: MetricsSection,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    clock_zone: ClockZone,
    tolerance_minutes: u32,
    business_close: NaiveTime,
    sweep_at: NaiveTime,
    roster_file: String,
    session_log_file: String,
    intake_queue_depth: usize,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clock_zone: ClockZone::Local,
            tolerance_minutes: default_tolerance_minutes(),
            business_close: NaiveTime::from_hms_opt(22, 59, 0).unwrap_or(NaiveTime::MIN),
            sweep_at: NaiveTime::from_hms_opt(23, 5, 0).unwrap_or(NaiveTime::MIN),
            roster_file: default_roster_file(),
            session_log_file: default_session_log_file(),
            intake_queue_depth: default_queue_depth(),
            metrics_interval_secs: default_metrics_interval(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Determine config file path from the CLI argument or environment
    pub fn resolve_config_path(cli_config: Option<&str>) -> String {
        if let Some(path) = cli_config {
            return path.to_string();
        }
        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }
        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        let clock_zone = ClockZone::parse(&toml_config.clock.timezone)?;
        let business_close = parse_wall_time(&toml_config.clock.business_close)
            .context("invalid clock.business_close (expected HH:MM)")?;
        let sweep_at = parse_wall_time(&toml_config.clock.sweep_at)
            .context("invalid clock.sweep_at (expected HH:MM)")?;
        if toml_config.intake.queue_depth == 0 {
            bail!("intake.queue_depth must be at least 1");
        }

        Ok(Self {
            clock_zone,
            tolerance_minutes: toml_config.clock.tolerance_minutes,
            business_close,
            sweep_at,
            roster_file: toml_config.roster.file,
            session_log_file: toml_config.session_log.file,
            intake_queue_depth: toml_config.intake.queue_depth,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    // Getters for all config fields
    pub fn clock_zone(&self) -> ClockZone {
        self.clock_zone
    }

    pub fn tolerance(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.tolerance_minutes))
    }

    pub fn tolerance_minutes(&self) -> u32 {
        self.tolerance_minutes
    }

    pub fn business_close(&self) -> NaiveTime {
        self.business_close
    }

    pub fn sweep_at(&self) -> NaiveTime {
        self.sweep_at
    }

    pub fn roster_file(&self) -> &str {
        &self.roster_file
    }

    pub fn session_log_file(&self) -> &str {
        &self.session_log_file
    }

    pub fn intake_queue_depth(&self) -> usize {
        self.intake_queue_depth
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.clock_zone(), ClockZone::Local);
        assert_eq!(config.tolerance(), TimeDelta::minutes(15));
        assert_eq!(config.business_close(), NaiveTime::from_hms_opt(22, 59, 0).unwrap());
        assert_eq!(config.sweep_at(), NaiveTime::from_hms_opt(23, 5, 0).unwrap());
        assert_eq!(config.roster_file(), "config/roster.toml");
        assert_eq!(config.session_log_file(), "sessions.jsonl");
        assert_eq!(config.intake_queue_depth(), 64);
        assert_eq!(config.metrics_interval_secs(), 60);
    }

    #[test]
    fn test_clock_zone_parse() {
        assert_eq!(ClockZone::parse("local").unwrap(), ClockZone::Local);
        assert_eq!(ClockZone::parse("UTC").unwrap(), ClockZone::Utc);
        assert_eq!(
            ClockZone::parse("+02:00").unwrap(),
            ClockZone::Fixed(FixedOffset::east_opt(2 * 3600).unwrap())
        );
        assert_eq!(
            ClockZone::parse("-03:00").unwrap(),
            ClockZone::Fixed(FixedOffset::west_opt(3 * 3600).unwrap())
        );
        assert!(ClockZone::parse("Mars/Olympus").is_err());
    }

    #[test]
    fn test_clock_zone_display() {
        assert_eq!(ClockZone::Local.to_string(), "local");
        assert_eq!(ClockZone::Utc.to_string(), "utc");
        assert_eq!(
            ClockZone::Fixed(FixedOffset::west_opt(3 * 3600).unwrap()).to_string(),
            "-03:00"
        );
    }

    #[test]
    fn test_resolve_config_path_priority() {
        assert_eq!(Config::resolve_config_path(Some("config/site.toml")), "config/site.toml");
        // no CLI arg and no env in the test environment falls through to the default
        if env::var("CONFIG_FILE").is_err() {
            assert_eq!(Config::resolve_config_path(None), "config/dev.toml");
        }
    }
}
