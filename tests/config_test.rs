//! Integration tests for configuration and roster loading

use chrono::{FixedOffset, NaiveTime, TimeDelta};
use std::io::Write;
use tempfile::NamedTempFile;
use timeclock::domain::types::Pin;
use timeclock::infra::{ClockZone, Config};
use timeclock::store::{PersonDirectory, RosterDirectory};

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_config_from_file() {
    let config_content = r#"
[clock]
timezone = "-03:00"
tolerance_minutes = 10
business_close = "21:30"
sweep_at = "22:00"

[roster]
file = "site/roster.toml"

[session_log]
file = "site/sessions.jsonl"

[intake]
queue_depth = 16

[metrics]
interval_secs = 30
"#;
    let temp_file = write_temp(config_content);

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(
        config.clock_zone(),
        ClockZone::Fixed(FixedOffset::west_opt(3 * 3600).unwrap())
    );
    assert_eq!(config.tolerance(), TimeDelta::minutes(10));
    assert_eq!(config.business_close(), NaiveTime::from_hms_opt(21, 30, 0).unwrap());
    assert_eq!(config.sweep_at(), NaiveTime::from_hms_opt(22, 0, 0).unwrap());
    assert_eq!(config.roster_file(), "site/roster.toml");
    assert_eq!(config.session_log_file(), "site/sessions.jsonl");
    assert_eq!(config.intake_queue_depth(), 16);
    assert_eq!(config.metrics_interval_secs(), 30);
}

#[test]
fn test_missing_sections_fall_back_to_defaults() {
    let temp_file = write_temp("[clock]\ntolerance_minutes = 5\n");

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.clock_zone(), ClockZone::Local);
    assert_eq!(config.tolerance(), TimeDelta::minutes(5));
    assert_eq!(config.business_close(), NaiveTime::from_hms_opt(22, 59, 0).unwrap());
    assert_eq!(config.roster_file(), "config/roster.toml");
    assert_eq!(config.intake_queue_depth(), 64);
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.clock_zone(), ClockZone::Local);
    assert_eq!(config.tolerance(), TimeDelta::minutes(15));
    assert_eq!(config.sweep_at(), NaiveTime::from_hms_opt(23, 5, 0).unwrap());
}

#[test]
fn test_bad_business_close_rejected() {
    let temp_file = write_temp("[clock]\nbusiness_close = \"25:00\"\n");
    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("business_close"));
}

#[test]
fn test_zero_queue_depth_rejected() {
    let temp_file = write_temp("[intake]\nqueue_depth = 0\n");
    assert!(Config::from_file(temp_file.path()).is_err());
}

#[test]
fn test_config_roster_round_trip() {
    let roster_file = write_temp(
        r#"
[[person]]
pin = "1001"
first_name = "Ada"
last_name = "Lovelace"
scheduled_entry = "08:00"
scheduled_exit = "16:00"
"#,
    );
    let config_content = format!(
        "[roster]\nfile = \"{}\"\n",
        roster_file.path().display()
    );
    let config_file = write_temp(&config_content);

    let config = Config::from_file(config_file.path()).unwrap();
    let roster = RosterDirectory::from_file(std::path::Path::new(config.roster_file())).unwrap();

    assert_eq!(roster.len(), 1);
    let person = roster.lookup_active(&Pin::new("1001")).unwrap().unwrap();
    assert_eq!(person.display_name(), "Ada Lovelace");
}
