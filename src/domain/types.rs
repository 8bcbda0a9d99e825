//! Shared types for the timeclock: credentials, schedules, persons, outcomes

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Longest credential accepted by the roster (badge keypads send up to 8 digits)
pub const MAX_PIN_LEN: usize = 8;

/// Newtype wrapper for credential PINs to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Pin(pub String);

impl Pin {
    pub fn new(pin: impl Into<String>) -> Self {
        Self(pin.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shape check applied at roster load and at the intake boundary:
    /// non-empty, at most [`MAX_PIN_LEN`] chars, digits only.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= MAX_PIN_LEN
            && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl std::fmt::Display for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Theoretical entry/exit times-of-day for one person
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub entry: NaiveTime,
    pub exit: NaiveTime,
}

impl Schedule {
    pub fn new(entry: NaiveTime, exit: NaiveTime) -> Self {
        Self { entry, exit }
    }
}

/// Parse a wall-clock time written as "HH:MM" or "HH:MM:SS"
pub fn parse_wall_time(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(s, "%H:%M").or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
}

/// A person enrolled in the attendance roster
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub pin: Pin,
    pub first_name: String,
    pub last_name: String,
    /// Identity document, carried for roster completeness only
    pub national_id: String,
    pub schedule: Schedule,
    /// Inactive persons are invisible to credential lookup
    pub active: bool,
}

impl Person {
    /// Full name embedded in scan outcomes for message formatting
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Classification outcome of one credential scan
///
/// Every variant carries the person's display name so the kiosk message
/// can be rendered without another roster lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    EntryOk { person: String },
    EntryOutOfSchedule { person: String },
    EntryDuplicate { person: String },
    ExitOk { person: String },
    ExitOutOfSchedule { person: String },
    /// More than one open session was found; the most recent was closed
    IntegrityAnomaly { person: String },
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::EntryOk { .. } => "entry_ok",
            Outcome::EntryOutOfSchedule { .. } => "entry_out_of_schedule",
            Outcome::EntryDuplicate { .. } => "entry_duplicate",
            Outcome::ExitOk { .. } => "exit_ok",
            Outcome::ExitOutOfSchedule { .. } => "exit_out_of_schedule",
            Outcome::IntegrityAnomaly { .. } => "integrity_anomaly",
        }
    }

    /// Display name carried by the outcome
    pub fn person(&self) -> &str {
        match self {
            Outcome::EntryOk { person }
            | Outcome::EntryOutOfSchedule { person }
            | Outcome::EntryDuplicate { person }
            | Outcome::ExitOk { person }
            | Outcome::ExitOutOfSchedule { person }
            | Outcome::IntegrityAnomaly { person } => person,
        }
    }

    /// True when the scan left the session flagged for human review
    pub fn needs_review(&self) -> bool {
        !matches!(self, Outcome::EntryOk { .. } | Outcome::ExitOk { .. })
    }

    /// Kiosk-facing message shown to the person who scanned
    pub fn message(&self) -> String {
        match self {
            Outcome::EntryOk { person } => {
                format!("Entry recorded, {person}. Welcome!")
            }
            Outcome::EntryOutOfSchedule { person } => {
                format!(
                    "Entry recorded outside the scheduled time, {person}. \
                     The session was flagged for review."
                )
            }
            Outcome::EntryDuplicate { person } => {
                format!(
                    "A second entry today was detected, {person}. \
                     The session was flagged for review."
                )
            }
            Outcome::ExitOk { person } => {
                format!("Exit recorded, {person}. See you later!")
            }
            Outcome::ExitOutOfSchedule { person } => {
                format!(
                    "Exit recorded outside the scheduled time, {person}. \
                     The session was flagged for review."
                )
            }
            Outcome::IntegrityAnomaly { person } => {
                format!(
                    "Multiple open sessions were found for {person}; \
                     the most recent one was closed. Please notify an administrator."
                )
            }
        }
    }
}
