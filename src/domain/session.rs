//! Work-session data model: one entry/exit pair per person per day

use crate::domain::types::Pin;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Newtype wrapper for session IDs (UUIDv7, time-sortable)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Review state of a session
///
/// Transitions only move forward; nothing automated ever returns a session
/// to `Normal`, and only a human correction leads to `AdminCorrected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Normal,
    RequiresReview,
    AutoClosed,
    AdminCorrected,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Normal => "NORMAL",
            SessionStatus::RequiresReview => "REQUIRES_REVIEW",
            SessionStatus::AutoClosed => "AUTO_CLOSED",
            SessionStatus::AdminCorrected => "ADMIN_CORRECTED",
        }
    }

    /// Forward-only transition table. Equal states are allowed no-ops.
    pub fn allows(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        match (self, next) {
            (a, b) if a == b => true,
            (Normal, RequiresReview) | (Normal, AutoClosed) => true,
            (RequiresReview, AutoClosed) => true,
            (Normal, AdminCorrected)
            | (RequiresReview, AdminCorrected)
            | (AutoClosed, AdminCorrected) => true,
            _ => false,
        }
    }
}

/// One work session: opened by an entry scan, closed by an exit scan or
/// by the end-of-day sweeper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub pin: Pin,
    pub entry: DateTime<Utc>,
    pub exit: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    /// Free text written only by a human operator
    #[serde(skip_serializing_if = "String::is_empty")]
    pub admin_notes: String,
}

impl Session {
    /// Open a new session at the given entry instant.
    ///
    /// Assigns a fresh UUIDv7 id; the session starts open with status
    /// `Normal` and no notes.
    ///
    /// # Example
    ///
    /// ```
    /// use timeclock::domain::session::Session;
    /// use timeclock::domain::types::Pin;
    /// use chrono::Utc;
    ///
    /// let session = Session::open(Pin::new("1001"), Utc::now());
    /// assert!(session.is_open());
    /// assert!(session.worked_duration().is_none());
    /// ```
    pub fn open(pin: Pin, entry: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::generate(),
            pin,
            entry,
            exit: None,
            status: SessionStatus::Normal,
            admin_notes: String::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.exit.is_none()
    }

    /// Record the exit instant. The first close wins; later calls are no-ops.
    pub fn close(&mut self, at: DateTime<Utc>) {
        if self.exit.is_none() {
            self.exit = Some(at);
        }
    }

    /// Apply a status transition if the table in [`SessionStatus::allows`]
    /// permits it. Returns whether the status was applied.
    pub fn mark(&mut self, next: SessionStatus) -> bool {
        if self.status.allows(next) {
            self.status = next;
            true
        } else {
            false
        }
    }

    /// Time between entry and exit, `None` while the session is open
    pub fn worked_duration(&self) -> Option<TimeDelta> {
        self.exit.map(|exit| exit - self.entry)
    }
}
