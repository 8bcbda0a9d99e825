//! Storage seam for work sessions

use crate::domain::session::{Session, SessionId};
use crate::domain::types::Pin;
use chrono::{DateTime, Utc};

/// Errors that can occur in session or roster storage
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session '{0}' not found")]
    NotFound(SessionId),

    #[error("session '{0}' already stored")]
    Duplicate(SessionId),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Persistence seam for sessions.
///
/// Implementations store sessions and answer the queries the classifier and
/// the sweeper need. No business rules live here: duplicate detection,
/// tolerance evaluation and status decisions all belong to the callers.
pub trait SessionLedger: Send + Sync {
    /// Persist a freshly opened session. Storing an id twice is an error.
    fn insert(&self, session: Session) -> Result<(), StoreError>;

    /// Persist a mutated session over its stored version.
    fn update(&self, session: &Session) -> Result<(), StoreError>;

    /// All open sessions for a person, most recent entry first.
    ///
    /// More than one element means the ledger is in an inconsistent state;
    /// the query reports what is stored and leaves surfacing to the caller.
    fn open_sessions(&self, pin: &Pin) -> Result<Vec<Session>, StoreError>;

    /// Whether any of the person's sessions has its entry in `[from, to)`.
    ///
    /// Callers pass the UTC bounds of a local calendar day; duplicate
    /// detection is day-based, not a rolling window.
    fn has_entry_between(
        &self,
        pin: &Pin,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Every open session regardless of owner, oldest entry first.
    fn all_open(&self) -> Result<Vec<Session>, StoreError>;

    /// Closed sessions with entry in `[from, to)`, ordered by owner then
    /// entry. This is the query behind the attendance export tooling.
    fn completed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Session>, StoreError>;
}
