//! Scan classification - the attendance state machine
//!
//! One credential scan either opens a session (entry) or closes the open
//! one (exit). The classifier:
//! - Detects duplicate same-day entries BEFORE inserting, and a duplicate
//!   outranks any out-of-schedule flag
//! - Evaluates the scan instant against the person's theoretical schedule
//!   within the tolerance window
//! - Flags anomalies as `REQUIRES_REVIEW`; flags are never lowered here
//! - Surfaces a ledger holding more than one open session for a person

use crate::domain::session::{Session, SessionStatus};
use crate::domain::types::{Outcome, Person};
use crate::infra::metrics::Metrics;
use crate::services::locks::PersonLocks;
use crate::services::tolerance::ClockRules;
use crate::store::ledger::{SessionLedger, StoreError};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Classified result of one scan
#[derive(Debug, Clone)]
pub struct ScanReceipt {
    /// Primary entry/exit outcome
    pub outcome: Outcome,
    /// Set when the ledger held more than one open session for the person
    pub warning: Option<Outcome>,
    /// Copy of the session as persisted by this scan
    pub session: Session,
}

impl ScanReceipt {
    fn new(outcome: Outcome, session: Session) -> Self {
        Self { outcome, warning: None, session }
    }
}

/// Attendance state machine deciding what a credential scan means
pub struct SessionClassifier<Tz: TimeZone> {
    /// Session storage
    ledger: Arc<dyn SessionLedger>,
    /// Per-person critical sections, shared with the sweeper
    locks: Arc<PersonLocks>,
    /// Timezone, tolerance and business-close policy
    rules: ClockRules<Tz>,
    /// Metrics collector
    metrics: Arc<Metrics>,
}

impl<Tz: TimeZone> SessionClassifier<Tz> {
    pub fn new(
        ledger: Arc<dyn SessionLedger>,
        locks: Arc<PersonLocks>,
        rules: ClockRules<Tz>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { ledger, locks, rules, metrics }
    }

    /// Classify one scan for `person` observed at `now`.
    ///
    /// The whole read-decide-write runs under the person's lock, so two
    /// near-simultaneous scans of the same credential serialize: the first
    /// opens a session, the second closes it. Callers have already resolved
    /// the credential, so `person` is known to be active.
    pub fn process_scan(
        &self,
        person: &Person,
        now: DateTime<Utc>,
    ) -> Result<ScanReceipt, StoreError> {
        let started = Instant::now();
        let cell = self.locks.cell(&person.pin);
        let _guard = cell.lock();

        let mut open = self.ledger.open_sessions(&person.pin)?;
        let receipt = if open.is_empty() {
            self.classify_entry(person, now)?
        } else {
            let stray_count = open.len() - 1;
            if stray_count > 0 {
                error!(
                    pin = %person.pin,
                    open_count = open.len(),
                    "multiple_open_sessions"
                );
                self.metrics.record_integrity_anomaly();
            }
            // newest entry first; older strays are left for the sweeper
            let session = open.remove(0);
            let mut receipt = self.classify_exit(person, session, now)?;
            if stray_count > 0 {
                receipt.warning =
                    Some(Outcome::IntegrityAnomaly { person: person.display_name() });
            }
            receipt
        };

        self.metrics.record_scan(&receipt.outcome, started.elapsed().as_micros() as u64);
        info!(
            pin = %person.pin,
            outcome = receipt.outcome.as_str(),
            session_id = %receipt.session.id,
            "scan_classified"
        );
        Ok(receipt)
    }

    /// No open session: this scan opens one.
    ///
    /// The duplicate check runs before the insert so the new session never
    /// matches itself; when it hits, tolerance is not even consulted.
    fn classify_entry(
        &self,
        person: &Person,
        now: DateTime<Utc>,
    ) -> Result<ScanReceipt, StoreError> {
        let (day_start, day_end) = self.rules.day_bounds(now);
        let duplicate = self.ledger.has_entry_between(&person.pin, day_start, day_end)?;

        let mut session = Session::open(person.pin.clone(), now);
        let outcome = if duplicate {
            session.mark(SessionStatus::RequiresReview);
            Outcome::EntryDuplicate { person: person.display_name() }
        } else if !self.rules.in_tolerance(person.schedule.entry, now) {
            session.mark(SessionStatus::RequiresReview);
            Outcome::EntryOutOfSchedule { person: person.display_name() }
        } else {
            Outcome::EntryOk { person: person.display_name() }
        };

        // exactly one session per entry scan, flagged or not
        self.ledger.insert(session.clone())?;

        if outcome.needs_review() {
            warn!(
                pin = %person.pin,
                outcome = outcome.as_str(),
                session_id = %session.id,
                "entry_flagged"
            );
        }
        Ok(ScanReceipt::new(outcome, session))
    }

    /// One open session: this scan closes it.
    fn classify_exit(
        &self,
        person: &Person,
        mut session: Session,
        now: DateTime<Utc>,
    ) -> Result<ScanReceipt, StoreError> {
        session.close(now);
        let outcome = if self.rules.in_tolerance(person.schedule.exit, now) {
            Outcome::ExitOk { person: person.display_name() }
        } else {
            session.mark(SessionStatus::RequiresReview);
            Outcome::ExitOutOfSchedule { person: person.display_name() }
        };

        self.ledger.update(&session)?;

        if outcome.needs_review() {
            warn!(
                pin = %person.pin,
                outcome = outcome.as_str(),
                session_id = %session.id,
                "exit_flagged"
            );
        }
        Ok(ScanReceipt::new(outcome, session))
    }
}
