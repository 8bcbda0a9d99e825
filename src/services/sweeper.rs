//! End-of-day auto-close of dangling sessions
//!
//! People forget to scan out. The sweeper walks every open session, closes
//! it at the business-close time of the session's OWN entry day, marks it
//! `AUTO_CLOSED`, and reports per record and in total. A fault on one
//! session never stops the rest of the sweep.

use crate::domain::session::{Session, SessionStatus};
use crate::infra::metrics::Metrics;
use crate::services::locks::PersonLocks;
use crate::services::tolerance::ClockRules;
use crate::store::ledger::{SessionLedger, StoreError};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of one sweep run
#[derive(Debug, Default)]
pub struct SweepSummary {
    /// Sessions closed by this run
    pub closed: Vec<Session>,
    /// Sessions that could not be read back or persisted
    pub failed: usize,
}

impl SweepSummary {
    pub fn closed_count(&self) -> usize {
        self.closed.len()
    }
}

/// Closes sessions left open past the end of the business day
pub struct AutoCloseSweeper<Tz: TimeZone> {
    ledger: Arc<dyn SessionLedger>,
    /// Per-person critical sections, shared with the classifier
    locks: Arc<PersonLocks>,
    rules: ClockRules<Tz>,
    metrics: Arc<Metrics>,
}

impl<Tz: TimeZone> AutoCloseSweeper<Tz> {
    pub fn new(
        ledger: Arc<dyn SessionLedger>,
        locks: Arc<PersonLocks>,
        rules: ClockRules<Tz>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { ledger, locks, rules, metrics }
    }

    /// Run one sweep over every open session.
    ///
    /// Idempotent: a second run right after finds nothing open and closes
    /// zero. A failure of the global open-session query aborts the run;
    /// per-session faults are logged, counted and skipped.
    pub fn run(&self) -> Result<SweepSummary, StoreError> {
        let open = self.ledger.all_open()?;
        let mut summary = SweepSummary::default();

        for stale in open {
            let cell = self.locks.cell(&stale.pin);
            let _guard = cell.lock();

            // re-read under the lock: a live exit scan may have closed the
            // session after the query above
            let mut session = match self.fresh_open_copy(&stale) {
                Ok(Some(session)) => session,
                Ok(None) => {
                    debug!(session_id = %stale.id, "sweep_skip_already_closed");
                    continue;
                }
                Err(err) => {
                    error!(session_id = %stale.id, error = %err, "sweep_read_failed");
                    summary.failed += 1;
                    continue;
                }
            };

            let close_at = self.rules.close_for_entry(session.entry).unwrap_or(session.entry);
            if close_at < session.entry {
                warn!(
                    session_id = %session.id,
                    pin = %session.pin,
                    "entry_after_business_close"
                );
            }
            let exit_at = close_at.max(session.entry);
            session.close(exit_at);
            if !session.mark(SessionStatus::AutoClosed) {
                warn!(
                    session_id = %session.id,
                    status = session.status.as_str(),
                    "status_transition_rejected"
                );
            }

            match self.ledger.update(&session) {
                Ok(()) => {
                    info!(
                        session_id = %session.id,
                        pin = %session.pin,
                        closed_at = %exit_at,
                        "session_auto_closed"
                    );
                    summary.closed.push(session);
                }
                Err(err) => {
                    error!(session_id = %session.id, error = %err, "sweep_update_failed");
                    summary.failed += 1;
                }
            }
        }

        self.metrics.record_sweep(summary.closed.len() as u64, summary.failed as u64);
        info!(closed = summary.closed.len(), failed = summary.failed, "sweep_complete");
        Ok(summary)
    }

    fn fresh_open_copy(&self, stale: &Session) -> Result<Option<Session>, StoreError> {
        let open = self.ledger.open_sessions(&stale.pin)?;
        Ok(open.into_iter().find(|s| s.id == stale.id))
    }
}
