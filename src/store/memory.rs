//! In-memory session ledger, the reference backend

use crate::domain::session::{Session, SessionId};
use crate::domain::types::Pin;
use crate::store::ledger::{SessionLedger, StoreError};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

/// [`SessionLedger`] backed by a map under a `RwLock`.
///
/// Queries scan the whole map; a kiosk sees tens of sessions per day, so
/// nothing here needs an index.
#[derive(Default)]
pub struct MemoryLedger {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored copy of a session, for diagnostics and tests
    pub fn get(&self, id: &SessionId) -> Option<Session> {
        self.sessions.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionLedger for MemoryLedger {
    fn insert(&self, session: Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&session.id) {
            return Err(StoreError::Duplicate(session.id));
        }
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    fn update(&self, session: &Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write();
        let Some(stored) = sessions.get_mut(&session.id) else {
            return Err(StoreError::NotFound(session.id.clone()));
        };
        *stored = session.clone();
        Ok(())
    }

    fn open_sessions(&self, pin: &Pin) -> Result<Vec<Session>, StoreError> {
        let sessions = self.sessions.read();
        let mut open: Vec<Session> = sessions
            .values()
            .filter(|s| &s.pin == pin && s.is_open())
            .cloned()
            .collect();
        // most recent entry first; ids break ties (UUIDv7 is time-ordered)
        open.sort_by(|a, b| b.entry.cmp(&a.entry).then_with(|| b.id.cmp(&a.id)));
        Ok(open)
    }

    fn has_entry_between(
        &self,
        pin: &Pin,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let sessions = self.sessions.read();
        Ok(sessions
            .values()
            .any(|s| &s.pin == pin && s.entry >= from && s.entry < to))
    }

    fn all_open(&self) -> Result<Vec<Session>, StoreError> {
        let sessions = self.sessions.read();
        let mut open: Vec<Session> =
            sessions.values().filter(|s| s.is_open()).cloned().collect();
        open.sort_by(|a, b| a.entry.cmp(&b.entry));
        Ok(open)
    }

    fn completed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Session>, StoreError> {
        let sessions = self.sessions.read();
        let mut done: Vec<Session> = sessions
            .values()
            .filter(|s| !s.is_open() && s.entry >= from && s.entry < to)
            .cloned()
            .collect();
        done.sort_by(|a, b| a.pin.cmp(&b.pin).then_with(|| a.entry.cmp(&b.entry)));
        Ok(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, h, m, 0).unwrap()
    }

    fn create_open_session(pin: &str, entry: DateTime<Utc>) -> Session {
        Session::open(Pin::new(pin), entry)
    }

    fn create_closed_session(pin: &str, entry: DateTime<Utc>, exit: DateTime<Utc>) -> Session {
        let mut session = Session::open(Pin::new(pin), entry);
        session.close(exit);
        session
    }

    #[test]
    fn test_insert_and_get() {
        let ledger = MemoryLedger::new();
        let session = create_open_session("1001", ts(10, 8, 0));
        let id = session.id.clone();

        ledger.insert(session.clone()).unwrap();
        assert_eq!(ledger.get(&id), Some(session));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let ledger = MemoryLedger::new();
        let session = create_open_session("1001", ts(10, 8, 0));

        ledger.insert(session.clone()).unwrap();
        let err = ledger.insert(session).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[test]
    fn test_update_unknown_session() {
        let ledger = MemoryLedger::new();
        let session = create_open_session("1001", ts(10, 8, 0));

        let err = ledger.update(&session).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_update_overwrites() {
        let ledger = MemoryLedger::new();
        let mut session = create_open_session("1001", ts(10, 8, 0));
        ledger.insert(session.clone()).unwrap();

        session.close(ts(10, 16, 0));
        ledger.update(&session).unwrap();

        let stored = ledger.get(&session.id).unwrap();
        assert_eq!(stored.exit, Some(ts(10, 16, 0)));
    }

    #[test]
    fn test_open_sessions_newest_first() {
        let ledger = MemoryLedger::new();
        ledger.insert(create_open_session("1001", ts(10, 8, 0))).unwrap();
        ledger.insert(create_open_session("1001", ts(11, 9, 0))).unwrap();
        ledger
            .insert(create_closed_session("1001", ts(9, 8, 0), ts(9, 16, 0)))
            .unwrap();
        ledger.insert(create_open_session("2002", ts(10, 7, 0))).unwrap();

        let open = ledger.open_sessions(&Pin::new("1001")).unwrap();
        assert_eq!(open.len(), 2, "closed and other-pin sessions must be excluded");
        assert_eq!(open[0].entry, ts(11, 9, 0));
        assert_eq!(open[1].entry, ts(10, 8, 0));
    }

    #[test]
    fn test_has_entry_between_half_open_bounds() {
        let ledger = MemoryLedger::new();
        let pin = Pin::new("1001");
        ledger.insert(create_open_session("1001", ts(10, 8, 0))).unwrap();

        assert!(ledger.has_entry_between(&pin, ts(10, 8, 0), ts(10, 9, 0)).unwrap());
        assert!(
            !ledger.has_entry_between(&pin, ts(10, 7, 0), ts(10, 8, 0)).unwrap(),
            "upper bound is exclusive"
        );
        assert!(!ledger.has_entry_between(&Pin::new("2002"), ts(10, 0, 0), ts(11, 0, 0)).unwrap());
    }

    #[test]
    fn test_all_open_oldest_first() {
        let ledger = MemoryLedger::new();
        ledger.insert(create_open_session("2002", ts(11, 9, 0))).unwrap();
        ledger.insert(create_open_session("1001", ts(10, 8, 0))).unwrap();
        ledger
            .insert(create_closed_session("3003", ts(10, 8, 0), ts(10, 16, 0)))
            .unwrap();

        let open = ledger.all_open().unwrap();
        assert_eq!(open.len(), 2);
        assert_eq!(open[0].pin, Pin::new("1001"));
        assert_eq!(open[1].pin, Pin::new("2002"));
    }

    #[test]
    fn test_completed_between_filters_and_orders() {
        let ledger = MemoryLedger::new();
        ledger
            .insert(create_closed_session("2002", ts(10, 9, 0), ts(10, 17, 0)))
            .unwrap();
        ledger
            .insert(create_closed_session("1001", ts(10, 8, 0), ts(10, 16, 0)))
            .unwrap();
        ledger
            .insert(create_closed_session("1001", ts(11, 8, 0), ts(11, 16, 0)))
            .unwrap();
        // open session in range stays out
        ledger.insert(create_open_session("1001", ts(10, 20, 0))).unwrap();
        // closed session outside range stays out
        ledger
            .insert(create_closed_session("1001", ts(20, 8, 0), ts(20, 16, 0)))
            .unwrap();

        let done = ledger.completed_between(ts(10, 0, 0), ts(12, 0, 0)).unwrap();
        assert_eq!(done.len(), 3);
        assert_eq!(done[0].pin, Pin::new("1001"));
        assert_eq!(done[0].entry, ts(10, 8, 0));
        assert_eq!(done[1].entry, ts(11, 8, 0));
        assert_eq!(done[2].pin, Pin::new("2002"));
    }
}
