//! Per-person locking for scan classification

use crate::domain::types::Pin;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of per-person mutexes.
///
/// The classifier and the sweeper take the owner's cell before any
/// read-decide-write on that person's sessions, so at most one scan per
/// person is in flight and a sweep never races a live exit. Cells are
/// never removed; the registry is bounded by roster size.
#[derive(Default)]
pub struct PersonLocks {
    cells: Mutex<HashMap<Pin, Arc<Mutex<()>>>>,
}

impl PersonLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutex cell for one person. Hold the ids alive while locked:
    /// `let cell = locks.cell(&pin); let _guard = cell.lock();`
    pub fn cell(&self, pin: &Pin) -> Arc<Mutex<()>> {
        let mut cells = self.cells.lock();
        cells.entry(pin.clone()).or_default().clone()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.cells.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_same_pin_same_cell() {
        let locks = PersonLocks::new();
        let a = locks.cell(&Pin::new("1001"));
        let b = locks.cell(&Pin::new("1001"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn test_distinct_pins_distinct_cells() {
        let locks = PersonLocks::new();
        let a = locks.cell(&Pin::new("1001"));
        let b = locks.cell(&Pin::new("2002"));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn test_same_pin_serializes_holders() {
        let locks = Arc::new(PersonLocks::new());
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let in_flight = in_flight.clone();
                let max_seen = max_seen.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let cell = locks.cell(&Pin::new("1001"));
                        let _guard = cell.lock();
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_micros(20));
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            max_seen.load(Ordering::SeqCst),
            1,
            "no two holders of the same pin's cell may overlap"
        );
    }
}
