//! Lock-free metrics collection and periodic reporting
//!
//! Counter updates use atomics so the scan path never takes a lock just to
//! count itself; reporting is the only operation that needs synchronization
//! (via atomic swap).
//!
//! NOTE: All atomics use Relaxed ordering intentionally. These are
//! statistical counters only; never use them for coordination or logic
//! decisions.

use crate::domain::types::Outcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Update an atomic max value using a compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Lock-free metrics collector
///
/// All recording operations are lock-free. The `report()` method swaps the
/// periodic counters to zero to get a consistent delta while scans keep
/// arriving.
pub struct Metrics {
    /// Scans ever classified (monotonic)
    scans_total: AtomicU64,
    /// Scans since last report (reset on report)
    scans_since_report: AtomicU64,
    /// Unknown or inactive credentials turned away (monotonic)
    rejected_total: AtomicU64,
    /// Scans dropped because the intake queue was full (monotonic)
    scans_dropped: AtomicU64,
    /// Per-outcome counters (monotonic)
    entry_ok_total: AtomicU64,
    entry_out_of_schedule_total: AtomicU64,
    entry_duplicate_total: AtomicU64,
    exit_ok_total: AtomicU64,
    exit_out_of_schedule_total: AtomicU64,
    /// Scans that found more than one open session (monotonic)
    integrity_anomalies_total: AtomicU64,
    /// Sessions force-closed by the sweeper (monotonic)
    auto_closed_total: AtomicU64,
    /// Sweeper per-session persistence faults (monotonic)
    sweep_failures_total: AtomicU64,
    /// Sum of classification latencies in microseconds (reset on report)
    latency_sum_us: AtomicU64,
    /// Max classification latency in microseconds (reset on report)
    latency_max_us: AtomicU64,
    /// Last report time (only accessed from the reporter, not atomic)
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            scans_total: AtomicU64::new(0),
            scans_since_report: AtomicU64::new(0),
            rejected_total: AtomicU64::new(0),
            scans_dropped: AtomicU64::new(0),
            entry_ok_total: AtomicU64::new(0),
            entry_out_of_schedule_total: AtomicU64::new(0),
            entry_duplicate_total: AtomicU64::new(0),
            exit_ok_total: AtomicU64::new(0),
            exit_out_of_schedule_total: AtomicU64::new(0),
            integrity_anomalies_total: AtomicU64::new(0),
            auto_closed_total: AtomicU64::new(0),
            sweep_failures_total: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    fn outcome_counter(&self, outcome: &Outcome) -> &AtomicU64 {
        match outcome {
            Outcome::EntryOk { .. } => &self.entry_ok_total,
            Outcome::EntryOutOfSchedule { .. } => &self.entry_out_of_schedule_total,
            Outcome::EntryDuplicate { .. } => &self.entry_duplicate_total,
            Outcome::ExitOk { .. } => &self.exit_ok_total,
            Outcome::ExitOutOfSchedule { .. } => &self.exit_out_of_schedule_total,
            Outcome::IntegrityAnomaly { .. } => &self.integrity_anomalies_total,
        }
    }

    /// Record one classified scan with its processing latency (lock-free)
    #[inline]
    pub fn record_scan(&self, outcome: &Outcome, latency_us: u64) {
        self.scans_total.fetch_add(1, Ordering::Relaxed);
        self.scans_since_report.fetch_add(1, Ordering::Relaxed);
        self.outcome_counter(outcome).fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        update_atomic_max(&self.latency_max_us, latency_us);
    }

    /// Record a scan turned away on credential lookup (lock-free)
    #[inline]
    pub fn record_rejected(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a scan dropped because the intake queue was full (lock-free)
    #[inline]
    pub fn record_scan_dropped(&self) {
        self.scans_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a ledger found holding more than one open session (lock-free)
    #[inline]
    pub fn record_integrity_anomaly(&self) {
        self.integrity_anomalies_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the result of one sweep run (lock-free)
    #[inline]
    pub fn record_sweep(&self, closed: u64, failed: u64) {
        self.auto_closed_total.fetch_add(closed, Ordering::Relaxed);
        self.sweep_failures_total.fetch_add(failed, Ordering::Relaxed);
    }

    /// Get total scans classified
    #[inline]
    pub fn scans_total(&self) -> u64 {
        self.scans_total.load(Ordering::Relaxed)
    }

    /// Get total scans dropped on intake
    #[inline]
    pub fn scans_dropped(&self) -> u64 {
        self.scans_dropped.load(Ordering::Relaxed)
    }

    /// Calculate and return a metrics summary, then reset periodic counters
    ///
    /// This is the only method that resets counters. It swaps the periodic
    /// counters atomically so a concurrent scan is never lost, only counted
    /// in the next interval. `open_sessions` is a point-in-time gauge
    /// supplied by the caller.
    pub fn report(&self, open_sessions: usize) -> MetricsSummary {
        let scans_count = self.scans_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.swap(0, Ordering::Relaxed);
        let max_latency = self.latency_max_us.swap(0, Ordering::Relaxed);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        let scans_per_sec = if elapsed.as_secs_f64() > 0.0 {
            scans_count as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let avg_latency = if scans_count > 0 { latency_sum / scans_count } else { 0 };

        MetricsSummary {
            scans_total: self.scans_total.load(Ordering::Relaxed),
            scans_per_sec,
            avg_latency_us: avg_latency,
            max_latency_us: max_latency,
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
            scans_dropped: self.scans_dropped.load(Ordering::Relaxed),
            entry_ok_total: self.entry_ok_total.load(Ordering::Relaxed),
            entry_out_of_schedule_total: self
                .entry_out_of_schedule_total
                .load(Ordering::Relaxed),
            entry_duplicate_total: self.entry_duplicate_total.load(Ordering::Relaxed),
            exit_ok_total: self.exit_ok_total.load(Ordering::Relaxed),
            exit_out_of_schedule_total: self.exit_out_of_schedule_total.load(Ordering::Relaxed),
            integrity_anomalies_total: self.integrity_anomalies_total.load(Ordering::Relaxed),
            auto_closed_total: self.auto_closed_total.load(Ordering::Relaxed),
            sweep_failures_total: self.sweep_failures_total.load(Ordering::Relaxed),
            open_sessions,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct MetricsSummary {
    /// Total scans ever classified
    pub scans_total: u64,
    /// Scans per second over the last interval
    pub scans_per_sec: f64,
    /// Average classification latency over the last interval (µs)
    pub avg_latency_us: u64,
    /// Max classification latency over the last interval (µs)
    pub max_latency_us: u64,
    /// Total credential rejections
    pub rejected_total: u64,
    /// Total scans dropped on intake overflow
    pub scans_dropped: u64,
    pub entry_ok_total: u64,
    pub entry_out_of_schedule_total: u64,
    pub entry_duplicate_total: u64,
    pub exit_ok_total: u64,
    pub exit_out_of_schedule_total: u64,
    /// Total multiple-open-session faults surfaced
    pub integrity_anomalies_total: u64,
    /// Total sessions closed by the sweeper
    pub auto_closed_total: u64,
    /// Total per-session sweep faults
    pub sweep_failures_total: u64,
    /// Open sessions right now (gauge)
    pub open_sessions: usize,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            scans_total = %self.scans_total,
            scans_per_sec = format!("{:.1}", self.scans_per_sec),
            avg_latency_us = %self.avg_latency_us,
            max_latency_us = %self.max_latency_us,
            rejected = %self.rejected_total,
            dropped = %self.scans_dropped,
            entry_ok = %self.entry_ok_total,
            entry_out_of_schedule = %self.entry_out_of_schedule_total,
            entry_duplicate = %self.entry_duplicate_total,
            exit_ok = %self.exit_ok_total,
            exit_out_of_schedule = %self.exit_out_of_schedule_total,
            integrity_anomalies = %self.integrity_anomalies_total,
            auto_closed = %self.auto_closed_total,
            sweep_failures = %self.sweep_failures_total,
            open_sessions = %self.open_sessions,
            "metrics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_ok() -> Outcome {
        Outcome::EntryOk { person: "Ada Lovelace".to_string() }
    }

    fn exit_flagged() -> Outcome {
        Outcome::ExitOutOfSchedule { person: "Ada Lovelace".to_string() }
    }

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.scans_total(), 0);
        assert_eq!(metrics.scans_dropped(), 0);
    }

    #[test]
    fn test_record_scan() {
        let metrics = Metrics::new();

        metrics.record_scan(&entry_ok(), 100);
        assert_eq!(metrics.scans_total(), 1);
        assert_eq!(metrics.latency_sum_us.load(Ordering::Relaxed), 100);

        metrics.record_scan(&exit_flagged(), 200);
        assert_eq!(metrics.scans_total(), 2);
        assert_eq!(metrics.latency_sum_us.load(Ordering::Relaxed), 300);
    }

    #[test]
    fn test_outcome_counters() {
        let metrics = Metrics::new();

        metrics.record_scan(&entry_ok(), 10);
        metrics.record_scan(&entry_ok(), 10);
        metrics.record_scan(&exit_flagged(), 10);

        let summary = metrics.report(0);
        assert_eq!(summary.entry_ok_total, 2);
        assert_eq!(summary.exit_out_of_schedule_total, 1);
        assert_eq!(summary.entry_duplicate_total, 0);
    }

    #[test]
    fn test_report_resets_periodic_counters() {
        let metrics = Metrics::new();

        metrics.record_scan(&entry_ok(), 100);
        metrics.record_scan(&entry_ok(), 200);
        metrics.record_scan(&entry_ok(), 300);

        let summary = metrics.report(1);
        assert_eq!(summary.scans_total, 3);
        assert_eq!(summary.avg_latency_us, 200); // (100+200+300)/3
        assert_eq!(summary.max_latency_us, 300);
        assert_eq!(summary.open_sessions, 1);

        // periodic counters reset, monotonic ones kept
        assert_eq!(metrics.scans_since_report.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.latency_sum_us.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.latency_max_us.load(Ordering::Relaxed), 0);
        let second = metrics.report(0);
        assert_eq!(second.scans_total, 3);
        assert_eq!(second.avg_latency_us, 0);
    }

    #[test]
    fn test_report_empty() {
        let metrics = Metrics::new();
        let summary = metrics.report(0);

        assert_eq!(summary.scans_total, 0);
        assert_eq!(summary.avg_latency_us, 0);
        assert_eq!(summary.max_latency_us, 0);
    }

    #[test]
    fn test_max_latency_tracking() {
        let metrics = Metrics::new();

        metrics.record_scan(&entry_ok(), 100);
        metrics.record_scan(&entry_ok(), 500);
        metrics.record_scan(&entry_ok(), 200);
        metrics.record_scan(&entry_ok(), 50);

        assert_eq!(metrics.latency_max_us.load(Ordering::Relaxed), 500);
    }

    #[test]
    fn test_rejection_and_sweep_counters() {
        let metrics = Metrics::new();

        metrics.record_rejected();
        metrics.record_rejected();
        metrics.record_scan_dropped();
        metrics.record_integrity_anomaly();
        metrics.record_sweep(3, 1);
        metrics.record_sweep(2, 0);

        let summary = metrics.report(0);
        assert_eq!(summary.rejected_total, 2);
        assert_eq!(summary.scans_dropped, 1);
        assert_eq!(summary.integrity_anomalies_total, 1);
        assert_eq!(summary.auto_closed_total, 5);
        assert_eq!(summary.sweep_failures_total, 1);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(Metrics::new());
        let mut handles = vec![];

        // 10 threads, each recording 1000 scans
        for _ in 0..10 {
            let m = metrics.clone();
            handles.push(thread::spawn(move || {
                for i in 0..1000 {
                    m.record_scan(&entry_ok(), i as u64);
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(metrics.scans_total(), 10_000);
    }
}
