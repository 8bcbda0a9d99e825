//! Schedule tolerance evaluation
//!
//! Decides whether an observed instant honors a theoretical time-of-day:
//! - The theoretical time resolves on the observed LOCAL calendar day and
//!   both adjacent days, so schedules straddling midnight match correctly
//! - A scan within the tolerance window (default 15 minutes) is on time
//! - All wall-clock math goes through an explicit timezone; nothing reads
//!   the process-global zone

use chrono::{
    DateTime, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc,
};

/// Default tolerance window around a theoretical time (minutes)
pub const DEFAULT_TOLERANCE_MINUTES: i64 = 15;

/// Wall-clock policy threaded through the classifier and the sweeper:
/// reference timezone, tolerance window, business-day close time.
#[derive(Debug, Clone)]
pub struct ClockRules<Tz: TimeZone> {
    pub tz: Tz,
    pub tolerance: TimeDelta,
    pub business_close: NaiveTime,
}

impl<Tz: TimeZone> ClockRules<Tz> {
    pub fn new(tz: Tz, tolerance: TimeDelta, business_close: NaiveTime) -> Self {
        Self { tz, tolerance, business_close }
    }

    /// Whether `observed` is within tolerance of the theoretical time-of-day
    pub fn in_tolerance(&self, theoretical: NaiveTime, observed: DateTime<Utc>) -> bool {
        within_tolerance(theoretical, &observed.with_timezone(&self.tz), self.tolerance)
    }

    /// UTC bounds `[start, end)` of the local calendar day containing `at`
    pub fn day_bounds(&self, at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        local_day_bounds(&self.tz, at)
    }

    /// Business-close instant on the entry's local calendar day
    pub fn close_for_entry(&self, entry: DateTime<Utc>) -> Option<DateTime<Utc>> {
        close_instant(&self.tz, entry, self.business_close)
    }
}

/// Whether `observed` falls within `tolerance` of `theoretical`.
///
/// The theoretical time-of-day is resolved on the observed instant's local
/// date and on both adjacent dates; the closest resolution wins. A 23:58
/// scheduled exit scanned at 00:05 the next day is therefore in tolerance.
/// The window is inclusive: exactly `tolerance` away still passes.
pub fn within_tolerance<Tz: TimeZone>(
    theoretical: NaiveTime,
    observed: &DateTime<Tz>,
    tolerance: TimeDelta,
) -> bool {
    let observed_utc = observed.with_timezone(&Utc);
    candidate_instants(theoretical, observed).into_iter().any(|candidate| {
        let delta = observed_utc - candidate.with_timezone(&Utc);
        delta.abs() <= tolerance
    })
}

/// Resolutions of a time-of-day on the observed local date and its neighbors
fn candidate_instants<Tz: TimeZone>(
    theoretical: NaiveTime,
    observed: &DateTime<Tz>,
) -> Vec<DateTime<Tz>> {
    let tz = observed.timezone();
    let date = observed.date_naive();

    let days = [
        date.checked_sub_days(Days::new(1)),
        Some(date),
        date.checked_add_days(Days::new(1)),
    ];
    days.into_iter()
        .flatten()
        .filter_map(|day| resolve_local(&tz, day.and_time(theoretical)))
        .collect()
}

/// Resolve a naive local datetime in `tz`.
///
/// Ambiguous local times (clocks rolled back) take the earlier mapping;
/// nonexistent ones (clocks rolled forward) slide ahead hour by hour.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => {
            for hours in 1..=3 {
                let shifted = naive + TimeDelta::hours(hours);
                match tz.from_local_datetime(&shifted) {
                    LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => return Some(dt),
                    LocalResult::None => {}
                }
            }
            None
        }
    }
}

/// UTC bounds `[start, end)` of the local calendar day containing `at`.
///
/// This is the window the classifier hands to the ledger for duplicate
/// detection: calendar-day based, never a rolling 24 hours.
pub fn local_day_bounds<Tz: TimeZone>(
    tz: &Tz,
    at: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let date = at.with_timezone(tz).date_naive();
    let next = date.succ_opt().unwrap_or(date);
    (day_start_utc(tz, date), day_start_utc(tz, next))
}

fn day_start_utc<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    resolve_local(tz, midnight)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| DateTime::from_naive_utc_and_offset(midnight, Utc))
}

/// Instant at which a session opened at `entry` is deemed ended: the
/// business-close time on the entry's LOCAL calendar day. The sweep may run
/// after midnight; the close still lands on the entry's own day.
pub fn close_instant<Tz: TimeZone>(
    tz: &Tz,
    entry: DateTime<Utc>,
    business_close: NaiveTime,
) -> Option<DateTime<Utc>> {
    let date = entry.with_timezone(tz).date_naive();
    resolve_local(tz, date.and_time(business_close)).map(|dt| dt.with_timezone(&Utc))
}
