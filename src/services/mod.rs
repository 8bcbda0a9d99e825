//! Services - business logic of the attendance state machine
//!
//! This module contains the core business logic services:
//! - `classifier` - decides what each credential scan means
//! - `tolerance` - schedule adherence within the tolerance window
//! - `sweeper` - end-of-day auto-close of dangling sessions
//! - `locks` - per-person critical sections

pub mod classifier;
pub mod locks;
pub mod sweeper;
pub mod tolerance;

// Re-export commonly used types
pub use classifier::{ScanReceipt, SessionClassifier};
pub use locks::PersonLocks;
pub use sweeper::{AutoCloseSweeper, SweepSummary};
pub use tolerance::ClockRules;
