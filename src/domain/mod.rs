//! Domain models - core business types for attendance tracking
//!
//! This module contains the canonical data types used throughout the system:
//! - `Person` - a roster member with credential and theoretical schedule
//! - `Session` - one work session (entry/exit pair) with review status
//! - `Outcome` - classification result of a credential scan
//! - `Pin` - credential newtype

pub mod session;
pub mod types;

// Re-export commonly used types at module level
pub use session::{Session, SessionId, SessionStatus};
pub use types::{Outcome, Person, Pin, Schedule};
