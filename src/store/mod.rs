//! Storage - session ledger and person roster
//!
//! This module contains the persistence seams and their reference backends:
//! - `ledger` - the `SessionLedger` trait and storage errors
//! - `memory` - in-memory ledger used by the kiosk binary and tests
//! - `roster` - credential lookup (`PersonDirectory`) over a TOML roster

pub mod ledger;
pub mod memory;
pub mod roster;

// Re-export commonly used types
pub use ledger::{SessionLedger, StoreError};
pub use memory::MemoryLedger;
pub use roster::{PersonDirectory, RosterDirectory};
