//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `kiosk` - line-per-PIN scan intake on standard input
//! - `session_log` - closed-session audit trail (JSONL format)

pub mod kiosk;
pub mod session_log;

// Re-export commonly used types
pub use kiosk::{run_kiosk_intake, ScanRequest};
pub use session_log::SessionLog;
