//! Session audit trail - closed sessions written to file
//!
//! Sessions are written in JSONL format (one JSON object per line) to the
//! file specified in config, whenever a session closes: a live exit scan
//! or an auto-close by the sweeper. Reporting tooling consumes this file
//! offline; nothing in the kiosk reads it back.

use crate::domain::session::Session;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info};

/// Append-only writer for closed sessions
pub struct SessionLog {
    file_path: String,
}

impl SessionLog {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "session_log_initialized");
        Self { file_path: file_path.to_string() }
    }

    /// Write one session to the log file
    /// Returns true if successful, false otherwise
    pub fn append(&self, session: &Session) -> bool {
        let json = match serde_json::to_string(session) {
            Ok(json) => json,
            Err(e) => {
                error!(session_id = %session.id, error = %e, "session_serialize_failed");
                return false;
            }
        };

        match self.append_line(&json) {
            Ok(()) => {
                info!(
                    session_id = %session.id,
                    pin = %session.pin,
                    status = session.status.as_str(),
                    "session_logged"
                );
                true
            }
            Err(e) => {
                error!(
                    session_id = %session.id,
                    error = %e,
                    "session_log_failed"
                );
                false
            }
        }
    }

    /// Append a line to the log file
    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;
        debug!(file = %self.file_path, bytes = %line.len(), "session_log_written");

        Ok(())
    }

    /// Write multiple sessions (sweeper output)
    pub fn append_all(&self, sessions: &[Session]) -> usize {
        let mut success_count = 0;
        for session in sessions {
            if self.append(session) {
                success_count += 1;
            }
        }
        success_count
    }
}
