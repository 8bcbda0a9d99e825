//! Kiosk intake: credential scans arriving on standard input
//!
//! Badge readers at the kiosk act as keyboard wedges, so each scan arrives
//! as one line holding the PIN. The reader stamps the arrival instant,
//! shape-checks the PIN, and queues the scan to the worker. The queue is
//! bounded; when it is full the scan is dropped rather than blocking the
//! reader.

use crate::domain::types::Pin;
use crate::infra::metrics::Metrics;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// One credential scan as accepted at the intake boundary
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub pin: Pin,
    /// Arrival instant, stamped when the line was read
    pub at: DateTime<Utc>,
}

/// Read scans from standard input until EOF or shutdown.
///
/// Lines that do not look like a PIN are discarded at this boundary; they
/// never reach the classifier or the kiosk display.
pub async fn run_kiosk_intake(
    scan_tx: mpsc::Sender<ScanRequest>,
    metrics: Arc<Metrics>,
    mut shutdown: watch::Receiver<bool>,
) {
    let reader = BufReader::new(tokio::io::stdin());
    let mut lines = reader.lines();

    info!("kiosk_intake_started");

    // Rate-limit drop warnings to 1 per second
    let mut last_drop_warn = Instant::now() - Duration::from_secs(2);

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("kiosk_intake_shutdown");
                    return;
                }
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("kiosk_intake_eof");
                        return;
                    }
                    Err(e) => {
                        warn!(error = %e, "kiosk_intake_read_failed");
                        return;
                    }
                };

                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let pin = crate::domain::types::Pin::new(trimmed);
                if !pin.is_well_formed() {
                    debug!(line = %trimmed, "kiosk_malformed_pin");
                    continue;
                }

                let request = ScanRequest { pin, at: Utc::now() };
                match scan_tx.try_send(request) {
                    Ok(()) => {}
                    Err(TrySendError::Full(request)) => {
                        metrics.record_scan_dropped();
                        if last_drop_warn.elapsed() > Duration::from_secs(1) {
                            warn!(pin = %request.pin, "scan_dropped: queue full");
                            last_drop_warn = Instant::now();
                        }
                    }
                    Err(TrySendError::Closed(_)) => {
                        warn!("scan_channel_closed");
                        return;
                    }
                }
            }
        }
    }
}
