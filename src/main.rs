//! timeclock - attendance kiosk for a roster of enrolled persons
//!
//! Reads credential scans line by line on standard input, classifies each
//! one against the person's theoretical schedule, prints kiosk feedback,
//! and auto-closes forgotten sessions at end of business day.
//!
//! Module structure:
//! - `domain/` - Core business types (Person, Session, Outcome)
//! - `io/` - External interfaces (kiosk intake, session log)
//! - `services/` - Business logic (classifier, tolerance, sweeper)
//! - `infra/` - Infrastructure (Config, Metrics)

use anyhow::Context;
use chrono::{NaiveDate, TimeZone, Utc};
use clap::Parser;
use std::sync::Arc;
use timeclock::infra::{ClockZone, Config, Metrics};
use timeclock::io::{run_kiosk_intake, ScanRequest, SessionLog};
use timeclock::services::{AutoCloseSweeper, ClockRules, PersonLocks, SessionClassifier};
use timeclock::store::{MemoryLedger, PersonDirectory, RosterDirectory, SessionLedger};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// timeclock - attendance recording with schedule review flagging
#[derive(Parser, Debug)]
#[command(name = "timeclock", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Run one auto-close sweep and exit
    #[arg(long)]
    sweep: bool,

    /// Validate the roster file and exit
    #[arg(long)]
    roster_check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("timeclock starting");

    let args = Args::parse();

    let config_path = Config::resolve_config_path(args.config.as_deref());
    let config = Config::load_from_path(&config_path);

    info!(
        config_file = %config.config_file(),
        timezone = %config.clock_zone(),
        tolerance_minutes = %config.tolerance_minutes(),
        business_close = %config.business_close(),
        sweep_at = %config.sweep_at(),
        roster_file = %config.roster_file(),
        session_log_file = %config.session_log_file(),
        intake_queue_depth = %config.intake_queue_depth(),
        "config_loaded"
    );

    let roster = RosterDirectory::from_file(std::path::Path::new(config.roster_file()))
        .with_context(|| format!("failed to load roster {}", config.roster_file()))?;
    info!(persons = roster.len(), "roster_loaded");

    if args.roster_check {
        println!("roster ok: {} person(s)", roster.len());
        return Ok(());
    }

    // The tolerance evaluator and the sweeper are generic over the zone;
    // the config picks which concrete one the binary runs with.
    match config.clock_zone() {
        ClockZone::Local => run(config, roster, chrono::Local, args.sweep).await,
        ClockZone::Utc => run(config, roster, Utc, args.sweep).await,
        ClockZone::Fixed(offset) => run(config, roster, offset, args.sweep).await,
    }
}

async fn run<Tz: TimeZone>(
    config: Config,
    roster: RosterDirectory,
    tz: Tz,
    sweep_once: bool,
) -> anyhow::Result<()> {
    let ledger = Arc::new(MemoryLedger::new());
    let locks = Arc::new(PersonLocks::new());
    let metrics = Arc::new(Metrics::new());
    let rules = ClockRules::new(tz, config.tolerance(), config.business_close());
    let classifier =
        SessionClassifier::new(ledger.clone(), locks.clone(), rules.clone(), metrics.clone());
    let sweeper = AutoCloseSweeper::new(ledger.clone(), locks, rules.clone(), metrics.clone());
    let session_log = SessionLog::new(config.session_log_file());

    if sweep_once {
        let summary = sweeper.run().context("sweep failed")?;
        session_log.append_all(&summary.closed);
        println!("sweep closed {} session(s), {} failed", summary.closed_count(), summary.failed);
        return Ok(());
    }

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Scan channel (bounded; intake drops on overflow)
    let (scan_tx, mut scan_rx) = mpsc::channel::<ScanRequest>(config.intake_queue_depth());

    let intake_metrics = metrics.clone();
    let intake_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        run_kiosk_intake(scan_tx, intake_metrics, intake_shutdown).await;
    });

    // Handle shutdown on Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    let mut sweep_tick = tokio::time::interval(std::time::Duration::from_secs(60));
    let mut metrics_tick = tokio::time::interval(std::time::Duration::from_secs(
        config.metrics_interval_secs().max(1),
    ));
    let mut last_sweep_day: Option<NaiveDate> = None;
    let mut shutdown = shutdown_rx;

    info!("worker_started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
            scan = scan_rx.recv() => {
                let Some(scan) = scan else { break };
                handle_scan(&roster, &classifier, &session_log, &metrics, scan);
            }
            _ = sweep_tick.tick() => {
                let local_now = Utc::now().with_timezone(&rules.tz);
                let today = local_now.date_naive();
                if local_now.time() >= config.sweep_at() && last_sweep_day != Some(today) {
                    match sweeper.run() {
                        Ok(summary) => {
                            session_log.append_all(&summary.closed);
                            last_sweep_day = Some(today);
                        }
                        Err(e) => error!(error = %e, "sweep_failed"),
                    }
                }
            }
            _ = metrics_tick.tick() => {
                let open = ledger.all_open().map(|open| open.len()).unwrap_or(0);
                metrics.report(open).log();
            }
        }
    }

    info!("timeclock shutdown complete");
    Ok(())
}

/// Resolve the credential and classify the scan, printing kiosk feedback
fn handle_scan<Tz: TimeZone>(
    roster: &RosterDirectory,
    classifier: &SessionClassifier<Tz>,
    session_log: &SessionLog,
    metrics: &Metrics,
    scan: ScanRequest,
) {
    let person = match roster.lookup_active(&scan.pin) {
        Ok(Some(person)) => person,
        Ok(None) => {
            // unknown and inactive look the same on the kiosk
            metrics.record_rejected();
            warn!(pin = %scan.pin, "credential_rejected");
            println!("Credential not recognized.");
            return;
        }
        Err(e) => {
            error!(pin = %scan.pin, error = %e, "lookup_failed");
            println!("The scan could not be processed. Please try again.");
            return;
        }
    };

    match classifier.process_scan(&person, scan.at) {
        Ok(receipt) => {
            if let Some(warning) = &receipt.warning {
                println!("{}", warning.message());
            }
            println!("{}", receipt.outcome.message());
            if !receipt.session.is_open() {
                session_log.append(&receipt.session);
            }
        }
        Err(e) => {
            error!(pin = %person.pin, error = %e, "scan_failed");
            println!("The scan could not be processed. Please try again.");
        }
    }
}
