// src/pipeline.rs
//! One complete check-and-notify run under a single deadline

use crate::check::{CheckOrchestrator, PathVerdict};
use crate::config::DEFAULT_TIMEOUT;
use crate::dispatch::NotificationDispatcher;
use crate::notify::NotificationSink;
use crate::service::ServiceUnit;
use crate::stats::{RunStats, StatsSnapshot};
use crate::template::AlertRenderer;
use crate::types::NotificationOutcome;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub timeout: Duration,
    pub test_mode: bool,
    /// Reference time for expiry checks
    pub now: DateTime<Utc>,
}

impl RunOptions {
    pub fn new(timeout: Duration, test_mode: bool) -> Self {
        Self {
            timeout,
            test_mode,
            now: Utc::now(),
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub verdicts: Vec<PathVerdict>,
    pub outcomes: Vec<NotificationOutcome>,
    pub stats: StatsSnapshot,
    pub timed_out: bool,
}

/// Deadline `timeout` after `start`, or [`DEFAULT_TIMEOUT`] after it when
/// the configured value does not fit in an `Instant`.
fn run_deadline(start: Instant, timeout: Duration) -> Instant {
    match start.checked_add(timeout) {
        Some(deadline) => deadline,
        None => {
            warn!(
                "Timeout of {} is out of range. Using default of {}",
                humantime::format_duration(timeout),
                humantime::format_duration(DEFAULT_TIMEOUT)
            );
            start + DEFAULT_TIMEOUT
        }
    }
}

/// Check every service and deliver the resulting alerts.
///
/// Evaluation and delivery run as two stages joined by an unbounded queue.
/// Returns after all checks and all sends finished, or when the deadline
/// abandoned whatever was still running.
pub async fn run_pipeline(
    services: Vec<ServiceUnit>,
    sinks: Vec<Arc<dyn NotificationSink>>,
    renderer: Arc<dyn AlertRenderer>,
    options: RunOptions,
) -> RunSummary {
    let deadline = run_deadline(Instant::now(), options.timeout);
    let stats = RunStats::new();

    if options.test_mode {
        info!("Running in test mode. Will not send messages");
    }

    let (intake_tx, intake_rx) = mpsc::unbounded_channel();
    let dispatcher = NotificationDispatcher::new(deadline, stats.clone());
    let dispatch = tokio::spawn(dispatcher.drain(intake_rx));

    let orchestrator = CheckOrchestrator::new(
        sinks,
        renderer,
        stats.clone(),
        options.test_mode,
        options.now,
    );
    let report = orchestrator.run(services, deadline, intake_tx).await;

    // intake is closed by now; drain is bounded by the same deadline
    let outcomes = match dispatch.await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            error!("Notification dispatcher failed: {}", e);
            Vec::new()
        }
    };

    let snapshot = stats.snapshot();
    let abandoned = snapshot.alerts_emitted > snapshot.sends_succeeded + snapshot.sends_failed;
    let timed_out = report.timed_out || abandoned;

    info!(
        checked = snapshot.checked,
        ok = snapshot.ok,
        expiring = snapshot.expiring,
        failed = snapshot.failed,
        alerts = snapshot.alerts_emitted,
        sent = snapshot.sends_succeeded,
        send_failures = snapshot.sends_failed,
        timed_out,
        elapsed_ms = snapshot.elapsed_ms,
        "Finished run"
    );

    RunSummary {
        verdicts: report.verdicts,
        outcomes,
        stats: snapshot,
        timed_out,
    }
}
