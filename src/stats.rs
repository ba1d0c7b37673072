// src/stats.rs
//! Run counters for check-service-certs

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Thread-safe run statistics, shared by every evaluation and send task
#[derive(Clone)]
pub struct RunStats {
    checked: Arc<AtomicU64>,
    ok: Arc<AtomicU64>,
    expiring: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
    alerts_emitted: Arc<AtomicU64>,
    sends_succeeded: Arc<AtomicU64>,
    sends_failed: Arc<AtomicU64>,
    start_time: Instant,
}

/// Snapshot of the counters at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub checked: u64,
    pub ok: u64,
    pub expiring: u64,
    pub failed: u64,
    pub alerts_emitted: u64,
    pub sends_succeeded: u64,
    pub sends_failed: u64,
    pub elapsed_ms: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            checked: Arc::new(AtomicU64::new(0)),
            ok: Arc::new(AtomicU64::new(0)),
            expiring: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
            alerts_emitted: Arc::new(AtomicU64::new(0)),
            sends_succeeded: Arc::new(AtomicU64::new(0)),
            sends_failed: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn record_ok(&self) {
        self.checked.fetch_add(1, Ordering::Relaxed);
        self.ok.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expiring(&self) {
        self.checked.fetch_add(1, Ordering::Relaxed);
        self.expiring.fetch_add(1, Ordering::Relaxed);
    }

    /// A certificate that could not be read or parsed
    pub fn record_failed(&self) {
        self.checked.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alert(&self) {
        self.alerts_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send(&self, success: bool) {
        if success {
            self.sends_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.sends_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            checked: self.checked.load(Ordering::Relaxed),
            ok: self.ok.load(Ordering::Relaxed),
            expiring: self.expiring.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            alerts_emitted: self.alerts_emitted.load(Ordering::Relaxed),
            sends_succeeded: self.sends_succeeded.load(Ordering::Relaxed),
            sends_failed: self.sends_failed.load(Ordering::Relaxed),
            elapsed_ms: self.start_time.elapsed().as_millis() as u64,
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}
