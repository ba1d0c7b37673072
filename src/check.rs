// src/check.rs
//! Check orchestrator: one evaluation task per (service, certificate path)

use crate::cert_reader::CertificateReader;
use crate::expiry::{evaluate, ExpiryVerdict};
use crate::notify::NotificationSink;
use crate::service::ServiceUnit;
use crate::stats::RunStats;
use crate::template::{AlertContext, AlertRenderer};
use crate::types::Alert;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Verdict for one certificate path
#[derive(Debug, Clone)]
pub struct PathVerdict {
    pub service_name: String,
    pub cert_path: PathBuf,
    pub verdict: ExpiryVerdict,
}

#[derive(Debug, Default)]
pub struct CheckReport {
    /// Verdicts of the tasks that finished before the deadline
    pub verdicts: Vec<PathVerdict>,
    pub timed_out: bool,
}

/// Evaluates every certificate path concurrently and emits alerts for expiring ones
#[derive(Clone)]
pub struct CheckOrchestrator {
    sinks: Arc<Vec<Arc<dyn NotificationSink>>>,
    renderer: Arc<dyn AlertRenderer>,
    stats: RunStats,
    test_mode: bool,
    now: DateTime<Utc>,
}

struct CheckJob {
    service_name: String,
    cert_path: PathBuf,
    min_cert_lifetime: Duration,
}

impl CheckOrchestrator {
    pub fn new(
        sinks: Vec<Arc<dyn NotificationSink>>,
        renderer: Arc<dyn AlertRenderer>,
        stats: RunStats,
        test_mode: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            sinks: Arc::new(sinks),
            renderer,
            stats,
            test_mode,
            now,
        }
    }

    /// Run every check, sending alerts into `intake` as they are produced.
    ///
    /// Returns once every task has finished or the deadline aborted the rest.
    /// `intake` is dropped on return, which closes it for the dispatcher.
    pub async fn run(
        &self,
        services: Vec<ServiceUnit>,
        deadline: Instant,
        intake: mpsc::UnboundedSender<Alert>,
    ) -> CheckReport {
        let mut tasks = JoinSet::new();

        for service in services {
            if service.cert_paths.is_empty() {
                warn!(service = %service.name, "No certificate paths configured");
            }
            for cert_path in service.cert_paths {
                let job = CheckJob {
                    service_name: service.name.clone(),
                    cert_path,
                    min_cert_lifetime: service.min_cert_lifetime,
                };
                let this = self.clone();
                let intake = intake.clone();
                tasks.spawn(async move { this.check_certificate(job, intake).await });
            }
        }
        drop(intake);

        info!("Started {} certificate checks", tasks.len());

        let mut report = CheckReport::default();
        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok(verdict))) => report.verdicts.push(verdict),
                Ok(Some(Err(e))) => error!("Certificate check task failed: {}", e),
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        abandoned = tasks.len(),
                        "Deadline reached, abandoning in-flight certificate checks"
                    );
                    report.timed_out = true;
                    tasks.shutdown().await;
                    break;
                }
            }
        }

        report
    }

    async fn check_certificate(
        &self,
        job: CheckJob,
        intake: mpsc::UnboundedSender<Alert>,
    ) -> PathVerdict {
        let CheckJob {
            service_name,
            cert_path,
            min_cert_lifetime,
        } = job;
        let lifetime = humantime::format_duration(min_cert_lifetime);

        let record = match CertificateReader::read(&service_name, &cert_path).await {
            Ok(record) => record,
            Err(e) => {
                error!(
                    service = %service_name,
                    cert_path = %cert_path.display(),
                    kind = e.kind(),
                    "{}",
                    e
                );
                self.stats.record_failed();
                return PathVerdict {
                    verdict: ExpiryVerdict::from(&e),
                    service_name,
                    cert_path,
                };
            }
        };

        debug!(
            service = %service_name,
            cert_path = %cert_path.display(),
            subject = record.subject.as_deref().unwrap_or("-"),
            fingerprint = %record.fingerprint,
            expiration = %record.not_after,
            "Successfully ingested service certificate"
        );

        let verdict = evaluate(self.now, record.not_after, min_cert_lifetime);
        match &verdict {
            ExpiryVerdict::Expiring { days_remaining } => {
                self.stats.record_expiring();
                warn!(
                    service = %service_name,
                    cert_path = %cert_path.display(),
                    now = %self.now,
                    expiration = %record.not_after,
                    days_remaining,
                    "Service certificate will expire within {}",
                    lifetime
                );
                self.emit_alerts(&service_name, &cert_path, *days_remaining, &intake)
                    .await;
            }
            _ => {
                self.stats.record_ok();
                info!(
                    service = %service_name,
                    cert_path = %cert_path.display(),
                    now = %self.now,
                    expiration = %record.not_after,
                    "Service certificate will not expire within {}",
                    lifetime
                );
            }
        }

        PathVerdict {
            service_name,
            cert_path,
            verdict,
        }
    }

    async fn emit_alerts(
        &self,
        service_name: &str,
        cert_path: &Path,
        days_remaining: i64,
        intake: &mpsc::UnboundedSender<Alert>,
    ) {
        if self.test_mode {
            info!(
                service = %service_name,
                cert_path = %cert_path.display(),
                days_remaining,
                "Test mode, not sending notifications"
            );
            return;
        }

        if self.sinks.is_empty() {
            warn!(service = %service_name, "No notification channels configured, alert dropped");
            return;
        }

        let ctx = AlertContext {
            service_name: service_name.to_string(),
            cert_path: cert_path.display().to_string(),
            num_days: days_remaining,
        };
        let text = match self.renderer.render(&ctx).await {
            Ok(text) => text,
            Err(e) => {
                error!(service = %service_name, cert_path = %cert_path.display(), "{}", e);
                return;
            }
        };

        let created_at = Utc::now();
        for sink in self.sinks.iter() {
            let alert = Alert {
                service_name: service_name.to_string(),
                cert_path: cert_path.to_path_buf(),
                rendered_text: text.clone(),
                created_at,
                sink: Arc::clone(sink),
            };
            if intake.send(alert).is_err() {
                warn!(service = %service_name, "Notification intake closed, alert dropped");
                return;
            }
            self.stats.record_alert();
        }
    }
}
