// src/dispatch.rs
//! Notification dispatcher: one send task per alert, joined before completion

use crate::notify::SendContext;
use crate::stats::RunStats;
use crate::types::{Alert, NotificationOutcome};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Drains the alert intake and sends every alert independently
pub struct NotificationDispatcher {
    deadline: Instant,
    stats: RunStats,
}

impl NotificationDispatcher {
    pub fn new(deadline: Instant, stats: RunStats) -> Self {
        Self { deadline, stats }
    }

    /// Consume alerts until the intake closes, then wait for every send.
    ///
    /// Sends still running at the deadline are aborted and left out of the result.
    pub async fn drain(self, mut intake: mpsc::UnboundedReceiver<Alert>) -> Vec<NotificationOutcome> {
        let mut sends = JoinSet::new();

        while let Some(alert) = intake.recv().await {
            let stats = self.stats.clone();
            let deadline = self.deadline;
            sends.spawn(async move {
                let outcome = send_one(&alert, deadline).await;
                stats.record_send(outcome.success);
                outcome
            });
        }

        let mut outcomes = Vec::new();
        loop {
            match tokio::time::timeout_at(self.deadline, sends.join_next()).await {
                Ok(Some(Ok(outcome))) => outcomes.push(outcome),
                Ok(Some(Err(e))) => error!("Notification task failed: {}", e),
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        abandoned = sends.len(),
                        "Deadline reached, abandoning in-flight notifications"
                    );
                    sends.abort_all();
                    break;
                }
            }
        }

        outcomes
    }
}

async fn send_one(alert: &Alert, deadline: Instant) -> NotificationOutcome {
    let ctx = SendContext {
        service_name: alert.service_name.clone(),
        created_at: alert.created_at,
        deadline,
    };

    match alert.sink.send(&ctx, &alert.rendered_text).await {
        Ok(()) => {
            info!(
                notification_type = alert.sink_kind(),
                service = %alert.service_name,
                "Notification Sent"
            );
            NotificationOutcome::sent(alert)
        }
        Err(e) => {
            error!(
                notification_type = alert.sink_kind(),
                service = %alert.service_name,
                "Error sending notification: {:#}",
                e
            );
            NotificationOutcome::failed(alert, format!("{:#}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationSink;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct SlowSink {
        delay: Duration,
        fail: bool,
        sent: AtomicUsize,
    }

    #[async_trait]
    impl NotificationSink for SlowSink {
        fn kind(&self) -> &str {
            "slow"
        }

        async fn send(&self, _ctx: &SendContext, _text: &str) -> anyhow::Result<()> {
            tokio::time::sleep(self.delay).await;
            self.sent.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("sink unavailable");
            }
            Ok(())
        }
    }

    fn sink(delay: Duration, fail: bool) -> Arc<SlowSink> {
        Arc::new(SlowSink {
            delay,
            fail,
            sent: AtomicUsize::new(0),
        })
    }

    fn alert(sink: Arc<SlowSink>, service: &str) -> Alert {
        Alert {
            service_name: service.to_string(),
            cert_path: "/etc/cert.pem".into(),
            rendered_text: "expiring".to_string(),
            created_at: Utc::now(),
            sink,
        }
    }

    #[tokio::test]
    async fn test_drain_waits_for_every_send() {
        let slow = sink(Duration::from_millis(200), false);
        let (tx, rx) = mpsc::unbounded_channel();
        for i in 0..5 {
            tx.send(alert(slow.clone(), &format!("svc-{}", i))).unwrap();
        }
        drop(tx);

        let stats = RunStats::new();
        let dispatcher = NotificationDispatcher::new(Instant::now() + Duration::from_secs(10), stats.clone());
        let outcomes = dispatcher.drain(rx).await;

        assert_eq!(slow.sent.load(Ordering::SeqCst), 5);
        assert_eq!(outcomes.len(), 5);
        assert!(outcomes.iter().all(|o| o.success));
        assert_eq!(stats.snapshot().sends_succeeded, 5);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_other_sends() {
        let bad = sink(Duration::from_millis(10), true);
        let good = sink(Duration::from_millis(50), false);
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(alert(bad.clone(), "Alpha")).unwrap();
        tx.send(alert(good.clone(), "Alpha")).unwrap();
        drop(tx);

        let dispatcher = NotificationDispatcher::new(Instant::now() + Duration::from_secs(10), RunStats::new());
        let outcomes = dispatcher.drain(rx).await;

        assert_eq!(outcomes.len(), 2);
        let failed: Vec<_> = outcomes.iter().filter(|o| !o.success).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].error.as_deref(), Some("sink unavailable"));
        assert_eq!(good.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deadline_abandons_slow_sends() {
        let slow = sink(Duration::from_secs(30), false);
        let quick = sink(Duration::ZERO, false);
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(alert(slow.clone(), "Alpha")).unwrap();
        tx.send(alert(quick.clone(), "Beta")).unwrap();
        drop(tx);

        let started = Instant::now();
        let dispatcher = NotificationDispatcher::new(started + Duration::from_millis(300), RunStats::new());
        let outcomes = dispatcher.drain(rx).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].service_name, "Beta");
        assert_eq!(slow.sent.load(Ordering::SeqCst), 0);
    }
}
