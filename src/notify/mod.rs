// src/notify/mod.rs
//! Notification sinks for expiring-certificate alerts
//!
//! Each sink exposes a single `send`. Adding a channel means adding one
//! implementation here; the check and dispatch stages never change.

use crate::config::Config;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub mod email;
pub mod slack;

pub use email::EmailSink;
pub use slack::SlackSink;

/// Per-send information a sink may use to address or bound the delivery
#[derive(Debug, Clone)]
pub struct SendContext {
    pub service_name: String,
    pub created_at: DateTime<Utc>,
    pub deadline: Instant,
}

impl SendContext {
    /// Time left before the run deadline, zero once it has passed
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// A delivery channel for alert text
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Channel name used in logs
    fn kind(&self) -> &str;

    /// Deliver `text` once; errors are reported by the caller and never retried
    async fn send(&self, ctx: &SendContext, text: &str) -> anyhow::Result<()>;
}

/// Build every channel configured for this run.
///
/// A channel whose settings are missing or invalid is skipped with a warning.
pub fn sinks_from_config(config: &Config, test_mode: bool) -> Vec<Arc<dyn NotificationSink>> {
    let notifications = config.notifications_for(test_mode);
    let mut sinks: Vec<Arc<dyn NotificationSink>> = Vec::new();

    if notifications.admin_email.is_empty() {
        tracing::warn!("No admin_email recipients configured, email notifications disabled");
    } else {
        match EmailSink::new(&config.email, &notifications.admin_email) {
            Ok(sink) => sinks.push(Arc::new(sink)),
            Err(e) => tracing::error!("Email notifications disabled: {:#}", e),
        }
    }

    match notifications.slack_alerts_url.as_deref() {
        Some(url) => match SlackSink::new(url) {
            Ok(sink) => sinks.push(Arc::new(sink)),
            Err(e) => tracing::error!("Slack notifications disabled: {:#}", e),
        },
        None => tracing::warn!("No slack_alerts_url configured, Slack notifications disabled"),
    }

    sinks
}
