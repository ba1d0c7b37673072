// src/types.rs
use crate::notify::NotificationSink;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Rendered alert text bound to one delivery channel
#[derive(Clone)]
pub struct Alert {
    pub service_name: String,
    pub cert_path: PathBuf,
    pub rendered_text: String,
    pub created_at: DateTime<Utc>,
    pub sink: Arc<dyn NotificationSink>,
}

impl Alert {
    pub fn sink_kind(&self) -> &str {
        self.sink.kind()
    }
}

impl fmt::Debug for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alert")
            .field("service_name", &self.service_name)
            .field("cert_path", &self.cert_path)
            .field("rendered_text", &self.rendered_text)
            .field("created_at", &self.created_at)
            .field("sink", &self.sink.kind())
            .finish()
    }
}

/// Result of one send attempt, kept for logging and the run summary
#[derive(Debug, Clone)]
pub struct NotificationOutcome {
    pub service_name: String,
    pub cert_path: PathBuf,
    pub sink_kind: String,
    pub success: bool,
    pub error: Option<String>,
}

impl NotificationOutcome {
    pub fn sent(alert: &Alert) -> Self {
        Self {
            service_name: alert.service_name.clone(),
            cert_path: alert.cert_path.clone(),
            sink_kind: alert.sink_kind().to_string(),
            success: true,
            error: None,
        }
    }

    pub fn failed(alert: &Alert, error: String) -> Self {
        Self {
            success: false,
            error: Some(error),
            ..Self::sent(alert)
        }
    }
}
