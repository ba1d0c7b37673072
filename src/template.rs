// src/template.rs
//! Alert text rendering

use async_trait::async_trait;
use handlebars::Handlebars;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("could not read expiring certificate template {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no expiring certificate template configured (global.template)")]
    NotConfigured,

    #[error("failed to execute expiring certificate template: {0}")]
    Render(String),
}

/// Values available to the template as `{{ServiceName}}`, `{{CertPath}}` and `{{NumDays}}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AlertContext {
    pub service_name: String,
    pub cert_path: String,
    pub num_days: i64,
}

#[async_trait]
pub trait AlertRenderer: Send + Sync {
    async fn render(&self, ctx: &AlertContext) -> Result<String, TemplateError>;
}

#[derive(Debug, Clone)]
enum TemplateSource {
    File(PathBuf),
    Inline(String),
    Missing,
}

/// Handlebars template, either inline or read from disk at render time
#[derive(Debug, Clone)]
pub struct AlertTemplate {
    source: TemplateSource,
}

impl AlertTemplate {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: TemplateSource::File(path.into()),
        }
    }

    pub fn inline(template: impl Into<String>) -> Self {
        Self {
            source: TemplateSource::Inline(template.into()),
        }
    }

    /// Use the configured path, or a template that fails every render if none is set
    pub fn from_config(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self::from_file(path),
            None => Self {
                source: TemplateSource::Missing,
            },
        }
    }

    fn render_source(template: &str, ctx: &AlertContext) -> Result<String, TemplateError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .render_template(template, ctx)
            .map_err(|e| TemplateError::Render(e.to_string()))
    }
}

#[async_trait]
impl AlertRenderer for AlertTemplate {
    async fn render(&self, ctx: &AlertContext) -> Result<String, TemplateError> {
        match &self.source {
            TemplateSource::Inline(template) => Self::render_source(template, ctx),
            TemplateSource::File(path) => {
                let template = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| TemplateError::Read {
                        path: path.clone(),
                        source,
                    })?;
                Self::render_source(&template, ctx)
            }
            TemplateSource::Missing => Err(TemplateError::NotConfigured),
        }
    }
}
