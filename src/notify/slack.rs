// src/notify/slack.rs
//! Slack sink - posts alert text to an incoming-webhook URL

use crate::notify::{NotificationSink, SendContext};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use url::Url;

/// Slack incoming-webhook channel
pub struct SlackSink {
    client: Client,
    url: Url,
}

#[derive(Serialize)]
struct SlackPayload<'a> {
    text: &'a str,
}

impl SlackSink {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let url = Url::parse(url).with_context(|| format!("invalid slack_alerts_url {:?}", url))?;
        Ok(Self {
            client: Client::new(),
            url,
        })
    }
}

#[async_trait]
impl NotificationSink for SlackSink {
    fn kind(&self) -> &str {
        "slack"
    }

    async fn send(&self, ctx: &SendContext, text: &str) -> anyhow::Result<()> {
        let resp = self
            .client
            .post(self.url.clone())
            .timeout(ctx.remaining())
            .json(&SlackPayload { text })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Slack webhook returned status {}: {}", status, body);
        }

        Ok(())
    }
}
