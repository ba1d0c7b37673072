// src/notify/email.rs
//! Email sink - plain-text alert through an SMTP relay

use crate::config::EmailConfig;
use crate::notify::{NotificationSink, SendContext};
use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Email alert channel
#[derive(Debug)]
pub struct EmailSink {
    from: Mailbox,
    to: Vec<Mailbox>,
    smtp_host: String,
    smtp_port: u16,
}

impl EmailSink {
    pub fn new(config: &EmailConfig, recipients: &[String]) -> anyhow::Result<Self> {
        let from = config
            .from
            .as_deref()
            .context("email.from is not configured")?
            .parse::<Mailbox>()
            .context("invalid email.from address")?;

        let to = recipients
            .iter()
            .map(|addr| {
                addr.parse::<Mailbox>()
                    .with_context(|| format!("invalid admin_email address {:?}", addr))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            from,
            to,
            smtp_host: config.smtphost.clone(),
            smtp_port: config.smtpport,
        })
    }

    fn subject(ctx: &SendContext) -> String {
        format!(
            "Service Certificates Check ({}), {}",
            ctx.service_name,
            ctx.created_at.format("%d %b %y %H:%M UTC")
        )
    }

    fn build_message(&self, ctx: &SendContext, text: &str) -> anyhow::Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(Self::subject(ctx))
            .header(ContentType::TEXT_PLAIN);

        for to in &self.to {
            builder = builder.to(to.clone());
        }

        Ok(builder.body(text.to_string())?)
    }
}

#[async_trait]
impl NotificationSink for EmailSink {
    fn kind(&self) -> &str {
        "email"
    }

    async fn send(&self, ctx: &SendContext, text: &str) -> anyhow::Result<()> {
        let message = self.build_message(ctx, text)?;

        let transport: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(self.smtp_host.as_str())
                .port(self.smtp_port)
                .timeout(Some(ctx.remaining()))
                .build();

        transport
            .send(message)
            .await
            .with_context(|| format!("SMTP delivery via {}:{} failed", self.smtp_host, self.smtp_port))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;
    use tokio::time::Instant;

    fn create_test_config() -> EmailConfig {
        EmailConfig {
            from: Some("certs@example.org".to_string()),
            smtphost: "127.0.0.1".to_string(),
            smtpport: 25,
        }
    }

    fn ctx() -> SendContext {
        SendContext {
            service_name: "Alpha".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 4, 9, 30, 0).unwrap(),
            deadline: Instant::now() + Duration::from_secs(5),
        }
    }

    #[test]
    fn test_email_sink_new() {
        let sink = EmailSink::new(
            &create_test_config(),
            &["ops@example.org".to_string(), "dev@example.org".to_string()],
        )
        .unwrap();
        assert_eq!(sink.to.len(), 2);
        assert_eq!(sink.kind(), "email");
    }

    #[test]
    fn test_missing_from_rejected() {
        let mut config = create_test_config();
        config.from = None;
        assert!(EmailSink::new(&config, &["ops@example.org".to_string()]).is_err());
    }

    #[test]
    fn test_invalid_recipient_rejected() {
        assert!(EmailSink::new(&create_test_config(), &["not an address".to_string()]).is_err());
    }

    #[test]
    fn test_message_subject_and_body() {
        let sink = EmailSink::new(&create_test_config(), &["ops@example.org".to_string()]).unwrap();
        let message = sink.build_message(&ctx(), "Alpha expires in 5 days").unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();

        assert!(formatted.contains("Subject: Service Certificates Check (Alpha), 04 Mar 26 09:30 UTC"));
        assert!(formatted.contains("To: ops@example.org"));
        assert!(formatted.contains("Alpha expires in 5 days"));
    }

    #[tokio::test]
    async fn test_send_to_closed_port_fails() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut config = create_test_config();
        config.smtpport = port;
        let sink = EmailSink::new(&config, &["ops@example.org".to_string()]).unwrap();

        assert!(sink.send(&ctx(), "body").await.is_err());
    }
}
