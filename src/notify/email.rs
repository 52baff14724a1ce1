use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::AsyncSmtpTransport;
use lettre::{AsyncTransport, Tokio1Executor};
use tracing::info;

use super::Notifier;
use crate::config::EmailConfig;
use crate::error::{ConfigError, NotifyError};
use crate::model::NotificationPayload;

pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Builds the SMTP transport from config; the password comes from the
    /// environment. Bad addresses and missing credentials are configuration
    /// errors, surfaced before the run starts.
    pub fn from_config(config: &EmailConfig) -> Result<Self, ConfigError> {
        let password = std::env::var(&config.password_env)
            .map_err(|_| ConfigError::MissingEnv(config.password_env.clone()))?;

        let from: Mailbox = config.from.parse().map_err(|e| ConfigError::BadAddress {
            address: config.from.clone(),
            message: format!("{e}"),
        })?;
        let to: Mailbox = config.to.parse().map_err(|e| ConfigError::BadAddress {
            address: config.to.clone(),
            message: format!("{e}"),
        })?;

        let creds = Credentials::new(config.from.clone(), password);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| ConfigError::BadSmtpHost {
                host: config.smtp_host.clone(),
                message: e.to_string(),
            })?
            .credentials(creds)
            .build();

        Ok(Self { mailer, from, to })
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn deliver(&self, payload: Option<&NotificationPayload>) -> Result<(), NotifyError> {
        let body = match payload {
            Some(payload) => render_digest_html(payload),
            None => render_caught_up_html(),
        };

        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject("Your AI News Digest")
            .header(header::ContentType::TEXT_HTML)
            .body(body)
            .context("failed to build email message")
            .map_err(NotifyError)?;

        self.mailer
            .send(msg)
            .await
            .context("failed to send email")
            .map_err(NotifyError)?;

        info!("email delivered to {}", self.to);
        Ok(())
    }
}

fn render_digest_html(payload: &NotificationPayload) -> String {
    let mut items_html = String::new();
    for item in &payload.items {
        items_html.push_str(&format!(
            r#"<div style="background-color: #f8f9fa; border-left: 4px solid #4a90e2; padding: 20px; margin: 20px 0; border-radius: 4px;">
    <h2 style="color: #2c3e50; margin: 0 0 10px 0; font-size: 20px;">{title}</h2>
    <p style="color: #555; line-height: 1.6; margin: 10px 0;">{summary}</p>
    <a href="{url}" style="display: inline-block; background-color: #4a90e2; color: white; padding: 10px 20px; text-decoration: none; border-radius: 4px; font-weight: bold;">Read More</a>
    <div style="color: #888; font-size: 14px; margin-top: 15px;">Source: {source}</div>
</div>
"#,
            title = item.title,
            summary = item.summary,
            url = item.url,
            source = item.source,
        ));
    }

    wrap_html(&format!(
        r#"<p style="font-size: 18px; color: #4a90e2; font-weight: bold; margin: 0 0 20px 0;">{date}</p>
<p style="color: #555; line-height: 1.8; margin-bottom: 30px;">{introduction}</p>
{items_html}"#,
        date = Utc::now().format("%B %e, %Y"),
        introduction = payload.introduction,
    ))
}

fn render_caught_up_html() -> String {
    wrap_html(
        r#"<p style="color: #555; line-height: 1.8;">You're all caught up for today, check again tomorrow :)</p>"#,
    )
}

fn wrap_html(inner: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>AI News Digest</title>
</head>
<body style="font-family: Arial, Helvetica, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background-color: #4a90e2; color: white; padding: 30px; text-align: center; border-radius: 8px 8px 0 0;">
        <h1 style="margin: 0; font-size: 28px;">AI News Digest</h1>
    </div>
    <div style="background-color: white; padding: 30px; border: 1px solid #e0e0e0; border-top: none;">
        {inner}
    </div>
    <div style="text-align: center; padding: 20px; color: #888; font-size: 12px;">
        <p>AI News Aggregator | Automated Daily Digest</p>
    </div>
</body>
</html>"#
    )
}
