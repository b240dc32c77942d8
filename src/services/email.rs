//! Transactional notification email with bounded retry.

use crate::config::EmailConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tera::{Context, Tera};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    #[error("no notification recipients configured")]
    NoRecipients,
    #[error("email API key is not configured")]
    MissingApiKey,
    #[error("rate limit exceeded: {0}")]
    RateLimitExceeded(String),
    #[error("email provider internal error: {0}")]
    InternalServerError(String),
    #[error("email provider application error: {0}")]
    ApplicationError(String),
    #[error("email provider rejected the credentials: {0}")]
    Unauthorized(String),
    #[error("email rejected: {0}")]
    Validation(String),
    #[error("failed to render email template: {0}")]
    Template(String),
}

impl EmailError {
    /// Only these kinds are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded(_) | Self::InternalServerError(_) | Self::ApplicationError(_)
        )
    }
}

/// Resolves notification recipients: the numbered addresses if any are set,
/// otherwise the comma-separated `notify_to`.
pub fn recipients(config: &EmailConfig) -> Result<Vec<String>, EmailError> {
    let discrete: Vec<String> = [&config.notify_to_1, &config.notify_to_2, &config.notify_to_3]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect();
    if !discrete.is_empty() {
        return Ok(discrete);
    }

    let listed: Vec<String> = config
        .notify_to
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect();
    if listed.is_empty() {
        return Err(EmailError::NoRecipients);
    }
    Ok(listed)
}

/// Scoped to the message type so keys never collide across notification kinds.
pub fn idempotency_key(message_type: &str) -> String {
    format!("{}/{}", message_type, Uuid::new_v4())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Sends one message and returns the provider's message id.
    async fn send(&self, message: &EmailMessage, idempotency_key: &str) -> Result<String, EmailError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &EmailConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.backoff_base_ms),
        }
    }

    /// Delay before the `retry`-th retry (1-based): `base * 2^retry`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << retry.min(16))
    }
}

/// A rendered-on-send notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message_type: &'static str,
    pub subject: String,
    pub template: &'static str,
    pub context: Context,
    pub reply_to: Option<String>,
}

pub struct Mailer {
    transport: Arc<dyn EmailTransport>,
    templates: Tera,
    config: EmailConfig,
    retry: RetryPolicy,
}

impl Mailer {
    pub fn new(config: EmailConfig, transport: Arc<dyn EmailTransport>) -> anyhow::Result<Self> {
        let retry = RetryPolicy::from_config(&config);
        Ok(Self {
            transport,
            templates: email_templates()?,
            config,
            retry,
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn render(&self, notification: &Notification) -> Result<(String, String), EmailError> {
        let html = self
            .templates
            .render(&format!("{}.html", notification.template), &notification.context)
            .map_err(|e| EmailError::Template(e.to_string()))?;
        let text = self
            .templates
            .render(&format!("{}.txt", notification.template), &notification.context)
            .map_err(|e| EmailError::Template(e.to_string()))?;
        Ok((html, text))
    }

    /// Delivers `notification`, retrying transient failures with exponential backoff.
    pub async fn send(&self, notification: &Notification) -> Result<String, EmailError> {
        let to = recipients(&self.config)?;
        let (html, text) = self.render(notification)?;
        let message = EmailMessage {
            from: self.config.from.clone(),
            to,
            subject: notification.subject.clone(),
            html,
            text,
            reply_to: notification.reply_to.clone(),
        };
        let key = idempotency_key(notification.message_type);

        let mut retry = 0;
        loop {
            match self.transport.send(&message, &key).await {
                Ok(id) => {
                    tracing::info!(
                        message_type = notification.message_type,
                        email_id = %id,
                        retries = retry,
                        "Notification email sent"
                    );
                    return Ok(id);
                }
                Err(e) if e.is_retryable() && retry < self.retry.max_retries => {
                    retry += 1;
                    let delay = self.retry.delay_for_retry(retry);
                    tracing::warn!(
                        "Email send failed ({}), retry {}/{} in {:.1}s",
                        e,
                        retry,
                        self.retry.max_retries,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        message_type = notification.message_type,
                        retries = retry,
                        "Notification email failed: {}",
                        e
                    );
                    return Err(e);
                }
            }
        }
    }
}

fn email_templates() -> anyhow::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("form_submission.html", include_str!("../../templates/emails/form_submission.html")),
        ("form_submission.txt", include_str!("../../templates/emails/form_submission.txt")),
    ])?;
    // Plain-text bodies must not be HTML-escaped.
    tera.autoescape_on(vec![".html"]);
    Ok(tera)
}

/// Posts messages to the Resend HTTP API.
pub struct ResendTransport {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl ResendTransport {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(config: &EmailConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("steeple/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.resolved_api_key(),
        })
    }
}

#[derive(Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Deserialize, Default)]
struct ErrorResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
}

/// Maps a provider error to its kind by `name`, falling back to the HTTP status.
pub fn classify_error(status: u16, name: &str, message: &str) -> EmailError {
    let message = message.to_string();
    match name {
        "rate_limit_exceeded" => EmailError::RateLimitExceeded(message),
        "internal_server_error" => EmailError::InternalServerError(message),
        "application_error" => EmailError::ApplicationError(message),
        "missing_api_key" | "invalid_api_key" | "restricted_api_key" => {
            EmailError::Unauthorized(message)
        }
        _ => match status {
            429 => EmailError::RateLimitExceeded(message),
            401 | 403 => EmailError::Unauthorized(message),
            500..=599 => EmailError::InternalServerError(message),
            _ => EmailError::Validation(message),
        },
    }
}

#[async_trait]
impl EmailTransport for ResendTransport {
    async fn send(&self, message: &EmailMessage, idempotency_key: &str) -> Result<String, EmailError> {
        let api_key = self.api_key.as_deref().ok_or(EmailError::MissingApiKey)?;

        let res = self
            .http
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(api_key)
            .header("Idempotency-Key", idempotency_key)
            .json(message)
            .send()
            .await
            .map_err(|e| EmailError::ApplicationError(e.to_string()))?;

        let status = res.status();
        if status.is_success() {
            let body: SendResponse = res
                .json()
                .await
                .map_err(|e| EmailError::ApplicationError(e.to_string()))?;
            return Ok(body.id);
        }

        let body: ErrorResponse = res.json().await.unwrap_or_default();
        Err(classify_error(status.as_u16(), &body.name, &body.message))
    }
}
