//! Outgoing email.
//!
//! [`Mailer`] abstracts the transport (SMTP relay or the Mailgun HTTP API);
//! [`templates`] renders the messages the workflows send.

mod mailgun;
mod smtp;
pub mod templates;

pub use mailgun::MailgunMailer;
pub use smtp::SmtpMailer;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{EmailConfig, EmailTransport};
use crate::metrics::EMAILS_SENT;

/// Errors that can occur when sending mail.
#[derive(Debug, Error)]
pub enum MailError {
    /// Address could not be parsed.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Message could not be built.
    #[error("Failed to build message: {0}")]
    Build(String),

    /// Transport failed to deliver.
    #[error("Failed to send email: {0}")]
    Transport(String),

    /// Provider returned an error status.
    #[error("Mail API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Transport not configured.
    #[error("Mail transport not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for MailError {
    fn from(e: reqwest::Error) -> Self {
        MailError::Transport(e.to_string())
    }
}

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
    /// Template name, used for metrics.
    pub template: String,
}

/// Sends rendered messages.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;

    /// Name of this transport
    fn transport_name(&self) -> &'static str;
}

/// Send and record the outcome in metrics.
pub async fn send_tracked(mailer: &dyn Mailer, message: &EmailMessage) -> Result<(), MailError> {
    let result = mailer.send(message).await;
    let outcome = if result.is_ok() { "sent" } else { "failed" };
    EMAILS_SENT
        .with_label_values(&[message.template.as_str(), outcome])
        .inc();
    result
}

/// Create the configured mailer, `Ok(None)` when no transport is configured.
pub fn create_mailer(config: &EmailConfig) -> Result<Option<Arc<dyn Mailer>>, MailError> {
    match config.effective_transport() {
        Some(EmailTransport::Mailgun) => {
            info!("Using Mailgun mail transport (domain: {})", config.mailgun.domain);
            Ok(Some(Arc::new(MailgunMailer::new(
                config.mailgun.clone(),
                config.from.clone(),
                config.from_name.clone(),
            )?)))
        }
        Some(EmailTransport::Smtp) => {
            info!("Using SMTP mail transport ({}:{})", config.smtp.host, config.smtp.port);
            Ok(Some(Arc::new(SmtpMailer::new(
                config.smtp.clone(),
                config.from.clone(),
                config.from_name.clone(),
            )?)))
        }
        None => Ok(None),
    }
}
