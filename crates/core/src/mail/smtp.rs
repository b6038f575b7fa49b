//! SMTP mail transport using Lettre.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::debug;

use super::{EmailMessage, MailError, Mailer};
use crate::config::SmtpConfig;

/// SMTP relay mailer.
///
/// A transport is built per message; lettre's blocking transport runs on the
/// blocking thread pool.
pub struct SmtpMailer {
    config: SmtpConfig,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig, from: String, from_name: String) -> Result<Self, MailError> {
        if !config.is_configured() {
            return Err(MailError::NotConfigured(
                "SMTP host is required".to_string(),
            ));
        }

        let from = format!("{} <{}>", from_name, from)
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidAddress(format!("from: {}", e)))?;

        Ok(Self { config, from })
    }

    fn build_transport(&self) -> Result<SmtpTransport, MailError> {
        let mut builder = SmtpTransport::relay(&self.config.host)
            .map_err(|e| MailError::Transport(format!("SMTP relay error: {}", e)))?
            .port(self.config.port);

        if let (Some(user), Some(password)) = (&self.config.user, &self.config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(builder.build())
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, MailError> {
        let to = message
            .to
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidAddress(format!("{}: {}", message.to, e)))?;

        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone());

        if let Some(reply_to) = &message.reply_to {
            builder = builder.reply_to(
                reply_to
                    .parse::<Mailbox>()
                    .map_err(|e| MailError::InvalidAddress(format!("{}: {}", reply_to, e)))?,
            );
        }

        builder
            .multipart(MultiPart::alternative_plain_html(
                message.text.clone(),
                message.html.clone(),
            ))
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let email = self.build_message(message)?;
        let mailer = self.build_transport()?;

        debug!(to = %message.to, template = %message.template, "Sending email via SMTP");

        tokio::task::spawn_blocking(move || {
            mailer
                .send(&email)
                .map_err(|e| MailError::Transport(e.to_string()))
        })
        .await
        .map_err(|e| MailError::Transport(format!("Email task failed: {}", e)))?
        .map(|_| ())
    }

    fn transport_name(&self) -> &'static str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailer() -> SmtpMailer {
        SmtpMailer::new(
            SmtpConfig {
                host: "smtp.example.com".to_string(),
                ..Default::default()
            },
            "tickets@programmier.bar".to_string(),
            "programmier.bar".to_string(),
        )
        .unwrap()
    }

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            reply_to: Some("hallo@programmier.bar".to_string()),
            subject: "Deine Tickets".to_string(),
            html: "<p>Hallo</p>".to_string(),
            text: "Hallo".to_string(),
            template: "test".to_string(),
        }
    }

    #[test]
    fn test_requires_host() {
        let result = SmtpMailer::new(
            SmtpConfig::default(),
            "a@b.de".to_string(),
            "x".to_string(),
        );
        assert!(matches!(result, Err(MailError::NotConfigured(_))));
    }

    #[test]
    fn test_invalid_from_address() {
        let result = SmtpMailer::new(
            SmtpConfig {
                host: "smtp.example.com".to_string(),
                ..Default::default()
            },
            "not an address".to_string(),
            "x".to_string(),
        );
        assert!(matches!(result, Err(MailError::InvalidAddress(_))));
    }

    #[test]
    fn test_build_message() {
        let built = mailer().build_message(&message("ada@example.com")).unwrap();
        let raw = String::from_utf8(built.formatted()).unwrap();
        assert!(raw.contains("Subject: Deine Tickets"));
        assert!(raw.contains("To: ada@example.com"));
        assert!(raw.contains("Reply-To: hallo@programmier.bar"));
    }

    #[test]
    fn test_build_message_invalid_recipient() {
        let result = mailer().build_message(&message("kaputt"));
        assert!(matches!(result, Err(MailError::InvalidAddress(_))));
    }
}
