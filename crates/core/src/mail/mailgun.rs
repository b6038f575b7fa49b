//! Mailgun HTTP API mail transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::Client;
use tracing::debug;

use super::{EmailMessage, MailError, Mailer};
use crate::config::MailgunConfig;

/// Mailer that posts multipart forms to `/{domain}/messages`.
pub struct MailgunMailer {
    client: Client,
    base_url: String,
    domain: String,
    api_key: String,
    from: String,
}

impl MailgunMailer {
    pub fn new(config: MailgunConfig, from: String, from_name: String) -> Result<Self, MailError> {
        if !config.is_configured() {
            return Err(MailError::NotConfigured(
                "Mailgun api_key and domain are required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://api.eu.mailgun.net/v3".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            domain: config.domain,
            api_key: config.api_key,
            from: format!("{} <{}>", from_name, from),
        })
    }

    fn form(&self, message: &EmailMessage) -> Form {
        let mut form = Form::new()
            .text("from", self.from.clone())
            .text("to", message.to.clone())
            .text("subject", message.subject.clone())
            .text("text", message.text.clone())
            .text("html", message.html.clone())
            .text("o:tag", message.template.clone());

        if let Some(reply_to) = &message.reply_to {
            form = form.text("h:Reply-To", reply_to.clone());
        }

        form
    }
}

#[async_trait]
impl Mailer for MailgunMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let url = format!("{}/{}/messages", self.base_url, self.domain);

        debug!(to = %message.to, template = %message.template, "Sending email via Mailgun");

        let response = self
            .client
            .post(&url)
            .basic_auth("api", Some(&self.api_key))
            .multipart(self.form(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "mailgun"
    }
}
