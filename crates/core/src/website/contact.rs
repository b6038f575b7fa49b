//! Contact form.

use std::str::FromStr;

use lettre::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::mail::{send_tracked, templates, MailError, Mailer};

#[derive(Debug, Error)]
pub enum ContactError {
    /// Shown to the visitor as is.
    #[error("{0}")]
    Invalid(String),

    #[error("Contact form is not configured")]
    NotConfigured,

    #[error(transparent)]
    Mail(#[from] MailError),
}

/// Form fields. `website` is a honeypot that humans never see.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub website: Option<String>,
}

/// What happened to a submitted form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Sent,
    /// Honeypot filled; dropped without sending.
    Discarded,
}

impl ContactForm {
    /// First invalid field wins.
    pub fn validate(&self) -> Result<(), ContactError> {
        let name = self.name.trim();
        if name.chars().count() < 2 {
            return Err(ContactError::Invalid("Bitte gib deinen Namen an".to_string()));
        }
        if name.chars().count() > 100 {
            return Err(ContactError::Invalid("Der Name ist zu lang".to_string()));
        }
        if Address::from_str(self.email.trim()).is_err() {
            return Err(ContactError::Invalid(
                "Bitte gib eine gültige E-Mail-Adresse an".to_string(),
            ));
        }
        let message = self.message.trim().chars().count();
        if message < 10 {
            return Err(ContactError::Invalid(
                "Die Nachricht muss mindestens 10 Zeichen lang sein".to_string(),
            ));
        }
        if message > 5000 {
            return Err(ContactError::Invalid(
                "Die Nachricht darf höchstens 5000 Zeichen lang sein".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_spam(&self) -> bool {
        self.website.as_deref().is_some_and(|w| !w.trim().is_empty())
    }
}

/// Validate and forward a contact form to the team address.
pub async fn submit_contact(
    mailer: Option<&dyn Mailer>,
    to: Option<&str>,
    form: &ContactForm,
) -> Result<ContactOutcome, ContactError> {
    if form.is_spam() {
        warn!("Contact form honeypot filled, discarding");
        return Ok(ContactOutcome::Discarded);
    }

    form.validate()?;

    let (Some(mailer), Some(to)) = (mailer, to) else {
        return Err(ContactError::NotConfigured);
    };

    let message = templates::contact_form(
        to,
        form.name.trim(),
        form.email.trim(),
        form.message.trim(),
    );
    send_tracked(mailer, &message).await?;
    info!("Forwarded contact form message");
    Ok(ContactOutcome::Sent)
}
