//! Mock mailer for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::mail::{EmailMessage, MailError, Mailer};

/// A recorded send attempt.
#[derive(Debug, Clone)]
pub struct RecordedEmail {
    pub message: EmailMessage,
    pub success: bool,
}

/// Mock implementation of the Mailer trait.
///
/// Records every send attempt; `set_next_error` makes the next send fail.
#[derive(Debug, Default)]
pub struct MockMailer {
    attempts: Arc<RwLock<Vec<RecordedEmail>>>,
    next_error: Arc<RwLock<Option<MailError>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages that were sent successfully.
    pub async fn sent_messages(&self) -> Vec<EmailMessage> {
        self.attempts
            .read()
            .await
            .iter()
            .filter(|a| a.success)
            .map(|a| a.message.clone())
            .collect()
    }

    /// All attempts, including failed ones.
    pub async fn recorded_attempts(&self) -> Vec<RecordedEmail> {
        self.attempts.read().await.clone()
    }

    pub async fn set_next_error(&self, error: MailError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn clear(&self) {
        self.attempts.write().await.clear();
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let error = self.next_error.write().await.take();
        self.attempts.write().await.push(RecordedEmail {
            message: message.clone(),
            success: error.is_none(),
        });
        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn transport_name(&self) -> &'static str {
        "mock"
    }
}
