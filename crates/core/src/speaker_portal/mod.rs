//! Speaker self-service portal.
//!
//! New speakers get a single-use, time-limited token. The public form
//! validates the token, shows the stored data and accepts one submission.

mod files;
mod portal;
mod submission;
mod token;

pub use files::{storage_name, FileStore, FileStoreError, LocalFileStore};
pub use portal::{PortalSettings, PortalSpeaker, SpeakerPortal};
pub use submission::{ImageUpload, Submission, IMAGE_FIELDS};
pub use token::{parse_expiry, token_digest, PortalTokenFilter};

use thiserror::Error;

use crate::hooks::ItemServiceError;
use crate::items::StoreError;

/// Portal failures. Display strings are shown to speakers.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Ungültiger oder unbekannter Link")]
    NotFound,

    #[error("Dieser Link ist abgelaufen")]
    Expired,

    #[error("Die Daten wurden bereits eingereicht")]
    AlreadySubmitted,

    #[error("{0}")]
    Validation(String),

    #[error("Upload failed: {0}")]
    Upload(#[from] FileStoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Service(#[from] ItemServiceError),
}

impl PortalError {
    /// Label for the submissions metric.
    pub fn metric_label(&self) -> &'static str {
        match self {
            PortalError::NotFound => "not_found",
            PortalError::Expired => "expired",
            PortalError::AlreadySubmitted => "already_submitted",
            PortalError::Validation(_) => "invalid",
            PortalError::Upload(_) | PortalError::Store(_) | PortalError::Service(_) => "error",
        }
    }
}
