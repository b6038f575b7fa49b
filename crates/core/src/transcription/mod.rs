//! Episode transcription through HappyScribe.
//!
//! Creating a `transcripts` item submits its audio; [`TranscriptSync`]
//! later polls the job, requests a text export and stores the result.

mod happyscribe;
mod sync;

pub use happyscribe::{map_transcription_state, HappyScribeClient};
pub use sync::{SyncOutcome, TranscriptHook, TranscriptSync, TRANSCRIPTS};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::HappyScribeConfig;
use crate::items::StoreError;

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Transcription service not configured: {0}")]
    NotConfigured(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transcript state: {0}")]
    InvalidState(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Audio to transcribe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionRequest {
    /// Display name of the job.
    pub name: String,
    /// Publicly reachable audio file.
    pub audio_url: String,
}

/// Progress of a transcription job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum TranscriptionState {
    Processing,
    Done,
    Failed(String),
}

/// Progress of a text export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportState {
    Pending,
    Ready { download_url: String },
    Failed(String),
}

/// Transcription service operations.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Start a transcription and return its id.
    async fn submit(&self, request: &TranscriptionRequest) -> Result<String, TranscriptionError>;

    async fn status(&self, transcription_id: &str) -> Result<TranscriptionState, TranscriptionError>;

    /// Request a plain-text export; returns the export id.
    async fn request_export(&self, transcription_id: &str) -> Result<String, TranscriptionError>;

    async fn export_state(&self, export_id: &str) -> Result<ExportState, TranscriptionError>;

    async fn download(&self, download_url: &str) -> Result<String, TranscriptionError>;
}

/// HappyScribe client when an API key is configured.
pub fn create_transcriber(config: &HappyScribeConfig) -> Option<Arc<dyn Transcriber>> {
    if !config.is_configured() {
        return None;
    }
    match HappyScribeClient::new(config.clone()) {
        Ok(client) => {
            info!("HappyScribe transcription enabled ({})", config.language);
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!("HappyScribe transcription disabled: {}", e);
            None
        }
    }
}
