//! Mock transcription service for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::transcription::{
    ExportState, Transcriber, TranscriptionError, TranscriptionRequest, TranscriptionState,
};

/// Mock implementation of the Transcriber trait.
///
/// Job state, export state and downloaded text are set by the test.
#[derive(Debug)]
pub struct MockTranscriber {
    submitted: Arc<RwLock<Vec<TranscriptionRequest>>>,
    state: Arc<RwLock<TranscriptionState>>,
    export: Arc<RwLock<ExportState>>,
    text: Arc<RwLock<String>>,
    next_error: Arc<RwLock<Option<TranscriptionError>>>,
}

impl Default for MockTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscriber {
    pub fn new() -> Self {
        Self {
            submitted: Arc::new(RwLock::new(Vec::new())),
            state: Arc::new(RwLock::new(TranscriptionState::Processing)),
            export: Arc::new(RwLock::new(ExportState::Pending)),
            text: Arc::new(RwLock::new(String::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn submitted(&self) -> Vec<TranscriptionRequest> {
        self.submitted.read().await.clone()
    }

    pub async fn set_state(&self, state: TranscriptionState) {
        *self.state.write().await = state;
    }

    pub async fn set_export(&self, export: ExportState) {
        *self.export.write().await = export;
    }

    pub async fn set_text(&self, text: &str) {
        *self.text.write().await = text.to_string();
    }

    pub async fn set_next_error(&self, error: TranscriptionError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Result<(), TranscriptionError> {
        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn submit(&self, request: &TranscriptionRequest) -> Result<String, TranscriptionError> {
        self.take_error().await?;
        let mut submitted = self.submitted.write().await;
        submitted.push(request.clone());
        Ok(format!("mock-{}", submitted.len()))
    }

    async fn status(&self, _transcription_id: &str) -> Result<TranscriptionState, TranscriptionError> {
        self.take_error().await?;
        Ok(self.state.read().await.clone())
    }

    async fn request_export(&self, transcription_id: &str) -> Result<String, TranscriptionError> {
        self.take_error().await?;
        Ok(format!("export-{}", transcription_id))
    }

    async fn export_state(&self, _export_id: &str) -> Result<ExportState, TranscriptionError> {
        self.take_error().await?;
        Ok(self.export.read().await.clone())
    }

    async fn download(&self, _download_url: &str) -> Result<String, TranscriptionError> {
        self.take_error().await?;
        Ok(self.text.read().await.clone())
    }
}
