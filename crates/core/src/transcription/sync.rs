//! Transcript submission hook and result polling.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::{ExportState, Transcriber, TranscriptionError, TranscriptionRequest, TranscriptionState};
use crate::hooks::{ActionHook, HookContext, HookError, HookMeta};
use crate::items::{fields, Item, ItemStore};
use crate::metrics::TRANSCRIPTIONS;

/// Collection of transcripts.
pub const TRANSCRIPTS: &str = "transcripts";

fn record<T, E>(operation: &str, result: &Result<T, E>) {
    let outcome = if result.is_ok() { "ok" } else { "error" };
    TRANSCRIPTIONS.with_label_values(&[operation, outcome]).inc();
}

/// Action on `transcripts.items.create` that submits the audio.
pub struct TranscriptHook {
    store: Arc<dyn ItemStore>,
    transcriber: Arc<dyn Transcriber>,
}

impl TranscriptHook {
    pub fn new(store: Arc<dyn ItemStore>, transcriber: Arc<dyn Transcriber>) -> Self {
        Self { store, transcriber }
    }

    async fn submit(&self, key: &str, transcript: &Item) -> Result<(), HookError> {
        let Some(audio_url) = fields::text(transcript, "audio_url") else {
            self.store.update(
                TRANSCRIPTS,
                key,
                &fields::object(json!({"status": "failed", "error_message": "audio_url is missing"})),
            )?;
            return Ok(());
        };

        let name = match fields::relation_id(transcript, "podcast") {
            Some(podcast_id) => self
                .store
                .get("podcasts", &podcast_id)?
                .and_then(|podcast| fields::text(&podcast, "title"))
                .unwrap_or(podcast_id),
            None => format!("Transcript {}", key),
        };

        let result = self
            .transcriber
            .submit(&TranscriptionRequest { name, audio_url })
            .await;
        record("submit", &result);

        let patch = match result {
            Ok(happyscribe_id) => {
                info!(transcript = key, happyscribe_id = %happyscribe_id, "Submitted transcription");
                json!({"status": "processing", "happyscribe_id": happyscribe_id, "error_message": Value::Null})
            }
            Err(e) => {
                warn!(transcript = key, "Submitting transcription failed: {}", e);
                json!({"status": "failed", "error_message": e.to_string()})
            }
        };
        self.store.update(TRANSCRIPTS, key, &fields::object(patch))?;
        Ok(())
    }
}

#[async_trait]
impl ActionHook for TranscriptHook {
    fn name(&self) -> &'static str {
        "transcript"
    }

    async fn action(&self, payload: &Item, meta: &HookMeta, _ctx: &HookContext) -> Result<(), HookError> {
        if fields::text(payload, "happyscribe_id").is_some() {
            return Ok(());
        }
        for key in &meta.keys {
            if let Err(e) = self.submit(key, payload).await {
                error!(transcript = %key, "Transcript hook failed: {}", e);
            }
        }
        Ok(())
    }
}

/// Result of one sync step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// HappyScribe is still transcribing.
    Processing,
    /// Export requested, text not available yet.
    Exporting { export_id: String },
    Completed { characters: usize },
    Failed { message: String },
}

/// Advances a processing transcript towards `completed`.
pub struct TranscriptSync {
    store: Arc<dyn ItemStore>,
    transcriber: Arc<dyn Transcriber>,
}

impl TranscriptSync {
    pub fn new(store: Arc<dyn ItemStore>, transcriber: Arc<dyn Transcriber>) -> Self {
        Self { store, transcriber }
    }

    pub async fn sync(&self, id: &str) -> Result<SyncOutcome, TranscriptionError> {
        let transcript = self
            .store
            .get(TRANSCRIPTS, id)?
            .ok_or_else(|| TranscriptionError::NotFound(format!("transcript {}", id)))?;

        let status = fields::text(&transcript, "status").unwrap_or_default();
        if status != "processing" {
            return Err(TranscriptionError::InvalidState(format!(
                "transcript {} is '{}', expected 'processing'",
                id, status
            )));
        }
        let happyscribe_id = fields::text(&transcript, "happyscribe_id").ok_or_else(|| {
            TranscriptionError::InvalidState(format!("transcript {} has no happyscribe_id", id))
        })?;

        let export_id = match fields::text(&transcript, "export_id") {
            Some(export_id) => export_id,
            None => {
                let state = self.transcriber.status(&happyscribe_id).await;
                record("status", &state);
                match state? {
                    TranscriptionState::Processing => return Ok(SyncOutcome::Processing),
                    TranscriptionState::Failed(message) => return self.fail(id, message),
                    TranscriptionState::Done => {}
                }

                let export = self.transcriber.request_export(&happyscribe_id).await;
                record("export", &export);
                let export_id = export?;
                self.store
                    .update(TRANSCRIPTS, id, &fields::object(json!({"export_id": export_id})))?;
                export_id
            }
        };

        let state = self.transcriber.export_state(&export_id).await;
        record("export_state", &state);
        match state? {
            ExportState::Pending => Ok(SyncOutcome::Exporting { export_id }),
            ExportState::Failed(message) => {
                // Drop the export so the next sync requests a fresh one.
                self.store
                    .update(TRANSCRIPTS, id, &fields::object(json!({"export_id": Value::Null})))?;
                warn!(transcript = id, "Export failed: {}", message);
                Ok(SyncOutcome::Exporting { export_id })
            }
            ExportState::Ready { download_url } => {
                let text = self.transcriber.download(&download_url).await;
                record("download", &text);
                let text = text?;
                let characters = text.chars().count();
                self.store.update(
                    TRANSCRIPTS,
                    id,
                    &fields::object(json!({"status": "completed", "text": text})),
                )?;
                info!(transcript = id, characters, "Transcript completed");
                Ok(SyncOutcome::Completed { characters })
            }
        }
    }

    fn fail(&self, id: &str, message: String) -> Result<SyncOutcome, TranscriptionError> {
        self.store.update(
            TRANSCRIPTS,
            id,
            &fields::object(json!({"status": "failed", "error_message": message})),
        )?;
        warn!(transcript = id, "Transcription failed: {}", message);
        Ok(SyncOutcome::Failed { message })
    }
}
