//! HappyScribe REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ExportState, TranscriptionError, TranscriptionRequest, TranscriptionState, Transcriber};
use crate::config::HappyScribeConfig;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    id: String,
    #[serde(default)]
    state: String,
    #[serde(default, rename = "failureMessage")]
    failure_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    id: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    download_link: Option<String>,
}

pub struct HappyScribeClient {
    client: Client,
    base_url: String,
    api_key: String,
    organization_id: Option<String>,
    language: String,
}

impl HappyScribeClient {
    pub fn new(config: HappyScribeConfig) -> Result<Self, TranscriptionError> {
        if !config.is_configured() {
            return Err(TranscriptionError::NotConfigured(
                "HappyScribe API key is required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://www.happyscribe.com/api/v1".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            organization_id: config.organization_id,
            language: config.language,
        })
    }

    async fn check(response: Response) -> Result<Response, TranscriptionError> {
        let status = response.status();
        if status == 401 {
            return Err(TranscriptionError::NotConfigured(
                "Invalid HappyScribe API key".to_string(),
            ));
        }
        if status == 404 {
            let url = response.url().to_string();
            return Err(TranscriptionError::NotFound(url));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(response)
    }
}

/// Map a HappyScribe transcription state.
pub fn map_transcription_state(state: &str, failure: Option<String>) -> TranscriptionState {
    match state {
        "automatic_done" | "done" | "locked" => TranscriptionState::Done,
        "failed" => TranscriptionState::Failed(failure.unwrap_or_else(|| "transcription failed".to_string())),
        _ => TranscriptionState::Processing,
    }
}

#[async_trait]
impl Transcriber for HappyScribeClient {
    async fn submit(&self, request: &TranscriptionRequest) -> Result<String, TranscriptionError> {
        let url = format!("{}/transcriptions", self.base_url);
        debug!(name = %request.name, "HappyScribe create transcription");

        let mut transcription = json!({
            "name": request.name,
            "language": self.language,
            "tmp_url": request.audio_url,
            "is_subtitle": false,
        });
        if let Some(org) = &self.organization_id {
            transcription["organization_id"] = json!(org);
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "transcription": transcription }))
            .send()
            .await?;

        let created: TranscriptionResponse = Self::check(response).await?.json().await.map_err(|e| {
            TranscriptionError::ParseError(format!("Failed to parse transcription: {}", e))
        })?;
        Ok(created.id)
    }

    async fn status(&self, transcription_id: &str) -> Result<TranscriptionState, TranscriptionError> {
        let url = format!("{}/transcriptions/{}", self.base_url, transcription_id);
        debug!(id = transcription_id, "HappyScribe get transcription");

        let response = self.client.get(&url).bearer_auth(&self.api_key).send().await?;
        let transcription: TranscriptionResponse =
            Self::check(response).await?.json().await.map_err(|e| {
                TranscriptionError::ParseError(format!("Failed to parse transcription: {}", e))
            })?;

        Ok(map_transcription_state(
            &transcription.state,
            transcription.failure_message,
        ))
    }

    async fn request_export(&self, transcription_id: &str) -> Result<String, TranscriptionError> {
        let url = format!("{}/exports", self.base_url);
        debug!(id = transcription_id, "HappyScribe create txt export");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "export": {
                    "format": "txt",
                    "transcription_ids": [transcription_id],
                }
            }))
            .send()
            .await?;

        let export: ExportResponse = Self::check(response).await?.json().await.map_err(|e| {
            TranscriptionError::ParseError(format!("Failed to parse export: {}", e))
        })?;
        Ok(export.id)
    }

    async fn export_state(&self, export_id: &str) -> Result<ExportState, TranscriptionError> {
        let url = format!("{}/exports/{}", self.base_url, export_id);
        let response = self.client.get(&url).bearer_auth(&self.api_key).send().await?;
        let export: ExportResponse = Self::check(response).await?.json().await.map_err(|e| {
            TranscriptionError::ParseError(format!("Failed to parse export: {}", e))
        })?;

        Ok(match (export.state.as_str(), export.download_link) {
            ("ready", Some(link)) => ExportState::Ready { download_url: link },
            ("failed", _) | ("expired", _) => ExportState::Failed(format!("export {}", export.state)),
            _ => ExportState::Pending,
        })
    }

    async fn download(&self, download_url: &str) -> Result<String, TranscriptionError> {
        let response = self.client.get(download_url).send().await?;
        Ok(Self::check(response).await?.text().await?)
    }
}
