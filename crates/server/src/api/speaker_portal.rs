//! Speaker portal endpoints.

use std::sync::Arc;

use axum::{
    extract::{multipart::Field, Multipart, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use programmierbar_core::{ImageUpload, PortalSpeaker, Submission};

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenParams {
    #[serde(default)]
    pub token: String,
}

/// Parsed multipart submission.
#[derive(Debug, Default)]
pub struct PortalForm {
    pub token: String,
    pub submission: Submission,
    pub images: Vec<ImageUpload>,
}

pub async fn validate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TokenParams>,
) -> Result<Json<PortalSpeaker>, ApiError> {
    Ok(Json(state.portal().validate(&params.token)?))
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<PortalSpeaker>, ApiError> {
    let form = read_form(multipart).await?;
    let speaker = state
        .portal()
        .submit(&form.token, form.submission, form.images)
        .await?;
    Ok(Json(speaker))
}

/// Read the `data` JSON part, an optional `token` part and image parts.
///
/// The token may also be carried inside `data`; a separate part wins.
async fn read_form(mut multipart: Multipart) -> Result<PortalForm, ApiError> {
    let mut data: Option<Value> = None;
    let mut token: Option<String> = None;
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "data" => {
                let text = field.text().await.map_err(bad_upload)?;
                let value = serde_json::from_str(&text).map_err(|_| {
                    ApiError::BadRequest("Die Formulardaten sind kein gültiges JSON".to_string())
                })?;
                data = Some(value);
            }
            "token" => token = Some(field.text().await.map_err(bad_upload)?),
            _ if field.file_name().is_some() => images.push(read_image(name.clone(), field).await?),
            _ => {}
        }
    }

    let mut data = data.ok_or_else(|| {
        ApiError::BadRequest("Es wurden keine Formulardaten übermittelt".to_string())
    })?;
    let embedded = data
        .as_object_mut()
        .and_then(|object| object.remove("token"))
        .and_then(|value| value.as_str().map(str::to_string));
    let submission: Submission = serde_json::from_value(data).map_err(|_| {
        ApiError::BadRequest("Die Formulardaten haben ein ungültiges Format".to_string())
    })?;

    Ok(PortalForm {
        token: token.or(embedded).unwrap_or_default(),
        submission,
        images,
    })
}

async fn read_image(name: String, field: Field<'_>) -> Result<ImageUpload, ApiError> {
    let filename = field.file_name().unwrap_or_default().to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field.bytes().await.map_err(bad_upload)?;
    Ok(ImageUpload {
        field: name,
        filename,
        content_type,
        bytes: bytes.to_vec(),
    })
}

fn bad_upload(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Upload fehlgeschlagen: {}", e.body_text()))
}
