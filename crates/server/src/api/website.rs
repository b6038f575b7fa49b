//! Public endpoints used by the website.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use programmierbar_core::{
    find_conference, submit_contact, website::ConferenceWithAgenda, ContactForm, ContactOutcome,
};

use super::error::ApiError;
use crate::state::AppState;

/// Response for accepted contact messages
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Conference with its agenda, looked up by id or slug.
pub async fn get_conference(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> Result<Json<ConferenceWithAgenda>, ApiError> {
    find_conference(state.store(), &identifier)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Konferenz nicht gefunden".to_string()))
}

/// Contact form. A filled honeypot is answered like a sent message.
pub async fn send_contact(
    State(state): State<Arc<AppState>>,
    form: Result<Json<ContactForm>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(form) = form?;
    let to = state.config().email.contact_address.as_deref();
    let outcome = submit_contact(state.mailer(), to, &form).await?;
    if outcome == ContactOutcome::Discarded {
        info!("Discarded contact form submission");
    }
    Ok(Json(MessageResponse {
        message: "Vielen Dank für deine Nachricht!".to_string(),
    }))
}

/// Voting is not available yet.
pub async fn voting() -> Result<StatusCode, ApiError> {
    Err(ApiError::NotImplemented(
        "Das Voting ist derzeit nicht verfügbar".to_string(),
    ))
}
