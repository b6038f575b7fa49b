//! API error type and its JSON representation.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use programmierbar_core::{
    ContactError, ItemServiceError, PortalError, StoreError, TranscriptionError,
};

/// Generic message for everything that ends up as 500.
const INTERNAL_MESSAGE: &str = "Es ist ein interner Fehler aufgetreten";

/// Errors returned by handlers. Messages of 4xx variants reach the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Nicht autorisiert")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Gone(String),

    #[error("{0}")]
    NotImplemented(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    /// Logged in full, answered with a generic message.
    #[error("{0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Gone(_) => StatusCode::GONE,
            ApiError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal(error: impl std::fmt::Display) -> Self {
        ApiError::Internal(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(detail) => {
                error!("Internal error: {}", detail);
                INTERNAL_MESSAGE.to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Body rejections become 400 with a German message; serde details only go to the log.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected JSON body: {}", rejection.body_text());
        let message = match rejection {
            JsonRejection::JsonDataError(_) => "Die Anfrage hat ein ungültiges Format",
            JsonRejection::JsonSyntaxError(_) => "Die Anfrage enthält kein gültiges JSON",
            JsonRejection::MissingJsonContentType(_) => {
                "Die Anfrage muss als application/json gesendet werden"
            }
            _ => "Die Anfrage konnte nicht gelesen werden",
        };
        ApiError::BadRequest(message.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => ApiError::NotFound("Eintrag nicht gefunden".to_string()),
            StoreError::InvalidQuery(message) => ApiError::BadRequest(message),
            other => ApiError::internal(other),
        }
    }
}

impl From<ItemServiceError> for ApiError {
    fn from(e: ItemServiceError) -> Self {
        match e {
            ItemServiceError::Store(store) => store.into(),
            ItemServiceError::InvalidCollection(name) => {
                ApiError::BadRequest(format!("Ungültige Collection: {}", name))
            }
            ItemServiceError::Rejected { source, .. } => ApiError::BadRequest(source.to_string()),
        }
    }
}

impl From<PortalError> for ApiError {
    fn from(e: PortalError) -> Self {
        match e {
            PortalError::NotFound => ApiError::NotFound(e.to_string()),
            PortalError::Expired => ApiError::Gone(e.to_string()),
            PortalError::AlreadySubmitted => ApiError::Conflict(e.to_string()),
            PortalError::Validation(message) => ApiError::BadRequest(message),
            other => ApiError::internal(other),
        }
    }
}

impl From<ContactError> for ApiError {
    fn from(e: ContactError) -> Self {
        match e {
            ContactError::Invalid(message) => ApiError::BadRequest(message),
            ContactError::NotConfigured => ApiError::ServiceUnavailable(
                "Das Kontaktformular ist derzeit nicht verfügbar".to_string(),
            ),
            ContactError::Mail(mail) => ApiError::internal(mail),
        }
    }
}

impl From<TranscriptionError> for ApiError {
    fn from(e: TranscriptionError) -> Self {
        match e {
            TranscriptionError::NotFound(_) => {
                ApiError::NotFound("Transkript nicht gefunden".to_string())
            }
            TranscriptionError::InvalidState(message) => ApiError::Conflict(message),
            TranscriptionError::NotConfigured(_) => ApiError::ServiceUnavailable(
                "Transkription ist nicht konfiguriert".to_string(),
            ),
            other => ApiError::internal(other),
        }
    }
}
