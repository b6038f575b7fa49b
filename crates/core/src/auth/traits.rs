use async_trait::async_trait;
use thiserror::Error;

use super::types::{AuthRequest, Identity};

/// Why an admin API request was refused.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token on the request.
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Admin auth selected without a usable token.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Guards the admin item API.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve the caller behind a request, e.g. the holder of the admin token.
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    /// Label for logs and the auth failure metric
    fn method_name(&self) -> &'static str;
}
