//! Static admin token authentication.

use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Accepts `Authorization: Bearer <token>` when the token equals the
/// configured admin token.
pub struct AdminTokenAuthenticator {
    token: String,
}

impl AdminTokenAuthenticator {
    pub fn new(token: String) -> Self {
        Self { token }
    }

    fn extract_token(request: &AuthRequest) -> Option<&str> {
        let header = request.headers.get("authorization")?;
        let (scheme, token) = header.split_once(' ')?;
        if scheme.eq_ignore_ascii_case("bearer") {
            Some(token.trim())
        } else {
            None
        }
    }
}

#[async_trait]
impl Authenticator for AdminTokenAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let provided = Self::extract_token(request).ok_or(AuthError::NotAuthenticated)?;

        if constant_time_eq(provided.as_bytes(), self.token.as_bytes()) {
            Ok(Identity::admin("admin", self.method_name()))
        } else {
            Err(AuthError::InvalidCredentials("Invalid admin token".to_string()))
        }
    }

    fn method_name(&self) -> &'static str {
        "admin_token"
    }
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
