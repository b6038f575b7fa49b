//! Authentication of the admin API.

mod admin_token;
mod none;
mod traits;
mod types;

pub use admin_token::*;
pub use none::*;
pub use traits::*;
pub use types::*;

use crate::config::AuthConfig;

/// Factory function to create authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    use crate::config::AuthMethod;

    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator::new())),
        AuthMethod::AdminToken => {
            let token = config.admin_token.clone().ok_or_else(|| {
                AuthError::ConfigurationError(
                    "admin_token must be set when using AdminToken auth method".to_string(),
                )
            })?;
            Ok(Box::new(AdminTokenAuthenticator::new(token)))
        }
    }
}
