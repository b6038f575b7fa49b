use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Website URL is an absolute http(s) URL
/// - Token lifetime of the speaker portal is positive
///
/// A missing admin token is not an error: the admin API is simply not mounted.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    match reqwest::Url::parse(&config.website.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => {
            return Err(ConfigError::ValidationError(format!(
                "website.url must be an absolute http(s) URL, got '{}'",
                config.website.url
            )));
        }
    }

    if config.speaker_portal.token_ttl_days <= 0 {
        return Err(ConfigError::ValidationError(
            "speaker_portal.token_ttl_days must be positive".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::AdminToken
        && config.auth.admin_token.as_deref() == Some("")
    {
        return Err(ConfigError::ValidationError(
            "auth.admin_token must not be empty when set".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::net::IpAddr;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_relative_website_url_fails() {
        let mut config = Config::default();
        config.website.url = "programmier.bar".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_empty_admin_token_fails() {
        let mut config = Config::default();
        config.auth.admin_token = Some(String::new());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_missing_admin_token_is_allowed() {
        let mut config = Config::default();
        config.auth.admin_token = None;
        assert!(validate_config(&config).is_ok());
    }
}
