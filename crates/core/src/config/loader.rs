use figment::{
    providers::{Env, Format, Toml},
    value::Uncased,
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Flat environment keys shared with the website deployment, mapped onto config paths.
const ENV_KEYS: &[(&str, &str)] = &[
    ("WEBSITE_URL", "website.url"),
    ("DIRECTUS_ADMIN_TOKEN", "auth.admin_token"),
    ("HEISE_CONTACT_EMAIL", "email.heise_contact_address"),
    ("EMAIL_FROM", "email.from"),
    ("EMAIL_SMTP_HOST", "email.smtp.host"),
    ("EMAIL_SMTP_PORT", "email.smtp.port"),
    ("EMAIL_SMTP_USER", "email.smtp.user"),
    ("EMAIL_SMTP_PASSWORD", "email.smtp.password"),
    ("MAILGUN_API_KEY", "email.mailgun.api_key"),
    ("MAILGUN_DOMAIN", "email.mailgun.domain"),
    ("BLUESKY_HANDLE", "bluesky.handle"),
    ("BLUESKY_APP_PASSWORD", "bluesky.app_password"),
    ("MASTODON_INSTANCE_URL", "mastodon.instance_url"),
    ("MASTODON_ACCESS_TOKEN", "mastodon.access_token"),
    ("HAPPYSCRIBE_API_KEY", "happyscribe.api_key"),
];

/// Provider for the flat keys in [`ENV_KEYS`].
fn shared_env() -> Env {
    let keys: Vec<&str> = ENV_KEYS.iter().map(|(key, _)| *key).collect();
    Env::raw().only(&keys).map(|key| {
        let path = ENV_KEYS
            .iter()
            .find(|(env, _)| key.as_str().eq_ignore_ascii_case(env))
            .map(|(_, path)| *path)
            .unwrap_or_else(|| key.as_str());
        Uncased::from(path.to_string())
    })
}

fn figment_with_env(figment: Figment) -> Figment {
    figment
        .merge(shared_env())
        .merge(Env::prefixed("PROGRAMMIERBAR_").split("__"))
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = figment_with_env(Figment::new().merge(Toml::file(path)))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from environment variables only (no config file)
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    figment_with_env(Figment::new())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[server]
port = 9000
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_load_config_from_str_invalid() {
        let toml = r#"
[server]
port = "not a number"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[mastodon]
instance_url = "https://social.example"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.mastodon.instance_url, "https://social.example");
        assert!(!config.mastodon.is_configured());
    }

    #[test]
    fn test_shared_env_keys_map_to_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("BLUESKY_HANDLE", "programmier.bar");
            jail.set_env("BLUESKY_APP_PASSWORD", "app-pw");
            jail.set_env("EMAIL_SMTP_PORT", "2525");
            jail.set_env("WEBSITE_URL", "https://example.org");
            jail.set_env("PROGRAMMIERBAR_SERVER__PORT", "9100");

            let config = load_config_from_env().unwrap();
            assert_eq!(config.bluesky.handle, "programmier.bar");
            assert!(config.bluesky.is_configured());
            assert_eq!(config.email.smtp.port, 2525);
            assert_eq!(config.website.url, "https://example.org");
            assert_eq!(config.server.port, 9100);
            Ok(())
        });
    }
}
