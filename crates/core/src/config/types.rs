use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub website: WebsiteConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub bluesky: BlueskyConfig,
    #[serde(default)]
    pub mastodon: MastodonConfig,
    #[serde(default)]
    pub happyscribe: HappyScribeConfig,
    #[serde(default)]
    pub speaker_portal: SpeakerPortalConfig,
    #[serde(default)]
    pub uploads: UploadsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8055
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("programmierbar.db")
}

/// Admin API authentication
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_auth_method")]
    pub method: AuthMethod,
    /// Static admin token (`DIRECTUS_ADMIN_TOKEN`).
    #[serde(default)]
    pub admin_token: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            method: default_auth_method(),
            admin_token: None,
        }
    }
}

fn default_auth_method() -> AuthMethod {
    AuthMethod::AdminToken
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Accept every request. Local development only.
    None,
    /// Bearer token compared against `auth.admin_token`.
    AdminToken,
}

/// Public website settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebsiteConfig {
    /// Base URL of the public website (`WEBSITE_URL`).
    #[serde(default = "default_website_url")]
    pub url: String,
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self {
            url: default_website_url(),
        }
    }
}

fn default_website_url() -> String {
    "https://www.programmier.bar".to_string()
}

impl WebsiteConfig {
    /// Website URL without trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Outgoing mail
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    /// Explicit transport; when unset the first configured one wins (Mailgun, then SMTP).
    #[serde(default)]
    pub transport: Option<EmailTransport>,
    /// Sender address (`EMAIL_FROM`).
    #[serde(default = "default_from_address")]
    pub from: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Recipient of the website contact form.
    #[serde(default)]
    pub contact_address: Option<String>,
    /// Recipient of approved heise documents (`HEISE_CONTACT_EMAIL`).
    #[serde(default)]
    pub heise_contact_address: Option<String>,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub mailgun: MailgunConfig,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            transport: None,
            from: default_from_address(),
            from_name: default_from_name(),
            contact_address: None,
            heise_contact_address: None,
            smtp: SmtpConfig::default(),
            mailgun: MailgunConfig::default(),
        }
    }
}

fn default_from_address() -> String {
    "no-reply@programmier.bar".to_string()
}

fn default_from_name() -> String {
    "programmier.bar".to_string()
}

impl EmailConfig {
    /// Transport to use, `None` when nothing is configured.
    pub fn effective_transport(&self) -> Option<EmailTransport> {
        match self.transport {
            Some(transport) => Some(transport),
            None if self.mailgun.is_configured() => Some(EmailTransport::Mailgun),
            None if self.smtp.is_configured() => Some(EmailTransport::Smtp),
            None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmailTransport {
    Smtp,
    Mailgun,
}

/// SMTP relay (`EMAIL_SMTP_*`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_smtp_port(),
            user: None,
            password: None,
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty()
    }
}

/// Mailgun HTTP API
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MailgunConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub domain: String,
    /// Base URL (default: https://api.eu.mailgun.net/v3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl MailgunConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.domain.is_empty()
    }
}

/// Bluesky account used for auto-posting
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BlueskyConfig {
    /// Account handle (`BLUESKY_HANDLE`).
    #[serde(default)]
    pub handle: String,
    /// App password (`BLUESKY_APP_PASSWORD`).
    #[serde(default)]
    pub app_password: String,
    /// PDS base URL (default: https://bsky.social).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
}

impl BlueskyConfig {
    pub fn is_configured(&self) -> bool {
        !self.handle.is_empty() && !self.app_password.is_empty()
    }
}

/// Mastodon account used for auto-posting
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MastodonConfig {
    /// Instance URL (`MASTODON_INSTANCE_URL`).
    #[serde(default)]
    pub instance_url: String,
    /// Access token (`MASTODON_ACCESS_TOKEN`).
    #[serde(default)]
    pub access_token: String,
}

impl MastodonConfig {
    pub fn is_configured(&self) -> bool {
        !self.instance_url.is_empty() && !self.access_token.is_empty()
    }
}

/// HappyScribe transcription API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HappyScribeConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    /// Transcription language (default: de-DE).
    #[serde(default = "default_transcript_language")]
    pub language: String,
    /// Base URL (default: https://www.happyscribe.com/api/v1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for HappyScribeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            organization_id: None,
            language: default_transcript_language(),
            base_url: None,
        }
    }
}

fn default_transcript_language() -> String {
    "de-DE".to_string()
}

impl HappyScribeConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Speaker self-service portal
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpeakerPortalConfig {
    /// Token lifetime in days.
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
    /// Maximum accepted image size in bytes.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    /// Team address notified about new submissions.
    #[serde(default)]
    pub notification_address: Option<String>,
}

impl Default for SpeakerPortalConfig {
    fn default() -> Self {
        Self {
            token_ttl_days: default_token_ttl_days(),
            max_image_bytes: default_max_image_bytes(),
            notification_address: None,
        }
    }
}

fn default_token_ttl_days() -> i64 {
    14
}

fn default_max_image_bytes() -> usize {
    10 * 1024 * 1024
}

/// Storage for uploaded files
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadsConfig {
    #[serde(default = "default_uploads_path")]
    pub path: PathBuf,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            path: default_uploads_path(),
        }
    }
}

fn default_uploads_path() -> PathBuf {
    PathBuf::from("uploads")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: SanitizedAuthConfig,
    pub website: WebsiteConfig,
    pub email: SanitizedEmailConfig,
    pub bluesky_configured: bool,
    pub mastodon_configured: bool,
    pub happyscribe_configured: bool,
    pub speaker_portal: SpeakerPortalConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: AuthMethod,
    pub admin_token_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedEmailConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<EmailTransport>,
    pub from: String,
    pub contact_configured: bool,
    pub heise_contact_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            auth: SanitizedAuthConfig {
                method: config.auth.method,
                admin_token_configured: config
                    .auth
                    .admin_token
                    .as_deref()
                    .is_some_and(|t| !t.is_empty()),
            },
            website: config.website.clone(),
            email: SanitizedEmailConfig {
                transport: config.email.effective_transport(),
                from: config.email.from.clone(),
                contact_configured: config.email.contact_address.is_some(),
                heise_contact_configured: config.email.heise_contact_address.is_some(),
            },
            bluesky_configured: config.bluesky.is_configured(),
            mastodon_configured: config.mastodon.is_configured(),
            happyscribe_configured: config.happyscribe.is_configured(),
            speaker_portal: config.speaker_portal.clone(),
        }
    }
}
