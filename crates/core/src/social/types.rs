use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supported social networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Bluesky,
    Mastodon,
}

impl SocialPlatform {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bluesky" => Some(SocialPlatform::Bluesky),
            "mastodon" => Some(SocialPlatform::Mastodon),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SocialPlatform::Bluesky => "bluesky",
            SocialPlatform::Mastodon => "mastodon",
        }
    }

    /// Maximum post length in characters.
    pub fn max_chars(&self) -> usize {
        match self {
            SocialPlatform::Bluesky => 300,
            SocialPlatform::Mastodon => 500,
        }
    }
}

impl fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialPost {
    pub text: String,
}

impl SocialPost {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Reject empty posts and posts over the platform limit.
    pub fn check_length(&self, platform: SocialPlatform) -> Result<(), PublishError> {
        let length = self.text.chars().count();
        if self.text.trim().is_empty() {
            return Err(PublishError::InvalidPost("post text is empty".to_string()));
        }
        if length > platform.max_chars() {
            return Err(PublishError::TooLong {
                platform,
                length,
                limit: platform.max_chars(),
            });
        }
        Ok(())
    }
}

/// Identifiers of a published post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedPost {
    pub post_id: String,
    pub post_url: String,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Publisher not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid post: {0}")]
    InvalidPost(String),

    #[error("Post has {length} characters, {platform} allows {limit}")]
    TooLong {
        platform: SocialPlatform,
        length: usize,
        limit: usize,
    },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
