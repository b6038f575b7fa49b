//! Speaker form payload and its validation.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::PortalError;
use crate::items::{fields, Item};

/// Image fields accepted with a submission.
pub const IMAGE_FIELDS: &[&str] = &["profile_image", "action_image"];

/// Data the speaker enters in the portal form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub academic_title: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub twitter_url: Option<String>,
    #[serde(default)]
    pub bluesky_url: Option<String>,
    #[serde(default)]
    pub mastodon_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
    #[serde(default)]
    pub youtube_url: Option<String>,
}

impl Submission {
    /// Optional profile links as `(field, label, value)`.
    pub fn urls(&self) -> [(&'static str, &'static str, Option<&str>); 8] {
        [
            ("website_url", "Website", self.website_url.as_deref()),
            ("linkedin_url", "LinkedIn", self.linkedin_url.as_deref()),
            ("twitter_url", "Twitter/X", self.twitter_url.as_deref()),
            ("bluesky_url", "Bluesky", self.bluesky_url.as_deref()),
            ("mastodon_url", "Mastodon", self.mastodon_url.as_deref()),
            ("github_url", "GitHub", self.github_url.as_deref()),
            ("instagram_url", "Instagram", self.instagram_url.as_deref()),
            ("youtube_url", "YouTube", self.youtube_url.as_deref()),
        ]
    }

    /// Check required fields and URL shapes. Reports the first problem.
    pub fn validate(&self) -> Result<(), PortalError> {
        let required = [
            (&self.first_name, "Vorname"),
            (&self.last_name, "Nachname"),
            (&self.occupation, "Beruf"),
            (&self.description, "Beschreibung"),
        ];
        for (value, label) in required {
            if value.trim().is_empty() {
                return Err(PortalError::Validation(format!("{} ist erforderlich", label)));
            }
        }

        for (_, label, value) in self.urls() {
            let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
                continue;
            };
            if !is_web_url(value) {
                return Err(PortalError::Validation(format!(
                    "{} muss eine gültige URL sein",
                    label
                )));
            }
        }

        Ok(())
    }

    /// Speaker fields to write back. Empty optional values are stored as `null`.
    pub fn to_patch(&self) -> Item {
        let optional = |value: Option<&str>| match value.map(str::trim) {
            Some(v) if !v.is_empty() => Value::String(v.to_string()),
            _ => Value::Null,
        };

        let mut patch = fields::object(json!({
            "academic_title": optional(self.academic_title.as_deref()),
            "first_name": self.first_name.trim(),
            "last_name": self.last_name.trim(),
            "occupation": self.occupation.trim(),
            "description": self.description.trim(),
        }));
        for (field, _, value) in self.urls() {
            patch.insert(field.to_string(), optional(value));
        }
        patch
    }
}

fn is_web_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

/// An uploaded image part.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Target speaker field, one of [`IMAGE_FIELDS`].
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn validate(&self, max_bytes: usize) -> Result<(), PortalError> {
        if !IMAGE_FIELDS.contains(&self.field.as_str()) {
            return Err(PortalError::Validation(format!(
                "Unbekanntes Bildfeld: {}",
                self.field
            )));
        }
        if !self.content_type.starts_with("image/") {
            return Err(PortalError::Validation(
                "Nur Bilddateien sind erlaubt".to_string(),
            ));
        }
        if self.bytes.is_empty() {
            return Err(PortalError::Validation("Die Bilddatei ist leer".to_string()));
        }
        if self.bytes.len() > max_bytes {
            return Err(PortalError::Validation(format!(
                "Bilder dürfen höchstens {} MB groß sein",
                max_bytes / (1024 * 1024)
            )));
        }
        Ok(())
    }
}
