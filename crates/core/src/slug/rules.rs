//! Per-collection slug rules.

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::slugify;
use crate::items::{fields, Item};

/// Fields to write back after deriving a slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugPatch {
    pub slug: String,
    /// Newly generated profile suffix that must be persisted with the slug.
    pub slug_suffix: Option<String>,
}

impl SlugPatch {
    fn slug(slug: String) -> Self {
        Self {
            slug,
            slug_suffix: None,
        }
    }
}

/// Collections that carry a derived slug.
pub const SLUG_COLLECTIONS: &[&str] = &["speakers", "podcasts", "meetups", "conferences", "profiles"];

/// Derive the slug for `record`, the stored item merged with the pending payload.
///
/// Returns `None` when the collection has no slug rule or required fields are missing.
pub fn derive_slug(collection: &str, record: &Item) -> Option<SlugPatch> {
    match collection {
        "speakers" => speaker_slug(record).map(SlugPatch::slug),
        "podcasts" => podcast_slug(record).map(SlugPatch::slug),
        "meetups" | "conferences" => fields::text(record, "title").map(|t| SlugPatch::slug(slugify(&t))),
        "profiles" => profile_slug(record),
        _ => None,
    }
}

fn speaker_slug(record: &Item) -> Option<String> {
    let first_name = fields::text(record, "first_name")?;
    let last_name = fields::text(record, "last_name")?;
    let parts: Vec<String> = [fields::text(record, "academic_title"), Some(first_name), Some(last_name)]
        .into_iter()
        .flatten()
        .collect();
    Some(slugify(&parts.join(" ")))
}

/// Display label of a podcast type.
pub fn podcast_type_label(podcast_type: &str) -> &str {
    match podcast_type {
        "deep_dive" => "Deep Dive",
        "cto_special" => "CTO Special",
        "news" => "News",
        "other" => "Other",
        other => other,
    }
}

fn podcast_slug(record: &Item) -> Option<String> {
    let podcast_type = fields::text(record, "type")?;
    let number = fields::text(record, "number")?;
    let title = fields::text(record, "title")?;
    let divider = if podcast_type == "deep_dive" { " – " } else { ": " };
    Some(slugify(&format!(
        "{} {}{}{}",
        podcast_type_label(&podcast_type),
        number,
        divider,
        title
    )))
}

fn profile_slug(record: &Item) -> Option<SlugPatch> {
    if record.get("update_slug") == Some(&Value::Bool(false)) {
        return None;
    }
    let first_name = fields::text(record, "first_name")?;
    let last_name = fields::text(record, "last_name")?;

    let (suffix, generated) = match fields::text(record, "slug_suffix") {
        Some(existing) => (existing, false),
        None => (new_profile_suffix(), true),
    };

    Some(SlugPatch {
        slug: format!("{}-{}", slugify(&format!("{} {}", first_name, last_name)), suffix),
        slug_suffix: generated.then_some(suffix),
    })
}

/// First four hex characters of SHA-256 over a random UUID.
fn new_profile_suffix() -> String {
    let digest = Sha256::digest(uuid::Uuid::new_v4().to_string().as_bytes());
    format!("{:x}", digest)[..4].to_string()
}
