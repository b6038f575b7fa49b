use serde::{Deserialize, Serialize};

/// Collection holding generated texts per podcast episode.
pub const GENERATED_CONTENT: &str = "podcast_generated_content";

/// Review state of a generated content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Generated,
    Approved,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl ContentStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "draft" => ContentStatus::Draft,
            "generated" => ContentStatus::Generated,
            "approved" => ContentStatus::Approved,
            "rejected" => ContentStatus::Rejected,
            _ => ContentStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Generated => "generated",
            ContentStatus::Approved => "approved",
            ContentStatus::Rejected => "rejected",
            ContentStatus::Unknown => "unknown",
        }
    }
}

/// Kind of generated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Shownotes,
    HeiseDocument,
    #[serde(other)]
    Other,
}

impl ContentType {
    pub fn parse(value: &str) -> Self {
        match value {
            "shownotes" => ContentType::Shownotes,
            "heise_document" => ContentType::HeiseDocument,
            _ => ContentType::Other,
        }
    }
}

/// `podcasts.publishing_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishingStatus {
    ContentReview,
    Approved,
    Published,
    #[serde(other)]
    Other,
}

impl PublishingStatus {
    /// Missing status counts as `content_review`.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("content_review") => PublishingStatus::ContentReview,
            Some("approved") => PublishingStatus::Approved,
            Some("published") => PublishingStatus::Published,
            Some(_) => PublishingStatus::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PublishingStatus::ContentReview => "content_review",
            PublishingStatus::Approved => "approved",
            PublishingStatus::Published => "published",
            PublishingStatus::Other => "other",
        }
    }
}
