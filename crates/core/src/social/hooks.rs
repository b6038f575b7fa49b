//! Hooks that publish scheduled posts and draft podcast announcements.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::{PublishError, SocialPlatform, SocialPost, SocialPublisher};
use crate::content::PublishingStatus;
use crate::hooks::{ActionHook, HookContext, HookError, HookMeta};
use crate::items::{fields, Item, ItemQuery, ItemStore};
use crate::metrics::SOCIAL_POSTS;
use crate::slug::podcast_type_label;

/// Collection of social media posts.
pub const SOCIAL_MEDIA_POSTS: &str = "social_media_posts";

/// Action on `social_media_posts.items.create|update` that publishes posts
/// whose status is `scheduled`. Outcome is written back to the record.
pub struct SocialPostHook {
    store: Arc<dyn ItemStore>,
    publishers: HashMap<SocialPlatform, Arc<dyn SocialPublisher>>,
}

impl SocialPostHook {
    pub fn new(store: Arc<dyn ItemStore>, publishers: Vec<Arc<dyn SocialPublisher>>) -> Self {
        let publishers = publishers.into_iter().map(|p| (p.platform(), p)).collect();
        Self { store, publishers }
    }

    async fn publish_one(&self, key: &str) -> Result<(), HookError> {
        let post = self
            .store
            .get(SOCIAL_MEDIA_POSTS, key)?
            .ok_or_else(|| HookError::InvalidPayload(format!("social post {} not found", key)))?;

        if fields::text(&post, "status").as_deref() != Some("scheduled") {
            debug!(post = key, "Post is no longer scheduled, skipping");
            return Ok(());
        }

        let platform_name = fields::text(&post, "platform").unwrap_or_default();
        let result = match SocialPlatform::parse(&platform_name) {
            None => Err(PublishError::NotConfigured(format!(
                "unknown platform '{}'",
                platform_name
            ))),
            Some(platform) => match self.publishers.get(&platform) {
                None => Err(PublishError::NotConfigured(format!(
                    "{} is not configured",
                    platform
                ))),
                Some(publisher) => {
                    let text = fields::text(&post, "post_text").unwrap_or_default();
                    publisher.publish(&SocialPost::new(text)).await
                }
            },
        };

        let label = if platform_name.is_empty() { "unknown" } else { platform_name.as_str() };
        let patch = match result {
            Ok(published) => {
                SOCIAL_POSTS.with_label_values(&[label, "published"]).inc();
                info!(post = key, platform = label, url = %published.post_url, "Published social post");
                json!({
                    "status": "published",
                    "post_id": published.post_id,
                    "post_url": published.post_url,
                    "published_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                    "error_message": Value::Null,
                })
            }
            Err(e) => {
                SOCIAL_POSTS.with_label_values(&[label, "failed"]).inc();
                warn!(post = key, platform = label, "Publishing social post failed: {}", e);
                json!({
                    "status": "failed",
                    "error_message": e.to_string(),
                })
            }
        };

        self.store
            .update(SOCIAL_MEDIA_POSTS, key, &fields::object(patch))?;
        Ok(())
    }
}

#[async_trait]
impl ActionHook for SocialPostHook {
    fn name(&self) -> &'static str {
        "social_post"
    }

    async fn action(&self, payload: &Item, meta: &HookMeta, _ctx: &HookContext) -> Result<(), HookError> {
        if fields::text(payload, "status").as_deref() != Some("scheduled") {
            return Ok(());
        }

        for key in &meta.keys {
            if let Err(e) = self.publish_one(key).await {
                error!(post = %key, "Social post hook failed: {}", e);
            }
        }
        Ok(())
    }
}

/// Action on `podcasts.items.update` that drafts one announcement per
/// configured platform once a podcast is `published`.
pub struct PodcastAnnouncementHook {
    store: Arc<dyn ItemStore>,
    platforms: Vec<SocialPlatform>,
    website_url: String,
}

impl PodcastAnnouncementHook {
    pub fn new(store: Arc<dyn ItemStore>, platforms: Vec<SocialPlatform>, website_url: impl Into<String>) -> Self {
        Self {
            store,
            platforms,
            website_url: website_url.into(),
        }
    }

    fn create_drafts(&self, key: &str) -> Result<usize, HookError> {
        let podcast = self
            .store
            .get("podcasts", key)?
            .ok_or_else(|| HookError::InvalidPayload(format!("podcast {} not found", key)))?;

        let mut created = 0;
        for platform in &self.platforms {
            let existing = self.store.find(
                SOCIAL_MEDIA_POSTS,
                &ItemQuery::new()
                    .filter("podcast", key)
                    .filter("platform", platform.as_str())
                    .limit(1),
            )?;
            if !existing.is_empty() {
                continue;
            }

            let text = announcement_text(&podcast, *platform, &self.website_url);
            self.store.insert(
                SOCIAL_MEDIA_POSTS,
                fields::object(json!({
                    "podcast": key,
                    "platform": platform.as_str(),
                    "status": "draft",
                    "post_text": text,
                })),
            )?;
            created += 1;
        }
        Ok(created)
    }
}

#[async_trait]
impl ActionHook for PodcastAnnouncementHook {
    fn name(&self) -> &'static str {
        "podcast_announcement"
    }

    async fn action(&self, payload: &Item, meta: &HookMeta, _ctx: &HookContext) -> Result<(), HookError> {
        let status = fields::text(payload, "publishing_status");
        if status.is_none() || PublishingStatus::parse(status.as_deref()) != PublishingStatus::Published {
            return Ok(());
        }

        for key in &meta.keys {
            match self.create_drafts(key) {
                Ok(0) => {}
                Ok(count) => info!(podcast = %key, count, "Created social media drafts"),
                Err(e) => error!(podcast = %key, "Creating social media drafts failed: {}", e),
            }
        }
        Ok(())
    }
}

/// Announcement text for a podcast, shortened to the platform limit.
pub fn announcement_text(podcast: &Item, platform: SocialPlatform, website_url: &str) -> String {
    let base = website_url.trim_end_matches('/');
    let url = match fields::text(podcast, "slug") {
        Some(slug) => format!("{}/podcast/{}", base, slug),
        None => base.to_string(),
    };

    let mut headline = match (fields::text(podcast, "type"), fields::text(podcast, "number")) {
        (Some(kind), Some(number)) => format!("{} {}", podcast_type_label(&kind), number),
        _ => "Neue Folge".to_string(),
    };
    if let Some(title) = fields::text(podcast, "title") {
        headline = format!("{}: {}", headline, title);
    }

    let tail = format!("\n\n{}\n\n#programmierbar #podcast", url);
    let budget = platform.max_chars().saturating_sub(tail.chars().count());
    if headline.chars().count() > budget {
        headline = headline.chars().take(budget.saturating_sub(1)).collect::<String>() + "…";
    }
    headline + &tail
}
