//! Content-approval cascade.
//!
//! A podcast is `approved` exactly when every generated content item that
//! belongs to it is `approved`. Any later unapproval puts the podcast back
//! into `content_review`.

mod types;

pub use types::{ContentStatus, ContentType, PublishingStatus, GENERATED_CONTENT};

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::hooks::{ActionHook, HookContext, HookError, HookMeta};
use crate::items::{fields, Item, ItemQuery, ItemStore};
use crate::mail::{send_tracked, templates, Mailer};

/// Action on `podcast_generated_content.items.update`.
pub struct ContentApprovalHook {
    store: Arc<dyn ItemStore>,
    mailer: Option<Arc<dyn Mailer>>,
    heise_contact: Option<String>,
}

impl ContentApprovalHook {
    pub fn new(
        store: Arc<dyn ItemStore>,
        mailer: Option<Arc<dyn Mailer>>,
        heise_contact: Option<String>,
    ) -> Self {
        Self {
            store,
            mailer,
            heise_contact,
        }
    }

    async fn apply(&self, key: &str, status: ContentStatus) -> Result<(), HookError> {
        let content = self
            .store
            .get(GENERATED_CONTENT, key)?
            .ok_or_else(|| HookError::InvalidPayload(format!("content item {} not found", key)))?;

        let (Some(podcast_id), Some(podcast_ref)) =
            (fields::relation_id(&content, "podcast"), podcast_ref(&content))
        else {
            warn!(content = key, "Content item has no podcast, skipping cascade");
            return Ok(());
        };

        if status != ContentStatus::Approved {
            return self.revert_approval(&podcast_id);
        }

        let content_type = fields::text(&content, "content_type")
            .map(|t| ContentType::parse(&t))
            .unwrap_or(ContentType::Other);

        if content_type == ContentType::Shownotes {
            if let Some(text) = fields::text(&content, "generated_text") {
                self.store.update(
                    "podcasts",
                    &podcast_id,
                    &fields::object(json!({ "description": text })),
                )?;
                debug!(podcast = %podcast_id, "Copied shownotes into podcast description");
            }
        }

        let all = self
            .store
            .find(GENERATED_CONTENT, &ItemQuery::new().filter("podcast", podcast_ref))?;
        let all_approved = all.iter().all(|item| {
            fields::text(item, "status").map(|s| ContentStatus::parse(&s)) == Some(ContentStatus::Approved)
        });

        if all_approved {
            self.store.update(
                "podcasts",
                &podcast_id,
                &fields::object(json!({ "publishing_status": PublishingStatus::Approved.as_str() })),
            )?;
            info!(podcast = %podcast_id, items = all.len(), "All content approved, podcast approved");
        }

        if content_type == ContentType::HeiseDocument {
            self.send_heise_document(&podcast_id, &content).await?;
        }

        Ok(())
    }

    fn revert_approval(&self, podcast_id: &str) -> Result<(), HookError> {
        let Some(podcast) = self.store.get("podcasts", podcast_id)? else {
            warn!(podcast = %podcast_id, "Podcast not found");
            return Ok(());
        };

        let current = fields::text(&podcast, "publishing_status");
        if PublishingStatus::parse(current.as_deref()) == PublishingStatus::Approved {
            self.store.update(
                "podcasts",
                podcast_id,
                &fields::object(json!({
                    "publishing_status": PublishingStatus::ContentReview.as_str()
                })),
            )?;
            info!(podcast = %podcast_id, "Content unapproved, podcast back in review");
        }
        Ok(())
    }

    async fn send_heise_document(&self, podcast_id: &str, content: &Item) -> Result<(), HookError> {
        let (Some(mailer), Some(to)) = (&self.mailer, &self.heise_contact) else {
            warn!(podcast = %podcast_id, "heise contact or mail transport not configured, document not sent");
            return Ok(());
        };
        let Some(text) = fields::text(content, "generated_text") else {
            warn!(podcast = %podcast_id, "Approved heise document is empty");
            return Ok(());
        };

        let title = self
            .store
            .get("podcasts", podcast_id)?
            .and_then(|podcast| fields::text(&podcast, "title"))
            .unwrap_or_else(|| podcast_id.to_string());

        send_tracked(mailer.as_ref(), &templates::heise_document(to, &title, &text))
            .await
            .map_err(|e| HookError::External(e.to_string()))?;
        info!(podcast = %podcast_id, "Sent heise document");
        Ok(())
    }
}

/// Raw `podcast` value used to query sibling items.
fn podcast_ref(content: &Item) -> Option<Value> {
    match content.get("podcast")? {
        Value::Object(nested) => nested.get("id").cloned(),
        Value::Null => None,
        other => Some(other.clone()),
    }
}

#[async_trait]
impl ActionHook for ContentApprovalHook {
    fn name(&self) -> &'static str {
        "content_approval"
    }

    async fn action(&self, payload: &Item, meta: &HookMeta, _ctx: &HookContext) -> Result<(), HookError> {
        let Some(status) = fields::text(payload, "status") else {
            return Ok(());
        };
        let status = ContentStatus::parse(&status);

        for key in &meta.keys {
            if let Err(e) = self.apply(key, status).await {
                error!(content = %key, status = status.as_str(), "Content approval cascade failed: {}", e);
            }
        }
        Ok(())
    }
}
