//! URL slugs derived from record fields.

mod rules;
mod slugify;

pub use rules::{derive_slug, podcast_type_label, SlugPatch, SLUG_COLLECTIONS};
pub use slugify::slugify;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::hooks::{FilterHook, HookContext, HookError, HookMeta, ItemAction};
use crate::items::{Item, ItemStore};

/// Filter that (re)computes `slug` on create and update.
pub struct SlugFilter {
    store: Arc<dyn ItemStore>,
}

impl SlugFilter {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    /// Stored record merged with the pending payload.
    fn merged_record(&self, payload: &Item, meta: &HookMeta) -> Result<Option<Item>, HookError> {
        match meta.event.action {
            ItemAction::Create => Ok(Some(payload.clone())),
            ItemAction::Update => {
                let [key] = meta.keys.as_slice() else {
                    debug!(collection = %meta.collection, keys = ?meta.keys, "Skipping slug for batch update");
                    return Ok(None);
                };
                let Some(mut record) = self.store.get(&meta.collection, key)? else {
                    return Ok(None);
                };
                for (field, value) in payload {
                    record.insert(field.clone(), value.clone());
                }
                Ok(Some(record))
            }
        }
    }
}

#[async_trait]
impl FilterHook for SlugFilter {
    fn name(&self) -> &'static str {
        "slug"
    }

    async fn filter(
        &self,
        mut payload: Item,
        meta: &HookMeta,
        _ctx: &HookContext,
    ) -> Result<Item, HookError> {
        let Some(record) = self.merged_record(&payload, meta)? else {
            return Ok(payload);
        };

        if let Some(patch) = derive_slug(&meta.collection, &record) {
            debug!(collection = %meta.collection, slug = %patch.slug, "Derived slug");
            payload.insert("slug".to_string(), Value::String(patch.slug));
            if let Some(suffix) = patch.slug_suffix {
                payload.insert("slug_suffix".to_string(), Value::String(suffix));
            }
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookEvent;
    use crate::items::{fields, SqliteItemStore};
    use serde_json::json;

    fn setup() -> (Arc<SqliteItemStore>, SlugFilter) {
        let store = Arc::new(SqliteItemStore::in_memory().unwrap());
        let filter = SlugFilter::new(store.clone());
        (store, filter)
    }

    #[tokio::test]
    async fn test_create_adds_slug() {
        let (_store, filter) = setup();
        let meta = HookMeta::new(HookEvent::create("meetups"), vec![]);
        let payload = filter
            .filter(
                fields::object(json!({"title": "Rust Meetup"})),
                &meta,
                &HookContext::system(),
            )
            .await
            .unwrap();
        assert_eq!(payload["slug"], "rust-meetup");
    }

    #[tokio::test]
    async fn test_update_merges_stored_fields() {
        let (store, filter) = setup();
        store
            .insert(
                "podcasts",
                fields::object(json!({"id": "p1", "type": "news", "number": "5", "title": "Alt"})),
            )
            .unwrap();

        let meta = HookMeta::new(HookEvent::update("podcasts"), vec!["p1".to_string()]);
        let payload = filter
            .filter(
                fields::object(json!({"title": "Neu"})),
                &meta,
                &HookContext::system(),
            )
            .await
            .unwrap();

        assert_eq!(payload["title"], "Neu");
        assert_eq!(payload["slug"], "news-5-neu");
    }

    #[tokio::test]
    async fn test_unqualified_payload_passes_through() {
        let (_store, filter) = setup();
        let meta = HookMeta::new(HookEvent::create("speakers"), vec![]);
        let input = fields::object(json!({"first_name": "Solo"}));
        let payload = filter
            .filter(input.clone(), &meta, &HookContext::system())
            .await
            .unwrap();
        assert_eq!(payload, input);
    }

    #[tokio::test]
    async fn test_profile_suffix_is_persisted_in_payload() {
        let (_store, filter) = setup();
        let meta = HookMeta::new(HookEvent::create("profiles"), vec![]);
        let payload = filter
            .filter(
                fields::object(json!({"first_name": "Eva", "last_name": "Beispiel"})),
                &meta,
                &HookContext::system(),
            )
            .await
            .unwrap();

        let suffix = payload["slug_suffix"].as_str().unwrap();
        assert_eq!(payload["slug"], format!("eva-beispiel-{}", suffix));
    }

    #[tokio::test]
    async fn test_batch_update_skips_slug() {
        let (_store, filter) = setup();
        let meta = HookMeta::new(
            HookEvent::update("meetups"),
            vec!["a".to_string(), "b".to_string()],
        );
        let payload = filter
            .filter(
                fields::object(json!({"title": "Shared"})),
                &meta,
                &HookContext::system(),
            )
            .await
            .unwrap();
        assert!(payload.get("slug").is_none());
    }
}
