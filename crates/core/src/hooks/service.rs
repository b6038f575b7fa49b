//! Item service: persistence wrapped in filter and action hooks.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error};

use super::{HookContext, HookError, HookEvent, HookMeta, HookRegistry};
use crate::items::{fields, is_valid_field_name, Item, ItemQuery, ItemStore, StoreError};
use crate::metrics::HOOK_FAILURES;

/// Errors returned by [`ItemService`].
#[derive(Debug, Error)]
pub enum ItemServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    /// A filter hook rejected the payload.
    #[error("Hook '{hook}' rejected the write: {source}")]
    Rejected {
        hook: &'static str,
        #[source]
        source: HookError,
    },
}

/// Collection-scoped reads and writes that emit hook events.
///
/// Filters run in registration order before persistence, each receiving the
/// previous filter's output. Actions run after persistence; their errors are
/// logged and counted but never reach the caller.
#[derive(Clone)]
pub struct ItemService {
    store: Arc<dyn ItemStore>,
    hooks: Arc<HookRegistry>,
}

impl ItemService {
    pub fn new(store: Arc<dyn ItemStore>, hooks: Arc<HookRegistry>) -> Self {
        Self { store, hooks }
    }

    pub fn store(&self) -> &Arc<dyn ItemStore> {
        &self.store
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn read_one(&self, collection: &str, id: &str) -> Result<Option<Item>, ItemServiceError> {
        check_collection(collection)?;
        Ok(self.store.get(collection, id)?)
    }

    pub fn read_many(
        &self,
        collection: &str,
        query: &ItemQuery,
    ) -> Result<Vec<Item>, ItemServiceError> {
        check_collection(collection)?;
        Ok(self.store.find(collection, query)?)
    }

    /// Create an item, running `<collection>.items.create` hooks.
    pub async fn create_one(
        &self,
        collection: &str,
        payload: Item,
        ctx: &HookContext,
    ) -> Result<Item, ItemServiceError> {
        check_collection(collection)?;
        let event = HookEvent::create(collection);

        let filter_meta = HookMeta::new(event.clone(), Vec::new());
        let payload = self.run_filters(payload, &filter_meta, ctx).await?;

        let created = self.store.insert(collection, payload)?;
        let id = fields::id(&created).unwrap_or_default();
        debug!(collection, id = %id, user = ?ctx.accountability.user, "Item created");

        let action_meta = HookMeta::new(event, vec![id]);
        self.run_actions(&created, &action_meta, ctx).await;

        Ok(created)
    }

    /// Update a single item, running `<collection>.items.update` hooks.
    pub async fn update_one(
        &self,
        collection: &str,
        id: &str,
        payload: Item,
        ctx: &HookContext,
    ) -> Result<Item, ItemServiceError> {
        let mut updated = self
            .update_many(collection, &[id.to_string()], payload, ctx)
            .await?;
        updated
            .pop()
            .ok_or_else(|| ItemServiceError::Store(StoreError::not_found(collection, id)))
    }

    /// Apply the same payload to several items. Filters and actions run once
    /// with all keys in `meta.keys`.
    pub async fn update_many(
        &self,
        collection: &str,
        ids: &[String],
        payload: Item,
        ctx: &HookContext,
    ) -> Result<Vec<Item>, ItemServiceError> {
        check_collection(collection)?;
        let event = HookEvent::update(collection);
        let meta = HookMeta::new(event, ids.to_vec());

        for id in ids {
            if self.store.get(collection, id)?.is_none() {
                return Err(StoreError::not_found(collection, id).into());
            }
        }

        let payload = self.run_filters(payload, &meta, ctx).await?;

        let mut updated = Vec::with_capacity(ids.len());
        for id in ids {
            updated.push(self.store.update(collection, id, &payload)?);
        }
        debug!(collection, keys = ?ids, user = ?ctx.accountability.user, "Items updated");

        self.run_actions(&payload, &meta, ctx).await;

        Ok(updated)
    }

    async fn run_filters(
        &self,
        mut payload: Item,
        meta: &HookMeta,
        ctx: &HookContext,
    ) -> Result<Item, ItemServiceError> {
        for hook in self.hooks.filters(&meta.event) {
            payload = hook
                .filter(payload, meta, ctx)
                .await
                .map_err(|source| {
                    HOOK_FAILURES.with_label_values(&[hook.name()]).inc();
                    ItemServiceError::Rejected {
                        hook: hook.name(),
                        source,
                    }
                })?;
        }
        Ok(payload)
    }

    async fn run_actions(&self, payload: &Item, meta: &HookMeta, ctx: &HookContext) {
        for hook in self.hooks.actions(&meta.event) {
            if let Err(e) = hook.action(payload, meta, ctx).await {
                HOOK_FAILURES.with_label_values(&[hook.name()]).inc();
                error!(
                    hook = hook.name(),
                    event = %meta.event,
                    keys = ?meta.keys,
                    "Action hook failed: {}",
                    e
                );
            }
        }
    }
}

fn check_collection(collection: &str) -> Result<(), ItemServiceError> {
    if is_valid_field_name(collection) {
        Ok(())
    } else {
        Err(ItemServiceError::InvalidCollection(collection.to_string()))
    }
}
