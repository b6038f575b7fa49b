use async_trait::async_trait;

use super::{HookContext, HookError, HookMeta};
use crate::items::Item;

/// Runs before an item is persisted and may rewrite the payload.
///
/// Returning an error aborts the write.
#[async_trait]
pub trait FilterHook: Send + Sync {
    /// Name used in logs and metrics.
    fn name(&self) -> &'static str;

    async fn filter(
        &self,
        payload: Item,
        meta: &HookMeta,
        ctx: &HookContext,
    ) -> Result<Item, HookError>;
}

/// Runs after an item was persisted.
///
/// Errors are logged by the caller and never undo the write.
#[async_trait]
pub trait ActionHook: Send + Sync {
    /// Name used in logs and metrics.
    fn name(&self) -> &'static str;

    async fn action(
        &self,
        payload: &Item,
        meta: &HookMeta,
        ctx: &HookContext,
    ) -> Result<(), HookError>;
}
