//! Hook event, metadata and error types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::items::StoreError;

/// Item lifecycle operation a hook listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemAction {
    Create,
    Update,
}

impl ItemAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemAction::Create => "create",
            ItemAction::Update => "update",
        }
    }
}

/// Named hook event, rendered as `<collection>.items.<action>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookEvent {
    pub collection: String,
    pub action: ItemAction,
}

impl HookEvent {
    pub fn create(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            action: ItemAction::Create,
        }
    }

    pub fn update(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            action: ItemAction::Update,
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.items.{}", self.collection, self.action.as_str())
    }
}

/// Metadata passed to every hook invocation.
#[derive(Debug, Clone)]
pub struct HookMeta {
    pub event: HookEvent,
    pub collection: String,
    /// Affected item ids. For creates this is the new id (empty inside filters).
    pub keys: Vec<String>,
}

impl HookMeta {
    pub fn new(event: HookEvent, keys: Vec<String>) -> Self {
        Self {
            collection: event.collection.clone(),
            event,
            keys,
        }
    }
}

/// Who triggered the write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Accountability {
    pub user: Option<String>,
    pub admin: bool,
}

impl Accountability {
    pub fn admin(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            admin: true,
        }
    }

    /// Writes issued by the system itself (public endpoints, hooks).
    pub fn system() -> Self {
        Self {
            user: None,
            admin: true,
        }
    }
}

/// Execution context of a hook invocation.
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    pub accountability: Accountability,
}

impl HookContext {
    pub fn new(accountability: Accountability) -> Self {
        Self { accountability }
    }

    pub fn system() -> Self {
        Self::new(Accountability::system())
    }
}

/// Errors raised by hooks.
#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The payload is not acceptable; aborts the write when raised by a filter.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// An external service call failed.
    #[error("External service error: {0}")]
    External(String),
}
