//! Item lifecycle hooks.
//!
//! Hooks are registered against `<collection>.items.create|update` events.
//! Filters rewrite or reject a payload before it is stored, actions react
//! after the write. [`ItemService`] is the only writer that emits events.

mod install;
mod registry;
mod service;
mod traits;
mod types;

pub use install::{install_hooks, HookDependencies};
pub use registry::HookRegistry;
pub use service::{ItemService, ItemServiceError};
pub use traits::{ActionHook, FilterHook};
pub use types::{Accountability, HookContext, HookError, HookEvent, HookMeta, ItemAction};
