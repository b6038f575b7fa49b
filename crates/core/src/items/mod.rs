//! Collection-scoped record storage.
//!
//! Every record lives in a named collection as a JSON object. Workflow
//! hooks read and write these records; nothing else is persisted.

pub mod fields;
mod sqlite_store;
mod store;

pub use sqlite_store::SqliteItemStore;
pub use store::{is_valid_field_name, Item, ItemQuery, ItemStore, SortOrder, StoreError};
