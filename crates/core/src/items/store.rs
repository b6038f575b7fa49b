//! Item storage trait and query types.

use serde_json::{Map, Value};
use thiserror::Error;

/// A record in a collection. Always carries a string `id` once stored.
pub type Item = Map<String, Value>;

/// Error type for item operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Item not found.
    #[error("Item not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// Query references a field name that cannot be used as a JSON path.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Item could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Sort direction for [`ItemQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Equality query over top-level item fields.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    /// `(field, value)` pairs that must all match. `Value::Null` matches null or missing.
    pub filters: Vec<(String, Value)>,
    /// Field to sort by.
    pub sort: Option<(String, SortOrder)>,
    /// Maximum number of results.
    pub limit: Option<i64>,
}

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Sort ascending by `field`.
    pub fn sort_asc(mut self, field: impl Into<String>) -> Self {
        self.sort = Some((field.into(), SortOrder::Ascending));
        self
    }

    /// Sort descending by `field`.
    pub fn sort_desc(mut self, field: impl Into<String>) -> Self {
        self.sort = Some((field.into(), SortOrder::Descending));
        self
    }

    /// Set limit.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Field names usable in queries: ASCII letters, digits and underscores.
pub fn is_valid_field_name(field: &str) -> bool {
    !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Trait for item storage backends.
pub trait ItemStore: Send + Sync {
    /// Insert a new item. Generates a UUID `id` when the item has none.
    fn insert(&self, collection: &str, item: Item) -> Result<Item, StoreError>;

    /// Get an item by ID.
    fn get(&self, collection: &str, id: &str) -> Result<Option<Item>, StoreError>;

    /// Shallow-merge `patch` into the stored item and return the result.
    fn update(&self, collection: &str, id: &str, patch: &Item) -> Result<Item, StoreError>;

    /// List items matching the query.
    fn find(&self, collection: &str, query: &ItemQuery) -> Result<Vec<Item>, StoreError>;

    /// Delete an item. Returns the deleted item.
    fn delete(&self, collection: &str, id: &str) -> Result<Item, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_name_validation() {
        assert!(is_valid_field_name("ticket_code"));
        assert!(is_valid_field_name("field2"));
        assert!(!is_valid_field_name(""));
        assert!(!is_valid_field_name("a.b"));
        assert!(!is_valid_field_name("x') OR 1=1 --"));
    }

    #[test]
    fn test_query_builder() {
        let query = ItemQuery::new()
            .filter("podcast", "p1")
            .filter("status", "approved")
            .sort_desc("date_created")
            .limit(5);
        assert_eq!(query.filters.len(), 2);
        assert_eq!(query.filters[0], ("podcast".to_string(), Value::from("p1")));
        assert_eq!(
            query.sort,
            Some(("date_created".to_string(), SortOrder::Descending))
        );
        assert_eq!(query.limit, Some(5));
    }
}
