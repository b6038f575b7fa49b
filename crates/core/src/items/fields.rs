//! Accessors for loosely typed item fields.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Item, StoreError};

/// Non-empty, trimmed string value of `field`. Numbers are rendered as strings.
pub fn text(item: &Item, field: &str) -> Option<String> {
    match item.get(field)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// String id of a relation field; accepts nested objects carrying an `id`.
pub fn relation_id(item: &Item, field: &str) -> Option<String> {
    match item.get(field)? {
        Value::Object(nested) => text(nested, "id"),
        _ => text(item, field),
    }
}

/// The item's own `id`.
pub fn id(item: &Item) -> Option<String> {
    text(item, "id")
}

/// Deserialize an item into a typed record.
pub fn to_record<T: DeserializeOwned>(item: Item) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(item)).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Serialize a typed record into an item.
pub fn from_record<T: serde::Serialize>(record: &T) -> Result<Item, StoreError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(item)) => Ok(item),
        Ok(_) => Err(StoreError::Serialization(
            "record did not serialize to an object".to_string(),
        )),
        Err(e) => Err(StoreError::Serialization(e.to_string())),
    }
}

/// Build an item from a `json!` object literal. Non-objects yield an empty item.
pub fn object(value: Value) -> Item {
    match value {
        Value::Object(item) => item,
        _ => Item::new(),
    }
}
