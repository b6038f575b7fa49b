//! SQLite-backed item store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, params_from_iter, types::Value as SqlValue, Connection};
use serde_json::Value;

use super::{is_valid_field_name, Item, ItemQuery, ItemStore, SortOrder, StoreError};

/// SQLite-backed item store. Each item is stored as a JSON document.
pub struct SqliteItemStore {
    conn: Mutex<Connection>,
}

impl SqliteItemStore {
    /// Create a new SQLite item store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite item store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_items_collection ON items(collection);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    fn load(conn: &Connection, collection: &str, id: &str) -> Result<Option<Item>, StoreError> {
        let result = conn.query_row(
            "SELECT data FROM items WHERE collection = ? AND id = ?",
            params![collection, id],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(data) => parse_item(&data).map(Some),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    fn build_where_clause(
        collection: &str,
        query: &ItemQuery,
    ) -> Result<(String, Vec<SqlValue>), StoreError> {
        let mut conditions = vec!["collection = ?".to_string()];
        let mut params = vec![SqlValue::Text(collection.to_string())];

        for (field, value) in &query.filters {
            if !is_valid_field_name(field) {
                return Err(StoreError::InvalidQuery(format!(
                    "invalid field name '{}'",
                    field
                )));
            }

            let path = format!("json_extract(data, '$.{}')", field);
            match value {
                Value::Null => conditions.push(format!("{} IS NULL", path)),
                other => {
                    conditions.push(format!("{} = ?", path));
                    params.push(to_sql_value(other));
                }
            }
        }

        Ok((format!("WHERE {}", conditions.join(" AND ")), params))
    }
}

/// Convert a JSON value into the SQLite value `json_extract` would produce for it.
fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

fn parse_item(data: &str) -> Result<Item, StoreError> {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::Object(item)) => Ok(item),
        Ok(_) => Err(StoreError::Serialization(
            "stored item is not a JSON object".to_string(),
        )),
        Err(e) => Err(StoreError::Serialization(e.to_string())),
    }
}

/// Normalize the `id` field to a string, generating one if absent.
fn ensure_id(item: &mut Item) -> String {
    let id = match item.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => uuid::Uuid::new_v4().to_string(),
    };
    item.insert("id".to_string(), Value::String(id.clone()));
    id
}

impl ItemStore for SqliteItemStore {
    fn insert(&self, collection: &str, mut item: Item) -> Result<Item, StoreError> {
        let conn = self.lock()?;

        let id = ensure_id(&mut item);
        let now = Utc::now().to_rfc3339();
        let data = serde_json::to_string(&item)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO items (collection, id, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
            params![collection, id, data, now, now],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(item)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Item>, StoreError> {
        let conn = self.lock()?;
        Self::load(&conn, collection, id)
    }

    fn update(&self, collection: &str, id: &str, patch: &Item) -> Result<Item, StoreError> {
        let conn = self.lock()?;

        let mut item =
            Self::load(&conn, collection, id)?.ok_or_else(|| StoreError::not_found(collection, id))?;

        for (key, value) in patch {
            // The primary key is immutable.
            if key == "id" {
                continue;
            }
            item.insert(key.clone(), value.clone());
        }

        let data = serde_json::to_string(&item)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        conn.execute(
            "UPDATE items SET data = ?, updated_at = ? WHERE collection = ? AND id = ?",
            params![data, Utc::now().to_rfc3339(), collection, id],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(item)
    }

    fn find(&self, collection: &str, query: &ItemQuery) -> Result<Vec<Item>, StoreError> {
        let conn = self.lock()?;

        let (where_clause, mut params) = Self::build_where_clause(collection, query)?;

        let order_clause = match &query.sort {
            Some((field, order)) => {
                if !is_valid_field_name(field) {
                    return Err(StoreError::InvalidQuery(format!(
                        "invalid sort field '{}'",
                        field
                    )));
                }
                let direction = match order {
                    SortOrder::Ascending => "ASC",
                    SortOrder::Descending => "DESC",
                };
                format!(
                    "ORDER BY json_extract(data, '$.{}') {}, rowid ASC",
                    field, direction
                )
            }
            None => "ORDER BY rowid ASC".to_string(),
        };

        let limit_clause = match query.limit {
            Some(limit) => {
                params.push(SqlValue::Integer(limit));
                "LIMIT ?"
            }
            None => "",
        };

        let sql = format!(
            "SELECT data FROM items {} {} {}",
            where_clause, order_clause, limit_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut items = Vec::new();
        for row in rows {
            let data = row.map_err(|e| StoreError::Database(e.to_string()))?;
            items.push(parse_item(&data)?);
        }

        Ok(items)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<Item, StoreError> {
        let conn = self.lock()?;

        let item =
            Self::load(&conn, collection, id)?.ok_or_else(|| StoreError::not_found(collection, id))?;

        conn.execute(
            "DELETE FROM items WHERE collection = ? AND id = ?",
            params![collection, id],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn item(value: Value) -> Item {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_insert_generates_id() {
        let store = SqliteItemStore::in_memory().unwrap();
        let created = store
            .insert("speakers", item(json!({"first_name": "Ada"})))
            .unwrap();

        let id = created["id"].as_str().unwrap();
        assert!(!id.is_empty());

        let fetched = store.get("speakers", id).unwrap().unwrap();
        assert_eq!(fetched["first_name"], "Ada");
    }

    #[test]
    fn test_insert_keeps_given_id() {
        let store = SqliteItemStore::in_memory().unwrap();
        let created = store.insert("podcasts", item(json!({"id": 42}))).unwrap();
        assert_eq!(created["id"], "42");
        assert!(store.get("podcasts", "42").unwrap().is_some());
    }

    #[test]
    fn test_duplicate_id_fails() {
        let store = SqliteItemStore::in_memory().unwrap();
        store.insert("podcasts", item(json!({"id": "p1"}))).unwrap();
        let result = store.insert("podcasts", item(json!({"id": "p1"})));
        assert!(matches!(result, Err(StoreError::Database(_))));
    }

    #[test]
    fn test_collections_are_isolated() {
        let store = SqliteItemStore::in_memory().unwrap();
        store.insert("podcasts", item(json!({"id": "x"}))).unwrap();
        assert!(store.get("speakers", "x").unwrap().is_none());
    }

    #[test]
    fn test_update_merges_fields() {
        let store = SqliteItemStore::in_memory().unwrap();
        store
            .insert(
                "podcasts",
                item(json!({"id": "p1", "title": "Old", "number": "12"})),
            )
            .unwrap();

        let updated = store
            .update(
                "podcasts",
                "p1",
                &item(json!({"id": "hijack", "title": "New", "description": null})),
            )
            .unwrap();

        assert_eq!(updated["id"], "p1");
        assert_eq!(updated["title"], "New");
        assert_eq!(updated["number"], "12");
        assert_eq!(updated["description"], Value::Null);
    }

    #[test]
    fn test_update_missing_item() {
        let store = SqliteItemStore::in_memory().unwrap();
        let result = store.update("podcasts", "nope", &Item::new());
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_find_with_filters() {
        let store = SqliteItemStore::in_memory().unwrap();
        store
            .insert("tickets", item(json!({"ticket_code": "TKT-AAAAAA", "order": "o1"})))
            .unwrap();
        store
            .insert("tickets", item(json!({"ticket_code": "TKT-BBBBBB", "order": "o1"})))
            .unwrap();
        store
            .insert("tickets", item(json!({"ticket_code": "TKT-CCCCCC", "order": "o2"})))
            .unwrap();

        let by_order = store
            .find("tickets", &ItemQuery::new().filter("order", "o1"))
            .unwrap();
        assert_eq!(by_order.len(), 2);

        let by_code = store
            .find("tickets", &ItemQuery::new().filter("ticket_code", "TKT-CCCCCC"))
            .unwrap();
        assert_eq!(by_code.len(), 1);
        assert_eq!(by_code[0]["order"], "o2");
    }

    #[test]
    fn test_find_null_matches_missing_and_null() {
        let store = SqliteItemStore::in_memory().unwrap();
        store
            .insert("speakers", item(json!({"id": "a", "portal_token": null})))
            .unwrap();
        store.insert("speakers", item(json!({"id": "b"}))).unwrap();
        store
            .insert("speakers", item(json!({"id": "c", "portal_token": "t"})))
            .unwrap();

        let found = store
            .find("speakers", &ItemQuery::new().filter("portal_token", Value::Null))
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_find_bool_and_number_filters() {
        let store = SqliteItemStore::in_memory().unwrap();
        store
            .insert("profiles", item(json!({"id": "a", "update_slug": false, "rank": 1})))
            .unwrap();
        store
            .insert("profiles", item(json!({"id": "b", "update_slug": true, "rank": 2})))
            .unwrap();

        let found = store
            .find("profiles", &ItemQuery::new().filter("update_slug", false))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["id"], "a");

        let found = store
            .find("profiles", &ItemQuery::new().filter("rank", 2))
            .unwrap();
        assert_eq!(found[0]["id"], "b");
    }

    #[test]
    fn test_find_sorted_and_limited() {
        let store = SqliteItemStore::in_memory().unwrap();
        for (id, start) in [("t1", "2025-06-01T10:00"), ("t2", "2025-06-01T09:00"), ("t3", "2025-06-01T11:00")] {
            store
                .insert("talks", item(json!({"id": id, "start_on": start})))
                .unwrap();
        }

        let sorted = store
            .find("talks", &ItemQuery::new().sort_asc("start_on"))
            .unwrap();
        let ids: Vec<&str> = sorted.iter().map(|t| t["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["t2", "t1", "t3"]);

        let latest = store
            .find("talks", &ItemQuery::new().sort_desc("start_on").limit(1))
            .unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0]["id"], "t3");
    }

    #[test]
    fn test_find_rejects_invalid_field() {
        let store = SqliteItemStore::in_memory().unwrap();
        let result = store.find("talks", &ItemQuery::new().filter("a') --", 1));
        assert!(matches!(result, Err(StoreError::InvalidQuery(_))));
    }

    #[test]
    fn test_delete() {
        let store = SqliteItemStore::in_memory().unwrap();
        store.insert("votes", item(json!({"id": "v1"}))).unwrap();
        let deleted = store.delete("votes", "v1").unwrap();
        assert_eq!(deleted["id"], "v1");
        assert!(store.get("votes", "v1").unwrap().is_none());
        assert!(matches!(
            store.delete("votes", "v1"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_persists_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("items.db");

        {
            let store = SqliteItemStore::new(&path).unwrap();
            store
                .insert("conferences", item(json!({"id": "c1", "title": "Rust Day"})))
                .unwrap();
        }

        let store = SqliteItemStore::new(&path).unwrap();
        let conference = store.get("conferences", "c1").unwrap().unwrap();
        assert_eq!(conference["title"], "Rust Day");
    }
}
