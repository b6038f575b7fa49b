//! Admin item API. Writes go through the item service so hooks run.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;

use programmierbar_core::{HookContext, Item, ItemQuery, SyncOutcome};

use super::error::ApiError;
use super::middleware::AuthIdentity;
use crate::state::AppState;

/// Maximum allowed limit for item queries
const MAX_LIMIT: i64 = 1000;

/// Response envelope
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// Build a query from `filter[field]=value`, `sort=field|-field` and `limit`.
pub fn parse_query(params: &HashMap<String, String>) -> Result<ItemQuery, ApiError> {
    let mut query = ItemQuery::new();

    let mut filters: Vec<(&str, &str)> = params
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix("filter[")
                .and_then(|rest| rest.strip_suffix(']'))
                .map(|field| (field, value.as_str()))
        })
        .collect();
    filters.sort();
    for (field, value) in filters {
        query = query.filter(field, filter_value(value));
    }

    if let Some(sort) = params.get("sort").map(|s| s.trim()).filter(|s| !s.is_empty()) {
        query = match sort.strip_prefix('-') {
            Some(field) => query.sort_desc(field),
            None => query.sort_asc(sort),
        };
    }

    if let Some(limit) = params.get("limit") {
        let limit: i64 = limit
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("Ungültiges Limit: {}", limit)))?;
        query = query.limit(limit.clamp(1, MAX_LIMIT));
    }

    Ok(query)
}

/// `null`, booleans and integers are matched as JSON values, everything else as text.
fn filter_value(raw: &str) -> Value {
    match raw {
        "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        // Only canonical integers; "01234" stays text.
        _ => match raw.parse::<i64>() {
            Ok(n) if n.to_string() == raw => Value::from(n),
            _ => Value::String(raw.to_string()),
        },
    }
}

fn into_item(body: Value) -> Result<Item, ApiError> {
    match body {
        Value::Object(item) => Ok(item),
        _ => Err(ApiError::BadRequest(
            "Der Inhalt muss ein JSON-Objekt sein".to_string(),
        )),
    }
}

pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<DataResponse<Vec<Item>>>, ApiError> {
    let query = parse_query(&params)?;
    let items = state.items().read_many(&collection, &query)?;
    Ok(Json(DataResponse { data: items }))
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<DataResponse<Item>>, ApiError> {
    let item = state
        .items()
        .read_one(&collection, &id)?
        .ok_or_else(|| ApiError::NotFound("Eintrag nicht gefunden".to_string()))?;
    Ok(Json(DataResponse { data: item }))
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(collection): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Item>>), ApiError> {
    let Json(body) = body?;
    let payload = into_item(body)?;
    let ctx = HookContext::new(identity.accountability());
    let created = state.items().create_one(&collection, payload, &ctx).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path((collection, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DataResponse<Item>>, ApiError> {
    let Json(body) = body?;
    let payload = into_item(body)?;
    let ctx = HookContext::new(identity.accountability());
    let updated = state
        .items()
        .update_one(&collection, &id, payload, &ctx)
        .await?;
    Ok(Json(DataResponse { data: updated }))
}

/// Poll HappyScribe for a transcript and store the text once ready.
pub async fn sync_transcript(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SyncOutcome>, ApiError> {
    let sync = state.transcript_sync().ok_or_else(|| {
        ApiError::ServiceUnavailable("Transkription ist nicht konfiguriert".to_string())
    })?;
    Ok(Json(sync.sync(&id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use programmierbar_core::SortOrder;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_query_filters_sort_limit() {
        let query = parse_query(&params(&[
            ("filter[status]", "paid"),
            ("filter[number]", "42"),
            ("filter[portal_token]", "null"),
            ("sort", "-start_on"),
            ("limit", "5000"),
        ]))
        .unwrap();

        assert_eq!(
            query.filters,
            vec![
                ("number".to_string(), Value::from(42)),
                ("portal_token".to_string(), Value::Null),
                ("status".to_string(), Value::from("paid")),
            ]
        );
        assert_eq!(
            query.sort,
            Some(("start_on".to_string(), SortOrder::Descending))
        );
        assert_eq!(query.limit, Some(MAX_LIMIT));
    }

    #[test]
    fn test_filter_value_keeps_non_canonical_numbers_as_text() {
        assert_eq!(filter_value("01234"), Value::from("01234"));
        assert_eq!(filter_value("+5"), Value::from("+5"));
        assert_eq!(filter_value("-0"), Value::from("-0"));
        assert_eq!(filter_value("-17"), Value::from(-17));
        assert_eq!(filter_value("0"), Value::from(0));
    }

    #[test]
    fn test_parse_query_rejects_bad_limit() {
        let result = parse_query(&params(&[("limit", "viele")]));
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_into_item_requires_object() {
        assert!(into_item(serde_json::json!({"title": "x"})).is_ok());
        assert!(matches!(
            into_item(serde_json::json!(["x"])),
            Err(ApiError::BadRequest(_))
        ));
    }
}
