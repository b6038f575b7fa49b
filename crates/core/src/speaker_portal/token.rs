//! Portal token issuance and expiry.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::hooks::{FilterHook, HookContext, HookError, HookMeta};
use crate::items::{fields, Item};

/// Lowercase hex SHA-256 of a token, stored once the token is consumed.
pub fn token_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Parse a stored expiry. Accepts RFC 3339 and zone-less timestamps (UTC).
pub fn parse_expiry(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Filter on `speakers.items.create` that hands out a portal token.
pub struct PortalTokenFilter {
    ttl_days: i64,
}

impl PortalTokenFilter {
    pub fn new(ttl_days: i64) -> Self {
        Self { ttl_days }
    }
}

#[async_trait]
impl FilterHook for PortalTokenFilter {
    fn name(&self) -> &'static str {
        "portal_token"
    }

    async fn filter(&self, mut payload: Item, meta: &HookMeta, _ctx: &HookContext) -> Result<Item, HookError> {
        if fields::text(&payload, "portal_token").is_some() {
            return Ok(payload);
        }

        let expires = Utc::now() + Duration::days(self.ttl_days);
        payload.insert(
            "portal_token".to_string(),
            Value::String(uuid::Uuid::new_v4().to_string()),
        );
        payload.insert(
            "portal_token_expires".to_string(),
            Value::String(expires.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        payload.insert("portal_status".to_string(), Value::String("pending".to_string()));
        debug!(collection = %meta.collection, "Issued speaker portal token");

        Ok(payload)
    }
}
