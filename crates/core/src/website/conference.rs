//! Conference lookup for the ticket pages.

use serde::Serialize;
use serde_json::Value;

use crate::items::{fields, Item, ItemQuery, ItemStore, StoreError};

/// A conference together with its talks.
#[derive(Debug, Clone, Serialize)]
pub struct ConferenceWithAgenda {
    #[serde(flatten)]
    pub conference: Item,
    /// Talks ordered by `start_on`.
    pub agenda: Vec<Item>,
}

/// Find a conference by id, falling back to its slug.
pub fn find_conference(
    store: &dyn ItemStore,
    identifier: &str,
) -> Result<Option<ConferenceWithAgenda>, StoreError> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Ok(None);
    }

    let conference = match store.get("conferences", identifier)? {
        Some(conference) => conference,
        None => {
            let by_slug = store.find(
                "conferences",
                &ItemQuery::new().filter("slug", identifier).limit(1),
            )?;
            match by_slug.into_iter().next() {
                Some(conference) => conference,
                None => return Ok(None),
            }
        }
    };

    let id = fields::id(&conference).unwrap_or_else(|| identifier.to_string());
    let agenda = store.find(
        "talks",
        &ItemQuery::new()
            .filter("conference", Value::String(id))
            .sort_asc("start_on"),
    )?;

    Ok(Some(ConferenceWithAgenda { conference, agenda }))
}
