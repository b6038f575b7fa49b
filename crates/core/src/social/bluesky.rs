//! Bluesky (AT Protocol) client.
//!
//! Every post is a session round trip: `createSession` for an access token,
//! then `createRecord` for the `app.bsky.feed.post` record. Rich text spans
//! (links, hashtags) are sent as facets indexed by UTF-8 byte offsets.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::{PublishError, PublishedPost, SocialPlatform, SocialPost, SocialPublisher};
use crate::config::BlueskyConfig;

static LINK_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s]+").unwrap());
static TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:^|\s)(#[^\s#.,;:!?()\[\]{}"'<>]+)"#).unwrap());

/// A rich text span in the post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetKind {
    Link(String),
    Tag(String),
}

/// Span with byte offsets into the UTF-8 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    pub byte_start: usize,
    pub byte_end: usize,
    pub kind: FacetKind,
}

impl Facet {
    fn to_json(&self) -> Value {
        let feature = match &self.kind {
            FacetKind::Link(uri) => json!({"$type": "app.bsky.richtext.facet#link", "uri": uri}),
            FacetKind::Tag(tag) => json!({"$type": "app.bsky.richtext.facet#tag", "tag": tag}),
        };
        json!({
            "index": {"byteStart": self.byte_start, "byteEnd": self.byte_end},
            "features": [feature],
        })
    }
}

/// Detect links and hashtags. Trailing sentence punctuation is not part of a link.
pub fn detect_facets(text: &str) -> Vec<Facet> {
    let mut facets = Vec::new();

    for found in LINK_PATTERN.find_iter(text) {
        let uri = found
            .as_str()
            .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | ')'));
        facets.push(Facet {
            byte_start: found.start(),
            byte_end: found.start() + uri.len(),
            kind: FacetKind::Link(uri.to_string()),
        });
    }

    for captures in TAG_PATTERN.captures_iter(text) {
        let Some(tag) = captures.get(1) else {
            continue;
        };
        let name = &tag.as_str()[1..];
        if name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        facets.push(Facet {
            byte_start: tag.start(),
            byte_end: tag.end(),
            kind: FacetKind::Tag(name.to_string()),
        });
    }

    facets.sort_by_key(|f| f.byte_start);
    facets
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
    did: String,
    handle: String,
}

#[derive(Debug, Deserialize)]
struct CreateRecordResponse {
    uri: String,
}

pub struct BlueskyClient {
    client: Client,
    service_url: String,
    handle: String,
    app_password: String,
}

impl BlueskyClient {
    pub fn new(config: BlueskyConfig) -> Result<Self, PublishError> {
        if !config.is_configured() {
            return Err(PublishError::NotConfigured(
                "Bluesky handle and app password are required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let service_url = config
            .service_url
            .unwrap_or_else(|| "https://bsky.social".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            service_url,
            handle: config.handle,
            app_password: config.app_password,
        })
    }

    async fn create_session(&self) -> Result<Session, PublishError> {
        let url = format!("{}/xrpc/com.atproto.server.createSession", self.service_url);
        debug!(handle = %self.handle, "Bluesky createSession");

        let response = self
            .client
            .post(&url)
            .json(&CreateSessionRequest {
                identifier: &self.handle,
                password: &self.app_password,
            })
            .send()
            .await?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| PublishError::ParseError(format!("Failed to parse session: {}", e)))
    }

    fn record(post: &SocialPost) -> Value {
        let mut record = json!({
            "$type": "app.bsky.feed.post",
            "text": post.text,
            "createdAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "langs": ["de"],
        });
        let facets: Vec<Value> = detect_facets(&post.text).iter().map(Facet::to_json).collect();
        if !facets.is_empty() {
            record["facets"] = Value::Array(facets);
        }
        record
    }
}

async fn check_status(response: Response) -> Result<Response, PublishError> {
    let status = response.status();
    if status == 401 || status == 403 {
        let body = response.text().await.unwrap_or_default();
        return Err(PublishError::Auth(body));
    }
    if status == 429 {
        return Err(PublishError::RateLimitExceeded);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PublishError::ApiError {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(response)
}

/// Public web URL for a post record `at://did/app.bsky.feed.post/<rkey>`.
pub fn post_url(handle: &str, uri: &str) -> String {
    let rkey = uri.rsplit('/').next().unwrap_or(uri);
    format!("https://bsky.app/profile/{}/post/{}", handle, rkey)
}

#[async_trait]
impl SocialPublisher for BlueskyClient {
    fn platform(&self) -> SocialPlatform {
        SocialPlatform::Bluesky
    }

    async fn publish(&self, post: &SocialPost) -> Result<PublishedPost, PublishError> {
        post.check_length(SocialPlatform::Bluesky)?;
        let session = self.create_session().await?;

        let url = format!("{}/xrpc/com.atproto.repo.createRecord", self.service_url);
        debug!(did = %session.did, "Bluesky createRecord");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&session.access_jwt)
            .json(&json!({
                "repo": session.did,
                "collection": "app.bsky.feed.post",
                "record": Self::record(post),
            }))
            .send()
            .await?;

        let created: CreateRecordResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| PublishError::ParseError(format!("Failed to parse record: {}", e)))?;

        Ok(PublishedPost {
            post_url: post_url(&session.handle, &created.uri),
            post_id: created.uri,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_facets_use_byte_offsets() {
        let text = "Größte Folge: https://programmier.bar/podcast/x #Rust";
        let facets = detect_facets(text);
        assert_eq!(facets.len(), 2);

        // "Größte Folge: " is 16 bytes but 14 characters.
        assert_eq!(facets[0].byte_start, 16);
        assert_eq!(
            &text[facets[0].byte_start..facets[0].byte_end],
            "https://programmier.bar/podcast/x"
        );
        assert_eq!(facets[1].kind, FacetKind::Tag("Rust".to_string()));
        assert_eq!(&text[facets[1].byte_start..facets[1].byte_end], "#Rust");
    }

    #[test]
    fn test_facets_trim_trailing_punctuation() {
        let text = "Mehr unter https://programmier.bar.";
        let facets = detect_facets(text);
        assert_eq!(facets[0].kind, FacetKind::Link("https://programmier.bar".to_string()));
        assert_eq!(facets[0].byte_end, text.len() - 1);
    }

    #[test]
    fn test_facets_ignore_anchors_and_numbers() {
        let facets = detect_facets("Siehe https://x.de/#abschnitt und Folge #123 mit #Künstliche_Intelligenz");
        let tags: Vec<_> = facets
            .iter()
            .filter_map(|f| match &f.kind {
                FacetKind::Tag(tag) => Some(tag.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(tags, vec!["Künstliche_Intelligenz"]);
    }

    #[test]
    fn test_post_url() {
        assert_eq!(
            post_url("programmier.bar", "at://did:plc:abc/app.bsky.feed.post/3kxyz"),
            "https://bsky.app/profile/programmier.bar/post/3kxyz"
        );
    }

    fn client(server: &MockServer) -> BlueskyClient {
        BlueskyClient::new(BlueskyConfig {
            handle: "programmier.bar".to_string(),
            app_password: "app-pass".to_string(),
            service_url: Some(server.uri()),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_publish_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.server.createSession"))
            .and(body_partial_json(json!({"identifier": "programmier.bar", "password": "app-pass"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessJwt": "jwt-1",
                "refreshJwt": "r",
                "did": "did:plc:abc",
                "handle": "programmier.bar"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.repo.createRecord"))
            .and(header("authorization", "Bearer jwt-1"))
            .and(body_partial_json(json!({
                "repo": "did:plc:abc",
                "collection": "app.bsky.feed.post",
                "record": {"text": "Neue Folge #Rust"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "uri": "at://did:plc:abc/app.bsky.feed.post/3kxyz",
                "cid": "bafy"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let published = client(&server)
            .publish(&SocialPost::new("Neue Folge #Rust"))
            .await
            .unwrap();

        assert_eq!(published.post_id, "at://did:plc:abc/app.bsky.feed.post/3kxyz");
        assert_eq!(published.post_url, "https://bsky.app/profile/programmier.bar/post/3kxyz");
    }

    #[tokio::test]
    async fn test_publish_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.server.createSession"))
            .respond_with(ResponseTemplate::new(401).set_body_string("AuthenticationRequired"))
            .mount(&server)
            .await;

        let result = client(&server).publish(&SocialPost::new("Hallo")).await;
        assert!(matches!(result, Err(PublishError::Auth(_))));
    }

    #[tokio::test]
    async fn test_publish_rejects_long_post_without_request() {
        let server = MockServer::start().await;
        let result = client(&server)
            .publish(&SocialPost::new("x".repeat(301)))
            .await;
        assert!(matches!(result, Err(PublishError::TooLong { .. })));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn test_requires_configuration() {
        assert!(matches!(
            BlueskyClient::new(BlueskyConfig::default()),
            Err(PublishError::NotConfigured(_))
        ));
    }
}
