//! Mastodon REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{PublishError, PublishedPost, SocialPlatform, SocialPost, SocialPublisher};
use crate::config::MastodonConfig;

#[derive(Debug, Serialize)]
struct StatusRequest<'a> {
    status: &'a str,
    visibility: &'a str,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    uri: String,
}

pub struct MastodonClient {
    client: Client,
    instance_url: String,
    access_token: String,
}

impl MastodonClient {
    pub fn new(config: MastodonConfig) -> Result<Self, PublishError> {
        if !config.is_configured() {
            return Err(PublishError::NotConfigured(
                "Mastodon instance URL and access token are required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            instance_url: config.instance_url.trim_end_matches('/').to_string(),
            access_token: config.access_token,
        })
    }
}

#[async_trait]
impl SocialPublisher for MastodonClient {
    fn platform(&self) -> SocialPlatform {
        SocialPlatform::Mastodon
    }

    async fn publish(&self, post: &SocialPost) -> Result<PublishedPost, PublishError> {
        post.check_length(SocialPlatform::Mastodon)?;

        let url = format!("{}/api/v1/statuses", self.instance_url);
        debug!(instance = %self.instance_url, "Mastodon post status");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&StatusRequest {
                status: &post.text,
                visibility: "public",
                language: "de",
            })
            .send()
            .await?;

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

        let created: StatusResponse = response.json().await.map_err(|e| {
            PublishError::ParseError(format!("Failed to parse status response: {}", e))
        })?;

        Ok(PublishedPost {
            post_url: created.url.unwrap_or(created.uri),
            post_id: created.id,
        })
    }
}
