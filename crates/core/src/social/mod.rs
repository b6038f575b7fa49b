//! Social media publishing.
//!
//! [`SocialPublisher`] is implemented once per network. Posts are stored in
//! `social_media_posts` and published by [`SocialPostHook`] once they are
//! scheduled.

mod bluesky;
mod hooks;
mod mastodon;
mod types;

pub use bluesky::{detect_facets, post_url, BlueskyClient, Facet, FacetKind};
pub use hooks::{announcement_text, PodcastAnnouncementHook, SocialPostHook, SOCIAL_MEDIA_POSTS};
pub use mastodon::MastodonClient;
pub use types::{PublishError, PublishedPost, SocialPlatform, SocialPost};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::Config;

/// Publishes a post to one social network.
#[async_trait]
pub trait SocialPublisher: Send + Sync {
    fn platform(&self) -> SocialPlatform;

    async fn publish(&self, post: &SocialPost) -> Result<PublishedPost, PublishError>;
}

/// Build a publisher for every configured network.
pub fn create_publishers(config: &Config) -> Vec<Arc<dyn SocialPublisher>> {
    let mut publishers: Vec<Arc<dyn SocialPublisher>> = Vec::new();

    if config.bluesky.is_configured() {
        match BlueskyClient::new(config.bluesky.clone()) {
            Ok(client) => {
                info!("Bluesky publishing enabled for {}", config.bluesky.handle);
                publishers.push(Arc::new(client));
            }
            Err(e) => warn!("Bluesky publishing disabled: {}", e),
        }
    }

    if config.mastodon.is_configured() {
        match MastodonClient::new(config.mastodon.clone()) {
            Ok(client) => {
                info!("Mastodon publishing enabled on {}", config.mastodon.instance_url);
                publishers.push(Arc::new(client));
            }
            Err(e) => warn!("Mastodon publishing disabled: {}", e),
        }
    }

    publishers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlueskyConfig, MastodonConfig};

    #[test]
    fn test_no_publishers_by_default() {
        assert!(create_publishers(&Config::default()).is_empty());
    }

    #[test]
    fn test_configured_publishers() {
        let config = Config {
            bluesky: BlueskyConfig {
                handle: "programmier.bar".to_string(),
                app_password: "pw".to_string(),
                service_url: None,
            },
            mastodon: MastodonConfig {
                instance_url: "https://social.example".to_string(),
                access_token: "token".to_string(),
            },
            ..Default::default()
        };
        let platforms: Vec<_> = create_publishers(&config).iter().map(|p| p.platform()).collect();
        assert_eq!(platforms, vec![SocialPlatform::Bluesky, SocialPlatform::Mastodon]);
    }
}
