//! Mock social publisher for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::social::{PublishError, PublishedPost, SocialPlatform, SocialPost, SocialPublisher};

/// Mock implementation of the SocialPublisher trait.
///
/// Successful posts get ids `mock-1`, `mock-2`, ... and a matching URL.
#[derive(Debug)]
pub struct MockSocialPublisher {
    platform: SocialPlatform,
    published: Arc<RwLock<Vec<SocialPost>>>,
    next_error: Arc<RwLock<Option<PublishError>>>,
}

impl MockSocialPublisher {
    pub fn new(platform: SocialPlatform) -> Self {
        Self {
            platform,
            published: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Posts published so far.
    pub async fn published(&self) -> Vec<SocialPost> {
        self.published.read().await.clone()
    }

    pub async fn set_next_error(&self, error: PublishError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl SocialPublisher for MockSocialPublisher {
    fn platform(&self) -> SocialPlatform {
        self.platform
    }

    async fn publish(&self, post: &SocialPost) -> Result<PublishedPost, PublishError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        post.check_length(self.platform)?;

        let mut published = self.published.write().await;
        published.push(post.clone());
        let id = format!("mock-{}", published.len());
        Ok(PublishedPost {
            post_url: format!("https://{}.mock/posts/{}", self.platform, id),
            post_id: id,
        })
    }
}
