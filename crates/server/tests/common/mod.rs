//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock dependencies injected, enabling E2E testing of the hooks and
//! endpoints without SMTP, social networks or HappyScribe.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use programmierbar_core::{
    config::{AuthConfig, DatabaseConfig, EmailConfig, SpeakerPortalConfig},
    install_hooks, AdminTokenAuthenticator, AuthMethod, Authenticator, Config, HookDependencies,
    HookRegistry, Item, ItemService, ItemStore, NoneAuthenticator, SocialPlatform,
    SocialPublisher, SqliteItemStore, Transcriber,
    testing::{MemoryFileStore, MockMailer, MockSocialPublisher, MockTranscriber},
};

/// Re-export fixtures for test convenience
pub use programmierbar_core::testing::fixtures;

/// Admin token used by fixtures with authentication enabled.
pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_contact_form() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/email", json!({
///         "name": "Ada", "email": "ada@example.com", "message": "Hallo programmier.bar!"
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Item store behind the router, for seeding and inspection
    pub store: Arc<SqliteItemStore>,
    /// Mock mailer - inspect sent mails
    pub mailer: Arc<MockMailer>,
    /// Mock Bluesky publisher
    pub bluesky: Arc<MockSocialPublisher>,
    /// Mock Mastodon publisher
    pub mastodon: Arc<MockSocialPublisher>,
    /// Mock HappyScribe
    pub transcriber: Arc<MockTranscriber>,
    /// Uploaded portal images
    pub files: Arc<MemoryFileStore>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
    /// Bearer token sent with admin requests
    auth_token: Option<String>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Require the admin token on the item API
    pub require_token: bool,
    /// Mount the item API without any token configured
    pub admin_token_configured: bool,
    /// Recipient of the contact form
    pub contact_address: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            require_token: false,
            admin_token_configured: true,
            contact_address: Some("team@programmier.bar".to_string()),
        }
    }
}

impl TestConfig {
    /// Item API guarded by [`ADMIN_TOKEN`].
    pub fn with_admin_token() -> Self {
        Self {
            require_token: true,
            ..Default::default()
        }
    }

    /// Token auth selected but no token set: the item API is not mounted.
    pub fn without_admin_token() -> Self {
        Self {
            require_token: true,
            admin_token_configured: false,
            ..Default::default()
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let auth = if test_config.require_token {
            AuthConfig {
                method: AuthMethod::AdminToken,
                admin_token: test_config
                    .admin_token_configured
                    .then(|| ADMIN_TOKEN.to_string()),
            }
        } else {
            AuthConfig {
                method: AuthMethod::None,
                admin_token: None,
            }
        };

        let config = Config {
            auth: auth.clone(),
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            email: EmailConfig {
                contact_address: test_config.contact_address.clone(),
                heise_contact_address: Some("heise@example.com".to_string()),
                ..Default::default()
            },
            speaker_portal: SpeakerPortalConfig {
                notification_address: Some("portal@programmier.bar".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        // Create mocks
        let store = Arc::new(SqliteItemStore::new(&db_path).expect("Failed to create item store"));
        let mailer = Arc::new(MockMailer::new());
        let bluesky = Arc::new(MockSocialPublisher::new(SocialPlatform::Bluesky));
        let mastodon = Arc::new(MockSocialPublisher::new(SocialPlatform::Mastodon));
        let transcriber = Arc::new(MockTranscriber::new());
        let files = Arc::new(MemoryFileStore::new());

        let mut registry = HookRegistry::new();
        install_hooks(
            &mut registry,
            HookDependencies {
                store: Arc::clone(&store) as Arc<dyn ItemStore>,
                mailer: Some(Arc::clone(&mailer) as Arc<dyn programmierbar_core::Mailer>),
                publishers: vec![
                    Arc::clone(&bluesky) as Arc<dyn SocialPublisher>,
                    Arc::clone(&mastodon) as Arc<dyn SocialPublisher>,
                ],
                transcriber: Some(Arc::clone(&transcriber) as Arc<dyn Transcriber>),
                website_url: config.website.base_url().to_string(),
                heise_contact: config.email.heise_contact_address.clone(),
                token_ttl_days: config.speaker_portal.token_ttl_days,
            },
        );
        let items = ItemService::new(Arc::clone(&store) as Arc<dyn ItemStore>, Arc::new(registry));

        let authenticator: Arc<dyn Authenticator> = match &auth.admin_token {
            Some(token) if auth.method == AuthMethod::AdminToken => {
                Arc::new(AdminTokenAuthenticator::new(token.clone()))
            }
            _ => Arc::new(NoneAuthenticator::new()),
        };

        let state = Arc::new(programmierbar_server::state::AppState::new(
            config,
            authenticator,
            items,
            Some(Arc::clone(&mailer) as Arc<dyn programmierbar_core::Mailer>),
            Arc::clone(&files) as Arc<dyn programmierbar_core::FileStore>,
            Some(Arc::clone(&transcriber) as Arc<dyn Transcriber>),
        ));

        let router = programmierbar_server::api::create_router(state);

        Self {
            router,
            store,
            mailer,
            bluesky,
            mastodon,
            transcriber,
            files,
            temp_dir,
            auth_token: test_config
                .require_token
                .then(|| ADMIN_TOKEN.to_string()),
        }
    }

    /// Insert a record directly, bypassing hooks.
    pub fn seed(&self, collection: &str, item: Item) -> Item {
        self.store.insert(collection, item).expect("Failed to seed item")
    }

    /// Read a record directly from the store.
    pub fn stored(&self, collection: &str, id: &str) -> Item {
        self.store
            .get(collection, id)
            .expect("Failed to read item")
            .unwrap_or_else(|| panic!("{}/{} not found", collection, id))
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), None).await
    }

    /// Send a PATCH request with JSON body.
    pub async fn patch(&self, path: &str, body: Value) -> TestResponse {
        self.request("PATCH", path, Some(body), None).await
    }

    /// Send a request with an explicit Authorization header.
    pub async fn get_with_auth(&self, path: &str, authorization: &str) -> TestResponse {
        self.request("GET", path, None, Some(authorization)).await
    }

    /// Send a multipart form built with [`MultipartBody`].
    pub async fn post_multipart(&self, path: &str, body: MultipartBody) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", MultipartBody::BOUNDARY),
            )
            .body(Body::from(body.finish()))
            .unwrap();
        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        authorization: Option<&str>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let bearer = self.auth_token.as_ref().map(|t| format!("Bearer {}", t));
        if let Some(authorization) = authorization.map(str::to_string).or(bearer) {
            request_builder = request_builder.header("Authorization", authorization);
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Hand-built `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub const BOUNDARY: &'static str = "programmierbar-test-boundary";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                Self::BOUNDARY,
                name,
                value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                Self::BOUNDARY,
                name,
                filename,
                content_type
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(data);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.bytes
            .extend_from_slice(format!("--{}--\r\n", Self::BOUNDARY).as_bytes());
        self.bytes
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            $response.text
        );
    };
}
