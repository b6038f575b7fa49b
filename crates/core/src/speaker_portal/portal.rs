//! Token-gated speaker self-service.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::files::{storage_name, FileStore};
use super::submission::{ImageUpload, Submission};
use super::token::{parse_expiry, token_digest};
use super::PortalError;
use crate::hooks::{HookContext, ItemService};
use crate::items::{fields, Item, ItemQuery};
use crate::mail::{send_tracked, templates, Mailer};
use crate::metrics::PORTAL_SUBMISSIONS;

/// Speaker data shown to prefill the portal form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortalSpeaker {
    pub id: String,
    pub academic_title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub occupation: Option<String>,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub twitter_url: Option<String>,
    pub bluesky_url: Option<String>,
    pub mastodon_url: Option<String>,
    pub github_url: Option<String>,
    pub instagram_url: Option<String>,
    pub youtube_url: Option<String>,
    pub portal_token_expires: Option<String>,
}

impl PortalSpeaker {
    fn from_item(id: String, item: &Item) -> Self {
        let get = |field: &str| fields::text(item, field);
        Self {
            id,
            academic_title: get("academic_title"),
            first_name: get("first_name"),
            last_name: get("last_name"),
            occupation: get("occupation"),
            description: get("description"),
            website_url: get("website_url"),
            linkedin_url: get("linkedin_url"),
            twitter_url: get("twitter_url"),
            bluesky_url: get("bluesky_url"),
            mastodon_url: get("mastodon_url"),
            github_url: get("github_url"),
            instagram_url: get("instagram_url"),
            youtube_url: get("youtube_url"),
            portal_token_expires: get("portal_token_expires"),
        }
    }
}

/// Settings for [`SpeakerPortal`].
#[derive(Debug, Clone)]
pub struct PortalSettings {
    pub max_image_bytes: usize,
    /// Team address notified about submissions.
    pub notification_address: Option<String>,
}

pub struct SpeakerPortal {
    items: ItemService,
    files: Arc<dyn FileStore>,
    mailer: Option<Arc<dyn Mailer>>,
    settings: PortalSettings,
}

impl SpeakerPortal {
    pub fn new(
        items: ItemService,
        files: Arc<dyn FileStore>,
        mailer: Option<Arc<dyn Mailer>>,
        settings: PortalSettings,
    ) -> Self {
        Self {
            items,
            files,
            mailer,
            settings,
        }
    }

    /// Resolve a token to its speaker, rejecting unknown, expired and used tokens.
    pub fn validate(&self, token: &str) -> Result<PortalSpeaker, PortalError> {
        let (id, speaker) = self.locate(token)?;
        Ok(PortalSpeaker::from_item(id, &speaker))
    }

    /// Write the submitted data, store images and consume the token.
    pub async fn submit(
        &self,
        token: &str,
        submission: Submission,
        images: Vec<ImageUpload>,
    ) -> Result<PortalSpeaker, PortalError> {
        let result = self.try_submit(token, submission, images).await;
        let outcome = match &result {
            Ok(_) => "submitted",
            Err(e) => e.metric_label(),
        };
        PORTAL_SUBMISSIONS.with_label_values(&[outcome]).inc();
        result
    }

    async fn try_submit(
        &self,
        token: &str,
        submission: Submission,
        images: Vec<ImageUpload>,
    ) -> Result<PortalSpeaker, PortalError> {
        let (id, _) = self.locate(token)?;
        submission.validate()?;

        let mut seen = Vec::with_capacity(images.len());
        for image in &images {
            image.validate(self.settings.max_image_bytes)?;
            if seen.contains(&image.field.as_str()) {
                return Err(PortalError::Validation(format!(
                    "Bild {} wurde mehrfach hochgeladen",
                    image.field
                )));
            }
            seen.push(image.field.as_str());
        }

        let mut patch = submission.to_patch();
        for image in &images {
            let file_id = self.store_image(image).await?;
            patch.insert(image.field.clone(), Value::String(file_id));
        }

        patch.insert("portal_status".to_string(), json!("submitted"));
        patch.insert(
            "portal_submitted_at".to_string(),
            json!(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        patch.insert("portal_token".to_string(), Value::Null);
        patch.insert("portal_token_consumed".to_string(), json!(token_digest(token)));

        let updated = self
            .items
            .update_one("speakers", &id, patch, &HookContext::system())
            .await?;
        info!(speaker = %id, images = images.len(), "Speaker portal submission stored");

        let speaker = PortalSpeaker::from_item(id, &updated);
        self.notify_team(&speaker).await;
        Ok(speaker)
    }

    fn locate(&self, token: &str) -> Result<(String, Item), PortalError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(PortalError::NotFound);
        }

        let found = self
            .items
            .read_many("speakers", &ItemQuery::new().filter("portal_token", token).limit(1))?;
        let Some(speaker) = found.into_iter().next() else {
            let consumed = self.items.read_many(
                "speakers",
                &ItemQuery::new()
                    .filter("portal_token_consumed", token_digest(token))
                    .limit(1),
            )?;
            return Err(if consumed.is_empty() {
                PortalError::NotFound
            } else {
                PortalError::AlreadySubmitted
            });
        };

        if let Some(expires) = fields::text(&speaker, "portal_token_expires") {
            match parse_expiry(&expires) {
                Some(expires) if Utc::now() > expires => return Err(PortalError::Expired),
                Some(_) => {}
                None => warn!(expires = %expires, "Unparseable portal token expiry"),
            }
        }

        if matches!(
            fields::text(&speaker, "portal_status").as_deref(),
            Some("submitted") | Some("approved")
        ) {
            return Err(PortalError::AlreadySubmitted);
        }

        let id = fields::id(&speaker).ok_or(PortalError::NotFound)?;
        Ok((id, speaker))
    }

    /// Save the bytes and register a `files` item; returns the file id.
    async fn store_image(&self, image: &ImageUpload) -> Result<String, PortalError> {
        let file_id = uuid::Uuid::new_v4().to_string();
        let location = self
            .files
            .save(&storage_name(&file_id, &image.filename), &image.bytes)
            .await?;

        self.items.store().insert(
            "files",
            fields::object(json!({
                "id": file_id,
                "filename_download": image.filename,
                "type": image.content_type,
                "filesize": image.bytes.len(),
                "location": location,
            })),
        )?;
        Ok(file_id)
    }

    async fn notify_team(&self, speaker: &PortalSpeaker) {
        let (Some(mailer), Some(to)) = (&self.mailer, &self.settings.notification_address) else {
            return;
        };
        let name = format!(
            "{} {}",
            speaker.first_name.as_deref().unwrap_or_default(),
            speaker.last_name.as_deref().unwrap_or_default()
        );
        let message = templates::portal_submission(to, name.trim(), &speaker.id);
        if let Err(e) = send_tracked(mailer.as_ref(), &message).await {
            warn!(speaker = %speaker.id, "Failed to send portal notification: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{HookEvent, HookRegistry};
    use crate::items::{ItemStore, SqliteItemStore};
    use crate::speaker_portal::PortalTokenFilter;
    use crate::testing::{MemoryFileStore, MockMailer};

    struct Fixture {
        store: Arc<SqliteItemStore>,
        files: Arc<MemoryFileStore>,
        mailer: Arc<MockMailer>,
        portal: SpeakerPortal,
        items: ItemService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(SqliteItemStore::in_memory().unwrap());
        let mut hooks = HookRegistry::new();
        hooks.register_filter(
            HookEvent::create("speakers"),
            Arc::new(PortalTokenFilter::new(14)),
        );
        let items = ItemService::new(store.clone(), Arc::new(hooks));
        let files = Arc::new(MemoryFileStore::new());
        let mailer = Arc::new(MockMailer::new());
        let portal = SpeakerPortal::new(
            items.clone(),
            files.clone(),
            Some(mailer.clone() as Arc<dyn Mailer>),
            PortalSettings {
                max_image_bytes: 1024,
                notification_address: Some("team@programmier.bar".to_string()),
            },
        );
        Fixture {
            store,
            files,
            mailer,
            portal,
            items,
        }
    }

    async fn create_speaker(items: &ItemService) -> (String, String) {
        let created = items
            .create_one(
                "speakers",
                fields::object(json!({"first_name": "Eva", "last_name": "Beispiel"})),
                &HookContext::system(),
            )
            .await
            .unwrap();
        (
            fields::id(&created).unwrap(),
            fields::text(&created, "portal_token").unwrap(),
        )
    }

    fn submission() -> Submission {
        Submission {
            first_name: "Eva".to_string(),
            last_name: "Beispiel".to_string(),
            occupation: "Engineer".to_string(),
            description: "Spricht über Rust.".to_string(),
            github_url: Some("https://github.com/eva".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_validate_returns_prefill() {
        let f = fixture();
        let (id, token) = create_speaker(&f.items).await;

        let speaker = f.portal.validate(&token).unwrap();
        assert_eq!(speaker.id, id);
        assert_eq!(speaker.first_name.as_deref(), Some("Eva"));
        assert!(speaker.portal_token_expires.is_some());
    }

    #[tokio::test]
    async fn test_validate_unknown_token() {
        let f = fixture();
        assert!(matches!(f.portal.validate("nope"), Err(PortalError::NotFound)));
        assert!(matches!(f.portal.validate(""), Err(PortalError::NotFound)));
    }

    #[tokio::test]
    async fn test_validate_expired_token() {
        let f = fixture();
        let (id, token) = create_speaker(&f.items).await;
        f.store
            .update(
                "speakers",
                &id,
                &fields::object(json!({"portal_token_expires": "2020-01-01T00:00:00Z"})),
            )
            .unwrap();

        assert!(matches!(f.portal.validate(&token), Err(PortalError::Expired)));
        assert!(matches!(
            f.portal.submit(&token, submission(), vec![]).await,
            Err(PortalError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_submit_is_single_use() {
        let f = fixture();
        let (id, token) = create_speaker(&f.items).await;

        f.portal.submit(&token, submission(), vec![]).await.unwrap();

        let stored = f.store.get("speakers", &id).unwrap().unwrap();
        assert_eq!(stored["portal_status"], "submitted");
        assert_eq!(stored["portal_token"], Value::Null);
        assert_eq!(stored["occupation"], "Engineer");
        assert_eq!(stored["github_url"], "https://github.com/eva");
        assert!(stored.get("portal_submitted_at").is_some());

        assert!(matches!(
            f.portal.submit(&token, submission(), vec![]).await,
            Err(PortalError::AlreadySubmitted)
        ));
        assert!(matches!(
            f.portal.validate(&token),
            Err(PortalError::AlreadySubmitted)
        ));
    }

    #[tokio::test]
    async fn test_submit_rejects_submitted_status() {
        let f = fixture();
        let (id, token) = create_speaker(&f.items).await;
        f.store
            .update("speakers", &id, &fields::object(json!({"portal_status": "approved"})))
            .unwrap();

        assert!(matches!(
            f.portal.validate(&token),
            Err(PortalError::AlreadySubmitted)
        ));
    }

    #[tokio::test]
    async fn test_submit_validation_error_keeps_token() {
        let f = fixture();
        let (_id, token) = create_speaker(&f.items).await;
        let invalid = Submission {
            description: String::new(),
            ..submission()
        };

        assert!(matches!(
            f.portal.submit(&token, invalid, vec![]).await,
            Err(PortalError::Validation(_))
        ));
        assert!(f.portal.validate(&token).is_ok());
    }

    #[tokio::test]
    async fn test_submit_stores_images_and_notifies() {
        let f = fixture();
        let (id, token) = create_speaker(&f.items).await;
        let images = vec![ImageUpload {
            field: "profile_image".to_string(),
            filename: "eva.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }];

        f.portal.submit(&token, submission(), images).await.unwrap();

        let stored = f.store.get("speakers", &id).unwrap().unwrap();
        let file_id = stored["profile_image"].as_str().unwrap();
        let file = f.store.get("files", file_id).unwrap().unwrap();
        assert_eq!(file["type"], "image/png");
        assert_eq!(f.files.saved_names().await, vec![format!("{}.png", file_id)]);

        let sent = f.mailer.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].template, "portal_submission");
    }

    #[tokio::test]
    async fn test_submit_rejects_oversized_image() {
        let f = fixture();
        let (_id, token) = create_speaker(&f.items).await;
        let images = vec![ImageUpload {
            field: "action_image".to_string(),
            filename: "big.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0; 2048],
        }];

        assert!(matches!(
            f.portal.submit(&token, submission(), images).await,
            Err(PortalError::Validation(_))
        ));
        assert!(f.files.saved_names().await.is_empty());
    }
}
