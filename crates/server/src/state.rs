use std::sync::Arc;

use programmierbar_core::{
    AuthMethod, Authenticator, Config, FileStore, ItemService, ItemStore, Mailer, PortalSettings,
    SanitizedConfig, SpeakerPortal, Transcriber, TranscriptSync,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    items: ItemService,
    mailer: Option<Arc<dyn Mailer>>,
    portal: SpeakerPortal,
    transcript_sync: Option<TranscriptSync>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        items: ItemService,
        mailer: Option<Arc<dyn Mailer>>,
        files: Arc<dyn FileStore>,
        transcriber: Option<Arc<dyn Transcriber>>,
    ) -> Self {
        let portal = SpeakerPortal::new(
            items.clone(),
            files,
            mailer.clone(),
            PortalSettings {
                max_image_bytes: config.speaker_portal.max_image_bytes,
                notification_address: config.speaker_portal.notification_address.clone(),
            },
        );
        let transcript_sync =
            transcriber.map(|t| TranscriptSync::new(Arc::clone(items.store()), t));

        Self {
            config,
            authenticator,
            items,
            mailer,
            portal,
            transcript_sync,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    /// Whether the admin item API is mounted.
    pub fn admin_api_enabled(&self) -> bool {
        match self.config.auth.method {
            AuthMethod::None => true,
            AuthMethod::AdminToken => self.config.auth.admin_token.is_some(),
        }
    }

    pub fn items(&self) -> &ItemService {
        &self.items
    }

    pub fn store(&self) -> &dyn ItemStore {
        self.items.store().as_ref()
    }

    pub fn mailer(&self) -> Option<&dyn Mailer> {
        self.mailer.as_deref()
    }

    pub fn portal(&self) -> &SpeakerPortal {
        &self.portal
    }

    pub fn transcript_sync(&self) -> Option<&TranscriptSync> {
        self.transcript_sync.as_ref()
    }
}
