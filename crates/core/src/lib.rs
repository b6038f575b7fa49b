pub mod auth;
pub mod config;
pub mod content;
pub mod hooks;
pub mod items;
pub mod mail;
pub mod metrics;
pub mod slug;
pub mod social;
pub mod speaker_portal;
pub mod testing;
pub mod tickets;
pub mod transcription;
pub mod website;

pub use auth::{
    create_authenticator, AdminTokenAuthenticator, AuthError, AuthRequest, Authenticator,
    Identity, NoneAuthenticator,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use content::{ContentApprovalHook, ContentStatus, ContentType, PublishingStatus};
pub use hooks::{
    install_hooks, Accountability, ActionHook, FilterHook, HookContext, HookDependencies,
    HookError, HookEvent, HookMeta, HookRegistry, ItemAction, ItemService, ItemServiceError,
};
pub use items::{Item, ItemQuery, ItemStore, SortOrder, SqliteItemStore, StoreError};
pub use mail::{create_mailer, EmailMessage, MailError, Mailer};
pub use slug::{slugify, SlugFilter};
pub use social::{
    create_publishers, PublishError, PublishedPost, SocialPlatform, SocialPost, SocialPublisher,
};
pub use speaker_portal::{
    FileStore, ImageUpload, LocalFileStore, PortalError, PortalSettings, PortalSpeaker,
    SpeakerPortal, Submission,
};
pub use tickets::{OrderError, OrderProcessor, OrderSummary, Ticket};
pub use transcription::{
    create_transcriber, SyncOutcome, Transcriber, TranscriptSync, TranscriptionError,
};
pub use website::{find_conference, submit_contact, ContactError, ContactForm, ContactOutcome};
