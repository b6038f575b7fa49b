//! Registration of the built-in hooks.

use std::sync::Arc;

use super::{HookEvent, HookRegistry};
use crate::content::{ContentApprovalHook, GENERATED_CONTENT};
use crate::items::ItemStore;
use crate::mail::Mailer;
use crate::slug::{SlugFilter, SLUG_COLLECTIONS};
use crate::social::{PodcastAnnouncementHook, SocialPostHook, SocialPublisher, SOCIAL_MEDIA_POSTS};
use crate::speaker_portal::PortalTokenFilter;
use crate::tickets::{OrderProcessor, TicketOrderHook};
use crate::transcription::{TranscriptHook, Transcriber, TRANSCRIPTS};

/// Services the built-in hooks depend on.
#[derive(Clone)]
pub struct HookDependencies {
    /// Raw store; hook write-backs must not emit events.
    pub store: Arc<dyn ItemStore>,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub publishers: Vec<Arc<dyn SocialPublisher>>,
    pub transcriber: Option<Arc<dyn Transcriber>>,
    /// Website base URL without trailing slash.
    pub website_url: String,
    pub heise_contact: Option<String>,
    pub token_ttl_days: i64,
}

/// Register every built-in hook.
///
/// Social announcements and transcripts are only wired when the matching
/// service is configured.
pub fn install_hooks(registry: &mut HookRegistry, deps: HookDependencies) {
    let slug = Arc::new(SlugFilter::new(deps.store.clone()));
    for collection in SLUG_COLLECTIONS {
        registry.register_filter(HookEvent::create(*collection), slug.clone());
        registry.register_filter(HookEvent::update(*collection), slug.clone());
    }

    registry.register_filter(
        HookEvent::create("speakers"),
        Arc::new(PortalTokenFilter::new(deps.token_ttl_days)),
    );

    registry.register_action(
        HookEvent::update(GENERATED_CONTENT),
        Arc::new(ContentApprovalHook::new(
            deps.store.clone(),
            deps.mailer.clone(),
            deps.heise_contact.clone(),
        )),
    );

    let processor = Arc::new(OrderProcessor::new(
        deps.store.clone(),
        deps.mailer.clone(),
        deps.website_url.clone(),
    ));
    registry.register_action(
        HookEvent::update("orders"),
        Arc::new(TicketOrderHook::new(processor)),
    );

    let social = Arc::new(SocialPostHook::new(deps.store.clone(), deps.publishers.clone()));
    registry.register_action(HookEvent::create(SOCIAL_MEDIA_POSTS), social.clone());
    registry.register_action(HookEvent::update(SOCIAL_MEDIA_POSTS), social);

    if !deps.publishers.is_empty() {
        let platforms = deps.publishers.iter().map(|p| p.platform()).collect();
        registry.register_action(
            HookEvent::update("podcasts"),
            Arc::new(PodcastAnnouncementHook::new(
                deps.store.clone(),
                platforms,
                deps.website_url.clone(),
            )),
        );
    }

    if let Some(transcriber) = deps.transcriber {
        registry.register_action(
            HookEvent::create(TRANSCRIPTS),
            Arc::new(TranscriptHook::new(deps.store, transcriber)),
        );
    }
}
