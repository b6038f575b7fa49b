use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{handlers, items, speaker_portal, website};
use crate::state::AppState;

/// Multipart overhead allowed on top of the image payload.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit =
        state.config().speaker_portal.max_image_bytes * 2 + FORM_OVERHEAD_BYTES;

    // Public website endpoints
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        .route("/ticket/conference/{identifier}", get(website::get_conference))
        .route("/api/email", post(website::send_contact))
        .route("/api/voting", post(website::voting))
        .route("/api/speaker-portal/validate", get(speaker_portal::validate))
        .route(
            "/api/speaker-portal/submit",
            post(speaker_portal::submit).layer(DefaultBodyLimit::max(upload_limit)),
        );

    let mut router = public_routes;

    if state.admin_api_enabled() {
        // Admin item API, drives the hooks
        let admin_routes = Router::new()
            .route(
                "/items/{collection}",
                get(items::list_items).post(items::create_item),
            )
            .route(
                "/items/{collection}/{id}",
                get(items::get_item).patch(items::update_item),
            )
            .route("/transcripts/{id}/sync", post(items::sync_transcript))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ));
        router = router.nest("/api/v1", admin_routes);
    } else {
        warn!("No admin token configured, admin item API is disabled");
    }

    router
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
