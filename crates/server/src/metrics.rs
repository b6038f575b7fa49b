//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the programmier.bar backend:
//! - HTTP request metrics (latency, counts, errors)
//! - Workflow state gauges (collected from the item store on scrape)
//! - Core hook and external service counters (registered from the core crate)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;

use programmierbar_core::ItemQuery;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "programmierbar_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("programmierbar_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "programmierbar_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "programmierbar_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Workflow Metrics (collected dynamically)
// =============================================================================

/// Hooks registered at startup.
pub static HOOKS_REGISTERED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("programmierbar_hooks_registered", "Number of registered hooks").unwrap()
});

/// Speakers by portal status.
pub static SPEAKERS_BY_PORTAL_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "programmierbar_speakers_by_portal_status",
            "Current speaker count by portal status",
        ),
        &["status"],
    )
    .unwrap()
});

/// Social media posts by status.
pub static SOCIAL_POSTS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "programmierbar_social_posts_by_status",
            "Current social media post count by status",
        ),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // Workflow
    registry
        .register(Box::new(HOOKS_REGISTERED.clone()))
        .unwrap();
    registry
        .register(Box::new(SPEAKERS_BY_PORTAL_STATUS.clone()))
        .unwrap();
    registry
        .register(Box::new(SOCIAL_POSTS_BY_STATUS.clone()))
        .unwrap();

    // Core metrics (hooks, tickets, mail, social, transcription, portal)
    programmierbar_core::metrics::register_core_metrics(registry);
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the gauges reflect the item store.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let store = state.store();

    for status in ["pending", "submitted", "approved"] {
        let query = ItemQuery::new().filter("portal_status", status);
        if let Ok(items) = store.find("speakers", &query) {
            SPEAKERS_BY_PORTAL_STATUS
                .with_label_values(&[status])
                .set(items.len() as i64);
        }
    }

    for status in ["draft", "scheduled", "published", "failed"] {
        let query = ItemQuery::new().filter("status", status);
        if let Ok(items) = store.find("social_media_posts", &query) {
            SOCIAL_POSTS_BY_STATUS
                .with_label_values(&[status])
                .set(items.len() as i64);
        }
    }
}

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});
static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());
static CONFERENCE_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/ticket/conference/[^/]+$").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    if CONFERENCE_IDENTIFIER.is_match(path) {
        return "/ticket/conference/{identifier}".to_string();
    }
    let result = UUID_SEGMENT.replace_all(path, "{id}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/items/speakers/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/items/speakers/{id}");
    }

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/transcripts/12345/sync";
        assert_eq!(normalize_path(path), "/api/v1/transcripts/{id}/sync");
    }

    #[test]
    fn test_normalize_path_conference_slug() {
        assert_eq!(
            normalize_path("/ticket/conference/rust-konferenz-2025"),
            "/ticket/conference/{identifier}"
        );
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/email"), "/api/email");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("programmierbar_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        HOOKS_REGISTERED.set(3);
        programmierbar_core::metrics::HOOK_FAILURES
            .with_label_values(&["slug"])
            .inc_by(0);

        let output = encode_metrics();
        assert!(output.contains("programmierbar_hooks_registered"));
        assert!(output.contains("programmierbar_hook_failures_total"));
    }
}
