//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Hooks (failures per hook)
//! - Ticket issuance
//! - Outgoing mail, social posts and transcriptions
//! - Speaker portal submissions

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

// =============================================================================
// Hooks
// =============================================================================

/// Hook failures by hook name.
pub static HOOK_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("programmierbar_hook_failures_total", "Total failed hook invocations"),
        &["hook"],
    )
    .unwrap()
});

// =============================================================================
// Tickets
// =============================================================================

/// Tickets issued for paid orders.
pub static TICKETS_ISSUED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("programmierbar_tickets_issued_total", "Total tickets issued").unwrap()
});

/// Ticket codes that needed the timestamp fallback.
pub static TICKET_CODE_FALLBACKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "programmierbar_ticket_code_fallbacks_total",
        "Ticket codes generated with the timestamp fallback",
    )
    .unwrap()
});

/// Orders processed by result.
pub static ORDERS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("programmierbar_orders_processed_total", "Paid orders processed"),
        &["result"], // "issued", "skipped", "failed"
    )
    .unwrap()
});

// =============================================================================
// External services
// =============================================================================

/// Emails sent by template and result.
pub static EMAILS_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("programmierbar_emails_total", "Outgoing emails"),
        &["template", "result"],
    )
    .unwrap()
});

/// Social media posts by platform and result.
pub static SOCIAL_POSTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("programmierbar_social_posts_total", "Social media posts"),
        &["platform", "result"],
    )
    .unwrap()
});

/// Transcription API calls by operation and result.
pub static TRANSCRIPTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("programmierbar_transcriptions_total", "Transcription API calls"),
        &["operation", "result"],
    )
    .unwrap()
});

// =============================================================================
// Speaker portal
// =============================================================================

/// Speaker portal submissions by result.
pub static PORTAL_SUBMISSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "programmierbar_portal_submissions_total",
            "Speaker portal submissions",
        ),
        &["result"],
    )
    .unwrap()
});

/// Register all core metrics with a registry.
pub fn register_core_metrics(registry: &Registry) {
    registry.register(Box::new(HOOK_FAILURES.clone())).ok();
    registry.register(Box::new(TICKETS_ISSUED.clone())).ok();
    registry.register(Box::new(TICKET_CODE_FALLBACKS.clone())).ok();
    registry.register(Box::new(ORDERS_PROCESSED.clone())).ok();
    registry.register(Box::new(EMAILS_SENT.clone())).ok();
    registry.register(Box::new(SOCIAL_POSTS.clone())).ok();
    registry.register(Box::new(TRANSCRIPTIONS.clone())).ok();
    registry.register(Box::new(PORTAL_SUBMISSIONS.clone())).ok();
}
