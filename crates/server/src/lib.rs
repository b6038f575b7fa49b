//! HTTP server for the programmier.bar backend.
//!
//! Exposes the public website endpoints and the admin item API. The router
//! is built from an [`state::AppState`] so tests can drive it in-process.

pub mod api;
pub mod metrics;
pub mod state;
