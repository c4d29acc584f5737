//! Web layer for the receiver.
//!
//! Thin axum plumbing over the core modules:
//! - Registration and delivery endpoints write through the registry
//! - Read endpoints expose webhooks and their event history
//! - Rejection kinds all map to one client-error status class; the kind
//!   is distinguished only in the response body

pub mod handlers;

pub use handlers::{
    health, list_events, list_webhooks, receive_delivery, register_webhook, AppState,
    ErrorResponse, RegisterRequest, EVENT_TYPE_HEADER, SIGNATURE_HEADER, WEBHOOK_ID_HEADER,
};

use axum::{
    routing::{get, post},
    Router,
};

/// Build the application router with all routes attached.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/register", post(handlers::register_webhook))
        .route("/webhook", post(handlers::receive_delivery))
        .route("/webhooks", get(handlers::list_webhooks))
        .route("/webhooks/:webhook_id/events", get(handlers::list_events))
        .with_state(state)
}
