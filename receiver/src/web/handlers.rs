//! Endpoint handlers.
//!
//! Handlers stay thin: pull the transport metadata out of the request,
//! call into the core, and map the outcome onto a JSON response. Status
//! code policy lives here, not in the core.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::admit::{admit, Delivery, Rejection};
use crate::registry::{Registry, StoredEvent, WebhookSummary};

/// Header carrying the lowercase hex HMAC-SHA256 signature of the
/// canonical payload encoding.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Header naming the registered webhook the delivery targets.
pub const WEBHOOK_ID_HEADER: &str = "x-webhook-id";

/// Header carrying the free-form event type label.
pub const EVENT_TYPE_HEADER: &str = "x-event-type";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

impl AppState {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

/// Error response body, shared by every failure path.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        // One client-error status for every rejection kind; the kind is
        // only distinguished in the body.
        let body = Json(ErrorResponse {
            status: "error",
            message: self.to_string(),
            error: Some(self.code()),
        });
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Registration
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub webhook_id: String,
    #[serde(default)]
    pub secret: String,
}

/// Registration success body.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub status: &'static str,
    pub message: String,
    pub webhook_id: String,
}

/// Register (or replace) a webhook id with its shared secret.
pub async fn register_webhook(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Response {
    match state.registry.register(&request.webhook_id, &request.secret) {
        Ok(()) => {
            info!(webhook_id = %request.webhook_id, "webhook_registered");
            (
                StatusCode::OK,
                Json(RegisterResponse {
                    status: "success",
                    message: format!("webhook {} registered", request.webhook_id),
                    webhook_id: request.webhook_id,
                }),
            )
                .into_response()
        }
        Err(e) => {
            warn!(error = %e, "webhook_registration_rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    status: "error",
                    message: e.to_string(),
                    error: None,
                }),
            )
                .into_response()
        }
    }
}

// =============================================================================
// Delivery
// =============================================================================

/// Delivery success body.
#[derive(Serialize)]
pub struct DeliveryResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// The single inbound delivery endpoint.
///
/// The payload is the JSON body; the signature, webhook id, and event type
/// arrive as request headers.
pub async fn receive_delivery(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Response {
    let delivery = Delivery {
        signature: header_value(&headers, SIGNATURE_HEADER),
        webhook_id: header_value(&headers, WEBHOOK_ID_HEADER),
        event_type: header_value(&headers, EVENT_TYPE_HEADER),
        payload,
    };
    let webhook_id = delivery.webhook_id.clone().unwrap_or_default();

    match admit(&state.registry, delivery) {
        Ok(event) => {
            info!(
                webhook_id = %webhook_id,
                event_type = %event.event_type,
                "delivery_admitted"
            );
            (
                StatusCode::OK,
                Json(DeliveryResponse {
                    status: "success",
                    message: "event admitted",
                }),
            )
                .into_response()
        }
        Err(rejection) => {
            warn!(
                webhook_id = %webhook_id,
                error = rejection.code(),
                "delivery_rejected"
            );
            rejection.into_response()
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

// =============================================================================
// Read Endpoints
// =============================================================================

/// Listing body: id + event count pairs, never secrets.
#[derive(Serialize)]
pub struct WebhookListResponse {
    pub webhooks: Vec<WebhookSummary>,
    pub count: usize,
}

/// List all registered webhooks.
pub async fn list_webhooks(State(state): State<AppState>) -> Json<WebhookListResponse> {
    let webhooks = state.registry.list();
    let count = webhooks.len();
    Json(WebhookListResponse { webhooks, count })
}

/// Event history body for one webhook.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    pub webhook_id: String,
    pub events: Vec<StoredEvent>,
    pub count: usize,
}

/// List one webhook's admitted events in admission order.
pub async fn list_events(
    State(state): State<AppState>,
    Path(webhook_id): Path<String>,
) -> Response {
    match state.registry.events_of(&webhook_id) {
        Some(events) => {
            let count = events.len();
            Json(EventListResponse {
                webhook_id,
                events,
                count,
            })
            .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                status: "error",
                message: format!("unknown webhook id: {webhook_id}"),
                error: None,
            }),
        )
            .into_response(),
    }
}
