//! Delivery verification and admission.
//!
//! Each inbound delivery runs a short state machine: presence checks on the
//! transport metadata, registry lookup, signature recomputation, constant-
//! time comparison, and finally the append into the webhook's event log.
//! Every failure is a typed rejection returned to the caller; nothing here
//! panics or tears the process down.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::registry::{Registry, StoredEvent};
use crate::signature;

/// One inbound delivery: the payload plus the out-of-band metadata the
/// transport layer pulled from headers. Absent headers arrive as `None`.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub signature: Option<String>,
    pub webhook_id: Option<String>,
    pub event_type: Option<String>,
    pub payload: Value,
}

/// Why a delivery was not admitted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("missing signature header")]
    MissingSignature,

    #[error("missing webhook id header")]
    MissingWebhookId,

    #[error("unknown webhook id: {0}")]
    UnknownWebhook(String),

    #[error("signature does not match payload")]
    InvalidSignature,
}

impl Rejection {
    /// Stable machine-readable code for the wire `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingSignature => "missing_signature",
            Self::MissingWebhookId => "missing_webhook_id",
            Self::UnknownWebhook(_) => "unknown_webhook",
            Self::InvalidSignature => "invalid_signature",
        }
    }
}

/// Verify a delivery and, on success, record it in the registry.
///
/// Rejections never mutate the registry. An empty header value is treated
/// the same as an absent one, and both presence checks run before any
/// cryptographic work.
pub fn admit(registry: &Registry, delivery: Delivery) -> Result<StoredEvent, Rejection> {
    let supplied = match delivery.signature.as_deref() {
        Some(s) if !s.is_empty() => s,
        _ => return Err(Rejection::MissingSignature),
    };
    let webhook_id = match delivery.webhook_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => return Err(Rejection::MissingWebhookId),
    };

    let secret = registry
        .secret_of(webhook_id)
        .ok_or_else(|| Rejection::UnknownWebhook(webhook_id.to_string()))?;

    if !signature::verify_signature(&secret, &delivery.payload, supplied) {
        warn!(
            webhook_id = %webhook_id,
            supplied_length = supplied.len(),
            "delivery_signature_mismatch"
        );
        return Err(Rejection::InvalidSignature);
    }

    let event_type = delivery.event_type.unwrap_or_default();
    let event = registry
        .append_event(webhook_id, &event_type, delivery.payload)
        .map_err(|_| Rejection::UnknownWebhook(webhook_id.to_string()))?;

    debug!(webhook_id = %webhook_id, event_type = %event.event_type, "delivery_admitted");
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::expected_signature;
    use serde_json::json;

    fn signed_delivery(secret: &str, webhook_id: &str, event_type: &str, payload: Value) -> Delivery {
        Delivery {
            signature: Some(expected_signature(secret, &payload)),
            webhook_id: Some(webhook_id.to_string()),
            event_type: Some(event_type.to_string()),
            payload,
        }
    }

    #[test]
    fn test_admit_round_trip() {
        let registry = Registry::new();
        registry.register("whk_1", "s3cr3t").unwrap();

        let event = admit(
            &registry,
            signed_delivery("s3cr3t", "whk_1", "order.created", json!({"amount": 100})),
        )
        .unwrap();

        assert_eq!(event.event_type, "order.created");
        assert_eq!(event.payload, json!({"amount": 100}));

        let events = registry.events_of("whk_1").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload, json!({"amount": 100}));
    }

    #[test]
    fn test_admit_rejects_tampered_payload() {
        let registry = Registry::new();
        registry.register("whk_1", "s3cr3t").unwrap();

        let mut delivery =
            signed_delivery("s3cr3t", "whk_1", "order.created", json!({"amount": 100}));
        delivery.payload = json!({"amount": 999});

        assert_eq!(admit(&registry, delivery), Err(Rejection::InvalidSignature));
        assert_eq!(registry.events_of("whk_1").unwrap().len(), 0);
    }

    #[test]
    fn test_admit_rejects_wrong_secret() {
        let registry = Registry::new();
        registry.register("whk_1", "secret-b").unwrap();

        let delivery =
            signed_delivery("secret-a", "whk_1", "order.created", json!({"amount": 100}));
        assert_eq!(admit(&registry, delivery), Err(Rejection::InvalidSignature));
    }

    #[test]
    fn test_admit_rejects_unknown_webhook() {
        let registry = Registry::new();

        let delivery =
            signed_delivery("s3cr3t", "whk_missing", "order.created", json!({"amount": 100}));
        assert_eq!(
            admit(&registry, delivery),
            Err(Rejection::UnknownWebhook("whk_missing".to_string()))
        );
    }

    #[test]
    fn test_admit_rejects_missing_metadata() {
        let registry = Registry::new();
        registry.register("whk_1", "s3cr3t").unwrap();

        let no_signature = Delivery {
            signature: None,
            webhook_id: Some("whk_1".to_string()),
            event_type: None,
            payload: json!({}),
        };
        assert_eq!(admit(&registry, no_signature), Err(Rejection::MissingSignature));

        let empty_signature = Delivery {
            signature: Some(String::new()),
            webhook_id: Some("whk_1".to_string()),
            event_type: None,
            payload: json!({}),
        };
        assert_eq!(admit(&registry, empty_signature), Err(Rejection::MissingSignature));

        let no_id = Delivery {
            signature: Some("deadbeef".to_string()),
            webhook_id: None,
            event_type: None,
            payload: json!({}),
        };
        assert_eq!(admit(&registry, no_id), Err(Rejection::MissingWebhookId));
    }

    #[test]
    fn test_admit_checks_presence_before_lookup() {
        // Missing signature wins even when the webhook id is also absent
        // and the registry is empty.
        let registry = Registry::new();
        let delivery = Delivery {
            signature: None,
            webhook_id: None,
            event_type: None,
            payload: json!({}),
        };
        assert_eq!(admit(&registry, delivery), Err(Rejection::MissingSignature));
    }

    #[test]
    fn test_rejected_delivery_leaves_log_untouched() {
        // The concrete scenario: one admitted event, then a garbage
        // signature over the same payload. The log must still hold exactly
        // the first event.
        let registry = Registry::new();
        registry.register("whk_1", "s3cr3t").unwrap();

        admit(
            &registry,
            signed_delivery("s3cr3t", "whk_1", "order.created", json!({"amount": 100})),
        )
        .unwrap();

        let forged = Delivery {
            signature: Some("deadbeef".to_string()),
            webhook_id: Some("whk_1".to_string()),
            event_type: Some("order.created".to_string()),
            payload: json!({"amount": 100}),
        };
        assert_eq!(admit(&registry, forged), Err(Rejection::InvalidSignature));

        let events = registry.events_of("whk_1").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload, json!({"amount": 100}));
    }

    #[test]
    fn test_admitted_events_preserve_order() {
        let registry = Registry::new();
        registry.register("whk_1", "s3cr3t").unwrap();

        for n in 0..5 {
            admit(
                &registry,
                signed_delivery("s3cr3t", "whk_1", &format!("step.{n}"), json!({"n": n})),
            )
            .unwrap();
        }

        let events = registry.events_of("whk_1").unwrap();
        let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, ["step.0", "step.1", "step.2", "step.3", "step.4"]);
    }

    #[test]
    fn test_missing_event_type_defaults_to_empty() {
        let registry = Registry::new();
        registry.register("whk_1", "s3cr3t").unwrap();

        let payload = json!({"ping": true});
        let delivery = Delivery {
            signature: Some(expected_signature("s3cr3t", &payload)),
            webhook_id: Some("whk_1".to_string()),
            event_type: None,
            payload,
        };

        let event = admit(&registry, delivery).unwrap();
        assert_eq!(event.event_type, "");
    }
}
