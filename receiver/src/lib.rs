//! Hooksink - a signed webhook receiver.
//!
//! External senders register a shared secret under a webhook identifier,
//! then deliver signed event payloads to a single inbound endpoint. Each
//! delivery's HMAC-SHA256 signature is recomputed over the canonical
//! payload encoding and compared in constant time before the event is
//! recorded in that webhook's history.
//!
//! ## Architecture
//!
//! ```text
//! POST /register ──→ Registry ←── read endpoints (/webhooks, .../events)
//!                       ↑
//! POST /webhook ──→ Verifier (presence checks → lookup → HMAC → admit)
//! ```
//!
//! ## Canonical payload encoding
//!
//! Signatures are computed over `serde_json`'s compact serialization of
//! the parsed payload (no whitespace, object keys sorted). Senders must
//! serialize the same way before signing; see [`signature`].

pub mod admit;
pub mod config;
pub mod registry;
pub mod signature;
pub mod web;

// Re-export commonly used types
pub use admit::{admit, Delivery, Rejection};
pub use config::Config;
pub use registry::{Registry, RegistryError, StoredEvent, WebhookSummary};
pub use signature::expected_signature;
pub use web::AppState;
