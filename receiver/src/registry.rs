//! In-memory webhook registry.
//!
//! The registry owns the mapping from webhook identifier to its shared
//! secret and accumulated event log. It is created once at startup and
//! lives for the process lifetime; nothing is persisted.
//!
//! ## Locking
//!
//! Two levels: a `RwLock` over the id map for registration and lookup, and
//! a `Mutex` per entry guarding its event log. Admissions to different
//! webhook ids never contend with each other; admissions to the same id
//! serialize their appends. Neither lock is held across an await point, so
//! the std locks are sufficient.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Registry operation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Registration with an empty id or secret.
    #[error("webhook id and secret must be non-empty")]
    InvalidArgument,

    /// Operation referenced an id that was never registered.
    #[error("unknown webhook id: {0}")]
    NotFound(String),
}

/// One admitted delivery, as recorded in a webhook's event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    /// Capture time at admission (not sender-supplied).
    pub timestamp: DateTime<Utc>,
    /// Free-form label from the delivery's event-type header.
    pub event_type: String,
    /// The delivery body, preserved verbatim.
    pub payload: Value,
}

/// Public view of a registered webhook. Never carries the secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSummary {
    pub webhook_id: String,
    pub event_count: usize,
}

struct Entry {
    secret: String,
    /// Registration sequence number, used only to order `list()`.
    seq: u64,
    events: Mutex<Vec<StoredEvent>>,
}

/// Mapping from webhook id to secret and event log.
///
/// Entries are created only by [`register`](Registry::register), mutated
/// only by [`append_event`](Registry::append_event), and never deleted.
pub struct Registry {
    entries: RwLock<HashMap<String, Arc<Entry>>>,
    next_seq: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Register a webhook id with its shared secret.
    ///
    /// Re-registering an existing id replaces the entry wholesale: the
    /// secret is overwritten and the event log starts empty again.
    pub fn register(&self, id: &str, secret: &str) -> Result<(), RegistryError> {
        if id.is_empty() || secret.is_empty() {
            return Err(RegistryError::InvalidArgument);
        }

        let entry = Arc::new(Entry {
            secret: secret.to_string(),
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            events: Mutex::new(Vec::new()),
        });

        let mut entries = self.entries.write().expect("registry map lock poisoned");
        entries.insert(id.to_string(), entry);
        Ok(())
    }

    /// Look up a registered webhook without exposing its secret.
    pub fn lookup(&self, id: &str) -> Option<WebhookSummary> {
        let entries = self.entries.read().expect("registry map lock poisoned");
        entries.get(id).map(|entry| WebhookSummary {
            webhook_id: id.to_string(),
            event_count: entry.events.lock().expect("event log lock poisoned").len(),
        })
    }

    /// The shared secret for an id. Crate-internal: only the delivery
    /// admitter may see secrets.
    pub(crate) fn secret_of(&self, id: &str) -> Option<String> {
        let entries = self.entries.read().expect("registry map lock poisoned");
        entries.get(id).map(|entry| entry.secret.clone())
    }

    /// Append an admitted delivery to a webhook's event log.
    ///
    /// The capture timestamp is taken while holding the entry's log lock,
    /// so timestamps are non-decreasing in log order even under concurrent
    /// admissions to the same id.
    pub fn append_event(
        &self,
        id: &str,
        event_type: &str,
        payload: Value,
    ) -> Result<StoredEvent, RegistryError> {
        let entry = {
            let entries = self.entries.read().expect("registry map lock poisoned");
            entries
                .get(id)
                .cloned()
                .ok_or_else(|| RegistryError::NotFound(id.to_string()))?
        };

        let mut events = entry.events.lock().expect("event log lock poisoned");
        let event = StoredEvent {
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            payload,
        };
        events.push(event.clone());
        Ok(event)
    }

    /// Snapshot of all registered webhooks with their current event counts,
    /// in registration order.
    pub fn list(&self) -> Vec<WebhookSummary> {
        let entries = self.entries.read().expect("registry map lock poisoned");
        let mut items: Vec<(u64, WebhookSummary)> = entries
            .iter()
            .map(|(id, entry)| {
                let summary = WebhookSummary {
                    webhook_id: id.clone(),
                    event_count: entry.events.lock().expect("event log lock poisoned").len(),
                };
                (entry.seq, summary)
            })
            .collect();
        items.sort_by_key(|(seq, _)| *seq);
        items.into_iter().map(|(_, summary)| summary).collect()
    }

    /// Snapshot of a webhook's event log in admission order, or `None` for
    /// an unregistered id.
    pub fn events_of(&self, id: &str) -> Option<Vec<StoredEvent>> {
        let entry = {
            let entries = self.entries.read().expect("registry map lock poisoned");
            entries.get(id).cloned()
        }?;
        let events = entry.events.lock().expect("event log lock poisoned");
        Some(events.clone())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
