//! Append-only interaction log
//!
//! The event log is the source of truth for profile aggregation. Every
//! recorded interaction is appended in memory and written through to durable
//! storage; storage failures are absorbed and the log keeps serving from
//! memory for the rest of the session.

use crate::storage::KeyValueStore;
use crate::types::Interaction;

/// Storage key the log persists under
pub const EVENT_LOG_KEY: &str = "readerpulse:events";

/// Append-only record of user interactions
pub struct EventLog {
    events: Vec<Interaction>,
    backend: Box<dyn KeyValueStore>,
}

impl EventLog {
    /// Open the log, rehydrating any persisted interactions.
    ///
    /// Malformed or missing persisted state is treated as an empty log.
    pub fn open(backend: Box<dyn KeyValueStore>) -> Self {
        let events = match backend.get(EVENT_LOG_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(events) => events,
                Err(e) => {
                    log::warn!("Malformed persisted event log: {}; rebuilding empty", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Could not read persisted event log: {}", e);
                Vec::new()
            }
        };
        Self { events, backend }
    }

    /// Append one interaction and write the log through to storage
    pub fn record(&mut self, interaction: Interaction) {
        self.events.push(interaction);
        self.persist();
    }

    /// All recorded interactions, oldest first
    pub fn interactions(&self) -> &[Interaction] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop all recorded interactions, in memory and in storage
    pub fn clear(&mut self) {
        self.events.clear();
        if let Err(e) = self.backend.delete(EVENT_LOG_KEY) {
            log::error!("Failed to clear persisted event log: {}", e);
        }
    }

    fn persist(&mut self) {
        let raw = match serde_json::to_string(&self.events) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Failed to serialize event log: {}", e);
                return;
            }
        };
        if let Err(e) = self.backend.put(EVENT_LOG_KEY, &raw) {
            log::error!("Failed to persist event log: {}", e);
        }
    }
}
