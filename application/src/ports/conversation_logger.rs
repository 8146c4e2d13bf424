//! Port for structured conversation logging.
//!
//! Records each orchestration step (primary answers, critiques, key
//! rotations, refinements) as a machine-readable event. This is separate
//! from `tracing` diagnostics: tracing carries operator-facing messages,
//! this port carries the transcript.

use serde_json::Value;

/// A structured conversation event.
///
/// The adapter stamps each event with a UTC timestamp when it is written.
#[derive(Debug, Clone)]
pub struct ConversationEvent {
    /// Event type identifier (e.g. "primary_response", "key_rotated").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Sink for conversation events.
///
/// `log` is synchronous and infallible; adapters swallow write failures.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op logger used when no transcript file is configured.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
