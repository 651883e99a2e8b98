use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Push message kinds that trigger a full refresh cycle.
pub const REFRESH_KINDS: [&str; 2] = ["hardware", "prediction_block"];

/// A decoded push message. Every message carries at least a `type`
/// discriminator; the rest of the body depends on the kind and is kept
/// opaque.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct UpdateMessage {
    /// Message discriminator (`hardware`, `prediction_block`, `keepalive`,
    /// `manual_stage`, `stage_state`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Remaining payload.
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl UpdateMessage {
    /// Whether this message kind requests new data.
    #[must_use]
    pub fn triggers_refresh(&self) -> bool {
        REFRESH_KINDS.contains(&self.kind.as_str())
    }
}

/// One event received over the push subscription.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// A decoded push message.
    Update(UpdateMessage),
    /// Raw text retained when the body was not decodable as a message.
    Raw(String),
}

impl StreamEvent {
    /// Decode one SSE data payload, falling back to a raw-text record.
    #[must_use]
    pub fn decode(data: &str) -> Self {
        serde_json::from_str::<UpdateMessage>(data)
            .map_or_else(|_| Self::Raw(data.to_string()), Self::Update)
    }

    /// Whether the event requests new data. Raw records never do.
    #[must_use]
    pub fn triggers_refresh(&self) -> bool {
        matches!(self, Self::Update(message) if message.triggers_refresh())
    }
}

/// Receiving half of a push subscription. The sender side is owned by the
/// adapter's connection task; channel closure means the connection dropped.
pub type UpdateStream = tokio::sync::mpsc::Receiver<StreamEvent>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_kinds_trigger_refresh() {
        assert!(StreamEvent::decode(r#"{"type":"hardware","node":"node0"}"#).triggers_refresh());
        assert!(StreamEvent::decode(r#"{"type":"prediction_block","block":[]}"#)
            .triggers_refresh());
    }

    #[test]
    fn other_kinds_are_ignored() {
        assert!(!StreamEvent::decode(r#"{"type":"keepalive","ts":"t"}"#).triggers_refresh());
        assert!(!StreamEvent::decode(r#"{"type":"manual_stage","payload":{}}"#)
            .triggers_refresh());
    }

    #[test]
    fn malformed_bodies_become_raw_records() {
        let event = StreamEvent::decode("not json at all");
        assert_eq!(event, StreamEvent::Raw("not json at all".to_string()));
        assert!(!event.triggers_refresh());

        // Valid JSON without the discriminator is just as undecodable.
        assert!(matches!(
            StreamEvent::decode(r#"{"node":"node0"}"#),
            StreamEvent::Raw(_)
        ));
    }
}
