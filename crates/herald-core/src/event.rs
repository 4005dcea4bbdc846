//! Typed events pushed through client mailboxes.
//!
//! Every event on the wire is an [`Envelope`]: a `type` tag, a payload
//! whose shape is determined by that tag, and a timestamp. Consumers
//! discriminate on `type` to parse the payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message from one user to another (or to everyone).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub from: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Create a notification with a fresh id and the current time.
    pub fn new(from: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            from: from.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Payload of an `acknowledgment_request` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgmentRequestPayload {
    pub id: String,
    pub from_username: String,
    pub to_usernames: Vec<String>,
    pub message: String,
}

/// Payload of an `acknowledgment_response` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgmentResponsePayload {
    pub request_id: String,
    pub from_username: String,
}

/// The payload variants, discriminated by the `type` field on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EventPayload {
    Notification(Notification),
    UserConnected { username: String },
    UserDisconnected { username: String },
    AcknowledgmentRequest(AcknowledgmentRequestPayload),
    AcknowledgmentResponse(AcknowledgmentResponsePayload),
}

/// Outer wrapper for every event written to a mailbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub event: EventPayload,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    /// Wrap a payload with the current timestamp.
    pub fn new(event: EventPayload) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
        }
    }

    /// Serialize to the wire string enqueued onto mailboxes.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parse(envelope: &Envelope) -> Value {
        serde_json::from_str(&envelope.to_json().unwrap()).unwrap()
    }

    mod notification {
        use super::*;

        #[test]
        fn new_generates_unique_ids() {
            let a = Notification::new("alice", "hello");
            let b = Notification::new("alice", "hello");
            assert_ne!(a.id, b.id);
        }

        #[test]
        fn wire_field_names() {
            let envelope = Envelope::new(EventPayload::Notification(Notification::new(
                "alice", "hello",
            )));
            let json = parse(&envelope);

            assert_eq!(json["type"], "notification");
            assert_eq!(json["payload"]["from"], "alice");
            assert_eq!(json["payload"]["message"], "hello");
            assert!(json["payload"]["id"].is_string());
            assert!(json["payload"]["timestamp"].is_string());
        }
    }

    mod envelope {
        use super::*;

        #[test]
        fn has_type_payload_and_timestamp() {
            let envelope = Envelope::new(EventPayload::UserConnected {
                username: "bob".to_string(),
            });
            let json = parse(&envelope);

            assert_eq!(json["type"], "user_connected");
            assert_eq!(json["payload"]["username"], "bob");
            assert!(json["timestamp"].is_string());
        }

        #[test]
        fn type_tags_are_snake_case() {
            let cases = [
                (
                    EventPayload::UserConnected {
                        username: "u".to_string(),
                    },
                    "user_connected",
                ),
                (
                    EventPayload::UserDisconnected {
                        username: "u".to_string(),
                    },
                    "user_disconnected",
                ),
                (
                    EventPayload::AcknowledgmentRequest(AcknowledgmentRequestPayload {
                        id: "r1".to_string(),
                        from_username: "alice".to_string(),
                        to_usernames: vec!["bob".to_string()],
                        message: "ping".to_string(),
                    }),
                    "acknowledgment_request",
                ),
                (
                    EventPayload::AcknowledgmentResponse(AcknowledgmentResponsePayload {
                        request_id: "r1".to_string(),
                        from_username: "bob".to_string(),
                    }),
                    "acknowledgment_response",
                ),
            ];

            for (payload, tag) in cases {
                let json = parse(&Envelope::new(payload));
                assert_eq!(json["type"], tag);
            }
        }

        #[test]
        fn acknowledgment_request_wire_fields() {
            let envelope = Envelope::new(EventPayload::AcknowledgmentRequest(
                AcknowledgmentRequestPayload {
                    id: "r1".to_string(),
                    from_username: "alice".to_string(),
                    to_usernames: vec!["bob".to_string(), "carol".to_string()],
                    message: "ping".to_string(),
                },
            ));
            let json = parse(&envelope);

            assert_eq!(json["payload"]["id"], "r1");
            assert_eq!(json["payload"]["from_username"], "alice");
            assert_eq!(json["payload"]["to_usernames"][1], "carol");
            assert_eq!(json["payload"]["message"], "ping");
        }

        #[test]
        fn acknowledgment_response_wire_fields() {
            let envelope = Envelope::new(EventPayload::AcknowledgmentResponse(
                AcknowledgmentResponsePayload {
                    request_id: "r1".to_string(),
                    from_username: "bob".to_string(),
                },
            ));
            let json = parse(&envelope);

            assert_eq!(json["payload"]["request_id"], "r1");
            assert_eq!(json["payload"]["from_username"], "bob");
        }

        #[test]
        fn serialization_roundtrip() {
            let envelope = Envelope::new(EventPayload::Notification(Notification::new(
                "alice", "hello",
            )));
            let parsed: Envelope = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();

            match parsed.event {
                EventPayload::Notification(n) => {
                    assert_eq!(n.from, "alice");
                    assert_eq!(n.message, "hello");
                }
                other => panic!("expected notification, got {:?}", other),
            }
        }
    }
}
