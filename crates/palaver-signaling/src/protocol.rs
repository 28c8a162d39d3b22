//! Wire protocol for the signaling relay.
//!
//! Events travel as JSON text frames tagged by an `event` name with a `data`
//! payload, mirroring the event vocabulary the browser clients speak:
//! `register`, `call`, `answer`, `ice-candidate`, `end-call` inbound and the
//! same call events plus `user-status` outbound.
//!
//! The relay never inspects negotiation content: `offer`, `answer` and
//! `candidate` are carried as raw [`serde_json::Value`] and forwarded
//! verbatim, missing fields included (an absent inbound field deserializes to
//! `null` and propagates as such).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::types::UserId;

/// Events received from clients.
///
/// Identity-bearing fields (`userId`, `to`) stay as raw JSON here; the relay
/// coerces them to [`UserId`] at the registry boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Bind a user identity to this connection.
    Register {
        #[serde(default, rename = "userId")]
        user_id: Value,
    },
    /// Start a call: SDP offer plus caller display data, all opaque.
    Call {
        #[serde(default)]
        to: Value,
        #[serde(default)]
        offer: Value,
        #[serde(default, rename = "type")]
        call_type: Value,
        #[serde(default, rename = "fromName")]
        from_name: Value,
    },
    /// Accept a call with an SDP answer.
    Answer {
        #[serde(default)]
        to: Value,
        #[serde(default)]
        answer: Value,
    },
    /// Trickle one ICE candidate to the peer.
    IceCandidate {
        #[serde(default)]
        to: Value,
        #[serde(default)]
        candidate: Value,
    },
    /// Tear the call down.
    EndCall {
        #[serde(default)]
        to: Value,
    },
}

impl ClientEvent {
    /// Decode a client frame from its JSON text form.
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::Decode)
    }

    /// Event name for tracing.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Register { .. } => "register",
            ClientEvent::Call { .. } => "call",
            ClientEvent::Answer { .. } => "answer",
            ClientEvent::IceCandidate { .. } => "ice-candidate",
            ClientEvent::EndCall { .. } => "end-call",
        }
    }
}

/// Events sent to clients.
///
/// `from` is the sender's bound identity; it is omitted from the JSON when
/// the sender never registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Incoming call offer.
    Call {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<UserId>,
        #[serde(rename = "fromName")]
        from_name: Value,
        offer: Value,
        #[serde(rename = "type")]
        call_type: Value,
    },
    /// Answer to a previously forwarded offer.
    Answer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<UserId>,
        answer: Value,
    },
    /// Forwarded ICE candidate.
    IceCandidate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<UserId>,
        candidate: Value,
    },
    /// Call termination signal.
    EndCall {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<UserId>,
    },
    /// Presence change, broadcast to every connection.
    UserStatus {
        #[serde(rename = "userId")]
        user_id: UserId,
        status: PresenceStatus,
    },
}

impl ServerEvent {
    /// Encode the event to its JSON text form.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Event name for tracing.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Call { .. } => "call",
            ServerEvent::Answer { .. } => "answer",
            ServerEvent::IceCandidate { .. } => "ice-candidate",
            ServerEvent::EndCall { .. } => "end-call",
            ServerEvent::UserStatus { .. } => "user-status",
        }
    }
}

/// Presence status carried by a `user-status` broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// Identity has a live registered connection
    Online,
    /// Identity no longer has a live connection
    Offline,
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PresenceStatus::Online => write!(f, "online"),
            PresenceStatus::Offline => write!(f, "offline"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_register() {
        let event = ClientEvent::decode(r#"{"event":"register","data":{"userId":"alice"}}"#)
            .expect("valid frame");
        assert_eq!(
            event,
            ClientEvent::Register {
                user_id: json!("alice")
            }
        );
    }

    #[test]
    fn decode_register_numeric_identity() {
        let event = ClientEvent::decode(r#"{"event":"register","data":{"userId":42}}"#)
            .expect("valid frame");
        assert_eq!(event, ClientEvent::Register { user_id: json!(42) });
    }

    #[test]
    fn decode_call_with_all_fields() {
        let frame = r#"{"event":"call","data":{"to":"bob","offer":{"sdp":"v=0"},"type":"video","fromName":"Alice"}}"#;
        let event = ClientEvent::decode(frame).expect("valid frame");
        assert_eq!(
            event,
            ClientEvent::Call {
                to: json!("bob"),
                offer: json!({"sdp": "v=0"}),
                call_type: json!("video"),
                from_name: json!("Alice"),
            }
        );
    }

    #[test]
    fn decode_missing_fields_default_to_null() {
        let event = ClientEvent::decode(r#"{"event":"call","data":{}}"#).expect("valid frame");
        assert_eq!(
            event,
            ClientEvent::Call {
                to: Value::Null,
                offer: Value::Null,
                call_type: Value::Null,
                from_name: Value::Null,
            }
        );
    }

    #[test]
    fn decode_kebab_case_event_names() {
        let event = ClientEvent::decode(
            r#"{"event":"ice-candidate","data":{"to":"bob","candidate":"cand"}}"#,
        )
        .expect("valid frame");
        assert_eq!(event.name(), "ice-candidate");

        let event =
            ClientEvent::decode(r#"{"event":"end-call","data":{"to":"bob"}}"#).expect("valid frame");
        assert_eq!(event.name(), "end-call");
    }

    #[test]
    fn decode_unknown_event_fails() {
        assert!(ClientEvent::decode(r#"{"event":"subscribe","data":{}}"#).is_err());
        assert!(ClientEvent::decode("not json").is_err());
    }

    #[test]
    fn encode_omits_absent_sender() {
        let encoded = ServerEvent::EndCall { from: None }.encode().expect("encodes");
        assert_eq!(encoded, r#"{"event":"end-call","data":{}}"#);
    }

    #[test]
    fn encode_call_keeps_payload_verbatim() {
        let event = ServerEvent::Call {
            from: Some(UserId::new("alice")),
            from_name: json!("Alice"),
            offer: json!({"sdp": "v=0"}),
            call_type: json!("video"),
        };
        let value: Value = serde_json::from_str(&event.encode().expect("encodes")).unwrap();
        assert_eq!(value["event"], "call");
        assert_eq!(value["data"]["from"], "alice");
        assert_eq!(value["data"]["fromName"], "Alice");
        assert_eq!(value["data"]["offer"]["sdp"], "v=0");
        assert_eq!(value["data"]["type"], "video");
    }

    #[test]
    fn encode_user_status() {
        let event = ServerEvent::UserStatus {
            user_id: UserId::new("alice"),
            status: PresenceStatus::Online,
        };
        assert_eq!(
            event.encode().expect("encodes"),
            r#"{"event":"user-status","data":{"userId":"alice","status":"online"}}"#
        );
    }

    #[test]
    fn null_payload_fields_survive_the_round_trip() {
        // A client that omits `offer` produces a forwarded call with null
        // offer, not an error.
        let event = ServerEvent::Call {
            from: Some(UserId::new("alice")),
            from_name: Value::Null,
            offer: Value::Null,
            call_type: Value::Null,
        };
        let value: Value = serde_json::from_str(&event.encode().expect("encodes")).unwrap();
        assert_eq!(value["data"]["offer"], Value::Null);
    }
}
