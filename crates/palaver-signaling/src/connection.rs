//! Per-connection session state.
//!
//! Each transport connection owns one [`ConnectionSession`], driven by its
//! socket task. The session remembers the single identity the connection
//! most recently registered (needed to know what to remove at close time)
//! and walks the `Unregistered -> Registered -> Closed` lifecycle.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::protocol::{ClientEvent, ServerEvent};
use crate::registry::ClientSender;
use crate::relay::SignalingRelay;
use crate::types::{ConnectionId, SessionState, UserId};

/// State machine for a single client connection.
pub struct ConnectionSession {
    id: ConnectionId,
    relay: Arc<SignalingRelay>,
    /// Identity most recently bound by a `register` event
    user_id: Option<UserId>,
    state: SessionState,
}

impl ConnectionSession {
    /// Attach a new connection to the relay.
    pub fn open(relay: Arc<SignalingRelay>, sender: ClientSender) -> Self {
        let id = relay.attach(sender);
        Self {
            id,
            relay,
            user_id: None,
            state: SessionState::Unregistered,
        }
    }

    /// This connection's identifier.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The bound identity, if the client has registered.
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Dispatch one inbound event.
    ///
    /// Relay-class events are accepted even before registration; the
    /// forwarded `from` is then absent rather than the event being rejected.
    #[instrument(
        skip(self, event),
        fields(connection = %self.id, event = event.name(), state = %self.state)
    )]
    pub fn handle_event(&mut self, event: ClientEvent) {
        if self.state == SessionState::Closed {
            warn!("event after close, ignoring");
            return;
        }

        match event {
            ClientEvent::Register { user_id } => self.handle_register(&user_id),
            ClientEvent::Call {
                to,
                offer,
                call_type,
                from_name,
            } => {
                self.relay.forward(
                    &to,
                    ServerEvent::Call {
                        from: self.user_id.clone(),
                        from_name,
                        offer,
                        call_type,
                    },
                );
            }
            ClientEvent::Answer { to, answer } => {
                self.relay.forward(
                    &to,
                    ServerEvent::Answer {
                        from: self.user_id.clone(),
                        answer,
                    },
                );
            }
            ClientEvent::IceCandidate { to, candidate } => {
                self.relay.forward(
                    &to,
                    ServerEvent::IceCandidate {
                        from: self.user_id.clone(),
                        candidate,
                    },
                );
            }
            ClientEvent::EndCall { to } => {
                self.relay.forward(
                    &to,
                    ServerEvent::EndCall {
                        from: self.user_id.clone(),
                    },
                );
            }
        }
    }

    /// Handle a `register` event.
    ///
    /// A falsy or composite identity is ignored outright; this is an explicit
    /// guard, not an error. Re-registration rebinds the remembered identity
    /// and re-broadcasts presence.
    fn handle_register(&mut self, raw_user_id: &Value) {
        let Some(user_id) = UserId::coerce(raw_user_id) else {
            debug!("register without usable identity, ignoring");
            return;
        };

        self.relay.register(self.id, user_id.clone());
        self.user_id = Some(user_id);
        self.state = SessionState::Registered;
    }

    /// Close the connection. Idempotent; the first call detaches from the
    /// relay and, if an identity was bound, removes it from the registry and
    /// broadcasts `offline`.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        self.relay.disconnect(self.id, self.user_id.take());
    }
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        self.close();
    }
}
