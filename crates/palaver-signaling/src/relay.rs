//! Signaling relay: destination lookup, forwarding and presence lifecycle.
//!
//! The relay owns the [`PresenceRegistry`] and the set of every open
//! connection (registered or not, for `user-status` broadcasts). It is the
//! registry's sole mutator: identities enter on `register` events and leave
//! when the owning connection disconnects.
//!
//! Delivery is best-effort, single-attempt, fire-and-forget: no retries, no
//! acknowledgements, no queueing for offline destinations.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::protocol::{PresenceStatus, ServerEvent};
use crate::registry::{ClientSender, PresenceEntry, PresenceRegistry};
use crate::types::{ConnectionId, UserId};

/// Result of attempting to deliver an event to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendResult {
    /// Event was queued for delivery
    Sent,
    /// The destination identity has no current connection
    NotConnected,
    /// The destination's channel is full (backpressure); event dropped
    ChannelFull,
    /// The destination's channel is closed; event dropped
    ChannelClosed,
}

/// The signaling relay.
///
/// All operations are synchronous and non-blocking (`try_send` only), so a
/// connection task never stalls on another connection's backpressure.
pub struct SignalingRelay {
    /// Identity-to-connection mapping, mutated only by this relay
    registry: Arc<PresenceRegistry>,
    /// Every open connection, for presence broadcasts
    peers: DashMap<ConnectionId, ClientSender>,
}

impl SignalingRelay {
    /// Create a relay around an externally owned registry.
    ///
    /// The registry is instantiated once at process start and handed in here;
    /// nothing else mutates it.
    pub fn new(registry: Arc<PresenceRegistry>) -> Self {
        info!("creating signaling relay");
        Self {
            registry,
            peers: DashMap::new(),
        }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Arc<PresenceRegistry> {
        &self.registry
    }

    /// Announce a new transport connection and obtain its identifier.
    pub fn attach(&self, sender: ClientSender) -> ConnectionId {
        let connection_id = ConnectionId::new();
        self.peers.insert(connection_id, sender);
        info!(connection = %connection_id, "client connected");
        connection_id
    }

    /// Number of currently open connections.
    pub fn connection_count(&self) -> usize {
        self.peers.len()
    }

    /// Bind an identity to a connection and broadcast its presence.
    ///
    /// Unconditional upsert; a repeated registration re-broadcasts `online`
    /// (no dedup). Connections that already disappeared are ignored.
    #[instrument(skip(self), fields(connection = %connection_id, user = %user_id))]
    pub fn register(&self, connection_id: ConnectionId, user_id: UserId) {
        let sender = match self.peers.get(&connection_id) {
            Some(entry) => entry.value().clone(),
            None => {
                debug!("register from unknown connection, ignoring");
                return;
            }
        };

        self.registry
            .register(user_id.clone(), PresenceEntry::new(connection_id, sender));
        info!("user registered");

        self.broadcast(ServerEvent::UserStatus {
            user_id,
            status: PresenceStatus::Online,
        });
        debug!(users = ?self.registry.users(), "users online");
    }

    /// Forward an event to the identity named by a raw `to` field.
    ///
    /// The destination is coerced to canonical form before lookup. Unknown or
    /// offline destinations are a silent drop: no error reaches the sender.
    #[instrument(skip(self, event), fields(event = event.name()))]
    pub fn forward(&self, to: &Value, event: ServerEvent) -> SendResult {
        let Some(user_id) = UserId::coerce(to) else {
            debug!(to = %to, "unusable destination identity, dropping");
            return SendResult::NotConnected;
        };

        let Some(entry) = self.registry.lookup(&user_id) else {
            debug!(to = %user_id, "destination not connected, dropping");
            return SendResult::NotConnected;
        };

        let result = Self::deliver(&entry.sender, event);
        match result {
            SendResult::Sent => debug!(to = %user_id, "event forwarded"),
            SendResult::ChannelFull => {
                warn!(to = %user_id, "outbound channel full, event dropped");
            }
            SendResult::ChannelClosed => {
                // Stale mapping: the socket task is gone but the close event
                // has not been processed yet.
                debug!(to = %user_id, "outbound channel closed, removing stale entry");
                self.registry.remove(&user_id);
            }
            SendResult::NotConnected => {}
        }
        result
    }

    /// Tear a connection down.
    ///
    /// Removes it from the broadcast set and, when an identity was bound,
    /// removes that identity from the registry and broadcasts `offline` to
    /// the remaining connections. Closing a connection that never registered
    /// has no registry or broadcast effect.
    #[instrument(skip(self), fields(connection = %connection_id))]
    pub fn disconnect(&self, connection_id: ConnectionId, bound_identity: Option<UserId>) {
        self.peers.remove(&connection_id);

        let Some(user_id) = bound_identity else {
            debug!("unregistered client disconnected");
            return;
        };

        self.registry.remove(&user_id);
        info!(user = %user_id, "user disconnected");

        self.broadcast(ServerEvent::UserStatus {
            user_id,
            status: PresenceStatus::Offline,
        });
        debug!(users = ?self.registry.users(), "users remaining");
    }

    /// Send an event to every open connection, including the one that
    /// triggered it. Best-effort; full or closed channels are skipped.
    pub fn broadcast(&self, event: ServerEvent) {
        for peer in self.peers.iter() {
            match Self::deliver(peer.value(), event.clone()) {
                SendResult::Sent => {}
                SendResult::ChannelFull => {
                    warn!(connection = %peer.key(), "broadcast dropped, channel full");
                }
                SendResult::ChannelClosed => {
                    debug!(connection = %peer.key(), "broadcast skipped, channel closed");
                }
                SendResult::NotConnected => {}
            }
        }
    }

    /// Single-attempt delivery to one channel.
    fn deliver(sender: &ClientSender, event: ServerEvent) -> SendResult {
        use tokio::sync::mpsc::error::TrySendError;

        match sender.try_send(event) {
            Ok(()) => SendResult::Sent,
            Err(TrySendError::Full(_)) => SendResult::ChannelFull,
            Err(TrySendError::Closed(_)) => SendResult::ChannelClosed,
        }
    }
}

impl std::fmt::Debug for SignalingRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalingRelay")
            .field("connection_count", &self.peers.len())
            .field("online_count", &self.registry.len())
            .finish()
    }
}
