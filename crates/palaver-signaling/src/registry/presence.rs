//! Presence registry implementation.
//!
//! Tracks the current connection for each registered user identity.

use std::fmt;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::protocol::ServerEvent;
use crate::types::{ConnectionId, UserId};

/// Channel through which the relay delivers events to a connection's socket
/// task.
pub type ClientSender = mpsc::Sender<ServerEvent>;

/// Registry entry: the connection currently bound to an identity.
#[derive(Debug, Clone)]
pub struct PresenceEntry {
    /// Connection the identity is bound to
    pub connection_id: ConnectionId,
    /// Outbound channel for that connection
    pub sender: ClientSender,
}

impl PresenceEntry {
    /// Create an entry for a connection.
    pub fn new(connection_id: ConnectionId, sender: ClientSender) -> Self {
        Self {
            connection_id,
            sender,
        }
    }
}

/// Registry mapping user identities to their current connection.
///
/// Thread-safe; uses DashMap so that register/lookup/remove on a single
/// identity appear atomically to concurrent callers. The registry holds no
/// forwarding logic and does not detect connection closure: the relay is the
/// sole mutator and removes entries when the owning connection closes.
pub struct PresenceRegistry {
    connections: DashMap<UserId, PresenceEntry>,
}

impl PresenceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a connection for an identity.
    ///
    /// Unconditional upsert: a later registration for the same identity
    /// replaces the earlier mapping, even if the earlier connection is still
    /// open. This models a user reconnecting from a new session. Returns the
    /// replaced entry, if any.
    #[instrument(skip(self, entry), fields(user = %user_id, connection = %entry.connection_id))]
    pub fn register(&self, user_id: UserId, entry: PresenceEntry) -> Option<PresenceEntry> {
        let previous = self.connections.insert(user_id, entry);
        if previous.is_some() {
            debug!("replaced existing registration");
        } else {
            debug!("registered new identity");
        }
        previous
    }

    /// Look up the current connection for an identity. Pure read.
    pub fn lookup(&self, user_id: &UserId) -> Option<PresenceEntry> {
        self.connections.get(user_id).map(|e| e.value().clone())
    }

    /// Remove an identity's mapping.
    ///
    /// Unconditional delete; returns `None` (no error) if the identity was
    /// not registered.
    #[instrument(skip(self), fields(user = %user_id))]
    pub fn remove(&self, user_id: &UserId) -> Option<PresenceEntry> {
        let removed = self.connections.remove(user_id);
        if removed.is_some() {
            debug!("removed identity");
        } else {
            debug!("identity was not registered");
        }
        removed.map(|(_, entry)| entry)
    }

    /// Check whether an identity is currently online.
    pub fn contains(&self, user_id: &UserId) -> bool {
        self.connections.contains_key(user_id)
    }

    /// Number of registered identities.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// True when nobody is registered.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Snapshot of all online identities, in no particular order.
    pub fn users(&self) -> Vec<UserId> {
        self.connections.iter().map(|e| e.key().clone()).collect()
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PresenceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenceRegistry")
            .field("online_count", &self.connections.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_entry() -> (PresenceEntry, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(16);
        (PresenceEntry::new(ConnectionId::new(), tx), rx)
    }

    #[test]
    fn registry_starts_empty() {
        let registry = PresenceRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn register_and_lookup() {
        let registry = PresenceRegistry::new();
        let (entry, _rx) = test_entry();
        let connection_id = entry.connection_id;

        assert!(registry.register(UserId::new("alice"), entry).is_none());

        let found = registry.lookup(&UserId::new("alice")).expect("registered");
        assert_eq!(found.connection_id, connection_id);
        assert!(registry.contains(&UserId::new("alice")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register_replaces_existing() {
        let registry = PresenceRegistry::new();
        let (first, _rx1) = test_entry();
        let (second, _rx2) = test_entry();
        let first_id = first.connection_id;
        let second_id = second.connection_id;

        registry.register(UserId::new("alice"), first);
        let replaced = registry.register(UserId::new("alice"), second);

        assert_eq!(replaced.expect("previous entry").connection_id, first_id);
        assert_eq!(registry.len(), 1);
        let current = registry.lookup(&UserId::new("alice")).expect("registered");
        assert_eq!(current.connection_id, second_id);
    }

    #[test]
    fn register_is_idempotent_in_effect() {
        let registry = PresenceRegistry::new();
        let (tx, _rx) = mpsc::channel(16);
        let connection_id = ConnectionId::new();

        for _ in 0..3 {
            registry.register(
                UserId::new("alice"),
                PresenceEntry::new(connection_id, tx.clone()),
            );
        }

        assert_eq!(registry.len(), 1);
        let entry = registry.lookup(&UserId::new("alice")).expect("registered");
        assert_eq!(entry.connection_id, connection_id);
    }

    #[test]
    fn remove_registered_identity() {
        let registry = PresenceRegistry::new();
        let (entry, _rx) = test_entry();

        registry.register(UserId::new("alice"), entry);
        assert!(registry.remove(&UserId::new("alice")).is_some());
        assert!(!registry.contains(&UserId::new("alice")));
        assert!(registry.lookup(&UserId::new("alice")).is_none());
    }

    #[test]
    fn remove_absent_identity_is_a_noop() {
        let registry = PresenceRegistry::new();
        assert!(registry.remove(&UserId::new("ghost")).is_none());
    }

    #[test]
    fn lookup_absent_identity() {
        let registry = PresenceRegistry::new();
        assert!(registry.lookup(&UserId::new("ghost")).is_none());
    }

    #[test]
    fn users_snapshot() {
        let registry = PresenceRegistry::new();
        let (a, _rx1) = test_entry();
        let (b, _rx2) = test_entry();

        registry.register(UserId::new("alice"), a);
        registry.register(UserId::new("bob"), b);

        let users = registry.users();
        assert_eq!(users.len(), 2);
        assert!(users.contains(&UserId::new("alice")));
        assert!(users.contains(&UserId::new("bob")));
    }
}
