//! Common types for the signaling relay.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable user identity, supplied by the client application layer.
///
/// Identities are opaque strings; the relay never validates them against any
/// authentication source. Client-supplied values are coerced to a canonical
/// string form via [`UserId::coerce`] before they touch the registry, so a
/// `UserId` held by the server is always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create an identity from a known-good string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Coerce a client-supplied JSON value to a canonical identity.
    ///
    /// Strings are taken as-is, numbers and booleans through their display
    /// form. Absent, `null`, `""`, `false` and `0` coerce to `None`, as do
    /// composite values (arrays, objects); the caller applies its
    /// silent-drop policy to those.
    pub fn coerce(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            serde_json::Value::Number(n) if n.as_f64() != Some(0.0) => Some(Self(n.to_string())),
            serde_json::Value::Bool(true) => Some(Self("true".to_string())),
            _ => None,
        }
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Ephemeral identifier for one live transport connection.
///
/// Valid only while the connection is open; the relay forgets it on close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Allocate a fresh connection identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Connection state in the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, no identity bound yet
    Unregistered,
    /// Identity bound, reachable through the registry
    Registered,
    /// Connection closed (terminal)
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unregistered => write!(f, "unregistered"),
            SessionState::Registered => write!(f, "registered"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}
