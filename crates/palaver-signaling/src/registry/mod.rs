//! Presence registry for real-time signaling routing.
//!
//! This module provides a thread-safe registry that tracks which user
//! identities currently have a live connection, enabling call-negotiation
//! messages to be routed between connections by identity.
//!
//! ## Architecture
//!
//! Each connection registers a channel sender once the client announces its
//! identity. Events can then be routed to any online user by identity.
//!
//! ```text
//! ConnectionSession (alice) <-> PresenceRegistry <-> ConnectionSession (bob)
//!          |                          |                       |
//!          v                          v                       v
//!    mpsc::Sender             DashMap<UserId,           mpsc::Sender
//!                              PresenceEntry>
//! ```

mod presence;

pub use presence::{ClientSender, PresenceEntry, PresenceRegistry};
