//! # palaver-signaling
//!
//! Core library for the Palaver call-signaling relay.
//!
//! Tracks which logical users currently have a live connection and forwards
//! WebRTC call-negotiation events (offers, answers, ICE candidates,
//! termination signals) between a caller and a callee addressed by a stable
//! user identifier rather than by transport connection.
//!
//! ## Architecture
//!
//! - **PresenceRegistry**: leaf component, the identity-to-connection map
//! - **SignalingRelay**: resolves destinations through the registry, forwards
//!   envelopes with the sender identity substituted, and broadcasts
//!   `user-status` presence changes
//! - **ConnectionSession**: per-connection state machine driven by the
//!   transport's socket task
//!
//! The transport substrate (WebSocket accept loop, framing) lives in
//! `palaver-server`; this crate only sees `mpsc` senders and JSON frames.
//!
//! Negotiation payloads are opaque: the relay never inspects or validates
//! offer/answer/candidate content.

pub mod connection;
pub mod protocol;
pub mod registry;
pub mod relay;

mod error;
mod types;

pub use connection::ConnectionSession;
pub use error::ProtocolError;
pub use protocol::{ClientEvent, PresenceStatus, ServerEvent};
pub use registry::{ClientSender, PresenceEntry, PresenceRegistry};
pub use relay::{SendResult, SignalingRelay};
pub use types::{ConnectionId, SessionState, UserId};
