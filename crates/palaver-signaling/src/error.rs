//! Error types for the signaling relay.

use thiserror::Error;

/// Wire protocol errors.
///
/// Registry and relay operations themselves never fail: anomalous input is
/// handled by silent policy (unknown destinations drop the message, falsy
/// identities are ignored). Only the JSON framing layer can reject data.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Inbound frame did not match any known event shape
    #[error("malformed client frame: {0}")]
    Decode(#[source] serde_json::Error),

    /// Outbound event could not be encoded
    #[error("failed to encode server frame: {0}")]
    Encode(#[source] serde_json::Error),
}
