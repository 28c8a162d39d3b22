//! Server configuration.
//!
//! The deployment environment provides the listening port through `PORT`
//! (hosting platforms set this); everything else has sensible defaults.

use std::net::{IpAddr, SocketAddr};

use tracing::warn;

/// Default listening port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 4000;

/// Capacity of each connection's outbound event channel.
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 64;

/// Runtime configuration for the signaling server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind (default: 0.0.0.0)
    pub bind_addr: IpAddr,
    /// Port to listen on (default: 4000, overridden by `PORT`)
    pub port: u16,
}

impl ServerConfig {
    /// Build the configuration from environment variables.
    ///
    /// - `PORT`: listening port; unparsable values fall back to the default
    ///   with a warning.
    /// - `PALAVER_BIND_ADDR`: bind address, default `0.0.0.0`.
    pub fn from_env() -> Self {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "invalid PORT value, using default");
                DEFAULT_PORT
            }),
            Err(_) => DEFAULT_PORT,
        };

        let bind_addr = match std::env::var("PALAVER_BIND_ADDR") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "invalid PALAVER_BIND_ADDR value, using default");
                IpAddr::from([0, 0, 0, 0])
            }),
            Err(_) => IpAddr::from([0, 0, 0, 0]),
        };

        Self { bind_addr, port }
    }

    /// The socket address to listen on.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_listen_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:4000");
    }

    #[test]
    fn listen_addr_uses_configured_port() {
        let config = ServerConfig {
            port: 8080,
            ..ServerConfig::default()
        };
        assert_eq!(config.listen_addr().port(), 8080);
    }
}
