//! WebSocket transport for the signaling relay.
//!
//! Each accepted socket gets one [`ConnectionSession`] and a single task that
//! multiplexes inbound frames and outbound relay events. Per-connection event
//! order is preserved: the task processes one thing at a time.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use palaver_signaling::{ClientEvent, ConnectionSession};

use crate::config::OUTBOUND_CHANNEL_CAPACITY;
use crate::server::AppState;

/// Create the WebSocket router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state)
}

/// GET /ws
///
/// Upgrades the HTTP connection to a WebSocket carrying JSON signaling
/// frames.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("signaling WebSocket connection request");

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one signaling connection until it closes.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();

    let (tx, mut rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);
    let mut session = ConnectionSession::open(Arc::clone(&state.relay), tx);
    debug!(connection = %session.id(), "signaling socket established");

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(event) = outbound else { break };
                match event.encode() {
                    Ok(frame) => {
                        if let Err(e) = sink.send(Message::Text(frame)).await {
                            error!(error = %e, "failed to send WebSocket message");
                            break;
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "dropping unencodable outbound event");
                    }
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => match ClientEvent::decode(&text) {
                        Ok(event) => session.handle_event(event),
                        Err(e) => {
                            // Malformed input never surfaces to the client.
                            debug!(error = %e, "ignoring malformed frame");
                        }
                    },
                    Some(Ok(Message::Binary(_))) => {
                        warn!("binary WebSocket frames are not supported");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sink.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        debug!(connection = %session.id(), "WebSocket close requested");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(error = %e, "WebSocket error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    session.close();
    info!(connection = %session.id(), "signaling socket closed");
}
