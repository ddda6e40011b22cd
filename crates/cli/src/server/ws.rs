//! Observer sessions over WebSocket
//!
//! Each session subscribes to the broadcaster, receives the history message
//! first and then every composite event as a text frame. The session ends
//! when the peer goes away, a send fails or the broadcaster closes the
//! subscription; a close frame is sent in the last case.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};

use super::state::AppState;

pub async fn observer_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| observer_session(socket, state))
}

async fn observer_session(socket: WebSocket, state: AppState) {
    let mut subscription = match state.broadcaster.connect() {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!(error = %e, "Observer rejected");
            return;
        }
    };
    let id = subscription.id();
    debug!(observer = %id, "WebSocket session started");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            frame = subscription.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = sender.send(Message::Text(frame.to_string().into())).await {
                        debug!(observer = %id, error = %e, "Observer send failed");
                        break;
                    }
                }
                None => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(observer = %id, error = %e, "Observer connection error");
                    break;
                }
            },
        }
    }

    state.broadcaster.disconnect(id);
    debug!(observer = %id, "WebSocket session ended");
}
