//! The event socket. A connection authenticates with its session token in
//! the query string, gets a connection id ack, then joins board/card rooms
//! to receive broadcast events. Server-side pings detect dead peers.

use std::time::Duration;

use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use services::services::{
    realtime::{ConnectionId, Room},
    scope_guard::{self, ItemKind},
};
use tokio::{
    sync::mpsc::{UnboundedReceiver, unbounded_channel},
    time::{Instant, MissedTickBehavior, interval},
};
use utils::{
    jwt::{self, AuthContext},
    wire::{BroadcastEvent, ClientMessage, ControlMessage},
};

use crate::AppState;

/// Keep-alive knobs for the event socket.
#[derive(Debug, Clone)]
pub struct WsKeepAlive {
    /// Interval between server-initiated ping frames.
    pub ping_interval: Duration,
    /// Maximum time to wait for pong response before considering connection dead.
    pub pong_timeout: Duration,
}

impl Default for WsKeepAlive {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(90),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: String,
}

/// Browsers cannot set headers on WebSocket upgrades, so the session token
/// rides in the query string.
pub async fn events_ws(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, StatusCode> {
    let auth = jwt::validate_session(&query.token, &state.config.jwt_secret)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(state, auth, socket)))
}

async fn handle_socket(state: AppState, auth: AuthContext, socket: WebSocket) {
    let (event_tx, event_rx) = unbounded_channel();
    let connection_id = state.realtime.register(event_tx);

    if let Err(e) = drive_socket(&state, auth, connection_id, event_rx, socket).await {
        tracing::debug!(connection_id = %connection_id, error = %e, "event socket error");
    }

    state.realtime.disconnect(connection_id);
}

async fn drive_socket(
    state: &AppState,
    auth: AuthContext,
    connection_id: ConnectionId,
    mut event_rx: UnboundedReceiver<BroadcastEvent>,
    socket: WebSocket,
) -> anyhow::Result<()> {
    let keep_alive = WsKeepAlive::default();
    let (mut sender, mut receiver) = socket.split();

    // Ack with the connection id so the client can tag its HTTP mutations
    // and be skipped by its own broadcasts.
    let ack = serde_json::to_string(&ControlMessage::Connected { connection_id })?;
    if sender.send(Message::Text(ack.into())).await.is_err() {
        return Ok(());
    }

    let mut ping_interval = interval(keep_alive.ping_interval);
    ping_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_pong = Instant::now();

    loop {
        tokio::select! {
            // Forward broadcast events queued by the registry
            event = event_rx.recv() => {
                match event {
                    Some(event) => {
                        let frame = serde_json::to_string(&event)?;
                        if sender.send(Message::Text(frame.into())).await.is_err() {
                            tracing::debug!("client disconnected during send");
                            break;
                        }
                    }
                    None => {
                        tracing::debug!("registry dropped the connection");
                        break;
                    }
                }
            }

            // Room membership requests plus ping/pong/close
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) =
                            handle_client_frame(state, auth, connection_id, text.as_str()).await
                        {
                            let frame = serde_json::to_string(&reply)?;
                            if sender.send(Message::Text(frame.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        last_pong = Instant::now();
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::debug!("client sent close frame");
                        break;
                    }
                    Some(Ok(_)) => {} // ignore binary frames
                    Some(Err(e)) => {
                        tracing::debug!(?e, "websocket receive error");
                        break;
                    }
                    None => {
                        tracing::debug!("websocket stream ended");
                        break;
                    }
                }
            }

            // Send ping and check pong timeout
            _ = ping_interval.tick() => {
                if last_pong.elapsed() > keep_alive.pong_timeout {
                    tracing::warn!(
                        elapsed_secs = last_pong.elapsed().as_secs(),
                        "WebSocket pong timeout, closing connection"
                    );
                    break;
                }
                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    tracing::debug!("failed to send ping, client disconnected");
                    break;
                }
            }
        }
    }

    // Attempt graceful close
    let _ = sender.send(Message::Close(None)).await;

    Ok(())
}

async fn handle_client_frame(
    state: &AppState,
    auth: AuthContext,
    connection_id: ConnectionId,
    raw: &str,
) -> Option<ControlMessage> {
    let message: ClientMessage = match serde_json::from_str(raw) {
        Ok(message) => message,
        Err(_) => {
            return Some(ControlMessage::Error {
                message: "unrecognized message".to_string(),
            });
        }
    };

    match message {
        ClientMessage::JoinBoard(id) => {
            authorize_join(state, auth, connection_id, Room::Board(id)).await
        }
        ClientMessage::JoinCard(id) => {
            authorize_join(state, auth, connection_id, Room::Card(id)).await
        }
        ClientMessage::LeaveBoard(id) => {
            state.realtime.leave(connection_id, Room::Board(id));
            None
        }
        ClientMessage::LeaveCard(id) => {
            state.realtime.leave(connection_id, Room::Card(id));
            None
        }
    }
}

/// Join a room only if the tenant owns the underlying record. Missing and
/// foreign rooms answer identically.
async fn authorize_join(
    state: &AppState,
    auth: AuthContext,
    connection_id: ConnectionId,
    room: Room,
) -> Option<ControlMessage> {
    let (id, kind) = match room {
        Room::Board(id) => (id, ItemKind::Board),
        Room::Card(id) => (id, ItemKind::Card),
    };

    match scope_guard::resolve_tenant(state.pool(), id, kind).await {
        Ok(tenant) if tenant == auth.tenant_id => {
            state.realtime.join(connection_id, room);
            None
        }
        Ok(_) | Err(_) => Some(ControlMessage::Error {
            message: "not found".to_string(),
        }),
    }
}
