//! HTTP and WebSocket surface.
//!
//! `/ws` is the push path: a session is opened per socket and every viewer
//! event is forwarded as a JSON text frame. The `/api/*` routes serve viewers
//! that fetch on their own schedule.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::delivery::DeliveryChannel;
use crate::error::{LiveError, LiveResult};
use crate::observability::DeliveryMonitor;
use crate::protocol::{ClientMessage, ServerMessage, WindowSnapshot};
use crate::session::DisplayState;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub channel: DeliveryChannel,
    pub monitor: Arc<DeliveryMonitor>,
}

impl AppState {
    pub fn new(channel: DeliveryChannel) -> Self {
        let monitor = Arc::new(DeliveryMonitor::new(channel.collector().clone()));
        Self { channel, monitor }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(handle_websocket))
        .route("/health", get(health_check))
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/delta", get(get_delta))
        .route("/api/sessions/{id}/display", get(get_display_state))
        .route("/api/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> LiveResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

impl IntoResponse for LiveError {
    fn into_response(self) -> Response {
        let status = match &self {
            LiveError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            LiveError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            LiveError::StaleResyncRequired { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ServerMessage::error(self.code(), self.to_string()))).into_response()
    }
}

async fn health_check() -> &'static str {
    "OK"
}

async fn get_snapshot(State(state): State<AppState>) -> Json<WindowSnapshot> {
    Json(state.channel.snapshot())
}

#[derive(Debug, Deserialize)]
pub struct DeltaQuery {
    pub after: Option<u64>,
    pub epoch: u64,
}

/// Samples after the caller's cursor, or a fresh window if continuity is lost
async fn get_delta(
    State(state): State<AppState>,
    Query(query): Query<DeltaQuery>,
) -> Result<Json<ServerMessage>, LiveError> {
    answer_delta(&state.channel, query.after, query.epoch).map(Json)
}

async fn get_display_state(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<DisplayState>, LiveError> {
    state.channel.display_state(id).map(Json)
}

async fn get_metrics(State(state): State<AppState>) -> String {
    state.monitor.generate_report()
}

fn answer_delta(channel: &DeliveryChannel, after: Option<u64>, epoch: u64) -> LiveResult<ServerMessage> {
    match channel.delta(after, epoch) {
        Ok(samples) => Ok(ServerMessage::Delta { epoch, samples }),
        Err(e) if e.requires_resync() => Ok(ServerMessage::Resync(channel.snapshot())),
        Err(e) => Err(e),
    }
}

/// Answer a request sent over the socket
fn handle_client_message(text: &str, channel: &DeliveryChannel) -> ServerMessage {
    let msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            return ServerMessage::error("PARSE_ERROR", format!("Invalid message format: {}", e));
        }
    };

    match msg {
        ClientMessage::Snapshot => ServerMessage::Snapshot(channel.snapshot()),
        ClientMessage::Delta { after, epoch } => match answer_delta(channel, after, epoch) {
            Ok(reply) => reply,
            Err(e) => ServerMessage::error(e.code(), e.to_string()),
        },
        ClientMessage::Ping => ServerMessage::Pong,
    }
}

async fn handle_websocket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn send_json(sender: &mut SplitSink<WebSocket, Message>, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            error!("Failed to serialize message: {}", e);
            true
        }
    }
}

/// One viewer session per socket, torn down when either side goes away
async fn handle_socket(socket: WebSocket, state: AppState) {
    let mut subscription = match state.channel.connect() {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!("Rejecting viewer: {}", e);
            return;
        }
    };
    let id = subscription.id();
    let (mut sender, mut receiver) = socket.split();

    if let Some(snapshot) = subscription.take_snapshot() {
        if !send_json(&mut sender, &ServerMessage::Snapshot(snapshot)).await {
            return;
        }
    }

    'session: loop {
        tokio::select! {
            event = subscription.next() => {
                let Some(event) = event else { break };
                for msg in event.into_messages() {
                    if !send_json(&mut sender, &msg).await {
                        break 'session;
                    }
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_client_message(text.as_str(), &state.channel);
                        if !send_json(&mut sender, &reply).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("WebSocket error on viewer {}: {}", id, e);
                        break;
                    }
                }
            }
        }
    }

    info!("WebSocket for viewer {} terminated", id);
}
