//! Push-channel server
//!
//! Localhost HTTP server exposing the WebSocket state feed and the
//! manual commands: re-analysis, upload, delete and declutter. Every
//! handler posts a command onto the engine queue; nothing in here
//! mutates clustering state directly, so the read/push side can never
//! race the ingestion side.

#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine as _;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};

use crate::cluster::Algorithm;
use crate::core::error::{OrganizerError, Result};
use crate::engine::{EngineCommand, EngineHandle, Snapshot};

/// Shared state for all handlers
#[derive(Clone)]
pub struct ServerContext {
    pub engine: EngineHandle,
    pub snapshots: watch::Receiver<Snapshot>,
}

/// Build the application router
pub fn router(context: ServerContext) -> Router {
    // Permissive on purpose: binds to localhost only and performs no
    // authentication
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/analyze", post(analyze_handler))
        .route("/upload", post(upload_handler))
        .route("/delete", post(delete_handler))
        .route("/declutter", post(declutter_handler))
        .layer(cors)
        .with_state(context)
}

/// Bind and serve until the process exits
pub async fn serve(context: ServerContext, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| OrganizerError::Server(format!("failed to bind {addr}: {e}")))?;
    tracing::info!(%addr, "push-channel server listening");

    axum::serve(listener, router(context))
        .await
        .map_err(|e| OrganizerError::Server(e.to_string()))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(context): State<ServerContext>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| client_session(socket, context))
}

/// One connected listener: send the current snapshot immediately,
/// then push every state change until the peer goes away.
async fn client_session(socket: WebSocket, context: ServerContext) {
    let (mut sender, mut receiver) = socket.split();
    let mut snapshots = context.snapshots.clone();

    let initial = snapshots.borrow_and_update().clone();
    if send_update(&mut sender, &initial).await.is_err() {
        return;
    }
    tracing::debug!("websocket client connected");

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if send_update(&mut sender, &snapshot).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    // Client payloads are ignored; the socket is a
                    // one-way state feed
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
        }
    }
    tracing::debug!("websocket client disconnected");
}

async fn send_update(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    snapshot: &Snapshot,
) -> std::result::Result<(), axum::Error> {
    let payload = json!({ "type": "update", "data": snapshot }).to_string();
    sender.send(Message::Text(payload)).await
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    algorithm: String,
}

async fn analyze_handler(
    State(context): State<ServerContext>,
    Json(request): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    let algorithm = match request.algorithm.parse::<Algorithm>() {
        Ok(algorithm) => algorithm,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(json!({ "error": e }))),
    };

    match context.engine.send(EngineCommand::Analyze { algorithm }).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "scheduled", "algorithm": algorithm.wire_name() })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct UploadRequest {
    name: String,
    data_base64: String,
}

async fn upload_handler(
    State(context): State<ServerContext>,
    Json(request): Json<UploadRequest>,
) -> impl IntoResponse {
    let data = match base64::engine::general_purpose::STANDARD.decode(&request.data_base64) {
        Ok(data) => data,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("invalid base64 payload: {e}") })),
            )
        }
    };

    match context
        .engine
        .send(EngineCommand::Upload {
            name: request.name,
            data,
        })
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "scheduled" }))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    path: PathBuf,
}

async fn delete_handler(
    State(context): State<ServerContext>,
    Json(request): Json<DeleteRequest>,
) -> impl IntoResponse {
    match context
        .engine
        .send(EngineCommand::Delete { path: request.path })
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "scheduled" }))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

async fn declutter_handler(State(context): State<ServerContext>) -> impl IntoResponse {
    match context.engine.send(EngineCommand::Declutter).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "scheduled" }))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}
