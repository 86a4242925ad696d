// HTTP and WebSocket boundary.
//
// Each upgraded socket gets its own task: the write half becomes a
// `WsConnection` the session can deliver to, the read half feeds text frames
// into the multiplexer one at a time.

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::connection::Connection;
use crate::errors::{NetworkError, NetworkResult};
use crate::multiplexer::{ConnectionContext, Multiplexer};
use crate::protocol::{ServerMessage, SessionList};
use crate::registry::SessionRegistry;

/// Write half of an upgraded socket.
pub struct WsConnection {
    id: String,
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

impl WsConnection {
    pub fn new(id: String, sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            id,
            sink: Mutex::new(sink),
        }
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&self, message: &ServerMessage) -> NetworkResult<()> {
        let json = serde_json::to_string(message)
            .map_err(|e| NetworkError::serialization_failed(e.to_string()))?;
        self.sink
            .lock()
            .await
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| NetworkError::send_failed(format!("{}: {}", self.id, e)))
    }

    async fn close(&self) {
        let _ = self.sink.lock().await.close().await;
    }
}

#[derive(Clone)]
pub struct AppState {
    pub multiplexer: Multiplexer,
}

pub fn router(registry: Arc<SessionRegistry>) -> Router {
    let state = AppState {
        multiplexer: Multiplexer::new(registry),
    };

    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/sessions", get(list_sessions))
        .with_state(state)
        .layer(cors)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state.multiplexer))
}

async fn list_sessions(State(state): State<AppState>) -> Json<SessionList> {
    Json(SessionList {
        sessions: state.multiplexer.registry().list_sessions().await,
    })
}

/// Reads frames until the client goes away, then unbinds the connection.
pub async fn handle_connection(socket: WebSocket, multiplexer: Multiplexer) {
    let connection_id = format!("conn_{}", uuid::Uuid::new_v4());
    log::info!("🔌 WebSocket connected: {}", connection_id);

    let (sink, mut stream) = socket.split();
    let connection: Arc<dyn Connection> = Arc::new(WsConnection::new(connection_id.clone(), sink));
    let mut ctx = ConnectionContext::new(connection);

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => multiplexer.handle_text(&mut ctx, text.as_str()).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                log::warn!("WebSocket {} read error: {}", connection_id, e);
                break;
            }
        }
    }

    multiplexer.disconnect(&ctx).await;
    log::info!("WebSocket connection {} terminated", connection_id);
}
