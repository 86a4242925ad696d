use futures::future::join_all;
use std::sync::Arc;

use crate::actions::{GameEvent, PlayerAction};
use crate::connection::Connection;
use crate::enums::MessageType;
use crate::errors::{NetworkError, SessionError};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::registry::SessionRegistry;
use crate::session::Session;
use crate::state::PlayerId;

/// The session and seat a connection acts for. Fixed once set.
#[derive(Clone)]
pub struct Binding {
    pub session: Arc<Session>,
    pub player_id: PlayerId,
}

/// Per-connection state owned by that connection's read loop.
pub struct ConnectionContext {
    pub connection: Arc<dyn Connection>,
    pub binding: Option<Binding>,
}

impl ConnectionContext {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        ConnectionContext {
            connection,
            binding: None,
        }
    }
}

/// Routes decoded client messages into sessions and fans resulting state
/// out to every connection bound to the session.
#[derive(Clone)]
pub struct Multiplexer {
    registry: Arc<SessionRegistry>,
}

impl Multiplexer {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Decodes one text frame. Malformed frames are logged and dropped.
    pub async fn handle_text(&self, ctx: &mut ConnectionContext, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => self.handle_message(ctx, message).await,
            Err(e) => {
                let err = NetworkError::DeserializationFailed {
                    details: e.to_string(),
                };
                log::warn!("Dropping frame: {} ({})", err, text);
            }
        }
    }

    pub async fn handle_message(&self, ctx: &mut ConnectionContext, message: ClientMessage) {
        match message {
            ClientMessage::CreateGame {
                number_of_players,
                player_name,
            } => {
                if self.reject_if_bound(ctx).await {
                    return;
                }
                let session = match self.registry.create_session(number_of_players).await {
                    Ok(session) => session,
                    Err(e) => return self.send_error(ctx, "", e.to_string()).await,
                };
                self.join(ctx, session.id(), &player_name).await;
            }
            ClientMessage::JoinGame {
                session_id,
                player_name,
            } => {
                if self.reject_if_bound(ctx).await {
                    return;
                }
                self.join(ctx, &session_id, &player_name).await;
            }
            other => {
                let Some(binding) = ctx.binding.clone() else {
                    log::warn!("Dropping action from unbound connection: {:?}", other);
                    return;
                };
                if let ClientMessage::StartGame {
                    num_players: Some(n),
                } = &other
                {
                    if *n != binding.session.capacity() {
                        log::warn!(
                            "startGame for session {} claims {} players, session holds {}",
                            binding.session.id(),
                            n,
                            binding.session.capacity()
                        );
                    }
                }
                if let Some(action) = other.into_action() {
                    self.dispatch(ctx, &binding, action).await;
                }
            }
        }
    }

    async fn dispatch(
        &self,
        ctx: &ConnectionContext,
        binding: &Binding,
        action: PlayerAction,
    ) {
        let session = &binding.session;
        session.touch().await;

        match session.apply(binding.player_id, action).await {
            Ok(event) => {
                let kind = match event {
                    GameEvent::MatchStarted { .. } => MessageType::GameStarted,
                    _ => MessageType::StateUpdate,
                };
                if let GameEvent::MatchOver { winner, .. } = event {
                    log::info!("🏆 Session {} won by player {}", session.id(), winner);
                }
                self.broadcast(session, kind).await;
            }
            Err(e) => self.send_error(ctx, session.id(), e.to_string()).await,
        }
    }

    async fn join(&self, ctx: &mut ConnectionContext, session_id: &str, player_name: &str) {
        let (session, player_id) = match self.registry.join_session(session_id, player_name).await {
            Ok(joined) => joined,
            Err(e) => return self.send_error(ctx, session_id, e.to_string()).await,
        };

        if let Some(previous) = session
            .register(player_id, Arc::clone(&ctx.connection))
            .await
        {
            previous.close().await;
        }
        ctx.binding = Some(Binding {
            session: Arc::clone(&session),
            player_id,
        });

        let joined = ServerMessage::joined(session.id(), player_id);
        if let Err(e) = ctx.connection.send(&joined).await {
            log::warn!("Failed to notify player {} of join: {}", player_id, e);
        }
        self.broadcast(&session, MessageType::StateUpdate).await;
    }

    async fn reject_if_bound(&self, ctx: &ConnectionContext) -> bool {
        let Some(binding) = &ctx.binding else {
            return false;
        };
        let err = SessionError::AlreadyBound {
            session_id: binding.session.id().to_string(),
        };
        self.send_error(ctx, binding.session.id(), err.to_string())
            .await;
        true
    }

    async fn send_error(&self, ctx: &ConnectionContext, session_id: &str, reason: String) {
        log::debug!("Rejected request in session '{}': {}", session_id, reason);
        if let Err(e) = ctx
            .connection
            .send(&ServerMessage::error(session_id, reason))
            .await
        {
            log::warn!("Failed to deliver error: {}", e);
        }
    }

    /// Sends every bound connection its own projection of the current state.
    /// Connections that fail are deregistered and closed; the rest still
    /// receive their snapshot.
    pub async fn broadcast(&self, session: &Arc<Session>, kind: MessageType) {
        let connections = session.connections().await;
        let outbound: Vec<_> = {
            let state = session.state().await;
            connections
                .into_iter()
                .map(|(player_id, conn)| {
                    let msg = ServerMessage::snapshot(session.id(), &state, player_id, kind);
                    (player_id, conn, msg)
                })
                .collect()
        };

        let deliveries = outbound.into_iter().map(|(player_id, conn, msg)| async move {
            let result = conn.send(&msg).await;
            (player_id, conn, result)
        });

        for (player_id, conn, result) in join_all(deliveries).await {
            if let Err(e) = result {
                log::warn!(
                    "❌ Delivery to player {} in session {} failed: {}",
                    player_id,
                    session.id(),
                    e
                );
                session.deregister(player_id, &conn).await;
                conn.close().await;
            }
        }
    }

    /// Called when a connection's read loop ends.
    pub async fn disconnect(&self, ctx: &ConnectionContext) {
        if let Some(binding) = &ctx.binding {
            if binding
                .session
                .deregister(binding.player_id, &ctx.connection)
                .await
            {
                log::info!(
                    "🔌 Player {} left session {}",
                    binding.player_id,
                    binding.session.id()
                );
            }
        }
        ctx.connection.close().await;
    }
}
