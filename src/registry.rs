// Session registry and inactivity reaper.
//
// The registry maps session ids to live sessions behind a single RwLock.
// Lock order is always registry, then a session's state, then its clients.
// Creating, joining and reaping take the registry write lock; lookups and
// listing take the read lock and release it before touching any session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::actions::SessionId;
use crate::errors::{SessionError, SessionResult};
use crate::protocol::SessionInfo;
use crate::session::Session;
use crate::state::{PlayerId, MAX_PLAYERS, MIN_PLAYERS};

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty session for `capacity` players.
    pub async fn create_session(&self, capacity: usize) -> SessionResult<Arc<Session>> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&capacity) {
            return Err(SessionError::InvalidCapacity {
                requested: capacity,
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
            });
        }

        let mut sessions = self.sessions.write().await;
        let mut id = Uuid::new_v4().to_string();
        while sessions.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }

        let session = Arc::new(Session::new(id.clone(), capacity));
        sessions.insert(id.clone(), Arc::clone(&session));
        log::info!("🆕 Created session {} for {} players", id, capacity);
        Ok(session)
    }

    /// Seats a new player in session `id` and returns their id.
    pub async fn join_session(
        &self,
        id: &str,
        player_name: &str,
    ) -> SessionResult<(Arc<Session>, PlayerId)> {
        let sessions = self.sessions.write().await;
        let session = sessions
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::not_found(id))?;

        let (player_id, phase) = {
            let mut state = session.state_mut().await;
            let player_id = state.add_player(player_name)?;
            (player_id, state.phase())
        };
        session.touch().await;
        log::info!(
            "➕ {} joined session {} as player {} ({})",
            player_name,
            id,
            player_id,
            phase
        );
        Ok((session, player_id))
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// `player_count` is the number of live connections, not seats taken.
    pub async fn list_sessions(&self) -> Vec<SessionInfo> {
        let sessions: Vec<Arc<Session>> = self.sessions.read().await.values().cloned().collect();

        let mut infos = Vec::with_capacity(sessions.len());
        for session in sessions {
            let game_started = session.state().await.game_started;
            infos.push(SessionInfo {
                id: session.id().to_string(),
                player_count: session.connected_count().await,
                capacity: session.capacity(),
                game_started,
            });
        }
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Removes every session idle for longer than `threshold` and closes its
    /// connections. Returns the ids that were removed.
    pub async fn reap_inactive(&self, threshold: Duration) -> Vec<SessionId> {
        let mut reaped = Vec::new();
        {
            let mut sessions = self.sessions.write().await;
            let candidates: Vec<Arc<Session>> = sessions.values().cloned().collect();
            for session in candidates {
                if !session.is_inactive(threshold).await {
                    continue;
                }
                // Wait out any action in flight, then look again: it will
                // have refreshed the clock before taking the lock.
                let _state = session.state_mut().await;
                if session.is_inactive(threshold).await {
                    sessions.remove(session.id());
                    reaped.push(Arc::clone(&session));
                }
            }
        }

        let mut ids = Vec::with_capacity(reaped.len());
        for session in reaped {
            log::info!(
                "🧹 Reaped session {} after {:?} idle",
                session.id(),
                session.idle_for().await
            );
            session.close_all().await;
            ids.push(session.id().to_string());
        }
        ids
    }

    /// Runs `reap_inactive` every `period` until `shutdown` fires.
    pub fn spawn_reaper(
        registry: Arc<Self>,
        period: Duration,
        threshold: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let reaped = registry.reap_inactive(threshold).await;
                        if !reaped.is_empty() {
                            log::debug!("Reaper removed {} sessions", reaped.len());
                        }
                    }
                    _ = shutdown.recv() => {
                        log::info!("🛑 Session reaper stopped");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ChannelConnection, Connection};

    #[tokio::test]
    async fn test_create_validates_capacity() {
        let registry = SessionRegistry::new();
        assert_eq!(
            registry.create_session(1).await.err(),
            Some(SessionError::InvalidCapacity {
                requested: 1,
                min: MIN_PLAYERS,
                max: MAX_PLAYERS
            })
        );
        assert!(registry.create_session(7).await.is_err());
        assert!(registry.is_empty().await);

        let session = registry.create_session(2).await.unwrap();
        assert_eq!(session.capacity(), 2);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_join_assigns_dense_ids_then_fills() {
        let registry = SessionRegistry::new();
        let session = registry.create_session(2).await.unwrap();
        let id = session.id().to_string();

        let (_, first) = registry.join_session(&id, "Ada").await.unwrap();
        let (_, second) = registry.join_session(&id, "Brin").await.unwrap();
        assert_eq!((first, second), (PlayerId(1), PlayerId(2)));

        assert_eq!(
            registry.join_session(&id, "Cole").await.err(),
            Some(SessionError::Full { capacity: 2 })
        );
        assert_eq!(session.state().await.players.len(), 2);
    }

    #[tokio::test]
    async fn test_join_unknown_session() {
        let registry = SessionRegistry::new();
        assert_eq!(
            registry.join_session("nope", "Ada").await.err(),
            Some(SessionError::not_found("nope"))
        );
    }

    #[tokio::test]
    async fn test_concurrent_joins_never_overfill() {
        let registry = Arc::new(SessionRegistry::new());
        let session = registry.create_session(3).await.unwrap();
        let id = session.id().to_string();

        let joins = (0..8).map(|i| {
            let registry = Arc::clone(&registry);
            let id = id.clone();
            tokio::spawn(async move { registry.join_session(&id, &format!("P{i}")).await })
        });
        let results = futures::future::join_all(joins).await;

        let joined = results
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(_))))
            .count();
        assert_eq!(joined, 3);
        let state = session.state().await;
        let ids: Vec<_> = state.players.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![PlayerId(1), PlayerId(2), PlayerId(3)]);
    }

    #[tokio::test]
    async fn test_list_sessions_counts_connected_clients() {
        let registry = SessionRegistry::new();
        let session = registry.create_session(4).await.unwrap();
        let (_, ada) = registry.join_session(session.id(), "Ada").await.unwrap();
        let (_, brin) = registry.join_session(session.id(), "Brin").await.unwrap();
        let (ada_conn, _ada_rx) = ChannelConnection::new();
        let (brin_conn, _brin_rx) = ChannelConnection::new();
        let ada_conn: Arc<dyn Connection> = Arc::new(ada_conn);
        session.register(ada, Arc::clone(&ada_conn)).await;
        session.register(brin, Arc::new(brin_conn)).await;

        let info = |player_count| SessionInfo {
            id: session.id().to_string(),
            player_count,
            capacity: 4,
            game_started: false,
        };
        assert_eq!(registry.list_sessions().await, vec![info(2)]);

        session.deregister(ada, &ada_conn).await;

        assert_eq!(registry.list_sessions().await, vec![info(1)]);
        assert_eq!(session.state().await.players.len(), 2);
    }

    #[tokio::test]
    async fn test_reap_removes_only_idle_sessions_and_closes_clients() {
        let registry = SessionRegistry::new();
        let idle = registry.create_session(2).await.unwrap();
        let (conn, mut rx) = ChannelConnection::new();
        idle.register(PlayerId(1), Arc::new(conn)).await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        let busy = registry.create_session(2).await.unwrap();

        let reaped = registry.reap_inactive(Duration::from_millis(30)).await;

        assert_eq!(reaped, vec![idle.id().to_string()]);
        assert!(registry.get(idle.id()).await.is_none());
        assert!(registry.get(busy.id()).await.is_some());
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_reaper_task_stops_on_shutdown() {
        let registry = Arc::new(SessionRegistry::new());
        registry.create_session(2).await.unwrap();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = SessionRegistry::spawn_reaper(
            Arc::clone(&registry),
            Duration::from_millis(10),
            Duration::from_millis(5),
            shutdown_rx,
        );

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(registry.is_empty().await);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
