use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::time::Instant;

use crate::actions::{GameEvent, PlayerAction, SessionId};
use crate::connection::Connection;
use crate::errors::GameResult;
use crate::state::{MatchState, PlayerId};

/// One match and the connections bound to it.
///
/// Locks are independent of the registry's: the match state, the client map
/// and the activity clock each have their own. When more than one is needed
/// the order is state, then clients.
pub struct Session {
    id: SessionId,
    capacity: usize,
    state: RwLock<MatchState>,
    clients: RwLock<HashMap<PlayerId, Arc<dyn Connection>>>,
    last_activity: RwLock<Instant>,
}

impl Session {
    pub fn new(id: SessionId, capacity: usize) -> Self {
        Session {
            id,
            capacity,
            state: RwLock::new(MatchState::new(capacity)),
            clients: RwLock::new(HashMap::new()),
            last_activity: RwLock::new(Instant::now()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn state(&self) -> RwLockReadGuard<'_, MatchState> {
        self.state.read().await
    }

    /// Exclusive access outside the rules engine. Actions should go through
    /// `apply`.
    pub async fn state_mut(&self) -> RwLockWriteGuard<'_, MatchState> {
        self.state.write().await
    }

    pub async fn touch(&self) {
        *self.last_activity.write().await = Instant::now();
    }

    pub async fn idle_for(&self) -> Duration {
        self.last_activity.read().await.elapsed()
    }

    pub async fn is_inactive(&self, threshold: Duration) -> bool {
        self.idle_for().await > threshold
    }

    /// Applies one action under the exclusive state lock.
    pub async fn apply(&self, actor: PlayerId, action: PlayerAction) -> GameResult<GameEvent> {
        let mut state = self.state.write().await;
        state.apply_action(actor, action)
    }

    /// Binds `connection` to a player slot and returns whatever it replaced.
    pub async fn register(
        &self,
        player_id: PlayerId,
        connection: Arc<dyn Connection>,
    ) -> Option<Arc<dyn Connection>> {
        self.clients.write().await.insert(player_id, connection)
    }

    /// Unbinds the slot only if `connection` is still the one registered.
    pub async fn deregister(&self, player_id: PlayerId, connection: &Arc<dyn Connection>) -> bool {
        let mut clients = self.clients.write().await;
        match clients.get(&player_id) {
            Some(current) if Arc::ptr_eq(current, connection) => {
                clients.remove(&player_id);
                true
            }
            _ => false,
        }
    }

    /// Snapshot of the bound connections, safe to use after the lock drops.
    pub async fn connections(&self) -> Vec<(PlayerId, Arc<dyn Connection>)> {
        self.clients
            .read()
            .await
            .iter()
            .map(|(id, conn)| (*id, Arc::clone(conn)))
            .collect()
    }

    pub async fn connected_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Removes and closes every bound connection.
    pub async fn close_all(&self) {
        let drained: Vec<_> = self.clients.write().await.drain().collect();
        for (player_id, conn) in drained {
            log::debug!("Closing connection for player {} in session {}", player_id, self.id);
            conn.close().await;
        }
    }
}
