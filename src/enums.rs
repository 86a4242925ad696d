use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipType {
    Carrier,
    #[default]
    Normal,
}

/// Where a match sits in its lifecycle. Derived from the roster and the
/// `game_started`/`winner` fields rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    Lobby,
    Ready,
    InProgress,
    Finished,
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPhase::Lobby => write!(f, "lobby"),
            MatchPhase::Ready => write!(f, "ready"),
            MatchPhase::InProgress => write!(f, "in_progress"),
            MatchPhase::Finished => write!(f, "finished"),
        }
    }
}

/// Outbound `messageType`. Plain state broadcasts carry an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    #[serde(rename = "")]
    StateUpdate,
    GameStarted,
    Error,
}
