use thiserror::Error;

use crate::state::PlayerId;

/// Process-level failures that end the server. Per-request errors never
/// reach this level; they are reported to the offending connection.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rule and precondition violations raised by the rules engine.
///
/// The `Display` text is what the offending client sees in the `error` field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    #[error("Waiting for players to join ({joined}/{capacity})")]
    WaitingForPlayers { joined: usize, capacity: usize },

    #[error("Game already started")]
    AlreadyStarted,

    #[error("Game is not in progress")]
    NotInProgress,

    #[error("Not your turn: current={current}, attempted={attempted}")]
    NotPlayerTurn { current: PlayerId, attempted: PlayerId },

    #[error("Player {player_id} is not part of this game")]
    UnknownPlayer { player_id: PlayerId },

    #[error("No ship on your battle line can fire a {gun_size}-inch salvo")]
    NoMatchingGun { gun_size: f64 },

    #[error("Salvo {gun_size}/{damage} is not in your hand")]
    CardNotInHand { gun_size: f64, damage: u32 },

    #[error("A target player is required when more than two players are in the game")]
    TargetPlayerRequired,

    #[error("Player {player_id} cannot be targeted")]
    InvalidTarget { player_id: PlayerId },

    #[error("Ship deck is empty")]
    ShipDeckEmpty,

    #[error("Salvo deck and discard pile are empty")]
    SalvoDeckEmpty,
}

/// Session registry and connection binding errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Game session not found: {session_id}")]
    NotFound { session_id: String },

    #[error("Game is full ({capacity} players)")]
    Full { capacity: usize },

    #[error("Invalid number of players: {requested} (allowed {min}-{max})")]
    InvalidCapacity {
        requested: usize,
        min: usize,
        max: usize,
    },

    #[error("Connection is already bound to session {session_id}")]
    AlreadyBound { session_id: String },
}

/// Network/WebSocket errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("Message serialization failed: {details}")]
    SerializationFailed { details: String },

    #[error("Message deserialization failed: {details}")]
    DeserializationFailed { details: String },

    #[error("Send failed: {details}")]
    SendFailed { details: String },

    #[error("Connection closed")]
    ConnectionClosed,
}

pub type ServerResult<T> = Result<T, ServerError>;
pub type GameResult<T> = Result<T, GameError>;
pub type SessionResult<T> = Result<T, SessionError>;
pub type NetworkResult<T> = Result<T, NetworkError>;

impl GameError {
    pub fn not_player_turn(current: PlayerId, attempted: PlayerId) -> Self {
        Self::NotPlayerTurn { current, attempted }
    }
}

impl SessionError {
    pub fn not_found(session_id: impl Into<String>) -> Self {
        Self::NotFound {
            session_id: session_id.into(),
        }
    }
}

impl NetworkError {
    pub fn serialization_failed(details: impl Into<String>) -> Self {
        Self::SerializationFailed {
            details: details.into(),
        }
    }

    pub fn send_failed(details: impl Into<String>) -> Self {
        Self::SendFailed {
            details: details.into(),
        }
    }
}
