use crate::deck::{SalvoCard, ShipCard};
use crate::state::PlayerId;

/// Unique identifier for sessions
pub type SessionId = String;

/// Gameplay actions a bound player can take. Decoded from the wire by
/// `protocol::ClientMessage` and applied by `MatchState::apply_action`.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerAction {
    StartGame,
    DrawSalvo,
    DrawShip,
    FireSalvo {
        salvo: SalvoCard,
        target: ShipCard,
        /// Required once more than two players share a session.
        target_player: Option<PlayerId>,
    },
    DiscardSalvo {
        salvo: SalvoCard,
    },
}

impl PlayerAction {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerAction::StartGame => "startGame",
            PlayerAction::DrawSalvo => "drawSalvo",
            PlayerAction::DrawShip => "drawShip",
            PlayerAction::FireSalvo { .. } => "fireSalvo",
            PlayerAction::DiscardSalvo { .. } => "discardSalvo",
        }
    }
}

/// What happened to the targeted ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// No ship on the defender's line matched the target.
    Missed,
    Damaged { remaining: u32 },
    Sunk,
}

/// Events that occur as a result of a successfully applied action
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    MatchStarted {
        first_player: PlayerId,
    },
    SalvoDrawn {
        player_id: PlayerId,
        /// The discard pile was recycled into the play deck first.
        refilled: bool,
    },
    ShipDrawn {
        player_id: PlayerId,
    },
    SalvoFired {
        attacker: PlayerId,
        defender: PlayerId,
        outcome: FireOutcome,
        next_player: PlayerId,
    },
    MatchOver {
        winner: PlayerId,
        defender: PlayerId,
    },
    SalvoDiscarded {
        player_id: PlayerId,
        next_player: PlayerId,
    },
}
