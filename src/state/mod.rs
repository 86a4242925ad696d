// Match state for a single session.
//
// `MatchState` is the authoritative data behind one game: the player roster
// (join order is turn order), the face-down ship and salvo decks, the face-up
// discard pile, and the turn pointer. It carries no locking of its own; the
// owning `Session` wraps it in a `RwLock` and every mutation in
// `move_application.rs` runs under that exclusive guard.

mod move_application;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;

use crate::deck::{SalvoCard, ShipCard};
use crate::enums::MatchPhase;
use crate::errors::{SessionError, SessionResult};

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;

/// Dense 1-based seat number, assigned at join and never reused within a
/// session. Travels as a string on the wire ("1", "2", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PlayerId> for String {
    fn from(id: PlayerId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for PlayerId {
    type Error = ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.trim().parse().map(PlayerId)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Salvos held. Only the owner ever sees these.
    pub hand: Vec<SalvoCard>,
    /// Ships drawn but not yet on the battle line. Hidden like `hand`.
    pub ships: Vec<ShipCard>,
    /// The battle line.
    pub played_ships: Vec<ShipCard>,
    pub discarded_salvos: Vec<SalvoCard>,
    /// Ships this player has sunk.
    pub deep_six_pile: Vec<ShipCard>,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Player {
            id,
            name,
            hand: Vec::new(),
            ships: Vec::new(),
            played_ships: Vec::new(),
            discarded_salvos: Vec::new(),
            deep_six_pile: Vec::new(),
        }
    }

    pub fn can_fire(&self, salvo: &SalvoCard) -> bool {
        self.played_ships
            .iter()
            .any(|ship| ship.gun_size == salvo.gun_size)
    }

    pub fn hand_position(&self, salvo: &SalvoCard) -> Option<usize> {
        self.hand.iter().position(|card| card.matches(salvo))
    }

    /// Clears every card zone, keeping id and name.
    fn reset_cards(&mut self) {
        self.hand.clear();
        self.ships.clear();
        self.played_ships.clear();
        self.discarded_salvos.clear();
        self.deep_six_pile.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchState {
    pub players: Vec<Player>,
    pub ship_deck: Vec<ShipCard>,
    pub play_deck: Vec<SalvoCard>,
    pub discard_pile: Vec<SalvoCard>,
    pub current_player_id: Option<PlayerId>,
    pub game_started: bool,
    pub winner: Option<PlayerId>,
    capacity: usize,
}

impl MatchState {
    pub fn new(capacity: usize) -> Self {
        MatchState {
            players: Vec::new(),
            ship_deck: Vec::new(),
            play_deck: Vec::new(),
            discard_pile: Vec::new(),
            current_player_id: None,
            game_started: false,
            winner: None,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity
    }

    /// Appends a player with the next dense id.
    pub fn add_player(&mut self, name: impl Into<String>) -> SessionResult<PlayerId> {
        if self.is_full() {
            return Err(SessionError::Full {
                capacity: self.capacity,
            });
        }
        let id = PlayerId(self.players.len() as u32 + 1);
        self.players.push(Player::new(id, name.into()));
        Ok(id)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_index(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.current_player_id.and_then(|id| self.player(id))
    }

    pub fn phase(&self) -> MatchPhase {
        if self.game_started {
            MatchPhase::InProgress
        } else if self.winner.is_some() {
            MatchPhase::Finished
        } else if self.is_full() {
            MatchPhase::Ready
        } else {
            MatchPhase::Lobby
        }
    }

    /// Ship cards across every zone. Constant for the life of a started match.
    pub fn ship_card_total(&self) -> usize {
        self.ship_deck.len()
            + self
                .players
                .iter()
                .map(|p| p.ships.len() + p.played_ships.len() + p.deep_six_pile.len())
                .sum::<usize>()
    }

    /// Salvo cards across every zone. Constant for the life of a started match.
    pub fn salvo_card_total(&self) -> usize {
        self.play_deck.len()
            + self.discard_pile.len()
            + self
                .players
                .iter()
                .map(|p| p.hand.len() + p.discarded_salvos.len())
                .sum::<usize>()
    }
}
