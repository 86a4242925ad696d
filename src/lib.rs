// Salvo Server Library - Core Module Organization
//
// Card catalog and match model at the bottom, the rules engine on top of the
// match state, then the session layer and the network boundary.

// Core game data structures
pub mod actions;
pub mod deck;
pub mod enums;
pub mod state;

// Sessions and connection handling
pub mod connection;
pub mod multiplexer;
pub mod protocol;
pub mod registry;
pub mod session;

// Server plumbing
pub mod config;
pub mod errors;
pub mod websocket;

pub use crate::actions::{FireOutcome, GameEvent, PlayerAction, SessionId};
pub use crate::connection::{ChannelConnection, Connection};
pub use crate::deck::{SalvoCard, ShipCard};
pub use crate::errors::{GameError, NetworkError, ServerError, SessionError};
pub use crate::multiplexer::{ConnectionContext, Multiplexer};
pub use crate::protocol::{ClientMessage, ServerMessage};
pub use crate::registry::SessionRegistry;
pub use crate::session::Session;
pub use crate::state::{MatchState, Player, PlayerId};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
