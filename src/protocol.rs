// Wire messages.
//
// Inbound frames are `{"action": "...", ...}` objects decoded into
// `ClientMessage`. Outbound frames are always a `ServerMessage`; state
// snapshots are projected per recipient so that a player only ever sees
// their own hand and holding area.

use serde::{Deserialize, Serialize};

use crate::actions::{PlayerAction, SessionId};
use crate::deck::{SalvoCard, ShipCard};
use crate::enums::MessageType;
use crate::state::{MatchState, Player, PlayerId};

/// Messages a client can send over its connection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    CreateGame {
        #[serde(alias = "numPlayers")]
        number_of_players: usize,
        player_name: String,
    },

    #[serde(rename_all = "camelCase")]
    JoinGame {
        session_id: SessionId,
        player_name: String,
    },

    /// The count is only cross-checked; the session's declared capacity wins.
    #[serde(rename_all = "camelCase")]
    StartGame {
        #[serde(default)]
        num_players: Option<usize>,
    },

    DrawSalvo,
    DrawShip,

    #[serde(rename_all = "camelCase")]
    FireSalvo {
        salvo: SalvoCard,
        target: ShipCard,
        #[serde(default)]
        target_player_id: Option<PlayerId>,
    },

    DiscardSalvo {
        salvo: SalvoCard,
    },
}

impl ClientMessage {
    /// The gameplay action carried by this message, if any. Session
    /// management messages (`createGame`, `joinGame`) return `None`.
    pub fn into_action(self) -> Option<PlayerAction> {
        match self {
            ClientMessage::CreateGame { .. } | ClientMessage::JoinGame { .. } => None,
            ClientMessage::StartGame { .. } => Some(PlayerAction::StartGame),
            ClientMessage::DrawSalvo => Some(PlayerAction::DrawSalvo),
            ClientMessage::DrawShip => Some(PlayerAction::DrawShip),
            ClientMessage::FireSalvo {
                salvo,
                target,
                target_player_id,
            } => Some(PlayerAction::FireSalvo {
                salvo,
                target,
                target_player: target_player_id,
            }),
            ClientMessage::DiscardSalvo { salvo } => Some(PlayerAction::DiscardSalvo { salvo }),
        }
    }
}

/// One player as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    /// Empty unless this is the viewer.
    pub ships: Vec<ShipCard>,
    /// Empty unless this is the viewer.
    pub hand: Vec<SalvoCard>,
    pub played_ships: Vec<ShipCard>,
    pub discarded_salvos: Vec<SalvoCard>,
    pub deep_six_pile: Vec<ShipCard>,
}

impl PlayerView {
    fn project(player: &Player, viewer: PlayerId) -> Self {
        let own = player.id == viewer;
        PlayerView {
            id: player.id,
            name: player.name.clone(),
            ships: if own { player.ships.clone() } else { Vec::new() },
            hand: if own { player.hand.clone() } else { Vec::new() },
            played_ships: player.played_ships.clone(),
            discarded_salvos: player.discarded_salvos.clone(),
            deep_six_pile: player.deep_six_pile.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateView {
    pub players: Vec<PlayerView>,
    pub current_player_id: Option<PlayerId>,
    pub game_started: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,
}

impl GameStateView {
    pub fn project(state: &MatchState, viewer: PlayerId) -> Self {
        GameStateView {
            players: state
                .players
                .iter()
                .map(|p| PlayerView::project(p, viewer))
                .collect(),
            current_player_id: state.current_player_id,
            game_started: state.game_started,
            winner: state.winner,
        }
    }
}

/// Every outbound frame has this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_state: Option<GameStateView>,
    pub ship_deck_count: usize,
    pub play_deck_count: usize,
    pub discard_count: usize,
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServerMessage {
    /// State snapshot for `viewer`. Build it under the state read lock and
    /// send it after the lock is released.
    pub fn snapshot(
        session_id: &str,
        state: &MatchState,
        viewer: PlayerId,
        message_type: MessageType,
    ) -> Self {
        ServerMessage {
            message_type,
            game_state: Some(GameStateView::project(state, viewer)),
            ship_deck_count: state.ship_deck.len(),
            play_deck_count: state.play_deck.len(),
            discard_count: state.discard_pile.len(),
            session_id: session_id.to_string(),
            player_id: Some(viewer),
            error: None,
        }
    }

    pub fn error(session_id: &str, reason: impl Into<String>) -> Self {
        ServerMessage {
            message_type: MessageType::Error,
            game_state: None,
            ship_deck_count: 0,
            play_deck_count: 0,
            discard_count: 0,
            session_id: session_id.to_string(),
            player_id: None,
            error: Some(reason.into()),
        }
    }

    /// Tells a freshly bound connection which session and seat it holds.
    pub fn joined(session_id: &str, player_id: PlayerId) -> Self {
        ServerMessage {
            message_type: MessageType::GameStarted,
            game_state: None,
            ship_deck_count: 0,
            play_deck_count: 0,
            discard_count: 0,
            session_id: session_id.to_string(),
            player_id: Some(player_id),
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: SessionId,
    pub player_count: usize,
    pub capacity: usize,
    pub game_started: bool,
}

/// Body of `GET /sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionList {
    pub sessions: Vec<SessionInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::ShipType;
    use serde_json::json;

    #[test]
    fn test_decode_create_game_with_either_count_field() {
        let long: ClientMessage = serde_json::from_value(json!({
            "action": "createGame",
            "numberOfPlayers": 2,
            "playerName": "Ada"
        }))
        .unwrap();
        let short: ClientMessage = serde_json::from_value(json!({
            "action": "createGame",
            "numPlayers": 2,
            "playerName": "Ada"
        }))
        .unwrap();

        let expected = ClientMessage::CreateGame {
            number_of_players: 2,
            player_name: "Ada".to_string(),
        };
        assert_eq!(long, expected);
        assert_eq!(short, expected);
    }

    #[test]
    fn test_decode_ignores_envelope_fields() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "action": "drawSalvo",
            "sessionId": "abc",
            "playerId": "1"
        }))
        .unwrap();
        assert_eq!(msg.into_action(), Some(PlayerAction::DrawSalvo));
    }

    #[test]
    fn test_decode_fire_salvo() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "action": "fireSalvo",
            "salvo": {"gunSize": 12.6, "damage": 2},
            "target": {"gunSize": 14, "hitPoints": 5},
            "targetPlayerId": "3"
        }))
        .unwrap();

        assert_eq!(
            msg.into_action(),
            Some(PlayerAction::FireSalvo {
                salvo: SalvoCard::new(12.6, 2),
                target: ShipCard::new("", 14.0, 5, ShipType::Normal),
                target_player: Some(PlayerId(3)),
            })
        );
    }

    #[test]
    fn test_decode_rejects_unknown_action_and_garbage() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"action":"surrender"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"action":"discardSalvo"}"#).is_err());
    }

    #[test]
    fn test_projection_hides_other_players_private_zones() {
        let mut state = MatchState::new(2);
        state.add_player("Ada").unwrap();
        state.add_player("Brin").unwrap();
        state.players[0].hand.push(SalvoCard::new(11.0, 1));
        state.players[0].ships.push(ShipCard::new("Battleship", 15.0, 6, ShipType::Normal));
        state.players[1].hand.push(SalvoCard::new(16.0, 4));
        state.players[1]
            .played_ships
            .push(ShipCard::new("Light Cruiser", 11.0, 3, ShipType::Normal));

        let view = GameStateView::project(&state, PlayerId(1));

        assert_eq!(view.players[0].hand.len(), 1);
        assert_eq!(view.players[0].ships.len(), 1);
        assert!(view.players[1].hand.is_empty());
        assert!(view.players[1].ships.is_empty());
        assert_eq!(view.players[1].played_ships.len(), 1);
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let mut state = MatchState::new(2);
        state.add_player("Ada").unwrap();
        state.play_deck.push(SalvoCard::new(11.0, 1));

        let message =
            ServerMessage::snapshot("s-1", &state, PlayerId(1), MessageType::StateUpdate);
        let value = serde_json::to_value(message).unwrap();

        assert_eq!(value["messageType"], "");
        assert_eq!(value["sessionId"], "s-1");
        assert_eq!(value["playerId"], "1");
        assert_eq!(value["playDeckCount"], 1);
        assert_eq!(value["shipDeckCount"], 0);
        assert_eq!(value["gameState"]["gameStarted"], false);
        assert_eq!(value["gameState"]["players"][0]["name"], "Ada");
        assert!(value["gameState"]["players"][0]["deepSixPile"].is_array());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_error_wire_shape() {
        let value = serde_json::to_value(ServerMessage::error("s-1", "Not your turn")).unwrap();
        assert_eq!(value["messageType"], "error");
        assert_eq!(value["error"], "Not your turn");
        assert!(value.get("gameState").is_none());
    }
}
