use rand::Rng;

use super::{MatchState, PlayerId};
use crate::actions::{FireOutcome, GameEvent, PlayerAction};
use crate::deck::{build_salvo_deck_with, build_ship_deck_with, SalvoCard, ShipCard};
use crate::errors::{GameError, GameResult};

pub const OPENING_SHIPS: usize = 5;
pub const OPENING_SALVOS: usize = 5;

// Every transition validates completely before touching any field, so an
// `Err` always leaves the state exactly as it was.
impl MatchState {
    pub fn apply_action(&mut self, actor: PlayerId, action: PlayerAction) -> GameResult<GameEvent> {
        self.apply_action_with(actor, action, &mut rand::thread_rng())
    }

    pub fn apply_action_with<R: Rng + ?Sized>(
        &mut self,
        actor: PlayerId,
        action: PlayerAction,
        rng: &mut R,
    ) -> GameResult<GameEvent> {
        if self.player(actor).is_none() {
            return Err(GameError::UnknownPlayer { player_id: actor });
        }

        let name = action.name();
        let result = match action {
            PlayerAction::StartGame => self.start_match(rng),
            PlayerAction::DrawSalvo => self.draw_salvo(actor),
            PlayerAction::DrawShip => self.draw_ship(actor),
            PlayerAction::FireSalvo {
                salvo,
                target,
                target_player,
            } => self.fire_salvo(actor, &salvo, &target, target_player),
            PlayerAction::DiscardSalvo { salvo } => self.discard_salvo(actor, &salvo),
        };

        match &result {
            Ok(event) => log::debug!("Player {} {}: {:?}", actor, name, event),
            Err(e) => log::debug!("Player {} {} rejected: {}", actor, name, e),
        }
        result
    }

    /// Builds fresh decks and deals the opening battle lines and hands
    /// round-robin. Also serves as a rematch once a match has finished.
    pub fn start_match<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GameResult<GameEvent> {
        if self.game_started {
            return Err(GameError::AlreadyStarted);
        }
        let waiting = GameError::WaitingForPlayers {
            joined: self.players.len(),
            capacity: self.capacity,
        };
        if self.players.len() != self.capacity {
            return Err(waiting);
        }
        let first_player = self.players.first().map(|p| p.id).ok_or(waiting)?;

        let mut ship_deck = build_ship_deck_with(rng);
        let mut play_deck = build_salvo_deck_with(rng);

        for player in &mut self.players {
            player.reset_cards();
        }
        for _ in 0..OPENING_SHIPS {
            for player in &mut self.players {
                if let Some(ship) = ship_deck.pop() {
                    player.played_ships.push(ship);
                }
            }
        }
        for _ in 0..OPENING_SALVOS {
            for player in &mut self.players {
                if let Some(salvo) = play_deck.pop() {
                    player.hand.push(salvo);
                }
            }
        }

        self.ship_deck = ship_deck;
        self.play_deck = play_deck;
        self.discard_pile.clear();
        self.current_player_id = Some(first_player);
        self.game_started = true;
        self.winner = None;

        log::info!(
            "🎯 Match started with {} players, player {} to act",
            self.players.len(),
            first_player
        );
        Ok(GameEvent::MatchStarted { first_player })
    }

    /// Draws from the end of the play deck into the actor's hand. An empty
    /// play deck is refilled from the discard pile first, keeping its order.
    pub fn draw_salvo(&mut self, actor: PlayerId) -> GameResult<GameEvent> {
        let index = self.acting_index(actor)?;

        let refilled = self.play_deck.is_empty();
        if refilled {
            if self.discard_pile.is_empty() {
                return Err(GameError::SalvoDeckEmpty);
            }
            self.play_deck = std::mem::take(&mut self.discard_pile);
        }
        if let Some(card) = self.play_deck.pop() {
            self.players[index].hand.push(card);
        }

        Ok(GameEvent::SalvoDrawn {
            player_id: actor,
            refilled,
        })
    }

    /// Draws a ship into the actor's holding area, not onto the battle line.
    pub fn draw_ship(&mut self, actor: PlayerId) -> GameResult<GameEvent> {
        let index = self.acting_index(actor)?;
        let ship = self.ship_deck.pop().ok_or(GameError::ShipDeckEmpty)?;
        self.players[index].ships.push(ship);
        Ok(GameEvent::ShipDrawn { player_id: actor })
    }

    pub fn fire_salvo(
        &mut self,
        actor: PlayerId,
        salvo: &SalvoCard,
        target: &ShipCard,
        target_player: Option<PlayerId>,
    ) -> GameResult<GameEvent> {
        let attacker_index = self.acting_index(actor)?;
        let defender_index = self.resolve_defender(actor, target_player)?;

        let attacker = &self.players[attacker_index];
        if !attacker.can_fire(salvo) {
            return Err(GameError::NoMatchingGun {
                gun_size: salvo.gun_size,
            });
        }
        let hand_index = attacker
            .hand_position(salvo)
            .ok_or(GameError::CardNotInHand {
                gun_size: salvo.gun_size,
                damage: salvo.damage,
            })?;

        let spent = self.players[attacker_index].hand.remove(hand_index);
        let damage = spent.damage;
        self.discard_pile.push(spent);

        let defender_id = self.players[defender_index].id;
        let line = &mut self.players[defender_index].played_ships;
        let outcome = match line.iter().position(|ship| ship.matches(target)) {
            None => FireOutcome::Missed,
            Some(i) => {
                line[i].hit_points = line[i].hit_points.saturating_sub(damage);
                if line[i].hit_points == 0 {
                    let sunk = line.remove(i);
                    self.players[attacker_index].deep_six_pile.push(sunk);
                    FireOutcome::Sunk
                } else {
                    FireOutcome::Damaged {
                        remaining: line[i].hit_points,
                    }
                }
            }
        };

        if self.players[defender_index].played_ships.is_empty() {
            self.game_started = false;
            self.winner = Some(actor);
            log::info!(
                "🏁 Player {} sank player {}'s last ship",
                actor,
                defender_id
            );
            return Ok(GameEvent::MatchOver {
                winner: actor,
                defender: defender_id,
            });
        }

        let next_player = self.advance_turn();
        Ok(GameEvent::SalvoFired {
            attacker: actor,
            defender: defender_id,
            outcome,
            next_player,
        })
    }

    /// Moves a held salvo to the discard pile and passes the turn.
    pub fn discard_salvo(&mut self, actor: PlayerId, salvo: &SalvoCard) -> GameResult<GameEvent> {
        let index = self.acting_index(actor)?;
        let hand_index = self.players[index]
            .hand_position(salvo)
            .ok_or(GameError::CardNotInHand {
                gun_size: salvo.gun_size,
                damage: salvo.damage,
            })?;

        let card = self.players[index].hand.remove(hand_index);
        self.discard_pile.push(card);

        let next_player = self.advance_turn();
        Ok(GameEvent::SalvoDiscarded {
            player_id: actor,
            next_player,
        })
    }

    /// Roster index of `actor`, provided the match is running and it is
    /// their turn.
    fn acting_index(&self, actor: PlayerId) -> GameResult<usize> {
        if !self.game_started {
            return Err(GameError::NotInProgress);
        }
        match self.current_player_id {
            Some(current) if current == actor => self
                .player_index(actor)
                .ok_or(GameError::UnknownPlayer { player_id: actor }),
            Some(current) => Err(GameError::not_player_turn(current, actor)),
            None => Err(GameError::NotInProgress),
        }
    }

    fn resolve_defender(
        &self,
        actor: PlayerId,
        target_player: Option<PlayerId>,
    ) -> GameResult<usize> {
        match target_player {
            Some(id) if id == actor => Err(GameError::InvalidTarget { player_id: id }),
            Some(id) => self
                .player_index(id)
                .ok_or(GameError::InvalidTarget { player_id: id }),
            None if self.players.len() == 2 => self
                .players
                .iter()
                .position(|p| p.id != actor)
                .ok_or(GameError::TargetPlayerRequired),
            None => Err(GameError::TargetPlayerRequired),
        }
    }

    /// Hands the turn to the next player in join order. Only reached after
    /// `acting_index` succeeded, so the roster is non-empty.
    fn advance_turn(&mut self) -> PlayerId {
        let position = self
            .current_player_id
            .and_then(|id| self.player_index(id))
            .unwrap_or(0);
        let next = self.players[(position + 1) % self.players.len()].id;
        self.current_player_id = Some(next);
        next
    }
}
