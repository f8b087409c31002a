use anyhow::{Result, anyhow, ensure};
use rand::Rng;
use std::collections::HashMap;

use rush_types::{Game, GameState, Ident, Player, PlayerState};

use crate::{Dictionary, FragmentTable, normalize_answer};

/// Difficulty added on every turn advance.
pub const DIFFICULTY_STEP: f64 = 0.06;
/// Divisor for the per-round difficulty bonus (`player_count / 15`).
pub const ROUND_BONUS_DIVISOR: f64 = 15.0;
/// Numerator of the shrinking time budget.
pub const BASE_TIME_MS: f64 = 30_000.0;
/// Time budget floor so high difficulty never produces an unplayable turn.
pub const MIN_TIME_MS: u64 = 500;

/// Work the server owes after a turn advance: arm a timeout timer for
/// `turn`, and clear `previous`'s typing buffer after a short delay (always
/// `None` in solo games, where the client clears it locally).
#[derive(Debug, Clone, PartialEq)]
pub struct TurnSchedule {
    pub turn: i64,
    pub time_ms: u64,
    pub player: Ident,
    pub previous: Option<Ident>,
}

#[derive(Debug, PartialEq)]
pub enum ReadyOutcome {
    /// Everyone is ready; state moved to `starting` and the caller owns the
    /// countdown before `start_playing`.
    AllReady,
    Updated,
    Ignored,
}

#[derive(Debug, PartialEq)]
pub enum AnswerOutcome {
    Correct(TurnSchedule),
    Incorrect,
    /// Out-of-turn or out-of-state submission; dropped silently.
    Ignored,
}

#[derive(Debug, PartialEq)]
pub enum TimeoutOutcome {
    /// The captured turn sequence number no longer matches; the turn
    /// already ended some other way and this timer must change nothing.
    Stale,
    Continued(TurnSchedule),
    Won(Ident),
    /// A solo player ran out of hp; nothing further to schedule.
    Halted,
}

#[derive(Debug, PartialEq)]
pub enum LeaveOutcome {
    /// Last player left; the caller destroys the whole game.
    Teardown,
    /// The departing player held the turn, so the engine advanced past them.
    Advanced(TurnSchedule),
    /// The departure left a lobby where everyone remaining is ready.
    AllReady,
    Removed,
    Ignored,
}

/// One game's turn engine: owns the game state and the round-local set of
/// players still owed a turn. All methods are synchronous; asynchrony
/// (timers, the countdown, typing-buffer clears) lives in the caller, which
/// re-enters with the turn sequence number it captured at schedule time.
#[derive(Debug)]
pub struct GameSession {
    pub game: Game,
    /// Players not yet given a turn this round; rebuilt whenever it drains.
    not_played: Vec<Ident>,
}

impl GameSession {
    pub fn new(id: Ident, code: String, host: Player) -> Self {
        let mut players = HashMap::new();
        players.insert(host.id.clone(), host);
        Self {
            game: Game {
                id,
                code,
                player_count: 1,
                players,
                solo: false,
                state: GameState::Lobby { players_ready: 0 },
            },
            not_played: Vec::new(),
        }
    }

    /// Add a joining player. Joining always clears solo; a second player
    /// arriving mid-game simply waits for the next round refill.
    pub fn add_player(&mut self, player: Player) {
        self.game.player_count += 1;
        self.game.solo = false;
        self.game.players.insert(player.id.clone(), player);
    }

    pub fn mark_ready(&mut self, player_id: &Ident) -> ReadyOutcome {
        let player_count = self.game.player_count;
        let GameState::Lobby { players_ready } = &mut self.game.state else {
            return ReadyOutcome::Ignored;
        };
        let Some(player) = self.game.players.get_mut(player_id) else {
            return ReadyOutcome::Ignored;
        };
        if player.state != PlayerState::Lobby {
            return ReadyOutcome::Ignored;
        }

        player.state = PlayerState::Ready;
        *players_ready += 1;
        if *players_ready == player_count {
            self.game.state = GameState::Starting;
            ReadyOutcome::AllReady
        } else {
            ReadyOutcome::Updated
        }
    }

    pub fn mark_unready(&mut self, player_id: &Ident) -> ReadyOutcome {
        let GameState::Lobby { players_ready } = &mut self.game.state else {
            return ReadyOutcome::Ignored;
        };
        let Some(player) = self.game.players.get_mut(player_id) else {
            return ReadyOutcome::Ignored;
        };
        if player.state != PlayerState::Ready {
            return ReadyOutcome::Ignored;
        }

        player.state = PlayerState::Lobby;
        *players_ready = players_ready.saturating_sub(1);
        ReadyOutcome::Updated
    }

    /// Countdown elapsed: initialize round/turn/difficulty counters and run
    /// the first turn advance.
    pub fn start_playing(
        &mut self,
        table: &FragmentTable,
        rng: &mut impl Rng,
    ) -> Result<TurnSchedule> {
        ensure!(
            matches!(self.game.state, GameState::Starting),
            "game {} is not starting",
            self.game.id
        );
        self.game.solo = self.game.player_count == 1;
        self.not_played.clear();
        self.game.state = GameState::Playing {
            current_fragment: String::new(),
            current_player: Ident::new(""),
            round: -1,
            time_ms: 0,
            turn: -1,
            difficulty: 1.0,
        };
        self.advance_turn(table, rng)
    }

    /// Advance one turn: bump the sequence number and difficulty, shrink
    /// the time budget, pick a fresh fragment, roll the round over when the
    /// not-played set drains, and hand the turn to a random player from it
    /// (never the same player twice in a row in multiplayer).
    pub fn advance_turn(
        &mut self,
        table: &FragmentTable,
        rng: &mut impl Rng,
    ) -> Result<TurnSchedule> {
        let solo = self.game.solo;
        let player_count = self.game.player_count;
        let GameState::Playing {
            current_fragment,
            current_player,
            round,
            time_ms,
            turn,
            difficulty,
        } = &mut self.game.state
        else {
            return Err(anyhow!("turn advance outside the playing state"));
        };

        let previous = (!current_player.as_str().is_empty()).then(|| current_player.clone());
        if let Some(prev) = &previous
            && let Some(player) = self.game.players.get_mut(prev)
            && player.state == PlayerState::Current
        {
            player.state = PlayerState::Waiting;
        }

        *turn += 1;
        *difficulty += DIFFICULTY_STEP;
        *time_ms = ((BASE_TIME_MS / difficulty.powf(0.75)).round() as u64).max(MIN_TIME_MS);

        let exclude = (!current_fragment.is_empty()).then(|| current_fragment.clone());
        *current_fragment = table.select(*difficulty, exclude.as_deref(), rng)?;

        // Departed and dead players never take another turn.
        self.not_played
            .retain(|id| self.game.players.get(id).is_some_and(Player::is_alive));
        if self.not_played.is_empty() {
            *round += 1;
            *difficulty += player_count as f64 / ROUND_BONUS_DIVISOR;
            self.not_played = self
                .game
                .players
                .values()
                .filter(|p| p.is_alive())
                .map(|p| p.id.clone())
                .collect();
        }
        ensure!(!self.not_played.is_empty(), "no alive players left to play");

        let mut index = rng.gen_range(0..self.not_played.len());
        let chosen = if !solo
            && self.not_played.len() > 1
            && previous.as_ref() == Some(&self.not_played[index])
        {
            // Reselect so the same player never goes twice in a row, then
            // return the excluded id to the pool for later this round.
            let excluded = self.not_played.remove(index);
            index = rng.gen_range(0..self.not_played.len());
            let chosen = self.not_played.remove(index);
            self.not_played.push(excluded);
            chosen
        } else {
            self.not_played.remove(index)
        };

        if let Some(player) = self.game.players.get_mut(&chosen) {
            player.state = PlayerState::Current;
        }
        *current_player = chosen.clone();

        Ok(TurnSchedule {
            turn: *turn,
            time_ms: *time_ms,
            player: chosen,
            previous: if solo { None } else { previous },
        })
    }

    /// A timeout timer fired with the turn sequence number it captured when
    /// scheduled. Anything that advanced the turn in the meantime makes the
    /// timer stale and it must be a no-op.
    pub fn handle_timeout(
        &mut self,
        turn: i64,
        table: &FragmentTable,
        rng: &mut impl Rng,
    ) -> Result<TimeoutOutcome> {
        let GameState::Playing {
            current_player,
            turn: current_turn,
            ..
        } = &self.game.state
        else {
            return Ok(TimeoutOutcome::Stale);
        };
        if *current_turn != turn {
            return Ok(TimeoutOutcome::Stale);
        }
        let player_id = current_player.clone();
        let Some(player) = self.game.players.get_mut(&player_id) else {
            return Ok(TimeoutOutcome::Stale);
        };

        player.hp = player.hp.saturating_sub(1);
        if player.hp == 0 {
            player.state = PlayerState::Dead;
            if self.game.solo {
                // Solo defeat is just running out of hp; no win transition.
                return Ok(TimeoutOutcome::Halted);
            }
            if self.game.alive_count() == 1 {
                let winner = self
                    .game
                    .players
                    .values()
                    .find(|p| p.is_alive())
                    .map(|p| p.id.clone())
                    .ok_or_else(|| anyhow!("win check found no survivor"))?;
                self.game.state = GameState::Winning {
                    winner: winner.clone(),
                };
                return Ok(TimeoutOutcome::Won(winner));
            }
        }
        Ok(TimeoutOutcome::Continued(self.advance_turn(table, rng)?))
    }

    /// Apply an answer from the current player. Correct means the
    /// normalized text contains the active fragment and is a dictionary
    /// word; anything from a non-current player is ignored.
    pub fn submit_answer(
        &mut self,
        player_id: &Ident,
        answer: &str,
        dictionary: &Dictionary,
        table: &FragmentTable,
        rng: &mut impl Rng,
    ) -> Result<AnswerOutcome> {
        if self.game.current_player_id() != Some(player_id) {
            return Ok(AnswerOutcome::Ignored);
        }
        let GameState::Playing {
            current_fragment, ..
        } = &self.game.state
        else {
            return Ok(AnswerOutcome::Ignored);
        };

        let normalized = normalize_answer(answer);
        let correct =
            normalized.contains(current_fragment.as_str()) && dictionary.contains(&normalized);

        if let Some(player) = self.game.players.get_mut(player_id) {
            player.typing = Some(answer.to_string());
            if !correct {
                player.incorrect_guesses += 1;
            }
        }

        if correct {
            Ok(AnswerOutcome::Correct(self.advance_turn(table, rng)?))
        } else {
            Ok(AnswerOutcome::Incorrect)
        }
    }

    /// Live-typing echo; only the current player's buffer is tracked.
    pub fn set_typing(&mut self, player_id: &Ident, typing: &str) -> bool {
        if self.game.current_player_id() != Some(player_id) {
            return false;
        }
        if let Some(player) = self.game.players.get_mut(player_id) {
            player.typing = Some(typing.to_string());
            true
        } else {
            false
        }
    }

    /// Delayed clear of a previous player's typing buffer.
    pub fn clear_typing(&mut self, player_id: &Ident) {
        if let Some(player) = self.game.players.get_mut(player_id) {
            player.typing = None;
        }
    }

    pub fn remove_player(
        &mut self,
        player_id: &Ident,
        table: &FragmentTable,
        rng: &mut impl Rng,
    ) -> Result<LeaveOutcome> {
        let Some(removed) = self.game.players.remove(player_id) else {
            return Ok(LeaveOutcome::Ignored);
        };
        self.game.player_count = self.game.player_count.saturating_sub(1);
        if self.game.player_count == 0 {
            return Ok(LeaveOutcome::Teardown);
        }

        let was_current = matches!(
            &self.game.state,
            GameState::Playing { current_player, .. } if current_player == player_id
        );
        self.not_played.retain(|id| id != player_id);

        if let GameState::Lobby { players_ready } = &mut self.game.state {
            if removed.state == PlayerState::Ready {
                *players_ready = players_ready.saturating_sub(1);
            }
            if *players_ready == self.game.player_count {
                self.game.state = GameState::Starting;
                return Ok(LeaveOutcome::AllReady);
            }
            return Ok(LeaveOutcome::Removed);
        }

        if was_current {
            // Don't let the game stall on a vanished current player.
            return Ok(LeaveOutcome::Advanced(self.advance_turn(table, rng)?));
        }
        Ok(LeaveOutcome::Removed)
    }
}
