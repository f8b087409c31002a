use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

use crate::config::Config;
use crate::websocket::connection::{Client, ClientManager};
use rush_core::{
    AnswerOutcome, Dictionary, FragmentTable, GameSession, IdentFactory, LeaveOutcome,
    ReadyOutcome, TimeoutOutcome, TurnSchedule,
};
use rush_types::{
    AVATAR_BASE, ConfigError, GameState, Ident, Player, PlayerProfile, ProfileUpdate,
    ServerMessage,
};

/// Delays the room manager owes its games: the lobby-to-playing countdown
/// and the grace period before a finished player's typing echo is wiped.
#[derive(Debug, Clone)]
pub struct RoomTiming {
    pub countdown: Duration,
    pub typing_clear: Duration,
}

impl RoomTiming {
    pub fn from_config(config: &Config) -> Self {
        Self {
            countdown: Duration::from_millis(config.countdown_ms),
            ..Self::default()
        }
    }
}

impl Default for RoomTiming {
    fn default() -> Self {
        Self {
            countdown: Duration::from_secs(3),
            typing_clear: Duration::from_secs(1),
        }
    }
}

struct RoomsInner {
    games: RwLock<HashMap<Ident, GameSession>>,
    join_codes: RwLock<HashMap<String, Ident>>,
    idents: Mutex<IdentFactory>,
    dictionary: Arc<Dictionary>,
    fragments: Arc<FragmentTable>,
    clients: Arc<ClientManager>,
    timing: RoomTiming,
}

/// Owns every live game session and drives their asynchronous side: start
/// countdowns, turn-timeout timers, and typing-buffer clears. Timers re-enter
/// the engine with the turn sequence number captured at schedule time, so a
/// timer that fires after its turn already ended is a no-op.
///
/// Cheap to clone; spawned timer tasks hold their own handle.
#[derive(Clone)]
pub struct RoomManager {
    inner: Arc<RoomsInner>,
}

impl RoomManager {
    pub fn new(
        clients: Arc<ClientManager>,
        dictionary: Arc<Dictionary>,
        fragments: Arc<FragmentTable>,
        machine_id: u32,
        timing: RoomTiming,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: Arc::new(RoomsInner {
                games: RwLock::new(HashMap::new()),
                join_codes: RwLock::new(HashMap::new()),
                idents: Mutex::new(IdentFactory::new(machine_id)?),
                dictionary,
                fragments,
                clients,
                timing,
            }),
        })
    }

    /// Mint an identity for a fresh connection.
    pub async fn mint_client_id(&self) -> Ident {
        self.inner.idents.lock().await.next()
    }

    pub async fn create_room(&self, client: &Client) {
        // Creating a room while in another one is an implicit leave.
        self.leave_room(client).await;

        let game_id = self.inner.idents.lock().await.next();
        let code = generate_join_code();
        let player = Player::new(client.client_id.clone(), client.profile.clone());
        let session = GameSession::new(game_id.clone(), code.clone(), player);
        let snapshot = session.game.clone();

        self.inner.games.write().await.insert(game_id.clone(), session);
        self.inner.join_codes.write().await.insert(code, game_id.clone());
        self.inner
            .clients
            .set_game(client.connection_id, Some(game_id.clone()))
            .await;

        info!(game = %game_id, client = %client.client_id, "room created");
        let _ = self
            .inner
            .clients
            .send_to_connection(client.connection_id, ServerMessage::CreatedRoom { game: snapshot })
            .await;
    }

    pub async fn join_room(&self, client: &Client, code: &str) {
        let target = self.inner.join_codes.read().await.get(code).cloned();
        let Some(game_id) = target else {
            let _ = self
                .inner
                .clients
                .send_to_connection(
                    client.connection_id,
                    ServerMessage::JoinedRoom {
                        game: None,
                        error: Some(404),
                    },
                )
                .await;
            return;
        };
        if client.game_id.as_ref() == Some(&game_id) {
            return;
        }

        // Joining from another room is an implicit leave of that room.
        self.leave_room(client).await;

        let joined = {
            let mut games = self.inner.games.write().await;
            let Some(session) = games.get_mut(&game_id) else {
                return;
            };
            let player = Player::new(client.client_id.clone(), client.profile.clone());
            session.add_player(player.clone());
            (session.game.clone(), player)
        };
        let (snapshot, player) = joined;

        // Existing members hear the arrival; the joiner is not indexed into
        // the game yet, so the broadcast excludes them.
        self.inner
            .clients
            .send_to_game(&game_id, ServerMessage::PlayerJoined { player })
            .await;
        self.inner
            .clients
            .set_game(client.connection_id, Some(game_id.clone()))
            .await;

        info!(game = %game_id, client = %client.client_id, "player joined room");
        let _ = self
            .inner
            .clients
            .send_to_connection(
                client.connection_id,
                ServerMessage::JoinedRoom {
                    game: Some(snapshot),
                    error: None,
                },
            )
            .await;
    }

    /// Remove a client from their current room, if any. Shared by the
    /// explicit leave message, implicit leaves, and the disconnect path.
    pub async fn leave_room(&self, client: &Client) {
        let Some(game_id) = client.game_id.clone() else {
            return;
        };
        self.inner.clients.set_game(client.connection_id, None).await;

        let mut dead_code = None;
        let followup = {
            let mut games = self.inner.games.write().await;
            let Some(session) = games.get_mut(&game_id) else {
                return;
            };
            let mut rng = StdRng::from_entropy();
            match session.remove_player(&client.client_id, &self.inner.fragments, &mut rng) {
                Ok(LeaveOutcome::Ignored) => return,
                Ok(LeaveOutcome::Teardown) => {
                    dead_code = Some(session.game.code.clone());
                    games.remove(&game_id);
                    None
                }
                Ok(LeaveOutcome::Removed) => None,
                Ok(LeaveOutcome::AllReady) => Some((session.game.clone(), None)),
                Ok(LeaveOutcome::Advanced(schedule)) => {
                    Some((session.game.clone(), Some(schedule)))
                }
                Err(e) => {
                    error!(game = %game_id, "failed to remove player: {e:#}");
                    None
                }
            }
        };

        if let Some(code) = dead_code {
            self.inner.join_codes.write().await.remove(&code);
            info!(game = %game_id, "room torn down");
            return;
        }

        self.inner
            .clients
            .send_to_game(
                &game_id,
                ServerMessage::PlayerLeft {
                    player_id: client.client_id.clone(),
                },
            )
            .await;

        match followup {
            Some((snapshot, Some(schedule))) => {
                self.inner
                    .clients
                    .send_to_game(&game_id, ServerMessage::UpdateGame { game: snapshot })
                    .await;
                self.schedule_turn(&game_id, schedule);
            }
            Some((snapshot, None)) => {
                // The departure made everyone remaining ready.
                self.inner
                    .clients
                    .send_to_game(&game_id, ServerMessage::UpdateGame { game: snapshot })
                    .await;
                self.spawn_countdown(game_id);
            }
            None => {}
        }
    }

    pub async fn set_ready(&self, client: &Client) {
        let Some(game_id) = client.game_id.clone() else {
            return;
        };
        let result = {
            let mut games = self.inner.games.write().await;
            let Some(session) = games.get_mut(&game_id) else {
                return;
            };
            match session.mark_ready(&client.client_id) {
                ReadyOutcome::Ignored => return,
                ReadyOutcome::Updated => (session.game.clone(), false),
                ReadyOutcome::AllReady => (session.game.clone(), true),
            }
        };
        let (snapshot, all_ready) = result;

        self.inner
            .clients
            .send_to_game(&game_id, ServerMessage::UpdateGame { game: snapshot })
            .await;
        if all_ready {
            self.spawn_countdown(game_id);
        }
    }

    pub async fn set_unready(&self, client: &Client) {
        let Some(game_id) = client.game_id.clone() else {
            return;
        };
        let snapshot = {
            let mut games = self.inner.games.write().await;
            let Some(session) = games.get_mut(&game_id) else {
                return;
            };
            match session.mark_unready(&client.client_id) {
                ReadyOutcome::Updated => session.game.clone(),
                _ => return,
            }
        };

        self.inner
            .clients
            .send_to_game(&game_id, ServerMessage::UpdateGame { game: snapshot })
            .await;
    }

    pub async fn set_typing(&self, client: &Client, typing: String) {
        let Some(game_id) = client.game_id.clone() else {
            return;
        };
        let accepted = {
            let mut games = self.inner.games.write().await;
            let Some(session) = games.get_mut(&game_id) else {
                return;
            };
            session.set_typing(&client.client_id, &typing)
        };

        if accepted {
            self.inner
                .clients
                .send_to_game(
                    &game_id,
                    ServerMessage::Typing {
                        player_id: client.client_id.clone(),
                        typing,
                    },
                )
                .await;
        }
    }

    pub async fn submit_answer(&self, client: &Client, answer: String) {
        let Some(game_id) = client.game_id.clone() else {
            return;
        };
        let result = {
            let mut games = self.inner.games.write().await;
            let Some(session) = games.get_mut(&game_id) else {
                return;
            };
            let mut rng = StdRng::from_entropy();
            match session.submit_answer(
                &client.client_id,
                &answer,
                &self.inner.dictionary,
                &self.inner.fragments,
                &mut rng,
            ) {
                Ok(AnswerOutcome::Ignored) => return,
                Ok(AnswerOutcome::Incorrect) => (false, None),
                Ok(AnswerOutcome::Correct(schedule)) => {
                    (true, Some((session.game.clone(), schedule)))
                }
                Err(e) => {
                    error!(game = %game_id, "failed to apply answer: {e:#}");
                    return;
                }
            }
        };
        let (correct, advance) = result;

        self.inner
            .clients
            .send_to_game(
                &game_id,
                ServerMessage::Answer {
                    player_id: client.client_id.clone(),
                    answer,
                    correct,
                },
            )
            .await;
        if let Some((snapshot, schedule)) = advance {
            self.inner
                .clients
                .send_to_game(&game_id, ServerMessage::UpdateGame { game: snapshot })
                .await;
            self.schedule_turn(&game_id, schedule);
        }
    }

    pub async fn update_profile(&self, client: &Client, update: Option<ProfileUpdate>) {
        let update = update.unwrap_or(ProfileUpdate {
            name: None,
            avatar: None,
        });
        let profile = PlayerProfile::sanitized(update.name, update.avatar, AVATAR_BASE);
        self.inner
            .clients
            .set_profile(client.connection_id, profile.clone())
            .await;

        // In a room, the change is visible to everyone immediately.
        let Some(game_id) = client.game_id.clone() else {
            return;
        };
        let snapshot = {
            let mut games = self.inner.games.write().await;
            let Some(session) = games.get_mut(&game_id) else {
                return;
            };
            let Some(player) = session.game.players.get_mut(&client.client_id) else {
                return;
            };
            player.profile = profile;
            session.game.clone()
        };

        self.inner
            .clients
            .send_to_game(&game_id, ServerMessage::UpdateGame { game: snapshot })
            .await;
    }

    fn spawn_countdown(&self, game_id: Ident) {
        let manager = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(manager.inner.timing.countdown).await;
            manager.begin_game(game_id).await;
        });
    }

    /// Countdown elapsed: move the game from starting to playing and arm
    /// the first turn timer.
    async fn begin_game(&self, game_id: Ident) {
        let started = {
            let mut games = self.inner.games.write().await;
            let Some(session) = games.get_mut(&game_id) else {
                // Everyone left during the countdown.
                return;
            };
            if !matches!(session.game.state, GameState::Starting) {
                return;
            }
            let mut rng = StdRng::from_entropy();
            match session.start_playing(&self.inner.fragments, &mut rng) {
                Ok(schedule) => (session.game.clone(), schedule),
                Err(e) => {
                    error!(game = %game_id, "failed to start game: {e:#}");
                    return;
                }
            }
        };
        let (snapshot, schedule) = started;

        info!(game = %game_id, "game started");
        self.inner
            .clients
            .send_to_game(&game_id, ServerMessage::UpdateGame { game: snapshot })
            .await;
        self.schedule_turn(&game_id, schedule);
    }

    /// Arm the timers a turn advance asks for: the turn-timeout timer, and
    /// the delayed wipe of the previous player's typing echo.
    fn schedule_turn(&self, game_id: &Ident, schedule: TurnSchedule) {
        if let Some(previous) = schedule.previous {
            let manager = self.clone();
            let game_id = game_id.clone();
            tokio::spawn(async move {
                tokio::time::sleep(manager.inner.timing.typing_clear).await;
                let mut games = manager.inner.games.write().await;
                if let Some(session) = games.get_mut(&game_id) {
                    session.clear_typing(&previous);
                }
            });
        }

        let manager = self.clone();
        let game_id = game_id.clone();
        let delay = Duration::from_millis(schedule.time_ms);
        let turn = schedule.turn;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            manager.fire_timeout(&game_id, turn).await;
        });
    }

    async fn fire_timeout(&self, game_id: &Ident, turn: i64) {
        let result = {
            let mut games = self.inner.games.write().await;
            let Some(session) = games.get_mut(game_id) else {
                return;
            };
            let mut rng = StdRng::from_entropy();
            match session.handle_timeout(turn, &self.inner.fragments, &mut rng) {
                Ok(TimeoutOutcome::Stale) => return,
                Ok(outcome) => (session.game.clone(), outcome),
                Err(e) => {
                    error!(game = %game_id, turn, "failed to apply timeout: {e:#}");
                    return;
                }
            }
        };
        let (snapshot, outcome) = result;

        self.inner
            .clients
            .send_to_game(game_id, ServerMessage::UpdateGame { game: snapshot })
            .await;
        match outcome {
            TimeoutOutcome::Continued(schedule) => self.schedule_turn(game_id, schedule),
            TimeoutOutcome::Won(winner) => {
                info!(game = %game_id, winner = %winner, "game won");
            }
            TimeoutOutcome::Halted => {
                info!(game = %game_id, "solo game over");
            }
            TimeoutOutcome::Stale => {}
        }
    }

    pub async fn game_count(&self) -> usize {
        self.inner.games.read().await.len()
    }
}

/// Three random bytes as six hex characters, same shape as game ids but
/// short enough to type.
fn generate_join_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06x}", rng.gen_range(0u32..0x0100_0000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_takes_countdown_from_config() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            machine_id: 0,
            wordlist_path: "./shared/words.txt".to_string(),
            fragments_path: "./shared/fragments.json".to_string(),
            countdown_ms: 250,
            connection_timeout_seconds: 600,
        };
        let timing = RoomTiming::from_config(&config);
        assert_eq!(timing.countdown, Duration::from_millis(250));
        assert_eq!(timing.typing_clear, RoomTiming::default().typing_clear);
    }

    #[test]
    fn test_join_code_shape() {
        for _ in 0..100 {
            let code = generate_join_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
