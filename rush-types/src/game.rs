use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::{Ident, Player};

/// Game state as a tagged union. On the wire this is
/// `{"type": "lobby" | "starting" | "playing" | "winning", ...}` with the
/// variant's fields inlined next to the discriminant.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GameState {
    #[serde(rename_all = "camelCase")]
    Lobby { players_ready: u32 },
    Starting,
    #[serde(rename_all = "camelCase")]
    Playing {
        current_fragment: String,
        /// Empty only inside the engine before the first turn advance
        /// assigns a player; never observed empty by clients.
        current_player: Ident,
        round: i32,
        time_ms: u64,
        /// Turn sequence number, used to fence stale timeout timers.
        turn: i64,
        difficulty: f64,
    },
    #[serde(rename_all = "camelCase")]
    Winning { winner: Ident },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: Ident,
    /// Short human-shareable join code, distinct from `id`.
    pub code: String,
    pub player_count: u32,
    pub players: HashMap<Ident, Player>,
    pub solo: bool,
    pub state: GameState,
}

impl Game {
    pub fn current_player_id(&self) -> Option<&Ident> {
        match &self.state {
            GameState::Playing { current_player, .. } if !current_player.as_str().is_empty() => {
                Some(current_player)
            }
            _ => None,
        }
    }

    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|p| p.is_alive()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_discriminant_shape() {
        let state = GameState::Lobby { players_ready: 2 };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["type"], "lobby");
        assert_eq!(json["playersReady"], 2);

        let state = GameState::Starting;
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["type"], "starting");

        let state = GameState::Playing {
            current_fragment: "ost".to_string(),
            current_player: Ident::from("1a2b3c4d"),
            round: 0,
            time_ms: 30000,
            turn: 0,
            difficulty: 1.06,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["type"], "playing");
        assert_eq!(json["currentFragment"], "ost");
        assert_eq!(json["currentPlayer"], "1a2b3c4d");

        let state = GameState::Winning {
            winner: Ident::from("1a2b3c4d"),
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["type"], "winning");
        assert_eq!(json["winner"], "1a2b3c4d");
    }

    #[test]
    fn test_state_round_trips() {
        let state = GameState::Playing {
            current_fragment: "пр".to_string(),
            current_player: Ident::from("ffff0000"),
            round: 3,
            time_ms: 12000,
            turn: 9,
            difficulty: 1.54,
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        match back {
            GameState::Playing { turn, round, .. } => {
                assert_eq!(turn, 9);
                assert_eq!(round, 3);
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }
}
