use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::Ident;

pub const DEFAULT_PLAYER_NAME: &str = "anonymous";
/// Prefix for generated avatar references; the resolver behind it is
/// external to the game server.
pub const AVATAR_BASE: &str = "/rpfp/";
pub const MAX_PLAYER_NAME_LEN: usize = 16;
pub const STARTING_HP: u8 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerProfile {
    pub name: String,
    pub avatar: String,
}

impl PlayerProfile {
    /// Clamp a client-supplied profile to the allowed shape: name truncated
    /// to 16 characters, empty name replaced with the anonymous default.
    pub fn sanitized(name: Option<String>, avatar: Option<String>, avatar_base: &str) -> Self {
        let name = match name {
            Some(n) if !n.trim().is_empty() => n.chars().take(MAX_PLAYER_NAME_LEN).collect(),
            _ => DEFAULT_PLAYER_NAME.to_string(),
        };
        let avatar = avatar.unwrap_or_else(|| format!("{avatar_base}{name}"));
        Self { name, avatar }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Lobby,
    Ready,
    Current,
    Waiting,
    Dead,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: Ident,
    pub hp: u8,
    pub profile: PlayerProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typing: Option<String>,
    pub state: PlayerState,
    pub incorrect_guesses: u32,
}

impl Player {
    pub fn new(id: Ident, profile: PlayerProfile) -> Self {
        Self {
            id,
            hp: STARTING_HP,
            profile,
            typing: None,
            state: PlayerState::Lobby,
            incorrect_guesses: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_sanitization() {
        let profile = PlayerProfile::sanitized(
            Some("a".repeat(40)),
            Some("/u/pic.png".to_string()),
            "/rpfp/",
        );
        assert_eq!(profile.name.chars().count(), MAX_PLAYER_NAME_LEN);
        assert_eq!(profile.avatar, "/u/pic.png");

        let profile = PlayerProfile::sanitized(None, None, "/rpfp/");
        assert_eq!(profile.name, DEFAULT_PLAYER_NAME);
        assert_eq!(profile.avatar, "/rpfp/anonymous");

        let profile = PlayerProfile::sanitized(Some("   ".to_string()), None, "/rpfp/");
        assert_eq!(profile.name, DEFAULT_PLAYER_NAME);
    }

    #[test]
    fn test_new_player_defaults() {
        let profile = PlayerProfile::sanitized(Some("alice".to_string()), None, "/rpfp/");
        let player = Player::new(Ident::from("1a2b3c4d"), profile);
        assert_eq!(player.hp, STARTING_HP);
        assert_eq!(player.state, PlayerState::Lobby);
        assert_eq!(player.incorrect_guesses, 0);
        assert!(player.is_alive());
    }
}
