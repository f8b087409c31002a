use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{Game, Ident, Player};

/// Partial profile as sent by clients; missing fields fall back to defaults
/// during sanitization.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// Inbound envelope: `{"method": "c2s-<action>", ...payload}`. Envelopes
/// whose method is unknown fail to parse and are dropped by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "method")]
pub enum ClientMessage {
    #[serde(rename = "c2s-updateProfile", rename_all = "camelCase")]
    UpdateProfile {
        client_id: Ident,
        profile: Option<ProfileUpdate>,
    },
    #[serde(rename = "c2s-createRoom", rename_all = "camelCase")]
    CreateRoom { client_id: Ident },
    #[serde(rename = "c2s-joinRoom", rename_all = "camelCase")]
    JoinRoom { client_id: Ident, code: String },
    #[serde(rename = "c2s-leaveRoom", rename_all = "camelCase")]
    LeaveRoom { client_id: Ident },
    #[serde(rename = "c2s-readyToGame", rename_all = "camelCase")]
    ReadyToGame { client_id: Ident },
    #[serde(rename = "c2s-unreadyToGame", rename_all = "camelCase")]
    UnreadyToGame { client_id: Ident },
    #[serde(rename = "c2s-typing", rename_all = "camelCase")]
    Typing { client_id: Ident, typing: String },
    #[serde(rename = "c2s-answer", rename_all = "camelCase")]
    Answer { client_id: Ident, answer: String },
}

impl ClientMessage {
    /// The identity the sender claims; always re-checked against the
    /// connection registry before dispatch.
    pub fn claimed_client_id(&self) -> &Ident {
        match self {
            ClientMessage::UpdateProfile { client_id, .. }
            | ClientMessage::CreateRoom { client_id }
            | ClientMessage::JoinRoom { client_id, .. }
            | ClientMessage::LeaveRoom { client_id }
            | ClientMessage::ReadyToGame { client_id }
            | ClientMessage::UnreadyToGame { client_id }
            | ClientMessage::Typing { client_id, .. }
            | ClientMessage::Answer { client_id, .. } => client_id,
        }
    }
}

/// Outbound envelope: `{"method": "s2c-<action>", ...payload}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "method")]
pub enum ServerMessage {
    #[serde(rename = "s2c-connect", rename_all = "camelCase")]
    Connect { client_id: Ident },
    #[serde(rename = "s2c-createdRoom", rename_all = "camelCase")]
    CreatedRoom { game: Game },
    #[serde(rename = "s2c-joinedRoom", rename_all = "camelCase")]
    JoinedRoom {
        #[serde(skip_serializing_if = "Option::is_none")]
        game: Option<Game>,
        /// 404 when no room matches the join code.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<u16>,
    },
    #[serde(rename = "s2c-playerJoined", rename_all = "camelCase")]
    PlayerJoined { player: Player },
    #[serde(rename = "s2c-playerLeft", rename_all = "camelCase")]
    PlayerLeft { player_id: Ident },
    #[serde(rename = "s2c-updateGame", rename_all = "camelCase")]
    UpdateGame { game: Game },
    #[serde(rename = "s2c-typing", rename_all = "camelCase")]
    Typing { player_id: Ident, typing: String },
    #[serde(rename = "s2c-answer", rename_all = "camelCase")]
    Answer {
        player_id: Ident,
        answer: String,
        correct: bool,
    },
}
