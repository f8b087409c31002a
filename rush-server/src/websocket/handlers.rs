use std::sync::Arc;
use tracing::{info, warn};

use crate::rooms::RoomManager;
use crate::websocket::connection::{ClientManager, ConnectionId};
use rush_types::ClientMessage;

/// Per-connection dispatcher. Every inbound envelope carries a claimed
/// client id; the connection registry is the authority, and a mismatch
/// drops the message without a reply.
#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    clients: Arc<ClientManager>,
    rooms: RoomManager,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        clients: Arc<ClientManager>,
        rooms: RoomManager,
    ) -> Self {
        Self {
            connection_id,
            clients,
            rooms,
        }
    }

    pub async fn handle_message(&self, message: ClientMessage) {
        self.clients.update_activity(self.connection_id).await;

        let Some(client) = self.clients.get(self.connection_id).await else {
            warn!("Message from unregistered connection {}", self.connection_id);
            return;
        };
        if client.client_id != *message.claimed_client_id() {
            warn!(
                connection = %self.connection_id,
                claimed = %message.claimed_client_id(),
                actual = %client.client_id,
                "Dropping message with mismatched client id"
            );
            return;
        }

        match message {
            ClientMessage::UpdateProfile { profile, .. } => {
                self.rooms.update_profile(&client, profile).await
            }
            ClientMessage::CreateRoom { .. } => self.rooms.create_room(&client).await,
            ClientMessage::JoinRoom { code, .. } => self.rooms.join_room(&client, &code).await,
            ClientMessage::LeaveRoom { .. } => self.rooms.leave_room(&client).await,
            ClientMessage::ReadyToGame { .. } => self.rooms.set_ready(&client).await,
            ClientMessage::UnreadyToGame { .. } => self.rooms.set_unready(&client).await,
            ClientMessage::Typing { typing, .. } => self.rooms.set_typing(&client, typing).await,
            ClientMessage::Answer { answer, .. } => self.rooms.submit_answer(&client, answer).await,
        }
    }

    /// A closed socket is a leave: the room flow runs exactly as if the
    /// client had sent one.
    pub async fn handle_disconnect(&self) {
        info!("Handling disconnect for connection {}", self.connection_id);

        if let Some(client) = self.clients.remove(self.connection_id).await {
            self.rooms.leave_room(&client).await;
        }
    }
}
