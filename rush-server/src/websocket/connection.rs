use rush_types::{Ident, PlayerProfile, ServerMessage};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

/// Transport-level identity of one websocket. Distinct from the [`Ident`]
/// handed to the client: the connection id never leaves the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    pub connection_id: ConnectionId,
    /// Server-minted identity; the authoritative value any claimed id in a
    /// payload is checked against.
    pub client_id: Ident,
    pub profile: PlayerProfile,
    pub game_id: Option<Ident>,
    pub connected_at: Instant,
    pub last_activity: Instant,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Client {
    pub fn new(
        connection_id: ConnectionId,
        client_id: Ident,
        profile: PlayerProfile,
    ) -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let now = Instant::now();

        let client = Self {
            connection_id,
            client_id,
            profile,
            game_id: None,
            connected_at: now,
            last_activity: now,
            sender,
        };

        (client, receiver)
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .map_err(|_| "Connection closed".to_string())
    }

    pub fn is_inactive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

/// Registry of live websocket clients and the outbound channel for each.
pub struct ClientManager {
    clients: RwLock<HashMap<ConnectionId, Client>>,
}

impl ClientManager {
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(
        &self,
        connection_id: ConnectionId,
        client_id: Ident,
        profile: PlayerProfile,
    ) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (client, receiver) = Client::new(connection_id, client_id, profile);

        let mut clients = self.clients.write().await;
        clients.insert(connection_id, client);

        receiver
    }

    pub async fn remove(&self, connection_id: ConnectionId) -> Option<Client> {
        let mut clients = self.clients.write().await;
        clients.remove(&connection_id)
    }

    pub async fn get(&self, connection_id: ConnectionId) -> Option<Client> {
        let clients = self.clients.read().await;
        clients.get(&connection_id).cloned()
    }

    pub async fn update_activity(&self, connection_id: ConnectionId) {
        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get_mut(&connection_id) {
            client.update_activity();
        }
    }

    pub async fn set_profile(&self, connection_id: ConnectionId, profile: PlayerProfile) {
        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get_mut(&connection_id) {
            client.profile = profile;
        }
    }

    pub async fn set_game(&self, connection_id: ConnectionId, game_id: Option<Ident>) {
        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get_mut(&connection_id) {
            client.game_id = game_id;
        }
    }

    pub async fn send_to_connection(
        &self,
        connection_id: ConnectionId,
        message: ServerMessage,
    ) -> Result<(), String> {
        let clients = self.clients.read().await;
        if let Some(client) = clients.get(&connection_id) {
            client.send_message(message)
        } else {
            Err("Connection not found".to_string())
        }
    }

    /// Fan a message out to every client currently indexed into a game.
    /// Closed channels are skipped; the disconnect path cleans them up.
    pub async fn send_to_game(&self, game_id: &Ident, message: ServerMessage) {
        let clients = self.clients.read().await;
        for client in clients.values() {
            if client.game_id.as_ref() == Some(game_id) {
                let _ = client.send_message(message.clone());
            }
        }
    }

    /// Drop clients that have been silent past the timeout and return them,
    /// so the caller can run the same leave flow a disconnect would.
    pub async fn cleanup_inactive(&self, timeout: Duration) -> Vec<Client> {
        let inactive: Vec<ConnectionId> = {
            let clients = self.clients.read().await;
            clients
                .values()
                .filter(|client| client.is_inactive(timeout))
                .map(|client| client.connection_id)
                .collect()
        };

        let mut removed = Vec::with_capacity(inactive.len());
        for connection_id in inactive {
            if let Some(client) = self.remove(connection_id).await {
                tracing::info!(
                    "Removing inactive connection {} after {:?} connected",
                    connection_id,
                    client.connected_at.elapsed()
                );
                removed.push(client);
            }
        }
        removed
    }

    pub async fn connection_count(&self) -> usize {
        let clients = self.clients.read().await;
        clients.len()
    }
}

impl Default for ClientManager {
    fn default() -> Self {
        Self::new()
    }
}
