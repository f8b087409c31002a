use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use rush_core::{Dictionary, FragmentTable};
use rush_server::{
    config::Config,
    create_routes,
    rooms::{RoomManager, RoomTiming},
    websocket::ClientManager,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting rush server...");

    let config = Config::new();

    info!("Loading word list from {}", config.wordlist_path);
    let word_list = match std::fs::read_to_string(&config.wordlist_path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::error!("Failed to read word list '{}': {}", config.wordlist_path, e);
            tracing::error!("Set WORDLIST_PATH to a newline-separated word file.");
            std::process::exit(1);
        }
    };
    let dictionary = Arc::new(Dictionary::new(&word_list));
    info!("Loaded {} words", dictionary.len());

    info!("Loading fragment table from {}", config.fragments_path);
    let fragments_json = match std::fs::read_to_string(&config.fragments_path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::error!(
                "Failed to read fragment table '{}': {}",
                config.fragments_path,
                e
            );
            tracing::error!("Set FRAGMENTS_PATH to a fragment frequency JSON file.");
            std::process::exit(1);
        }
    };
    let fragments = match FragmentTable::from_json(&fragments_json) {
        Ok(table) => Arc::new(table),
        Err(e) => {
            tracing::error!("Invalid fragment table: {e:#}");
            std::process::exit(1);
        }
    };

    let clients = Arc::new(ClientManager::new());
    let rooms = match RoomManager::new(
        clients.clone(),
        dictionary,
        fragments,
        config.machine_id,
        RoomTiming::from_config(&config),
    ) {
        Ok(rooms) => rooms,
        Err(e) => {
            tracing::error!("Invalid MACHINE_ID: {}", e);
            std::process::exit(1);
        }
    };

    let routes = create_routes(clients.clone(), rooms.clone());

    // Sweep connections that went silent without a proper close frame.
    let cleanup_clients = clients.clone();
    let cleanup_rooms = rooms.clone();
    let connection_timeout = Duration::from_secs(config.connection_timeout_seconds);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            let removed = cleanup_clients.cleanup_inactive(connection_timeout).await;
            for client in removed {
                cleanup_rooms.leave_room(&client).await;
            }
        }
    });

    info!("Server starting on {}:{}", config.host, config.port);

    let addr = (
        config.host.parse::<std::net::IpAddr>().expect("Invalid HOST"),
        config.port,
    );

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).unwrap();
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
