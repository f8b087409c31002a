use std::sync::Arc;
use warp::Filter;

use crate::rooms::RoomManager;
use crate::websocket::ClientManager;

pub mod config;
pub mod rooms;
pub mod websocket;

pub fn create_routes(
    clients: Arc<ClientManager>,
    rooms: RoomManager,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let clients_filter = warp::any().map({
        let clients = clients.clone();
        move || clients.clone()
    });

    let rooms_filter = warp::any().map({
        let rooms = rooms.clone();
        move || rooms.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(clients_filter)
        .and(rooms_filter)
        .map(|ws: warp::ws::Ws, clients, rooms| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, clients, rooms))
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET"]);

    websocket.or(health).with(cors).with(warp::log("rush_server"))
}
