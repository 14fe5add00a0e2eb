mod lobby;
mod session;

use std::sync::Arc;

use axum::Router;
use axum::extract::ws::WebSocket;
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::lobby::{AppState, cleanup_finished_rooms, reload_config};

#[tokio::main]
/// Sets up tracing, loads the ambient config, spawns the finished-room
/// reaper, and serves the join endpoint plus a couple of operator routes.
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=trace", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .init();

    let app_state = Arc::new(AppState::default());

    if let Err(message) = reload_config(&app_state).await {
        tracing::warn!(message, "using default config, could not load HexConfig.json");
    }

    let watchdog_state = app_state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(1200));
        loop {
            interval.tick().await;
            cleanup_finished_rooms(&watchdog_state).await;
        }
    });

    let app = Router::new()
        .route("/reload", get(reload_handler))
        .route("/rooms", get(rooms_handler))
        .route("/ws/:room_id", get(websocket_handler))
        .with_state(app_state)
        .fallback_service(ServeDir::new(".").not_found_service(ServeFile::new("index.html")));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn rooms_handler(State(state): State<Arc<AppState>>) -> String {
    let rooms = state.rooms.lock().await;
    let mut lines = Vec::with_capacity(rooms.len());
    for (room_id, entry) in rooms.iter() {
        let engine = entry.engine.lock().await;
        lines.push(format!(
            "Room: {:<30} leader: {} follower: {}",
            room_id,
            engine.has_role(hex_protocol::Role::Leader),
            engine.has_role(hex_protocol::Role::Follower)
        ));
    }
    lines.join("\n")
}

async fn reload_handler(State(state): State<Arc<AppState>>) -> String {
    match reload_config(&state).await {
        Ok(()) => "Config reloaded.".to_string(),
        Err(e) => format!("Config reload failed: {e}"),
    }
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket: WebSocket| session::handle_connection(socket, state, room_id))
}
