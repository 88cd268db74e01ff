//! Websocket ingress for the OneBot channel.
//!
//! The peer opens a reverse websocket toward this process. This crate owns
//! the connection lifecycle (accept, register, read loop, cleanup) and
//! hands accepted messages to the host pipeline's [`MessageSink`]. The
//! routes are a fragment the host mounts into its API server.
//!
//! [`MessageSink`]: onebridge_channels::MessageSink

pub mod state;
pub mod ws;

use {
    axum::{Json, Router, extract::State, routing::get},
    std::sync::Arc,
};

use onebridge_channels::ChannelPlugin;

pub use state::GatewayState;

/// Routes the host mounts: the reverse-ws endpoint and a liveness probe.
pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/v11/ws", get(ws::ws_upgrade))
        .route("/v11/status", get(status))
        .with_state(state)
}

async fn status(State(state): State<Arc<GatewayState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "connected": state.plugin.probe() }))
}
