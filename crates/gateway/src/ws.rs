use {
    axum::{
        extract::{
            Query, State, WebSocketUpgrade,
            ws::{Message, WebSocket},
        },
        response::Response,
    },
    futures::{SinkExt, stream::StreamExt},
    serde::Deserialize,
    std::sync::Arc,
    tokio::sync::mpsc,
    tracing::{debug, info},
};

use {onebridge_channels::ChannelPlugin, onebridge_onebot::BotConnection};

use crate::state::GatewayState;

/// Source the inbound path parses under when the peer names none.
pub const DEFAULT_SOURCE: &str = "onebot";

#[derive(Debug, Deserialize)]
pub(crate) struct WsQuery {
    #[serde(default)]
    source: Option<String>,
}

pub(crate) async fn ws_upgrade(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let source = query.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string());
    ws.on_upgrade(move |socket| handle_connection(socket, state, source))
}

/// Handle one peer connection through its full lifecycle:
/// register → read loop → cleanup.
async fn handle_connection(socket: WebSocket, state: Arc<GatewayState>, source: String) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let conn = BotConnection::new(tx);
    let conn_id = conn.conn_id().to_string();
    info!(conn_id = %conn_id, source = %source, "onebot: peer connected");

    // Write loop: drains queued action frames onto the socket.
    let write_conn_id = conn_id.clone();
    let write_handle = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                debug!(conn_id = %write_conn_id, "onebot: write loop closed");
                break;
            }
        }
    });

    state.plugin.register_connection(conn);

    loop {
        let msg = tokio::select! {
            () = state.cancel.cancelled() => break,
            msg = ws_rx.next() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };

        let text = match msg {
            Ok(Message::Text(text)) => text.to_string(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(error) => {
                debug!(conn_id = %conn_id, error = %error, "onebot: read error");
                break;
            },
        };

        // Forwarding is decoupled from the read loop: a slow pipeline (or a
        // rejection notice waiting on its retries) never stalls receipt of
        // the next event.
        let plugin = Arc::clone(&state.plugin);
        let sink = Arc::clone(&state.sink);
        let event_source = source.clone();
        tokio::spawn(async move {
            match plugin.parse(&event_source, &text).await {
                Ok(message) => sink.dispatch(message).await,
                Err(outcome) => {
                    debug!(source = %event_source, outcome = %outcome, "onebot: event dropped");
                },
            }
        });
    }

    // A replacement connection may already own the slot; only clear our own.
    state.plugin.clear_connection(&conn_id);
    write_handle.abort();
    info!(conn_id = %conn_id, "onebot: peer disconnected");
}
