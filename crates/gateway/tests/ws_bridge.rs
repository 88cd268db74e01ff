//! Integration tests driving the ingress over a real websocket.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    futures::{SinkExt, StreamExt},
    tokio::{net::TcpListener, sync::mpsc},
    tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite},
};

use {
    onebridge_channels::{ChannelPlugin, MessageSink},
    onebridge_common::types::{IncomingMessage, Notification},
    onebridge_gateway::{GatewayState, router},
    onebridge_onebot::OnebotPlugin,
};

type PeerSocket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Records dispatched messages for assertions.
struct RecordingSink {
    tx: mpsc::UnboundedSender<IncomingMessage>,
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn dispatch(&self, message: IncomingMessage) {
        let _ = self.tx.send(message);
    }
}

async fn start_server() -> (
    SocketAddr,
    Arc<GatewayState>,
    mpsc::UnboundedReceiver<IncomingMessage>,
) {
    let plugin = Arc::new(OnebotPlugin::new());
    plugin
        .start_source("onebot", serde_json::json!({}))
        .await
        .unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    let state = GatewayState::new(plugin, Arc::new(RecordingSink { tx }));
    let app = router(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state, rx)
}

async fn connect_peer(addr: SocketAddr) -> PeerSocket {
    let (socket, _) = connect_async(format!("ws://{addr}/v11/ws"))
        .await
        .unwrap();
    socket
}

/// The upgrade and the server-side registration race; poll briefly.
async fn wait_connected(state: &GatewayState) {
    for _ in 0..100 {
        if state.plugin.probe() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("peer never registered");
}

#[tokio::test]
async fn inbound_event_reaches_the_sink() {
    let (addr, _state, mut rx) = start_server().await;
    let mut peer = connect_peer(addr).await;

    let event = r#"{"post_type":"message","message_type":"group","user_id":1,
        "group_id":9,"raw_message":"hi","sender":{"nickname":"bob"}}"#;
    peer.send(tungstenite::Message::text(event)).await.unwrap();

    let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.source, "onebot");
    assert_eq!(message.user_id, "1");
    assert_eq!(message.username.as_deref(), Some("bob"));
    assert_eq!(message.text, "hi");
}

#[tokio::test]
async fn malformed_frames_do_not_kill_the_connection() {
    let (addr, _state, mut rx) = start_server().await;
    let mut peer = connect_peer(addr).await;

    peer.send(tungstenite::Message::text("not json")).await.unwrap();
    peer.send(tungstenite::Message::text(r#"{"post_type":"meta_event"}"#))
        .await
        .unwrap();
    peer.send(tungstenite::Message::text(
        r#"{"post_type":"message","user_id":2,"raw_message":"still alive"}"#,
    ))
    .await
    .unwrap();

    let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.text, "still alive");
}

#[tokio::test]
async fn outbound_notification_reaches_the_peer() {
    let (addr, state, _rx) = start_server().await;
    let mut peer = connect_peer(addr).await;
    wait_connected(&state).await;

    let notification = Notification {
        title: "T".into(),
        text: Some("B".into()),
        user_id: Some("7".into()),
        ..Default::default()
    };
    state.plugin.send_notification(&notification).await.unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(5), peer.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let frame: serde_json::Value =
        serde_json::from_str(frame.to_text().unwrap()).unwrap();
    assert_eq!(frame["action"], "send_private_msg");
    assert_eq!(frame["params"]["user_id"], "7");
    assert_eq!(frame["params"]["message"], "\nT\nB");
    assert_eq!(frame["echo"], "123");
}

#[tokio::test]
async fn reconnecting_peer_replaces_the_connection() {
    let (addr, state, _rx) = start_server().await;
    let _first = connect_peer(addr).await;
    wait_connected(&state).await;

    let mut second = connect_peer(addr).await;
    // Sends now go to the reconnected peer, not the abandoned socket. The
    // replacement registration races the first send, which may still land
    // on the old socket and resolves independently there; retry until a
    // frame reaches the new socket.
    let notification = Notification {
        title: "T".into(),
        user_id: Some("7".into()),
        ..Default::default()
    };
    let mut frame = None;
    for _ in 0..25 {
        state.plugin.send_notification(&notification).await.unwrap();
        match tokio::time::timeout(Duration::from_millis(200), second.next()).await {
            Ok(Some(Ok(received))) => {
                frame = Some(received);
                break;
            },
            Ok(_) => panic!("second connection closed unexpectedly"),
            Err(_) => continue,
        }
    }
    let frame = frame.expect("frame never reached the reconnected peer");
    let frame: serde_json::Value =
        serde_json::from_str(frame.to_text().unwrap()).unwrap();
    assert_eq!(frame["params"]["user_id"], "7");
}

#[tokio::test]
async fn disconnect_clears_liveness() {
    let (addr, state, _rx) = start_server().await;
    let mut peer = connect_peer(addr).await;
    wait_connected(&state).await;

    peer.close(None).await.unwrap();
    for _ in 0..100 {
        if !state.plugin.probe() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("registry still holds the closed connection");
}

#[tokio::test]
async fn shutdown_drops_the_peer_and_fails_sends() {
    let (addr, state, _rx) = start_server().await;
    let mut peer = connect_peer(addr).await;
    wait_connected(&state).await;

    state.shutdown();
    assert!(!state.plugin.probe());

    let notification = Notification {
        title: "T".into(),
        user_id: Some("7".into()),
        ..Default::default()
    };
    assert!(state.plugin.send_notification(&notification).await.is_err());

    // The server side tears the socket down; the client observes the end
    // of the stream.
    let ended = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match peer.next().await {
                None | Some(Err(_)) => break,
                Some(Ok(tungstenite::Message::Close(_))) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "peer socket never closed after shutdown");
}
