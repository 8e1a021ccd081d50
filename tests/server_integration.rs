//! Integration tests for the WebSocket gateway
//!
//! A real router on a loopback listener, driven by a real WebSocket client.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use lane_duel::core::config::{DuelConfig, ServerConfig};
use lane_duel::server::{router, AppState};
use lane_duel::session::SessionManager;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

fn manager() -> Arc<SessionManager> {
    let config = DuelConfig {
        seed: Some(7),
        frame_width: 64,
        frame_height: 48,
        ..DuelConfig::default()
    };
    Arc::new(SessionManager::new(config, ServerConfig::default()))
}

async fn spawn_server(manager: Arc<SessionManager>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(AppState { manager });
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Poll until the registry holds `expected` sessions or five seconds pass
async fn wait_for_sessions(manager: &SessionManager, expected: usize) -> bool {
    for _ in 0..500 {
        if manager.len().await == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

async fn next_json<S>(ws: &mut S) -> Value
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("message within timeout")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn test_start_streams_frames_over_socket() {
    let manager = manager();
    let addr = spawn_server(manager.clone()).await;

    let (mut ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    assert!(wait_for_sessions(&manager, 1).await);

    ws.send(Message::Text(r#"{"type":"START"}"#.into()))
        .await
        .unwrap();
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["type"], "FRAME");
    assert_eq!(frame["frame"]["width"], 64);
    assert_eq!(frame["frame"]["height"], 48);
    assert!(frame["frame"]["data"].as_str().unwrap().len() > 8);
}

#[tokio::test]
async fn test_client_close_tears_down_session() {
    let manager = manager();
    let addr = spawn_server(manager.clone()).await;

    let (mut ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    assert!(wait_for_sessions(&manager, 1).await);
    ws.send(Message::Text(r#"{"type":"START"}"#.into()))
        .await
        .unwrap();
    next_json(&mut ws).await;

    ws.close(None).await.unwrap();
    assert!(wait_for_sessions(&manager, 0).await, "session outlived its socket");
}

#[tokio::test]
async fn test_abrupt_disconnect_mid_stream_tears_down_session() {
    let manager = manager();
    let addr = spawn_server(manager.clone()).await;

    let (mut ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    assert!(wait_for_sessions(&manager, 1).await);
    ws.send(Message::Text(r#"{"type":"START"}"#.into()))
        .await
        .unwrap();
    next_json(&mut ws).await;

    // No close handshake; the server only notices on its next read or write
    drop(ws);
    assert!(wait_for_sessions(&manager, 0).await, "session outlived its socket");
}

#[tokio::test]
async fn test_sessions_per_socket_are_independent() {
    let manager = manager();
    let addr = spawn_server(manager.clone()).await;

    let (mut first, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    let (second, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    assert!(wait_for_sessions(&manager, 2).await);

    drop(second);
    assert!(wait_for_sessions(&manager, 1).await);

    first
        .send(Message::Text(r#"{"type":"START"}"#.into()))
        .await
        .unwrap();
    assert_eq!(next_json(&mut first).await["type"], "FRAME");
}
