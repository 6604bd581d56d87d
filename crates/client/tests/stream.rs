// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push channel tests against a bare WebSocket server.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use std::time::Duration;

use common::wait_until;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use txsync::sync::ConnectionState;
use txsync::{Session, SyncConfig};
use txsync_core::DomainEvent;

fn config_for(port: u16) -> SyncConfig {
    SyncConfig {
        stream_url: Some(format!("ws://127.0.0.1:{}/transactions/stream", port)),
        keepalive_interval_ms: 0,
        reconnect_delay_ms: 20,
        ..SyncConfig::for_base_url("http://127.0.0.1:9")
    }
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = tokio::time::timeout(Duration::from_secs(5), listener.accept())
        .await
        .expect("client never connected")
        .unwrap();
    tokio_tungstenite::accept_async(stream).await.unwrap()
}

async fn send(ws: &mut WebSocketStream<TcpStream>, text: &str) {
    ws.send(Message::Text(text.into())).await.unwrap();
}

async fn next_event(
    events: &mut tokio::sync::mpsc::UnboundedReceiver<DomainEvent>,
) -> DomainEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("no event delivered")
        .unwrap()
}

#[tokio::test]
async fn test_noise_frames_are_absorbed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let mut session = Session::from_config(&config_for(port)).unwrap();
    let mut events = session.subscribe_channel();
    session.open().unwrap();

    let mut ws = accept(&listener).await;
    send(&mut ws, "pong").await;
    send(&mut ws, "{broken").await;
    send(&mut ws, r#"{"event":"mystery"}"#).await;
    send(&mut ws, r#"{"type":"keepalive"}"#).await;
    send(
        &mut ws,
        r#"{"event":"status_changed","transaction_id":"tx-1","old_status":"pending","new_status":"processed"}"#,
    )
    .await;

    let event = next_event(&mut events).await;
    assert_eq!(event.tag(), "status_changed");
    assert_eq!(event.transaction_id().unwrap().as_str(), "tx-1");

    let stats = session.router_stats();
    assert_eq!(stats.acknowledgements, 1);
    assert_eq!(stats.malformed, 1);
    assert_eq!(stats.unrecognized, 1);
    assert_eq!(stats.keepalives, 1);
    assert_eq!(stats.events_delivered, 1);
    // Noise never closes the connection
    assert_eq!(session.state(), ConnectionState::Open);
    assert_eq!(session.connect_attempts(), 1);

    session.dispose().await;
}

#[tokio::test]
async fn test_reconnects_after_server_closes() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let mut session = Session::from_config(&config_for(port)).unwrap();
    let mut events = session.subscribe_channel();
    session.open().unwrap();

    let mut first = accept(&listener).await;
    first.close(None).await.unwrap();
    drop(first);

    let mut second = accept(&listener).await;
    send(
        &mut second,
        r#"{"event":"transaction.enqueued","transaction_id":"tx-2","job_id":"job-1"}"#,
    )
    .await;

    let event = next_event(&mut events).await;
    assert_eq!(event.tag(), "enqueued");
    assert_eq!(session.connect_attempts(), 2);
    wait_until("open again", || session.state() == ConnectionState::Open).await;

    session.dispose().await;
}

#[tokio::test]
async fn test_keeps_retrying_until_server_appears() {
    // Reserve a port, then free it so the first attempts are refused
    let port = {
        let reserved = TcpListener::bind("127.0.0.1:0").await.unwrap();
        reserved.local_addr().unwrap().port()
    };
    let mut session = Session::from_config(&config_for(port)).unwrap();
    session.open().unwrap();

    wait_until("three refused attempts", || session.connect_attempts() >= 3).await;
    assert_ne!(session.state(), ConnectionState::Open);

    let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
    let _ws = accept(&listener).await;
    wait_until("open", || session.state() == ConnectionState::Open).await;

    session.dispose().await;
    assert_eq!(session.state(), ConnectionState::Disposed);
}

#[tokio::test]
async fn test_dispose_closes_server_side_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let mut session = Session::from_config(&config_for(port)).unwrap();
    session.open().unwrap();

    let mut ws = accept(&listener).await;
    wait_until("open", || session.state() == ConnectionState::Open).await;
    session.dispose().await;

    // The server sees a close frame or end of stream, never another frame
    let next = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("socket left open");
    assert!(matches!(next, None | Some(Ok(Message::Close(_))) | Some(Err(_))));

    // And no reconnect follows
    let again = tokio::time::timeout(Duration::from_millis(200), listener.accept()).await;
    assert!(again.is_err());
}
