// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the transport module.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::transport::{Transport, TransportError, TransportFuture};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use txsync_core::protocol::LIVENESS_PING;

/// A frame scripted by the test for the mock peer to deliver.
#[derive(Debug)]
pub enum MockFrame {
    Text(String),
    Close,
    Error(String),
}

#[derive(Default)]
struct MockShared {
    connects: u32,
    disconnects: u32,
    failing_connects: u32,
    sent: Vec<String>,
}

/// Mock transport for testing without real sockets.
///
/// Frames pushed through the paired [`MockRemote`] are delivered by `recv`
/// in order. With nothing queued `recv` stays pending, like an idle socket.
pub struct MockTransport {
    connected: bool,
    shared: Arc<Mutex<MockShared>>,
    incoming: mpsc::UnboundedReceiver<MockFrame>,
}

/// Test-side handle that scripts the peer and inspects what was sent.
#[derive(Clone)]
pub struct MockRemote {
    shared: Arc<Mutex<MockShared>>,
    incoming: mpsc::UnboundedSender<MockFrame>,
}

pub fn mock_pair() -> (MockTransport, MockRemote) {
    let shared = Arc::new(Mutex::new(MockShared::default()));
    let (tx, rx) = mpsc::unbounded_channel();
    let transport = MockTransport {
        connected: false,
        shared: Arc::clone(&shared),
        incoming: rx,
    };
    (
        transport,
        MockRemote {
            shared,
            incoming: tx,
        },
    )
}

// Sends are fire-and-forget: once the transport is dropped (e.g. after
// dispose) frames simply go nowhere, like a peer writing to a dead socket.
impl MockRemote {
    pub fn push_text(&self, text: &str) {
        let _ = self.incoming.send(MockFrame::Text(text.to_string()));
    }

    pub fn close(&self) {
        let _ = self.incoming.send(MockFrame::Close);
    }

    pub fn fail_receive(&self, reason: &str) {
        let _ = self.incoming.send(MockFrame::Error(reason.to_string()));
    }

    /// Make the next `n` connect attempts fail.
    pub fn fail_next_connects(&self, n: u32) {
        self.shared.lock().unwrap().failing_connects = n;
    }

    pub fn connects(&self) -> u32 {
        self.shared.lock().unwrap().connects
    }

    pub fn disconnects(&self) -> u32 {
        self.shared.lock().unwrap().disconnects
    }

    pub fn sent(&self) -> Vec<String> {
        self.shared.lock().unwrap().sent.clone()
    }

    pub fn keepalives(&self) -> usize {
        self.sent().iter().filter(|f| *f == LIVENESS_PING).count()
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, _url: &str) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let mut shared = self.shared.lock().unwrap();
            shared.connects += 1;
            if shared.failing_connects > 0 {
                shared.failing_connects -= 1;
                return Err(TransportError::ConnectionFailed("mock refused".into()));
            }
            drop(shared);
            self.connected = true;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if self.connected {
                self.shared.lock().unwrap().disconnects += 1;
            }
            self.connected = false;
            Ok(())
        })
    }

    fn send_text(&mut self, text: String) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if !self.connected {
                return Err(TransportError::ConnectionClosed);
            }
            self.shared.lock().unwrap().sent.push(text);
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<String>> {
        Box::pin(async move {
            if !self.connected {
                return Err(TransportError::ConnectionClosed);
            }
            match self.incoming.recv().await {
                Some(MockFrame::Text(text)) => Ok(Some(text)),
                Some(MockFrame::Close) => {
                    self.connected = false;
                    Ok(None)
                }
                Some(MockFrame::Error(reason)) => {
                    self.connected = false;
                    Err(TransportError::ReceiveFailed(reason))
                }
                None => std::future::pending().await,
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[tokio::test]
async fn test_mock_connect_and_disconnect() {
    let (mut transport, remote) = mock_pair();
    assert!(!transport.is_connected());

    transport.connect("ws://localhost:1234").await.unwrap();
    assert!(transport.is_connected());

    transport.disconnect().await.unwrap();
    assert!(!transport.is_connected());
    assert_eq!(remote.connects(), 1);
    assert_eq!(remote.disconnects(), 1);
}

#[tokio::test]
async fn test_mock_delivers_frames_in_order_then_close() {
    let (mut transport, remote) = mock_pair();
    transport.connect("ws://test").await.unwrap();

    remote.push_text("first");
    remote.push_text("second");
    remote.close();

    assert_eq!(transport.recv().await.unwrap().as_deref(), Some("first"));
    assert_eq!(transport.recv().await.unwrap().as_deref(), Some("second"));
    assert_eq!(transport.recv().await.unwrap(), None);
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn test_mock_records_sent_frames() {
    let (mut transport, remote) = mock_pair();
    transport.connect("ws://test").await.unwrap();

    transport.send_text("ping".into()).await.unwrap();
    transport.send_text("hello".into()).await.unwrap();

    assert_eq!(remote.sent(), vec!["ping", "hello"]);
    assert_eq!(remote.keepalives(), 1);
}

#[tokio::test]
async fn test_mock_send_requires_connection() {
    let (mut transport, _remote) = mock_pair();
    let result = transport.send_text("ping".into()).await;
    assert!(matches!(result, Err(TransportError::ConnectionClosed)));
}

#[tokio::test]
async fn test_mock_connect_failures_are_counted() {
    let (mut transport, remote) = mock_pair();
    remote.fail_next_connects(2);

    assert!(transport.connect("ws://test").await.is_err());
    assert!(transport.connect("ws://test").await.is_err());
    assert!(transport.connect("ws://test").await.is_ok());
    assert_eq!(remote.connects(), 3);
}

#[tokio::test]
async fn test_websocket_transport_starts_disconnected() {
    let mut transport = super::transport::WebSocketTransport::new();
    assert!(!transport.is_connected());

    let result = transport.send_text("ping".into()).await;
    assert!(matches!(result, Err(TransportError::ConnectionClosed)));

    let result = transport.recv().await;
    assert!(matches!(result, Err(TransportError::ConnectionClosed)));

    // Disconnecting an unconnected transport is a no-op
    transport.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_websocket_transport_reports_refused_connection() {
    // Grab a free port, then release it so nothing is listening there
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut transport = super::transport::WebSocketTransport::new();
    let result = transport
        .connect(&format!("ws://{}/transactions/stream", addr))
        .await;
    assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
    assert!(!transport.is_connected());
}
