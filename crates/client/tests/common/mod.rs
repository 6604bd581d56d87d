// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-process fake of the transaction server for integration tests.
//!
//! Serves the REST endpoints and the push channel on a random port. Pushed
//! frames go to every connected stream client.

// Test helpers are shared across test binaries; not every binary uses all.
#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use txsync::SyncConfig;
use txsync_core::{NewTransaction, Status, Transaction, TransactionId};

/// User id that makes the fake reject a create as over quota.
pub const OVER_QUOTA_USER: &str = "over-quota";

#[derive(Default)]
struct Ledger {
    /// Newest first.
    transactions: Vec<Transaction>,
    keys: HashMap<String, TransactionId>,
    request_ids: Vec<String>,
    pings: usize,
    stream_clients: usize,
    next_id: u32,
    next_job: u32,
}

#[derive(Clone)]
struct FakeState {
    ledger: Arc<Mutex<Ledger>>,
    push: broadcast::Sender<String>,
}

impl FakeState {
    fn record_request(&self, headers: &HeaderMap) {
        if let Some(id) = headers
            .get(txsync::api::REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            self.ledger.lock().unwrap().request_ids.push(id.to_string());
        }
    }

    fn publish(&self, frame: serde_json::Value) {
        // No subscribers is fine; the frame is simply dropped.
        let _ = self.push.send(frame.to_string());
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

async fn list_transactions(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Transaction>> {
    state.record_request(&headers);
    let limit = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(50);
    let ledger = state.ledger.lock().unwrap();
    Json(ledger.transactions.iter().take(limit).cloned().collect())
}

async fn create_transaction(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(body): Json<NewTransaction>,
) -> Response {
    state.record_request(&headers);
    let Some(key) = headers
        .get(txsync::idempotency::IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
    else {
        return detail(StatusCode::BAD_REQUEST, "Idempotency-Key header is required");
    };
    if body.user_id == OVER_QUOTA_USER {
        return detail(StatusCode::BAD_REQUEST, "Daily quota exceeded");
    }

    let tx = {
        let mut ledger = state.ledger.lock().unwrap();
        if let Some(id) = ledger.keys.get(&key).cloned() {
            let existing = ledger.transactions.iter().find(|t| t.id == id).cloned();
            return Json(existing).into_response();
        }
        ledger.next_id += 1;
        let now = Utc::now();
        let tx = Transaction {
            id: TransactionId::new(format!("tx-{}", ledger.next_id)),
            user_id: body.user_id,
            amount: body.amount,
            kind: body.kind,
            status: Status::Pending,
            created_at: now,
            updated_at: now,
        };
        ledger.keys.insert(key, tx.id.clone());
        ledger.transactions.insert(0, tx.clone());
        tx
    };

    state.publish(json!({
        "event": "transaction.created",
        "transaction_id": tx.id,
        "status": "pending",
    }));
    Json(tx).into_response()
}

async fn process_transaction(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.record_request(&headers);
    let Some(id) = params.get("transaction_id").cloned() else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "transaction_id is required");
    };

    let (job_id, previous) = {
        let mut ledger = state.ledger.lock().unwrap();
        ledger.next_job += 1;
        let job_id = format!("job-{}", ledger.next_job);
        let Some(tx) = ledger
            .transactions
            .iter_mut()
            .find(|t| t.id.as_str() == id)
        else {
            return detail(StatusCode::NOT_FOUND, "Transaction not found");
        };
        let previous = tx.status;
        tx.status = Status::Processed;
        tx.updated_at = Utc::now();
        (job_id, previous)
    };

    state.publish(json!({
        "event": "transaction.enqueued",
        "transaction_id": id,
        "job_id": job_id,
    }));
    state.publish(json!({
        "event": "status_changed",
        "transaction_id": id,
        "old_status": previous.as_str(),
        "new_status": "processed",
        "timestamp": Utc::now().to_rfc3339(),
    }));
    Json(json!({ "job_id": job_id, "transaction_id": id, "status": "queued" })).into_response()
}

async fn health(State(state): State<FakeState>, headers: HeaderMap) -> Json<serde_json::Value> {
    state.record_request(&headers);
    Json(json!({ "status": "ok" }))
}

fn log_entry(event: &str, request_id: &str, transaction_id: Option<&str>) -> serde_json::Value {
    json!({
        "timestamp": "2026-03-01T12:00:00Z",
        "level": "info",
        "service": "api",
        "event": event,
        "request_id": request_id,
        "transaction_id": transaction_id,
        "path": "/transactions/create",
    })
}

async fn logs(State(state): State<FakeState>, headers: HeaderMap) -> Json<serde_json::Value> {
    state.record_request(&headers);
    Json(json!([
        log_entry("transaction_created", "req-1", Some("tx-1")),
        log_entry("health_checked", "req-2", None),
    ]))
}

async fn logs_grouped(
    State(state): State<FakeState>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    state.record_request(&headers);
    Json(json!({
        "req-1": [log_entry("request_received", "req-1", None), log_entry("transaction_created", "req-1", Some("tx-1"))],
    }))
}

async fn logs_for_transaction(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    state.record_request(&headers);
    Json(json!([log_entry("transaction_created", "req-1", Some(&id))]))
}

async fn logs_for_request(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    state.record_request(&headers);
    Json(json!([log_entry("request_received", &id, None)]))
}

async fn stream(State(state): State<FakeState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| stream_session(socket, state))
}

async fn stream_session(socket: WebSocket, state: FakeState) {
    let mut pushed = state.push.subscribe();
    state.ledger.lock().unwrap().stream_clients += 1;
    let (mut sink, mut source) = socket.split();

    loop {
        tokio::select! {
            frame = pushed.recv() => {
                let Ok(frame) = frame else { break };
                if sink.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) if text.as_str() == "ping" => {
                    state.ledger.lock().unwrap().pings += 1;
                    if sink.send(Message::Text("pong".into())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.ledger.lock().unwrap().stream_clients -= 1;
}

/// Fake server bound to a random local port. Stops when dropped.
pub struct FakeServer {
    addr: SocketAddr,
    state: FakeState,
    task: JoinHandle<()>,
}

impl FakeServer {
    pub async fn start() -> Self {
        let (push, _) = broadcast::channel(64);
        let state = FakeState {
            ledger: Arc::new(Mutex::new(Ledger::default())),
            push,
        };

        let app = Router::new()
            .route("/transactions", get(list_transactions))
            .route("/transactions/create", post(create_transaction))
            .route("/transactions/async-process", post(process_transaction))
            .route("/transactions/stream", get(stream))
            .route("/health", get(health))
            .route("/logs", get(logs))
            .route("/logs/grouped", get(logs_grouped))
            .route("/logs/transaction/{id}", get(logs_for_transaction))
            .route("/logs/request/{id}", get(logs_for_request))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("fake server error: {}", e);
            }
        });

        FakeServer { addr, state, task }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client config pointing at this server with short timers.
    pub fn config(&self) -> SyncConfig {
        SyncConfig {
            keepalive_interval_ms: 50,
            reconnect_delay_ms: 20,
            request_timeout_secs: 5,
            ..SyncConfig::for_base_url(self.base_url())
        }
    }

    pub fn seed(&self, tx: Transaction) {
        self.state.ledger.lock().unwrap().transactions.push(tx);
    }

    pub fn push(&self, frame: &str) {
        let _ = self.state.push.send(frame.to_string());
    }

    pub fn stored(&self) -> Vec<Transaction> {
        self.state.ledger.lock().unwrap().transactions.clone()
    }

    pub fn request_ids(&self) -> Vec<String> {
        self.state.ledger.lock().unwrap().request_ids.clone()
    }

    pub fn pings(&self) -> usize {
        self.state.ledger.lock().unwrap().pings
    }

    pub fn stream_clients(&self) -> usize {
        self.state.ledger.lock().unwrap().stream_clients
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Poll `condition` every few milliseconds, failing the test after 5s.
pub async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
