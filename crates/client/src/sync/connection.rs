// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background management of the push-channel connection.
//!
//! [`ConnectionManager::open`] spawns one task that owns the transport for
//! the rest of the manager's life. The task connects, pumps frames into the
//! router, sends a keepalive on a fixed interval, and after any close or
//! failed attempt waits a fixed delay and connects again. Only disposal
//! stops it.
//!
//! ```text
//! Idle ─open─► Connecting ─ok─► Open ─close/error─► Reconnecting ─delay─► Connecting
//!                  │ fail                                 ▲
//!                  └──────────────────────────────────────┘
//! any state ─dispose─► Disposed
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use txsync_core::protocol::LIVENESS_PING;

use super::lock;
use super::router::SharedRouter;
use super::transport::{Transport, TransportError};

/// Observable lifecycle of the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created but never opened.
    Idle,
    /// A connect attempt is in progress.
    Connecting,
    /// Frames are flowing.
    Open,
    /// Waiting out the reconnect delay after a close or failed attempt.
    Reconnecting,
    /// Disposed. Terminal.
    Disposed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Disposed => "disposed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for connection manager operations.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// `open` was called on a manager that already owns a running task.
    #[error("push channel is already open")]
    AlreadyOpen,

    /// The manager has been disposed.
    #[error("push channel has been disposed")]
    Disposed,
}

/// Result type for connection manager operations.
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// Timing for the connection task.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Interval between keepalive frames while open. Zero disables keepalive.
    pub keepalive_interval: Duration,
    /// Fixed wait before every reconnect attempt.
    pub reconnect_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            keepalive_interval: Duration::from_secs(25),
            reconnect_delay: Duration::from_secs(3),
        }
    }
}

/// Owns one push-channel connection and its background task.
pub struct ConnectionManager<T: Transport + 'static> {
    config: ConnectionConfig,
    /// Present until `open` moves it into the task.
    transport: Option<T>,
    router: SharedRouter,
    state: Arc<watch::Sender<ConnectionState>>,
    attempts: Arc<AtomicU32>,
    cancel_token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<T: Transport + 'static> ConnectionManager<T> {
    /// Create a manager. Nothing happens until [`open`](Self::open).
    ///
    /// Cancelling `cancel_token` has the same effect as disposing.
    pub fn new(
        config: ConnectionConfig,
        transport: T,
        router: SharedRouter,
        cancel_token: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            config,
            transport: Some(transport),
            router,
            state: Arc::new(state),
            attempts: Arc::new(AtomicU32::new(0)),
            cancel_token,
            task: None,
        }
    }

    /// Start the connection task against `endpoint`.
    ///
    /// Returns immediately; progress is visible through [`state`](Self::state).
    ///
    /// # Errors
    ///
    /// - [`ConnectionError::Disposed`] after disposal
    /// - [`ConnectionError::AlreadyOpen`] on a second call
    pub fn open(&mut self, endpoint: &str) -> ConnectionResult<()> {
        if self.cancel_token.is_cancelled() {
            return Err(ConnectionError::Disposed);
        }
        let transport = self.transport.take().ok_or(ConnectionError::AlreadyOpen)?;

        self.state.send_replace(ConnectionState::Connecting);
        let task = ConnectionTask {
            endpoint: endpoint.to_string(),
            config: self.config.clone(),
            router: Arc::clone(&self.router),
            state: Arc::clone(&self.state),
            attempts: Arc::clone(&self.attempts),
            cancel_token: self.cancel_token.clone(),
        };
        self.task = Some(tokio::spawn(task.run(transport)));
        Ok(())
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch state transitions, e.g. to drive a connectivity indicator.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Number of connect attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Acquire)
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Stop the connection for good.
    ///
    /// Cancels any pending reconnect, stops the keepalive, closes the socket
    /// and waits for the task to finish. Safe to call more than once.
    pub async fn dispose(&mut self) {
        self.cancel_token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "connection task ended abnormally");
            }
        }
        self.transport = None;
        self.state.send_replace(ConnectionState::Disposed);
    }
}

impl<T: Transport + 'static> Drop for ConnectionManager<T> {
    fn drop(&mut self) {
        // The task observes the token and shuts itself down.
        self.cancel_token.cancel();
    }
}

/// Why a connected session ended.
enum Disconnect {
    Disposed,
    Closed,
    Failed(TransportError),
}

/// State moved into the spawned task.
struct ConnectionTask {
    endpoint: String,
    config: ConnectionConfig,
    router: SharedRouter,
    state: Arc<watch::Sender<ConnectionState>>,
    attempts: Arc<AtomicU32>,
    cancel_token: CancellationToken,
}

impl ConnectionTask {
    async fn run<T: Transport>(self, mut transport: T) {
        loop {
            if self.cancel_token.is_cancelled() {
                break;
            }

            let attempt = self.attempts.fetch_add(1, Ordering::AcqRel).saturating_add(1);
            self.state.send_replace(ConnectionState::Connecting);
            debug!(attempt, url = %self.endpoint, "connecting to push channel");

            let connected = tokio::select! {
                _ = self.cancel_token.cancelled() => break,
                result = transport.connect(&self.endpoint) => result,
            };

            match connected {
                Ok(()) => {
                    self.state.send_replace(ConnectionState::Open);
                    info!(attempt, url = %self.endpoint, "push channel open");

                    match self.pump(&mut transport).await {
                        Disconnect::Disposed => break,
                        Disconnect::Closed => info!("push channel closed by peer"),
                        Disconnect::Failed(e) => warn!(error = %e, "push channel failed"),
                    }
                    // Release the dead socket before the next attempt.
                    let _ = transport.disconnect().await;
                }
                // A failed attempt is handled exactly like a close.
                Err(e) => warn!(attempt, error = %e, "push channel connect failed"),
            }

            self.state.send_replace(ConnectionState::Reconnecting);
            debug!(delay = ?self.config.reconnect_delay, "reconnect scheduled");
            tokio::select! {
                _ = self.cancel_token.cancelled() => break,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }

        let _ = transport.disconnect().await;
        self.state.send_replace(ConnectionState::Disposed);
        debug!("connection task stopped");
    }

    /// Move frames until the connection ends. The keepalive timer lives and
    /// dies with this call, so at most one exists at a time.
    async fn pump<T: Transport>(&self, transport: &mut T) -> Disconnect {
        let keepalive_enabled = !self.config.keepalive_interval.is_zero();
        let period = if keepalive_enabled {
            self.config.keepalive_interval
        } else {
            Duration::from_secs(3600)
        };
        let mut keepalive = tokio::time::interval_at(Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.cancel_token.cancelled() => return Disconnect::Disposed,

                _ = keepalive.tick(), if keepalive_enabled => {
                    debug!("sending keepalive");
                    if let Err(e) = transport.send_text(LIVENESS_PING.to_string()).await {
                        return Disconnect::Failed(e);
                    }
                }

                frame = transport.recv() => match frame {
                    Ok(Some(text)) => {
                        // A frame that raced with disposal must not reach subscribers.
                        if self.cancel_token.is_cancelled() {
                            return Disconnect::Disposed;
                        }
                        lock(&self.router).route(&text);
                    }
                    Ok(None) => return Disconnect::Closed,
                    Err(e) => return Disconnect::Failed(e),
                },
            }
        }
    }
}
