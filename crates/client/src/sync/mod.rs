// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push-channel synchronization.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ ConnectionManager│────►│  Transport  │────►│   Stream    │
//! │  (spawned task)  │◄────│   (trait)   │◄────│  endpoint   │
//! └──────────────────┘     └─────────────┘     └─────────────┘
//!          │ text frames
//!          ▼
//! ┌──────────────────┐     ┌─────────────┐
//! │  MessageRouter   │────►│ StateStore  │  (first subscriber)
//! │                  │────►│ others...   │
//! └──────────────────┘     └─────────────┘
//! ```
//!
//! - One connection per manager, reopened at a fixed delay after any close
//! - Literal `ping` keepalive while the connection is open
//! - Injectable transport trait for testing

mod connection;
mod router;
mod store;
mod transport;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use connection::{
    ConnectionConfig, ConnectionError, ConnectionManager, ConnectionResult, ConnectionState,
};
pub use router::{
    ChannelSubscriber, MessageRouter, RouteOutcome, RouterStats, SharedRouter, Subscriber,
    SubscriberError, SubscriberResult,
};
pub use store::{ApplyOutcome, ReconcilePolicy, SharedStore, StateStore, StoreSubscriber};
pub use transport::{Transport, TransportError, TransportResult, WebSocketTransport};

/// Lock a shared structure, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
pub(crate) mod test_helpers;

#[cfg(test)]
pub(crate) mod transport_tests;
