// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! One live view of the remote transaction list.
//!
//! A [`Session`] owns the push-channel connection, the router, the store and
//! the mutation client, all tied to a single cancellation token. The store
//! is registered as the router's first subscriber, so by the time any other
//! subscriber sees an event the store already reflects it. Sessions are
//! independent; several may run side by side against different servers.

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::info;
use txsync_core::{DomainEvent, Transaction, TransactionId};

use crate::api::{HttpApi, TransactionApi};
use crate::config::SyncConfig;
use crate::error::Result;
use crate::mutation::MutationClient;
use crate::sync::{
    lock, ChannelSubscriber, ConnectionManager, ConnectionState, MessageRouter, RouterStats,
    SharedRouter, SharedStore, StateStore, StoreSubscriber, Subscriber, Transport,
    WebSocketTransport,
};

/// Owned bundle of connection, router, store and mutation client.
pub struct Session<T: Transport + 'static, A: TransactionApi> {
    connection: ConnectionManager<T>,
    router: SharedRouter,
    store: SharedStore,
    mutations: MutationClient<A>,
    stream_url: String,
    list_limit: usize,
    cancel_token: CancellationToken,
}

impl Session<WebSocketTransport, HttpApi> {
    /// Session over a real WebSocket and the reqwest client.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let api = HttpApi::from_config(config)?;
        Ok(Self::new(config, WebSocketTransport::new(), api))
    }
}

impl<T: Transport + 'static, A: TransactionApi> Session<T, A> {
    /// Wire the parts together. Nothing touches the network yet.
    pub fn new(config: &SyncConfig, transport: T, api: A) -> Self {
        let cancel_token = CancellationToken::new();
        let store: SharedStore = Arc::new(Mutex::new(StateStore::new(config.reconcile_policy)));

        let mut router = MessageRouter::new();
        router.subscribe(StoreSubscriber::new(
            Arc::clone(&store),
            cancel_token.clone(),
        ));
        let router: SharedRouter = Arc::new(Mutex::new(router));

        let connection = ConnectionManager::new(
            config.connection_config(),
            transport,
            Arc::clone(&router),
            cancel_token.clone(),
        );
        let mutations =
            MutationClient::new(Arc::new(api), Arc::clone(&store), cancel_token.clone());

        Self {
            connection,
            router,
            store,
            mutations,
            stream_url: config.stream_url(),
            list_limit: config.list_limit,
            cancel_token,
        }
    }

    /// Open the push channel. Returns once the connection task is running.
    pub fn open(&mut self) -> Result<()> {
        self.connection.open(&self.stream_url)?;
        info!(url = %self.stream_url, "session opened");
        Ok(())
    }

    /// Replace the store with a fresh full fetch. Returns the record count.
    pub async fn refresh(&self) -> Result<usize> {
        Ok(self.mutations.refresh(self.list_limit).await?)
    }

    /// Register a subscriber after the store.
    pub fn subscribe(&self, subscriber: impl Subscriber + 'static) {
        lock(&self.router).subscribe(subscriber);
    }

    /// Register a channel subscriber and return its receiving half.
    pub fn subscribe_channel(&self) -> mpsc::UnboundedReceiver<DomainEvent> {
        let (subscriber, rx) = ChannelSubscriber::new();
        self.subscribe(subscriber);
        rx
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe_state()
    }

    pub fn connect_attempts(&self) -> u32 {
        self.connection.attempts()
    }

    pub fn router_stats(&self) -> RouterStats {
        lock(&self.router).stats()
    }

    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    /// Copy of the current transaction list.
    pub fn snapshot(&self) -> Vec<Transaction> {
        lock(&self.store).transactions().to_vec()
    }

    pub fn transaction(&self, id: &TransactionId) -> Option<Transaction> {
        lock(&self.store).get(id).cloned()
    }

    pub fn mutations(&self) -> &MutationClient<A> {
        &self.mutations
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Tear the session down.
    ///
    /// Stops the connection, keepalive and pending reconnect. Mutations still
    /// in flight finish on the server but their results are not applied.
    pub async fn dispose(&mut self) {
        if !self.cancel_token.is_cancelled() {
            info!("session disposed");
        }
        self.cancel_token.cancel();
        self.connection.dispose().await;
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
