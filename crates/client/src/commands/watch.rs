// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use tracing::warn;

use crate::config::SyncConfig;
use crate::display::{format_event, format_transaction_line};
use crate::error::Result;
use crate::session::Session;

/// Follow the push channel until interrupted.
///
/// Prints the current list, then one line per event. A failed initial fetch
/// is reported but does not stop the stream.
pub async fn run(config: &SyncConfig, no_refresh: bool) -> Result<()> {
    let mut session = Session::from_config(config)?;
    let mut events = session.subscribe_channel();
    let mut state = session.state_changes();

    if !no_refresh {
        match session.refresh().await {
            Ok(_) => {
                for tx in session.snapshot() {
                    println!("{}", format_transaction_line(&tx));
                }
            }
            Err(e) => warn!(error = %e, "initial fetch failed"),
        }
    }

    session.open()?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                eprintln!("connection: {}", current);
            }
            Some(event) = events.recv() => {
                println!("{}", format_event(&event));
            }
        }
    }

    session.dispose().await;
    Ok(())
}
