// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out of decoded push frames to in-process subscribers.
//!
//! Every inbound text frame goes through [`MessageRouter::route`]. Liveness
//! frames are absorbed, malformed and unrecognized frames are logged and
//! dropped, and domain events are delivered to each subscriber in
//! registration order. A subscriber that errors or panics is logged and
//! skipped; the remaining subscribers still see the event.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use txsync_core::{decode_frame, DomainEvent, Error as CoreError, InboundFrame};

/// Error a subscriber may report for one event.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync>;

/// Result of delivering one event to one subscriber.
pub type SubscriberResult = Result<(), SubscriberError>;

/// Something that wants to see every domain event.
pub trait Subscriber: Send {
    /// Short name used in logs.
    fn name(&self) -> &str {
        "subscriber"
    }

    /// Handle one event. Errors are logged by the router and go no further.
    fn on_event(&mut self, event: &DomainEvent) -> SubscriberResult;
}

/// Adapter that turns a closure into a [`Subscriber`].
struct FnSubscriber<F> {
    name: String,
    f: F,
}

impl<F> Subscriber for FnSubscriber<F>
where
    F: FnMut(&DomainEvent) -> SubscriberResult + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&mut self, event: &DomainEvent) -> SubscriberResult {
        (self.f)(event)
    }
}

/// Forwards events into an unbounded tokio channel.
pub struct ChannelSubscriber {
    tx: mpsc::UnboundedSender<DomainEvent>,
}

impl ChannelSubscriber {
    /// Create the subscriber and the receiving half.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DomainEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelSubscriber { tx }, rx)
    }
}

impl Subscriber for ChannelSubscriber {
    fn name(&self) -> &str {
        "channel"
    }

    fn on_event(&mut self, event: &DomainEvent) -> SubscriberResult {
        self.tx
            .send(event.clone())
            .map_err(|_| "event receiver was dropped".into())
    }
}

/// What the router did with one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Liveness acknowledgement, absorbed.
    Acknowledged,
    /// Keepalive frame, absorbed.
    Keepalive,
    /// Not JSON or not an event object.
    Malformed,
    /// Well-formed JSON with an unknown tag or missing required fields.
    Unrecognized,
    /// Event fanned out to subscribers.
    Delivered { subscribers: usize, failures: usize },
}

/// Running counters over everything routed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub events_delivered: u64,
    pub acknowledgements: u64,
    pub keepalives: u64,
    pub malformed: u64,
    pub unrecognized: u64,
    pub subscriber_failures: u64,
}

/// Decodes inbound frames and dispatches events to subscribers.
#[derive(Default)]
pub struct MessageRouter {
    subscribers: Vec<Box<dyn Subscriber>>,
    stats: RouterStats,
}

/// Router shared between the connection task and the session.
pub type SharedRouter = Arc<Mutex<MessageRouter>>;

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. Delivery order follows registration order.
    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) {
        debug!(name = subscriber.name(), "subscriber registered");
        self.subscribers.push(Box::new(subscriber));
    }

    /// Register a closure as a subscriber.
    pub fn subscribe_fn<F>(&mut self, name: &str, f: F)
    where
        F: FnMut(&DomainEvent) -> SubscriberResult + Send + 'static,
    {
        self.subscribe(FnSubscriber {
            name: name.to_string(),
            f,
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn stats(&self) -> RouterStats {
        self.stats
    }

    /// Route one inbound text frame.
    pub fn route(&mut self, text: &str) -> RouteOutcome {
        match decode_frame(text) {
            Ok(InboundFrame::Ack) => {
                trace!("liveness acknowledged");
                self.stats.acknowledgements += 1;
                RouteOutcome::Acknowledged
            }
            Ok(InboundFrame::Keepalive) => {
                trace!("server keepalive");
                self.stats.keepalives += 1;
                RouteOutcome::Keepalive
            }
            Ok(InboundFrame::Event(event)) => self.dispatch(&event),
            Err(e @ (CoreError::Json(_) | CoreError::InvalidInput(_))) => {
                warn!(error = %e, frame = %preview(text), "dropping malformed frame");
                self.stats.malformed += 1;
                RouteOutcome::Malformed
            }
            Err(e) => {
                warn!(error = %e, frame = %preview(text), "dropping unrecognized event");
                self.stats.unrecognized += 1;
                RouteOutcome::Unrecognized
            }
        }
    }

    /// Deliver an already-decoded event to every subscriber.
    pub fn dispatch(&mut self, event: &DomainEvent) -> RouteOutcome {
        debug!(
            event = event.tag(),
            transaction_id = event.transaction_id().map(|id| id.as_str()),
            "dispatching event"
        );

        let mut failures = 0;
        for subscriber in &mut self.subscribers {
            let result = catch_unwind(AssertUnwindSafe(|| subscriber.on_event(event)));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    warn!(subscriber = subscriber.name(), event = event.tag(), error = %e, "subscriber failed");
                }
                Err(_) => {
                    failures += 1;
                    warn!(subscriber = subscriber.name(), event = event.tag(), "subscriber panicked");
                }
            }
        }

        self.stats.events_delivered += 1;
        self.stats.subscriber_failures += failures as u64;
        RouteOutcome::Delivered {
            subscribers: self.subscribers.len(),
            failures,
        }
    }
}

/// Truncates a frame for log output.
fn preview(text: &str) -> &str {
    const MAX: usize = 120;
    if text.len() <= MAX {
        return text;
    }
    let mut end = MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
