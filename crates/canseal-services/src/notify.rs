//! Event notifier — fan-out channel for accepted frames and attacks.
//!
//! The receive loop publishes; dashboards, loggers, and tests
//! subscribe. Publishing with no subscribers is fine — events describe
//! what already happened, they never gate the pipeline.

use canseal_core::events::Event;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Event>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: Event) {
        // Err only means nobody is listening right now.
        if self.tx.send(event).is_err() {
            tracing::trace!("event published with no subscribers");
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
