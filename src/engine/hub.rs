// src/engine/hub.rs

//! Per-owner event rooms.
//!
//! Every subscriber gets its own unbounded channel, so a slow WebSocket
//! never makes another subscriber (or a router) wait, and no event is lost
//! for a subscriber that is still connected. Closed subscribers are pruned
//! on the next publish to their room.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::trace;

use crate::engine::ExecutionEvent;
use crate::types::OwnerId;

#[derive(Debug, Default)]
pub struct EventHub {
    rooms: Mutex<HashMap<OwnerId, Vec<mpsc::UnboundedSender<ExecutionEvent>>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<OwnerId, Vec<mpsc::UnboundedSender<ExecutionEvent>>>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Join `owner`'s room. Events published after this call are delivered
    /// in publish order.
    pub fn subscribe(&self, owner: &str) -> mpsc::UnboundedReceiver<ExecutionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.rooms().entry(owner.to_string()).or_default().push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber of `owner`.
    ///
    /// Returns how many subscribers received it; zero is not an error.
    pub fn publish(&self, owner: &str, event: ExecutionEvent) -> usize {
        let mut rooms = self.rooms();
        let Some(subscribers) = rooms.get_mut(owner) else {
            trace!(owner, "no subscribers; event dropped");
            return 0;
        };

        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        let delivered = subscribers.len();
        if delivered == 0 {
            rooms.remove(owner);
        }
        delivered
    }

    pub fn subscriber_count(&self, owner: &str) -> usize {
        self.rooms()
            .get(owner)
            .map(|subscribers| subscribers.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}
