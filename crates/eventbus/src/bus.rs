// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic-based in-process publish/subscribe.
//!
//! Delivery is lossy: a subscriber whose bounded channel is full has the
//! event dropped and a counter incremented, rather than blocking the
//! publisher — events are UI hints, not durable state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use quaero_core::Event;

/// Default bound for a subscriber's buffer before events start dropping.
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 256;

struct Subscriber {
    id: u64,
    sender: mpsc::Sender<Event>,
}

#[derive(Default)]
struct Topics {
    by_topic: HashMap<String, Vec<Subscriber>>,
}

/// Process-wide event fanout. The subscriber list lives behind a mutex,
/// the same as the monitored-parents map in `quaero-engine`.
pub struct EventBus {
    topics: Mutex<Topics>,
    next_id: AtomicU64,
    dropped: AtomicU64,
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { topics: Mutex::new(Topics::default()), next_id: AtomicU64::new(0), dropped: AtomicU64::new(0) })
    }

    /// Subscribe to `topic` with the given channel capacity. Returns a
    /// receiver of matching events and an [`Unsubscribe`] handle.
    pub fn subscribe(self: &Arc<Self>, topic: impl Into<String>, capacity: usize) -> (mpsc::Receiver<Event>, Unsubscribe) {
        let topic = topic.into();
        let (tx, rx) = mpsc::channel(capacity);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.topics.lock().by_topic.entry(topic.clone()).or_default().push(Subscriber { id, sender: tx });
        (rx, Unsubscribe { bus: Arc::clone(self), topic, id })
    }

    /// Non-blocking fanout to every subscriber of `event.topic()`. A full
    /// subscriber buffer drops the event and increments the drop counter;
    /// publishing with zero subscribers is a no-op.
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        let topics = self.topics.lock();
        let Some(subs) = topics.by_topic.get(topic) else { return };
        for sub in subs {
            if sub.sender.try_send(event.clone()).is_err() {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(topic, subscriber_id = sub.id, "event dropped: subscriber buffer full");
            }
        }
    }

    /// Total events dropped across all subscribers since startup.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn unsubscribe(&self, topic: &str, id: u64) {
        let mut topics = self.topics.lock();
        if let Some(subs) = topics.by_topic.get_mut(topic) {
            subs.retain(|s| s.id != id);
        }
    }
}

/// Handle returned by [`EventBus::subscribe`]; calling `unsubscribe` removes
/// the subscription so future publishes no longer reach it.
pub struct Unsubscribe {
    bus: Arc<EventBus>,
    topic: String,
    id: u64,
}

impl Unsubscribe {
    pub fn unsubscribe(self) {
        self.bus.unsubscribe(&self.topic, self.id);
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
