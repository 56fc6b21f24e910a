//! # Event Publisher
//!
//! Session tasks publish through `EventPublisher`; `InMemoryEventBus` fans
//! each event out to every live subscription over a tokio broadcast channel.

use crate::events::{EventFilter, SessionEvent};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::trace;

/// Publishing port used by the session coordinator.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event. Returns how many subscriptions received it.
    async fn publish(&self, event: SessionEvent) -> usize;
}

/// Process-local bus shared by every session of a runtime.
///
/// Publishing never waits on subscribers. A subscriber that falls more than
/// `capacity` events behind skips ahead and is told to resync.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<SessionEvent>,
    capacity: usize,
    published: AtomicU64,
    /// Events published while nobody was listening
    unheard: AtomicU64,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            capacity,
            published: AtomicU64::new(0),
            unheard: AtomicU64::new(0),
        }
    }

    /// Receive events from now on, narrowed by `filter`.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        trace!(topics = ?filter.topics, sessions = filter.sessions.len(), "Subscribed");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Same as `subscribe`, as a `Stream`.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total events published since the bus was created.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn unheard(&self) -> u64 {
        self.unheard.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: SessionEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        let topic = event.topic();
        let session_id = event.session_id();
        let revision = event.revision();

        match self.sender.send(event) {
            Ok(receivers) => {
                trace!(?topic, %session_id, ?revision, receivers, "Event published");
                receivers
            }
            Err(_) => {
                self.unheard.fetch_add(1, Ordering::Relaxed);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heist_types::{SessionId, SessionState};

    fn terminated() -> SessionEvent {
        SessionEvent::SessionTerminated {
            session_id: SessionId::new(),
            state: SessionState::Completed,
            revision: 1,
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = InMemoryEventBus::new();
        assert_eq!(bus.publish(terminated()).await, 0);
        assert_eq!(bus.published(), 1);
        assert_eq!(bus.unheard(), 1);
    }

    #[tokio::test]
    async fn test_every_subscription_receives() {
        let bus = InMemoryEventBus::new();
        let _a = bus.subscribe(EventFilter::all());
        let _b = bus.subscribe(EventFilter::all());

        assert_eq!(bus.publish(terminated()).await, 2);
        assert_eq!(bus.subscriber_count(), 2);
        assert_eq!(bus.unheard(), 0);
    }

    #[test]
    fn test_capacity_at_least_one() {
        assert_eq!(InMemoryEventBus::with_capacity(16).capacity(), 16);
        assert_eq!(InMemoryEventBus::with_capacity(0).capacity(), 1);
    }
}
