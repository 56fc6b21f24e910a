//! # Subscriptions
//!
//! A subscription yields the events matching its filter, in publish order.
//! When the subscriber falls behind, the skipped events are gone: the
//! subscription counts them and raises a resync flag so the client can
//! re-read the session snapshot before applying further deltas.

use crate::events::{EventFilter, SessionEvent};
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Event bus closed")]
    Closed,
}

/// Lag bookkeeping shared by `Subscription` and `EventStream`
#[derive(Debug, Default)]
struct Gap {
    missed: u64,
    resync: bool,
}

impl Gap {
    fn record(&mut self, skipped: u64) {
        debug!(skipped, total = self.missed + skipped, "Subscriber lagged");
        self.missed += skipped;
        self.resync = true;
    }
}

pub struct Subscription {
    receiver: broadcast::Receiver<SessionEvent>,
    filter: EventFilter,
    gap: Gap,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<SessionEvent>, filter: EventFilter) -> Self {
        Self {
            receiver,
            filter,
            gap: Gap::default(),
        }
    }

    /// Next matching event, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => self.gap.record(skipped),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event if one is already queued.
    pub fn try_recv(&mut self) -> Result<Option<SessionEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => self.gap.record(skipped),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
            }
        }
    }

    /// Events skipped because this subscriber fell behind.
    /// Counts all topics and sessions, not only matching ones.
    #[must_use]
    pub fn missed(&self) -> u64 {
        self.gap.missed
    }

    /// True once after any lag. The caller should reload the snapshot.
    pub fn take_resync(&mut self) -> bool {
        std::mem::take(&mut self.gap.resync)
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

/// `Stream` adapter over a subscription.
pub struct EventStream {
    inner: BroadcastStream<SessionEvent>,
    filter: EventFilter,
    gap: Gap,
}

impl EventStream {
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        let Subscription {
            receiver,
            filter,
            gap,
        } = subscription;
        Self {
            inner: BroadcastStream::new(receiver),
            filter,
            gap,
        }
    }

    #[must_use]
    pub fn missed(&self) -> u64 {
        self.gap.missed
    }

    pub fn take_resync(&mut self) -> bool {
        std::mem::take(&mut self.gap.resync)
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = SessionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) if self.filter.matches(&event) => {
                    return Poll::Ready(Some(event))
                }
                Poll::Ready(Some(Ok(_))) => {}
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    self.gap.record(skipped)
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{DeltaKind, EventTopic};
    use crate::publisher::{EventPublisher, InMemoryEventBus};
    use heist_types::{PlayerId, SessionId, SessionState};
    use std::time::Duration;
    use tokio::time::timeout;

    fn joined(session_id: SessionId, revision: u64) -> SessionEvent {
        SessionEvent::StateDelta {
            session_id,
            revision,
            player_id: PlayerId::new(),
            delta: DeltaKind::PlayerJoined,
            message: "joined".into(),
        }
    }

    async fn next(sub: &mut Subscription) -> SessionEvent {
        timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event")
    }

    #[tokio::test]
    async fn test_only_own_session() {
        let bus = InMemoryEventBus::new();
        let mine = SessionId::new();
        let mut sub = bus.subscribe(EventFilter::session(mine));

        bus.publish(joined(SessionId::new(), 1)).await;
        bus.publish(joined(mine, 1)).await;

        assert_eq!(next(&mut sub).await.session_id(), mine);
        assert!(matches!(sub.try_recv(), Ok(None)));
    }

    #[tokio::test]
    async fn test_only_requested_topics() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Lifecycle]));
        let id = SessionId::new();

        bus.publish(joined(id, 1)).await;
        bus.publish(SessionEvent::SessionTerminated {
            session_id: id,
            state: SessionState::Abandoned,
            revision: 2,
        })
        .await;

        assert!(matches!(
            next(&mut sub).await,
            SessionEvent::SessionTerminated { .. }
        ));
    }

    #[tokio::test]
    async fn test_lag_requests_resync() {
        let bus = InMemoryEventBus::with_capacity(2);
        let id = SessionId::new();
        let mut sub = bus.subscribe(EventFilter::session(id));

        for revision in 1..=5 {
            bus.publish(joined(id, revision)).await;
        }

        // Oldest three were overwritten
        assert_eq!(next(&mut sub).await.revision(), Some(4));
        assert_eq!(sub.missed(), 3);
        assert!(sub.take_resync());
        assert!(!sub.take_resync());
        assert_eq!(next(&mut sub).await.revision(), Some(5));
    }

    #[tokio::test]
    async fn test_dropped_subscription_detaches() {
        let bus = InMemoryEventBus::new();
        {
            let _a = bus.subscribe(EventFilter::all());
            let _b = bus.subscribe(EventFilter::all());
            assert_eq!(bus.subscriber_count(), 2);
        }
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_bus() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());
        drop(bus);
        assert_eq!(sub.try_recv(), Err(SubscriptionError::Closed));
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_event_stream() {
        use tokio_stream::StreamExt;

        let bus = InMemoryEventBus::new();
        let mine = SessionId::new();
        let mut stream = bus.event_stream(EventFilter::session(mine));

        bus.publish(joined(SessionId::new(), 1)).await;
        bus.publish(joined(mine, 7)).await;

        let received = timeout(Duration::from_millis(100), stream.next())
            .await
            .expect("timeout")
            .expect("event");
        assert_eq!(received.revision(), Some(7));
        assert_eq!(stream.missed(), 0);
        assert_eq!(EventStream::filter(&stream).sessions, vec![mine]);
    }
}
