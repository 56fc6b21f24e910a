//! # Heist Bus - Session Event Broadcast
//!
//! Carries state deltas from session tasks to connected clients and to the
//! runtime. Session tasks publish; anything interested subscribes with a
//! filter on topic and session.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Session task │                    │   Client     │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Delivery is best effort: a lagging subscriber skips events rather than
//! blocking the session. Authoritative state is always available through
//! the coordinator's snapshot read path.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{DeltaKind, EventFilter, EventTopic, GuardMove, SessionEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
        assert_eq!(InMemoryEventBus::new().capacity(), DEFAULT_CHANNEL_CAPACITY);
    }
}
