//! # Session Events
//!
//! Everything a connected client or an operator can observe about a running
//! session flows through these events.

use heist_types::{
    ActionKind, ActionOutcome, GuardId, PlayerId, Position, SessionId, SessionState,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One guard's movement in a `GuardsAdvanced` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardMove {
    pub guard_id: GuardId,
    pub position: Position,
    pub confidence: f64,
    /// Player the guard is heading for, if any.
    pub tracking: Option<PlayerId>,
}

/// What changed in a `StateDelta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum DeltaKind {
    Action {
        kind: ActionKind,
        outcome: ActionOutcome,
    },
    PlayerJoined,
    PlayerLeft,
    PlayerDisconnected,
    PlayerReconnected,
}

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================
    /// Blueprint generated and the session task is running.
    SessionCreated {
        session_id: SessionId,
        difficulty: u8,
        seed: u64,
    },

    /// The session reached a terminal state.
    SessionTerminated {
        session_id: SessionId,
        state: SessionState,
        revision: u64,
    },

    // =========================================================================
    // STATE
    // =========================================================================
    /// A player-visible change was applied.
    StateDelta {
        session_id: SessionId,
        revision: u64,
        player_id: PlayerId,
        delta: DeltaKind,
        message: String,
    },

    /// Guards were retrained and moved.
    GuardsAdvanced {
        session_id: SessionId,
        revision: u64,
        guards: Vec<GuardMove>,
    },

    // =========================================================================
    // INFRASTRUCTURE
    // =========================================================================
    /// A snapshot could not be stored after all retries.
    PersistenceFailed {
        session_id: SessionId,
        revision: u64,
        consecutive_failures: u32,
        reason: String,
    },

    /// Rewards were accepted by the ledger.
    RewardSettled {
        session_id: SessionId,
        request_id: Uuid,
        transaction_ref: String,
        total: u64,
    },

    /// A settlement attempt failed. The session stays completed; when
    /// `retrying` is set the same plan is submitted again later.
    SettlementFailed {
        session_id: SessionId,
        request_id: Uuid,
        reason: String,
        retrying: bool,
    },
}

impl SessionEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::SessionCreated { .. } | Self::SessionTerminated { .. } => EventTopic::Lifecycle,
            Self::StateDelta { .. } => EventTopic::State,
            Self::GuardsAdvanced { .. } => EventTopic::Guards,
            Self::PersistenceFailed { .. } => EventTopic::Persistence,
            Self::RewardSettled { .. } | Self::SettlementFailed { .. } => EventTopic::Rewards,
        }
    }

    /// Session the event belongs to.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        match self {
            Self::SessionCreated { session_id, .. }
            | Self::SessionTerminated { session_id, .. }
            | Self::StateDelta { session_id, .. }
            | Self::GuardsAdvanced { session_id, .. }
            | Self::PersistenceFailed { session_id, .. }
            | Self::RewardSettled { session_id, .. }
            | Self::SettlementFailed { session_id, .. } => *session_id,
        }
    }

    /// Session revision the event was produced at, if it carries one.
    #[must_use]
    pub fn revision(&self) -> Option<u64> {
        match self {
            Self::SessionTerminated { revision, .. }
            | Self::StateDelta { revision, .. }
            | Self::GuardsAdvanced { revision, .. }
            | Self::PersistenceFailed { revision, .. } => Some(*revision),
            _ => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Lifecycle,
    State,
    Guards,
    Persistence,
    Rewards,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Sessions to include. Empty means all sessions.
    pub sessions: Vec<SessionId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            sessions: Vec::new(),
        }
    }

    /// Create a filter for events of one session.
    #[must_use]
    pub fn session(session_id: SessionId) -> Self {
        Self {
            topics: Vec::new(),
            sessions: vec![session_id],
        }
    }

    /// Narrow an existing filter to the given topics.
    #[must_use]
    pub fn with_topics(mut self, topics: Vec<EventTopic>) -> Self {
        self.topics = topics;
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &SessionEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let session_match = self.sessions.is_empty() || self.sessions.contains(&event.session_id());

        topic_match && session_match
    }
}
