//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: `SessionId`, `PlayerId`, `GuardId`, `PuzzleId`, `TreasureId`
//! - **Space**: `Position`, `PlayerPosition`
//! - **Rules**: `Difficulty`, `Role`
//! - **Lifecycle**: `SessionState`
//! - **Telemetry**: `ActionKind`, `ActionOutcome`, `ActionRecord`

use crate::errors::ParameterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// IDENTITY
// =============================================================================

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ParameterError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| ParameterError::MalformedIdentifier(s.to_string()))
            }
        }
    };
}

uuid_identifier!(
    /// Opaque identifier of a heist session.
    SessionId
);
uuid_identifier!(
    /// Identifier of a player inside a session.
    PlayerId
);
uuid_identifier!(
    /// Identifier of a guard inside a session.
    GuardId
);
uuid_identifier!(
    /// Identifier of a puzzle inside a session.
    PuzzleId
);
uuid_identifier!(
    /// Identifier of a treasure inside a vault.
    TreasureId
);

// =============================================================================
// SPACE
// =============================================================================

/// A point on the vault floor plan.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// True if the point lies inside a square floor of side `size`.
    pub fn is_within(&self, size: u32) -> bool {
        let limit = f64::from(size);
        self.x.is_finite()
            && self.y.is_finite()
            && (0.0..=limit).contains(&self.x)
            && (0.0..=limit).contains(&self.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Where a player stands right now, as seen by the guards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerPosition {
    pub player_id: PlayerId,
    pub position: Position,
    pub connected: bool,
}

// =============================================================================
// RULES
// =============================================================================

/// Session difficulty, always within `Difficulty::MIN..=Difficulty::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Validate and wrap a raw difficulty value.
    pub fn new(value: u8) -> Result<Self, ParameterError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ParameterError::DifficultyOutOfRange { value })
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = ParameterError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The role a player picks on join. Fixed for the lifetime of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Hacker,
    Infiltrator,
    Strategist,
    QuantumExpert,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Hacker,
        Role::Infiltrator,
        Role::Strategist,
        Role::QuantumExpert,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Hacker => "hacker",
            Role::Infiltrator => "infiltrator",
            Role::Strategist => "strategist",
            Role::QuantumExpert => "quantum_expert",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hacker" => Ok(Role::Hacker),
            "infiltrator" => Ok(Role::Infiltrator),
            "strategist" => Ok(Role::Strategist),
            "quantum_expert" | "quantum-expert" | "quantumexpert" => Ok(Role::QuantumExpert),
            other => Err(ParameterError::UnknownRole(other.to_string())),
        }
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Session lifecycle.
///
/// ```text
/// Initializing ──→ Active ──→ Completed
///       │            ├──────→ Abandoned
///       └────────────┴──────→ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Initializing,
    Active,
    Completed,
    Failed,
    Abandoned,
}

impl SessionState {
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Failed | SessionState::Abandoned
        )
    }

    /// Legal edges of the lifecycle graph. `Active → Active` is allowed.
    pub const fn can_transition_to(&self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (SessionState::Initializing, SessionState::Active)
                | (SessionState::Initializing, SessionState::Failed)
                | (SessionState::Active, SessionState::Active)
                | (SessionState::Active, SessionState::Completed)
                | (SessionState::Active, SessionState::Failed)
                | (SessionState::Active, SessionState::Abandoned)
        )
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionState::Initializing => "initializing",
            SessionState::Active => "active",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
            SessionState::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TELEMETRY
// =============================================================================

/// The fixed player action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Move,
    Scan,
    Hack,
    Interact,
}

impl ActionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Move => "move",
            ActionKind::Scan => "scan",
            ActionKind::Hack => "hack",
            ActionKind::Interact => "interact",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an applied action achieved what the player attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    Success,
    Failure,
}

impl ActionOutcome {
    pub const fn from_success(success: bool) -> Self {
        if success {
            ActionOutcome::Success
        } else {
            ActionOutcome::Failure
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Success)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ActionOutcome::Success => "success",
            ActionOutcome::Failure => "failure",
        }
    }
}

/// One applied player action. Logged into the player's history and into
/// the telemetry queue of nearby guards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub player_id: PlayerId,
    pub kind: ActionKind,
    /// Human-readable summary of the action arguments.
    pub payload: String,
    /// Wall-clock time (unix milliseconds).
    pub timestamp_ms: u64,
    /// Milliseconds since the session became active.
    pub elapsed_ms: u64,
    /// Player position after the action was applied.
    pub position: Position,
    pub outcome: ActionOutcome,
}

/// Current wall-clock time in unix milliseconds.
pub fn unix_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}
