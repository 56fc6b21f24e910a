//! Deterministic patrol pattern
//!
//! A rectangular loop inset from the vault walls. Each guard starts at a
//! different corner, so guards spread out before any learning happens.
//! A pattern always holds at least one waypoint and a cursor inside the
//! loop; persisted patterns are checked when deserialized.

use super::errors::GuardError;
use heist_types::Position;
use serde::{Deserialize, Serialize};

/// Closed waypoint loop with a cursor on the next waypoint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PatrolParts")]
pub struct PatrolPattern {
    waypoints: Vec<Position>,
    cursor: usize,
}

/// Unchecked wire shape of `PatrolPattern`
#[derive(Deserialize)]
struct PatrolParts {
    waypoints: Vec<Position>,
    cursor: usize,
}

impl TryFrom<PatrolParts> for PatrolPattern {
    type Error = GuardError;

    fn try_from(parts: PatrolParts) -> Result<Self, Self::Error> {
        if parts.cursor >= parts.waypoints.len() {
            return Err(GuardError::MalformedPatrol {
                waypoints: parts.waypoints.len(),
                cursor: parts.cursor,
            });
        }
        Ok(Self {
            waypoints: parts.waypoints,
            cursor: parts.cursor,
        })
    }
}

impl PatrolPattern {
    /// Perimeter loop for a square arena, starting at corner `index % 4`
    pub fn perimeter(arena_size: u32, margin: f64, index: usize) -> Result<Self, GuardError> {
        let size = f64::from(arena_size);
        if size <= 2.0 * margin {
            return Err(GuardError::ArenaTooSmall { size: arena_size });
        }
        let low = margin;
        let high = size - margin;
        let corners = [
            Position::new(low, low),
            Position::new(high, low),
            Position::new(high, high),
            Position::new(low, high),
        ];
        let waypoints = (0..corners.len())
            .map(|i| corners[(i + index) % corners.len()])
            .collect();
        Ok(Self {
            waypoints,
            cursor: 0,
        })
    }

    /// Where the guard spawns
    pub fn start(&self) -> Position {
        self.waypoints[0]
    }

    /// Waypoint the guard is currently heading for
    pub fn current_target(&self) -> Position {
        self.waypoints[self.cursor]
    }

    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.waypoints.len();
    }

    pub fn waypoints(&self) -> &[Position] {
        &self.waypoints
    }
}
