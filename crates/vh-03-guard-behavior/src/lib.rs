//! # VH-03: Guard Behavior Engine
//!
//! Each guard carries an online logistic-regression model that learns, from
//! player action telemetry, where and when players tend to succeed. Guards
//! head for the player the model rates most threatening.
//!
//! ## Architecture
//!
//! - **Domain**: `Guard`, `BehaviorModel`, `ObservationMemory`, `PatrolPattern`
//! - **Features**: `FeatureExtractor` (position and session time → vector)
//! - **Engine**: `GuardBehaviorEngine::update` / `predict_action`
//!
//! ## Fallback
//!
//! ```text
//! samples < min_samples ──┐
//! model not finite ───────┼──→ patrol waypoint, confidence 0.5
//! no connected players ───┘
//! otherwise ─────────────────→ argmax P(success | player), confidence = P
//! ```

pub mod config;
pub mod domain;
pub mod engine;
pub mod features;

pub use config::GuardConfig;
pub use domain::entities::{ActionSource, Guard, GuardAction};
pub use domain::errors::GuardError;
pub use domain::memory::{Observation, ObservationMemory};
pub use domain::model::BehaviorModel;
pub use domain::patrol::PatrolPattern;
pub use engine::GuardBehaviorEngine;
pub use features::{FeatureExtractor, FeatureVector, FEATURE_COUNT};

/// Confidence reported for patrol-pattern actions
pub const PATROL_CONFIDENCE: f64 = 0.5;
