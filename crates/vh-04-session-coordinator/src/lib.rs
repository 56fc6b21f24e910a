//! # VH-04: Session Coordinator
//!
//! Authoritative state for every running heist. Each session is owned by a
//! single task; callers talk to it through a `SessionHandle` and read the
//! latest published `SessionView` without waiting on it.
//!
//! ## Session Lifecycle
//!
//! ```text
//! [Initializing] ──activate──→ [Active] ──all puzzles + treasure goal──→ [Completed]
//!                                  │
//!                                  ├── idle, nobody connected / close ──→ [Abandoned]
//!                                  └── invariant broken / store down ───→ [Failed]
//! ```
//!
//! ## Action Pipeline
//!
//! | Step | Where | Effect |
//! |------|-------|--------|
//! | Validate | `Session::apply_action` | Role, range and puzzle checks; rejections keep the revision |
//! | Commit | `Session::apply_action` | History, telemetry routing, revision bump, completion check |
//! | Guards | session task | Retrain off-thread on cadence, then predict and move |
//! | Persist | session task | Versioned snapshot with retry; repeated failure fails the session |
//! | Settle | session task | On completion, adjudicate and settle rewards on the ledger |
//!
//! Every committed mutation strictly increases the revision. Solved puzzles
//! and collected treasures never revert, and player roles never change.

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{SessionHandle, SessionManager};
pub use config::{CoordinatorConfig, GuardCadence};
pub use domain::action::{
    ActionResult, InteractTarget, PlayerAction, ScanReport, ScannedGuard, ScannedTreasure,
};
pub use domain::blueprint::SessionBlueprint;
pub use domain::command::{CommandContext, CommandError, PuzzleHint, RoutedCommand, TreasureHint};
pub use domain::errors::{InvariantViolation, RouterError, SessionError, StoreError};
pub use domain::session::Session;
pub use domain::snapshot::{
    GuardView, PlayerView, PuzzleView, RewardReference, RewardStatus, SessionView,
    SnapshotV1, VersionedSnapshot,
};
pub use ports::{CommandRouter, SessionApi, SnapshotStore};
