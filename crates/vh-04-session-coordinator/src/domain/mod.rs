//! Domain module for the Session Coordinator

pub mod action;
pub mod actions;
pub mod blueprint;
pub mod command;
pub mod errors;
pub mod invariants;
pub mod player;
pub mod session;
pub mod snapshot;

pub use action::*;
pub use actions::Rules;
pub use blueprint::SessionBlueprint;
pub use command::*;
pub use errors::*;
pub use invariants::Fingerprint;
pub use player::{ConnectionStatus, Player};
pub use session::{GuardBatch, Session, Sweep};
pub use snapshot::*;
