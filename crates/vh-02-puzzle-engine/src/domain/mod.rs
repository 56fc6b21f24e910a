//! Domain module for the Puzzle Engine
//!
//! Contains the state-vector algebra, the gate vocabulary, puzzle entities
//! and errors.

pub mod entities;
pub mod errors;
pub mod gates;
pub mod state;

pub use entities::*;
pub use errors::*;
pub use gates::*;
pub use state::*;
