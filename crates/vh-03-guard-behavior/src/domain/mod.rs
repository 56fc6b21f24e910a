//! Domain module for the Guard Behavior Engine

pub mod entities;
pub mod errors;
pub mod memory;
pub mod model;
pub mod patrol;

pub use entities::*;
pub use errors::*;
