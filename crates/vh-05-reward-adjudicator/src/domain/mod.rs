//! Domain module for the Reward Adjudicator

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
