//! Domain module for the Vault Generator

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
