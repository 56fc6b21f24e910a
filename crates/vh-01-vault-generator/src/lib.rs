//! # VH-01: Vault Generator
//!
//! Procedural vault layout: floor size, security level and treasure
//! placement. A pure function of `(seed, difficulty, config)`.
//!
//! ## Architecture
//!
//! - **Domain**: `Vault`, `Treasure`, `CollectedTreasure`, `VaultError`
//! - **Generator**: seeded ChaCha stream, no global randomness
//!
//! ## Generation Rules
//!
//! | Quantity | Rule |
//! |----------|------|
//! | size | uniform in `[min_size, max_size]` |
//! | treasure count | `2 × difficulty` |
//! | treasure value | `uniform(100, 1000) × difficulty` |
//! | treasure security | `uniform(1, difficulty)` |

pub mod config;
pub mod domain;
pub mod generator;

pub use config::VaultConfig;
pub use domain::entities::{CollectedTreasure, Treasure, Vault};
pub use domain::errors::VaultError;
pub use generator::{generate, VaultGenerator};
