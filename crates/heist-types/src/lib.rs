//! # Heist Types Crate
//!
//! Identifiers, value objects and the `ActionRecord` that flows between the
//! session coordinator and the guard behavior engine.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every cross-subsystem type is defined here.
//! - **Validated Construction**: `Difficulty` can only hold 1..=10, so
//!   downstream crates never re-check the range.
//! - **Explicit Time**: records carry both wall-clock and session-relative
//!   timestamps; nothing reads a clock implicitly.

pub mod entities;
pub mod errors;
pub mod retry;

pub use entities::*;
pub use errors::*;
pub use retry::{retry_with_backoff, retry_with_backoff_when, RetryPolicy};
