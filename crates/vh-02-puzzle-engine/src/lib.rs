//! # VH-02: Puzzle Engine
//!
//! Generates quantum puzzles and scores submitted gate sequences.
//!
//! ## Architecture
//!
//! - **Domain**: `StateVector` algebra, `GateOp` vocabulary, `Puzzle` entity
//! - **Engine**: `PuzzleEngine::generate` / `PuzzleEngine::score`
//!
//! ## Scoring
//!
//! ```text
//! initial ──apply(ops)──→ final
//!                           │
//!             fidelity = |⟨target|final⟩|²  ∈ [0, 1]
//!                           │
//!              solved  ⇔  fidelity ≥ threshold
//! ```
//!
//! Scoring simulates the state vector exactly; nothing is sampled, so the
//! same `(puzzle, ops)` pair always yields the same fidelity.

pub mod config;
pub mod domain;
pub mod engine;

pub use config::PuzzleConfig;
pub use domain::entities::{Puzzle, PuzzleKind};
pub use domain::errors::PuzzleError;
pub use domain::gates::{parse_operations, GateKind, GateOp};
pub use domain::state::StateVector;
pub use engine::{Evaluation, PuzzleEngine};

/// Smallest supported register
pub const MIN_QUBITS: u8 = 1;

/// Largest supported register (32 amplitudes)
pub const MAX_QUBITS: u8 = 5;
