//! Core entities for the Puzzle Engine

use super::gates::GateKind;
use super::state::StateVector;
use heist_types::{PlayerId, PuzzleId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Puzzle family
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleKind {
    /// Undo a hidden gate key applied to a random state
    Encryption,
    /// Move qubit 0's value onto the last qubit
    Teleportation,
    /// Prepare a Bell pair from `|0…0⟩`
    Entanglement,
}

impl PuzzleKind {
    pub const ALL: [PuzzleKind; 3] = [
        PuzzleKind::Encryption,
        PuzzleKind::Teleportation,
        PuzzleKind::Entanglement,
    ];

    /// Gates a player may submit for this kind
    pub fn vocabulary(&self) -> Vec<GateKind> {
        match self {
            PuzzleKind::Encryption => vec![
                GateKind::Hadamard,
                GateKind::PauliX,
                GateKind::PauliZ,
                GateKind::Phase,
                GateKind::Cnot,
            ],
            PuzzleKind::Teleportation => vec![
                GateKind::Hadamard,
                GateKind::PauliX,
                GateKind::PauliZ,
                GateKind::Cnot,
            ],
            PuzzleKind::Entanglement => vec![GateKind::Hadamard, GateKind::Cnot],
        }
    }

    /// Smallest register this kind can be posed on
    pub const fn min_qubits(&self) -> u8 {
        match self {
            PuzzleKind::Entanglement => 2,
            PuzzleKind::Encryption | PuzzleKind::Teleportation => 1,
        }
    }
}

impl fmt::Display for PuzzleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PuzzleKind::Encryption => "encryption",
            PuzzleKind::Teleportation => "teleportation",
            PuzzleKind::Entanglement => "entanglement",
        };
        f.write_str(name)
    }
}

/// A generated puzzle
///
/// Immutable after generation except for the solved flag, which moves from
/// false to true at most once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Puzzle {
    pub id: PuzzleId,
    pub kind: PuzzleKind,
    pub difficulty: u8,
    pub qubit_count: u8,
    pub initial: StateVector,
    pub target: StateVector,
    /// Fidelity needed to solve
    pub threshold: f64,
    pub vocabulary: Vec<GateKind>,
    solved: bool,
    solved_by: Option<PlayerId>,
}

impl Puzzle {
    /// Assemble a puzzle from explicit states.
    ///
    /// Used by the engine and for fixtures/replays where the states are
    /// known in advance.
    pub fn custom(
        kind: PuzzleKind,
        difficulty: u8,
        initial: StateVector,
        target: StateVector,
        threshold: f64,
    ) -> Self {
        Self::with_id(PuzzleId::new(), kind, difficulty, initial, target, threshold)
    }

    /// Same as [`Puzzle::custom`] with a caller-chosen id.
    pub fn with_id(
        id: PuzzleId,
        kind: PuzzleKind,
        difficulty: u8,
        initial: StateVector,
        target: StateVector,
        threshold: f64,
    ) -> Self {
        Self {
            id,
            kind,
            difficulty,
            qubit_count: initial.qubits(),
            initial,
            target,
            threshold,
            vocabulary: kind.vocabulary(),
            solved: false,
            solved_by: None,
        }
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn solved_by(&self) -> Option<PlayerId> {
        self.solved_by
    }

    pub fn allows(&self, kind: GateKind) -> bool {
        self.vocabulary.contains(&kind)
    }

    /// Mark solved. Returns `true` only on the false → true transition.
    pub fn mark_solved(&mut self, player: PlayerId) -> bool {
        if self.solved {
            return false;
        }
        self.solved = true;
        self.solved_by = Some(player);
        true
    }
}
