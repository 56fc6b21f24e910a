//! Puzzle Engine
//!
//! Generation takes the random source as a parameter; scoring takes none.

use crate::config::PuzzleConfig;
use crate::domain::entities::{Puzzle, PuzzleKind};
use crate::domain::errors::PuzzleError;
use crate::domain::gates::{GateKind, GateOp};
use crate::domain::state::StateVector;
use crate::{MAX_QUBITS, MIN_QUBITS};
use heist_types::PuzzleId;
use rand::seq::SliceRandom;
use rand::Rng;
use std::f64::consts::FRAC_PI_4;
use tracing::debug;
use uuid::Builder;

/// Result of scoring a submission
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub fidelity: f64,
    pub passed: bool,
}

/// Puzzle generation and scoring
#[derive(Clone, Debug, Default)]
pub struct PuzzleEngine {
    config: PuzzleConfig,
}

impl PuzzleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PuzzleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PuzzleConfig {
        &self.config
    }

    fn validate_parameters(difficulty: u8, qubit_count: u8) -> Result<(), PuzzleError> {
        if !(1..=10).contains(&difficulty) {
            return Err(PuzzleError::InvalidDifficulty(difficulty));
        }
        if !(MIN_QUBITS..=MAX_QUBITS).contains(&qubit_count) {
            return Err(PuzzleError::InvalidQubitCount(qubit_count));
        }
        Ok(())
    }

    /// Generate a puzzle of a uniformly random kind.
    ///
    /// Entanglement needs two qubits; on a single qubit the draw is uniform
    /// over the remaining kinds.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        difficulty: u8,
        qubit_count: u8,
    ) -> Result<Puzzle, PuzzleError> {
        Self::validate_parameters(difficulty, qubit_count)?;

        let kinds: Vec<PuzzleKind> = PuzzleKind::ALL
            .into_iter()
            .filter(|k| k.min_qubits() <= qubit_count)
            .collect();
        // Non-empty: encryption and teleportation accept one qubit
        let kind = kinds[rng.gen_range(0..kinds.len())];

        self.generate_kind(rng, kind, difficulty, qubit_count)
    }

    /// Generate a puzzle of a specific kind.
    pub fn generate_kind<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        kind: PuzzleKind,
        difficulty: u8,
        qubit_count: u8,
    ) -> Result<Puzzle, PuzzleError> {
        Self::validate_parameters(difficulty, qubit_count)?;
        if qubit_count < kind.min_qubits() {
            return Err(PuzzleError::InvalidQubitCount(qubit_count));
        }

        let (initial, target) = match kind {
            PuzzleKind::Encryption => {
                let initial = StateVector::random(qubit_count, rng);
                let key = self.random_key(rng, qubit_count, self.config.key_length_for(difficulty));
                let mut target = initial.clone();
                for op in &key {
                    op.apply(&mut target);
                }
                (initial, target)
            }
            PuzzleKind::Entanglement => (
                StateVector::zero(qubit_count),
                StateVector::bell_pair(qubit_count),
            ),
            PuzzleKind::Teleportation => {
                let dim = 1usize << qubit_count;
                // Qubit 0 always carries a 1 so the target differs from the start
                let start = rng.gen_range(0..dim) | 1;
                (
                    StateVector::basis(qubit_count, start),
                    StateVector::basis(qubit_count, teleported_index(start, qubit_count)),
                )
            }
        };

        let puzzle = Puzzle::with_id(
            puzzle_id(rng),
            kind,
            difficulty,
            initial,
            target,
            self.config.threshold_for(difficulty),
        );

        debug!(
            puzzle_id = %puzzle.id,
            kind = %kind,
            difficulty,
            qubit_count,
            threshold = puzzle.threshold,
            "Puzzle generated"
        );

        Ok(puzzle)
    }

    /// Hidden gate key for encryption puzzles
    fn random_key<R: Rng + ?Sized>(&self, rng: &mut R, qubits: u8, length: usize) -> Vec<GateOp> {
        let mut families = vec![
            GateKind::Hadamard,
            GateKind::PauliX,
            GateKind::PauliZ,
            GateKind::Phase,
        ];
        if qubits >= 2 {
            families.push(GateKind::Cnot);
        }

        (0..length)
            .map(|_| {
                let qubit = rng.gen_range(0..qubits);
                // Non-empty by construction
                match families.choose(&mut *rng).copied().unwrap_or(GateKind::Hadamard) {
                    GateKind::Hadamard => GateOp::Hadamard { qubit },
                    GateKind::PauliX => GateOp::PauliX { qubit },
                    GateKind::PauliZ => GateOp::PauliZ { qubit },
                    GateKind::Phase => GateOp::Phase {
                        qubit,
                        theta: FRAC_PI_4 * f64::from(rng.gen_range(1u8..8)),
                    },
                    GateKind::Cnot => {
                        let offset = rng.gen_range(1..qubits);
                        GateOp::Cnot {
                            control: qubit,
                            target: (qubit + offset) % qubits,
                        }
                    }
                }
            })
            .collect()
    }

    /// Apply `operations` to the puzzle's initial state and return
    /// `|⟨target|final⟩|²`.
    ///
    /// Pure: identical inputs always give identical fidelity.
    pub fn score(&self, puzzle: &Puzzle, operations: &[GateOp]) -> Result<f64, PuzzleError> {
        if operations.len() > self.config.max_operations {
            return Err(PuzzleError::TooManyOperations {
                len: operations.len(),
                max: self.config.max_operations,
            });
        }

        for op in operations {
            if !puzzle.allows(op.kind()) {
                return Err(PuzzleError::InvalidOperation {
                    op: op.to_string(),
                    reason: format!("gate not allowed for {} puzzles", puzzle.kind),
                });
            }
            op.validate(puzzle.qubit_count)?;
        }

        let mut state = puzzle.initial.clone();
        for op in operations {
            op.apply(&mut state);
        }

        puzzle.target.fidelity(&state)
    }

    /// Score and compare against the puzzle's threshold
    pub fn evaluate(&self, puzzle: &Puzzle, operations: &[GateOp]) -> Result<Evaluation, PuzzleError> {
        let fidelity = self.score(puzzle, operations)?;
        Ok(Evaluation {
            fidelity,
            passed: fidelity >= puzzle.threshold,
        })
    }
}

/// Puzzle ids come from the caller's stream so seeded sessions replay exactly.
fn puzzle_id<R: Rng + ?Sized>(rng: &mut R) -> PuzzleId {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    PuzzleId::from_uuid(Builder::from_random_bytes(bytes).into_uuid())
}

/// Basis index after moving bit 0 onto the last qubit
fn teleported_index(index: usize, qubits: u8) -> usize {
    if qubits == 1 {
        return index ^ 1;
    }
    let last = 1usize << (qubits - 1);
    let value = index & 1;
    (index & !1 & !last) | (value * last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(2024)
    }

    #[test]
    fn test_same_seed_same_puzzle_id() {
        let engine = PuzzleEngine::new();
        let a = engine.generate(&mut rng(), 3, 2).unwrap();
        let b = engine.generate(&mut rng(), 3, 2).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.0.get_version_num(), 4);

        let other = engine.generate(&mut ChaCha8Rng::seed_from_u64(7), 3, 2).unwrap();
        assert_ne!(a.id, other.id);
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        let engine = PuzzleEngine::new();
        assert_eq!(
            engine.generate(&mut rng(), 0, 2).unwrap_err(),
            PuzzleError::InvalidDifficulty(0)
        );
        assert_eq!(
            engine.generate(&mut rng(), 5, 6).unwrap_err(),
            PuzzleError::InvalidQubitCount(6)
        );
        assert_eq!(
            engine.generate(&mut rng(), 5, 0).unwrap_err(),
            PuzzleError::InvalidQubitCount(0)
        );
    }

    #[test]
    fn test_single_qubit_never_entanglement() {
        let engine = PuzzleEngine::new();
        let mut rng = rng();
        for _ in 0..50 {
            let puzzle = engine.generate(&mut rng, 4, 1).unwrap();
            assert_ne!(puzzle.kind, PuzzleKind::Entanglement);
        }
    }

    #[test]
    fn test_all_kinds_appear() {
        let engine = PuzzleEngine::new();
        let mut rng = rng();
        let kinds: Vec<PuzzleKind> = (0..60)
            .map(|_| engine.generate(&mut rng, 4, 3).unwrap().kind)
            .collect();
        for kind in PuzzleKind::ALL {
            assert!(kinds.contains(&kind), "{kind} never generated");
        }
    }

    #[test]
    fn test_entanglement_solution() {
        let engine = PuzzleEngine::new();
        let puzzle = engine
            .generate_kind(&mut rng(), PuzzleKind::Entanglement, 3, 2)
            .unwrap();
        let ops = [
            GateOp::Hadamard { qubit: 0 },
            GateOp::Cnot {
                control: 0,
                target: 1,
            },
        ];

        let evaluation = engine.evaluate(&puzzle, &ops).unwrap();
        assert!((evaluation.fidelity - 1.0).abs() < 1e-9);
        assert!(evaluation.passed);

        let empty = engine.evaluate(&puzzle, &[]).unwrap();
        assert!((empty.fidelity - 0.5).abs() < 1e-9);
        assert!(!empty.passed);
    }

    #[test]
    fn test_teleportation_solution() {
        let engine = PuzzleEngine::new();
        let puzzle = engine
            .generate_kind(&mut rng(), PuzzleKind::Teleportation, 5, 3)
            .unwrap();

        // Recover the start index from the basis state
        let start = puzzle
            .initial
            .amplitudes()
            .iter()
            .position(|a| a.norm_sqr() > 0.5)
            .unwrap();
        let mut ops = vec![GateOp::Cnot {
            control: 0,
            target: 2,
        }];
        if start & 0b100 != 0 {
            // Last qubit started at 1: the CNOT cleared it, set it again
            ops.push(GateOp::PauliX { qubit: 2 });
        }
        ops.push(GateOp::PauliX { qubit: 0 });

        let fidelity = engine.score(&puzzle, &ops).unwrap();
        assert!((fidelity - 1.0).abs() < 1e-9, "fidelity {fidelity}");
    }

    #[test]
    fn test_encryption_allows_phase_and_scores_in_range() {
        let engine = PuzzleEngine::new();
        let puzzle = engine
            .generate_kind(&mut rng(), PuzzleKind::Encryption, 1, 1)
            .unwrap();
        assert!(puzzle.vocabulary.contains(&GateKind::Phase));
        let identity = engine.score(&puzzle, &[]).unwrap();
        assert!((0.0..=1.0).contains(&identity));
    }

    #[test]
    fn test_score_is_pure() {
        let engine = PuzzleEngine::new();
        let puzzle = engine
            .generate_kind(&mut rng(), PuzzleKind::Encryption, 7, 3)
            .unwrap();
        let ops = [
            GateOp::Hadamard { qubit: 1 },
            GateOp::Phase {
                qubit: 2,
                theta: 0.3,
            },
            GateOp::Cnot {
                control: 2,
                target: 0,
            },
        ];

        let first = engine.score(&puzzle, &ops).unwrap();
        for _ in 0..10 {
            assert_eq!(engine.score(&puzzle, &ops).unwrap(), first);
        }
        assert!((0.0..=1.0).contains(&first));
    }

    #[test]
    fn test_rejects_gate_outside_vocabulary() {
        let engine = PuzzleEngine::new();
        let puzzle = engine
            .generate_kind(&mut rng(), PuzzleKind::Entanglement, 3, 2)
            .unwrap();
        let result = engine.score(&puzzle, &[GateOp::PauliX { qubit: 0 }]);
        assert!(matches!(result, Err(PuzzleError::InvalidOperation { .. })));
    }

    #[test]
    fn test_rejects_too_many_operations() {
        let engine = PuzzleEngine::new();
        let puzzle = engine
            .generate_kind(&mut rng(), PuzzleKind::Entanglement, 3, 2)
            .unwrap();
        let ops = vec![GateOp::Hadamard { qubit: 0 }; 129];
        assert!(matches!(
            engine.score(&puzzle, &ops),
            Err(PuzzleError::TooManyOperations { .. })
        ));
    }

    #[test]
    fn test_custom_fidelity_against_threshold() {
        // |target⟩ = cos θ|0⟩ + sin θ|1⟩ with (1 + sin 2θ)/2 = 0.92
        let theta = 0.84f64.asin() / 2.0;
        let target = StateVector::from_amplitudes(
            1,
            vec![Complex64::new(theta.cos(), 0.0), Complex64::new(theta.sin(), 0.0)],
        )
        .unwrap();
        let puzzle = Puzzle::custom(
            PuzzleKind::Teleportation,
            4,
            StateVector::zero(1),
            target,
            0.85,
        );

        let evaluation = PuzzleEngine::new()
            .evaluate(&puzzle, &[GateOp::Hadamard { qubit: 0 }])
            .unwrap();
        assert!((evaluation.fidelity - 0.92).abs() < 1e-9);
        assert!(evaluation.passed);
    }

    #[test]
    fn test_teleported_index() {
        assert_eq!(teleported_index(0b001, 3), 0b100);
        assert_eq!(teleported_index(0b111, 3), 0b110);
        assert_eq!(teleported_index(0b1, 1), 0b0);
    }
}
