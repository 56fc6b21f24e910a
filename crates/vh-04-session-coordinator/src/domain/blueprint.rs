//! Seeded generation of everything a session starts with

use super::errors::SessionError;
use crate::config::CoordinatorConfig;
use heist_types::{Difficulty, GuardId};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use uuid::Builder;
use vh_01_vault_generator::{Vault, VaultGenerator};
use vh_02_puzzle_engine::{Puzzle, PuzzleEngine};
use vh_03_guard_behavior::Guard;

/// Stream separation so vault, puzzle and guard draws stay independent
const PUZZLE_STREAM: u64 = 0x5055_5a5a_4c45;
const GUARD_STREAM: u64 = 0x4755_4152_44;

/// Vault, guards and puzzles for a new session
///
/// Fields are public so fixtures can swap in hand-built puzzles before the
/// session starts.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionBlueprint {
    pub seed: u64,
    pub difficulty: Difficulty,
    pub vault: Vault,
    pub guards: Vec<Guard>,
    pub puzzles: Vec<Puzzle>,
}

impl SessionBlueprint {
    /// Generate a blueprint. Identical `(seed, difficulty, config)` always
    /// yields identical content.
    pub fn generate(
        seed: u64,
        difficulty: u8,
        config: &CoordinatorConfig,
    ) -> Result<Self, SessionError> {
        let difficulty = Difficulty::new(difficulty)?;
        let d = difficulty.get();

        let vault = VaultGenerator::with_config(config.vault.clone()).generate(seed, d)?;

        let engine = PuzzleEngine::with_config(config.puzzles.clone());
        let mut puzzle_rng = ChaCha8Rng::seed_from_u64(seed ^ PUZZLE_STREAM);
        let qubits = config.qubit_count(d);
        let puzzles = (0..config.puzzle_count(d))
            .map(|_| engine.generate(&mut puzzle_rng, d, qubits))
            .collect::<Result<Vec<_>, _>>()?;

        let mut guard_rng = ChaCha8Rng::seed_from_u64(seed ^ GUARD_STREAM);
        let guards = (0..config.guard_count(d))
            .map(|index| {
                let mut bytes = [0u8; 16];
                guard_rng.fill_bytes(&mut bytes);
                let id = GuardId::from_uuid(Builder::from_random_bytes(bytes).into_uuid());
                Guard::new(id, d, vault.size, index, &config.guards)
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            seed,
            difficulty = d,
            vault_size = vault.size,
            treasures = vault.treasures().len(),
            guards = guards.len(),
            puzzles = puzzles.len(),
            "Session blueprint generated"
        );

        Ok(Self {
            seed,
            difficulty,
            vault,
            guards,
            puzzles,
        })
    }
}
