//! Vault generation
//!
//! Every random draw comes from a ChaCha stream seeded by the caller, so the
//! same `(seed, difficulty, config)` always yields the same vault.

use crate::config::VaultConfig;
use crate::domain::entities::{Treasure, Vault};
use crate::domain::errors::VaultError;
use heist_types::{Difficulty, Position, TreasureId};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use uuid::Uuid;

/// Vault generator bound to a configuration
#[derive(Clone, Debug, Default)]
pub struct VaultGenerator {
    config: VaultConfig,
}

impl VaultGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: VaultConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    fn validate(&self) -> Result<(), VaultError> {
        let VaultConfig {
            min_size,
            max_size,
            min_base_value,
            max_base_value,
        } = self.config;

        if min_size == 0 || min_size > max_size {
            return Err(VaultError::InvalidSizeBounds {
                min: min_size,
                max: max_size,
            });
        }
        if min_base_value == 0 || min_base_value > max_base_value {
            return Err(VaultError::InvalidValueBounds {
                min: min_base_value,
                max: max_base_value,
            });
        }
        Ok(())
    }

    /// Generate a vault for `difficulty` from `seed`.
    pub fn generate(&self, seed: u64, difficulty: u8) -> Result<Vault, VaultError> {
        let difficulty = Difficulty::new(difficulty)?;
        self.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let d = difficulty.get();

        let size = rng.gen_range(self.config.min_size..=self.config.max_size);
        let extent = f64::from(size);

        let treasures: Vec<Treasure> = (0..usize::from(d) * 2)
            .map(|_| {
                let base = rng.gen_range(self.config.min_base_value..=self.config.max_base_value);
                Treasure {
                    id: treasure_id(&mut rng),
                    value: base * u64::from(d),
                    security_level: rng.gen_range(1..=d),
                    position: Position::new(rng.gen_range(0.0..extent), rng.gen_range(0.0..extent)),
                }
            })
            .collect();

        debug!(
            seed,
            difficulty = d,
            size,
            treasure_count = treasures.len(),
            "Vault generated"
        );

        Ok(Vault::new(size, difficulty, treasures))
    }
}

/// Generate a vault with the default configuration.
pub fn generate(seed: u64, difficulty: u8) -> Result<Vault, VaultError> {
    VaultGenerator::new().generate(seed, difficulty)
}

/// Treasure ids are drawn from the seeded stream too, so replays match.
fn treasure_id<R: RngCore>(rng: &mut R) -> TreasureId {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    // RFC 4122 version 4 / variant bits
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    TreasureId::from_uuid(Uuid::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_three_yields_six_treasures_in_range() {
        let vault = generate(42, 3).unwrap();

        assert_eq!(vault.treasures().len(), 6);
        for t in vault.treasures() {
            assert!((300..=3000).contains(&t.value), "value {}", t.value);
            assert!((1..=3).contains(&t.security_level));
            assert!(t.position.is_within(vault.size));
        }
        assert!((10..=50).contains(&vault.size));
    }

    #[test]
    fn test_same_seed_same_vault() {
        let a = generate(7, 5).unwrap();
        let b = generate(7, 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_differs() {
        let a = generate(1, 8).unwrap();
        let b = generate(2, 8).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_out_of_range_difficulty() {
        assert!(matches!(
            generate(1, 0),
            Err(VaultError::InvalidDifficulty(_))
        ));
        assert!(matches!(
            generate(1, 11),
            Err(VaultError::InvalidDifficulty(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_size_bounds() {
        let generator = VaultGenerator::with_config(VaultConfig {
            min_size: 30,
            max_size: 20,
            ..Default::default()
        });
        assert!(matches!(
            generator.generate(1, 3),
            Err(VaultError::InvalidSizeBounds { min: 30, max: 20 })
        ));
    }

    #[test]
    fn test_fixed_size_bounds() {
        let generator = VaultGenerator::with_config(VaultConfig {
            min_size: 16,
            max_size: 16,
            ..Default::default()
        });
        let vault = generator.generate(99, 10).unwrap();
        assert_eq!(vault.size, 16);
        assert_eq!(vault.treasures().len(), 20);
        assert_eq!(vault.security_level.get(), 10);
    }
}
