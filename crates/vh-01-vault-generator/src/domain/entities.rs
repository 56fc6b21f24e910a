//! Core entities for the Vault Generator

use super::errors::VaultError;
use heist_types::{Difficulty, PlayerId, Position, TreasureId};
use serde::{Deserialize, Serialize};

/// A collectible item placed inside the vault
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Treasure {
    pub id: TreasureId,
    pub value: u64,
    /// 1..=difficulty, widens guard detection around the treasure
    pub security_level: u8,
    pub position: Position,
}

/// A treasure that has been removed from the vault
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectedTreasure {
    pub treasure: Treasure,
    pub collected_by: PlayerId,
}

/// Procedural vault layout
///
/// Generated once at session start. The layout is immutable; only the split
/// between `treasures` (still in place) and `collected` changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    /// Floor side length
    pub size: u32,
    pub security_level: Difficulty,
    /// Treasures still in the vault, in generation order
    treasures: Vec<Treasure>,
    collected: Vec<CollectedTreasure>,
    /// Sum of all treasure values at generation time
    total_value: u64,
}

impl Vault {
    pub fn new(size: u32, security_level: Difficulty, treasures: Vec<Treasure>) -> Self {
        let total_value = treasures.iter().map(|t| t.value).sum();
        Self {
            size,
            security_level,
            treasures,
            collected: Vec::new(),
            total_value,
        }
    }

    pub fn treasures(&self) -> &[Treasure] {
        &self.treasures
    }

    pub fn collected(&self) -> &[CollectedTreasure] {
        &self.collected
    }

    pub fn total_value(&self) -> u64 {
        self.total_value
    }

    pub fn collected_value(&self) -> u64 {
        self.collected.iter().map(|c| c.treasure.value).sum()
    }

    pub fn remaining_value(&self) -> u64 {
        self.treasures.iter().map(|t| t.value).sum()
    }

    pub fn is_fully_collected(&self) -> bool {
        self.treasures.is_empty()
    }

    /// Look up a treasure that is still in the vault
    pub fn treasure(&self, id: &TreasureId) -> Option<&Treasure> {
        self.treasures.iter().find(|t| &t.id == id)
    }

    /// Who collected a treasure, if it has been collected
    pub fn collected_by(&self, id: &TreasureId) -> Option<PlayerId> {
        self.collected
            .iter()
            .find(|c| &c.treasure.id == id)
            .map(|c| c.collected_by)
    }

    /// Remove a treasure from the vault on behalf of a player
    pub fn collect(
        &mut self,
        id: &TreasureId,
        player: PlayerId,
    ) -> Result<&CollectedTreasure, VaultError> {
        let index = self
            .treasures
            .iter()
            .position(|t| &t.id == id)
            .ok_or(VaultError::TreasureNotFound(*id))?;
        let treasure = self.treasures.remove(index);
        self.collected.push(CollectedTreasure {
            treasure,
            collected_by: player,
        });
        // Just pushed
        Ok(&self.collected[self.collected.len() - 1])
    }
}
