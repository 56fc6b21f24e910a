//! Bounded observation memory

use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One labelled training example
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub features: FeatureVector,
    /// Player succeeded at this point
    pub success: bool,
}

/// Ring buffer of the most recent observations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObservationMemory {
    capacity: usize,
    items: VecDeque<Observation>,
}

impl ObservationMemory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    /// Insert, evicting the oldest entry first when full
    pub fn push(&mut self, observation: Observation) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(observation);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.items.iter()
    }
}
