//! State-vector algebra
//!
//! A register of `n` qubits is a vector of `2^n` complex amplitudes. Qubit
//! `q` is bit `q` of the basis index (little-endian), so `|q1 q0⟩ = |10⟩` is
//! index 2.

use super::errors::PuzzleError;
use num_complex::Complex64;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_1_SQRT_2;

/// Normalization tolerance
const NORM_EPSILON: f64 = 1e-9;

/// Pure state of a small qubit register
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    qubits: u8,
    amplitudes: Vec<Complex64>,
}

impl StateVector {
    /// Computational basis state `|index⟩`
    pub fn basis(qubits: u8, index: usize) -> Self {
        let dim = 1usize << qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); dim];
        amplitudes[index % dim] = Complex64::new(1.0, 0.0);
        Self { qubits, amplitudes }
    }

    /// `|0…0⟩`
    pub fn zero(qubits: u8) -> Self {
        Self::basis(qubits, 0)
    }

    /// `(|0…00⟩ + |0…11⟩) / √2` on qubits 0 and 1
    pub fn bell_pair(qubits: u8) -> Self {
        let mut state = Self::zero(qubits);
        state.amplitudes[0] = Complex64::new(FRAC_1_SQRT_2, 0.0);
        state.amplitudes[0b11] = Complex64::new(FRAC_1_SQRT_2, 0.0);
        state
    }

    /// Random normalized amplitude vector drawn from `rng`
    pub fn random<R: Rng + ?Sized>(qubits: u8, rng: &mut R) -> Self {
        loop {
            let amplitudes: Vec<Complex64> = (0..1usize << qubits)
                .map(|_| Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
                .collect();
            // Retry on the (practically impossible) all-zero draw
            if let Ok(state) = Self::from_amplitudes(qubits, amplitudes) {
                return state;
            }
        }
    }

    /// Build from raw amplitudes, normalizing them
    pub fn from_amplitudes(qubits: u8, amplitudes: Vec<Complex64>) -> Result<Self, PuzzleError> {
        let expected = 1usize << qubits;
        if amplitudes.len() != expected {
            return Err(PuzzleError::DimensionMismatch {
                expected,
                actual: amplitudes.len(),
            });
        }
        let mut state = Self { qubits, amplitudes };
        state.normalize()?;
        Ok(state)
    }

    pub fn qubits(&self) -> u8 {
        self.qubits
    }

    pub fn dimension(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum()
    }

    fn normalize(&mut self) -> Result<(), PuzzleError> {
        let norm = self.norm_sqr().sqrt();
        if !norm.is_finite() || norm < NORM_EPSILON {
            return Err(PuzzleError::Unnormalizable);
        }
        for a in &mut self.amplitudes {
            *a /= norm;
        }
        Ok(())
    }

    /// `⟨self|other⟩`
    pub fn inner(&self, other: &StateVector) -> Result<Complex64, PuzzleError> {
        if self.dimension() != other.dimension() {
            return Err(PuzzleError::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }
        Ok(self
            .amplitudes
            .iter()
            .zip(&other.amplitudes)
            .map(|(a, b)| a.conj() * b)
            .sum())
    }

    /// `|⟨self|other⟩|²` clamped to [0, 1]
    pub fn fidelity(&self, other: &StateVector) -> Result<f64, PuzzleError> {
        let overlap = self.inner(other)?.norm_sqr();
        Ok(if overlap.is_finite() {
            overlap.clamp(0.0, 1.0)
        } else {
            0.0
        })
    }

    // -------------------------------------------------------------------------
    // Gate primitives. Callers validate qubit indices.
    // -------------------------------------------------------------------------

    pub(crate) fn hadamard(&mut self, q: u8) {
        let bit = 1usize << q;
        for i in 0..self.amplitudes.len() {
            if i & bit == 0 {
                let j = i | bit;
                let (a, b) = (self.amplitudes[i], self.amplitudes[j]);
                self.amplitudes[i] = (a + b) * FRAC_1_SQRT_2;
                self.amplitudes[j] = (a - b) * FRAC_1_SQRT_2;
            }
        }
    }

    pub(crate) fn pauli_x(&mut self, q: u8) {
        let bit = 1usize << q;
        for i in 0..self.amplitudes.len() {
            if i & bit == 0 {
                self.amplitudes.swap(i, i | bit);
            }
        }
    }

    pub(crate) fn pauli_z(&mut self, q: u8) {
        self.phase(q, std::f64::consts::PI);
    }

    pub(crate) fn phase(&mut self, q: u8, theta: f64) {
        let bit = 1usize << q;
        let factor = Complex64::from_polar(1.0, theta);
        for (i, a) in self.amplitudes.iter_mut().enumerate() {
            if i & bit != 0 {
                *a *= factor;
            }
        }
    }

    pub(crate) fn cnot(&mut self, control: u8, target: u8) {
        let c = 1usize << control;
        let t = 1usize << target;
        for i in 0..self.amplitudes.len() {
            if i & c != 0 && i & t == 0 {
                self.amplitudes.swap(i, i | t);
            }
        }
    }
}
