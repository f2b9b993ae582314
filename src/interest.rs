//! Latent interest profiles.
//!
//! Every member gets one strong dimension and weak background interest in the
//! rest. Profiles are L2-normalised so a dot product with an L1-normalised
//! topic vector yields comparable match scores across members.

use rand::Rng;

use crate::math::{dot, norm, EPSILON};

pub const PRIMARY_WEIGHT_MIN: f32 = 0.50;
pub const PRIMARY_WEIGHT_MAX: f32 = 0.70;
pub const BACKGROUND_WEIGHT_MIN: f32 = 0.02;
pub const BACKGROUND_WEIGHT_MAX: f32 = 0.10;

#[derive(Clone, Debug, PartialEq)]
pub struct InterestProfile {
    weights: Vec<f32>,
    primary_dim: usize,
}

impl InterestProfile {
    /// Samples a profile over `dims` dimensions. `dims` must be non-zero.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, dims: usize) -> Self {
        debug_assert!(dims > 0);
        let primary = rng.random_range(0..dims.max(1));
        let raw: Vec<f32> = (0..dims)
            .map(|k| {
                if k == primary {
                    rng.random_range(PRIMARY_WEIGHT_MIN..PRIMARY_WEIGHT_MAX)
                } else {
                    rng.random_range(BACKGROUND_WEIGHT_MIN..BACKGROUND_WEIGHT_MAX)
                }
            })
            .collect();
        Self::from_weights(raw)
    }

    /// Builds a profile from explicit weights, clamping negatives to zero and
    /// L2-normalising. A zero vector becomes uniform.
    pub fn from_weights(raw: Vec<f32>) -> Self {
        let mut weights: Vec<f32> = raw
            .into_iter()
            .map(|w| if w.is_finite() { w.max(0.0) } else { 0.0 })
            .collect();
        let length = norm(&weights);
        if length <= EPSILON {
            let uniform = 1.0 / (weights.len().max(1) as f32).sqrt();
            weights.iter_mut().for_each(|w| *w = uniform);
        } else {
            weights.iter_mut().for_each(|w| *w /= length);
        }
        let primary_dim = arg_max(&weights);
        Self {
            weights,
            primary_dim,
        }
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn dims(&self) -> usize {
        self.weights.len()
    }

    pub fn primary_dim(&self) -> usize {
        self.primary_dim
    }

    /// Raw match score against a topic vector.
    pub fn match_score(&self, topic_vector: &[f32]) -> f32 {
        dot(&self.weights, topic_vector)
    }

    /// Interest scaled into `[0, max_interest]`.
    pub fn predicted_interest(&self, topic_vector: &[f32], max_interest: f32) -> f32 {
        self.match_score(topic_vector) * max_interest
    }
}

/// Index of the largest entry; the first one wins on ties.
pub fn arg_max(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
