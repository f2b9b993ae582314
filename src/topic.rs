use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::interest::arg_max;
use crate::math::{dot, norm, EPSILON};

pub const JITTER_MIN_WEIGHT: f32 = 0.01;
pub const JITTER_MAX_WEIGHT: f32 = 0.95;

/// One entry of the externally supplied topic catalog. The vector need not be normalised.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopicEntry {
    pub name: String,
    pub vector: Vec<f32>,
}

impl TopicEntry {
    pub fn new(name: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            vector,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Topic {
    /// Index of the entry in the source catalog.
    pub id: usize,
    pub name: String,
    pub col: usize,
    pub row: usize,
    vector: Vec<f32>,
    primary_dim: usize,
    heat: f32,
    visit_count: u32,
}

impl Topic {
    /// Builds a topic from a catalog entry, perturbing each weight by up to
    /// `±jitter` before L1-normalising.
    pub fn from_entry<R: Rng + ?Sized>(
        id: usize,
        entry: &TopicEntry,
        col: usize,
        row: usize,
        jitter: f32,
        rng: &mut R,
    ) -> Self {
        let varied = if jitter > 0.0 {
            entry
                .vector
                .iter()
                .map(|&w| {
                    let offset = rng.random_range(-jitter..jitter);
                    (w + offset).clamp(JITTER_MIN_WEIGHT, JITTER_MAX_WEIGHT)
                })
                .collect()
        } else {
            entry.vector.clone()
        };
        Self::with_vector(id, entry.name.clone(), col, row, varied)
    }

    /// Builds a topic from an explicit vector, L1-normalising it.
    pub fn with_vector(id: usize, name: String, col: usize, row: usize, raw: Vec<f32>) -> Self {
        let vector = l1_normalized(raw);
        let primary_dim = arg_max(&vector);
        Self {
            id,
            name,
            col,
            row,
            vector,
            primary_dim,
            heat: 0.0,
            visit_count: 0,
        }
    }

    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    pub fn primary_dim(&self) -> usize {
        self.primary_dim
    }

    pub fn heat(&self) -> f32 {
        self.heat
    }

    pub fn visit_count(&self) -> u32 {
        self.visit_count
    }

    pub fn on_enter(&mut self) {
        self.heat = 1.0;
        self.visit_count = self.visit_count.saturating_add(1);
    }

    pub fn cool_down(&mut self, decay_rate: f32) {
        if self.heat > 0.0 {
            self.heat = (self.heat - decay_rate).max(0.0);
        }
    }

    pub fn similarity(&self, other: &Topic) -> f32 {
        cosine_similarity(&self.vector, &other.vector)
    }

    /// Last dotted segment of the name, e.g. `"misc"` for `"talk.politics.misc"`.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let na = norm(a);
    let nb = norm(b);
    if na <= EPSILON || nb <= EPSILON {
        return 0.0;
    }
    (dot(a, b) / (na * nb)).clamp(-1.0, 1.0)
}

/// Non-negative, sums to one. Zero or non-finite input falls back to uniform.
pub fn l1_normalized(raw: Vec<f32>) -> Vec<f32> {
    let mut v: Vec<f32> = raw
        .into_iter()
        .map(|w| if w.is_finite() { w.max(0.0) } else { 0.0 })
        .collect();
    let sum: f32 = v.iter().sum();
    if sum <= EPSILON {
        let uniform = 1.0 / v.len().max(1) as f32;
        v.iter_mut().for_each(|w| *w = uniform);
    } else {
        v.iter_mut().for_each(|w| *w /= sum);
    }
    v
}

#[cfg(test)]
mod tests {
    use super::{cosine_similarity, l1_normalized, Topic, TopicEntry};
    use crate::rng::create_rng;

    fn topic(vector: Vec<f32>) -> Topic {
        Topic::with_vector(0, "comp.graphics".to_string(), 0, 0, vector)
    }

    #[test]
    fn similarity_is_symmetric_and_bounded() {
        let a = topic(vec![0.7, 0.1, 0.2]);
        let b = topic(vec![0.1, 0.8, 0.1]);
        let ab = a.similarity(&b);
        assert!((ab - b.similarity(&a)).abs() < 1.0e-6);
        assert!((-1.0..=1.0).contains(&ab));
        assert!((a.similarity(&a) - 1.0).abs() < 1.0e-5);
    }

    #[test]
    fn zero_magnitude_similarity_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn cool_down_never_goes_negative() {
        let mut t = topic(vec![1.0, 1.0]);
        t.cool_down(0.5);
        assert_eq!(t.heat(), 0.0);

        t.on_enter();
        assert_eq!(t.heat(), 1.0);
        assert_eq!(t.visit_count(), 1);
        for _ in 0..10 {
            t.cool_down(0.3);
        }
        assert_eq!(t.heat(), 0.0);
        t.cool_down(0.3);
        assert_eq!(t.heat(), 0.0);
    }

    #[test]
    fn visits_accumulate() {
        let mut t = topic(vec![1.0]);
        t.on_enter();
        t.cool_down(0.2);
        t.on_enter();
        assert_eq!(t.visit_count(), 2);
        assert_eq!(t.heat(), 1.0);
    }

    #[test]
    fn jittered_vectors_stay_normalized() {
        let entry = TopicEntry::new("sci.space", vec![0.6, 0.2, 0.1, 0.1]);
        let mut rng = create_rng(5);
        let t = Topic::from_entry(3, &entry, 1, 2, 0.025, &mut rng);
        let sum: f32 = t.vector().iter().sum();
        assert!((sum - 1.0).abs() < 1.0e-5);
        assert!(t.vector().iter().all(|&w| w > 0.0));
        assert_eq!(t.primary_dim(), 0);
        assert_eq!((t.id, t.col, t.row), (3, 1, 2));
    }

    #[test]
    fn degenerate_vector_becomes_uniform() {
        let v = l1_normalized(vec![0.0, -1.0, f32::NAN, 0.0]);
        assert!(v.iter().all(|&w| (w - 0.25).abs() < 1.0e-6));
    }

    #[test]
    fn short_name_takes_last_segment() {
        assert_eq!(topic(vec![1.0]).short_name(), "graphics");
        let plain = Topic::with_vector(0, "politics".to_string(), 0, 0, vec![1.0]);
        assert_eq!(plain.short_name(), "politics");
    }
}
