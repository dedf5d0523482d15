//! Deterministic text embedder
//!
//! Hashes character trigrams and words into a fixed-dimension normalized
//! vector. One model is pinned per store instance: load and search must go
//! through the same embedder, and persisted indexes record the model so a
//! mismatch is detected instead of silently producing meaningless scores.

use crate::vector::Vector;
use crate::{Error, Result};
use std::collections::HashSet;
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Model used when the configuration names none.
pub const DEFAULT_MODEL: &str = "trigram-en-256";

/// Fixed seed: hashes must be stable across processes, or a persisted index
/// would stop matching queries after a restart.
const HASH_SEED: u64 = 0x00f1_9ca8_0701_u64;

/// A named embedding model with a fixed output dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingModel {
    name: &'static str,
    dim: usize,
}

impl EmbeddingModel {
    /// Resolve a model identifier. Unknown identifiers are a configuration
    /// error, not a fallback.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "trigram-en-256" => Ok(Self {
                name: "trigram-en-256",
                dim: 256,
            }),
            "trigram-en-512" => Ok(Self {
                name: "trigram-en-512",
                dim: 512,
            }),
            other => Err(Error::InvalidConfig(format!(
                "unknown embedding model: {other}"
            ))),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }
}

/// Embeds free text into the model's vector space.
#[derive(Debug, Clone)]
pub struct TextEmbedder {
    model: EmbeddingModel,
}

impl TextEmbedder {
    pub fn new(model_name: &str) -> Result<Self> {
        Ok(Self {
            model: EmbeddingModel::from_name(model_name)?,
        })
    }

    #[inline]
    #[must_use]
    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.model.dim()
    }

    /// Embed a text into a unit vector.
    ///
    /// Trigrams are deduplicated; words contribute more than trigrams so
    /// exact token matches dominate fuzzy character overlap.
    #[must_use]
    pub fn embed(&self, text: &str) -> Vector {
        let dim = self.model.dim();
        let mut components = vec![0.0f32; dim];
        let normalized = text.to_lowercase();

        for trigram in trigrams(&normalized) {
            let pos = (hash64(&trigram) as usize) % dim;
            components[pos] += 1.0;
        }

        for word in normalized.split_whitespace() {
            let pos = (hash64(word) as usize) % dim;
            components[pos] += 2.0;
        }

        let mut vector = Vector::new(components);
        vector.normalize();
        vector
    }
}

fn hash64(s: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(HASH_SEED);
    hasher.write(s.as_bytes());
    hasher.finish()
}

/// Generate character trigrams from a string
fn trigrams(s: &str) -> HashSet<String> {
    let padded = format!("  {s}  ");
    let chars: Vec<char> = padded.chars().collect();

    if chars.len() < 3 {
        return HashSet::new();
    }

    chars
        .windows(3)
        .map(|w| w.iter().collect::<String>())
        .collect()
}
