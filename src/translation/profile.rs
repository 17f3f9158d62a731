/*!
 * Model-specific request sizing.
 *
 * Large-context models take bigger chunks and get a longer request timeout;
 * every other model is held to small chunks.
 */

use std::time::Duration;

/// Models that accept the large chunk bound
pub const HIGH_CAPACITY_MODELS: &[&str] = &["gemini-2.5-pro-exp-03-25", "gemini-1.5-pro"];

/// Chunk bound and timeout for one model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelProfile {
    /// Maximum blocks per request
    pub max_chunk_size: usize,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ModelProfile {
    pub fn for_model(model: &str) -> Self {
        if HIGH_CAPACITY_MODELS.contains(&model) {
            Self {
                max_chunk_size: 10,
                timeout: Duration::from_secs(100),
            }
        } else {
            Self {
                max_chunk_size: 3,
                timeout: Duration::from_secs(30),
            }
        }
    }

    pub fn is_high_capacity(&self) -> bool {
        self.max_chunk_size > 3
    }

    /// Clamp a requested chunk size to `1..=max_chunk_size`
    pub fn effective_chunk_size(&self, requested: usize) -> usize {
        requested.clamp(1, self.max_chunk_size)
    }
}
