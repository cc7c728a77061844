//! Inference settings.

use serde::Deserialize;

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Knobs for one inference run. Deserializes from the `[typeck]` table of a
/// `rill.toml`; missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferConfig {
    /// How many method bodies may be under inference at once before the run
    /// fails with `RecursionLimitExceeded`.
    pub max_depth: usize,
}

impl Default for InferConfig {
    fn default() -> Self {
        InferConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl InferConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
