use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::path::Path;

/// How far (in blocks) a branch may trail the best chain and still be extended
pub const CUT_OFF_AGE: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunables for the fork tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// A block is admitted only if its height exceeds `best_height - cut_off_age`
    pub cut_off_age: u64,

    /// Evict nodes that can no longer be extended after each new best block
    pub prune_dead_branches: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            cut_off_age: CUT_OFF_AGE,
            prune_dead_branches: true,
        }
    }
}

impl ChainConfig {
    /// Loads a JSON config file; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }
}
