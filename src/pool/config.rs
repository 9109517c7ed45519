//! Configuration for object pools.

use serde::{Deserialize, Serialize};

/// Configuration for an `ObjectPool`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Instances created up front and on every expansion
    pub batch_size: usize,

    /// Maximum number of instances ever alive at once (None = unbounded)
    pub max_size: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            batch_size: 2,
            max_size: None,
        }
    }
}

impl PoolConfig {
    /// Creates a configuration with the given batch size
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Default::default()
        }
    }

    /// Sets the batch size
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Bounds the number of instances; zero means unbounded
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = if max_size == 0 { None } else { Some(max_size) };
        self
    }

    /// Batch size actually used; a zero batch still creates one instance
    pub fn effective_batch(&self) -> usize {
        self.batch_size.max(1)
    }

    /// Loads configuration from environment variables
    pub fn from_env() -> Self {
        let batch_size = std::env::var("POOL_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(2);

        let max_size = std::env::var("POOL_MAX_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&m| m > 0);

        Self {
            batch_size,
            max_size,
        }
    }
}
