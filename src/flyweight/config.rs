//! Configuration for the flyweight instance cache.

use serde::{Deserialize, Serialize};

/// How a `Signature` is turned into a cache key
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyMode {
    /// Plain concatenation of the `Display` form of every argument.
    ///
    /// Arguments that print the same share an instance, even across types.
    #[default]
    Display,

    /// Length-prefixed `type:display` pairs with keyword arguments sorted.
    Tagged,
}

impl KeyMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "display" | "string" => Some(KeyMode::Display),
            "tagged" | "structured" => Some(KeyMode::Tagged),
            _ => None,
        }
    }
}

/// Configuration for an `InstanceCache`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlyweightConfig {
    /// Key derivation strategy
    pub key_mode: KeyMode,

    /// Maximum number of pooled instances (None = grow without bound)
    pub capacity: Option<usize>,

    /// Whether to track cache metrics
    pub track_metrics: bool,
}

impl Default for FlyweightConfig {
    fn default() -> Self {
        Self {
            key_mode: KeyMode::Display,
            capacity: None,
            track_metrics: true,
        }
    }
}

impl FlyweightConfig {
    /// Creates a configuration using the given key mode
    pub fn with_key_mode(key_mode: KeyMode) -> Self {
        Self {
            key_mode,
            ..Default::default()
        }
    }

    /// Sets the key mode
    pub fn key_mode(mut self, key_mode: KeyMode) -> Self {
        self.key_mode = key_mode;
        self
    }

    /// Bounds the cache; the least recently used instance is evicted first.
    ///
    /// A capacity of zero is treated as unbounded.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = if capacity == 0 { None } else { Some(capacity) };
        self
    }

    /// Removes any capacity bound
    pub fn unbounded(mut self) -> Self {
        self.capacity = None;
        self
    }

    /// Sets whether to track metrics
    pub fn track_metrics(mut self, track: bool) -> Self {
        self.track_metrics = track;
        self
    }

    /// Loads configuration from environment variables
    pub fn from_env() -> Self {
        let key_mode = std::env::var("FLYWEIGHT_KEY_MODE")
            .ok()
            .and_then(|m| KeyMode::parse(&m))
            .unwrap_or_default();

        let capacity = std::env::var("FLYWEIGHT_CAPACITY")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&c| c > 0);

        let track_metrics = std::env::var("FLYWEIGHT_TRACK_METRICS")
            .map(|s| s == "true" || s == "1")
            .unwrap_or(true);

        Self {
            key_mode,
            capacity,
            track_metrics,
        }
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    /// Lookups answered from the pool
    pub hits: u64,

    /// Lookups that had to construct (or found nothing)
    pub misses: u64,

    /// Constructor calls that returned an error
    pub failed_constructions: u64,

    /// Instances dropped because of the capacity bound
    pub evictions: u64,

    /// Current number of pooled instances
    pub size: usize,
}

impl CacheMetrics {
    /// Calculates hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Returns total requests (hits + misses)
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }
}
