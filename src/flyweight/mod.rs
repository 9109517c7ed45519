//! Flyweight pattern: keyed instance sharing.
//!
//! An [`InstanceCache`] hands out one shared instance per construction
//! signature:
//! - Keys are derived from positional and keyword arguments plus the family name
//! - Construction errors propagate and are never cached
//! - Instances live until removed; an optional capacity bound enables LRU eviction
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use pattyrn::flyweight::{InstanceCache, Signature};
//!
//! struct Card {
//!     suit: String,
//!     value: u8,
//! }
//!
//! let cards = InstanceCache::with_defaults("Card");
//! let build = |sig: &Signature| -> Result<Card, std::num::ParseIntError> {
//!     Ok(Card {
//!         suit: sig.get(0).map(|a| a.to_string()).unwrap_or_default(),
//!         value: sig.get(1).map(|a| a.as_str()).unwrap_or("0").parse()?,
//!     })
//! };
//!
//! let three = cards.get_or_create(&Signature::new().arg("Spade").arg(3), build).unwrap();
//! let again = cards.get_or_create(&Signature::new().arg("Spade").arg(3), build).unwrap();
//! assert!(Arc::ptr_eq(&three, &again));
//! assert_eq!(three.suit, "Spade");
//! assert_eq!(three.value, 3);
//! ```

pub mod config;
pub mod entry;
pub mod instance_cache;
pub mod key;

// Re-exports
pub use config::{CacheMetrics, FlyweightConfig, KeyMode};
pub use entry::{EntryMetadata, FlyweightEntry};
pub use instance_cache::{new_shared_cache, Flyweight, InstanceCache, SharedInstanceCache};
pub use key::{Argument, CacheKey, Signature};
