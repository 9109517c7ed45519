//! Object pool pattern.
//!
//! An [`ObjectPool`] pre-creates [`Reusable`] instances in batches, hands
//! them out, and resets them on release. [`Pristine`] makes any `Clone`
//! value reusable by keeping a snapshot of its creation state.

pub mod config;
pub mod object_pool;
pub mod reusable;

// Re-exports
pub use config::PoolConfig;
pub use object_pool::{ObjectPool, Pooled};
pub use reusable::{Pristine, Reusable};
