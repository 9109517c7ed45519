//! PattYrn: reusable design-pattern building blocks.
//!
//! This module exposes the public API of the library:
//! - [`flyweight`]: keyed instance sharing through an explicit cache object
//! - [`composite`]: interface-checked groups that broadcast operations
//! - [`pool`]: resettable object pools
//! - [`command`], [`observer`], [`chain`]: the behavioral patterns

pub mod chain;
pub mod command;
pub mod composite;
pub mod error;
pub mod flyweight;
pub mod observer;
pub mod pool;

// Re-export main types
pub use error::{PatternError, PatternResult};

// Flyweight exports
pub use flyweight::{
    CacheKey, CacheMetrics, Flyweight, FlyweightConfig, InstanceCache, KeyMode,
    SharedInstanceCache, Signature,
};

// Composite exports
pub use composite::{
    Component, ComponentTable, CompositeGroup, DelegationReport, Interface, SharedComponent,
};

// Pool exports
pub use pool::{ObjectPool, PoolConfig, Pooled, Pristine, Reusable};

// Behavioral exports
pub use chain::{Chain, ChainLink};
pub use command::{Command, Invoker};
pub use observer::{Observable, Observer, SharedObserver};
