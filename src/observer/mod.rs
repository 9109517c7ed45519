//! Observer pattern: state changes pushed to a set of observers.

pub mod observable;

// Re-exports
pub use observable::{Observable, Observer, SharedObserver};
