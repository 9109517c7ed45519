//! Chain of Responsibility: requests passed along links until one handles them.

pub mod handler;

// Re-exports
pub use handler::{Chain, ChainLink};
