//! Composite pattern with explicit interface conformance.
//!
//! A [`CompositeGroup`] holds shared [`Component`]s that all provide the
//! operations of an [`Interface`], and forwards zero-argument operations to
//! every one of them. Groups are components themselves, so they nest.
//!
//! # Example
//!
//! ```rust
//! use pattyrn::composite::{ComponentTable, CompositeGroup, Interface};
//!
//! let pack = CompositeGroup::new(Interface::new("Speaker").operation("speak"));
//!
//! let dog = ComponentTable::new("Dog").with("speak", || Ok(())).shared();
//! let rock = ComponentTable::new("Rock").shared();
//!
//! assert!(pack.add(dog).is_ok());
//! assert!(pack.add(rock).unwrap_err().is_interface_mismatch());
//! assert_eq!(pack.delegate("speak").unwrap(), 1);
//! ```

pub mod component;
pub mod group;
pub mod interface;

// Re-exports
pub use component::{component_addr, same_component, Component, ComponentTable, SharedComponent};
pub use group::{CompositeGroup, Delegation, DelegationReport};
pub use interface::Interface;
