//! Named operation lists that composite children must provide.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{PatternError, PatternResult};

use super::component::Component;

/// A named set of required zero-argument operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    name: String,
    operations: BTreeSet<String>,
}

impl Interface {
    /// Creates an interface with no required operations
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: BTreeSet::new(),
        }
    }

    /// Creates an interface from a list of operation names
    pub fn with_operations<I, S>(name: impl Into<String>, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            operations: operations.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds a required operation
    pub fn operation(mut self, name: impl Into<String>) -> Self {
        self.operations.insert(name.into());
        self
    }

    /// Returns the interface name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Required operations in sorted order
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(String::as_str)
    }

    /// Checks if `operation` is part of the interface
    pub fn requires(&self, operation: &str) -> bool {
        self.operations.contains(operation)
    }

    /// Number of required operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Checks if the interface requires nothing
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Required operations the component does not support
    pub fn missing_from(&self, component: &dyn Component) -> Vec<String> {
        self.operations
            .iter()
            .filter(|op| !component.supports(op))
            .cloned()
            .collect()
    }

    /// Verifies that the component supports every required operation
    pub fn check(&self, component: &dyn Component) -> PatternResult<()> {
        let missing = self.missing_from(component);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PatternError::InterfaceMismatch {
                interface: self.name.clone(),
                component: component.name().to_string(),
                missing,
            })
        }
    }

    /// Checks if every operation of `self` is also required by `other`
    pub fn is_subset(&self, other: &Interface) -> bool {
        self.operations.is_subset(&other.operations)
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ops: Vec<&str> = self.operations().collect();
        write!(f, "{} {{{}}}", self.name, ops.join(", "))
    }
}
