//! Error types shared by the pattern modules.

use thiserror::Error;

/// Errors raised by composites, object pools and the behavioral patterns.
///
/// Flyweight construction errors are not listed here: they belong to the
/// caller's constructor and propagate through `InstanceCache` unchanged.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Component {component} does not follow interface {interface}: missing {}", .missing.join(", "))]
    InterfaceMismatch {
        interface: String,
        component: String,
        missing: Vec<String>,
    },

    #[error("Component {component} has no callable operation '{operation}'")]
    InvalidOperation { component: String, operation: String },

    #[error("Adding {component} to {group} would make the group contain itself")]
    CycleDetected { group: String, component: String },

    #[error("Invoker {invoker} does not accept command {command}")]
    UnregisteredCommand { invoker: String, command: String },

    #[error("Invoker {invoker} has no command to undo")]
    EmptyHistory { invoker: String },

    #[error("No link in chain {chain} handled the request")]
    Unhandled { chain: String },

    #[error("Object pool exhausted: all {max_size} instances are in use")]
    PoolExhausted { max_size: usize },

    #[error("Construction failed: {0}")]
    Construction(#[from] anyhow::Error),
}

impl PatternError {
    /// Builds an `InvalidOperation` error for the given component and operation
    pub fn invalid_operation(component: impl Into<String>, operation: impl Into<String>) -> Self {
        PatternError::InvalidOperation {
            component: component.into(),
            operation: operation.into(),
        }
    }

    /// Returns true for errors caused by a component not matching an interface
    pub fn is_interface_mismatch(&self) -> bool {
        matches!(self, PatternError::InterfaceMismatch { .. })
    }

    /// Returns true for errors caused by delegating an unknown operation
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, PatternError::InvalidOperation { .. })
    }

    /// Returns true when a group insertion was refused to keep nesting acyclic
    pub fn is_cycle(&self) -> bool {
        matches!(self, PatternError::CycleDetected { .. })
    }
}

/// Result type for pattern operations
pub type PatternResult<T> = Result<T, PatternError>;
