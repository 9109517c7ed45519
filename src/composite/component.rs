//! The component trait and a closure-backed implementation.

use std::any::type_name;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{PatternError, PatternResult};

/// Anything that can be held by a `CompositeGroup`
///
/// Components declare their operations explicitly through `supports`; the
/// group validates against that list instead of inspecting the type.
pub trait Component: Send + Sync {
    /// Name used in error messages and logs
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    /// Checks if the component currently provides `operation`
    fn supports(&self, operation: &str) -> bool;

    /// Invokes a zero-argument operation by name
    fn invoke(&self, operation: &str) -> PatternResult<()>;

    /// Checks if `target` is reachable through this component's children
    ///
    /// `target` is the data address of a component. Leaf components hold no
    /// children, so the default is `false`.
    fn reaches(&self, _target: *const ()) -> bool {
        false
    }
}

/// Shared, non-exclusive reference to a component
pub type SharedComponent = Arc<dyn Component>;

/// Compares two shared components by identity (data pointer only).
pub fn same_component(a: &SharedComponent, b: &SharedComponent) -> bool {
    component_addr(a) == component_addr(b)
}

/// Data address of a shared component, without the vtable
pub fn component_addr(component: &SharedComponent) -> *const () {
    Arc::as_ptr(component) as *const ()
}

type Operation = Arc<dyn Fn() -> PatternResult<()> + Send + Sync>;

/// A component whose operations are named closures
///
/// Operations can be defined or withdrawn at any time, including after the
/// component has been added to a group.
pub struct ComponentTable {
    name: String,
    operations: RwLock<BTreeMap<String, Operation>>,
}

impl ComponentTable {
    /// Creates a component with no operations
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: RwLock::new(BTreeMap::new()),
        }
    }

    /// Adds an operation (builder style)
    pub fn with<F>(self, operation: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> PatternResult<()> + Send + Sync + 'static,
    {
        self.define(operation, f);
        self
    }

    /// Defines or replaces an operation
    pub fn define<F>(&self, operation: impl Into<String>, f: F)
    where
        F: Fn() -> PatternResult<()> + Send + Sync + 'static,
    {
        self.operations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(operation.into(), Arc::new(f));
    }

    /// Removes an operation; returns whether it existed
    pub fn withdraw(&self, operation: &str) -> bool {
        self.operations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(operation)
            .is_some()
    }

    /// Names of the defined operations
    pub fn operation_names(&self) -> Vec<String> {
        self.operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Wraps the table for insertion into a group
    pub fn shared(self) -> SharedComponent {
        Arc::new(self)
    }
}

impl Component for ComponentTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, operation: &str) -> bool {
        self.operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(operation)
    }

    fn invoke(&self, operation: &str) -> PatternResult<()> {
        // Release the lock before running the closure; it may redefine operations
        let op = self
            .operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(operation)
            .cloned();

        match op {
            Some(op) => op(),
            None => Err(PatternError::invalid_operation(&self.name, operation)),
        }
    }
}

impl std::fmt::Debug for ComponentTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentTable")
            .field("name", &self.name)
            .field("operations", &self.operation_names())
            .finish()
    }
}
