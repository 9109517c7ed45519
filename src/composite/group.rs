//! Interface-checked component groups with broadcast delegation.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::error::{PatternError, PatternResult};

use super::component::{component_addr, same_component, Component, SharedComponent};
use super::interface::Interface;

/// A set of components that all follow one interface
///
/// Children are shared references; the group never owns them exclusively
/// and dropping the group does not touch them. Membership is by identity.
pub struct CompositeGroup {
    interface: Interface,
    label: String,
    children: RwLock<Vec<SharedComponent>>,
}

impl CompositeGroup {
    /// Creates an empty group for the given interface
    pub fn new(interface: Interface) -> Self {
        info!("Creating composite group for interface {}", interface);
        let label = format!("CompositeGroup<{}>", interface.name());
        Self {
            interface,
            label,
            children: RwLock::new(Vec::new()),
        }
    }

    /// Returns the interface children must follow
    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    /// Adds a component after checking it against the interface
    ///
    /// Returns `Ok(false)` if the component was already a member. A group
    /// that is this group, or that already contains it at any depth, is
    /// rejected with `CycleDetected`.
    pub fn add(&self, component: SharedComponent) -> PatternResult<bool> {
        if let Err(e) = self.interface.check(component.as_ref()) {
            warn!("Rejected {} from {}: {}", component.name(), self.label, e);
            return Err(e);
        }

        let me = self.addr();
        if component_addr(&component) == me || component.reaches(me) {
            warn!("Rejected {} from {}: would form a cycle", component.name(), self.label);
            return Err(PatternError::CycleDetected {
                group: self.label.clone(),
                component: component.name().to_string(),
            });
        }

        let mut children = self.write();
        if children.iter().any(|child| same_component(child, &component)) {
            debug!("{} is already a member of {}", component.name(), self.label);
            return Ok(false);
        }

        debug!("Added {} to {}", component.name(), self.label);
        children.push(component);
        Ok(true)
    }

    /// Removes a component; returns whether it was a member
    pub fn remove(&self, component: &SharedComponent) -> bool {
        let mut children = self.write();
        match children.iter().position(|child| same_component(child, component)) {
            Some(idx) => {
                children.remove(idx);
                debug!("Removed {} from {}", component.name(), self.label);
                true
            }
            None => false,
        }
    }

    /// Checks if the component is a member
    pub fn contains(&self, component: &SharedComponent) -> bool {
        self.read().iter().any(|child| same_component(child, component))
    }

    /// Number of children
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Checks if the group has no children
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the current children
    pub fn children(&self) -> Vec<SharedComponent> {
        self.read().clone()
    }

    /// Removes all children
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Invokes `operation` on every child, stopping at the first failure
    ///
    /// Returns the number of children invoked. Children run against a
    /// snapshot taken at the start of the pass, so a child may add or remove
    /// members while it runs.
    pub fn delegate(&self, operation: &str) -> PatternResult<usize> {
        let children = self.children();
        debug!("Delegating '{}' to {} children of {}", operation, children.len(), self.label);

        for child in &children {
            if !child.supports(operation) {
                warn!("{} lost operation '{}', aborting delegation", child.name(), operation);
                return Err(PatternError::invalid_operation(child.name(), operation));
            }
            child.invoke(operation)?;
        }

        Ok(children.len())
    }

    /// Invokes `operation` on every child, collecting failures instead of stopping
    pub fn delegate_all(&self, operation: &str) -> DelegationReport {
        let children = self.children();
        let mut report = DelegationReport::new(operation);

        for child in &children {
            let outcome = if child.supports(operation) {
                child.invoke(operation)
            } else {
                Err(PatternError::invalid_operation(child.name(), operation))
            };

            match outcome {
                Ok(()) => report.invoked += 1,
                Err(e) => {
                    warn!("Delegating '{}' to {} failed: {}", operation, child.name(), e);
                    report.failures.push(e);
                }
            }
        }

        report
    }

    /// Binds an operation name for repeated delegation
    ///
    /// `group.bind("speak").call()` is the same as `group.delegate("speak")`.
    pub fn bind(&self, operation: impl Into<String>) -> Delegation<'_> {
        Delegation {
            group: self,
            operation: operation.into(),
        }
    }

    /// Wraps the group for sharing or nesting inside another group
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn addr(&self) -> *const () {
        self as *const Self as *const ()
    }

    // Children are only ever pushed or removed whole, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, Vec<SharedComponent>> {
        self.children.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<SharedComponent>> {
        self.children.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A group is itself a component exposing its interface, so groups nest.
impl Component for CompositeGroup {
    fn name(&self) -> &str {
        &self.label
    }

    fn supports(&self, operation: &str) -> bool {
        self.interface.requires(operation)
    }

    fn invoke(&self, operation: &str) -> PatternResult<()> {
        if !self.supports(operation) {
            return Err(PatternError::invalid_operation(&self.label, operation));
        }
        self.delegate(operation).map(|_| ())
    }

    fn reaches(&self, target: *const ()) -> bool {
        self.children()
            .iter()
            .any(|child| component_addr(child) == target || child.reaches(target))
    }
}

impl std::fmt::Debug for CompositeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeGroup")
            .field("interface", &self.interface)
            .field("children", &self.len())
            .finish()
    }
}

/// An operation bound to a group, callable like a method
#[derive(Debug)]
pub struct Delegation<'a> {
    group: &'a CompositeGroup,
    operation: String,
}

impl Delegation<'_> {
    /// Delegates the bound operation to every child
    pub fn call(&self) -> PatternResult<usize> {
        self.group.delegate(&self.operation)
    }

    /// The bound operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

/// Outcome of `delegate_all`
#[derive(Debug)]
pub struct DelegationReport {
    /// The delegated operation
    pub operation: String,

    /// Children that ran the operation successfully
    pub invoked: usize,

    /// One error per failed child
    pub failures: Vec<PatternError>,
}

impl DelegationReport {
    fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            invoked: 0,
            failures: Vec::new(),
        }
    }

    /// Checks if every child succeeded
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Converts to the `delegate` result shape, keeping the first failure
    pub fn into_result(self) -> PatternResult<usize> {
        match self.failures.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(self.invoked),
        }
    }
}
