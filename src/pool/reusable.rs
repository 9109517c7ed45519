//! Objects that can be returned to their creation state.

use std::ops::{Deref, DerefMut};

/// An object that can be reset and handed out again
pub trait Reusable {
    /// Restores the state the object had when it was created
    fn reset(&mut self);
}

/// Keeps a snapshot of a value so it can be reset to it later
///
/// Any `Clone` type becomes `Reusable` by wrapping it:
///
/// ```rust
/// use pattyrn::pool::{Pristine, Reusable};
///
/// let mut sound = Pristine::new(String::from("woof"));
/// sound.push_str("woof");
/// assert_eq!(*sound, "woofwoof");
///
/// sound.reset();
/// assert_eq!(*sound, "woof");
/// ```
#[derive(Debug, Clone)]
pub struct Pristine<T: Clone> {
    snapshot: T,
    current: T,
}

impl<T: Clone> Pristine<T> {
    /// Wraps a value, recording its current state as the reset point
    pub fn new(value: T) -> Self {
        Self {
            snapshot: value.clone(),
            current: value,
        }
    }

    /// The state `reset` returns to
    pub fn snapshot(&self) -> &T {
        &self.snapshot
    }

    /// Records the current state as the new reset point
    pub fn commit(&mut self) {
        self.snapshot = self.current.clone();
    }

    /// Consumes the wrapper and returns the current value
    pub fn into_inner(self) -> T {
        self.current
    }
}

impl<T: Clone> Reusable for Pristine<T> {
    fn reset(&mut self) {
        self.current = self.snapshot.clone();
    }
}

impl<T: Clone> Deref for Pristine<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.current
    }
}

impl<T: Clone> DerefMut for Pristine<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.current
    }
}
