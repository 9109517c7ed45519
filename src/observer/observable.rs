//! Observable state with an identity-keyed set of observers.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

/// Receives the observable's state after each notification
pub trait Observer<S>: Send + Sync {
    fn update(&self, state: &S);
}

impl<S, F> Observer<S> for F
where
    F: Fn(&S) + Send + Sync,
{
    fn update(&self, state: &S) {
        self(state)
    }
}

/// Shared reference to an observer
pub type SharedObserver<S> = Arc<dyn Observer<S>>;

fn same_observer<S>(a: &SharedObserver<S>, b: &SharedObserver<S>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// A value that tells its observers whenever it changes
///
/// Observers form a set by identity. Each notification delivers a snapshot
/// of the state, taken before any observer runs, so observers may attach or
/// detach (themselves included) while being notified.
pub struct Observable<S> {
    state: RwLock<S>,
    observers: RwLock<Vec<SharedObserver<S>>>,
}

impl<S: Clone> Observable<S> {
    /// Wraps an initial state with no observers
    pub fn new(state: S) -> Self {
        Self {
            state: RwLock::new(state),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Attaches an observer; returns `false` if it was already attached
    pub fn attach(&self, observer: SharedObserver<S>) -> bool {
        let mut observers = self.observers_mut();
        if observers.iter().any(|o| same_observer(o, &observer)) {
            return false;
        }
        observers.push(observer);
        debug!("Attached observer ({} total)", observers.len());
        true
    }

    /// Detaches an observer; detaching a stranger does nothing
    pub fn detach(&self, observer: &SharedObserver<S>) -> bool {
        let mut observers = self.observers_mut();
        match observers.iter().position(|o| same_observer(o, observer)) {
            Some(idx) => {
                observers.remove(idx);
                debug!("Detached observer ({} left)", observers.len());
                true
            }
            None => false,
        }
    }

    /// Checks if the observer is attached
    pub fn is_attached(&self, observer: &SharedObserver<S>) -> bool {
        self.observers().iter().any(|o| same_observer(o, observer))
    }

    /// Number of attached observers
    pub fn observer_count(&self) -> usize {
        self.observers().len()
    }

    /// Clone of the current state
    pub fn state(&self) -> S {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Sends the current state to every observer; returns how many were told
    pub fn notify(&self) -> usize {
        let state = self.state();
        let observers = self.observers().clone();
        debug!("Notifying {} observers", observers.len());

        for observer in &observers {
            observer.update(&state);
        }
        observers.len()
    }

    /// Changes the state, then notifies every observer
    pub fn update_state<F>(&self, change: F) -> usize
    where
        F: FnOnce(&mut S),
    {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            change(&mut state);
        }
        self.notify()
    }

    // The observer list is only pushed or removed whole, so a poisoned lock is still usable.
    fn observers(&self) -> RwLockReadGuard<'_, Vec<SharedObserver<S>>> {
        self.observers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn observers_mut(&self) -> RwLockWriteGuard<'_, Vec<SharedObserver<S>>> {
        self.observers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: Default + Clone> Default for Observable<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: Clone + std::fmt::Debug> std::fmt::Debug for Observable<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("state", &self.state())
            .field("observers", &self.observer_count())
            .finish()
    }
}
