//! Object pool handing out reusable instances.

use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::error::{PatternError, PatternResult};

use super::config::PoolConfig;
use super::reusable::Reusable;

type Factory<T> = Box<dyn Fn() -> Result<T> + Send + Sync>;

struct PoolState<T> {
    idle: Vec<T>,
    created: usize,
}

/// A pool of pre-created, resettable instances
///
/// The pool grows in batches when it runs dry and resets every instance
/// on release. The factory runs under the pool lock and must not use the
/// pool itself.
pub struct ObjectPool<T> {
    state: Mutex<PoolState<T>>,
    factory: Factory<T>,
    config: PoolConfig,
}

impl<T: Reusable> ObjectPool<T> {
    /// Creates a pool and fills it with one batch
    pub fn new<F>(config: PoolConfig, factory: F) -> PatternResult<Self>
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        info!(
            "Initializing ObjectPool (batch size: {}, max size: {:?})",
            config.batch_size, config.max_size
        );

        let pool = Self {
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                created: 0,
            }),
            factory: Box::new(factory),
            config,
        };

        {
            let mut state = pool.lock();
            pool.expand(&mut state)?;
        }

        Ok(pool)
    }

    /// Creates a pool with default settings
    pub fn with_defaults<F>(factory: F) -> PatternResult<Self>
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Self::new(PoolConfig::default(), factory)
    }

    /// Takes an instance out of the pool, expanding it if none is idle
    pub fn acquire(&self) -> PatternResult<T> {
        let mut state = self.lock();

        if state.idle.is_empty() {
            debug!("Pool is empty, expanding");
            self.expand(&mut state)?;
        }

        state.idle.pop().ok_or(PatternError::PoolExhausted {
            max_size: self.config.max_size.unwrap_or(state.created),
        })
    }

    /// Resets an instance and returns it to the pool
    ///
    /// Only instances obtained from `acquire` belong here. Once every
    /// created instance is idle, further releases are dropped instead of
    /// growing the pool past what it created.
    pub fn release(&self, mut item: T) {
        item.reset();
        let mut state = self.lock();
        if state.idle.len() >= state.created {
            warn!("Dropping released instance: all {} created instances are idle", state.created);
            return;
        }
        state.idle.push(item);
        debug!("Released instance back to pool ({} idle)", state.idle.len());
    }

    /// Acquires an instance that is released automatically when dropped
    pub fn checkout(&self) -> PatternResult<Pooled<'_, T>> {
        Ok(Pooled {
            pool: self,
            item: ManuallyDrop::new(self.acquire()?),
        })
    }

    /// Number of idle instances
    pub fn idle(&self) -> usize {
        self.lock().idle.len()
    }

    /// Number of instances created and still owned by the pool or its callers
    pub fn created(&self) -> usize {
        self.lock().created
    }

    /// Number of instances currently handed out
    pub fn outstanding(&self) -> usize {
        let state = self.lock();
        state.created.saturating_sub(state.idle.len())
    }

    /// Returns the configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn expand(&self, state: &mut PoolState<T>) -> PatternResult<()> {
        let room = match self.config.max_size {
            Some(max) => max.saturating_sub(state.created),
            None => usize::MAX,
        };
        let batch = self.config.effective_batch().min(room);

        if batch == 0 {
            let max_size = self.config.max_size.unwrap_or(state.created);
            warn!("Object pool exhausted at {} instances", max_size);
            return Err(PatternError::PoolExhausted { max_size });
        }

        // Instances built before a factory failure stay in the pool
        for _ in 0..batch {
            let item = (self.factory)()?;
            state.idle.push(item);
            state.created += 1;
        }

        debug!("Expanded pool by {} (created: {})", batch, state.created);
        Ok(())
    }

    fn forget_one(&self) {
        let mut state = self.lock();
        state.created = state.created.saturating_sub(1);
    }

    // Pushes and pops are atomic with respect to panics, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, PoolState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An instance checked out of an `ObjectPool`, released on drop
pub struct Pooled<'a, T: Reusable> {
    pool: &'a ObjectPool<T>,
    item: ManuallyDrop<T>,
}

impl<T: Reusable> Pooled<'_, T> {
    /// Takes the instance out of the pool for good
    ///
    /// The pool stops counting it, which frees room under `max_size`.
    pub fn detach(self) -> T {
        let mut this = ManuallyDrop::new(self);
        this.pool.forget_one();
        // SAFETY: `this` is never dropped, so `item` is taken exactly once and
        // `Pooled::drop` does not run for it.
        unsafe { ManuallyDrop::take(&mut this.item) }
    }
}

impl<T: Reusable> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T: Reusable> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.item
    }
}

impl<T: Reusable> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        // SAFETY: `drop` runs at most once and `item` is not read afterwards.
        let item = unsafe { ManuallyDrop::take(&mut self.item) };
        self.pool.release(item);
    }
}
