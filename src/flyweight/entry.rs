//! Pooled instance with access bookkeeping.

use std::sync::Arc;
use std::time::{Duration, Instant};

/// A shared instance held by the flyweight pool
#[derive(Debug)]
pub struct FlyweightEntry<T> {
    /// The shared instance
    pub instance: Arc<T>,

    /// When the instance was constructed
    pub created_at: Instant,

    /// When the instance was last handed out
    pub last_accessed: Instant,

    /// Number of times this instance has been handed out
    pub access_count: u64,
}

impl<T> FlyweightEntry<T> {
    /// Wraps a freshly constructed instance
    pub fn new(instance: Arc<T>) -> Self {
        let now = Instant::now();
        Self {
            instance,
            created_at: now,
            last_accessed: now,
            access_count: 1,
        }
    }

    /// Marks the entry as handed out and returns a new reference to it
    pub fn touch(&mut self) -> Arc<T> {
        self.last_accessed = Instant::now();
        self.access_count += 1;
        Arc::clone(&self.instance)
    }

    /// Returns the age of this entry
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Returns time since last access
    pub fn idle_time(&self) -> Duration {
        self.last_accessed.elapsed()
    }

    /// Snapshot of the bookkeeping fields
    pub fn metadata(&self) -> EntryMetadata {
        EntryMetadata {
            access_count: self.access_count,
            age: self.age(),
            idle_time: self.idle_time(),
            strong_refs: Arc::strong_count(&self.instance),
        }
    }
}

/// Metadata about a pooled instance
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    /// Number of times the instance has been handed out (including creation)
    pub access_count: u64,

    /// How long since the instance was constructed
    pub age: Duration,

    /// How long since the instance was last handed out
    pub idle_time: Duration,

    /// Live references, the pool's own included
    pub strong_refs: usize,
}
