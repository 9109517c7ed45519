//! Keyed instance cache implementing the flyweight pattern.

use std::any::type_name;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use lru::LruCache;
use tracing::{debug, info, warn};

use super::config::{CacheMetrics, FlyweightConfig};
use super::entry::{EntryMetadata, FlyweightEntry};
use super::key::{CacheKey, Signature};

type Pool<T> = LruCache<CacheKey, FlyweightEntry<T>>;

/// Memoizes construction by argument signature
///
/// Two requests whose signatures derive the same key get the same `Arc`.
/// The constructor runs outside the lock, so it may itself use the cache.
pub struct InstanceCache<T> {
    /// Constructor family name, part of every key
    family: String,

    /// Pooled instances
    pool: RwLock<Pool<T>>,

    /// Cache configuration
    config: FlyweightConfig,

    hits: AtomicU64,
    misses: AtomicU64,
    failed_constructions: AtomicU64,
    evictions: AtomicU64,
}

impl<T> InstanceCache<T> {
    /// Creates a cache for the given constructor family
    pub fn new(family: impl Into<String>, config: FlyweightConfig) -> Self {
        let family = family.into();
        let pool = match config.capacity.and_then(NonZeroUsize::new) {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };

        info!(
            "Initializing InstanceCache for {} (key mode: {:?}, capacity: {:?})",
            family, config.key_mode, config.capacity
        );

        Self {
            family,
            pool: RwLock::new(pool),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            failed_constructions: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Creates an unbounded cache with default settings
    pub fn with_defaults(family: impl Into<String>) -> Self {
        Self::new(family, FlyweightConfig::default())
    }

    /// Creates a cache whose family is the short type name of `T`
    pub fn for_type(config: FlyweightConfig) -> Self {
        Self::new(short_type_name::<T>(), config)
    }

    /// Creates from environment configuration
    pub fn from_env(family: impl Into<String>) -> Self {
        Self::new(family, FlyweightConfig::from_env())
    }

    /// Returns the constructor family name
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Derives the key a signature maps to in this cache
    pub fn key_for(&self, signature: &Signature) -> CacheKey {
        signature.key(&self.family, self.config.key_mode)
    }

    /// Returns the pooled instance for `signature`, constructing it on first use
    ///
    /// Constructor errors propagate unchanged and nothing is cached.
    pub fn get_or_create<F, E>(&self, signature: &Signature, constructor: F) -> Result<Arc<T>, E>
    where
        F: FnOnce(&Signature) -> Result<T, E>,
    {
        let key = self.key_for(signature);
        self.get_or_create_with_key(key, || constructor(signature))
    }

    /// Same as `get_or_create`, for callers that derive keys themselves
    pub fn get_or_create_with_key<F, E>(&self, key: CacheKey, constructor: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(instance) = self.write().get_mut(&key).map(FlyweightEntry::touch) {
            self.count(&self.hits);
            debug!("Flyweight hit for {}", key);
            return Ok(instance);
        }

        self.count(&self.misses);
        debug!("Flyweight miss for {}, constructing", key);

        let instance = match constructor() {
            Ok(value) => Arc::new(value),
            Err(e) => {
                self.count(&self.failed_constructions);
                warn!("Construction failed for {}; key not cached", key);
                return Err(e);
            }
        };

        let mut pool = self.write();

        // Another caller may have stored this key while we were constructing
        if let Some(existing) = pool.get_mut(&key).map(FlyweightEntry::touch) {
            debug!("Flyweight {} was stored concurrently, keeping pooled instance", key);
            return Ok(existing);
        }

        debug!("Pooling flyweight {}", key);
        if let Some((evicted, _)) = pool.push(key, FlyweightEntry::new(Arc::clone(&instance))) {
            self.count(&self.evictions);
            debug!("Evicted flyweight {}", evicted);
        }

        Ok(instance)
    }

    /// Returns the pooled instance for `signature` without constructing
    pub fn get(&self, signature: &Signature) -> Option<Arc<T>> {
        let key = self.key_for(signature);
        let found = self.write().get_mut(&key).map(FlyweightEntry::touch);
        match found {
            Some(_) => self.count(&self.hits),
            None => self.count(&self.misses),
        }
        found
    }

    /// Checks if an instance is pooled for `signature` (without affecting LRU order)
    pub fn contains(&self, signature: &Signature) -> bool {
        self.read().contains(&self.key_for(signature))
    }

    /// Drops the pooled instance for `signature`
    ///
    /// Outstanding references stay valid; the next request constructs anew.
    pub fn remove(&self, signature: &Signature) -> Option<Arc<T>> {
        let key = self.key_for(signature);
        self.write().pop(&key).map(|entry| entry.instance)
    }

    /// Returns the current number of pooled instances
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Checks if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the capacity bound, if any
    pub fn capacity(&self) -> Option<usize> {
        self.config.capacity
    }

    /// Keys currently pooled, most recently used first
    pub fn keys(&self) -> Vec<CacheKey> {
        self.read().iter().map(|(key, _)| key.clone()).collect()
    }

    /// Clears all pooled instances
    pub fn clear(&self) {
        info!("Clearing instance cache for {}", self.family);
        self.write().clear();
    }

    /// Gets entry metadata without handing out the instance
    pub fn metadata(&self, signature: &Signature) -> Option<EntryMetadata> {
        let key = self.key_for(signature);
        self.read().peek(&key).map(FlyweightEntry::metadata)
    }

    /// Returns the current cache metrics
    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            failed_constructions: self.failed_constructions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            size: self.len(),
        }
    }

    /// Resets all metrics counters
    pub fn reset_metrics(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.failed_constructions.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }

    /// Returns the configuration
    pub fn config(&self) -> &FlyweightConfig {
        &self.config
    }

    fn count(&self, counter: &AtomicU64) {
        if self.config.track_metrics {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    // The pool is never left half-updated, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, Pool<T>> {
        self.pool.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Pool<T>> {
        self.pool.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A type whose construction is routed through an `InstanceCache`
///
/// ```rust
/// use std::convert::Infallible;
/// use std::sync::Arc;
/// use pattyrn::flyweight::{Flyweight, FlyweightConfig, InstanceCache, Signature};
///
/// struct Glyph(char);
///
/// impl Flyweight for Glyph {
///     type Error = Infallible;
///
///     fn construct(signature: &Signature) -> Result<Self, Infallible> {
///         let c = signature.get(0).and_then(|a| a.as_str().chars().next()).unwrap_or(' ');
///         Ok(Glyph(c))
///     }
/// }
///
/// let glyphs = InstanceCache::<Glyph>::for_type(FlyweightConfig::default());
/// let a = glyphs.instance(&Signature::new().arg('a')).unwrap();
/// let b = glyphs.instance(&Signature::new().arg('a')).unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// assert_eq!(glyphs.family(), "Glyph");
/// ```
pub trait Flyweight: Sized {
    /// Error returned when construction fails
    type Error;

    /// Builds a new instance from its signature
    fn construct(signature: &Signature) -> Result<Self, Self::Error>;
}

impl<T: Flyweight> InstanceCache<T> {
    /// Returns the pooled instance for `signature`, building it with `T::construct`
    pub fn instance(&self, signature: &Signature) -> Result<Arc<T>, T::Error> {
        self.get_or_create(signature, T::construct)
    }
}

/// Thread-safe wrapper for InstanceCache
pub type SharedInstanceCache<T> = Arc<InstanceCache<T>>;

/// Creates a new shared instance cache
pub fn new_shared_cache<T>(family: impl Into<String>, config: FlyweightConfig) -> SharedInstanceCache<T> {
    Arc::new(InstanceCache::new(family, config))
}

/// `my_crate::shapes::Point` becomes `Point`; generic arguments are kept.
fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    let path_end = full.find('<').unwrap_or(full.len());
    match full[..path_end].rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flyweight::config::KeyMode;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    fn point(sig: &Signature) -> Result<Point, String> {
        let coord = |i: usize| -> Result<i64, String> {
            sig.get(i)
                .ok_or_else(|| format!("missing coordinate {}", i))?
                .as_str()
                .parse()
                .map_err(|e| format!("bad coordinate: {}", e))
        };
        Ok(Point { x: coord(0)?, y: coord(1)? })
    }

    fn xy<X, Y>(x: X, y: Y) -> Signature
    where
        X: std::fmt::Display + std::fmt::Debug,
        Y: std::fmt::Display + std::fmt::Debug,
    {
        Signature::new().arg(x).arg(y)
    }

    #[test]
    fn test_same_signature_same_instance() {
        let cache = InstanceCache::with_defaults("Point");

        let a = cache.get_or_create(&xy(3, 4), point).unwrap();
        let b = cache.get_or_create(&xy(3, 4), point).unwrap();
        let c = cache.get_or_create(&xy(3, 5), point).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(*c, Point { x: 3, y: 5 });
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_constructor_runs_once_per_key() {
        let cache = InstanceCache::with_defaults("Point");
        let calls = AtomicUsize::new(0);

        for _ in 0..5 {
            cache
                .get_or_create(&xy(1, 1), |sig| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    point(sig)
                })
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_equal_display_shares_instance() {
        let cache = InstanceCache::with_defaults("Point");

        let from_ints = cache.get_or_create(&xy(1, 2), point).unwrap();
        let from_strs = cache.get_or_create(&xy("1", "2"), point).unwrap();

        assert!(Arc::ptr_eq(&from_ints, &from_strs));
    }

    #[test]
    fn test_tagged_mode_separates_types() {
        let cache = InstanceCache::new("Point", FlyweightConfig::with_key_mode(KeyMode::Tagged));

        let from_ints = cache.get_or_create(&xy(1, 2), point).unwrap();
        let from_strs = cache.get_or_create(&xy("1", "2"), point).unwrap();

        assert!(!Arc::ptr_eq(&from_ints, &from_strs));
        assert_eq!(*from_ints, *from_strs);
    }

    #[test]
    fn test_failed_construction_not_cached() {
        let cache = InstanceCache::with_defaults("Point");
        let sig = xy(1, "north");

        let err = cache.get_or_create(&sig, point).unwrap_err();
        assert!(err.contains("bad coordinate"));
        assert!(!cache.contains(&sig));
        assert!(cache.is_empty());

        let recovered = cache
            .get_or_create(&sig, |_| Ok::<_, String>(Point { x: 1, y: 0 }))
            .unwrap();
        assert_eq!(recovered.y, 0);
        assert!(cache.contains(&sig));
        assert_eq!(cache.metrics().failed_constructions, 1);
    }

    #[test]
    fn test_get_does_not_construct() {
        let cache: InstanceCache<Point> = InstanceCache::with_defaults("Point");
        assert!(cache.get(&xy(0, 0)).is_none());

        let made = cache.get_or_create(&xy(0, 0), point).unwrap();
        let found = cache.get(&xy(0, 0)).unwrap();
        assert!(Arc::ptr_eq(&made, &found));
    }

    #[test]
    fn test_remove_forgets_instance() {
        let cache = InstanceCache::with_defaults("Point");
        let first = cache.get_or_create(&xy(7, 7), point).unwrap();

        let removed = cache.remove(&xy(7, 7)).unwrap();
        assert!(Arc::ptr_eq(&first, &removed));
        assert!(cache.remove(&xy(7, 7)).is_none());

        let second = cache.get_or_create(&xy(7, 7), point).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_reentrant_constructor() {
        #[derive(Debug)]
        struct Label {
            name: String,
            parent: Option<Arc<Label>>,
        }

        fn label(cache: &InstanceCache<Label>, path: &str) -> Result<Arc<Label>, String> {
            cache.get_or_create(&Signature::new().arg(path), |_| {
                let parent = match path.rsplit_once('/') {
                    Some((head, _)) => Some(label(cache, head)?),
                    None => None,
                };
                Ok(Label {
                    name: path.to_string(),
                    parent,
                })
            })
        }

        let cache = InstanceCache::with_defaults("Label");
        let leaf = label(&cache, "a/b/c").unwrap();
        let mid = label(&cache, "a/b").unwrap();

        assert_eq!(leaf.name, "a/b/c");
        assert!(Arc::ptr_eq(leaf.parent.as_ref().unwrap(), &mid));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let cache = InstanceCache::new("Point", FlyweightConfig::default().capacity(2));

        cache.get_or_create(&xy(1, 1), point).unwrap();
        cache.get_or_create(&xy(2, 2), point).unwrap();
        cache.get_or_create(&xy(1, 1), point).unwrap();
        cache.get_or_create(&xy(3, 3), point).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&xy(1, 1)));
        assert!(!cache.contains(&xy(2, 2)));
        assert!(cache.contains(&xy(3, 3)));
        assert_eq!(cache.metrics().evictions, 1);
    }

    #[test]
    fn test_metrics() {
        let cache = InstanceCache::with_defaults("Point");

        cache.get_or_create(&xy(1, 1), point).unwrap();
        cache.get_or_create(&xy(1, 1), point).unwrap();
        cache.get_or_create(&xy(1, 1), point).unwrap();
        cache.get_or_create(&xy(2, 2), point).unwrap();

        let metrics = cache.metrics();
        assert_eq!(metrics.hits, 2);
        assert_eq!(metrics.misses, 2);
        assert_eq!(metrics.size, 2);
        assert!((metrics.hit_rate() - 0.5).abs() < 0.001);

        cache.reset_metrics();
        assert_eq!(cache.metrics().total_requests(), 0);
    }

    #[test]
    fn test_metrics_disabled() {
        let cache = InstanceCache::new("Point", FlyweightConfig::default().track_metrics(false));
        cache.get_or_create(&xy(1, 1), point).unwrap();
        cache.get_or_create(&xy(1, 1), point).unwrap();

        let metrics = cache.metrics();
        assert_eq!(metrics.total_requests(), 0);
        assert_eq!(metrics.size, 1);
    }

    #[test]
    fn test_metadata() {
        let cache = InstanceCache::with_defaults("Point");
        let held = cache.get_or_create(&xy(5, 5), point).unwrap();
        cache.get_or_create(&xy(5, 5), point).unwrap();

        let metadata = cache.metadata(&xy(5, 5)).unwrap();
        assert_eq!(metadata.access_count, 2);
        assert_eq!(metadata.strong_refs, 2); // pool + `held`
        assert!(cache.metadata(&xy(6, 6)).is_none());
        drop(held);
    }

    #[test]
    fn test_keys_and_clear() {
        let cache = InstanceCache::with_defaults("Point");
        cache.get_or_create(&xy(1, 2), point).unwrap();

        assert_eq!(cache.keys(), vec![CacheKey::from("12{}Point")]);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.keys().is_empty());
    }

    #[test]
    fn test_concurrent_requests_share_instance() {
        let cache: SharedInstanceCache<Point> = new_shared_cache("Point", FlyweightConfig::default());
        let mut handles = vec![];

        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                (0..50)
                    .map(|_| cache.get_or_create(&xy(9, 9), point).unwrap())
                    .collect::<Vec<_>>()
            }));
        }

        let instances: Vec<Arc<Point>> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();

        let first = &instances[0];
        assert!(instances.iter().all(|p| Arc::ptr_eq(p, first)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Point>(), "Point");
        assert_eq!(short_type_name::<u8>(), "u8");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec<alloc::string::String>");
    }
}
