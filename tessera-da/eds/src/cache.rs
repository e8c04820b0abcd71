//! Bounded cache of opened accessors.
//!
//! Entries are loaded at most once per key at a time, callers receive [`CachedAccessor`] handles
//! and the underlying accessor is closed once, after it left the cache and its last handle was
//! released.

// std
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
// crates
use futures::Future;
use moka::future::{Cache, CacheBuilder};
use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tessera_core::{DynError, ExtendedDataSquare};
use tracing::{debug, warn};
// internal
use crate::accessor::{Accessor, AccessorError, Blockstore};

#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    #[error("accessor not found in cache")]
    CacheMiss,
    #[error("failed to load accessor: {0}")]
    LoaderFailed(Arc<DynError>),
}

impl CacheError {
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, Self::CacheMiss)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessorCacheSettings {
    pub name: String,
    pub capacity: u64,
}

impl Default for AccessorCacheSettings {
    fn default() -> Self {
        Self {
            name: "accessor-cache".to_string(),
            capacity: 128,
        }
    }
}

#[derive(Default)]
struct Lifecycle {
    handles: usize,
    evicted: bool,
    closed: bool,
}

struct CacheEntry {
    accessor: Box<dyn Accessor>,
    blockstore: OnceCell<Arc<dyn Blockstore>>,
    lifecycle: Mutex<Lifecycle>,
}

impl CacheEntry {
    /// Entry holding the handle of the caller that loaded it.
    fn loaded(accessor: Box<dyn Accessor>) -> Self {
        Self {
            accessor,
            blockstore: OnceCell::new(),
            lifecycle: Mutex::new(Lifecycle {
                handles: 1,
                ..Lifecycle::default()
            }),
        }
    }

    fn lifecycle(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// New handle, unless the entry already left the cache.
    fn acquire(self: &Arc<Self>) -> Option<CachedAccessor> {
        let mut lifecycle = self.lifecycle();
        if lifecycle.evicted || lifecycle.closed {
            return None;
        }
        lifecycle.handles += 1;
        Some(CachedAccessor::adopt(Arc::clone(self)))
    }

    fn release(self: &Arc<Self>) {
        let close = {
            let mut lifecycle = self.lifecycle();
            lifecycle.handles = lifecycle.handles.saturating_sub(1);
            lifecycle.handles == 0
                && lifecycle.evicted
                && !std::mem::replace(&mut lifecycle.closed, true)
        };
        if close {
            self.close();
        }
    }

    fn evict(self: &Arc<Self>) {
        let close = {
            let mut lifecycle = self.lifecycle();
            lifecycle.evicted = true;
            lifecycle.handles == 0 && !std::mem::replace(&mut lifecycle.closed, true)
        };
        if close {
            self.close();
        }
    }

    fn close(self: &Arc<Self>) {
        let entry = Arc::clone(self);
        let close = move || {
            if let Err(e) = entry.accessor.close() {
                warn!("Failed to close evicted accessor: {e}");
            }
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(close);
            }
            Err(_) => close(),
        }
    }
}

/// Handle to a cached accessor.
///
/// Closing or dropping the handle only releases it, the cache decides when the underlying
/// accessor is closed.
pub struct CachedAccessor {
    entry: Arc<CacheEntry>,
    released: AtomicBool,
}

impl CachedAccessor {
    fn adopt(entry: Arc<CacheEntry>) -> Self {
        Self {
            entry,
            released: AtomicBool::new(false),
        }
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.entry.release();
        }
    }
}

impl Debug for CachedAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedAccessor")
            .field("released", &self.released.load(Ordering::Acquire))
            .finish()
    }
}

impl Accessor for CachedAccessor {
    fn reader(&self) -> Result<Box<dyn Read + Send + '_>, AccessorError> {
        self.entry.accessor.reader()
    }

    fn square(&self) -> Result<Arc<ExtendedDataSquare>, AccessorError> {
        self.entry.accessor.square()
    }

    /// Built on first request, then shared by every handle of the entry.
    fn blockstore(&self) -> Result<Arc<dyn Blockstore>, AccessorError> {
        self.entry
            .blockstore
            .get_or_try_init(|| self.entry.accessor.blockstore())
            .cloned()
    }

    fn close(&self) -> Result<(), AccessorError> {
        self.release();
        Ok(())
    }
}

impl Drop for CachedAccessor {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct AccessorCache<K> {
    name: String,
    cache: Cache<K, Arc<CacheEntry>>,
}

impl<K> AccessorCache<K>
where
    K: Hash + Eq + Clone + Display + Send + Sync + 'static,
{
    pub fn new(settings: AccessorCacheSettings) -> Self {
        let AccessorCacheSettings { name, capacity } = settings;
        let listener_name = name.clone();
        let cache = CacheBuilder::new(capacity)
            .name(&name)
            .eviction_policy(EvictionPolicy::lru())
            .eviction_listener(move |key: Arc<K>, entry: Arc<CacheEntry>, cause| {
                if cause != RemovalCause::Replaced {
                    debug!(cache = %listener_name, key = %key, ?cause, "Accessor left the cache");
                }
                entry.evict();
            })
            .build();
        Self { name, cache }
    }

    /// Handle to the accessor under `key`, loading it if absent.
    ///
    /// Concurrent calls for one key share a single load. Failed loads are not cached.
    pub async fn get_or_load<F, Fut, A>(
        &self,
        key: K,
        loader: F,
    ) -> Result<CachedAccessor, CacheError>
    where
        F: Fn(K) -> Fut,
        Fut: Future<Output = Result<A, DynError>>,
        A: Accessor,
    {
        loop {
            let entry = self
                .cache
                .entry(key.clone())
                .or_try_insert_with(async {
                    let accessor = loader(key.clone()).await?;
                    debug!(cache = %self.name, key = %key, "Loaded accessor");
                    Ok::<_, DynError>(Arc::new(CacheEntry::loaded(Box::new(accessor))))
                })
                .await
                .map_err(CacheError::LoaderFailed)?;
            if entry.is_fresh() {
                let accessor = CachedAccessor::adopt(entry.into_value());
                self.cache.run_pending_tasks().await;
                return Ok(accessor);
            }
            // a shared load can leave the cache before this caller takes its handle
            if let Some(accessor) = entry.into_value().acquire() {
                return Ok(accessor);
            }
            debug!(cache = %self.name, key = %key, "Accessor evicted before use, reloading");
        }
    }

    pub async fn get(&self, key: &K) -> Result<CachedAccessor, CacheError> {
        self.cache
            .get(key)
            .await
            .and_then(|entry| entry.acquire())
            .ok_or(CacheError::CacheMiss)
    }

    /// Drops `key` from the cache, its accessor is closed once no handle remains.
    pub async fn remove(&self, key: &K) -> Result<(), CacheError> {
        let removed = self.cache.remove(key).await;
        self.cache.run_pending_tasks().await;
        removed.map(drop).ok_or(CacheError::CacheMiss)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.cache.contains_key(key)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
