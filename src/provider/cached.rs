//! LRU byte cache in front of a tile provider.
//!
//! Panning back and forth requests the same tiles over and over. The cache
//! keeps the encoded bytes of recently fetched tiles so that those requests
//! do not hit the backing storage again.
//!
//! # Size-Based Eviction
//!
//! The cache tracks the total size of cached tiles in bytes and evicts
//! least-recently-used entries when the capacity is exceeded. The entry
//! count is bounded separately to cap LRU bookkeeping.
//!
//! Only present tiles are cached; absence is always asked again.

use std::num::NonZeroUsize;

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use tokio::sync::Mutex;
use tracing::trace;

use crate::tile::TileKey;

use super::TileStreamProvider;

/// Default cache capacity: 64MB
pub const DEFAULT_TILE_CACHE_CAPACITY: usize = 64 * 1024 * 1024;

/// Default maximum number of entries
pub const DEFAULT_MAX_ENTRIES: usize = 4_096;

struct CacheState {
    entries: LruCache<TileKey, Bytes>,
    current_size: usize,
}

/// Wraps a provider with an LRU cache of encoded tile bytes.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use pyramid_view::provider::{CachedTileProvider, MemoryTileProvider, TileStreamProvider};
/// use pyramid_view::tile::TileKey;
///
/// #[tokio::main]
/// async fn main() {
///     let memory = MemoryTileProvider::new()
///         .with_tile(TileKey::new(0, 0, 0), Bytes::from_static(b"tile"));
///     let provider = CachedTileProvider::with_capacity(memory, 1024);
///
///     assert!(provider.tile_stream(0, 0, 0).await.is_some());
///     let (size, capacity, count) = provider.cache_stats().await;
///     assert_eq!((size, capacity, count), (4, 1024, 1));
/// }
/// ```
pub struct CachedTileProvider<P> {
    inner: P,
    state: Mutex<CacheState>,
    max_size: usize,
}

impl<P: TileStreamProvider> CachedTileProvider<P> {
    /// Wrap `inner` with the default capacity.
    pub fn new(inner: P) -> Self {
        Self::with_capacity(inner, DEFAULT_TILE_CACHE_CAPACITY)
    }

    /// Wrap `inner` with a cache of `max_size` bytes.
    pub fn with_capacity(inner: P, max_size: usize) -> Self {
        Self::with_capacity_and_entries(inner, max_size, DEFAULT_MAX_ENTRIES)
    }

    /// Wrap `inner` with a cache of `max_size` bytes and at most
    /// `max_entries` tiles. A zero entry bound is raised to one.
    pub fn with_capacity_and_entries(inner: P, max_size: usize, max_entries: usize) -> Self {
        let max_entries = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            state: Mutex::new(CacheState {
                entries: LruCache::new(max_entries),
                current_size: 0,
            }),
            max_size,
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Returns `(current_size_bytes, capacity_bytes, entry_count)`.
    pub async fn cache_stats(&self) -> (usize, usize, usize) {
        let state = self.state.lock().await;
        (state.current_size, self.max_size, state.entries.len())
    }

    /// Drop every cached tile.
    pub async fn clear_cache(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.current_size = 0;
    }

    async fn get(&self, key: &TileKey) -> Option<Bytes> {
        self.state.lock().await.entries.get(key).cloned()
    }

    async fn put(&self, key: TileKey, data: Bytes) {
        let data_size = data.len();
        if data_size > self.max_size {
            // Would evict everything and still not fit
            return;
        }

        let mut state = self.state.lock().await;

        if let Some(old_size) = state.entries.peek(&key).map(Bytes::len) {
            state.current_size = state.current_size.saturating_sub(old_size);
        }

        // Returns the replaced entry, or the one pushed out by the count bound
        if let Some((evicted_key, evicted)) = state.entries.push(key, data) {
            if evicted_key != key {
                state.current_size = state.current_size.saturating_sub(evicted.len());
            }
        }
        state.current_size += data_size;

        while state.current_size > self.max_size {
            match state.entries.pop_lru() {
                Some((_, evicted)) => {
                    state.current_size = state.current_size.saturating_sub(evicted.len());
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl<P: TileStreamProvider> TileStreamProvider for CachedTileProvider<P> {
    async fn tile_stream(&self, row: u32, col: u32, level: usize) -> Option<Bytes> {
        let key = TileKey::new(level, row, col);

        if let Some(data) = self.get(&key).await {
            trace!(tile = %key, "tile cache hit");
            return Some(data);
        }

        let data = self.inner.tile_stream(row, col, level).await?;
        self.put(key, data.clone()).await;
        Some(data)
    }
}
