//! Reuse pool for decoded tile bitmaps.
//!
//! Tiles constantly enter and leave the visible set while the user pans and
//! zooms. Instead of allocating a fresh buffer for every decoded tile, the
//! loader returns the buffers of evicted tiles to the pool and decodes new
//! tiles into them.
//!
//! The pool is a plain free-list: no bound, no eviction, no ordering, and no
//! validation of what is released into it. Callers must only release buffers
//! of the standard tile geometry currently in use.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::bitmap::TileBitmap;

/// Free-list of reusable tile bitmaps.
///
/// The list is guarded by a mutex so decode workers can share the pool
/// through an `Arc`.
#[derive(Debug, Default)]
pub struct BitmapPool {
    free: Mutex<Vec<TileBitmap>>,
}

impl BitmapPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take any released bitmap out of the pool.
    ///
    /// The content of the returned bitmap is stale and must be overwritten.
    /// `None` means the pool is empty and the caller should allocate.
    pub fn acquire(&self) -> Option<TileBitmap> {
        self.lock().pop()
    }

    /// Hand a bitmap back for future reuse.
    pub fn release(&self, bitmap: TileBitmap) {
        self.lock().push(bitmap);
    }

    /// Number of bitmaps available for reuse.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every pooled bitmap.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TileBitmap>> {
        // A panic while holding the lock cannot leave the Vec half-updated
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
