//! Tile stream providers.
//!
//! A provider hands out the encoded bytes of a tile given its row, column
//! and level. It says nothing about the image format: decoding happens in
//! [`crate::tile::TileDecoder`].
//!
//! ```text
//!          TileLoader
//!              │ tile_stream(row, col, level)
//!              ▼
//!   ┌──────────────────────┐
//!   │  CachedTileProvider  │  (optional LRU byte cache)
//!   └──────────┬───────────┘
//!              ▼
//!   ┌──────────────────────┐
//!   │      MapSource       │
//!   └──────────┬───────────┘
//!        ┌─────┴──────┐
//!        ▼            ▼
//!   Directory      Memory
//! ```
//!
//! Absence is not an error: a provider returns `None` for tiles it has no
//! data for, and the loader renders those cells blank.

mod cached;
mod directory;
mod memory;

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

pub use cached::{CachedTileProvider, DEFAULT_MAX_ENTRIES, DEFAULT_TILE_CACHE_CAPACITY};
pub use directory::{DirectoryTileProvider, DEFAULT_TILE_EXTENSION};
pub use memory::MemoryTileProvider;

// =============================================================================
// TileStreamProvider Trait
// =============================================================================

/// Source of encoded tile bytes.
#[async_trait]
pub trait TileStreamProvider: Send + Sync {
    /// Get the encoded bytes of a tile.
    ///
    /// Returns `None` when the provider has no data for the tile. Rows and
    /// columns are never negative: off-map tiles are skipped before this is
    /// called.
    async fn tile_stream(&self, row: u32, col: u32, level: usize) -> Option<Bytes>;
}

#[async_trait]
impl<P: TileStreamProvider + ?Sized> TileStreamProvider for std::sync::Arc<P> {
    async fn tile_stream(&self, row: u32, col: u32, level: usize) -> Option<Bytes> {
        (**self).tile_stream(row, col, level).await
    }
}

// =============================================================================
// MapSource
// =============================================================================

/// The closed set of tile sources a map can be backed by.
#[derive(Debug)]
pub enum MapSource {
    /// Tiles stored as files under `<root>/<level>/<row>/<col><ext>`
    Directory(DirectoryTileProvider),

    /// Tiles held in memory
    Memory(MemoryTileProvider),
}

impl MapSource {
    /// Directory source with the default tile extension.
    pub fn directory(root: impl Into<PathBuf>) -> Self {
        MapSource::Directory(DirectoryTileProvider::new(root))
    }

    /// Short name of the source kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            MapSource::Directory(_) => "directory",
            MapSource::Memory(_) => "memory",
        }
    }
}

impl From<DirectoryTileProvider> for MapSource {
    fn from(provider: DirectoryTileProvider) -> Self {
        MapSource::Directory(provider)
    }
}

impl From<MemoryTileProvider> for MapSource {
    fn from(provider: MemoryTileProvider) -> Self {
        MapSource::Memory(provider)
    }
}

#[async_trait]
impl TileStreamProvider for MapSource {
    async fn tile_stream(&self, row: u32, col: u32, level: usize) -> Option<Bytes> {
        match self {
            MapSource::Directory(p) => p.tile_stream(row, col, level).await,
            MapSource::Memory(p) => p.tile_stream(row, col, level).await,
        }
    }
}
