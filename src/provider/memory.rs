use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::tile::TileKey;

use super::TileStreamProvider;

/// Provider backed by an in-memory map of encoded tiles.
#[derive(Debug, Clone, Default)]
pub struct MemoryTileProvider {
    tiles: HashMap<TileKey, Bytes>,
}

impl MemoryTileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_tile(mut self, key: TileKey, data: Bytes) -> Self {
        self.insert(key, data);
        self
    }

    /// Store the bytes of a tile, replacing any previous entry.
    pub fn insert(&mut self, key: TileKey, data: Bytes) -> Option<Bytes> {
        self.tiles.insert(key, data)
    }

    pub fn remove(&mut self, key: &TileKey) -> Option<Bytes> {
        self.tiles.remove(key)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

#[async_trait]
impl TileStreamProvider for MemoryTileProvider {
    async fn tile_stream(&self, row: u32, col: u32, level: usize) -> Option<Bytes> {
        self.tiles.get(&TileKey::new(level, row, col)).cloned()
    }
}
