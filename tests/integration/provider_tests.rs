//! Provider integration tests.
//!
//! Tests verify:
//! - Directory provider reads the `level/row/col` layout written to disk
//! - Missing files and levels are reported as absent, not as errors
//! - The byte cache serves repeated requests without touching the source

use std::sync::Arc;

use bytes::Bytes;

use pyramid_view::provider::{
    CachedTileProvider, DirectoryTileProvider, MapSource, MemoryTileProvider, TileStreamProvider,
};
use pyramid_view::tile::{TileDecoder, TileKey};

use super::test_utils::{png_tile, write_pyramid, MockTileProvider};

// =============================================================================
// Directory Provider
// =============================================================================

#[tokio::test]
async fn test_directory_pyramid_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let written = write_pyramid(dir.path(), 3, 1000, 256);
    // Levels are 250, 500 and 1000 pixels wide: 1 + 4 + 16 tiles
    assert_eq!(written, 21);

    let source = MapSource::directory(dir.path());
    let decoder = TileDecoder::new();

    let data = source.tile_stream(0, 0, 0).await.unwrap();
    assert_eq!(decoder.dimensions(&data).unwrap(), (250, 250));

    // Bottom-right edge tile of the finest level is cropped
    let data = source.tile_stream(3, 3, 2).await.unwrap();
    assert_eq!(decoder.dimensions(&data).unwrap(), (232, 232));
}

#[tokio::test]
async fn test_directory_absent_tiles() {
    let dir = tempfile::tempdir().unwrap();
    write_pyramid(dir.path(), 2, 512, 256);

    let source = MapSource::directory(dir.path());
    // Past the last column
    assert!(source.tile_stream(0, 2, 1).await.is_none());
    // Unknown level
    assert!(source.tile_stream(0, 0, 5).await.is_none());
}

#[tokio::test]
async fn test_directory_custom_extension() {
    let dir = tempfile::tempdir().unwrap();
    let row_dir = dir.path().join("0").join("0");
    std::fs::create_dir_all(&row_dir).unwrap();
    std::fs::write(row_dir.join("0.png"), png_tile(8, [1, 2, 3, 255])).unwrap();

    let jpg = DirectoryTileProvider::new(dir.path());
    assert!(jpg.tile_stream(0, 0, 0).await.is_none());

    let png = DirectoryTileProvider::new(dir.path()).with_extension("png");
    assert!(png.tile_stream(0, 0, 0).await.is_some());
}

// =============================================================================
// Cached Provider
// =============================================================================

#[tokio::test]
async fn test_cache_avoids_repeated_reads() {
    let mock = MockTileProvider::new().with_grid(1, 2, 2, 16);
    let provider = CachedTileProvider::new(mock);

    for _ in 0..3 {
        for row in 0..2 {
            for col in 0..2 {
                assert!(provider.tile_stream(row, col, 1).await.is_some());
            }
        }
    }
    assert_eq!(provider.inner().request_count(), 4);
    assert_eq!(provider.cache_stats().await.2, 4);
}

#[tokio::test]
async fn test_cache_eviction_refetches_from_source() {
    let tile = Bytes::from(vec![7u8; 300]);
    let mock = MockTileProvider::new()
        .with_tile(TileKey::new(0, 0, 0), tile.clone())
        .with_tile(TileKey::new(0, 0, 1), tile.clone())
        .with_tile(TileKey::new(0, 0, 2), tile);
    let provider = CachedTileProvider::with_capacity(mock, 700);

    provider.tile_stream(0, 0, 0).await;
    provider.tile_stream(0, 1, 0).await;
    provider.tile_stream(0, 2, 0).await;
    assert_eq!(provider.cache_stats().await, (600, 700, 2));

    // Column 0 was the least recently used entry
    provider.tile_stream(0, 0, 0).await;
    assert_eq!(provider.inner().request_count(), 4);
    assert_eq!(
        provider.inner().requests().last(),
        Some(&TileKey::new(0, 0, 0))
    );
}

#[tokio::test]
async fn test_cache_shared_between_tasks() {
    let memory = MemoryTileProvider::new().with_tile(TileKey::new(0, 0, 0), png_tile(8, [0; 4]));
    let provider = Arc::new(CachedTileProvider::new(MapSource::from(memory)));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move { provider.tile_stream(0, 0, 0).await.is_some() })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap());
    }
    assert_eq!(provider.cache_stats().await.2, 1);
}
