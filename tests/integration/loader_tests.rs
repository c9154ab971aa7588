//! Tile loader integration tests.
//!
//! Tests verify:
//! - The loaded set follows the resolver while panning and zooming
//! - Bitmaps of evicted tiles are reused for new tiles
//! - Requests for tiles that left the view are cancelled
//! - Tiles are decoded at the sub-sampled size when zoomed out

use std::sync::Arc;
use std::time::Duration;

use pyramid_view::provider::{CachedTileProvider, MapSource};
use pyramid_view::pyramid::{PyramidParams, Viewport, VisibleTilesResolver};
use pyramid_view::tile::{BitmapPool, TileKey, TileLoader};

use super::test_utils::{write_pyramid, MockTileProvider};

fn resolver(level_count: usize, size: u32, tile_size: u32) -> VisibleTilesResolver {
    let params = PyramidParams::new(level_count, size, size)
        .unwrap()
        .with_tile_size(tile_size)
        .unwrap();
    VisibleTilesResolver::new(params).unwrap()
}

#[tokio::test]
async fn test_pan_reuses_evicted_bitmaps() {
    let provider = Arc::new(MockTileProvider::new().with_grid(2, 8, 8, 32));
    let pool = Arc::new(BitmapPool::new());
    let mut loader = TileLoader::new(Arc::clone(&provider), Arc::clone(&pool), 32);

    let mut resolver = resolver(3, 256, 32);
    resolver.set_scale(1.0);

    let mut viewport = Viewport::new(0, 0, 64, 64);
    loader.update(&resolver.visible_tiles(&viewport));
    loader.wait_idle().await;
    assert_eq!(loader.loaded_count(), 4);

    // One tile to the right: the left column is evicted into the pool
    viewport = viewport.translated(32, 0);
    loader.update(&resolver.visible_tiles(&viewport));
    assert_eq!(pool.len(), 2);
    assert_eq!(loader.in_flight_count(), 2);

    loader.wait_idle().await;
    assert_eq!(loader.loaded_count(), 4);
    assert!(pool.is_empty());
    assert!(loader.tile(&TileKey::new(2, 0, 2)).is_some());
    assert!(loader.tile(&TileKey::new(2, 0, 0)).is_none());

    // Tiles that stayed visible were not requested again
    assert_eq!(provider.request_count(), 6);
}

#[tokio::test]
async fn test_tiles_leaving_view_are_cancelled() {
    let provider = Arc::new(
        MockTileProvider::new()
            .with_grid(1, 4, 4, 16)
            .with_delay(Duration::from_millis(200)),
    );
    let mut loader = TileLoader::new(Arc::clone(&provider), Arc::new(BitmapPool::new()), 16);

    let mut resolver = resolver(2, 64, 16);
    resolver.set_scale(1.0);

    loader.update(&resolver.visible_tiles(&Viewport::new(0, 0, 32, 32)));
    assert_eq!(loader.in_flight_count(), 4);

    // Jump to the opposite corner before anything completed
    loader.update(&resolver.visible_tiles(&Viewport::new(32, 32, 64, 64)));
    assert_eq!(loader.in_flight_count(), 4);

    loader.wait_idle().await;
    let mut keys: Vec<TileKey> = loader.loaded_keys().copied().collect();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            TileKey::new(1, 2, 2),
            TileKey::new(1, 2, 3),
            TileKey::new(1, 3, 2),
            TileKey::new(1, 3, 3),
        ]
    );
}

#[tokio::test]
async fn test_zoom_out_decodes_sub_sampled_tiles() {
    let dir = tempfile::tempdir().unwrap();
    write_pyramid(dir.path(), 3, 1024, 256);

    let provider = Arc::new(CachedTileProvider::new(MapSource::directory(dir.path())));
    let pool = Arc::new(BitmapPool::new());
    let mut loader = TileLoader::new(provider, Arc::clone(&pool), 256);

    let mut resolver = resolver(3, 1024, 256);
    let viewport = Viewport::new(0, 0, 512, 512);

    resolver.set_scale(1.0);
    loader.update(&resolver.visible_tiles(&viewport));
    loader.wait_idle().await;
    assert_eq!(loader.loaded_count(), 4);
    assert_eq!(
        loader.tile(&TileKey::new(2, 1, 1)).unwrap().dimensions(),
        (256, 256)
    );

    // Coarsest scale is 0.25; 0.05 needs floor(log2(0.25 / 0.05 + 2)) = 2
    resolver.set_scale(0.05);
    assert_eq!(resolver.current_level(), 0);
    assert_eq!(resolver.sub_sample(), 2);

    loader.update(&resolver.visible_tiles(&viewport));
    // A sub-sample change drops everything, pooled buffers included
    assert_eq!(loader.loaded_count(), 0);
    assert!(pool.is_empty());

    loader.wait_idle().await;
    assert_eq!(loader.loaded_count(), 1);
    assert_eq!(
        loader.tile(&TileKey::new(0, 0, 0)).unwrap().dimensions(),
        (64, 64)
    );
}

#[tokio::test]
async fn test_missing_tiles_render_blank() {
    let provider = Arc::new(MockTileProvider::new().with_grid(0, 1, 1, 16));
    let mut loader = TileLoader::new(Arc::clone(&provider), Arc::new(BitmapPool::new()), 16);

    let mut resolver = resolver(1, 64, 16);
    resolver.set_scale(1.0);
    let visible = resolver.visible_tiles(&Viewport::new(0, 0, 32, 32));

    loader.update(&visible);
    loader.wait_idle().await;
    assert_eq!(loader.loaded_count(), 1);
    assert_eq!(loader.missing_count(), 3);

    // Known-missing tiles are not asked for again while visible
    loader.update(&visible);
    loader.wait_idle().await;
    assert_eq!(provider.request_count(), 4);
}

#[tokio::test]
async fn test_poll_completed_applies_results() {
    let provider = Arc::new(MockTileProvider::new().with_grid(0, 1, 1, 16));
    let mut loader = TileLoader::new(provider, Arc::new(BitmapPool::new()), 16);

    let mut resolver = resolver(1, 16, 16);
    resolver.set_scale(1.0);
    loader.update(&resolver.visible_tiles(&Viewport::new(0, 0, 16, 16)));

    let mut processed = 0;
    for _ in 0..100 {
        processed += loader.poll_completed();
        if loader.in_flight_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(processed, 1);
    assert_eq!(loader.loaded_count(), 1);
}
