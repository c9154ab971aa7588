//! Map view integration tests.
//!
//! Tests verify:
//! - A loader task driven by visible-tile notifications follows the view
//! - Scale notifications carry the level and sub-sample
//! - Listeners that fall behind only see the latest rectangle

use std::sync::Arc;

use tokio::sync::oneshot;

use pyramid_view::pyramid::{PyramidParams, Viewport};
use pyramid_view::tile::{BitmapPool, TileKey, TileLoader};
use pyramid_view::view::MapView;

use super::test_utils::MockTileProvider;

fn make_view() -> MapView {
    let params = PyramidParams::new(5, 2560, 2560).unwrap();
    MapView::new(params, Viewport::new(0, 0, 512, 512)).unwrap()
}

#[tokio::test]
async fn test_loader_task_follows_view() {
    let mut view = make_view();
    let mut visible_rx = view.subscribe_visible_tiles();

    let provider = Arc::new(MockTileProvider::new().with_grid(3, 5, 5, 256));
    let (done_tx, done_rx) = oneshot::channel();

    let worker = tokio::spawn(async move {
        let mut loader = TileLoader::new(provider, Arc::new(BitmapPool::new()), 256);
        let mut done_tx = Some(done_tx);
        while let Some(visible) = visible_rx.recv().await {
            loader.update(&visible);
            loader.wait_idle().await;
            if visible.level == 3 {
                let mut keys: Vec<TileKey> = loader.loaded_keys().copied().collect();
                keys.sort();
                if let Some(tx) = done_tx.take() {
                    let _ = tx.send(keys);
                }
            }
        }
        loader.loaded_count()
    });

    // Level 3 at its native scale: 512px covers 2x2 tiles
    view.set_scale(0.5);
    let keys = done_rx.await.unwrap();
    assert_eq!(
        keys,
        vec![
            TileKey::new(3, 0, 0),
            TileKey::new(3, 0, 1),
            TileKey::new(3, 1, 0),
            TileKey::new(3, 1, 1),
        ]
    );

    drop(view);
    assert_eq!(worker.await.unwrap(), 4);
}

#[tokio::test]
async fn test_scale_notifications() {
    let mut view = make_view();
    let mut scale_rx = view.subscribe_scale();

    view.set_scale(0.01);
    let change = scale_rx.recv().await.unwrap();
    assert_eq!(change.level, 0);
    assert_eq!(change.sub_sample, 3);

    view.set_scale(1.0);
    let change = scale_rx.recv().await.unwrap();
    assert_eq!(change.level, 4);
    assert_eq!(change.sub_sample, 0);
}

#[tokio::test]
async fn test_slow_listener_gets_latest_rectangle() {
    let mut view = make_view();
    let mut visible_rx = view.subscribe_visible_tiles();

    for step in 1..=5 {
        view.set_viewport(Viewport::new(0, 0, 512, 512).translated(step * 256, 0));
    }

    let latest = visible_rx.recv().await.unwrap();
    assert_eq!(latest, *view.visible_tiles());
    assert_eq!((latest.col_left, latest.col_right), (5, 6));
    assert!(visible_rx.try_recv().is_none());
}
