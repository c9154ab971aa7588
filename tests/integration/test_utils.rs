//! Test utilities for integration tests.
//!
//! This module provides a mock provider with request tracking and helpers
//! for building encoded tiles and on-disk tile pyramids.

use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use pyramid_view::provider::TileStreamProvider;
use pyramid_view::tile::TileKey;

// =============================================================================
// Encoded Tiles
// =============================================================================

/// Encode a uniform PNG tile.
pub fn png_tile(size: u32, color: [u8; 4]) -> Bytes {
    let img = RgbaImage::from_pixel(size, size, Rgba(color));
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode PNG tile");
    Bytes::from(buf)
}

/// Encode a JPEG tile with a gradient, so every tile is distinct.
pub fn jpeg_tile(width: u32, height: u32, seed: u8) -> Bytes {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([seed, (x % 256) as u8, (y % 256) as u8])
    });
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 90)
        .encode_image(&img)
        .expect("encode JPEG tile");
    Bytes::from(buf)
}

/// Write a full pyramid of JPEG tiles under `root`.
///
/// Level `i` of `level_count` covers `full_size / 2^(level_count - i - 1)`
/// pixels; edge tiles are cropped to the level size.
pub fn write_pyramid(root: &Path, level_count: usize, full_size: u32, tile_size: u32) -> usize {
    let mut written = 0;
    for level in 0..level_count {
        let shift = (level_count - level - 1) as u32;
        let level_size = (full_size >> shift).max(1);
        let tiles = level_size.div_ceil(tile_size);

        for row in 0..tiles {
            let row_dir = root.join(level.to_string()).join(row.to_string());
            std::fs::create_dir_all(&row_dir).expect("create tile directory");

            for col in 0..tiles {
                let width = tile_size.min(level_size - col * tile_size);
                let height = tile_size.min(level_size - row * tile_size);
                let data = jpeg_tile(width, height, (level * 10) as u8);
                std::fs::write(row_dir.join(format!("{}.jpg", col)), &data)
                    .expect("write tile");
                written += 1;
            }
        }
    }
    written
}

// =============================================================================
// Mock Tile Provider with Request Tracking
// =============================================================================

/// A mock provider that serves pre-configured tiles and records requests.
pub struct MockTileProvider {
    tiles: HashMap<TileKey, Bytes>,
    delay: Option<Duration>,
    request_count: AtomicUsize,
    requests: Mutex<Vec<TileKey>>,
}

impl MockTileProvider {
    pub fn new() -> Self {
        Self {
            tiles: HashMap::new(),
            delay: None,
            request_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tile(mut self, key: TileKey, data: Bytes) -> Self {
        self.tiles.insert(key, data);
        self
    }

    /// Fill `rows` x `cols` tiles of `level` with uniform PNG tiles.
    pub fn with_grid(mut self, level: usize, rows: u32, cols: u32, tile_size: u32) -> Self {
        for row in 0..rows {
            for col in 0..cols {
                let shade = ((row * cols + col) % 256) as u8;
                self.tiles.insert(
                    TileKey::new(level, row, col),
                    png_tile(tile_size, [shade, shade, shade, 255]),
                );
            }
        }
        self
    }

    /// Sleep this long before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<TileKey> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl TileStreamProvider for MockTileProvider {
    async fn tile_stream(&self, row: u32, col: u32, level: usize) -> Option<Bytes> {
        let key = TileKey::new(level, row, col);
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().expect("requests lock").push(key);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.tiles.get(&key).cloned()
    }
}
