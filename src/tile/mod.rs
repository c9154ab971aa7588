//! Tile loading layer.
//!
//! Turns a [`VisibleTiles`](crate::pyramid::VisibleTiles) rectangle into
//! decoded bitmaps.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │                MapView                  │
//! └────────────────────┬────────────────────┘
//!                      │ VisibleTiles
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │               TileLoader                │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  BitmapPool  │  │   TileDecoder   │  │
//! │  │  (reusable   │  │  (decode +      │  │
//! │  │   buffers)   │  │   sub-sample)   │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │ (row, col, level)
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           TileStreamProvider            │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileKey`]: identifies one tile of the pyramid
//! - [`TileBitmap`]: decoded RGBA pixels of one tile
//! - [`BitmapPool`]: free-list of reusable bitmaps
//! - [`TileDecoder`]: decodes encoded tiles, with optional downsampling
//! - [`TileLoader`]: keeps the decoded set in sync with the visible rectangle

mod bitmap;
mod decoder;
mod key;
mod loader;
mod pool;

pub use bitmap::TileBitmap;
pub use decoder::{expected_dimension, TileDecoder};
pub use key::TileKey;
pub use loader::TileLoader;
pub use pool::BitmapPool;
