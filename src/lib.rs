//! # pyramid-view
//!
//! Visible-tile resolution and tile loading for pyramidal tiled maps.
//!
//! A tiled map stores the same image at several discrete resolutions
//! (levels), each cut into square tiles. For a continuous display scale and
//! a viewport, this library decides which level to read, how much extra
//! downsampling to apply, which tiles cover the viewport, and loads those
//! tiles while reusing their pixel buffers.
//!
//! ## Architecture
//!
//! - [`pyramid`] - Level table and visible tiles resolver
//! - [`tile`] - Tile keys, bitmaps, the bitmap pool, decoder and loader
//! - [`provider`] - Sources of encoded tile bytes
//! - [`events`] - Single-slot change notifications
//! - [`view`] - Map view tying resolver, viewport and notifications together
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```
//! use pyramid_view::{PyramidParams, Viewport, VisibleTilesResolver};
//!
//! let params = PyramidParams::new(5, 2560, 2560).unwrap();
//! let mut resolver = VisibleTilesResolver::new(params).unwrap();
//!
//! resolver.set_scale(0.01);
//! assert_eq!(resolver.current_level(), 0);
//! assert_eq!(resolver.sub_sample(), 3);
//!
//! let tiles = resolver.visible_tiles(&Viewport::new(0, 0, 256, 256));
//! assert_eq!(tiles.tile_count(), 1);
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod provider;
pub mod pyramid;
pub mod tile;
pub mod view;

// Re-export commonly used types
pub use config::{Cli, Command, LoadConfig, PyramidArgs, ResolveConfig, ViewArgs};
pub use error::{IoError, PyramidError, TileError};
pub use events::{SignalBus, SignalReceiver};
pub use provider::{
    CachedTileProvider, DirectoryTileProvider, MapSource, MemoryTileProvider, TileStreamProvider,
};
pub use pyramid::{
    compute_sub_sample, pick_level, LevelScaleTable, PyramidParams, Viewport, VisibleTiles,
    VisibleTilesResolver,
};
pub use tile::{BitmapPool, TileBitmap, TileDecoder, TileKey, TileLoader};
pub use view::{MapView, ScaleChange};
