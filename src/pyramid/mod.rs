//! Tile pyramid geometry.
//!
//! A pyramid stores the same map at several discrete resolutions. This
//! module answers, for a continuous scale and a viewport, which level to read
//! tiles from, how much extra downsampling to apply, and which tiles cover
//! the viewport.
//!
//! # Components
//!
//! - [`PyramidParams`]: validated pyramid dimensions and level-selection bias
//! - [`LevelScaleTable`]: level index to reference scale
//! - [`VisibleTilesResolver`]: current level, sub-sample and tile rectangle
//! - [`Viewport`] / [`VisibleTiles`]: resolver input and output

mod levels;
mod params;
mod resolver;

pub use levels::LevelScaleTable;
pub use params::{PyramidParams, DEFAULT_MAGNIFYING_FACTOR, DEFAULT_TILE_SIZE};
pub use resolver::{compute_sub_sample, pick_level, Viewport, VisibleTiles, VisibleTilesResolver};
