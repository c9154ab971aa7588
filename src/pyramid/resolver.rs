//! Visible tiles resolution.
//!
//! The resolver is the single source of truth for which level, how much
//! sub-sampling, and which tile rectangle are needed to cover a viewport.
//!
//! # Level selection
//!
//! For a continuous scale `s`, the fractional level is
//! `(level_count - 1 - magnifying_factor) + log2(s)`. It is clamped to
//! `[0, level_count - 1]` and rounded up, so that with a magnifying factor of
//! 0 the picked level always has a native resolution at least as high as the
//! requested one.
//!
//! # Sub-sampling
//!
//! Below the scale of level 0 there is no coarser level to switch to. The
//! level 0 tiles are then decoded with an additional power-of-two
//! downsampling of `floor(log2(scale(0) / s + 2))`.
//!
//! # Tile rectangle
//!
//! Viewport coordinates are expressed at the current scale, tile indices at
//! the scale of the current level. Bounds are clamped to the last tile index
//! of the level from above only: a viewport extending left of or above the
//! map yields negative indices, which [`VisibleTiles::keys`] skips.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PyramidError;
use crate::tile::TileKey;

use super::levels::LevelScaleTable;
use super::params::PyramidParams;

// =============================================================================
// Viewport
// =============================================================================

/// Visible area of the map in pixels, at the current scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Viewport {
    /// Create a viewport from its edges.
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Height in pixels.
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Move the viewport by `(dx, dy)` pixels.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }
}

impl FromStr for Viewport {
    type Err = String;

    /// Parse `"left,top,right,bottom"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(format!(
                "expected viewport as left,top,right,bottom, got '{}'",
                s
            ));
        }

        let mut values = [0i32; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .parse()
                .map_err(|_| format!("invalid viewport coordinate '{}'", part))?;
        }

        let [left, top, right, bottom] = values;
        if right < left || bottom < top {
            return Err(format!(
                "viewport edges are inverted: right must be >= left and bottom >= top, got '{}'",
                s
            ));
        }

        Ok(Self::new(left, top, right, bottom))
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.left, self.top, self.right, self.bottom)
    }
}

// =============================================================================
// Visible Tiles
// =============================================================================

/// Snapshot of the tiles needed to cover a viewport.
///
/// Bounds are inclusive. They are clamped to the last tile of the level but
/// may be negative when the viewport extends past the top or left map edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisibleTiles {
    /// 0-based level index
    pub level: usize,
    pub col_left: i32,
    pub row_top: i32,
    pub col_right: i32,
    pub row_bottom: i32,
    /// Additional power-of-two downsampling of the level's tiles
    pub sub_sample: u32,
}

impl VisibleTiles {
    /// Iterate over the on-map tiles of the rectangle, row by row.
    ///
    /// Negative row and column indices are off-map and are skipped.
    pub fn keys(&self) -> impl Iterator<Item = TileKey> + '_ {
        let level = self.level;
        let (cols, rows) = (self.on_map_cols(), self.on_map_rows());
        rows.flat_map(move |row| cols.clone().map(move |col| TileKey::new(level, row, col)))
    }

    /// Number of on-map tiles in the rectangle.
    pub fn tile_count(&self) -> usize {
        self.on_map_cols().count() * self.on_map_rows().count()
    }

    /// Whether `key` is one of the on-map tiles of this rectangle.
    pub fn contains(&self, key: &TileKey) -> bool {
        key.level == self.level
            && self.on_map_rows().contains(&key.row)
            && self.on_map_cols().contains(&key.col)
    }

    fn on_map_cols(&self) -> Range<u32> {
        on_map_range(self.col_left, self.col_right)
    }

    fn on_map_rows(&self) -> Range<u32> {
        on_map_range(self.row_top, self.row_bottom)
    }
}

/// Half-open range of the non-negative indices in `start..=end`.
fn on_map_range(start: i32, end: i32) -> Range<u32> {
    if end < 0 || end < start {
        return 0..0;
    }
    (start.max(0) as u32)..(end as u32 + 1)
}

// =============================================================================
// Level Selection
// =============================================================================

/// Pick the level to display at `scale`.
///
/// The result is always in `[0, level_count - 1]`. It is non-decreasing in
/// `scale`, and for a magnifying factor of 0 a scale exactly equal to the
/// scale of level `k` selects `k`.
pub fn pick_level(scale: f32, level_count: usize, magnifying_factor: u32) -> usize {
    let max_level = level_count.saturating_sub(1) as f64;

    // Can be negative, fractional, or above max_level
    let partial_level = max_level - magnifying_factor as f64 + (scale as f64).log2();
    if partial_level.is_nan() {
        return 0;
    }

    let capped_level = partial_level.min(max_level);
    capped_level.max(0.0).ceil() as usize
}

/// Compute the extra power-of-two downsampling needed at `scale`.
///
/// Returns 0 when `scale` is at or above `coarsest_scale` (the scale of
/// level 0), and `floor(log2(coarsest_scale / scale + 2))` otherwise.
pub fn compute_sub_sample(scale: f32, coarsest_scale: f32) -> u32 {
    if scale < coarsest_scale {
        (coarsest_scale as f64 / scale as f64 + 2.0).log2().floor() as u32
    } else {
        0
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves the visible tiles of a pyramid for a scale and a viewport.
///
/// The resolver is not synchronized. A view driven from several input
/// sources must serialize calls to [`set_scale`](Self::set_scale).
///
/// # Example
///
/// ```
/// use pyramid_view::pyramid::{PyramidParams, Viewport, VisibleTilesResolver};
///
/// let params = PyramidParams::new(5, 2560, 2560).unwrap();
/// let mut resolver = VisibleTilesResolver::new(params).unwrap();
///
/// resolver.set_scale(0.5);
/// assert_eq!(resolver.current_level(), 3);
///
/// let tiles = resolver.visible_tiles(&Viewport::new(0, 0, 256, 256));
/// assert_eq!((tiles.col_left, tiles.col_right), (0, 0));
/// ```
#[derive(Debug, Clone)]
pub struct VisibleTilesResolver {
    params: PyramidParams,
    levels: LevelScaleTable,
    scale: f32,
    current_level: usize,
    sub_sample: u32,
}

impl VisibleTilesResolver {
    /// Create a resolver at scale 1.0.
    ///
    /// # Errors
    ///
    /// Returns an error if the level count is zero.
    pub fn new(params: PyramidParams) -> Result<Self, PyramidError> {
        let levels = LevelScaleTable::new(params.level_count())?;
        Ok(Self {
            params,
            levels,
            scale: 1.0,
            current_level: params.max_level(),
            sub_sample: 0,
        })
    }

    /// Update the current scale, level and sub-sample.
    ///
    /// `scale` must be strictly positive.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.sub_sample = compute_sub_sample(scale, self.levels.coarsest_scale());
        self.current_level = pick_level(
            scale,
            self.params.level_count(),
            self.params.magnifying_factor(),
        );
    }

    /// Level picked for the current scale.
    pub fn current_level(&self) -> usize {
        self.current_level
    }

    /// Scale last passed to [`set_scale`](Self::set_scale) (1.0 initially).
    pub fn current_scale(&self) -> f32 {
        self.scale
    }

    /// Sub-sample computed for the current scale.
    pub fn sub_sample(&self) -> u32 {
        self.sub_sample
    }

    /// Scale of `level`, or `None` if no such level was configured.
    pub fn scale_for_level(&self, level: usize) -> Option<f32> {
        self.levels.scale_for_level(level)
    }

    pub fn params(&self) -> &PyramidParams {
        &self.params
    }

    pub fn levels(&self) -> &LevelScaleTable {
        &self.levels
    }

    /// Last valid `(column, row)` index at `level`, or `None` for an unknown
    /// level.
    pub fn max_tile_index(&self, level: usize) -> Option<(i32, i32)> {
        let scale = self.levels.scale_for_level(level)?;
        Some(self.max_tile_index_at_scale(scale))
    }

    fn max_tile_index_at_scale(&self, scale_at_level: f32) -> (i32, i32) {
        let tile_size = self.params.tile_size() as f32;
        let last_index = |full: u32| {
            let tiles = full as f32 * scale_at_level / tile_size;
            (tiles.ceil() as i32 - 1).max(0)
        };
        (
            last_index(self.params.full_width()),
            last_index(self.params.full_height()),
        )
    }

    /// Get the tiles covering `viewport` at the current level.
    ///
    /// # Panics
    ///
    /// Panics if the current level has no scale, which would mean level
    /// selection produced an out-of-range level.
    pub fn visible_tiles(&self, viewport: &Viewport) -> VisibleTiles {
        let scale_at_level = match self.levels.scale_for_level(self.current_level) {
            Some(scale) => scale,
            None => unreachable!(
                "current level {} is outside the {} configured levels",
                self.current_level,
                self.levels.level_count()
            ),
        };
        let relative_scale = self.scale / scale_at_level;

        let (max_col, max_row) = self.max_tile_index_at_scale(scale_at_level);

        let scaled_tile_size = self.params.tile_size() as f64 * relative_scale as f64;

        let first = |edge: i32, max: i32| ((edge as f64 / scaled_tile_size).floor() as i32).min(max);
        let last = |edge: i32, max: i32| {
            ((edge as f64 / scaled_tile_size).ceil() as i32)
                .saturating_sub(1)
                .min(max)
        };

        VisibleTiles {
            level: self.current_level,
            col_left: first(viewport.left, max_col),
            row_top: first(viewport.top, max_row),
            col_right: last(viewport.right, max_col),
            row_bottom: last(viewport.bottom, max_row),
            sub_sample: self.sub_sample,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
