//! Construction parameters for a tile pyramid.

use serde::{Deserialize, Serialize};

use crate::error::PyramidError;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Default magnifying factor (pick the level at or above the requested
/// resolution, never render tiles upscaled).
pub const DEFAULT_MAGNIFYING_FACTOR: u32 = 0;

/// Immutable description of a tile pyramid.
///
/// The pyramid has `level_count` levels. The last level holds the map at
/// full resolution (`full_width` x `full_height` pixels at scale 1.0), and
/// each level below it halves the resolution.
///
/// Fields are only reachable through the validating constructors, including
/// when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPyramidParams")]
pub struct PyramidParams {
    level_count: usize,
    full_width: u32,
    full_height: u32,
    tile_size: u32,
    magnifying_factor: u32,
}

/// Unvalidated form of [`PyramidParams`], as found in serialized input.
#[derive(Deserialize)]
struct RawPyramidParams {
    level_count: usize,
    full_width: u32,
    full_height: u32,
    #[serde(default = "default_tile_size")]
    tile_size: u32,
    #[serde(default)]
    magnifying_factor: u32,
}

fn default_tile_size() -> u32 {
    DEFAULT_TILE_SIZE
}

impl TryFrom<RawPyramidParams> for PyramidParams {
    type Error = PyramidError;

    fn try_from(raw: RawPyramidParams) -> Result<Self, Self::Error> {
        Ok(Self::new(raw.level_count, raw.full_width, raw.full_height)?
            .with_tile_size(raw.tile_size)?
            .with_magnifying_factor(raw.magnifying_factor))
    }
}

impl PyramidParams {
    /// Create pyramid parameters with the default tile size and magnifying
    /// factor.
    ///
    /// # Errors
    ///
    /// Returns an error if `level_count` is zero or if either dimension is zero.
    pub fn new(level_count: usize, full_width: u32, full_height: u32) -> Result<Self, PyramidError> {
        if level_count < 1 {
            return Err(PyramidError::InvalidLevelCount { level_count });
        }
        if full_width == 0 || full_height == 0 {
            return Err(PyramidError::InvalidDimensions {
                width: full_width,
                height: full_height,
            });
        }

        Ok(Self {
            level_count,
            full_width,
            full_height,
            tile_size: DEFAULT_TILE_SIZE,
            magnifying_factor: DEFAULT_MAGNIFYING_FACTOR,
        })
    }

    /// Use a custom tile size.
    ///
    /// # Errors
    ///
    /// Returns an error if `tile_size` is zero.
    pub fn with_tile_size(mut self, tile_size: u32) -> Result<Self, PyramidError> {
        if tile_size == 0 {
            return Err(PyramidError::InvalidTileSize(tile_size));
        }
        self.tile_size = tile_size;
        Ok(self)
    }

    /// Use a custom magnifying factor.
    pub fn with_magnifying_factor(mut self, magnifying_factor: u32) -> Self {
        self.magnifying_factor = magnifying_factor;
        self
    }

    /// Number of levels (at least 1).
    pub fn level_count(&self) -> usize {
        self.level_count
    }

    /// Width of the map at scale 1.0.
    pub fn full_width(&self) -> u32 {
        self.full_width
    }

    /// Height of the map at scale 1.0.
    pub fn full_height(&self) -> u32 {
        self.full_height
    }

    /// Edge length of a square tile in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Bias toward coarser levels when picking a level for a scale.
    ///
    /// 0 picks the level immediately higher in resolution, so tiles are never
    /// magnified. 1 picks the level whose native scale is at most the current
    /// scale, rendered at a relative scale between 1.0 and 2.0.
    pub fn magnifying_factor(&self) -> u32 {
        self.magnifying_factor
    }

    /// Index of the full-resolution level.
    pub fn max_level(&self) -> usize {
        self.level_count - 1
    }
}
