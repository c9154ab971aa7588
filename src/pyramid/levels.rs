//! Level to scale mapping.
//!
//! The last level of a pyramid is at scale 1.0 and every level below it is
//! at half the scale of the next one:
//!
//! ```text
//! level:   0        1       ...   n-2    n-1
//! scale:   1/2^(n-1) 1/2^(n-2) ... 0.5    1.0
//! ```

use crate::error::PyramidError;

/// Static table mapping a level index to its reference scale.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelScaleTable {
    scales: Vec<f32>,
}

impl LevelScaleTable {
    /// Build the table for a pyramid with `level_count` levels.
    ///
    /// # Errors
    ///
    /// Returns [`PyramidError::InvalidLevelCount`] if `level_count` is zero.
    pub fn new(level_count: usize) -> Result<Self, PyramidError> {
        if level_count < 1 {
            return Err(PyramidError::InvalidLevelCount { level_count });
        }

        let scales = (0..level_count)
            .map(|level| {
                let exponent = (level_count - level - 1) as i32;
                (1.0 / 2f64.powi(exponent)) as f32
            })
            .collect();

        Ok(Self { scales })
    }

    /// Number of levels in the table.
    pub fn level_count(&self) -> usize {
        self.scales.len()
    }

    /// Scale of `level`, or `None` if no such level is configured.
    pub fn scale_for_level(&self, level: usize) -> Option<f32> {
        self.scales.get(level).copied()
    }

    /// Scale of level 0, the coarsest level.
    pub fn coarsest_scale(&self) -> f32 {
        // The constructor guarantees at least one level
        self.scales[0]
    }

    /// Iterate over `(level, scale)` pairs from coarsest to finest.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.scales.iter().copied().enumerate()
    }
}
