//! Board dimensions and cell addressing
//!
//! Cells are addressed by a linear position `p ∈ [0, width*height)`.
//! Two mappings to 2-D coordinates coexist and both are load-bearing:
//!
//! - Host coordinates: `p = x + height * y`. Kept as-is for compatibility with
//!   existing touch-mapping callers, even though it pairs `height` with `y`.
//! - Image coordinates: `(p % width, p / width)`. Used for GPU texels and for
//!   neighbour arithmetic, where a row is `width` cells long.
//!
//! On square boards the two coincide.

use crate::error::LifeError;
use serde::{Deserialize, Serialize};

/// Validated, immutable board size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardDimensions {
    width: u32,
    height: u32,
}

impl BoardDimensions {
    /// Validate and create board dimensions
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::InvalidDimensions`] unless `width > 0`, `height > 0`
    /// and `width + height >= 3`.
    pub fn new(width: u32, height: u32) -> Result<Self, LifeError> {
        if width == 0 || height == 0 || u64::from(width) + u64::from(height) < 3 {
            return Err(LifeError::InvalidDimensions { width, height });
        }

        // width * height must be addressable
        if usize::try_from(u64::from(width) * u64::from(height)).is_err() {
            return Err(LifeError::InvalidDimensions { width, height });
        }

        Ok(Self { width, height })
    }

    /// Board width in cells
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Board height in cells
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells (`width * height`)
    pub const fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Linear position of host coordinates, `x + height * y`
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::OutOfRange`] if the resulting position is off the board.
    pub fn position(&self, x: u32, y: u32) -> Result<usize, LifeError> {
        let position = u64::from(x) + u64::from(self.height) * u64::from(y);
        let position = usize::try_from(position).unwrap_or(usize::MAX);
        self.check_position(position)?;
        Ok(position)
    }

    /// Ensure `position` lies in `[0, width*height)`
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::OutOfRange`] otherwise.
    pub fn check_position(&self, position: usize) -> Result<(), LifeError> {
        if position < self.cell_count() {
            Ok(())
        } else {
            Err(LifeError::OutOfRange {
                position,
                cell_count: self.cell_count(),
            })
        }
    }

    /// Image coordinates `(column, row)` of a linear position
    pub const fn texel(&self, position: usize) -> (u32, u32) {
        let width = self.width as usize;
        ((position % width) as u32, (position / width) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_dimensions() {
        for (w, h) in [(1, 2), (2, 1), (3, 3), (5, 5), (64, 32), (1, 100)] {
            let dims = BoardDimensions::new(w, h).unwrap();
            assert_eq!(dims.width(), w);
            assert_eq!(dims.height(), h);
            assert_eq!(dims.cell_count(), (w * h) as usize);
        }
    }

    #[test]
    fn test_invalid_dimensions() {
        for (w, h) in [(0, 0), (0, 5), (5, 0), (1, 1)] {
            assert_eq!(
                BoardDimensions::new(w, h),
                Err(LifeError::InvalidDimensions {
                    width: w,
                    height: h
                })
            );
        }
    }

    #[test]
    fn test_host_position_mapping() {
        // x + height * y, deliberately not x + width * y
        let dims = BoardDimensions::new(4, 3).unwrap();
        assert_eq!(dims.position(0, 0), Ok(0));
        assert_eq!(dims.position(2, 1), Ok(5));
        assert_eq!(dims.position(1, 3), Ok(10));
        assert!(matches!(
            dims.position(0, 4),
            Err(LifeError::OutOfRange { position: 12, .. })
        ));
    }

    #[test]
    fn test_check_position() {
        let dims = BoardDimensions::new(5, 5).unwrap();
        assert!(dims.check_position(0).is_ok());
        assert!(dims.check_position(24).is_ok());
        assert_eq!(
            dims.check_position(25),
            Err(LifeError::OutOfRange {
                position: 25,
                cell_count: 25
            })
        );
    }

    #[test]
    fn test_texel_mapping() {
        let dims = BoardDimensions::new(4, 3).unwrap();
        assert_eq!(dims.texel(0), (0, 0));
        assert_eq!(dims.texel(3), (3, 0));
        assert_eq!(dims.texel(4), (0, 1));
        assert_eq!(dims.texel(11), (3, 2));
    }
}
