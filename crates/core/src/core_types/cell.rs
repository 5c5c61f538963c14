//! Cell state and its numeric/pixel encodings
//!
//! A cell is either dead or alive. Two encodings cross crate boundaries:
//! - numeric (`0`/`1`), used by array buffers and the FFI layer
//! - RGBA8 pixels packed little-endian into a `u32`, used by GPU images.
//!   Opaque white encodes alive, opaque black encodes dead.

use serde::{Deserialize, Serialize};

/// Packed RGBA8 value of an alive cell (opaque white)
pub const ALIVE_PIXEL: u32 = 0xFFFFFFFF;

/// Packed RGBA8 value of a dead cell (opaque black)
pub const DEAD_PIXEL: u32 = 0xFF000000;

/// State of a single board cell
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellState {
    /// Empty cell
    #[default]
    Dead = 0,
    /// Populated cell
    Alive = 1,
}

impl CellState {
    /// Convert from u8 for FFI compatibility
    ///
    /// Returns `None` for anything other than `0` or `1`.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Dead),
            1 => Some(Self::Alive),
            _ => None,
        }
    }

    /// Convert to u8 for FFI compatibility
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode a pixel read back from a GPU image
    ///
    /// Only an exact [`ALIVE_PIXEL`] decodes as alive; any other value,
    /// including partially lit pixels, is treated as dead.
    pub const fn from_pixel(pixel: u32) -> Self {
        if pixel == ALIVE_PIXEL {
            Self::Alive
        } else {
            Self::Dead
        }
    }

    /// Strictly decode a pixel, rejecting values outside the two-colour contract
    pub const fn try_from_pixel(pixel: u32) -> Option<Self> {
        match pixel {
            ALIVE_PIXEL => Some(Self::Alive),
            DEAD_PIXEL => Some(Self::Dead),
            _ => None,
        }
    }

    /// Encode as a packed RGBA8 pixel
    pub const fn to_pixel(self) -> u32 {
        match self {
            Self::Alive => ALIVE_PIXEL,
            Self::Dead => DEAD_PIXEL,
        }
    }

    /// `true` for [`CellState::Alive`]
    pub const fn is_alive(self) -> bool {
        matches!(self, Self::Alive)
    }

    /// The opposite state
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Alive => Self::Dead,
            Self::Dead => Self::Alive,
        }
    }
}

impl From<bool> for CellState {
    fn from(alive: bool) -> Self {
        if alive {
            Self::Alive
        } else {
            Self::Dead
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_conversion() {
        assert_eq!(CellState::Dead.as_u8(), 0);
        assert_eq!(CellState::Alive.as_u8(), 1);

        assert_eq!(CellState::from_u8(0), Some(CellState::Dead));
        assert_eq!(CellState::from_u8(1), Some(CellState::Alive));
        assert_eq!(CellState::from_u8(2), None);
    }

    #[test]
    fn test_pixel_contract() {
        assert_eq!(CellState::Alive.to_pixel(), 0xFFFFFFFF);
        assert_eq!(CellState::Dead.to_pixel(), 0xFF000000);

        // RGBA8 bytes as uploaded to the GPU
        assert_eq!(ALIVE_PIXEL.to_le_bytes(), [255, 255, 255, 255]);
        assert_eq!(DEAD_PIXEL.to_le_bytes(), [0, 0, 0, 255]);
    }

    #[test]
    fn test_pixel_decoding() {
        assert_eq!(CellState::from_pixel(ALIVE_PIXEL), CellState::Alive);
        assert_eq!(CellState::from_pixel(DEAD_PIXEL), CellState::Dead);
        // Grey is not a valid alive pixel
        assert_eq!(CellState::from_pixel(0xFF808080), CellState::Dead);

        assert_eq!(CellState::try_from_pixel(0xFF808080), None);
        assert_eq!(CellState::try_from_pixel(0x00000000), None);
        assert_eq!(
            CellState::try_from_pixel(ALIVE_PIXEL),
            Some(CellState::Alive)
        );
    }

    #[test]
    fn test_toggle() {
        assert_eq!(CellState::Dead.toggled(), CellState::Alive);
        assert_eq!(CellState::Alive.toggled(), CellState::Dead);
        assert!(CellState::from(true).is_alive());
        assert!(!CellState::default().is_alive());
    }
}
