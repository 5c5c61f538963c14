//! Engine configuration
//!
//! Everything a host chooses before creating a simulation: which backend to
//! run, how board edges wrap, what happens to the step counter across an
//! engine swap, and the continuous-simulation period.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shortest accepted continuous-simulation period
pub const MIN_TICK_DELAY: Duration = Duration::from_millis(20);

/// Default continuous-simulation period
pub const DEFAULT_TICK_DELAY: Duration = Duration::from_millis(500);

/// Compute backend selection
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EngineKind {
    /// Double-buffered arrays stepped on the CPU
    #[default]
    Array = 0,
    /// Ping-pong textures stepped by a compute shader
    Shader = 1,
}

impl EngineKind {
    /// User-facing backend name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Array => "Array",
            Self::Shader => "Shader",
        }
    }

    /// Convert from u8 for FFI compatibility
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Array),
            1 => Some(Self::Shader),
            _ => None,
        }
    }

    /// Convert to u8 for FFI compatibility
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How neighbour lookups cross the board edge
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Wraparound {
    /// Rows and columns wrap independently (true torus)
    #[default]
    Toroidal = 0,
    /// Offsets `{±1, ±width, ±width±1}` applied to the flat index, corrected by
    /// `±width*height`. A cell at the start of a row neighbours the end of the
    /// previous row. Matches legacy fixtures bit for bit.
    LinearIndex = 1,
}

impl Wraparound {
    /// Convert from u8 for FFI compatibility
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Toroidal),
            1 => Some(Self::LinearIndex),
            _ => None,
        }
    }

    /// Convert to u8 for FFI compatibility
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Configuration for a [`LifeSimulation`](crate::simulation::LifeSimulation)
///
/// # Example
///
/// ```
/// use life_compute_core::{EngineConfig, EngineKind, Wraparound};
/// use std::time::Duration;
///
/// let config = EngineConfig::default()
///     .with_kind(EngineKind::Array)
///     .with_wraparound(Wraparound::LinearIndex)
///     .with_tick_delay(Duration::from_millis(100));
/// assert_eq!(config.tick_delay, Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Backend used for the initial engine
    pub kind: EngineKind,
    /// Edge behaviour, honoured by every backend
    pub wraparound: Wraparound,
    /// Successor engine inherits the step count after a swap (default: restart at 0)
    pub carry_step_on_swap: bool,
    /// Continuous-simulation period, never below [`MIN_TICK_DELAY`]
    pub tick_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::Array,
            wraparound: Wraparound::Toroidal,
            carry_step_on_swap: false,
            tick_delay: DEFAULT_TICK_DELAY,
        }
    }
}

impl EngineConfig {
    pub fn with_kind(mut self, kind: EngineKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_wraparound(mut self, wraparound: Wraparound) -> Self {
        self.wraparound = wraparound;
        self
    }

    pub fn with_carry_step_on_swap(mut self, carry: bool) -> Self {
        self.carry_step_on_swap = carry;
        self
    }

    /// Set the continuous-simulation period, clamped to [`MIN_TICK_DELAY`]
    pub fn with_tick_delay(mut self, delay: Duration) -> Self {
        self.tick_delay = clamp_tick_delay(delay);
        self
    }
}

/// Clamp a requested tick period to the supported minimum
pub fn clamp_tick_delay(delay: Duration) -> Duration {
    delay.max(MIN_TICK_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.kind, EngineKind::Array);
        assert_eq!(config.wraparound, Wraparound::Toroidal);
        assert!(!config.carry_step_on_swap);
        assert_eq!(config.tick_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_tick_delay_is_clamped() {
        let config = EngineConfig::default().with_tick_delay(Duration::from_millis(1));
        assert_eq!(config.tick_delay, MIN_TICK_DELAY);

        let config = EngineConfig::default().with_tick_delay(Duration::from_secs(2));
        assert_eq!(config.tick_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_kind_conversion() {
        assert_eq!(EngineKind::from_u8(0), Some(EngineKind::Array));
        assert_eq!(EngineKind::from_u8(1), Some(EngineKind::Shader));
        assert_eq!(EngineKind::from_u8(7), None);
        assert_eq!(EngineKind::Shader.as_u8(), 1);
        assert_eq!(EngineKind::Shader.to_string(), "Shader");

        assert_eq!(Wraparound::from_u8(1), Some(Wraparound::LinearIndex));
        assert_eq!(Wraparound::from_u8(2), None);
    }
}
