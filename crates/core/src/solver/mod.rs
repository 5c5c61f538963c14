//! Game of Life compute backends
//!
//! This module provides a unified GPU/CPU abstraction over one generation step.
//! The core abstraction is the `LifeCompute` trait, implemented by the array
//! engine (always available) and the shader engine (feature `gpu`).
//!
//! # Feature Flags
//!
//! - `gpu` (default): Enables the shader engine via wgpu. Without it,
//!   requesting [`EngineKind::Shader`] fails with
//!   [`LifeError::UnsupportedEnvironment`].
//!
//! # Backend Selection
//!
//! Unlike automatic fallback, the backend is chosen explicitly by
//! [`EngineKind`]. A shader engine that cannot obtain a capable GPU is an
//! error the caller must handle, distinct from invalid dimensions.
//!
//! # Example
//!
//! ```
//! use life_compute_core::solver::create_compute_engine;
//! use life_compute_core::{BoardDimensions, CellState, EngineConfig, EngineKind};
//!
//! let dims = BoardDimensions::new(5, 5).unwrap();
//! let mut engine = create_compute_engine(EngineKind::Array, dims, &EngineConfig::default(), None)
//!     .unwrap();
//! engine.set_cell_state(12, CellState::Alive).unwrap();
//! engine.tick();
//! assert_eq!(engine.step(), 1);
//! ```

mod context;
mod cpu;
pub mod rule;
#[allow(clippy::module_name_repetitions)]
mod r#trait;

#[cfg(feature = "gpu")]
mod gpu;

// Re-exports
pub use context::GpuInitResult;
pub use cpu::ArrayComputeEngine;
pub use r#trait::LifeCompute;
pub use rule::EvolutionRule;

#[cfg(feature = "gpu")]
pub use context::GpuContext;
#[cfg(feature = "gpu")]
pub use gpu::ShaderComputeEngine;

use crate::config::{EngineConfig, EngineKind};
use crate::core_types::{BoardDimensions, Snapshot};
use crate::error::LifeError;
use tracing::{debug, info};

/// Create a compute engine of the requested kind
///
/// # Arguments
///
/// * `kind` - Backend to create
/// * `dims` - Board dimensions
/// * `config` - Wraparound mode and step carry-over policy
/// * `seed` - Predecessor's final generation, if this engine replaces another
///
/// # Returns
///
/// A boxed `LifeCompute` trait object
///
/// # Errors
///
/// Returns [`LifeError::UnsupportedEnvironment`] if `kind` is
/// [`EngineKind::Shader`] and no capable GPU is available.
pub fn create_compute_engine(
    kind: EngineKind,
    dims: BoardDimensions,
    config: &EngineConfig,
    seed: Option<Snapshot>,
) -> Result<Box<dyn LifeCompute>, LifeError> {
    let carry_step = config.carry_step_on_swap;

    match kind {
        EngineKind::Array => {
            info!(
                "Using array backend ({}x{} board)",
                dims.width(),
                dims.height()
            );
            let engine = match seed {
                Some(snapshot) => {
                    ArrayComputeEngine::from_snapshot(dims, config.wraparound, snapshot, carry_step)
                }
                None => ArrayComputeEngine::new(dims, config.wraparound),
            };
            Ok(Box::new(engine))
        }
        EngineKind::Shader => create_shader_engine(dims, config, seed),
    }
}

#[cfg(feature = "gpu")]
fn create_shader_engine(
    dims: BoardDimensions,
    config: &EngineConfig,
    seed: Option<Snapshot>,
) -> Result<Box<dyn LifeCompute>, LifeError> {
    let gpu_context = acquire_gpu(dims)?;
    info!(
        "Using shader backend: {} ({}x{} board)",
        gpu_context.adapter_name(),
        dims.width(),
        dims.height()
    );

    let engine = match seed {
        Some(snapshot) => ShaderComputeEngine::from_snapshot(
            gpu_context,
            dims,
            config.wraparound,
            snapshot,
            config.carry_step_on_swap,
        ),
        None => ShaderComputeEngine::new(gpu_context, dims, config.wraparound),
    };
    Ok(Box::new(engine))
}

#[cfg(not(feature = "gpu"))]
fn create_shader_engine(
    _dims: BoardDimensions,
    _config: &EngineConfig,
    _seed: Option<Snapshot>,
) -> Result<Box<dyn LifeCompute>, LifeError> {
    Err(LifeError::UnsupportedEnvironment(
        "built without the gpu feature".to_string(),
    ))
}

/// Obtain a GPU context able to hold a board of `dims`
#[cfg(feature = "gpu")]
fn acquire_gpu(dims: BoardDimensions) -> Result<GpuContext, LifeError> {
    match GpuContext::new() {
        GpuInitResult::Success(gpu_context) => {
            if gpu_context.can_allocate(dims.width(), dims.height()) {
                Ok(gpu_context)
            } else {
                Err(LifeError::UnsupportedEnvironment(format!(
                    "GPU '{}' cannot allocate a {}x{} board",
                    gpu_context.adapter_name(),
                    dims.width(),
                    dims.height()
                )))
            }
        }
        failure => Err(LifeError::UnsupportedEnvironment(
            failure.failure_reason().unwrap_or_default(),
        )),
    }
}

/// Check that a backend can run here without keeping any resources
///
/// # Errors
///
/// Returns [`LifeError::UnsupportedEnvironment`] if `kind` cannot be created
/// for a board of `dims`.
pub fn probe_backend(kind: EngineKind, dims: BoardDimensions) -> Result<(), LifeError> {
    debug!("Probing {} backend", kind);
    match kind {
        EngineKind::Array => Ok(()),
        #[cfg(feature = "gpu")]
        EngineKind::Shader => acquire_gpu(dims).map(drop),
        #[cfg(not(feature = "gpu"))]
        EngineKind::Shader => {
            let _ = dims;
            Err(LifeError::UnsupportedEnvironment(
                "built without the gpu feature".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::CellState;

    #[test]
    fn test_create_array_engine() {
        let dims = BoardDimensions::new(6, 4).unwrap();
        let engine =
            create_compute_engine(EngineKind::Array, dims, &EngineConfig::default(), None).unwrap();
        assert_eq!(engine.kind(), EngineKind::Array);
        assert_eq!(engine.dimensions(), dims);
        assert!(!engine.is_gpu_accelerated());
    }

    #[test]
    fn test_create_seeded_engine() {
        let dims = BoardDimensions::new(3, 3).unwrap();
        let mut cells = vec![CellState::Dead; 9];
        cells[4] = CellState::Alive;
        let snapshot = Snapshot::new(dims, 7, cells.clone()).unwrap();

        let config = EngineConfig::default().with_carry_step_on_swap(true);
        let mut engine =
            create_compute_engine(EngineKind::Array, dims, &config, Some(snapshot)).unwrap();
        assert_eq!(engine.step(), 7);
        assert_eq!(engine.cell_states().as_ref(), cells.as_slice());
    }

    #[test]
    fn test_shader_engine_matches_probe() {
        let dims = BoardDimensions::new(8, 8).unwrap();
        let probe = probe_backend(EngineKind::Shader, dims);
        let created = create_compute_engine(EngineKind::Shader, dims, &EngineConfig::default(), None);

        match (probe, created) {
            (Ok(()), Ok(engine)) => assert!(engine.is_gpu_accelerated()),
            (Err(LifeError::UnsupportedEnvironment(_)), Err(LifeError::UnsupportedEnvironment(_))) => {}
            (probe, created) => panic!(
                "probe {:?} disagrees with creation {:?}",
                probe,
                created.map(|e| e.kind())
            ),
        }
    }

    #[test]
    fn test_array_probe_always_succeeds() {
        let dims = BoardDimensions::new(1, 2).unwrap();
        assert_eq!(probe_backend(EngineKind::Array, dims), Ok(()));
    }
}
