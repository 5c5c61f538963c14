//! GPU context and initialization
//!
//! This module handles GPU device initialization and capability detection.
//! It distinguishes between "no GPU found" (expected on headless machines)
//! and "GPU found but unusable" (adapter without compute support, or a device
//! request rejected by the driver).

/// Result of GPU initialization attempt
///
/// - `NoGpuFound`: No compatible GPU adapter
/// - `InitFailed`: An adapter exists but cannot run the life compute shader
#[derive(Debug)]
pub enum GpuInitResult {
    /// GPU initialized successfully
    #[cfg(feature = "gpu")]
    Success(GpuContext),
    /// No GPU adapter found
    NoGpuFound,
    /// GPU found but initialization failed
    InitFailed {
        /// Name of the adapter that failed
        adapter_name: String,
        /// Error message
        error: String,
    },
}

impl GpuInitResult {
    /// Human-readable reason a context could not be created
    ///
    /// Returns `None` for a successful initialization.
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            #[cfg(feature = "gpu")]
            Self::Success(_) => None,
            Self::NoGpuFound => Some("no compatible GPU adapter found".to_string()),
            Self::InitFailed {
                adapter_name,
                error,
            } => Some(format!(
                "GPU adapter '{adapter_name}' failed to initialize: {error}"
            )),
        }
    }
}

// All GPU-specific code is conditionally compiled only when "gpu" feature is enabled
#[cfg(feature = "gpu")]
mod gpu_impl {
    use super::GpuInitResult;
    use tracing::{debug, info};

    /// Bytes per RGBA8 texel
    const BYTES_PER_TEXEL: u64 = 4;

    /// GPU context managing device and queue
    ///
    /// Wraps wgpu device and queue along with adapter information.
    #[derive(Debug)]
    pub struct GpuContext {
        device: wgpu::Device,
        queue: wgpu::Queue,
        adapter_info: wgpu::AdapterInfo,
    }

    impl GpuContext {
        /// Initialize GPU context
        ///
        /// Attempts to create a wgpu device and queue able to run compute
        /// shaders over storage textures.
        ///
        /// # Returns
        ///
        /// - `GpuInitResult::Success` - GPU ready to use
        /// - `GpuInitResult::NoGpuFound` - No compatible GPU adapter
        /// - `GpuInitResult::InitFailed` - GPU found but initialization failed
        #[allow(clippy::new_ret_no_self)]
        pub fn new() -> GpuInitResult {
            debug!("Attempting to initialize GPU context");

            let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });

            // Try to find a GPU adapter
            let adapter =
                if let Some(a) = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })) {
                    debug!("Found GPU adapter: {}", a.get_info().name);
                    a
                } else {
                    debug!("No GPU adapter found");
                    return GpuInitResult::NoGpuFound;
                };

            let adapter_info = adapter.get_info();
            let adapter_name = adapter_info.name.clone();

            // GLES-class adapters may lack compute entirely
            let downlevel = adapter.get_downlevel_capabilities();
            if !downlevel.flags.contains(wgpu::DownlevelFlags::COMPUTE_SHADERS) {
                debug!("GPU adapter {} has no compute shader support", adapter_name);
                return GpuInitResult::InitFailed {
                    adapter_name,
                    error: "adapter does not support compute shaders".to_string(),
                };
            }

            // Try to create device - this can fail even with a valid adapter
            match pollster::block_on(adapter.request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("LifeCompute GPU"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )) {
                Ok((device, queue)) => {
                    info!("GPU context initialized successfully: {}", adapter_name);
                    GpuInitResult::Success(Self {
                        device,
                        queue,
                        adapter_info,
                    })
                }
                Err(e) => {
                    debug!("Failed to create GPU device: {}", e);
                    GpuInitResult::InitFailed {
                        adapter_name,
                        error: e.to_string(),
                    }
                }
            }
        }

        /// Get adapter name for logging
        ///
        /// # Returns
        ///
        /// GPU adapter name (e.g., "NVIDIA `GeForce` GTX 1660")
        #[must_use]
        pub fn adapter_name(&self) -> &str {
            &self.adapter_info.name
        }

        /// Check if the device can hold a board of the given size
        ///
        /// Two RGBA8 textures plus one row-padded readback buffer must fit the
        /// device's texture and buffer limits.
        ///
        /// # Arguments
        ///
        /// * `width` - Board width in cells
        /// * `height` - Board height in cells
        ///
        /// # Returns
        ///
        /// `true` if the board can be allocated on this device
        #[must_use]
        pub fn can_allocate(&self, width: u32, height: u32) -> bool {
            let limits = self.device.limits();
            if width > limits.max_texture_dimension_2d || height > limits.max_texture_dimension_2d
            {
                return false;
            }

            let padded_row = padded_bytes_per_row(width);
            padded_row * u64::from(height) <= limits.max_buffer_size
        }

        /// Split into device, queue and adapter information
        pub fn into_device_queue(self) -> (wgpu::Device, wgpu::Queue, wgpu::AdapterInfo) {
            (self.device, self.queue, self.adapter_info)
        }
    }

    /// Bytes per texture row in a texture-to-buffer copy, padded to wgpu's alignment
    pub(crate) fn padded_bytes_per_row(width: u32) -> u64 {
        let unpadded = u64::from(width) * BYTES_PER_TEXEL;
        let align = u64::from(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        unpadded.div_ceil(align) * align
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_gpu_init_returns_valid_result() {
            // Either outcome is valid; it depends on hardware availability
            let result = GpuContext::new();

            match result {
                GpuInitResult::Success(ref ctx) => {
                    assert!(result.failure_reason().is_none());
                    assert!(!ctx.adapter_name().is_empty() || ctx.adapter_info.vendor == 0);
                }
                GpuInitResult::NoGpuFound => {
                    assert!(result.failure_reason().is_some());
                }
                GpuInitResult::InitFailed {
                    ref adapter_name,
                    ref error,
                } => {
                    assert!(!error.is_empty());
                    let reason = result.failure_reason().unwrap();
                    assert!(reason.contains(adapter_name.as_str()));
                }
            }
        }

        #[test]
        fn test_can_allocate() {
            if let GpuInitResult::Success(ctx) = GpuContext::new() {
                assert!(ctx.can_allocate(64, 64));
                assert!(!ctx.can_allocate(u32::MAX, 4));
            }
        }

        #[test]
        fn test_padded_bytes_per_row() {
            assert_eq!(padded_bytes_per_row(1), 256);
            assert_eq!(padded_bytes_per_row(64), 256);
            assert_eq!(padded_bytes_per_row(65), 512);
        }
    }
}

// Re-export GpuContext only when GPU feature is enabled
#[cfg(feature = "gpu")]
pub use gpu_impl::GpuContext;

#[cfg(feature = "gpu")]
pub(crate) use gpu_impl::padded_bytes_per_row;
