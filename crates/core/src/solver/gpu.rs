//! GPU-based compute engine implementation
//!
//! This module provides a GPU implementation of the `LifeCompute` trait using a
//! wgpu compute shader over two RGBA8 textures. This backend is only available
//! when the `gpu` feature is enabled.
//!
//! # Shader Files
//!
//! - `shaders/life.wgsl` - one generation of the evolution rule, honouring both
//!   wraparound modes
//!
//! # Implementation
//!
//! Textures A and B alternate as the current generation; two bind groups
//! (A→B and B→A) are built once so a tick is a single dispatch. Single-cell
//! reads and writes are one-texel copies against the current texture. Full
//! reads copy the current texture into a row-padded staging buffer.
//!
//! Driver and validation errors are logged and swallowed. When a readback
//! fails the engine answers from the last generation it read successfully.

use super::context::{padded_bytes_per_row, GpuContext};
use super::LifeCompute;
use crate::config::{EngineKind, Wraparound};
use crate::core_types::{BoardDimensions, CellState, Snapshot, DEAD_PIXEL};
use crate::error::LifeError;
use bytemuck::{Pod, Zeroable};
use std::borrow::Cow;
use std::sync::mpsc;
use tracing::{debug, error, info, warn};
use wgpu::util::DeviceExt;

/// Workgroup edge length (must match `@workgroup_size` in life.wgsl)
const WORKGROUP_SIZE: u32 = 8;

/// Bytes per RGBA8 texel
const BYTES_PER_TEXEL: u32 = 4;

/// Life shader parameters (must match WGSL struct layout)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct LifeParams {
    width: u32,
    height: u32,
    wrap_mode: u32,
    _padding: u32,
}

/// GPU-based compute engine using a wgpu compute shader
pub struct ShaderComputeEngine {
    // GPU handles
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,

    dims: BoardDimensions,

    // Ping-pong generation images
    texture_a: wgpu::Texture,
    texture_b: wgpu::Texture,
    bind_group_a_to_b: wgpu::BindGroup,
    bind_group_b_to_a: wgpu::BindGroup,

    pipeline: wgpu::ComputePipeline,

    // Readback
    generation_staging: wgpu::Buffer,
    texel_staging: wgpu::Buffer,
    padded_row_bytes: u64,

    // Last generation read back from the GPU
    last_read: Vec<CellState>,

    // Ping-pong state (texture A is current)
    using_a: bool,
    step: u64,
}

impl ShaderComputeEngine {
    /// Create a blank engine on the given GPU context
    ///
    /// # Arguments
    ///
    /// * `context` - GPU device, consumed by the engine
    /// * `dims` - Board dimensions
    /// * `wraparound` - Edge behaviour for neighbour lookups
    pub fn new(context: GpuContext, dims: BoardDimensions, wraparound: Wraparound) -> Self {
        let adapter_name = context.adapter_name().to_string();
        let (device, queue, _adapter_info) = context.into_device_queue();

        device.on_uncaptured_error(Box::new(|err: wgpu::Error| {
            error!("Uncaptured GPU error: {}", err);
        }));

        let size = wgpu::Extent3d {
            width: dims.width(),
            height: dims.height(),
            depth_or_array_layers: 1,
        };
        let texture_desc = |label: &'static str| wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        };
        let texture_a = device.create_texture(&texture_desc("Generation A"));
        let texture_b = device.create_texture(&texture_desc("Generation B"));
        let view_a = texture_a.create_view(&wgpu::TextureViewDescriptor::default());
        let view_b = texture_b.create_view(&wgpu::TextureViewDescriptor::default());

        let params = LifeParams {
            width: dims.width(),
            height: dims.height(),
            wrap_mode: u32::from(wraparound.as_u8()),
            _padding: 0,
        };
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Life Params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let padded_row_bytes = padded_bytes_per_row(dims.width());
        let generation_staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Generation Staging"),
            size: padded_row_bytes * u64::from(dims.height()),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let texel_staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Texel Staging"),
            size: u64::from(BYTES_PER_TEXEL),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shader = device.create_shader_module(wgpu::include_wgsl!("shaders/life.wgsl"));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Life Bind Group Layout"),
            entries: &[
                // input generation (binding 0)
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    },
                    count: None,
                },
                // output generation (binding 1)
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba8Unorm,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                // params (binding 2)
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let create_bind_group = |label: &str, input: &wgpu::TextureView, output: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(input),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(output),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: params_buffer.as_entire_binding(),
                    },
                ],
            })
        };
        let bind_group_a_to_b = create_bind_group("Life Bind Group A->B", &view_a, &view_b);
        let bind_group_b_to_a = create_bind_group("Life Bind Group B->A", &view_b, &view_a);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Life Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Life Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "main",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        info!(
            "Created shader compute engine {}x{} on {}",
            dims.width(),
            dims.height(),
            adapter_name
        );

        let engine = Self {
            device,
            queue,
            adapter_name,
            dims,
            texture_a,
            texture_b,
            bind_group_a_to_b,
            bind_group_b_to_a,
            pipeline,
            generation_staging,
            texel_staging,
            padded_row_bytes,
            last_read: vec![CellState::Dead; dims.cell_count()],
            using_a: true,
            step: 0,
        };

        // Fresh textures are transparent black; give both the dead pixel value
        engine.fill_both(DEAD_PIXEL);
        engine
    }

    /// Create an engine seeded from a predecessor's final generation
    ///
    /// A snapshot of different dimensions is ignored and the engine starts blank.
    ///
    /// # Arguments
    ///
    /// * `context` - GPU device, consumed by the engine
    /// * `dims` - Board dimensions
    /// * `wraparound` - Edge behaviour for neighbour lookups
    /// * `snapshot` - Predecessor's final generation
    /// * `carry_step` - Start from the snapshot's step instead of 0
    pub fn from_snapshot(
        context: GpuContext,
        dims: BoardDimensions,
        wraparound: Wraparound,
        snapshot: Snapshot,
        carry_step: bool,
    ) -> Self {
        let mut engine = Self::new(context, dims, wraparound);
        if !snapshot.fits(dims) {
            warn!(
                "Ignoring snapshot of a {}x{} board for a {}x{} engine",
                snapshot.dimensions().width(),
                snapshot.dimensions().height(),
                dims.width(),
                dims.height()
            );
            return engine;
        }

        if carry_step {
            engine.step = snapshot.step();
        }
        engine.upload(&engine.texture_a, snapshot.cells());
        engine.last_read = snapshot.into_cells();
        engine
    }

    /// Name of the GPU adapter this engine runs on
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Calculate workgroup count for dispatch
    fn workgroup_count(&self) -> (u32, u32) {
        (
            self.dims.width().div_ceil(WORKGROUP_SIZE),
            self.dims.height().div_ceil(WORKGROUP_SIZE),
        )
    }

    fn current_texture(&self) -> &wgpu::Texture {
        if self.using_a {
            &self.texture_a
        } else {
            &self.texture_b
        }
    }

    fn full_extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.dims.width(),
            height: self.dims.height(),
            depth_or_array_layers: 1,
        }
    }

    fn texel_origin(&self, position: usize) -> wgpu::Origin3d {
        let (x, y) = self.dims.texel(position);
        wgpu::Origin3d { x, y, z: 0 }
    }

    /// Write a whole generation into `texture`
    fn upload(&self, texture: &wgpu::Texture, cells: &[CellState]) {
        let bytes: Vec<u8> = cells
            .iter()
            .flat_map(|cell| cell.to_pixel().to_le_bytes())
            .collect();
        self.write_pixels(texture, &bytes);
    }

    fn fill_both(&self, pixel: u32) {
        let bytes = pixel.to_le_bytes().repeat(self.dims.cell_count());
        self.write_pixels(&self.texture_a, &bytes);
        self.write_pixels(&self.texture_b, &bytes);
    }

    fn write_pixels(&self, texture: &wgpu::Texture, bytes: &[u8]) {
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.dims.width() * BYTES_PER_TEXEL),
                rows_per_image: Some(self.dims.height()),
            },
            self.full_extent(),
        );
    }

    /// Map a staging buffer for reading and wait for the GPU
    ///
    /// Returns `false` (after logging) if mapping failed.
    fn map_for_read(&self, buffer: &wgpu::Buffer) -> bool {
        let (tx, rx) = mpsc::channel();
        buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });

        let _ = self.device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!("Failed to map GPU readback buffer: {}", e);
                false
            }
            Err(_) => {
                error!("GPU readback callback was dropped");
                false
            }
        }
    }

    /// Copy the current generation into `last_read`
    ///
    /// On failure `last_read` keeps the previous generation.
    fn refresh_generation(&mut self) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Generation Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: self.current_texture(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.generation_staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_row_bytes as u32),
                    rows_per_image: Some(self.dims.height()),
                },
            },
            self.full_extent(),
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        if !self.map_for_read(&self.generation_staging) {
            return;
        }

        let mut rejected = 0usize;
        {
            let buffer_slice = self.generation_staging.slice(..);
            let data = buffer_slice.get_mapped_range();
            let row_bytes = (self.dims.width() * BYTES_PER_TEXEL) as usize;
            let mut cells = self.last_read.iter_mut();
            for row in data.chunks(self.padded_row_bytes as usize) {
                for texel in row[..row_bytes].chunks_exact(BYTES_PER_TEXEL as usize) {
                    if let Some(cell) = cells.next() {
                        let pixel = u32::from_le_bytes([texel[0], texel[1], texel[2], texel[3]]);
                        *cell = CellState::try_from_pixel(pixel).unwrap_or_else(|| {
                            rejected += 1;
                            CellState::from_pixel(pixel)
                        });
                    }
                }
            }
        }
        self.generation_staging.unmap();

        if rejected > 0 {
            warn!(
                "Rejected {} texels outside the alive/dead palette, read as dead",
                rejected
            );
        }
    }

    /// Read one texel of the current generation
    fn read_texel(&mut self, position: usize) -> CellState {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Texel Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: self.current_texture(),
                mip_level: 0,
                origin: self.texel_origin(position),
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.texel_staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: None,
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        if !self.map_for_read(&self.texel_staging) {
            return self.last_read[position];
        }

        let pixel = {
            let buffer_slice = self.texel_staging.slice(..);
            let data = buffer_slice.get_mapped_range();
            u32::from_le_bytes([data[0], data[1], data[2], data[3]])
        };
        self.texel_staging.unmap();

        let state = CellState::try_from_pixel(pixel).unwrap_or_else(|| {
            warn!(
                "Rejected texel {:#010x} at position {}, read as dead",
                pixel, position
            );
            CellState::from_pixel(pixel)
        });
        self.last_read[position] = state;
        state
    }
}

impl LifeCompute for ShaderComputeEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Shader
    }

    fn dimensions(&self) -> BoardDimensions {
        self.dims
    }

    fn tick(&mut self) {
        let bind_group = if self.using_a {
            &self.bind_group_a_to_b
        } else {
            &self.bind_group_b_to_a
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Life Tick Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Life Tick Pass"),
                timestamp_writes: None,
            });

            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, bind_group, &[]);

            let (wg_x, wg_y) = self.workgroup_count();
            compute_pass.dispatch_workgroups(wg_x, wg_y, 1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        // Flip ping-pong
        self.using_a = !self.using_a;
        self.step += 1;
    }

    fn cell_state(&mut self, position: usize) -> Result<CellState, LifeError> {
        self.dims.check_position(position)?;
        Ok(self.read_texel(position))
    }

    fn set_cell_state(&mut self, position: usize, state: CellState) -> Result<(), LifeError> {
        self.dims.check_position(position)?;

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: self.current_texture(),
                mip_level: 0,
                origin: self.texel_origin(position),
                aspect: wgpu::TextureAspect::All,
            },
            &state.to_pixel().to_le_bytes(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(BYTES_PER_TEXEL),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        self.last_read[position] = state;
        Ok(())
    }

    fn cell_states(&mut self) -> Cow<'_, [CellState]> {
        self.refresh_generation();
        Cow::Borrowed(&self.last_read)
    }

    fn clear(&mut self) {
        self.fill_both(DEAD_PIXEL);
        self.last_read.fill(CellState::Dead);
        self.using_a = true;
        self.step = 0;
    }

    fn step(&self) -> u64 {
        self.step
    }

    fn is_gpu_accelerated(&self) -> bool {
        true
    }

    fn destroy(mut self: Box<Self>) -> Snapshot {
        self.refresh_generation();
        self.texture_a.destroy();
        self.texture_b.destroy();
        self.generation_staging.destroy();
        self.texel_staging.destroy();
        debug!(
            "Shader compute engine on {} destroyed at step {}",
            self.adapter_name, self.step
        );

        let engine = *self;
        Snapshot::new(engine.dims, engine.step, engine.last_read)
            .unwrap_or_else(|_| Snapshot::blank(engine.dims))
    }
}
