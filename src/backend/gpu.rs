//! wgpu compute backend for neighbor averaging.
//!
//! Adjacency is uploaded once at construction; each `mean_neighbors`
//! call uploads the current positions, dispatches one compute pass, and
//! reads the means back through a staging buffer. All GPU resources are
//! owned by the backend instance and released when it drops.

use std::sync::mpsc;

use bytemuck::{Pod, Zeroable};
use tracing::{debug, info};
use wgpu::util::DeviceExt;
use wgpu::{Buffer, BufferUsages, ComputePipeline, Device, DeviceDescriptor, Queue};

use crate::adjacency::VertexAdjacency;
use crate::error::{MaskMeshError, Result};

use super::AveragingBackend;

const MEAN_NEIGHBORS_SHADER: &str = include_str!("shaders/mean_neighbors.wgsl");

/// Must match `@workgroup_size` in the shader.
const WORKGROUP_SIZE: u32 = 256;

/// Uniform parameters for the averaging dispatch.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct GpuParams {
    vertex_count: u32,
    _padding: [u32; 3],
}

/// Compute-shader averaging over adjacency resident in GPU buffers.
pub struct GpuBackend {
    device: Device,
    queue: Queue,
    pipeline: ComputePipeline,
    bind_group: wgpu::BindGroup,
    positions_buffer: Buffer,
    means_buffer: Buffer,
    staging_buffer: Buffer,
    vertex_count: usize,
}

impl GpuBackend {
    /// Acquire a GPU device and upload `adjacency`.
    ///
    /// Fails with [`MaskMeshError::AcceleratorUnavailable`] when no
    /// compatible adapter or device can be acquired.
    pub fn new(adjacency: &VertexAdjacency) -> Result<Self> {
        let (device, queue, adapter_name) = pollster::block_on(acquire_device())?;
        info!(adapter = %adapter_name, "GPU backend initialized");

        let vertex_count = adjacency.num_vertices();
        // wgpu rejects zero-size buffers; an empty mesh still gets a
        // valid (if never dispatched) pipeline.
        let positions_size = ((vertex_count * 3).max(1) * std::mem::size_of::<f32>()) as u64;

        let offsets_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("adjacency_offsets"),
            contents: bytemuck::cast_slice(adjacency.offsets()),
            usage: BufferUsages::STORAGE,
        });

        let neighbors_data: &[u32] = if adjacency.flat_neighbors().is_empty() {
            &[0]
        } else {
            adjacency.flat_neighbors()
        };
        let neighbors_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("adjacency_neighbors"),
            contents: bytemuck::cast_slice(neighbors_data),
            usage: BufferUsages::STORAGE,
        });

        let positions_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("positions"),
            size: positions_size,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let means_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("means"),
            size: positions_size,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("means_staging"),
            size: positions_size,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params = GpuParams {
            vertex_count: vertex_count as u32,
            _padding: [0; 3],
        };
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("averaging_params"),
            contents: bytemuck::bytes_of(&params),
            usage: BufferUsages::UNIFORM,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mean_neighbors"),
            source: wgpu::ShaderSource::Wgsl(MEAN_NEIGHBORS_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("averaging_bind_group_layout"),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
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

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("averaging_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("averaging_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("mean_neighbors"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("averaging_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: offsets_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: neighbors_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: positions_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: means_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        debug!(
            vertices = vertex_count,
            neighbors = adjacency.flat_neighbors().len(),
            "adjacency uploaded to GPU"
        );

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group,
            positions_buffer,
            means_buffer,
            staging_buffer,
            vertex_count,
        })
    }
}

impl AveragingBackend for GpuBackend {
    fn mean_neighbors(&mut self, positions: &[[f32; 3]]) -> Result<Vec<[f32; 3]>> {
        debug_assert_eq!(positions.len(), self.vertex_count);
        if self.vertex_count == 0 {
            return Ok(Vec::new());
        }

        let flat: &[f32] = bytemuck::cast_slice(positions);
        self.queue.write_buffer(&self.positions_buffer, 0, bytemuck::cast_slice(flat));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("averaging_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("averaging_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.dispatch_workgroups((self.vertex_count as u32).div_ceil(WORKGROUP_SIZE), 1, 1);
        }
        let byte_len = (self.vertex_count * 3 * std::mem::size_of::<f32>()) as u64;
        encoder.copy_buffer_to_buffer(&self.means_buffer, 0, &self.staging_buffer, 0, byte_len);
        self.queue.submit([encoder.finish()]);

        let slice = self.staging_buffer.slice(..byte_len);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| MaskMeshError::Gpu("readback channel closed".into()))?
            .map_err(|e| MaskMeshError::Gpu(format!("buffer mapping failed: {e:?}")))?;

        let data = slice.get_mapped_range();
        let values: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        self.staging_buffer.unmap();

        Ok(values
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect())
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

async fn acquire_device() -> Result<(Device, Queue, String)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        })
        .await
        .ok_or(MaskMeshError::AcceleratorUnavailable)?;

    let adapter_info = adapter.get_info();
    debug!(
        name = %adapter_info.name,
        backend = ?adapter_info.backend,
        "GPU adapter found"
    );

    let (device, queue) = adapter
        .request_device(
            &DeviceDescriptor {
                label: Some("maskmesh"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            },
            None,
        )
        .await
        .map_err(|_| MaskMeshError::AcceleratorUnavailable)?;

    Ok((device, queue, adapter_info.name))
}
