//! GPU backend: inverted-cone rasterization.
//!
//! One inverted cone is rendered per site: apex at the site's `(x, y)` at
//! depth 0, base of radius `sqrt(W^2 + H^2)` at depth 1. Depth testing picks
//! the nearest site per pixel the same way a hardware Voronoi-via-cones
//! trick always does; the fragment shader writes the site index into the
//! color attachment as base-256 digits, which is read back and decoded
//! CPU-side into a `cell_of` array identical in shape to the CPU backend's.
//! Color/area/centroid accumulation then reuses the same CPU-side pass.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::ComputeBackend;
use crate::{ComputeError, ComputeResult};
use voronoi_core::{Image, SiteCollection, VoronoiResult};

const CONE_SEGMENTS: u32 = 32;

const CONE_SHADER: &str = r#"
struct Globals {
    // width, height, radius, _pad
    dims: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VertexInput {
    @location(0) local_pos: vec3<f32>, // (x, y, depth) in cone-local space
};

struct InstanceInput {
    @location(1) site_pos: vec2<f32>,
    @location(2) site_index: u32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) @interpolate(flat) site_index: u32,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let world = vertex.local_pos.xy * globals.dims.z + instance.site_pos;
    let ndc_x = (world.x / globals.dims.x) * 2.0 - 1.0;
    let ndc_y = 1.0 - (world.y / globals.dims.y) * 2.0;

    var out: VertexOutput;
    out.clip_position = vec4<f32>(ndc_x, ndc_y, vertex.local_pos.z, 1.0);
    out.site_index = instance.site_index;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let idx = in.site_index;
    let r = f32(idx % 256u) / 255.0;
    let g = f32((idx / 256u) % 256u) / 255.0;
    let b = f32((idx / 65536u) % 256u) / 255.0;
    return vec4<f32>(r, g, b, 1.0);
}
"#;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct Globals {
    dims: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct ConeVertex {
    local_pos: [f32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct SiteInstance {
    site_pos: [f32; 2],
    site_index: u32,
    _pad: u32,
}

/// Builds the shared cone mesh: one apex vertex plus `CONE_SEGMENTS` base
/// vertices forming a triangle fan, returned with its index buffer content.
fn cone_mesh() -> (Vec<ConeVertex>, Vec<u16>) {
    let mut vertices = Vec::with_capacity(CONE_SEGMENTS as usize + 1);
    vertices.push(ConeVertex { local_pos: [0.0, 0.0, 0.0] });
    for i in 0..CONE_SEGMENTS {
        let theta = (i as f32 / CONE_SEGMENTS as f32) * std::f32::consts::TAU;
        vertices.push(ConeVertex {
            local_pos: [theta.cos(), theta.sin(), 1.0],
        });
    }

    let mut indices = Vec::with_capacity(CONE_SEGMENTS as usize * 3);
    for i in 0..CONE_SEGMENTS {
        let a = 1 + i as u16;
        let b = 1 + ((i + 1) % CONE_SEGMENTS) as u16;
        indices.extend_from_slice(&[0u16, a, b]);
    }
    (vertices, indices)
}

/// GPU tessellation backend via wgpu cone rasterization.
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: wgpu::RenderPipeline,
    cone_vertex_buffer: wgpu::Buffer,
    cone_index_buffer: wgpu::Buffer,
    cone_index_count: u32,
}

impl WgpuBackend {
    /// Checks whether a GPU adapter is available at all.
    pub fn is_available() -> bool {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .is_some()
        })
    }

    /// Creates a GPU backend, initializing the device and render pipeline.
    pub fn new() -> ComputeResult<Self> {
        pollster::block_on(Self::new_async())
    }

    async fn new_async() -> ComputeResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(ComputeError::NoAdapter)?;

        let adapter_limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("voronoi_gpu_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter_limits,
                    memory_hints: wgpu::MemoryHints::Performance,
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| ComputeError::DeviceCreation(e.to_string()))?;

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cone_shader"),
            source: wgpu::ShaderSource::Wgsl(CONE_SHADER.into()),
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("cone_pipeline_layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });

        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ConeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3],
        };
        let instance_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SiteInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &wgpu::vertex_attr_array![1 => Float32x2, 2 => Uint32],
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cone_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout, instance_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let (verts, idxs) = cone_mesh();
        let cone_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cone_vertices"),
            contents: bytemuck::cast_slice(&verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cone_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cone_indices"),
            contents: bytemuck::cast_slice(&idxs),
            usage: wgpu::BufferUsages::INDEX,
        });

        Ok(Self {
            device,
            queue,
            pipeline,
            cone_vertex_buffer,
            cone_index_buffer,
            cone_index_count: idxs.len() as u32,
        })
    }

    fn render_cell_of(&self, width: u32, height: u32, xs: &[f64], ys: &[f64]) -> ComputeResult<Vec<u32>> {
        let n = xs.len();
        let radius = ((width as f64).powi(2) + (height as f64).powi(2)).sqrt() as f32;

        let globals = Globals {
            dims: [width as f32, height as f32, radius, 0.0],
        };
        let globals_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals_uniform"),
            contents: bytemuck::bytes_of(&globals),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let globals_layout = self.pipeline.get_bind_group_layout(0);
        let globals_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buf.as_entire_binding(),
            }],
        });

        let instances: Vec<SiteInstance> = (0..n)
            .map(|i| SiteInstance {
                site_pos: [xs[i] as f32, ys[i] as f32],
                site_index: i as u32,
                _pad: 0,
            })
            .collect();
        let instance_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("site_instances"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let color_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("voronoi_color_target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let depth_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("voronoi_depth"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("voronoi_render_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("voronoi_cone_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &globals_bind_group, &[]);
            pass.set_vertex_buffer(0, self.cone_vertex_buffer.slice(..));
            pass.set_vertex_buffer(1, instance_buffer.slice(..));
            pass.set_index_buffer(self.cone_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..self.cone_index_count, 0, 0..n as u32);
        }

        let bytes_per_row = (width * 4).div_ceil(256) * 256;
        let buffer_size = (bytes_per_row * height) as u64;
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("voronoi_readback"),
            size: buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &color_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| ComputeError::OperationFailed("readback channel closed".into()))?
            .map_err(|e| ComputeError::OperationFailed(format!("buffer map failed: {e}")))?;

        let mapped = slice.get_mapped_range();
        let mut cell_of = vec![0u32; (width * height) as usize];
        for y in 0..height {
            let row_start = (y * bytes_per_row) as usize;
            for x in 0..width {
                let p = row_start + (x * 4) as usize;
                let r = mapped[p] as u32;
                let g = mapped[p + 1] as u32;
                let b = mapped[p + 2] as u32;
                cell_of[(y * width + x) as usize] = r + g * 256 + b * 65536;
            }
        }
        drop(mapped);
        staging.unmap();

        Ok(cell_of)
    }
}

impl ComputeBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn tessellate(&self, image: &Image, sites: &SiteCollection) -> ComputeResult<VoronoiResult> {
        let width = image.width();
        let height = image.height();
        if width == 0 || height == 0 {
            return Err(ComputeError::InvalidDimensions(width, height));
        }
        let n = sites.len();
        if n == 0 {
            return Err(ComputeError::OperationFailed("cannot tessellate with zero sites".into()));
        }
        if n > u32::MAX as usize / 65536 {
            return Err(ComputeError::OperationFailed("site count exceeds base-256 index encoding range".into()));
        }

        let xs = sites.xs();
        let ys = sites.ys();
        let cell_of = self.render_cell_of(width, height, xs, ys)?;

        // Accumulate color/area/centroid/farthest-point CPU-side, identical
        // shape to the CPU backend's second pass, just sequential here
        // since the decode loop already walked every pixel once.
        let mut sum_rgb = vec![[0u64; 3]; n];
        let mut area = vec![0u32; n];
        let mut sum_xy = vec![(0.0f64, 0.0f64); n];
        let mut best_dist2 = vec![0.0f64; (width * height) as usize];

        for (pixel, &site) in cell_of.iter().enumerate() {
            let site = site as usize;
            if site >= n {
                continue;
            }
            let (x, y) = image.xy_of(pixel);
            let rgb = image.rgb_at_index(pixel);
            sum_rgb[site][0] += rgb[0] as u64;
            sum_rgb[site][1] += rgb[1] as u64;
            sum_rgb[site][2] += rgb[2] as u64;
            area[site] += 1;
            sum_xy[site].0 += x as f64 + 0.5;
            sum_xy[site].1 += y as f64 + 0.5;
            let dx = x as f64 + 0.5 - xs[site];
            let dy = y as f64 + 0.5 - ys[site];
            best_dist2[pixel] = dx * dx + dy * dy;
        }

        let mut cell_color = Vec::with_capacity(n);
        let mut cell_centroid = Vec::with_capacity(n);
        for i in 0..n {
            if area[i] == 0 {
                let px = (xs[i].floor() as i64).clamp(0, width as i64 - 1) as u32;
                let py = (ys[i].floor() as i64).clamp(0, height as i64 - 1) as u32;
                cell_color.push(image.rgb_at(px, py).unwrap_or([128, 128, 128]));
                cell_centroid.push((xs[i], ys[i]));
            } else {
                let [r, g, b] = sum_rgb[i];
                let a = area[i] as u64;
                cell_color.push([(r / a) as u8, (g / a) as u8, (b / a) as u8]);
                cell_centroid.push((sum_xy[i].0 / area[i] as f64, sum_xy[i].1 / area[i] as f64));
            }
        }

        let farthest_pixel = best_dist2
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let farthest_point = image.xy_of(farthest_pixel);

        VoronoiResult::new(width, height, n, cell_of, cell_color, area, cell_centroid, farthest_point).map_err(ComputeError::from)
    }
}
