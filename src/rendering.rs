//! Rendering system with wgpu pipeline and shader management.

use std::sync::mpsc;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::CameraSystem;
use crate::error::{Result, WaveError};
use crate::params::{RecordingConfig, RenderConfig, ShadingParams};
use crate::render_loop::{Frame, FrameSink};
use crate::state::{SimulationState, Viewport};
use crate::surface::{SurfaceMesh, Vertex};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Uniform buffer for the surface shader (matrices, palette, lighting constants)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    pub highlight_color: [f32; 4],
    pub secondary_color: [f32; 4],
    pub pointer: [f32; 2],
    pub time: f32,
    pub alpha: f32,
    /// Light span, light height, view height, unused
    pub light: [f32; 4],
    /// Sharp exponent, broad exponent, fresnel power, unused
    pub lobes: [f32; 4],
    /// Sharp, broad and fresnel weights, vignette strength
    pub weights: [f32; 4],
    /// Shimmer amplitude and frequency, unused, unused
    pub shimmer: [f32; 4],
}

impl Uniforms {
    pub fn new(camera: &CameraSystem, shading: &ShadingParams, state: &SimulationState) -> Self {
        let palette = &shading.palette;
        let rgba = |rgb: [f32; 3]| [rgb[0], rgb[1], rgb[2], 1.0];

        Self {
            view_proj: camera.view_proj_matrix().to_cols_array_2d(),
            model: camera.model_matrix().to_cols_array_2d(),
            base_color: rgba(palette.base),
            highlight_color: rgba(palette.highlight),
            secondary_color: rgba(palette.secondary),
            pointer: state.pointer.smoothed.to_array(),
            time: state.time as f32,
            alpha: shading.alpha,
            light: [shading.light_span, shading.light_height, shading.view_height, 0.0],
            lobes: [
                shading.sharp_exponent,
                shading.broad_exponent,
                shading.fresnel_power,
                0.0,
            ],
            weights: [
                shading.sharp_weight,
                shading.broad_weight,
                shading.fresnel_weight,
                shading.vignette_strength,
            ],
            shimmer: [shading.shimmer_amplitude, shading.shimmer_frequency, 0.0, 0.0],
        }
    }
}

/// Rendering system managing wgpu device, pipeline, and buffers
pub struct RenderSystem {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    /// Multisampled colour target, absent when rendering single-sampled
    msaa_view: Option<wgpu::TextureView>,
    sample_count: u32,
    scale_factor: f64,
    max_pixel_ratio: f64,
    index_count: u32,
    camera: CameraSystem,
    shading: ShadingParams,
    clear_color: wgpu::Color,
    recording_config: Option<RecordingConfig>,
    frames: CaptureSequence,
}

impl RenderSystem {
    /// Create new rendering system
    ///
    /// Fails fast when the host cannot provide a surface, adapter or device.
    pub async fn new(
        window: Arc<Window>,
        mesh: &SurfaceMesh,
        camera: CameraSystem,
        shading: ShadingParams,
        render_config: &RenderConfig,
        recording_config: Option<RecordingConfig>,
    ) -> Result<Self> {
        let size = window.inner_size();
        let scale_factor = window.scale_factor();

        // Create wgpu instance
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Create surface (window must have 'static lifetime via Arc)
        let surface = instance
            .create_surface(window)
            .map_err(|e| WaveError::CreateSurface(e.to_string()))?;

        // Request adapter
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(WaveError::NoAdapter)?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        // Request device
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| WaveError::RequestDevice(e.to_string()))?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = choose_surface_format(&surface_caps.formats, recording_config.is_some())
            .ok_or(WaveError::UnsupportedSurface)?;
        let alpha_mode = *surface_caps
            .alpha_modes
            .first()
            .ok_or(WaveError::UnsupportedSurface)?;

        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;

        // Add COPY_SRC if recording (needed for frame capture)
        if recording_config.is_some() {
            usage |= wgpu::TextureUsages::COPY_SRC;
        }

        let (width, height) = surface_extent(
            size.width,
            size.height,
            scale_factor,
            render_config.max_pixel_ratio,
        );
        let config = wgpu::SurfaceConfiguration {
            usage,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::debug!(
            "Surface configured: {:?} {}x{}",
            surface_format,
            config.width,
            config.height
        );

        let color_flags = adapter.get_texture_format_features(surface_format).flags;
        let depth_flags = adapter.get_texture_format_features(DEPTH_FORMAT).flags;
        let sample_count = choose_sample_count(render_config.msaa_samples, |count| {
            color_flags.sample_count_supported(count) && depth_flags.sample_count_supported(count)
        });
        log::debug!("MSAA sample count: {}", sample_count);

        let depth_view = create_depth_view(&device, config.width, config.height, sample_count);
        let msaa_view = create_msaa_view(&device, &config, sample_count);

        // Load shader
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Surface Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        // Create buffers
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Buffer"),
            size: std::mem::size_of::<Uniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Create surface bind group
        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        // Create surface render pipeline
        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Surface Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x3,
                        },
                        wgpu::VertexAttribute {
                            offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                            shader_location: 1,
                            format: wgpu::VertexFormat::Float32x3,
                        },
                        wgpu::VertexAttribute {
                            offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                            shader_location: 2,
                            format: wgpu::VertexFormat::Float32x2,
                        },
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Double-sided: the tilted surface shows its underside at the far edge
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let [r, g, b, a] = render_config.clear_color;

        Ok(Self {
            surface,
            device,
            queue,
            config,
            render_pipeline,
            vertex_buffer,
            index_buffer,
            uniform_buffer,
            uniform_bind_group,
            depth_view,
            msaa_view,
            sample_count,
            scale_factor,
            max_pixel_ratio: render_config.max_pixel_ratio,
            index_count: mesh.indices.len() as u32,
            camera,
            shading,
            clear_color: wgpu::Color { r, g, b, a },
            recording_config,
            frames: CaptureSequence::default(),
        })
    }

    /// Reconfigure surface, depth buffer and projection for a new viewport
    pub fn resize(&mut self, viewport: &Viewport) {
        let (width, height) = surface_extent(
            viewport.width(),
            viewport.height(),
            self.scale_factor,
            self.max_pixel_ratio,
        );
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
        self.camera.resize(viewport);
    }

    /// Track the window's scale factor; takes effect on the next resize
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
    }

    /// Frames written to disk so far
    pub fn captured_frames(&self) -> u64 {
        self.frames.captured()
    }

    /// True once a recording run has captured all of its frames
    pub fn recording_complete(&self) -> bool {
        self.recording_config
            .as_ref()
            .is_some_and(|config| self.frames.is_complete(config))
    }

    /// Re-apply the current surface configuration (after a lost or outdated surface)
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(
            &self.device,
            self.config.width,
            self.config.height,
            self.sample_count,
        );
        self.msaa_view = create_msaa_view(&self.device, &self.config, self.sample_count);
    }

    /// Update surface vertex buffer with new mesh data
    pub fn update_vertices(&self, vertices: &[Vertex]) {
        self.queue
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(vertices));
    }

    /// Update surface uniforms
    pub fn update_uniforms(&self, uniforms: &Uniforms) {
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[*uniforms]));
    }

    /// Render a frame (and optionally capture if recording)
    pub fn render(&mut self) -> Result<()> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.msaa_view.as_ref().unwrap_or(&view),
                    resolve_target: self.msaa_view.as_ref().map(|_| &view),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..self.index_count, 0, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        // Capture frame if recording; only a written file advances the sequence
        let mut captured = Ok(());
        if let Some(ref config) = self.recording_config {
            captured = self.capture_frame(self.frames.next_frame(), config, &output);
            if captured.is_ok() {
                self.frames.advance();
            }
        }

        output.present();

        captured
    }

    /// Capture a frame to disk (recording mode only)
    fn capture_frame(
        &self,
        frame_num: u64,
        config: &RecordingConfig,
        texture: &wgpu::SurfaceTexture,
    ) -> Result<()> {
        let (width, height) = (self.config.width, self.config.height);
        if !is_capturable(self.config.format) {
            return Err(WaveError::Capture(format!(
                "cannot capture {:?} surfaces",
                self.config.format
            )));
        }
        let bytes_per_pixel = 4; // RGBA8 / BGRA8
        let unpadded_bytes_per_row = width * bytes_per_pixel;
        let padded_bytes_per_row = padded_bytes_per_row(unpadded_bytes_per_row);

        // Create buffer to read texture data
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Capture Buffer"),
            size: (padded_bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        // Copy texture to buffer
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Capture Encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
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

        // Map buffer and wait for the copy
        let buffer_slice = buffer.slice(..);
        let (sender, receiver) = mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|e| WaveError::Capture(e.to_string()))?
            .map_err(|e| WaveError::Capture(e.to_string()))?;

        let image_data = {
            let data = buffer_slice.get_mapped_range();
            unpad_rows(&data, width, height, padded_bytes_per_row, is_bgra(self.config.format))
        };
        buffer.unmap();

        let frame_path = config.frame_path(frame_num);
        image::save_buffer(
            &frame_path,
            &image_data,
            width,
            height,
            image::ColorType::Rgba8,
        )?;
        log::debug!("Captured {}", frame_path.display());

        Ok(())
    }
}

impl FrameSink for RenderSystem {
    fn present(&mut self, frame: &Frame<'_>) -> Result<()> {
        self.update_vertices(&frame.mesh.vertices);
        self.update_uniforms(&Uniforms::new(&self.camera, &self.shading, frame.state));
        self.render()
    }
}

/// Contiguous numbering of recorded frames
///
/// The counter moves only after a frame file was written, so a skipped tick
/// never leaves a hole in the `frame_NNNNN.png` sequence.
#[derive(Debug, Default)]
pub struct CaptureSequence {
    captured: u64,
}

impl CaptureSequence {
    /// Number the next captured frame will carry
    pub fn next_frame(&self) -> u64 {
        self.captured
    }

    pub fn advance(&mut self) {
        self.captured += 1;
    }

    pub fn captured(&self) -> u64 {
        self.captured
    }

    pub fn is_complete(&self, config: &RecordingConfig) -> bool {
        self.captured >= config.total_frames()
    }
}

/// Prefer 8-bit non-sRGB formats so palette values reach the screen as authored
///
/// Recording reads frames back as 8-bit RGBA, so only those formats qualify then.
fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    capture: bool,
) -> Option<wgpu::TextureFormat> {
    use wgpu::TextureFormat::{Bgra8Unorm, Rgba8Unorm};

    let preferred = formats.iter().find(|f| matches!(f, Bgra8Unorm | Rgba8Unorm));
    if capture {
        return preferred
            .or_else(|| formats.iter().find(|f| is_capturable(**f)))
            .copied();
    }

    preferred
        .or_else(|| formats.iter().find(|f| !f.is_srgb()))
        .or_else(|| formats.first())
        .copied()
}

/// Formats whose readback is 4 bytes of 8-bit RGBA or BGRA per pixel
fn is_capturable(format: wgpu::TextureFormat) -> bool {
    use wgpu::TextureFormat::*;

    matches!(
        format,
        Rgba8Unorm | Rgba8UnormSrgb | Bgra8Unorm | Bgra8UnormSrgb
    )
}

/// Use the requested MSAA count when supported, otherwise render single-sampled
fn choose_sample_count(requested: u32, supported: impl Fn(u32) -> bool) -> u32 {
    if requested > 1 && supported(requested) {
        requested
    } else {
        1
    }
}

/// Physical window size scaled down so no more than `max_pixel_ratio`
/// pixels are rendered per logical pixel
fn surface_extent(width: u32, height: u32, scale_factor: f64, max_pixel_ratio: f64) -> (u32, u32) {
    let shrink = if scale_factor > max_pixel_ratio && max_pixel_ratio > 0.0 {
        max_pixel_ratio / scale_factor
    } else {
        1.0
    };
    let scale = |px: u32| ((px as f64 * shrink).round() as u32).max(1);

    (scale(width), scale(height))
}

fn is_bgra(format: wgpu::TextureFormat) -> bool {
    matches!(
        format,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
    )
}

fn padded_bytes_per_row(unpadded: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strip row padding from a texture readback and convert to tightly packed RGBA
fn unpad_rows(data: &[u8], width: u32, height: u32, padded_bytes_per_row: u32, bgra: bool) -> Vec<u8> {
    let row_bytes = (width * 4) as usize;
    let mut image_data = Vec::with_capacity(row_bytes * height as usize);

    for y in 0..height as usize {
        let start = y * padded_bytes_per_row as usize;
        image_data.extend_from_slice(&data[start..start + row_bytes]);
    }

    if bgra {
        for pixel in image_data.chunks_exact_mut(4) {
            pixel.swap(0, 2);
        }
    }

    image_data
}

fn create_depth_view(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    sample_count: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_msaa_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    if sample_count <= 1 {
        return None;
    }

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("MSAA Color Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
}
