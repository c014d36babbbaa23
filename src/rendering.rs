//! Rendering system with wgpu pipeline and GPU buffer management.
//!
//! Owns the three GPU-resident buffers (ring vertices, loudness scalar,
//! frequency window) and the two pipelines that draw the disc fill and the
//! outline from the same vertex data.

use wgpu::util::DeviceExt;

use crate::geometry::Vertex;
use crate::params::ring_constants::{FREQUENCY_BIN_COUNT, FREQUENCY_SLICE, RING_VERTEX_COUNT};

/// Fixed analyzer window uploaded to the GPU on every spectrum update.
///
/// Panics if the spectrum has fewer than `MIN_SPECTRUM_LEN` entries; the
/// producer contract requires at least that many bins, and a shorter slice
/// is a caller bug rather than a recoverable condition.
pub fn frequency_window(spectrum: &[f32]) -> &[f32] {
    &spectrum[FREQUENCY_SLICE]
}

/// Rendering system managing wgpu device, pipelines, and buffers
pub struct RenderSystem {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    fill_pipeline: wgpu::RenderPipeline,
    outline_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    loudness_buffer: wgpu::Buffer,
    frequency_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
}

impl RenderSystem {
    /// Create new rendering system.
    ///
    /// Must run after the ring geometry is generated (the vertex buffer is
    /// sized from it) and before any draw is requested. Setup faults abort
    /// initialization; there is no degraded mode without a pipeline.
    pub async fn new(
        window: std::sync::Arc<winit::window::Window>,
        vertices: &[Vertex],
        initial_loudness: f32,
    ) -> Result<Self, String> {
        let size = window.inner_size();

        // Create wgpu instance
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Create surface (window must have 'static lifetime via Arc)
        let surface = instance
            .create_surface(window)
            .map_err(|e| format!("Failed to create surface: {}", e))?;

        // Request adapter
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or("Failed to find suitable GPU adapter")?;

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
            .map_err(|e| format!("Failed to request device: {}", e))?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Load the ring shader (vertexShader / fragmentShader entry points)
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Ring Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        // Create buffers: all three are sized once, every later update is a
        // fixed-size copy with no reallocation
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ring Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let loudness_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Loudness Buffer"),
            contents: bytemuck::cast_slice(&[initial_loudness]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frequency_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frequency Buffer"),
            size: (FREQUENCY_BIN_COUNT * std::mem::size_of::<f32>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Create bind group for the loudness and frequency buffers
        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: loudness_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: frequency_buffer.as_entire_binding(),
                },
            ],
        });

        // Create the two ring pipelines: same shader and buffers, different
        // primitive topology (filled disc vs outline)
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Ring Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let fill_pipeline = create_ring_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            config.format,
            wgpu::PrimitiveTopology::TriangleStrip,
            "Ring Fill Pipeline",
        );

        let outline_pipeline = create_ring_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            config.format,
            wgpu::PrimitiveTopology::LineStrip,
            "Ring Outline Pipeline",
        );

        Ok(Self {
            surface,
            device,
            queue,
            fill_pipeline,
            outline_pipeline,
            vertex_buffer,
            loudness_buffer,
            frequency_buffer,
            uniform_bind_group,
        })
    }

    /// Overwrite the loudness scalar buffer.
    ///
    /// Synchronous on the caller's timeline; the copy lands before any draw
    /// dispatched afterward reads the buffer.
    pub fn update_loudness(&self, value: f32) {
        self.queue
            .write_buffer(&self.loudness_buffer, 0, bytemuck::cast_slice(&[value]));
    }

    /// Overwrite the frequency buffer from the fixed analyzer window.
    ///
    /// Panics if `spectrum` holds fewer than `MIN_SPECTRUM_LEN` bins (caller
    /// contract, see [`frequency_window`]).
    pub fn update_frequencies(&self, spectrum: &[f32]) {
        let window = frequency_window(spectrum);
        self.queue
            .write_buffer(&self.frequency_buffer, 0, bytemuck::cast_slice(window));
    }

    /// Render a frame: fill pass and outline pass over the same ring data.
    ///
    /// `on_complete` is registered with the queue at submission and fires
    /// once the GPU finishes this frame's work. A missing drawable returns
    /// the surface error without submitting; the caller skips that frame.
    pub fn render(
        &self,
        on_complete: impl FnOnce() + Send + 'static,
    ) -> Result<(), wgpu::SurfaceError> {
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
                label: Some("Ring Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Filled disc body
            render_pass.set_pipeline(&self.fill_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.draw(0..RING_VERTEX_COUNT as u32, 0..1);

            // Outline over the same vertices
            render_pass.set_pipeline(&self.outline_pipeline);
            render_pass.draw(0..RING_VERTEX_COUNT as u32, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.queue.on_submitted_work_done(on_complete);
        output.present();

        Ok(())
    }
}

/// Build one of the two ring pipelines; they differ only in topology
fn create_ring_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vertexShader"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                }],
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fragmentShader"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ring_constants::MIN_SPECTRUM_LEN;

    #[test]
    fn test_frequency_window_copies_slice_verbatim() {
        let spectrum: Vec<f32> = (0..MIN_SPECTRUM_LEN).map(|i| i as f32 * 0.5).collect();

        let window = frequency_window(&spectrum);
        assert_eq!(window.len(), FREQUENCY_BIN_COUNT);
        for (offset, &value) in window.iter().enumerate() {
            assert_eq!(value, spectrum[FREQUENCY_SLICE.start + offset]);
        }
    }

    #[test]
    fn test_frequency_window_ignores_bins_outside_range() {
        let mut spectrum = vec![0.0f32; MIN_SPECTRUM_LEN + 100];
        // Poison everything outside the window
        for i in 0..FREQUENCY_SLICE.start {
            spectrum[i] = f32::NAN;
        }
        for i in FREQUENCY_SLICE.end..spectrum.len() {
            spectrum[i] = f32::NAN;
        }

        let window = frequency_window(&spectrum);
        assert!(window.iter().all(|v| !v.is_nan()));
    }

    #[test]
    #[should_panic]
    fn test_frequency_window_rejects_short_spectrum() {
        let spectrum = vec![0.0f32; MIN_SPECTRUM_LEN - 1];
        frequency_window(&spectrum);
    }
}
