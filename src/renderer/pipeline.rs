//! WebGPU instanced render pipeline
//!
//! One shader module, two pipelines (streaks and splash discs) sharing a
//! unit-quad vertex buffer and the screen-size uniform. Instance buffers
//! are allocated once at the pool's capacity.

use wgpu::util::DeviceExt;

use super::DrawSink;
use super::instance::{Globals, InstanceFrame, RaindropInstance, SplashInstance};
use crate::driver::DrawableSize;
use crate::error::RenderError;

/// Unit quad corner, shared by both pipelines
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Corner {
    uv: [f32; 2],
}

impl Corner {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Corner>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

const QUAD: [Corner; 6] = [
    Corner { uv: [0.0, 0.0] },
    Corner { uv: [1.0, 0.0] },
    Corner { uv: [0.0, 1.0] },
    Corner { uv: [0.0, 1.0] },
    Corner { uv: [1.0, 0.0] },
    Corner { uv: [1.0, 1.0] },
];

pub struct RainRenderer {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    drop_pipeline: wgpu::RenderPipeline,
    splash_pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    quad_buffer: wgpu::Buffer,
    drop_buffer: wgpu::Buffer,
    splash_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,

    drop_capacity: usize,
    splash_capacity: usize,
    /// Logical size and scale factor of the current surface
    pub size: DrawableSize,
}

impl RainRenderer {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        size: DrawableSize,
        drop_capacity: usize,
        splash_capacity: usize,
    ) -> Result<Self, RenderError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("rain-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);
        log::info!("Surface alpha modes: {:?}", surface_caps.alpha_modes);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::NoSurfaceFormat)?;

        // The overlay is transparent; prefer a compositing alpha mode
        let alpha_mode = [
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ]
        .into_iter()
        .find(|mode| surface_caps.alpha_modes.contains(mode))
        .or_else(|| surface_caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let (width, height) = size.pixel_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        log::info!(
            "Surface config: {}x{} {:?}, alpha: {:?}",
            width,
            height,
            surface_format,
            alpha_mode
        );
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("rain_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("rain.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals {
                screen_size: [size.width, size.height],
                _pad: [0.0; 2],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad"),
            contents: bytemuck::cast_slice(&QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let drop_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("raindrop_instances"),
            size: (std::mem::size_of::<RaindropInstance>() * drop_capacity.max(1)) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let splash_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("splash_instances"),
            size: (std::mem::size_of::<SplashInstance>() * splash_capacity.max(1)) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("rain_bind_group_layout"),
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

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("rain_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("rain_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let make_pipeline = |label: &str,
                             vs: &str,
                             fs: &str,
                             instance: wgpu::VertexBufferLayout<'static>| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some(vs),
                    buffers: &[Corner::desc(), instance],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fs),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: config.format,
                        blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        let drop_pipeline =
            make_pipeline("raindrop_pipeline", "vs_drop", "fs_drop", RaindropInstance::desc());
        let splash_pipeline =
            make_pipeline("splash_pipeline", "vs_splash", "fs_splash", SplashInstance::desc());

        Ok(Self {
            surface,
            device,
            queue,
            config,
            drop_pipeline,
            splash_pipeline,
            globals_buffer,
            quad_buffer,
            drop_buffer,
            splash_buffer,
            bind_group,
            drop_capacity,
            splash_capacity,
            size,
        })
    }

    pub fn resize(&mut self, size: DrawableSize) {
        let (width, height) = size.pixel_size();
        if width > 0 && height > 0 {
            self.size = size;
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn acquire(&mut self) -> Result<wgpu::SurfaceTexture, RenderError> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(texture),
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::debug!("Surface {:?}, reconfiguring", err);
                self.surface.configure(&self.device, &self.config);
                Err(err.into())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory!");
                Err(wgpu::SurfaceError::OutOfMemory.into())
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl DrawSink for RainRenderer {
    /// Upload instances and issue the two instanced draws
    fn draw(&mut self, frame: &InstanceFrame<'_>) -> Result<(), RenderError> {
        let drops = &frame.raindrops[..frame.raindrops.len().min(self.drop_capacity)];
        let splashes = &frame.splashes[..frame.splashes.len().min(self.splash_capacity)];

        let output = self.acquire()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&frame.globals()));
        if !drops.is_empty() {
            self.queue
                .write_buffer(&self.drop_buffer, 0, bytemuck::cast_slice(drops));
        }
        if !splashes.is_empty() {
            self.queue
                .write_buffer(&self.splash_buffer, 0, bytemuck::cast_slice(splashes));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("rain_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("rain_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.quad_buffer.slice(..));

            if !drops.is_empty() {
                render_pass.set_pipeline(&self.drop_pipeline);
                render_pass.set_vertex_buffer(1, self.drop_buffer.slice(..));
                render_pass.draw(0..QUAD.len() as u32, 0..drops.len() as u32);
            }
            if !splashes.is_empty() {
                render_pass.set_pipeline(&self.splash_pipeline);
                render_pass.set_vertex_buffer(1, self.splash_buffer.slice(..));
                render_pass.draw(0..QUAD.len() as u32, 0..splashes.len() as u32);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
