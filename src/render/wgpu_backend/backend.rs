//! WebGPU implementation of [`GpuBackend`] on top of `wgpu`.

use web_sys::HtmlCanvasElement;
use wgpu::util::DeviceExt;

use super::pipelines;
use crate::error::{GridError, Result};
use crate::render::{DrawRegion, GpuBackend};

/// Background behind the headers and the overscroll gap.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.98,
    g: 0.98,
    b: 0.98,
    a: 1.0,
};

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    format: wgpu::TextureFormat,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    shader: wgpu::ShaderModule,
}

impl WgpuBackend {
    /// Acquire an adapter and device for `canvas` and configure its surface.
    /// This is async because WebGPU adapter/device creation is asynchronous.
    ///
    /// # Errors
    /// Returns [`GridError::BackendUnavailable`] when WebGPU, a suitable
    /// adapter, or a surface format is missing.
    pub async fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let width = canvas.width().max(1);
        let height = canvas.height().max(1);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas))
            .map_err(|e| GridError::BackendUnavailable(format!("Failed to create surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| {
                GridError::BackendUnavailable(format!("No suitable GPU adapter found: {e}"))
            })?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("gpugrid device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| GridError::BackendUnavailable(format!("Failed to create device: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .first()
            .copied()
            .ok_or_else(|| GridError::BackendUnavailable("No surface formats available".into()))?;

        surface.configure(
            &device,
            &wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width,
                height,
                present_mode: wgpu::PresentMode::AutoVsync,
                alpha_mode: surface_caps
                    .alpha_modes
                    .first()
                    .copied()
                    .unwrap_or(wgpu::CompositeAlphaMode::Auto),
                view_formats: vec![],
                desired_maximum_frame_latency: 2,
            },
        );

        let bind_group_layout = pipelines::create_bind_group_layout(&device);
        let pipeline_layout = pipelines::create_pipeline_layout(&device, &bind_group_layout);
        let shader = pipelines::create_cell_shader(&device);

        Ok(Self {
            device,
            queue,
            surface,
            format,
            bind_group_layout,
            pipeline_layout,
            shader,
        })
    }

    fn create_buffer(&self, label: &str, size: u64, usage: wgpu::BufferUsages) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }
}

impl GpuBackend for WgpuBackend {
    type Buffer = wgpu::Buffer;
    type BindGroup = wgpu::BindGroup;
    type Pipeline = wgpu::RenderPipeline;
    type Bundle = wgpu::RenderBundle;

    fn create_uniform_buffer(&mut self, label: &str, size: u64) -> Result<wgpu::Buffer> {
        Ok(self.create_buffer(label, size, wgpu::BufferUsages::UNIFORM))
    }

    fn create_storage_buffer(&mut self, label: &str, size: u64) -> Result<wgpu::Buffer> {
        Ok(self.create_buffer(label, size, wgpu::BufferUsages::STORAGE))
    }

    fn create_vertex_buffer(&mut self, label: &str, contents: &[u8]) -> Result<wgpu::Buffer> {
        Ok(self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            }))
    }

    fn write_buffer(&mut self, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer, offset, data);
    }

    fn create_bind_group(&mut self, buffers: [&wgpu::Buffer; 5]) -> wgpu::BindGroup {
        let [f32_uniforms, u32_uniforms, data, focused, selected] = buffers;
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grid bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: f32_uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: u32_uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: data.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: focused.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: selected.as_entire_binding(),
                },
            ],
        })
    }

    fn create_pipeline(&mut self, region: DrawRegion) -> Result<wgpu::RenderPipeline> {
        Ok(pipelines::create_region_pipeline(
            &self.device,
            &self.pipeline_layout,
            &self.shader,
            self.format,
            region,
        ))
    }

    fn create_render_bundle(
        &mut self,
        region: DrawRegion,
        pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
        vertices: &wgpu::Buffer,
        vertex_count: u32,
        instance_count: u32,
    ) -> wgpu::RenderBundle {
        let mut encoder =
            self.device
                .create_render_bundle_encoder(&wgpu::RenderBundleEncoderDescriptor {
                    label: Some(region.label()),
                    color_formats: &[Some(self.format)],
                    depth_stencil: None,
                    sample_count: 1,
                    ..Default::default()
                });
        encoder.set_pipeline(pipeline);
        encoder.set_bind_group(0, bind_group, &[]);
        encoder.set_vertex_buffer(0, vertices.slice(..));
        encoder.draw(0..vertex_count, 0..instance_count);
        encoder.finish(&wgpu::RenderBundleDescriptor {
            label: Some(region.label()),
        })
    }

    fn submit(&mut self, bundles: &[wgpu::RenderBundle]) -> Result<()> {
        let output = self
            .surface
            .get_current_texture()
            .map_err(|e| GridError::Render(format!("Failed to get surface texture: {e}")))?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("gpugrid encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("gpugrid render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            pass.execute_bundles(bundles.iter());
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
