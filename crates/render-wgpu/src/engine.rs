use crate::gpu::{Attachments, SceneRenderer};
use glview_render::{
    EngineOptions, PowerPreference, RenderEngine, RenderError, RenderView, Thumbnail,
};
use glview_scene::Scene;
use std::sync::Arc;

const MSAA_SAMPLES: u32 = 4;

/// A native window to draw into, with its current physical size.
#[derive(Clone)]
pub struct WgpuCanvas {
    pub window: Arc<dyn wgpu::WindowHandle>,
    pub width: u32,
    pub height: u32,
    pub scale_factor: f64,
}

impl std::fmt::Debug for WgpuCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuCanvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("scale_factor", &self.scale_factor)
            .finish_non_exhaustive()
    }
}

/// Overlay hook target: the frame being presented.
pub struct OverlayTarget<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub view: &'a wgpu::TextureView,
    pub size: (u32, u32),
}

struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: SceneRenderer,
    attachments: Attachments,
    /// Drawn but not yet presented, so an overlay can still be added.
    pending: Option<wgpu::SurfaceTexture>,
}

/// wgpu forward renderer implementing [`RenderEngine`].
pub struct WgpuEngine {
    gpu: Option<Gpu>,
    options: EngineOptions,
    scale_factor: f64,
}

impl WgpuEngine {
    pub fn device(&self) -> Option<&wgpu::Device> {
        self.gpu.as_ref().map(|g| &g.device)
    }

    pub fn surface_format(&self) -> Option<wgpu::TextureFormat> {
        self.gpu.as_ref().map(|g| g.config.format)
    }

    /// Present the frame from the last `draw`, letting `overlay` render on
    /// top of it first. No-op when nothing is pending.
    pub fn present_with(&mut self, overlay: impl FnOnce(OverlayTarget<'_>)) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let Some(frame) = gpu.pending.take() else {
            return;
        };
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        overlay(OverlayTarget {
            device: &gpu.device,
            queue: &gpu.queue,
            view: &view,
            size: (gpu.config.width, gpu.config.height),
        });
        frame.present();
    }

    pub fn present(&mut self) {
        self.present_with(|_| {});
    }

    fn gpu_mut(&mut self) -> Result<&mut Gpu, RenderError> {
        self.gpu.as_mut().ok_or(RenderError::Disposed)
    }
}

impl RenderEngine for WgpuEngine {
    type Canvas = WgpuCanvas;

    fn create(canvas: WgpuCanvas, options: &EngineOptions) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(Arc::clone(&canvas.window))
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let power_preference = match options.power_preference {
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
        };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("glview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::Device(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Surface("surface reports no formats".into()))?;

        let (width, height) = options.render_size(canvas.width, canvas.height, canvas.scale_factor);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: if options.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let sample_count = if options.antialias { MSAA_SAMPLES } else { 1 };
        let renderer = SceneRenderer::new(&device, format, sample_count);
        let attachments = Attachments::new(&device, format, sample_count, width, height);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            width,
            height,
            sample_count,
            "wgpu engine created"
        );

        Ok(Self {
            gpu: Some(Gpu {
                surface,
                device,
                queue,
                config,
                renderer,
                attachments,
                pending: None,
            }),
            options: options.clone(),
            scale_factor: canvas.scale_factor,
        })
    }

    fn size(&self) -> (u32, u32) {
        self.gpu
            .as_ref()
            .map_or((0, 0), |g| (g.config.width, g.config.height))
    }

    fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = self.options.render_size(width, height, self.scale_factor);
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if (gpu.config.width, gpu.config.height) == (width, height) {
            return;
        }
        gpu.pending = None;
        gpu.config.width = width;
        gpu.config.height = height;
        gpu.surface.configure(&gpu.device, &gpu.config);
        gpu.attachments = Attachments::new(
            &gpu.device,
            gpu.renderer.format(),
            gpu.renderer.sample_count(),
            width,
            height,
        );
        tracing::debug!(width, height, "wgpu engine resized");
    }

    fn draw(&mut self, scene: &Scene, view: &RenderView) -> Result<(), RenderError> {
        // A frame nobody overlaid is presented as-is.
        self.present();
        let grid = self.options.grid;
        let gpu = self.gpu_mut()?;

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::debug!("surface timeout, frame skipped");
                return Ok(());
            }
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };
        let output = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });
        gpu.renderer.encode(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &output,
            &gpu.attachments,
            scene,
            view,
            grid,
        );
        gpu.queue.submit(std::iter::once(encoder.finish()));
        gpu.pending = Some(frame);
        Ok(())
    }

    fn capture(
        &mut self,
        scene: &Scene,
        view: &RenderView,
        size: u32,
    ) -> Result<Thumbnail, RenderError> {
        if size == 0 {
            return Err(RenderError::Capture("zero-sized capture".into()));
        }
        let gpu = self.gpu_mut()?;
        let format = gpu.renderer.format();
        let target = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("capture_target"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let output = target.create_view(&Default::default());
        let attachments =
            Attachments::new(&gpu.device, format, gpu.renderer.sample_count(), size, size);

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("capture_encoder"),
        });
        let capture_view = RenderView {
            aspect: 1.0,
            highlight: None,
            ..*view
        };
        gpu.renderer.encode(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &output,
            &attachments,
            scene,
            &capture_view,
            false,
        );

        let thumbnail = crate::readback::read_texture(
            &gpu.device,
            &gpu.queue,
            encoder,
            &target,
            format,
            size,
        )?;
        tracing::debug!(size, meshes = gpu.renderer.uploaded_meshes(), "thumbnail captured");
        Ok(thumbnail)
    }

    fn dispose(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            drop(gpu.pending);
            tracing::info!("wgpu engine disposed");
        }
    }

    fn is_disposed(&self) -> bool {
        self.gpu.is_none()
    }
}

impl Drop for WgpuEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}
