use crate::config::WindowConfig;
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Fullscreen, Window};

use super::DEPTH_FORMAT;

pub struct SurfaceFrame {
    view: wgpu::TextureView,
    surface: wgpu::SurfaceTexture,
}

impl SurfaceFrame {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn present(self) {
        self.surface.present();
    }
}

/// What the frame loop does after the swapchain refuses a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurfaceErrorAction {
    Reconfigure,
    SkipFrame,
}

impl SurfaceErrorAction {
    fn for_error(error: &wgpu::SurfaceError) -> Self {
        match error {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Self::Reconfigure,
            wgpu::SurfaceError::Timeout | wgpu::SurfaceError::OutOfMemory | wgpu::SurfaceError::Other => {
                Self::SkipFrame
            }
        }
    }
}

/// Combined depth + stencil attachment; depth clears to 1.0 and stencil to 0 every frame.
struct DepthStencilTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthStencilTarget {
    fn new(device: &wgpu::Device, size: PhysicalSize<u32>) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Room Depth Stencil"),
            size: wgpu::Extent3d { width: size.width.max(1), height: size.height.max(1), depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { _texture: texture, view }
    }
}

/// Everything that only exists once a window is up.
struct GpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth: DepthStencilTarget,
}

impl GpuContext {
    async fn connect(window: Arc<Window>, vsync: bool) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window).context("Failed to create WGPU surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to request WGPU adapter")?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Skyroom Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
            })
            .await
            .context("Failed to request WGPU device")?;

        let caps = surface.get_capabilities(&adapter);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: srgb_or_first(&caps.formats).context("Surface reports no formats")?,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: present_mode(vsync, &caps.present_modes),
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let depth = DepthStencilTarget::new(&device, size);
        log::info!("[renderer] surface {}x{} format {:?}", config.width, config.height, config.format);
        Ok(Self { surface, device, queue, config, depth })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthStencilTarget::new(&self.device, size);
    }
}

/// Window, swapchain and the shared depth-stencil attachment.
pub struct WindowSurface {
    settings: WindowConfig,
    size: PhysicalSize<u32>,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
}

impl WindowSurface {
    pub fn new(window_cfg: &WindowConfig) -> Self {
        Self {
            settings: window_cfg.clone(),
            size: PhysicalSize::new(window_cfg.width, window_cfg.height),
            window: None,
            gpu: None,
        }
    }

    pub fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        if self.window.is_some() {
            return Ok(());
        }
        let mut attrs = Window::default_attributes().with_title(self.settings.title.clone()).with_inner_size(self.size);
        if self.settings.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = Arc::new(event_loop.create_window(attrs).context("Failed to create window")?);
        let gpu = pollster::block_on(GpuContext::connect(window.clone(), self.settings.vsync))?;
        self.size = window.inner_size();
        self.gpu = Some(gpu);
        self.window = Some(window);
        Ok(())
    }

    fn gpu(&self) -> Result<&GpuContext> {
        self.gpu.as_ref().context("GPU not initialized")
    }

    pub fn device(&self) -> Result<&wgpu::Device> {
        Ok(&self.gpu()?.device)
    }

    pub fn queue(&self) -> Result<&wgpu::Queue> {
        Ok(&self.gpu()?.queue)
    }

    pub fn depth_view(&self) -> Result<&wgpu::TextureView> {
        Ok(&self.gpu()?.depth.view)
    }

    pub fn surface_format(&self) -> Result<wgpu::TextureFormat> {
        Ok(self.gpu()?.config.format)
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn window(&self) -> Option<&Window> {
        self.window.as_deref()
    }

    pub fn request_redraw(&self) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    /// Zero-sized (minimised) windows only record the size; the swapchain keeps its last extent.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(new_size);
        }
    }

    pub fn acquire_surface_frame(&mut self) -> Result<SurfaceFrame> {
        let gpu = self.gpu.as_mut().ok_or_else(|| anyhow!("Surface not initialized"))?;
        let error = match gpu.surface.get_current_texture() {
            Ok(surface) => {
                let view = surface.texture.create_view(&wgpu::TextureViewDescriptor::default());
                return Ok(SurfaceFrame { view, surface });
            }
            Err(error) => error,
        };
        if SurfaceErrorAction::for_error(&error) == SurfaceErrorAction::Reconfigure {
            let size = self.size;
            self.resize(size);
            return Err(anyhow!("Surface {error}; reconfigured"));
        }
        Err(anyhow!("Surface {error}; frame skipped"))
    }
}

fn present_mode(vsync: bool, available: &[wgpu::PresentMode]) -> wgpu::PresentMode {
    let tearing = available.iter().copied().find(|mode| *mode != wgpu::PresentMode::Fifo);
    match (vsync, tearing) {
        (false, Some(mode)) => mode,
        _ => wgpu::PresentMode::Fifo,
    }
}

fn srgb_or_first(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats.iter().copied().find(|f| f.is_srgb()).or_else(|| formats.first().copied())
}
