use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::coords::ISize;
use crate::gpu::WgpuBackend;

use super::surface;
use super::{GpuFrame, GpuInit, SurfaceErrorAction};

/// wgpu objects for one window.
///
/// The surface borrows the window, so a `Gpu` lives next to its window
/// (the runtime keeps both in one self-referencing entry).
pub struct Gpu<'w> {
    instance: wgpu::Instance,
    surface: wgpu::Surface<'w>,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,

    /// Kept for recreating the device.
    init: GpuInit,

    /// Set from the device-lost callback of the current device.
    lost: Arc<AtomicBool>,
}

impl<'w> Gpu<'w> {
    /// Creates a GPU context bound to a window.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = request_adapter(&instance, &surface).await?;
        let lost = Arc::new(AtomicBool::new(false));
        let (device, queue) = request_device(&adapter, &init, &lost).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&surface_caps, init.prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: surface::choose_present_mode(&surface_caps, init.present_mode),
            alpha_mode: surface::choose_alpha_mode(&surface_caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        log::info!("surface {format:?} {}x{} on {}", size.width, size.height, adapter.get_info().name);

        Ok(Self {
            instance,
            surface,
            adapter,
            device,
            queue,
            config,
            size,
            init,
            lost,
        })
    }

    /// Builds a backend that renders into this window's frames.
    pub fn create_backend(&self) -> WgpuBackend {
        WgpuBackend::new(
            self.device.clone(),
            self.queue.clone(),
            &self.adapter.get_info(),
            self.config.format,
        )
    }

    /// True once the device reported itself lost. Every GPU object made on it
    /// is dead; call [`recreate_device`](Self::recreate_device).
    pub fn is_device_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    /// Requests a fresh adapter and device for the same surface.
    pub async fn recreate_device(&mut self) -> Result<()> {
        let adapter = request_adapter(&self.instance, &self.surface).await?;
        let lost = Arc::new(AtomicBool::new(false));
        let (device, queue) = request_device(&adapter, &self.init, &lost).await?;

        let caps = self.surface.get_capabilities(&adapter);
        if !caps.formats.contains(&self.config.format) {
            self.config.format = surface::choose_surface_format(&caps, self.init.prefer_srgb)
                .context("no supported surface formats")?;
        }
        if self.size.width > 0 && self.size.height > 0 {
            self.surface.configure(&device, &self.config);
        }

        log::warn!("device recreated on {}", adapter.get_info().name);
        self.adapter = adapter;
        self.device = device;
        self.queue = queue;
        self.lost = lost;
        Ok(())
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        surface::apply_resize(
            &self.surface,
            &self.device,
            &mut self.config,
            &mut self.size,
            new_size,
        );
    }

    /// Acquires the next swapchain image.
    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        Ok(GpuFrame { surface_texture, view })
    }

    /// Size of the frames `begin_frame` hands out.
    pub fn frame_size(&self) -> ISize {
        ISize::new(self.config.width, self.config.height)
    }

    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        surface::map_surface_error(
            &self.surface,
            &self.device,
            &self.config,
            self.size,
            self.is_device_lost(),
            err,
        )
    }
}

async fn request_adapter(instance: &wgpu::Instance, surface: &wgpu::Surface<'_>) -> Result<wgpu::Adapter> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(surface),
            force_fallback_adapter: false,
        })
        .await
        .context("failed to find a suitable GPU adapter")
}

async fn request_device(
    adapter: &wgpu::Adapter,
    init: &GpuInit,
    lost: &Arc<AtomicBool>,
) -> Result<(wgpu::Device, wgpu::Queue)> {
    let features = init.required_features | (adapter.features() & init.optional_features);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("lumen device"),
            required_features: features,
            required_limits: init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")?;

    let flag = Arc::clone(lost);
    device.set_device_lost_callback(move |reason, message| {
        log::error!("GPU device lost ({reason:?}): {message}");
        flag.store(true, Ordering::Release);
    });

    Ok((device, queue))
}
