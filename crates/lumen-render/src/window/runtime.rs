use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::config::EngineConfig;
use crate::coords::IRect;
use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::gpu::WgpuBackend;
use crate::render::RenderEngine;
use crate::time::FrameClock;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Drives one window and its render engine until the app asks to exit.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, engine_config: EngineConfig, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut host = Host {
            config,
            gpu_init,
            engine_config,
            app,
            output: None,
        };
        event_loop
            .run_app(&mut host)
            .context("winit event loop terminated with error")
    }
}

/// Window plus the device and surface that borrow it.
#[self_referencing]
struct Surface {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// The engine holds device handles only, so it sits beside the
/// self-referencing surface rather than inside it.
struct Output {
    id: WindowId,
    engine: RenderEngine<WgpuBackend>,
    surface: Surface,
}

impl Output {
    fn open(event_loop: &ActiveEventLoop, config: &RuntimeConfig, gpu_init: GpuInit, engine_config: EngineConfig) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(config.initial_size);
        let window = event_loop.create_window(attrs).context("failed to create window")?;
        let id = window.id();

        let surface = SurfaceTryBuilder {
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()?;

        let engine = surface.with_gpu(|gpu| RenderEngine::new(gpu.create_backend(), engine_config));
        engine.init().context("render engine initialization failed")?;
        engine.set_viewport(IRect::from_size(surface.with_gpu(|gpu| gpu.frame_size())), false);

        Ok(Self { id, engine, surface })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.surface.with_gpu_mut(|gpu| gpu.resize(size));
        if size.width > 0 && size.height > 0 {
            let rect = IRect::new(0, 0, size.width as i32, size.height as i32);
            self.engine.set_viewport(rect, false);
        }
    }

    fn request_redraw(&self) {
        self.surface.with_window(|w| w.request_redraw());
    }

    /// Rebuilds the device and brings the engine back up on it.
    fn recover(&mut self) -> Result<()> {
        let engine = &self.engine;
        self.surface.with_gpu_mut(|gpu| -> Result<()> {
            pollster::block_on(gpu.recreate_device())?;
            engine.replace_backend(gpu.create_backend());
            engine.init().context("render engine re-initialization failed")?;
            engine.set_viewport(IRect::from_size(gpu.frame_size()), false);
            Ok(())
        })?;
        self.surface.with_clock_mut(|clock| clock.reset());
        Ok(())
    }

    /// Renders one frame: the engine targets the surface texture while the
    /// app draws, then the frame is presented.
    fn render(&mut self, app: &mut impl App) -> AppControl {
        let (id, engine) = (self.id, &self.engine);
        self.surface.with_mut(|fields| {
            let frame = match fields.gpu.begin_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    return match fields.gpu.handle_surface_error(err) {
                        SurfaceErrorAction::Fatal => AppControl::Exit,
                        SurfaceErrorAction::RecreateDevice => {
                            engine.context_lost();
                            AppControl::Continue
                        }
                        SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => AppControl::Continue,
                    };
                }
            };

            let size = fields.gpu.frame_size();
            let control = {
                let locker = engine.lock();
                locker.with_backend(|b| b.set_output(Some(frame.view.clone()), size));
                engine.set_viewport(IRect::from_size(size), false);

                let mut ctx = FrameCtx {
                    window: WindowCtx { id, window: fields.window },
                    engine,
                    time: fields.clock.tick(),
                };
                let control = app.on_frame(&mut ctx);

                engine.flush(false);
                locker.with_backend(|b| b.set_output(None, size));
                control
            };

            fields.window.pre_present_notify();
            frame.present();
            control
        })
    }

    fn device_lost(&self) -> bool {
        self.surface.with_gpu(|gpu| gpu.is_device_lost()) || !self.engine.is_initialized()
    }
}

struct Host<A: App + 'static> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    engine_config: EngineConfig,
    app: A,
    output: Option<Output>,
}

impl<A: App + 'static> Host<A> {
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(output) = self.output.as_mut() else {
            return;
        };

        if output.device_lost() {
            log::warn!("GPU device lost, recreating");
            if let Err(e) = output.recover() {
                log::error!("device recovery failed: {e:#}");
                event_loop.exit();
                return;
            }
            self.app.on_engine_ready(output.id, &output.engine);
        }

        if output.render(&mut self.app) == AppControl::Exit {
            event_loop.exit();
        }
    }
}

impl<A: App + 'static> ApplicationHandler for Host<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.output.is_some() {
            return;
        }
        match Output::open(event_loop, &self.config, self.gpu_init.clone(), self.engine_config.clone()) {
            Ok(output) => {
                self.app.on_engine_ready(output.id, &output.engine);
                output.request_redraw();
                self.output = Some(output);
            }
            Err(e) => {
                log::error!("failed to open window: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        // Video and visualisers animate every frame.
        if let Some(output) = &self.output {
            output.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.output.as_ref().is_none_or(|o| o.id != window_id) {
            return;
        }
        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                // Drops the engine (releasing its resources) before the device.
                self.output = None;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(output) = self.output.as_mut() {
                    output.resize(size);
                    output.request_redraw();
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(output) = self.output.as_mut() {
                    let size = output.surface.with_window(|w| w.inner_size());
                    output.resize(size);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}
