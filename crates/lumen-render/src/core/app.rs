use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::gpu::WgpuBackend;
use crate::render::RenderEngine;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
pub trait App {
    /// Called once the window's engine is initialized, and again after it was
    /// re-initialized on a recreated device. Every key handed out before a
    /// re-initialization is stale; recreate textures and programs here.
    fn on_engine_ready(&mut self, window_id: WindowId, engine: &RenderEngine<WgpuBackend>) {
        let _ = (window_id, engine);
    }

    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called once per rendered frame per window. The engine targets the
    /// window's frame for the duration of the call.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;
}
