use winit::window::{Window, WindowId};

use crate::coords::{IRect, ISize};
use crate::gpu::WgpuBackend;
use crate::render::RenderEngine;
use crate::time::FrameTime;

/// Per-window handles.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Drawable size in physical pixels, the space the engine draws in.
    pub fn physical_size(&self) -> ISize {
        let size = self.window.inner_size();
        ISize::new(size.width, size.height)
    }

    pub fn scale_factor(&self) -> f32 {
        self.window.scale_factor() as f32
    }
}

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
pub struct FrameCtx<'a> {
    pub window: WindowCtx<'a>,
    pub engine: &'a RenderEngine<WgpuBackend>,
    pub time: FrameTime,
}

impl FrameCtx<'_> {
    /// Whole-window rectangle in device pixels.
    pub fn bounds(&self) -> IRect {
        IRect::from_size(self.window.physical_size())
    }
}
