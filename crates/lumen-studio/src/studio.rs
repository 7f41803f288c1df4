use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use lumen_render::RenderResult;
use lumen_render::coords::{IRect, ISize};
use lumen_render::core::{App, AppControl, FrameCtx};
use lumen_render::paint::{Brush, Color, Pen};
use lumen_render::time::FrameTime;
use lumen_render::transform::UiEffects;

use crate::testcard::TestCard;
use crate::visualiser::{self, Engine, Visualiser, VisualiserFactory};

const MARGIN: i32 = 16;
const STATUS_HEIGHT: i32 = 44;

const PANEL: Color = Color::from_premul(0.06, 0.07, 0.09, 1.0);
const EDGE: Color = Color::from_premul(0.25, 0.28, 0.34, 1.0);
const ACCENT: Color = Color::from_premul(0.2, 0.55, 0.95, 1.0);

pub struct Studio {
    test_card: TestCard,
    factories: Vec<&'static VisualiserFactory>,
    current: usize,
    visualiser: Option<Box<dyn Visualiser>>,
    switch_requested: bool,
    scan_toggle_requested: bool,
}

impl Studio {
    pub fn new() -> Self {
        Self {
            test_card: TestCard::new(ISize::new(640, 360)),
            factories: Vec::new(),
            current: 0,
            visualiser: None,
            switch_requested: false,
            scan_toggle_requested: false,
        }
    }

    fn start_visualiser(&mut self, engine: &Engine) {
        if let Some(mut old) = self.visualiser.take() {
            old.release(engine);
        }
        let Some(factory) = self.factories.get(self.current) else {
            log::warn!("no visualiser can run on this renderer");
            return;
        };
        let mut vis = (factory.create)();
        match vis.init(engine) {
            Ok(()) => {
                log::info!("visualiser: {}", vis.name());
                self.visualiser = Some(vis);
            }
            Err(e) => log::warn!("visualiser {} failed to start: {e}", factory.name),
        }
    }

    fn draw(&mut self, engine: &Engine, bounds: IRect, time: &FrameTime) -> RenderResult<()> {
        // Bound how far the CPU runs ahead: wait for the previous frame.
        engine.flush(true);

        if self.scan_toggle_requested {
            self.scan_toggle_requested = false;
            self.test_card.toggle_scan();
        }
        if self.switch_requested {
            self.switch_requested = false;
            if !self.factories.is_empty() {
                self.current = (self.current + 1) % self.factories.len();
                self.start_visualiser(engine);
            }
        }

        engine.set_background(8, 9, 12, 255);
        engine.bind_framebuffer(None)?;
        engine.clear_framebuffer();
        engine.set_blend(true);

        let content = IRect::new(
            bounds.x + MARGIN,
            bounds.y + MARGIN,
            bounds.width - 2 * MARGIN,
            bounds.height - 3 * MARGIN - STATUS_HEIGHT,
        );
        if content.is_empty() {
            return Ok(());
        }
        let video_panel = IRect::new(content.x, content.y, content.width * 3 / 5, content.height);
        let vis_panel = IRect::new(
            video_panel.right() + MARGIN,
            content.y,
            content.right() - video_panel.right() - MARGIN,
            content.height,
        );
        let status = IRect::new(content.x, content.bottom() + MARGIN, content.width, STATUS_HEIGHT);

        engine.log_debug_marker("studio: video");
        self.test_card.update(engine, time.elapsed)?;
        self.draw_video(engine, video_panel, time)?;

        engine.log_debug_marker("studio: visualiser");
        engine.draw_round_rect(None, vis_panel, 12, &Brush::solid(PANEL), &Pen::new(EDGE, 2), 255)?;
        if let Some(vis) = self.visualiser.as_mut() {
            vis.draw(engine, vis_panel.inset(12), time)?;
        }

        engine.log_debug_marker("studio: status");
        self.draw_status(engine, status)?;

        engine.set_fence();
        Ok(())
    }

    fn draw_video(&self, engine: &Engine, panel: IRect, time: &FrameTime) -> RenderResult<()> {
        engine.draw_rect(None, panel, &Brush::solid(PANEL), &Pen::new(EDGE, 2), 255)?;

        let inner = panel.inset(8);
        let picture = fit_aspect(inner, self.test_card.aspect());
        self.test_card.draw(engine, picture)?;

        // Picture-in-picture preview, gently rocking.
        let pip = IRect::new(
            picture.right() - picture.width / 4 - 12,
            picture.y + 12,
            picture.width / 4,
            picture.height / 4,
        );
        let fx = UiEffects {
            angle: (time.elapsed * 0.8).sin() * 6.0,
            scale: 1.0 + 0.05 * (time.elapsed * 1.7).sin(),
            ..UiEffects::default()
        };
        engine.push_transformation(&fx, pip.centre());
        let result = engine
            .draw_rect(None, pip.inset(-3), &Brush::None, &Pen::new(Color::WHITE, 3), 220)
            .and_then(|()| self.test_card.draw(engine, pip));
        engine.pop_transformation()?;
        result
    }

    fn draw_status(&self, engine: &Engine, area: IRect) -> RenderResult<()> {
        engine.draw_round_rect(None, area, area.height / 2, &Brush::solid(PANEL), &Pen::new(EDGE, 1), 255)?;

        let chip_width = 120;
        for (i, factory) in self.factories.iter().enumerate() {
            let chip = IRect::new(area.x + 12 + i as i32 * (chip_width + 8), area.y + 8, chip_width, area.height - 16);
            let (brush, pen) = if i == self.current {
                (Brush::solid(ACCENT), Pen::NONE)
            } else {
                (Brush::None, Pen::new(EDGE, 1))
            };
            log::trace!("status chip {}", factory.name);
            engine.draw_round_rect(None, chip, chip.height / 2, &brush, &pen, 255)?;
        }

        // Vertex and VBO cache fill, as two meters on the right.
        let (vertices, _) = engine.vertex_cache_stats();
        let (vbos, _) = engine.vbo_cache_stats();
        let limits = engine.config();
        for (i, (used, limit)) in [(vertices, limits.vertex_cache_limit), (vbos, limits.vbo_cache_limit)]
            .into_iter()
            .enumerate()
        {
            let meter = IRect::new(area.right() - 220, area.y + 10 + i as i32 * 14, 200, 8);
            engine.draw_rect(None, meter, &Brush::None, &Pen::new(EDGE, 1), 255)?;
            let fill = used as f32 / limit.max(1) as f32;
            let bar = IRect::new(meter.x, meter.y, (meter.width as f32 * fill.min(1.0)) as i32, meter.height);
            engine.draw_rect(None, bar, &Brush::solid(ACCENT), &Pen::NONE, 200)?;
        }
        Ok(())
    }
}

/// Largest rectangle of `aspect` centred in `area`.
fn fit_aspect(area: IRect, aspect: f32) -> IRect {
    let by_width = (area.width as f32 / aspect) as i32;
    let (w, h) = if by_width <= area.height {
        (area.width, by_width)
    } else {
        ((area.height as f32 * aspect) as i32, area.height)
    };
    IRect::new(area.x + (area.width - w) / 2, area.y + (area.height - h) / 2, w, h)
}

impl App for Studio {
    fn on_engine_ready(&mut self, _window_id: WindowId, engine: &Engine) {
        let Some(caps) = engine.capabilities() else {
            return;
        };
        if !engine.is_recommended_renderer() {
            log::warn!("'{}' is a software renderer; expect low frame rates", caps.renderer);
        }

        // Keys from before a re-initialization are stale; start over.
        self.visualiser = None;
        self.factories = visualiser::available(&caps);
        self.current = self.current.min(self.factories.len().saturating_sub(1));
        self.start_visualiser(engine);

        if let Err(e) = self.test_card.init(engine) {
            log::error!("test card setup failed: {e}");
        }
    }

    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed || event.repeat {
            return AppControl::Continue;
        }
        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => return AppControl::Exit,
            PhysicalKey::Code(KeyCode::KeyV) => self.switch_requested = true,
            PhysicalKey::Code(KeyCode::KeyI) => self.scan_toggle_requested = true,
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let bounds = ctx.bounds();
        if let Err(e) = self.draw(ctx.engine, bounds, &ctx.time) {
            log::warn!("frame {} incomplete: {e}", ctx.time.frame_index);
        }
        AppControl::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_aspect_letterboxes_and_pillarboxes() {
        assert_eq!(fit_aspect(IRect::new(0, 0, 1600, 1000), 16.0 / 9.0), IRect::new(0, 50, 1600, 900));
        assert_eq!(fit_aspect(IRect::new(0, 0, 1000, 900), 1.0), IRect::new(50, 0, 900, 900));
    }
}
