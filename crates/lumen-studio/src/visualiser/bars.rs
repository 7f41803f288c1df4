use lumen_render::RenderResult;
use lumen_render::coords::IRect;
use lumen_render::paint::{Brush, Color, Pen};
use lumen_render::time::FrameTime;

use super::{Engine, Visualiser, synthetic_spectrum};

pub const NAME: &str = "Bars";

const BANDS: usize = 32;
/// Fraction of full height a bar loses per second.
const FALL_RATE: f32 = 1.8;
const PEAK_FALL_RATE: f32 = 0.35;

/// Classic spectrum analyser: rounded bars with falling peak markers.
#[derive(Default)]
pub struct Bars {
    levels: Vec<f32>,
    peaks: Vec<f32>,
}

impl Visualiser for Bars {
    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self, _engine: &Engine) -> RenderResult<()> {
        self.levels = vec![0.0; BANDS];
        self.peaks = vec![0.0; BANDS];
        Ok(())
    }

    fn draw(&mut self, engine: &Engine, area: IRect, time: &FrameTime) -> RenderResult<()> {
        let target = synthetic_spectrum(time.elapsed, BANDS);
        for ((level, peak), want) in self.levels.iter_mut().zip(&mut self.peaks).zip(target) {
            *level = want.max(*level - FALL_RATE * time.dt);
            *peak = level.max(*peak - PEAK_FALL_RATE * time.dt);
        }

        let slot = area.width / BANDS as i32;
        let gap = (slot / 5).max(1);
        let bar_width = slot - gap;
        if bar_width <= 0 || area.height <= 0 {
            return Ok(());
        }

        for (i, (level, peak)) in self.levels.iter().zip(&self.peaks).enumerate() {
            let x = area.x + i as i32 * slot + gap / 2;
            let height = (level * area.height as f32) as i32;
            let hue = i as f32 / BANDS as f32;
            let color = Color::from_straight(0.2 + 0.8 * hue, 0.9 - 0.5 * hue, 1.0 - hue, 1.0);

            let bar = IRect::new(x, area.bottom() - height, bar_width, height);
            engine.draw_round_rect(None, bar, bar_width / 3, &Brush::solid(color), &Pen::NONE, 230)?;

            let peak_y = area.bottom() - (peak * area.height as f32) as i32;
            let marker = IRect::new(x, peak_y - 3, bar_width, 3);
            engine.draw_rect(None, marker, &Brush::solid(Color::WHITE), &Pen::NONE, 200)?;
        }
        Ok(())
    }

    fn release(&mut self, _engine: &Engine) {
        self.levels.clear();
        self.peaks.clear();
    }
}
