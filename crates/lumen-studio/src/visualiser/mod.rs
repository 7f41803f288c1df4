//! Audio visualisers.
//!
//! Each visualiser is listed once in [`VISUALISERS`] with a predicate telling
//! whether the current renderer can run it; the studio cycles through the
//! ones that pass.

mod bars;
mod plasma;

use lumen_render::RenderResult;
use lumen_render::coords::IRect;
use lumen_render::gpu::{Capabilities, WgpuBackend};
use lumen_render::render::RenderEngine;
use lumen_render::time::FrameTime;

pub type Engine = RenderEngine<WgpuBackend>;

pub trait Visualiser {
    fn name(&self) -> &'static str;

    /// Allocates GPU resources. Called again after the engine was
    /// re-initialized, when every earlier key is stale.
    fn init(&mut self, engine: &Engine) -> RenderResult<()>;

    fn draw(&mut self, engine: &Engine, area: IRect, time: &FrameTime) -> RenderResult<()>;

    fn release(&mut self, engine: &Engine);
}

pub struct VisualiserFactory {
    pub name: &'static str,
    pub supported: fn(&Capabilities) -> bool,
    pub create: fn() -> Box<dyn Visualiser>,
}

fn any_renderer(_: &Capabilities) -> bool {
    true
}

/// The plasma is rewritten on the CPU and re-uploaded every frame; too slow
/// on a software rasterizer.
fn hardware_renderer(caps: &Capabilities) -> bool {
    !caps.software
}

fn create_bars() -> Box<dyn Visualiser> {
    Box::new(bars::Bars::default())
}

fn create_plasma() -> Box<dyn Visualiser> {
    Box::new(plasma::Plasma::default())
}

pub static VISUALISERS: &[VisualiserFactory] = &[
    VisualiserFactory { name: bars::NAME, supported: any_renderer, create: create_bars },
    VisualiserFactory { name: plasma::NAME, supported: hardware_renderer, create: create_plasma },
];

pub fn available(caps: &Capabilities) -> Vec<&'static VisualiserFactory> {
    VISUALISERS.iter().filter(|f| (f.supported)(caps)).collect()
}

/// Deterministic stand-in for an FFT of the playing audio: `bands` levels in
/// `0.0..=1.0` at time `t` seconds.
pub fn synthetic_spectrum(t: f32, bands: usize) -> Vec<f32> {
    (0..bands)
        .map(|i| {
            let f = i as f32 / bands.max(1) as f32;
            let beat = (t * 2.1).sin().max(0.0).powi(4) * (1.0 - f);
            let wobble = 0.5 + 0.5 * (t * (1.3 + 3.0 * f) + f * 9.0).sin();
            (0.15 + 0.55 * wobble * (1.0 - 0.6 * f) + 0.3 * beat).clamp(0.0, 1.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectrum_stays_in_range() {
        for step in 0..200 {
            let levels = synthetic_spectrum(step as f32 * 0.37, 32);
            assert_eq!(levels.len(), 32);
            assert!(levels.iter().all(|l| (0.0..=1.0).contains(l)));
        }
        assert!(synthetic_spectrum(1.0, 0).is_empty());
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = VISUALISERS.iter().map(|f| f.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), VISUALISERS.len());
    }
}
