//! Lumen Studio: a windowed showcase for the render engine.
//!
//! Draws a synthetic video test card through the interop path, an audio
//! visualiser picked from the visualiser table, and a few UI panels with
//! rectangles, rounded rectangles and transforms.
//!
//! Keys: `V` cycles visualisers, `I` toggles interlaced sampling, `Esc` quits.

mod studio;
mod testcard;
mod visualiser;

use anyhow::Result;
use winit::dpi::LogicalSize;

use lumen_render::EngineConfig;
use lumen_render::device::GpuInit;
use lumen_render::logging::{LoggingConfig, init_logging};
use lumen_render::window::{Runtime, RuntimeConfig};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let engine_config = EngineConfig::from_env();
    log::info!("engine config: {engine_config:?}");

    let window = RuntimeConfig {
        title: "Lumen Studio".to_string(),
        initial_size: LogicalSize::new(1280.0, 720.0),
    };
    let gpu_init = GpuInit {
        present_mode: wgpu::PresentMode::AutoVsync,
        ..GpuInit::default()
    };

    Runtime::run(window, gpu_init, engine_config, studio::Studio::new())
}
