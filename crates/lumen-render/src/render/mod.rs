//! Render engine.
//!
//! `RenderEngine` is the thread-safe façade; `RenderCore` holds the state
//! behind the engine lock and implements every operation.
//!
//! Convention:
//! - geometry is in device pixels (top-left origin, +Y down)
//! - the projection uniform is `ortho(viewport) × transform top`
//! - the parameters uniform is program specific (colour in column 0)

mod draw;
mod engine;
mod resources;
mod state;

pub use state::{EngineState, RenderCore};
pub use draw::MAX_PLANES;
pub use engine::RenderEngine;
pub use resources::{bicubic_weights, HELPER_TEXTURE_WIDTH};
