//! Window + runtime loop.
//!
//! Owns the `winit` event loop, the window's [`RenderEngine`](crate::render::RenderEngine)
//! and the device behind it, and recovers the engine when the device is lost.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
