//! Lumen render engine.
//!
//! A 2D rendering-resource manager for media front-ends: it owns one graphics
//! context and every texture, framebuffer, shader program and vertex buffer
//! created on it, caches quad geometry, serializes access from several
//! threads, and brings decoded video frames onto the GPU through pluggable
//! interop adapters.
//!
//! Layers, bottom-up:
//! - `gpu`: resource records, generation-checked keys and the backend seam
//!   (wgpu and a recording headless backend)
//! - `cache`, `transform`, `sync`: geometry caches, transform stack, locking
//! - `render`: the engine itself
//! - `interop`: hardware-surface interop registry and adapters
//! - `device`, `window`, `core`, `time`: windowed runtime on winit + wgpu

pub mod cache;
pub mod config;
pub mod coords;
pub mod error;
pub mod gpu;
pub mod interop;
pub mod logging;
pub mod math;
pub mod paint;
pub mod render;
pub mod sync;
pub mod transform;

pub mod core;
pub mod device;
pub mod time;
pub mod window;

pub use config::EngineConfig;
pub use error::{RenderError, RenderResult};
pub use render::RenderEngine;
