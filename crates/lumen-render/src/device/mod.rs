//! Window-bound wgpu device and swapchain.
//!
//! `Gpu` owns the instance, surface, adapter, device and queue for one window
//! and builds the [`WgpuBackend`](crate::gpu::WgpuBackend) the render engine
//! drives. When the device is lost it can be recreated in place against the
//! same surface.

mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use init::GpuInit;
