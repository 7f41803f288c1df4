//! GPU resource objects and the backend seam.
//!
//! The engine owns every resource record in generation-checked arenas and
//! hands out `*Key` handles. Backends only ever see `Raw*` ids.

pub mod backend;
pub mod format;
pub mod framebuffer;
pub mod headless;
pub mod keys;
pub mod program;
pub mod texture;
pub mod wgpu_backend;

pub use backend::{
    Capabilities, ExternalHandle, Features, FenceStatus, GpuBackend, RawBuffer, RawFence,
    RawFramebuffer, RawProgram, RawTexture, TextureDesc, Topology, Uniform, VertexSource,
};
pub use format::{PixelFormat, PixelType, TextureFilter, TextureFormat, TextureWrap};
pub use headless::{GpuCommand, HeadlessBackend, HeadlessConfig, HeadlessProbe, LiveResources};
pub use keys::{BufferKey, FramebufferKey, ProgramKey, TextureKey};
pub use program::DefaultShader;
pub use texture::{TextureInfo, TextureOrigin, TextureSpec};
pub use wgpu_backend::WgpuBackend;
