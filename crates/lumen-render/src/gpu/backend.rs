use std::sync::Arc;
use std::time::Duration;

use bitflags::bitflags;

use crate::coords::{IRect, ISize};
use crate::error::RenderResult;
use crate::math::Mat4;
use crate::paint::Color;

use super::format::{TextureFilter, TextureFormat, TextureWrap};

macro_rules! raw_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u32);
        )*
    };
}

raw_id! {
    /// Backend texture object.
    RawTexture,
    /// Backend vertex buffer object.
    RawBuffer,
    /// Backend off-screen render target.
    RawFramebuffer,
    /// Backend linked shader program.
    RawProgram,
    /// Backend fence object.
    RawFence,
}

bitflags! {
    /// Optional backend features. Missing features disable the matching
    /// optimization; none of them is required to render.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct Features: u32 {
        /// Textures may have non-power-of-two edges.
        const NPOT_TEXTURES    = 1 << 0;
        /// Vertex data can live in GPU buffers.
        const BUFFER_OBJECTS   = 1 << 1;
        /// Framebuffer contents can be discarded without a clear.
        const FB_DISCARD       = 1 << 2;
        /// Fences can bound CPU/GPU divergence.
        const FENCE            = 1 << 3;
        /// 16-bit normalized texture formats.
        const RGBA16           = 1 << 4;
        /// 32-bit float texture formats.
        const FLOAT_TEXTURES   = 1 << 5;
        /// Decoder surfaces can be bound as textures without a copy.
        const EXTERNAL_TEXTURE = 1 << 6;
        /// Debug markers show up in GPU captures.
        const DEBUG_MARKERS    = 1 << 7;
    }
}

/// What the backend reported at `init()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Capabilities {
    pub renderer: String,
    /// Software rasterizer (llvmpipe, WARP, ...).
    pub software: bool,
    pub max_texture_size: u32,
    pub max_texture_units: u32,
    pub features: Features,
}

impl Capabilities {
    #[inline]
    pub fn has(&self, feature: Features) -> bool {
        self.features.contains(feature)
    }
}

/// Texture allocation request as seen by the backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub size: ISize,
    pub format: TextureFormat,
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
    /// The texture will be a framebuffer colour attachment.
    pub render_target: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Topology {
    TriangleStrip,
    LineStrip,
}

/// Vertex data for one draw: a buffer object, or an array uploaded per draw.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum VertexSource<'a> {
    Buffer(RawBuffer),
    Inline(&'a [f32]),
}

/// Program uniform slots. Both are `mat4x4<f32>`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Uniform {
    /// Projection × model transform.
    Projection,
    /// Program-specific parameters (colour, shape geometry, colour matrix).
    Parameters,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FenceStatus {
    Signalled,
    TimedOut,
}

/// Platform surface a decoder hands over for zero-copy binding.
#[derive(Debug, Clone)]
pub enum ExternalHandle {
    /// Opaque platform handle (dmabuf, IOSurface, D3D shared handle) plus plane index.
    Native { id: u64, plane: u32 },
    /// Texture already resident on the engine's wgpu device.
    Wgpu(Arc<wgpu::Texture>),
}

/// Graphics API the render engine drives.
///
/// Calls arrive serialized under the engine lock and between `make_current`
/// and `done_current`. Implementations record or submit work in call order.
pub trait GpuBackend {
    fn capabilities(&self) -> Capabilities;

    /// Binds the context to the calling thread.
    fn make_current(&mut self);

    /// Releases the context from the calling thread.
    fn done_current(&mut self);

    // ── textures ──────────────────────────────────────────────────────────

    fn create_texture(&mut self, desc: &TextureDesc) -> RenderResult<RawTexture>;

    /// Writes `size` pixels at the texture origin; rows are `stride` bytes apart.
    fn upload_texture(
        &mut self,
        texture: RawTexture,
        size: ISize,
        stride: u32,
        data: &[u8],
    ) -> RenderResult<()>;

    fn set_texture_sampling(&mut self, texture: RawTexture, filter: TextureFilter, wrap: TextureWrap);

    /// Wraps a decoder surface plane without copying.
    fn import_external(&mut self, handle: &ExternalHandle, size: ISize) -> RenderResult<RawTexture>;

    fn delete_texture(&mut self, texture: RawTexture);

    // ── buffers ───────────────────────────────────────────────────────────

    /// Creates an immutable vertex buffer.
    fn create_buffer(&mut self, vertices: &[f32]) -> RenderResult<RawBuffer>;

    fn delete_buffer(&mut self, buffer: RawBuffer);

    // ── framebuffers ──────────────────────────────────────────────────────

    fn create_framebuffer(&mut self, color: RawTexture, size: ISize) -> RenderResult<RawFramebuffer>;

    fn delete_framebuffer(&mut self, framebuffer: RawFramebuffer);

    /// `None` selects the default output.
    fn bind_framebuffer(&mut self, framebuffer: Option<RawFramebuffer>);

    fn discard_framebuffer(&mut self, framebuffer: RawFramebuffer);

    fn set_clear_color(&mut self, color: Color);

    /// Clears the bound target to the clear colour.
    fn clear(&mut self);

    // ── programs ──────────────────────────────────────────────────────────

    fn compile_program(&mut self, vertex: &str, fragment: &str) -> RenderResult<RawProgram>;

    fn delete_program(&mut self, program: RawProgram);

    fn use_program(&mut self, program: RawProgram);

    fn set_uniform(&mut self, program: RawProgram, slot: Uniform, value: &Mat4);

    // ── draw state ────────────────────────────────────────────────────────

    fn bind_texture(&mut self, unit: u32, texture: Option<RawTexture>);

    fn set_viewport(&mut self, rect: IRect);

    fn set_blend(&mut self, enabled: bool);

    fn draw(&mut self, topology: Topology, vertices: VertexSource<'_>, count: u32);

    // ── synchronization ───────────────────────────────────────────────────

    /// Submits pending work without waiting.
    fn flush(&mut self);

    /// Submits pending work and waits for it to complete.
    fn finish(&mut self);

    fn create_fence(&mut self) -> RenderResult<RawFence>;

    /// Inserts the fence after all work submitted so far.
    fn set_fence(&mut self, fence: RawFence);

    fn wait_fence(&mut self, fence: RawFence, timeout: Duration) -> FenceStatus;

    fn delete_fence(&mut self, fence: RawFence);

    fn debug_marker(&mut self, message: &str) {
        let _ = message;
    }
}
