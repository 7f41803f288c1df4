use std::cell::RefCell;

use image::DynamicImage;
use parking_lot::ReentrantMutex;

use crate::cache::CacheStats;
use crate::config::EngineConfig;
use crate::coords::{IRect, ISize, Vec2};
use crate::error::RenderResult;
use crate::gpu::backend::{Capabilities, ExternalHandle, GpuBackend, Uniform};
use crate::gpu::format::{self, PixelFormat, PixelType, TextureFilter, TextureWrap};
use crate::gpu::keys::{BufferKey, FramebufferKey, ProgramKey, TextureKey};
use crate::gpu::program::DefaultShader;
use crate::gpu::texture::{TextureInfo, TextureSpec};
use crate::math::Mat4;
use crate::paint::{Brush, Pen};
use crate::sync::RenderLocker;
use crate::transform::UiEffects;

use super::state::RenderCore;

/// Thread-safe handle to one graphics context and every resource created on it.
///
/// Every method takes the engine lock for its duration. Hold an outer
/// [`RenderLocker`] (from [`RenderEngine::lock`]) to make a sequence of calls
/// atomic with respect to other threads.
pub struct RenderEngine<B: GpuBackend> {
    inner: ReentrantMutex<RefCell<RenderCore<B>>>,
}

impl<B: GpuBackend> RenderEngine<B> {
    /// Wraps `backend`. Nothing touches the GPU until [`init`](Self::init).
    pub fn new(backend: B, config: EngineConfig) -> Self {
        log::debug!(
            "render engine created (vertex cache {}, vbo cache {})",
            config.vertex_cache_limit,
            config.vbo_cache_limit
        );
        Self {
            inner: ReentrantMutex::new(RefCell::new(RenderCore::new(backend, config))),
        }
    }

    /// Acquires the engine lock; reentrant on the owning thread.
    pub fn lock(&self) -> RenderLocker<'_, B> {
        RenderLocker::acquire(&self.inner)
    }

    fn with_core<R>(&self, f: impl FnOnce(&mut RenderCore<B>) -> R) -> R {
        self.lock().with_core(f)
    }

    pub fn config(&self) -> EngineConfig {
        self.with_core(|c| c.config.clone())
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    pub fn init(&self) -> RenderResult<()> {
        self.with_core(|c| c.init())
    }

    pub fn release(&self) {
        self.with_core(|c| c.release())
    }

    pub fn is_initialized(&self) -> bool {
        self.with_core(|c| c.is_initialized())
    }

    /// Forgets every resource after the context died. Call `init` (usually
    /// after `replace_backend`) to render again.
    pub fn context_lost(&self) {
        self.with_core(|c| c.context_lost())
    }

    /// Swaps in a backend for a recreated device and returns the old one.
    /// All resources are forgotten; the engine is left uninitialized.
    pub fn replace_backend(&self, backend: B) -> B {
        let locker = self.lock();
        let mut core = locker.core();
        core.context_lost();
        let old = std::mem::replace(&mut core.backend, backend);
        core.backend.make_current();
        old
    }

    pub fn capabilities(&self) -> Option<Capabilities> {
        self.with_core(|c| c.capabilities())
    }

    pub fn is_recommended_renderer(&self) -> bool {
        self.with_core(|c| c.is_recommended_renderer())
    }

    // ── state ─────────────────────────────────────────────────────────────

    pub fn set_viewport(&self, rect: IRect, viewport_only: bool) {
        self.with_core(|c| c.set_viewport(rect, viewport_only))
    }

    pub fn viewport(&self) -> IRect {
        self.with_core(|c| c.viewport)
    }

    pub fn set_blend(&self, enable: bool) {
        self.with_core(|c| c.set_blend(enable))
    }

    pub fn set_background(&self, r: u8, g: u8, b: u8, a: u8) {
        self.with_core(|c| c.set_background(r, g, b, a))
    }

    pub fn log_debug_marker(&self, message: &str) {
        self.with_core(|c| c.log_debug_marker(message))
    }

    pub fn push_transformation(&self, fx: &UiEffects, centre: Vec2) {
        self.with_core(|c| c.push_transformation(fx, centre))
    }

    pub fn pop_transformation(&self) -> RenderResult<()> {
        self.with_core(|c| c.pop_transformation())
    }

    /// Current model transform (identity with an empty stack).
    pub fn transformation(&self) -> Mat4 {
        self.with_core(|c| c.transforms.top())
    }

    pub fn transform_depth(&self) -> usize {
        self.with_core(|c| c.transforms.depth())
    }

    // ── synchronization ───────────────────────────────────────────────────

    pub fn flush(&self, use_fence: bool) {
        self.with_core(|c| c.flush(use_fence))
    }

    pub fn finish(&self) {
        self.with_core(|c| c.finish())
    }

    pub fn set_fence(&self) {
        self.with_core(|c| c.set_fence())
    }

    pub fn delete_fence(&self) {
        self.with_core(|c| c.delete_fence())
    }

    // ── textures ──────────────────────────────────────────────────────────

    pub fn create_texture(&self, spec: &TextureSpec) -> RenderResult<TextureKey> {
        self.with_core(|c| c.create_texture(spec))
    }

    pub fn create_texture_from_image(&self, image: &DynamicImage) -> RenderResult<TextureKey> {
        self.with_core(|c| c.create_texture_from_image(image))
    }

    pub fn create_external_texture(&self, size: ISize) -> RenderResult<TextureKey> {
        self.with_core(|c| c.create_external_texture(size))
    }

    pub fn bind_external_texture(&self, key: TextureKey, handle: &ExternalHandle) -> RenderResult<()> {
        self.with_core(|c| c.bind_external_texture(key, handle))
    }

    pub fn create_helper_texture(&self) -> RenderResult<TextureKey> {
        self.with_core(|c| c.create_helper_texture())
    }

    /// False (and nothing happens) for a stale key.
    pub fn delete_texture(&self, key: TextureKey) -> bool {
        self.with_core(|c| c.delete_texture(key))
    }

    pub fn texture_info(&self, key: TextureKey) -> Option<TextureInfo> {
        self.with_core(|c| c.texture_info(key))
    }

    /// Size a texture of `size` would be allocated with.
    pub fn texture_size(&self, size: ISize) -> ISize {
        self.with_core(|c| c.texture_size(size))
    }

    pub fn texture_data_size(&self, key: TextureKey) -> Option<usize> {
        self.with_core(|c| c.texture_data_size(key))
    }

    /// Bytes needed for an image of `size` with 4-byte row alignment.
    pub fn buffer_size(size: ISize, format: PixelFormat, ty: PixelType) -> usize {
        format::buffer_size(size, format, ty)
    }

    pub fn update_texture(&self, key: TextureKey, data: &[u8]) -> RenderResult<()> {
        self.with_core(|c| c.update_texture(key, data))
    }

    pub fn update_texture_rows(&self, key: TextureKey, data: &[u8], stride: u32) -> RenderResult<()> {
        self.with_core(|c| c.update_texture_rows(key, data, stride))
    }

    /// Lets `f` write into the texture's staging buffer, then uploads it.
    ///
    /// The engine stays locked across `f`, but its state is not borrowed, so
    /// `f` may call back into the engine.
    pub fn with_texture_buffer<R>(&self, key: TextureKey, f: impl FnOnce(&mut [u8]) -> R) -> RenderResult<R> {
        let locker = self.lock();
        let mut staging = locker.with_core(|c| c.take_staging(key))?;
        let out = f(&mut staging);
        locker.with_core(|c| c.restore_staging(key, staging))?;
        Ok(out)
    }

    pub fn set_texture_filters(&self, key: TextureKey, filter: TextureFilter, wrap: TextureWrap) -> RenderResult<()> {
        self.with_core(|c| c.set_texture_filters(key, filter, wrap))
    }

    // ── framebuffers ──────────────────────────────────────────────────────

    pub fn create_framebuffer(&self, size: ISize) -> RenderResult<FramebufferKey> {
        self.with_core(|c| c.create_framebuffer(size))
    }

    pub fn framebuffer_texture(&self, fb: FramebufferKey) -> Option<TextureKey> {
        self.with_core(|c| c.framebuffer_texture(fb))
    }

    pub fn delete_framebuffer(&self, fb: FramebufferKey) -> bool {
        self.with_core(|c| c.delete_framebuffer(fb))
    }

    pub fn bind_framebuffer(&self, target: Option<FramebufferKey>) -> RenderResult<()> {
        self.with_core(|c| c.bind_framebuffer(target))
    }

    pub fn clear_framebuffer(&self) {
        self.with_core(|c| c.clear_framebuffer())
    }

    pub fn discard_framebuffer(&self, fb: FramebufferKey) {
        self.with_core(|c| c.discard_framebuffer(fb))
    }

    // ── programs ──────────────────────────────────────────────────────────

    pub fn create_shader_program(&self, vertex: &str, fragment: &str) -> RenderResult<ProgramKey> {
        self.with_core(|c| c.create_shader_program(vertex, fragment))
    }

    pub fn delete_shader_program(&self, key: ProgramKey) -> bool {
        self.with_core(|c| c.delete_shader_program(key))
    }

    pub fn enable_shader_program(&self, key: ProgramKey) -> RenderResult<()> {
        self.with_core(|c| c.enable_shader_program(key))
    }

    pub fn set_shader_program_params(&self, key: ProgramKey, slot: Uniform, value: &Mat4) -> RenderResult<()> {
        self.with_core(|c| c.set_shader_program_params(key, slot, value))
    }

    pub fn default_shader(&self, shader: DefaultShader) -> Option<ProgramKey> {
        self.with_core(|c| c.default_shader(shader))
    }

    // ── vertex buffers / caches ───────────────────────────────────────────

    pub fn create_vbo(&self, vertices: &[f32]) -> RenderResult<BufferKey> {
        self.with_core(|c| c.create_vbo(vertices))
    }

    pub fn delete_vbo(&self, key: BufferKey) -> bool {
        self.with_core(|c| c.delete_vbo(key))
    }

    pub fn vertex_cache_stats(&self) -> (usize, CacheStats) {
        self.with_core(|c| (c.vertex_cache.len(), c.vertex_cache.stats()))
    }

    pub fn vbo_cache_stats(&self) -> (usize, CacheStats) {
        self.with_core(|c| (c.vbo_cache.len(), c.vbo_cache.stats()))
    }

    pub fn expire_vertices(&self, max: usize) {
        self.with_core(|c| c.expire_vertices(max))
    }

    pub fn expire_vbos(&self, max: usize) {
        self.with_core(|c| c.expire_vbos(max))
    }

    // ── drawing ───────────────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    pub fn draw_bitmap(
        &self,
        texture: TextureKey,
        target: Option<FramebufferKey>,
        src: IRect,
        dst: IRect,
        program: Option<ProgramKey>,
        alpha: u8,
        rgb: (u8, u8, u8),
    ) -> RenderResult<()> {
        self.with_core(|c| c.draw_bitmap(texture, target, src, dst, program, alpha, rgb))
    }

    pub fn draw_bitmap_planes(
        &self,
        planes: &[TextureKey],
        target: Option<FramebufferKey>,
        src: IRect,
        dst: IRect,
        program: ProgramKey,
    ) -> RenderResult<()> {
        self.with_core(|c| c.draw_bitmap_planes(planes, target, src, dst, program))
    }

    pub fn draw_rect(
        &self,
        target: Option<FramebufferKey>,
        area: IRect,
        brush: &Brush,
        pen: &Pen,
        alpha: u8,
    ) -> RenderResult<()> {
        self.with_core(|c| c.draw_rect(target, area, brush, pen, alpha))
    }

    pub fn draw_round_rect(
        &self,
        target: Option<FramebufferKey>,
        area: IRect,
        radius: i32,
        brush: &Brush,
        pen: &Pen,
        alpha: u8,
    ) -> RenderResult<()> {
        self.with_core(|c| c.draw_round_rect(target, area, radius, brush, pen, alpha))
    }
}

impl<B: GpuBackend> Drop for RenderEngine<B> {
    fn drop(&mut self) {
        self.release();
    }
}
