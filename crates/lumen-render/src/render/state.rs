use std::collections::HashMap;
use std::sync::Arc;

use slotmap::SlotMap;

use crate::cache::ResourceCache;
use crate::config::EngineConfig;
use crate::coords::{IRect, Vec2};
use crate::error::{RenderError, RenderResult};
use crate::gpu::backend::{Capabilities, Features, FenceStatus, GpuBackend, RawBuffer, RawFence, Uniform};
use crate::gpu::framebuffer::Framebuffer;
use crate::gpu::keys::{BufferKey, FramebufferKey, ProgramKey, TextureKey};
use crate::gpu::program::{DefaultShader, ShaderProgram, VERTEX_SHADER};
use crate::gpu::texture::Texture;
use crate::math::Mat4;
use crate::paint::Color;
use crate::sync::FenceSlot;
use crate::transform::{TransformStack, UiEffects};

/// Lifecycle of a `RenderCore`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initialized,
}

/// Engine state guarded by the engine lock.
///
/// Every method here assumes the caller holds the lock; `RenderEngine` is the
/// only way to reach it.
pub struct RenderCore<B: GpuBackend> {
    pub(crate) backend: B,
    pub(crate) config: EngineConfig,
    pub(crate) lock_depth: usize,

    pub(crate) state: EngineState,
    pub(crate) caps: Option<Capabilities>,

    pub(crate) textures: SlotMap<TextureKey, Texture>,
    pub(crate) framebuffers: SlotMap<FramebufferKey, Framebuffer>,
    pub(crate) programs: SlotMap<ProgramKey, ShaderProgram>,
    pub(crate) buffers: SlotMap<BufferKey, RawBuffer>,
    pub(crate) defaults: HashMap<DefaultShader, ProgramKey>,

    pub(crate) vertex_cache: ResourceCache<Arc<[f32]>>,
    pub(crate) vbo_cache: ResourceCache<RawBuffer>,

    pub(crate) transforms: TransformStack,
    pub(crate) projection: Mat4,
    pub(crate) viewport: IRect,

    pub(crate) active_program: Option<ProgramKey>,
    pub(crate) active_framebuffer: Option<FramebufferKey>,
    pub(crate) bound_units: u32,
    pub(crate) blend: Option<bool>,
    pub(crate) background: Option<u32>,
    pub(crate) uniforms: HashMap<(ProgramKey, Uniform), Mat4>,
    pub(crate) fence: FenceSlot,
}

impl<B: GpuBackend> RenderCore<B> {
    pub(crate) fn new(backend: B, config: EngineConfig) -> Self {
        let vertex_cache = ResourceCache::new("vertex", config.vertex_cache_limit);
        let vbo_cache = ResourceCache::new("vbo", config.vbo_cache_limit);
        Self {
            backend,
            config,
            lock_depth: 0,
            state: EngineState::Uninitialized,
            caps: None,
            textures: SlotMap::with_key(),
            framebuffers: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            defaults: HashMap::new(),
            vertex_cache,
            vbo_cache,
            transforms: TransformStack::new(),
            projection: Mat4::IDENTITY,
            viewport: IRect::default(),
            active_program: None,
            active_framebuffer: None,
            bound_units: 0,
            blend: None,
            background: None,
            uniforms: HashMap::new(),
            fence: FenceSlot::default(),
        }
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    pub fn is_initialized(&self) -> bool {
        self.state == EngineState::Initialized
    }

    /// Queries capabilities, compiles the built-in programs and sets up the
    /// 2D state. On an initialized engine everything is torn down first and
    /// every outstanding key becomes stale.
    pub fn init(&mut self) -> RenderResult<()> {
        if self.is_initialized() {
            log::info!("re-initializing render engine: all outstanding handles are invalidated");
            self.release();
        }

        let caps = self.backend.capabilities();
        log::info!(
            "renderer: {} (max texture {}px, {} units, features {:?})",
            caps.renderer,
            caps.max_texture_size,
            caps.max_texture_units,
            caps.features
        );
        if !caps.has(Features::FENCE) {
            log::info!("no fence support: flush falls back to an unconditional flush");
        }
        if !caps.has(Features::FB_DISCARD) {
            log::debug!("framebuffer discard unavailable");
        }

        self.caps = Some(caps);
        self.state = EngineState::Initialized;

        for shader in DefaultShader::ALL {
            match self.compile(VERTEX_SHADER, shader.fragment_source(), Some(shader)) {
                Ok(key) => {
                    self.defaults.insert(shader, key);
                }
                Err(e) => {
                    log::error!("failed to compile built-in program '{}': {e}", shader.name());
                    self.release();
                    return Err(e);
                }
            }
        }

        self.init_2d_state();
        log::debug!("render engine initialized");
        Ok(())
    }

    fn init_2d_state(&mut self) {
        self.set_blend(true);
        self.set_background(0, 0, 0, 255);
        self.backend.bind_framebuffer(None);
        self.active_framebuffer = None;
        self.backend.clear();

        if !self.viewport.is_empty() {
            self.backend.set_viewport(self.viewport);
            self.update_projection();
        }
    }

    /// Deletes every resource through the backend and returns to
    /// `Uninitialized`.
    pub fn release(&mut self) {
        if !self.is_initialized() {
            return;
        }

        for buffer in self.vbo_cache.clear() {
            self.backend.delete_buffer(buffer);
        }
        self.vertex_cache.clear();

        for (_, fb) in self.framebuffers.drain() {
            self.backend.delete_framebuffer(fb.raw);
        }
        for (_, texture) in self.textures.drain() {
            if let Some(vbo) = texture.vbo {
                self.backend.delete_buffer(vbo);
            }
            if let Some(raw) = texture.raw {
                self.backend.delete_texture(raw);
            }
        }
        for (_, program) in self.programs.drain() {
            self.backend.delete_program(program.raw);
        }
        for (_, buffer) in self.buffers.drain() {
            self.backend.delete_buffer(buffer);
        }
        if let Some(fence) = self.fence.take() {
            self.backend.delete_fence(fence);
        }

        self.reset_state();
        log::debug!("render engine released");
    }

    /// Forgets every resource without touching the backend: its objects died
    /// with the context.
    pub fn context_lost(&mut self) {
        log::warn!("graphics context lost: dropping all resources");
        self.vbo_cache.forget();
        self.vertex_cache.forget();
        self.framebuffers.clear();
        self.textures.clear();
        self.programs.clear();
        self.buffers.clear();
        let _ = self.fence.take();
        self.reset_state();
    }

    fn reset_state(&mut self) {
        self.defaults.clear();
        self.uniforms.clear();
        self.transforms.reset();
        self.active_program = None;
        self.active_framebuffer = None;
        self.bound_units = 0;
        self.blend = None;
        self.background = None;
        self.caps = None;
        self.state = EngineState::Uninitialized;
    }

    pub(crate) fn ensure_init(&self, op: &str) -> RenderResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            log::error!("{op} called before init()");
            Err(RenderError::NotInitialized)
        }
    }

    pub(crate) fn has(&self, feature: Features) -> bool {
        self.caps.as_ref().is_some_and(|c| c.has(feature))
    }

    pub fn capabilities(&self) -> Option<Capabilities> {
        self.caps.clone()
    }

    /// False for software rasterizers, which cannot keep up with video.
    pub fn is_recommended_renderer(&self) -> bool {
        match &self.caps {
            Some(caps) if caps.software => {
                log::warn!("'{}' is a software rasterizer; expect poor performance", caps.renderer);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    // ── viewport / projection ─────────────────────────────────────────────

    /// Updates the viewport; unless `viewport_only`, the base projection is
    /// recomputed to map it to clip space.
    pub fn set_viewport(&mut self, rect: IRect, viewport_only: bool) {
        if rect == self.viewport {
            return;
        }
        self.viewport = rect;
        if self.is_initialized() {
            self.backend.set_viewport(rect);
        }
        if !viewport_only {
            self.update_projection();
        }
    }

    fn update_projection(&mut self) {
        let r = self.viewport;
        self.projection = Mat4::ortho(
            r.left() as f32,
            r.right() as f32,
            r.bottom() as f32,
            r.top() as f32,
            -1.0,
            1.0,
        );
        self.upload_projection_to_active();
    }

    pub(crate) fn combined_projection(&self) -> Mat4 {
        self.projection * self.transforms.top()
    }

    fn upload_projection_to_active(&mut self) {
        if !self.is_initialized() {
            return;
        }
        if let Some(program) = self.active_program {
            let m = self.combined_projection();
            if let Err(e) = self.set_shader_program_params(program, Uniform::Projection, &m) {
                log::debug!("projection re-upload failed: {e}");
            }
        }
    }

    // ── transforms ────────────────────────────────────────────────────────

    pub fn push_transformation(&mut self, fx: &UiEffects, centre: Vec2) {
        self.transforms.push(fx, centre);
        self.upload_projection_to_active();
    }

    pub fn pop_transformation(&mut self) -> RenderResult<()> {
        if let Err(e) = self.transforms.pop() {
            log::error!("pop_transformation: {e}");
            return Err(e);
        }
        self.upload_projection_to_active();
        Ok(())
    }

    // ── engine-wide state ─────────────────────────────────────────────────

    pub fn set_blend(&mut self, enable: bool) {
        if self.ensure_init("set_blend").is_err() || self.blend == Some(enable) {
            return;
        }
        self.backend.set_blend(enable);
        self.blend = Some(enable);
    }

    pub fn set_background(&mut self, r: u8, g: u8, b: u8, a: u8) {
        if self.ensure_init("set_background").is_err() {
            return;
        }
        let color = Color::from_rgba8(r, g, b, a);
        let packed = color.to_rgba8_packed();
        if self.background == Some(packed) {
            return;
        }
        self.backend.set_clear_color(color);
        self.background = Some(packed);
    }

    pub fn log_debug_marker(&mut self, message: &str) {
        if self.config.debug_markers && self.has(Features::DEBUG_MARKERS) {
            self.backend.debug_marker(message);
        }
    }

    // ── synchronization ───────────────────────────────────────────────────

    /// Submits pending work. With `use_fence` and a fence set, waits for the
    /// fence instead (bounded by `EngineConfig::fence_timeout`).
    pub fn flush(&mut self, use_fence: bool) {
        if !self.config.flush_enabled || !self.is_initialized() {
            return;
        }

        if use_fence && self.has(Features::FENCE) {
            if let Some(fence) = self.fence.get() {
                if self.backend.wait_fence(fence, self.config.fence_timeout) == FenceStatus::TimedOut {
                    log::warn!("fence wait timed out after {:?}", self.config.fence_timeout);
                }
                return;
            }
        }

        self.backend.flush();
    }

    /// Submits outstanding work and blocks until the GPU has completed it.
    pub fn finish(&mut self) {
        if self.is_initialized() {
            self.backend.finish();
        }
    }

    /// Marks the end of a batch. Without fence support this is a no-op.
    pub fn set_fence(&mut self) {
        if !self.is_initialized() || !self.has(Features::FENCE) {
            return;
        }
        let fence: RawFence = match self.fence.get() {
            Some(f) => f,
            None => match self.backend.create_fence() {
                Ok(f) => {
                    self.fence.put(f);
                    f
                }
                Err(e) => {
                    log::warn!("failed to create fence: {e}");
                    return;
                }
            },
        };
        self.backend.set_fence(fence);
    }

    pub fn delete_fence(&mut self) {
        if let Some(fence) = self.fence.take() {
            self.backend.delete_fence(fence);
        }
    }

    // ── caches ────────────────────────────────────────────────────────────

    /// Expires the vertex-array cache down to `max` entries.
    pub fn expire_vertices(&mut self, max: usize) {
        self.vertex_cache.expire(max);
    }

    /// Expires the vertex-buffer cache down to `max` entries.
    pub fn expire_vbos(&mut self, max: usize) {
        for buffer in self.vbo_cache.expire(max) {
            self.backend.delete_buffer(buffer);
        }
    }
}
