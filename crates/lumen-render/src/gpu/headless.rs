//! Recording backend without a GPU.
//!
//! Every call is appended to a shared command log and resource lifetimes are
//! tracked, so the engine's behaviour (ordering, elision, leaks, failure
//! handling) can be observed from tests or from tools running without a
//! display. A `HeadlessProbe` keeps read access after the backend has been
//! moved into an engine.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::coords::{IRect, ISize};
use crate::error::{RenderError, RenderResult};
use crate::math::Mat4;
use crate::paint::Color;

use super::backend::{
    Capabilities, ExternalHandle, Features, FenceStatus, GpuBackend, RawBuffer, RawFence,
    RawFramebuffer, RawProgram, RawTexture, TextureDesc, Topology, Uniform, VertexSource,
};
use super::format::{TextureFilter, TextureFormat, TextureWrap};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    MakeCurrent,
    DoneCurrent,
    CreateTexture { id: RawTexture, size: ISize, format: TextureFormat },
    UploadTexture { id: RawTexture, size: ISize, bytes: usize },
    SetSampling { id: RawTexture, filter: TextureFilter, wrap: TextureWrap },
    ImportExternal { id: RawTexture, surface: u64, plane: u32 },
    DeleteTexture(RawTexture),
    CreateBuffer { id: RawBuffer, floats: usize },
    DeleteBuffer(RawBuffer),
    CreateFramebuffer { id: RawFramebuffer, color: RawTexture },
    DeleteFramebuffer(RawFramebuffer),
    BindFramebuffer(Option<RawFramebuffer>),
    DiscardFramebuffer(RawFramebuffer),
    SetClearColor(u32),
    Clear,
    CompileProgram(RawProgram),
    DeleteProgram(RawProgram),
    UseProgram(RawProgram),
    SetUniform { program: RawProgram, slot: Uniform, value: Mat4 },
    BindTexture { unit: u32, texture: Option<RawTexture> },
    SetViewport(IRect),
    SetBlend(bool),
    Draw { topology: Topology, buffer: Option<RawBuffer>, inline: Option<Vec<f32>>, count: u32 },
    Flush,
    Finish,
    CreateFence(RawFence),
    SetFence(RawFence),
    WaitFence(RawFence),
    DeleteFence(RawFence),
    DebugMarker(String),
}

impl GpuCommand {
    pub fn is_draw(&self) -> bool {
        matches!(self, GpuCommand::Draw { .. })
    }
}

/// Headless backend configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub capabilities: Capabilities,
    /// Texture allocations fail once this many bytes are live.
    pub texture_memory_budget: Option<u64>,
    /// Every program compilation fails.
    pub fail_program_compile: bool,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            capabilities: Capabilities {
                renderer: "lumen headless".to_string(),
                software: true,
                max_texture_size: 8192,
                max_texture_units: 8,
                features: Features::NPOT_TEXTURES
                    | Features::BUFFER_OBJECTS
                    | Features::FB_DISCARD
                    | Features::FENCE
                    | Features::RGBA16
                    | Features::FLOAT_TEXTURES
                    | Features::EXTERNAL_TEXTURE
                    | Features::DEBUG_MARKERS,
            },
            texture_memory_budget: None,
            fail_program_compile: false,
        }
    }
}

impl HeadlessConfig {
    pub fn with_features(mut self, features: Features) -> Self {
        self.capabilities.features = features;
        self
    }

    pub fn with_max_texture_size(mut self, max: u32) -> Self {
        self.capabilities.max_texture_size = max;
        self
    }

    pub fn with_texture_budget(mut self, bytes: u64) -> Self {
        self.texture_memory_budget = Some(bytes);
        self
    }
}

/// Number of live backend objects.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LiveResources {
    pub textures: usize,
    pub buffers: usize,
    pub framebuffers: usize,
    pub programs: usize,
    pub fences: usize,
    pub texture_bytes: u64,
}

#[derive(Debug, Default)]
struct HeadlessState {
    log: Vec<GpuCommand>,
    current: bool,
    current_calls: usize,
    textures: HashMap<RawTexture, u64>,
    buffers: HashMap<RawBuffer, usize>,
    framebuffers: HashMap<RawFramebuffer, RawTexture>,
    programs: HashSet<RawProgram>,
    fences: HashMap<RawFence, bool>,
    next_id: u32,
}

impl HeadlessState {
    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, cmd: GpuCommand) {
        self.log.push(cmd);
    }

    fn live(&self) -> LiveResources {
        LiveResources {
            textures: self.textures.len(),
            buffers: self.buffers.len(),
            framebuffers: self.framebuffers.len(),
            programs: self.programs.len(),
            fences: self.fences.len(),
            texture_bytes: self.textures.values().sum(),
        }
    }
}

/// Read-only view of a `HeadlessBackend`'s state.
#[derive(Debug, Clone)]
pub struct HeadlessProbe {
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessProbe {
    pub fn commands(&self) -> Vec<GpuCommand> {
        self.state.lock().log.clone()
    }

    /// Commands recorded since the last `clear_log`, filtered.
    pub fn commands_matching(&self, pred: impl Fn(&GpuCommand) -> bool) -> Vec<GpuCommand> {
        self.state.lock().log.iter().filter(|c| pred(c)).cloned().collect()
    }

    pub fn count(&self, pred: impl Fn(&GpuCommand) -> bool) -> usize {
        self.state.lock().log.iter().filter(|c| pred(c)).count()
    }

    pub fn clear_log(&self) {
        self.state.lock().log.clear();
    }

    pub fn is_current(&self) -> bool {
        self.state.lock().current
    }

    /// Total `make_current` calls so far.
    pub fn make_current_calls(&self) -> usize {
        self.state.lock().current_calls
    }

    pub fn live(&self) -> LiveResources {
        self.state.lock().live()
    }

    pub fn is_texture_live(&self, id: RawTexture) -> bool {
        self.state.lock().textures.contains_key(&id)
    }
}

/// `GpuBackend` that records instead of rendering.
#[derive(Debug)]
pub struct HeadlessBackend {
    config: HeadlessConfig,
    state: Arc<Mutex<HeadlessState>>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(HeadlessConfig::default())
    }
}

impl HeadlessBackend {
    pub fn new(config: HeadlessConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(HeadlessState::default())),
        }
    }

    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            state: Arc::clone(&self.state),
        }
    }

    fn record(&self, cmd: GpuCommand) {
        self.state.lock().record(cmd);
    }
}

impl GpuBackend for HeadlessBackend {
    fn capabilities(&self) -> Capabilities {
        self.config.capabilities.clone()
    }

    fn make_current(&mut self) {
        let mut s = self.state.lock();
        s.current = true;
        s.current_calls += 1;
        s.record(GpuCommand::MakeCurrent);
    }

    fn done_current(&mut self) {
        let mut s = self.state.lock();
        s.current = false;
        s.record(GpuCommand::DoneCurrent);
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> RenderResult<RawTexture> {
        let bytes = desc.size.area() * desc.format.bytes_per_pixel() as u64;
        let mut s = self.state.lock();

        if let Some(budget) = self.config.texture_memory_budget {
            let used: u64 = s.textures.values().sum();
            if used + bytes > budget {
                return Err(RenderError::Allocation(format!(
                    "texture budget exhausted ({used} + {bytes} > {budget} bytes)"
                )));
            }
        }

        let id = RawTexture(s.next());
        s.textures.insert(id, bytes);
        s.record(GpuCommand::CreateTexture { id, size: desc.size, format: desc.format });
        Ok(id)
    }

    fn upload_texture(
        &mut self,
        texture: RawTexture,
        size: ISize,
        stride: u32,
        data: &[u8],
    ) -> RenderResult<()> {
        let mut s = self.state.lock();
        if !s.textures.contains_key(&texture) {
            return Err(RenderError::Backend(format!("upload to unknown texture {texture:?}")));
        }
        let needed = stride as usize * size.height as usize;
        if data.len() < needed {
            return Err(RenderError::Backend(format!(
                "upload of {} bytes, {needed} required",
                data.len()
            )));
        }
        s.record(GpuCommand::UploadTexture { id: texture, size, bytes: data.len() });
        Ok(())
    }

    fn set_texture_sampling(&mut self, texture: RawTexture, filter: TextureFilter, wrap: TextureWrap) {
        self.record(GpuCommand::SetSampling { id: texture, filter, wrap });
    }

    fn import_external(&mut self, handle: &ExternalHandle, _size: ISize) -> RenderResult<RawTexture> {
        let ExternalHandle::Native { id: surface, plane } = *handle else {
            return Err(RenderError::CapabilityMissing("wgpu texture import on headless backend"));
        };
        let mut s = self.state.lock();
        let id = RawTexture(s.next());
        s.textures.insert(id, 0);
        s.record(GpuCommand::ImportExternal { id, surface, plane });
        Ok(id)
    }

    fn delete_texture(&mut self, texture: RawTexture) {
        let mut s = self.state.lock();
        s.textures.remove(&texture);
        s.record(GpuCommand::DeleteTexture(texture));
    }

    fn create_buffer(&mut self, vertices: &[f32]) -> RenderResult<RawBuffer> {
        let mut s = self.state.lock();
        let id = RawBuffer(s.next());
        s.buffers.insert(id, vertices.len());
        s.record(GpuCommand::CreateBuffer { id, floats: vertices.len() });
        Ok(id)
    }

    fn delete_buffer(&mut self, buffer: RawBuffer) {
        let mut s = self.state.lock();
        s.buffers.remove(&buffer);
        s.record(GpuCommand::DeleteBuffer(buffer));
    }

    fn create_framebuffer(&mut self, color: RawTexture, _size: ISize) -> RenderResult<RawFramebuffer> {
        let mut s = self.state.lock();
        let id = RawFramebuffer(s.next());
        s.framebuffers.insert(id, color);
        s.record(GpuCommand::CreateFramebuffer { id, color });
        Ok(id)
    }

    fn delete_framebuffer(&mut self, framebuffer: RawFramebuffer) {
        let mut s = self.state.lock();
        s.framebuffers.remove(&framebuffer);
        s.record(GpuCommand::DeleteFramebuffer(framebuffer));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<RawFramebuffer>) {
        self.record(GpuCommand::BindFramebuffer(framebuffer));
    }

    fn discard_framebuffer(&mut self, framebuffer: RawFramebuffer) {
        self.record(GpuCommand::DiscardFramebuffer(framebuffer));
    }

    fn set_clear_color(&mut self, color: Color) {
        self.record(GpuCommand::SetClearColor(color.to_rgba8_packed()));
    }

    fn clear(&mut self) {
        self.record(GpuCommand::Clear);
    }

    fn compile_program(&mut self, vertex: &str, fragment: &str) -> RenderResult<RawProgram> {
        if self.config.fail_program_compile {
            return Err(RenderError::Backend("program compilation disabled".into()));
        }
        if !vertex.contains("vs_main") || !fragment.contains("fs_main") {
            return Err(RenderError::Backend("missing vs_main/fs_main entry point".into()));
        }
        let mut s = self.state.lock();
        let id = RawProgram(s.next());
        s.programs.insert(id);
        s.record(GpuCommand::CompileProgram(id));
        Ok(id)
    }

    fn delete_program(&mut self, program: RawProgram) {
        let mut s = self.state.lock();
        s.programs.remove(&program);
        s.record(GpuCommand::DeleteProgram(program));
    }

    fn use_program(&mut self, program: RawProgram) {
        self.record(GpuCommand::UseProgram(program));
    }

    fn set_uniform(&mut self, program: RawProgram, slot: Uniform, value: &Mat4) {
        self.record(GpuCommand::SetUniform { program, slot, value: *value });
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<RawTexture>) {
        self.record(GpuCommand::BindTexture { unit, texture });
    }

    fn set_viewport(&mut self, rect: IRect) {
        self.record(GpuCommand::SetViewport(rect));
    }

    fn set_blend(&mut self, enabled: bool) {
        self.record(GpuCommand::SetBlend(enabled));
    }

    fn draw(&mut self, topology: Topology, vertices: VertexSource<'_>, count: u32) {
        let (buffer, inline) = match vertices {
            VertexSource::Buffer(b) => (Some(b), None),
            VertexSource::Inline(v) => (None, Some(v.to_vec())),
        };
        self.record(GpuCommand::Draw { topology, buffer, inline, count });
    }

    fn flush(&mut self) {
        self.record(GpuCommand::Flush);
    }

    fn finish(&mut self) {
        self.record(GpuCommand::Finish);
    }

    fn create_fence(&mut self) -> RenderResult<RawFence> {
        let mut s = self.state.lock();
        let id = RawFence(s.next());
        s.fences.insert(id, false);
        s.record(GpuCommand::CreateFence(id));
        Ok(id)
    }

    fn set_fence(&mut self, fence: RawFence) {
        let mut s = self.state.lock();
        if let Some(set) = s.fences.get_mut(&fence) {
            *set = true;
        }
        s.record(GpuCommand::SetFence(fence));
    }

    fn wait_fence(&mut self, fence: RawFence, _timeout: Duration) -> FenceStatus {
        self.record(GpuCommand::WaitFence(fence));
        // Recorded work completes instantly.
        FenceStatus::Signalled
    }

    fn delete_fence(&mut self, fence: RawFence) {
        let mut s = self.state.lock();
        s.fences.remove(&fence);
        s.record(GpuCommand::DeleteFence(fence));
    }

    fn debug_marker(&mut self, message: &str) {
        self.record(GpuCommand::DebugMarker(message.to_string()));
    }
}
