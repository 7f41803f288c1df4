//! wgpu implementation of [`GpuBackend`].
//!
//! Work is recorded into one pending command encoder, one render pass per
//! draw or clear, and submitted on `flush`/`finish`, before texture uploads
//! (so earlier draws see the old contents) and when a fence is inserted.
//!
//! The default output is the swapchain view of the current frame, handed in
//! with [`WgpuBackend::set_output`]. Draws to the default output without a
//! frame in flight are dropped.

mod pipeline;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use wgpu::util::DeviceExt;

use crate::coords::{IRect, ISize};
use crate::error::{RenderError, RenderResult};
use crate::math::Mat4;
use crate::paint::Color;

use super::backend::{
    Capabilities, ExternalHandle, Features, FenceStatus, GpuBackend, RawBuffer, RawFence,
    RawFramebuffer, RawProgram, RawTexture, TextureDesc, Topology, Uniform, VertexSource,
};
use super::format::{TextureFilter, TextureFormat, TextureWrap};

use pipeline::{Layouts, PipelineKey, TEXTURE_SLOTS};

/// Upper bound for `finish()`; a device that takes longer is considered hung.
const FINISH_TIMEOUT: Duration = Duration::from_secs(5);

struct TextureSlot {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampling: (TextureFilter, TextureWrap),
}

struct ProgramSlot {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    /// Indexed by [`uniform_index`].
    uniforms: [Mat4; 2],
}

struct Output {
    view: wgpu::TextureView,
    size: ISize,
}

/// Colour attachment a draw or clear lands on.
struct Target {
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
    size: ISize,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    renderer: String,
    software: bool,
    output_format: wgpu::TextureFormat,

    layouts: Layouts,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    samplers: HashMap<(TextureFilter, TextureWrap), wgpu::Sampler>,
    /// Bound in texture slots nothing else occupies.
    placeholder: wgpu::TextureView,

    textures: HashMap<RawTexture, TextureSlot>,
    buffers: HashMap<RawBuffer, wgpu::Buffer>,
    framebuffers: HashMap<RawFramebuffer, RawTexture>,
    programs: HashMap<RawProgram, ProgramSlot>,
    fences: HashMap<RawFence, Arc<AtomicBool>>,
    next_id: u32,

    output: Option<Output>,
    encoder: Option<wgpu::CommandEncoder>,
    target: Option<RawFramebuffer>,
    program: Option<RawProgram>,
    units: [Option<RawTexture>; TEXTURE_SLOTS as usize],
    viewport: IRect,
    blend: bool,
    clear_color: wgpu::Color,
}

impl WgpuBackend {
    /// `output_format` is the format of the views passed to [`set_output`](Self::set_output).
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        adapter: &wgpu::AdapterInfo,
        output_format: wgpu::TextureFormat,
    ) -> Self {
        let layouts = Layouts::new(&device);

        let placeholder = device.create_texture_with_data(
            &queue,
            &wgpu::TextureDescriptor {
                label: Some("lumen placeholder texture"),
                size: wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &[255, 255, 255, 255],
        );

        Self {
            renderer: format!("{} ({:?})", adapter.name, adapter.backend),
            software: adapter.device_type == wgpu::DeviceType::Cpu,
            output_format,
            layouts,
            pipelines: HashMap::new(),
            samplers: HashMap::new(),
            placeholder: placeholder.create_view(&wgpu::TextureViewDescriptor::default()),
            textures: HashMap::new(),
            buffers: HashMap::new(),
            framebuffers: HashMap::new(),
            programs: HashMap::new(),
            fences: HashMap::new(),
            next_id: 1,
            output: None,
            encoder: None,
            target: None,
            program: None,
            units: [None; TEXTURE_SLOTS as usize],
            viewport: IRect::default(),
            blend: true,
            clear_color: wgpu::Color::BLACK,
            device,
            queue,
        }
    }

    /// Sets the view the default target renders into, typically the
    /// swapchain texture of the frame in flight. `None` once it is presented.
    pub fn set_output(&mut self, view: Option<wgpu::TextureView>, size: ISize) {
        self.output = view.map(|view| Output { view, size });
    }

    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.output_format
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        let device = &self.device;
        self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("lumen encoder") })
        })
    }

    fn submit(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(Some(encoder.finish()));
        }
    }

    fn resolve_target(&self, framebuffer: Option<RawFramebuffer>) -> Option<Target> {
        match framebuffer {
            None => self.output.as_ref().map(|o| Target {
                view: o.view.clone(),
                format: self.output_format,
                size: o.size,
            }),
            Some(fb) => {
                let slot = self.framebuffers.get(&fb).and_then(|t| self.textures.get(t))?;
                Some(Target {
                    view: slot.view.clone(),
                    format: slot.texture.format(),
                    size: ISize::new(slot.texture.width(), slot.texture.height()),
                })
            }
        }
    }

    fn clear_pass(&mut self, view: &wgpu::TextureView, color: wgpu::Color) {
        let encoder = self.encoder();
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lumen clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations { load: wgpu::LoadOp::Clear(color), store: wgpu::StoreOp::Store },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    fn sampler(&mut self, filter: TextureFilter, wrap: TextureWrap) -> wgpu::Sampler {
        let device = &self.device;
        self.samplers
            .entry((filter, wrap))
            .or_insert_with(|| {
                let filter = match filter {
                    TextureFilter::Nearest => wgpu::FilterMode::Nearest,
                    TextureFilter::Linear => wgpu::FilterMode::Linear,
                };
                let address = match wrap {
                    TextureWrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
                    TextureWrap::Repeat => wgpu::AddressMode::Repeat,
                    TextureWrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
                };
                device.create_sampler(&wgpu::SamplerDescriptor {
                    label: Some("lumen sampler"),
                    address_mode_u: address,
                    address_mode_v: address,
                    address_mode_w: address,
                    mag_filter: filter,
                    min_filter: filter,
                    mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                    ..Default::default()
                })
            })
            .clone()
    }

    /// Submits pending work and arms `flag` to flip once the GPU is done with it.
    fn signal_on_completion(&mut self, flag: &Arc<AtomicBool>) {
        self.submit();
        flag.store(false, Ordering::Release);
        let flag = Arc::clone(flag);
        self.queue.on_submitted_work_done(move || flag.store(true, Ordering::Release));
    }

    fn wait_for(&self, flag: &AtomicBool, timeout: Duration) -> FenceStatus {
        let start = Instant::now();
        loop {
            if flag.load(Ordering::Acquire) {
                return FenceStatus::Signalled;
            }
            if start.elapsed() >= timeout {
                return FenceStatus::TimedOut;
            }
            let _ = self.device.poll(wgpu::PollType::Poll);
            std::thread::yield_now();
        }
    }

    fn texture_bind_group(&mut self) -> wgpu::BindGroup {
        let (filter, wrap) = self.units[0]
            .and_then(|t| self.textures.get(&t))
            .map_or((TextureFilter::Linear, TextureWrap::ClampToEdge), |s| s.sampling);
        let sampler = self.sampler(filter, wrap);

        let views: Vec<wgpu::TextureView> = self
            .units
            .iter()
            .map(|unit| {
                unit.and_then(|t| self.textures.get(&t))
                    .map_or_else(|| self.placeholder.clone(), |s| s.view.clone())
            })
            .collect();

        let mut entries = vec![wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::Sampler(&sampler) }];
        entries.extend(views.iter().zip(1u32..).map(|(view, binding)| wgpu::BindGroupEntry {
            binding,
            resource: wgpu::BindingResource::TextureView(view),
        }));

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lumen textures"),
            layout: &self.layouts.textures,
            entries: &entries,
        })
    }
}

fn uniform_index(slot: Uniform) -> usize {
    match slot {
        Uniform::Projection => 0,
        Uniform::Parameters => 1,
    }
}

fn wgpu_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::R8 => wgpu::TextureFormat::R8Unorm,
        TextureFormat::Rg8 => wgpu::TextureFormat::Rg8Unorm,
        TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Bgra8 => wgpu::TextureFormat::Bgra8Unorm,
        TextureFormat::R16 => wgpu::TextureFormat::R16Unorm,
        TextureFormat::Rg16 => wgpu::TextureFormat::Rg16Unorm,
        TextureFormat::Rgba16 => wgpu::TextureFormat::Rgba16Unorm,
        TextureFormat::R32F => wgpu::TextureFormat::R32Float,
        TextureFormat::Rg32F => wgpu::TextureFormat::Rg32Float,
        TextureFormat::Rgba32F => wgpu::TextureFormat::Rgba32Float,
    }
}

/// Clamps `viewport` to the target; `None` when nothing is left to draw into.
fn clamp_viewport(viewport: IRect, target: ISize) -> Option<IRect> {
    viewport.intersect(IRect::from_size(target))
}

impl GpuBackend for WgpuBackend {
    fn capabilities(&self) -> Capabilities {
        let device_features = self.device.features();
        let mut features = Features::NPOT_TEXTURES
            | Features::BUFFER_OBJECTS
            | Features::FB_DISCARD
            | Features::FENCE
            | Features::EXTERNAL_TEXTURE
            | Features::DEBUG_MARKERS;
        if device_features.contains(wgpu::Features::TEXTURE_FORMAT_16BIT_NORM) {
            features |= Features::RGBA16;
        }
        if device_features.contains(wgpu::Features::FLOAT32_FILTERABLE) {
            features |= Features::FLOAT_TEXTURES;
        }

        Capabilities {
            renderer: self.renderer.clone(),
            software: self.software,
            max_texture_size: self.device.limits().max_texture_dimension_2d,
            max_texture_units: TEXTURE_SLOTS,
            features,
        }
    }

    // A wgpu device is usable from any thread; there is no context to bind.
    fn make_current(&mut self) {}

    fn done_current(&mut self) {}

    fn create_texture(&mut self, desc: &TextureDesc) -> RenderResult<RawTexture> {
        let ISize { width, height } = desc.size;
        let max = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(RenderError::InvalidSize { width, height, max });
        }
        if desc.format.is_16bit() && !self.device.features().contains(wgpu::Features::TEXTURE_FORMAT_16BIT_NORM) {
            return Err(RenderError::CapabilityMissing("16-bit textures"));
        }

        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
        if desc.render_target {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen texture"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu_format(desc.format),
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let id = RawTexture(self.next_id());
        self.textures.insert(id, TextureSlot { texture, view, sampling: (desc.filter, desc.wrap) });
        Ok(id)
    }

    fn upload_texture(&mut self, texture: RawTexture, size: ISize, stride: u32, data: &[u8]) -> RenderResult<()> {
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }
        // Draws recorded so far must see the previous contents.
        self.submit();

        let slot = self.textures.get(&texture).ok_or(RenderError::StaleHandle("texture"))?;
        let row = size.width * slot.texture.format().block_copy_size(None).unwrap_or(4);
        let needed = stride as usize * (size.height as usize - 1) + row as usize;
        if stride < row || data.len() < needed {
            return Err(RenderError::Backend(format!(
                "upload of {}x{} needs {needed} bytes at stride {stride}, got {}",
                size.width,
                size.height,
                data.len()
            )));
        }

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &slot.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(stride),
                rows_per_image: Some(size.height),
            },
            wgpu::Extent3d { width: size.width, height: size.height, depth_or_array_layers: 1 },
        );
        Ok(())
    }

    fn set_texture_sampling(&mut self, texture: RawTexture, filter: TextureFilter, wrap: TextureWrap) {
        if let Some(slot) = self.textures.get_mut(&texture) {
            slot.sampling = (filter, wrap);
        }
    }

    fn import_external(&mut self, handle: &ExternalHandle, size: ISize) -> RenderResult<RawTexture> {
        let texture = match handle {
            ExternalHandle::Wgpu(texture) => texture,
            ExternalHandle::Native { .. } => {
                return Err(RenderError::CapabilityMissing("native surface import"));
            }
        };
        if texture.width() != size.width || texture.height() != size.height {
            return Err(RenderError::InvalidSize {
                width: texture.width(),
                height: texture.height(),
                max: self.device.limits().max_texture_dimension_2d,
            });
        }
        if !texture.usage().contains(wgpu::TextureUsages::TEXTURE_BINDING) {
            return Err(RenderError::Backend("external texture is not sampleable".into()));
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let id = RawTexture(self.next_id());
        self.textures.insert(
            id,
            TextureSlot {
                texture: texture.as_ref().clone(),
                view,
                sampling: (TextureFilter::Linear, TextureWrap::ClampToEdge),
            },
        );
        Ok(id)
    }

    fn delete_texture(&mut self, texture: RawTexture) {
        // Recorded passes keep their own references; the memory goes once
        // they have executed.
        self.textures.remove(&texture);
        for unit in &mut self.units {
            if *unit == Some(texture) {
                *unit = None;
            }
        }
    }

    fn create_buffer(&mut self, vertices: &[f32]) -> RenderResult<RawBuffer> {
        if vertices.is_empty() {
            return Err(RenderError::Allocation("empty vertex buffer".into()));
        }
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen vbo"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let id = RawBuffer(self.next_id());
        self.buffers.insert(id, buffer);
        Ok(id)
    }

    fn delete_buffer(&mut self, buffer: RawBuffer) {
        self.buffers.remove(&buffer);
    }

    fn create_framebuffer(&mut self, color: RawTexture, size: ISize) -> RenderResult<RawFramebuffer> {
        let slot = self.textures.get(&color).ok_or(RenderError::StaleHandle("texture"))?;
        if !slot.texture.usage().contains(wgpu::TextureUsages::RENDER_ATTACHMENT) {
            return Err(RenderError::Backend("colour texture cannot be rendered to".into()));
        }
        if slot.texture.width() < size.width || slot.texture.height() < size.height {
            return Err(RenderError::Backend(format!(
                "colour texture {}x{} smaller than framebuffer {}x{}",
                slot.texture.width(),
                slot.texture.height(),
                size.width,
                size.height
            )));
        }
        let id = RawFramebuffer(self.next_id());
        self.framebuffers.insert(id, color);
        Ok(id)
    }

    fn delete_framebuffer(&mut self, framebuffer: RawFramebuffer) {
        self.framebuffers.remove(&framebuffer);
        if self.target == Some(framebuffer) {
            self.target = None;
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<RawFramebuffer>) {
        self.target = framebuffer;
    }

    fn discard_framebuffer(&mut self, framebuffer: RawFramebuffer) {
        // Contents are undefined after a discard; a transparent clear is the
        // cheapest defined equivalent.
        if let Some(target) = self.resolve_target(Some(framebuffer)) {
            self.clear_pass(&target.view, wgpu::Color::TRANSPARENT);
        }
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = wgpu::Color {
            r: color.r as f64,
            g: color.g as f64,
            b: color.b as f64,
            a: color.a as f64,
        };
    }

    fn clear(&mut self) {
        match self.resolve_target(self.target) {
            Some(target) => self.clear_pass(&target.view, self.clear_color),
            None => log::trace!("clear without an output target"),
        }
    }

    fn compile_program(&mut self, vertex: &str, fragment: &str) -> RenderResult<RawProgram> {
        let mut modules = Vec::with_capacity(2);
        for (stage, source) in [("vertex", vertex), ("fragment", fragment)] {
            let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("lumen shader"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            let info = pollster::block_on(module.get_compilation_info());
            if let Some(error) = info
                .messages
                .iter()
                .find(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
            {
                return Err(RenderError::Backend(format!("{stage} stage: {}", error.message)));
            }
            modules.push(module);
        }
        let (Some(fragment), Some(vertex)) = (modules.pop(), modules.pop()) else {
            return Err(RenderError::Backend("shader stages missing".into()));
        };

        let id = RawProgram(self.next_id());
        self.programs.insert(id, ProgramSlot { vertex, fragment, uniforms: [Mat4::IDENTITY; 2] });
        Ok(id)
    }

    fn delete_program(&mut self, program: RawProgram) {
        self.programs.remove(&program);
        self.pipelines.retain(|key, _| key.program != program);
        if self.program == Some(program) {
            self.program = None;
        }
    }

    fn use_program(&mut self, program: RawProgram) {
        self.program = Some(program);
    }

    fn set_uniform(&mut self, program: RawProgram, slot: Uniform, value: &Mat4) {
        if let Some(p) = self.programs.get_mut(&program) {
            p.uniforms[uniform_index(slot)] = *value;
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<RawTexture>) {
        match self.units.get_mut(unit as usize) {
            Some(slot) => *slot = texture,
            None => log::warn!("texture unit {unit} out of range"),
        }
    }

    fn set_viewport(&mut self, rect: IRect) {
        self.viewport = rect;
    }

    fn set_blend(&mut self, enabled: bool) {
        self.blend = enabled;
    }

    fn draw(&mut self, topology: Topology, vertices: VertexSource<'_>, count: u32) {
        let Some(program) = self.program else {
            log::warn!("draw without a program");
            return;
        };
        let Some(target) = self.resolve_target(self.target) else {
            log::trace!("draw without an output target");
            return;
        };
        let Some(viewport) = clamp_viewport(self.viewport, target.size) else {
            return;
        };
        let Some((vertex, fragment, uniforms)) = self
            .programs
            .get(&program)
            .map(|p| (p.vertex.clone(), p.fragment.clone(), p.uniforms))
        else {
            log::warn!("draw with deleted program {program:?}");
            return;
        };

        let buffer = match vertices {
            VertexSource::Buffer(raw) => match self.buffers.get(&raw) {
                Some(buffer) => buffer.clone(),
                None => {
                    log::warn!("draw with deleted buffer {raw:?}");
                    return;
                }
            },
            VertexSource::Inline(data) => {
                if data.len() < count as usize * 4 {
                    log::warn!("draw of {count} vertices with {} floats", data.len());
                    return;
                }
                self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("lumen inline vertices"),
                    contents: bytemuck::cast_slice(data),
                    usage: wgpu::BufferUsages::VERTEX,
                })
            }
        };

        let key = PipelineKey { program, format: target.format, topology, blend: self.blend };
        let pipeline = self
            .pipelines
            .entry(key)
            .or_insert_with(|| pipeline::create_pipeline(&self.device, &self.layouts, &vertex, &fragment, key))
            .clone();

        let uniform_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen uniforms"),
            contents: bytemuck::cast_slice(&uniforms[..]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let uniform_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lumen uniforms"),
            layout: &self.layouts.uniforms,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: uniform_buffer.as_entire_binding() }],
        });
        let texture_group = self.texture_bind_group();

        let encoder = self.encoder();
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lumen draw"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: None,
                ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_viewport(
            viewport.x as f32,
            viewport.y as f32,
            viewport.width as f32,
            viewport.height as f32,
            0.0,
            1.0,
        );
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &uniform_group, &[]);
        pass.set_bind_group(1, &texture_group, &[]);
        pass.set_vertex_buffer(0, buffer.slice(..));
        pass.draw(0..count, 0..1);
    }

    fn flush(&mut self) {
        self.submit();
    }

    fn finish(&mut self) {
        let done = Arc::new(AtomicBool::new(false));
        self.signal_on_completion(&done);
        if self.wait_for(&done, FINISH_TIMEOUT) == FenceStatus::TimedOut {
            log::warn!("GPU did not finish within {FINISH_TIMEOUT:?}");
        }
    }

    fn create_fence(&mut self) -> RenderResult<RawFence> {
        let id = RawFence(self.next_id());
        self.fences.insert(id, Arc::new(AtomicBool::new(true)));
        Ok(id)
    }

    fn set_fence(&mut self, fence: RawFence) {
        if let Some(flag) = self.fences.get(&fence).cloned() {
            self.signal_on_completion(&flag);
        }
    }

    fn wait_fence(&mut self, fence: RawFence, timeout: Duration) -> FenceStatus {
        match self.fences.get(&fence) {
            Some(flag) => self.wait_for(flag, timeout),
            None => FenceStatus::Signalled,
        }
    }

    fn delete_fence(&mut self, fence: RawFence) {
        self.fences.remove(&fence);
    }

    fn debug_marker(&mut self, message: &str) {
        self.encoder().insert_debug_marker(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_is_clamped_to_target() {
        let target = ISize::new(100, 50);
        assert_eq!(clamp_viewport(IRect::new(-10, 0, 200, 20), target), Some(IRect::new(0, 0, 100, 20)));
        assert_eq!(clamp_viewport(IRect::new(100, 0, 10, 10), target), None);
    }

    #[test]
    fn every_texture_format_maps_to_a_filterable_wgpu_format() {
        for format in [
            TextureFormat::R8,
            TextureFormat::Rg8,
            TextureFormat::Rgba8,
            TextureFormat::Bgra8,
            TextureFormat::R16,
            TextureFormat::Rg16,
            TextureFormat::Rgba16,
            TextureFormat::R32F,
            TextureFormat::Rg32F,
            TextureFormat::Rgba32F,
        ] {
            let bytes = wgpu_format(format).block_copy_size(None);
            assert_eq!(bytes, Some(format.bytes_per_pixel()), "{format:?}");
        }
    }
}
