//! Resource lifecycle: textures, framebuffers, programs and vertex buffers.

use image::DynamicImage;

use crate::coords::ISize;
use crate::error::{RenderError, RenderResult};
use crate::gpu::backend::{ExternalHandle, Features, GpuBackend, RawProgram, RawTexture, TextureDesc, Uniform};
use crate::gpu::format::{self, PixelFormat, PixelType, TextureFilter, TextureFormat, TextureWrap};
use crate::gpu::framebuffer::Framebuffer;
use crate::gpu::keys::{BufferKey, FramebufferKey, ProgramKey, TextureKey};
use crate::gpu::program::{DefaultShader, ShaderProgram};
use crate::gpu::texture::{Texture, TextureInfo, TextureOrigin, TextureSpec};
use crate::math::Mat4;

use super::state::RenderCore;

/// Width of the bicubic weight lookup texture.
pub const HELPER_TEXTURE_WIDTH: u32 = 256;

impl<B: GpuBackend> RenderCore<B> {
    // ── textures ──────────────────────────────────────────────────────────

    /// Allocated size for a texture of logical `size` on this backend.
    pub fn texture_size(&self, size: ISize) -> ISize {
        format::allocation_size(size, self.has(Features::NPOT_TEXTURES))
    }

    pub fn create_texture(&mut self, spec: &TextureSpec) -> RenderResult<TextureKey> {
        self.ensure_init("create_texture")?;
        let raw = self.allocate_texture(spec, false)?;
        let total = self.texture_size(spec.size);
        let key = self.textures.insert(Texture::new(Some(raw), TextureOrigin::Owned, spec, total));
        log::debug!(
            "created texture {}x{} ({:?}, allocated {}x{})",
            spec.size.width,
            spec.size.height,
            spec.resolved_format(),
            total.width,
            total.height
        );
        Ok(key)
    }

    fn allocate_texture(&mut self, spec: &TextureSpec, render_target: bool) -> RenderResult<RawTexture> {
        let max = self.caps.as_ref().map_or(0, |c| c.max_texture_size);
        let invalid = RenderError::InvalidSize {
            width: spec.size.width,
            height: spec.size.height,
            max,
        };
        if spec.size.is_empty() || spec.size.width > max || spec.size.height > max {
            log::warn!("create_texture: {invalid}");
            return Err(invalid);
        }

        let total = self.texture_size(spec.size);
        if total.width > max || total.height > max {
            log::warn!("create_texture: {invalid} once padded to {}x{}", total.width, total.height);
            return Err(invalid);
        }

        let format = spec.resolved_format();
        if format.is_16bit() && !self.has(Features::RGBA16) {
            log::warn!("create_texture: 16-bit textures unsupported");
            return Err(RenderError::CapabilityMissing("16-bit textures"));
        }
        if format.is_float() && !self.has(Features::FLOAT_TEXTURES) {
            log::warn!("create_texture: float textures unsupported");
            return Err(RenderError::CapabilityMissing("float textures"));
        }

        let desc = TextureDesc {
            size: total,
            format,
            filter: spec.filter,
            wrap: spec.wrap,
            render_target,
        };
        self.backend.create_texture(&desc).inspect_err(|e| {
            log::warn!("texture allocation of {}x{} failed: {e}", total.width, total.height);
        })
    }

    /// Creates and uploads a texture holding `image`.
    ///
    /// 16-bit images keep their depth when the backend supports it; anything
    /// the engine has no native layout for is converted to 8-bit RGBA.
    pub fn create_texture_from_image(&mut self, image: &DynamicImage) -> RenderResult<TextureKey> {
        self.ensure_init("create_texture_from_image")?;

        let size = ISize::new(image.width(), image.height());
        let deep = self.has(Features::RGBA16);

        let (pixel_format, pixel_type, bytes): (PixelFormat, PixelType, Vec<u8>) = match image {
            DynamicImage::ImageLuma8(buf) => (PixelFormat::Red, PixelType::UInt8, buf.as_raw().clone()),
            DynamicImage::ImageLumaA8(buf) => (PixelFormat::Rg, PixelType::UInt8, buf.as_raw().clone()),
            DynamicImage::ImageRgba8(buf) => (PixelFormat::Rgba, PixelType::UInt8, buf.as_raw().clone()),
            DynamicImage::ImageLuma16(buf) if deep => {
                (PixelFormat::Red, PixelType::UInt16, bytemuck::cast_slice(buf.as_raw()).to_vec())
            }
            DynamicImage::ImageLumaA16(buf) if deep => {
                (PixelFormat::Rg, PixelType::UInt16, bytemuck::cast_slice(buf.as_raw()).to_vec())
            }
            DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgba16(_) if deep => {
                let rgba = image.to_rgba16();
                (PixelFormat::Rgba, PixelType::UInt16, bytemuck::cast_slice(rgba.as_raw()).to_vec())
            }
            other => (PixelFormat::Rgba, PixelType::UInt8, other.to_rgba8().into_raw()),
        };

        let row_bytes = (size.width * pixel_format.channels() * pixel_type.bytes()) as usize;
        let stride = format::row_stride(size.width, pixel_format, pixel_type) as usize;
        let data = format::repack_rows(&bytes, row_bytes, row_bytes, size.height as usize, stride)
            .ok_or_else(|| RenderError::Backend("image buffer shorter than its dimensions".into()))?;

        let key = self.create_texture(&TextureSpec::new(size).format(pixel_format, pixel_type))?;
        if let Err(e) = self.update_texture(key, &data) {
            self.delete_texture(key);
            return Err(e);
        }
        Ok(key)
    }

    /// Texture record with no storage of its own; a decoder surface is bound
    /// to it later with `bind_external_texture`.
    pub fn create_external_texture(&mut self, size: ISize) -> RenderResult<TextureKey> {
        self.ensure_init("create_external_texture")?;
        if !self.has(Features::EXTERNAL_TEXTURE) {
            return Err(RenderError::CapabilityMissing("external textures"));
        }
        if size.is_empty() {
            let max = self.caps.as_ref().map_or(0, |c| c.max_texture_size);
            return Err(RenderError::InvalidSize { width: size.width, height: size.height, max });
        }
        let spec = TextureSpec::new(size);
        Ok(self.textures.insert(Texture::new(None, TextureOrigin::External, &spec, size)))
    }

    /// Binds a decoder surface plane to an external texture, replacing the
    /// surface bound before.
    pub fn bind_external_texture(&mut self, key: TextureKey, handle: &ExternalHandle) -> RenderResult<()> {
        self.ensure_init("bind_external_texture")?;
        let texture = self.texture(key)?;
        if texture.origin != TextureOrigin::External {
            log::error!("bind_external_texture: texture is not external");
            return Err(RenderError::StaleHandle("external texture"));
        }
        let (size, filter, wrap, old) = (texture.size, texture.filter, texture.wrap, texture.raw);

        let raw = self.backend.import_external(handle, size).inspect_err(|e| {
            log::warn!("external surface import failed: {e}");
        })?;
        self.backend.set_texture_sampling(raw, filter, wrap);
        if let Some(old) = old {
            self.backend.delete_texture(old);
        }
        if let Some(texture) = self.textures.get_mut(key) {
            texture.raw = Some(raw);
        }
        Ok(())
    }

    /// 256×1 float texture of bicubic filter weights, sampled with repeat by
    /// the bicubic scaling programs.
    pub fn create_helper_texture(&mut self) -> RenderResult<TextureKey> {
        self.ensure_init("create_helper_texture")?;
        let spec = TextureSpec::new(ISize::new(HELPER_TEXTURE_WIDTH, 1))
            .format(PixelFormat::Rgba, PixelType::Float32)
            .internal_format(TextureFormat::Rgba32F)
            .filter(TextureFilter::Linear)
            .wrap(TextureWrap::Repeat);
        let key = self.create_texture(&spec)?;

        let weights: Vec<f32> = (0..HELPER_TEXTURE_WIDTH)
            .flat_map(|i| bicubic_weights(i as f32 / HELPER_TEXTURE_WIDTH as f32))
            .collect();
        if let Err(e) = self.update_texture(key, bytemuck::cast_slice(&weights)) {
            self.delete_texture(key);
            return Err(e);
        }
        Ok(key)
    }

    /// Releases a texture, its staging buffer and its vertex buffer.
    ///
    /// Returns false for stale keys and for framebuffer colour textures,
    /// which live as long as their framebuffer.
    pub fn delete_texture(&mut self, key: TextureKey) -> bool {
        match self.textures.get(key).map(|t| t.origin) {
            None => {
                log::debug!("delete_texture: stale or unknown handle");
                false
            }
            Some(TextureOrigin::Framebuffer(_)) => {
                log::warn!("delete_texture: texture belongs to a framebuffer; delete the framebuffer");
                false
            }
            Some(_) => {
                if let Some(texture) = self.textures.remove(key) {
                    self.release_texture(texture);
                }
                true
            }
        }
    }

    fn release_texture(&mut self, texture: Texture) {
        if let Some(vbo) = texture.vbo {
            self.backend.delete_buffer(vbo);
        }
        if let Some(raw) = texture.raw {
            self.backend.delete_texture(raw);
        }
    }

    pub(crate) fn texture(&self, key: TextureKey) -> RenderResult<&Texture> {
        self.textures.get(key).ok_or_else(|| {
            log::warn!("stale or unknown texture handle");
            RenderError::StaleHandle("texture")
        })
    }

    pub fn texture_info(&self, key: TextureKey) -> Option<TextureInfo> {
        self.textures.get(key).map(Texture::info)
    }

    /// Bytes of CPU pixel data the texture expects (rows padded to 4 bytes).
    pub fn texture_data_size(&self, key: TextureKey) -> Option<usize> {
        self.textures.get(key).map(Texture::data_size)
    }

    /// Uploads a full image; `data` rows are laid out with the texture's stride.
    pub fn update_texture(&mut self, key: TextureKey, data: &[u8]) -> RenderResult<()> {
        let stride = self.texture(key)?.stride();
        self.update_texture_rows(key, data, stride)
    }

    /// Uploads a full image whose rows are `stride` bytes apart.
    pub fn update_texture_rows(&mut self, key: TextureKey, data: &[u8], stride: u32) -> RenderResult<()> {
        self.ensure_init("update_texture")?;
        let texture = self.textures.get_mut(key).ok_or(RenderError::StaleHandle("texture"))?;
        let raw = match (texture.origin, texture.raw) {
            (TextureOrigin::External, _) | (_, None) => return Err(RenderError::NoStorage),
            (_, Some(raw)) => raw,
        };

        let (size, own_stride) = (texture.size, texture.stride());
        match texture.staging.as_mut() {
            Some(staging) if stride == own_stride && data.len() >= staging.len() => {
                let len = staging.len();
                staging.copy_from_slice(&data[..len]);
                self.backend.upload_texture(raw, size, stride, staging)
            }
            _ => self.backend.upload_texture(raw, size, stride, data),
        }
        .inspect_err(|e| log::warn!("texture upload failed: {e}"))
    }

    /// Moves the staging buffer out so a producer can write into it without
    /// holding the engine state borrowed.
    pub(crate) fn take_staging(&mut self, key: TextureKey) -> RenderResult<Vec<u8>> {
        self.ensure_init("with_texture_buffer")?;
        let texture = self.textures.get_mut(key).ok_or(RenderError::StaleHandle("texture"))?;
        texture.staging.take().ok_or(RenderError::NoStorage)
    }

    /// Puts a staging buffer back and uploads it.
    pub(crate) fn restore_staging(&mut self, key: TextureKey, staging: Vec<u8>) -> RenderResult<()> {
        let texture = self.textures.get_mut(key).ok_or(RenderError::StaleHandle("texture"))?;
        let raw = texture.raw.ok_or(RenderError::NoStorage)?;
        let (size, stride) = (texture.size, texture.stride());
        let result = self.backend.upload_texture(raw, size, stride, &staging);
        texture.staging = Some(staging);
        result.inspect_err(|e| log::warn!("texture upload failed: {e}"))
    }

    pub fn set_texture_filters(
        &mut self,
        key: TextureKey,
        filter: TextureFilter,
        wrap: TextureWrap,
    ) -> RenderResult<()> {
        let texture = self.textures.get_mut(key).ok_or(RenderError::StaleHandle("texture"))?;
        if texture.filter == filter && texture.wrap == wrap {
            return Ok(());
        }
        texture.filter = filter;
        texture.wrap = wrap;
        if let Some(raw) = texture.raw {
            self.backend.set_texture_sampling(raw, filter, wrap);
        }
        Ok(())
    }

    // ── framebuffers ──────────────────────────────────────────────────────

    /// Off-screen target with an RGBA8 colour texture of at least `size`.
    pub fn create_framebuffer(&mut self, size: ISize) -> RenderResult<FramebufferKey> {
        self.ensure_init("create_framebuffer")?;
        let spec = TextureSpec::new(size);
        let color = self.allocate_texture(&spec, true)?;
        let total = self.texture_size(size);

        let raw = match self.backend.create_framebuffer(color, total) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("framebuffer creation failed: {e}");
                self.backend.delete_texture(color);
                return Err(e);
            }
        };

        let texture = self.textures.insert(Texture::new(Some(color), TextureOrigin::Owned, &spec, total));
        let fb = self.framebuffers.insert(Framebuffer { raw, size, color: texture });
        if let Some(t) = self.textures.get_mut(texture) {
            t.origin = TextureOrigin::Framebuffer(fb);
        }
        log::debug!("created framebuffer {}x{}", size.width, size.height);
        Ok(fb)
    }

    pub fn framebuffer_texture(&self, fb: FramebufferKey) -> Option<TextureKey> {
        self.framebuffers.get(fb).map(|f| f.color)
    }

    /// Deletes the framebuffer and its colour texture. Deleting the bound
    /// framebuffer rebinds the default output first.
    pub fn delete_framebuffer(&mut self, fb: FramebufferKey) -> bool {
        let Some(framebuffer) = self.framebuffers.remove(fb) else {
            log::debug!("delete_framebuffer: stale or unknown handle");
            return false;
        };
        if self.active_framebuffer == Some(fb) {
            self.backend.bind_framebuffer(None);
            self.active_framebuffer = None;
        }
        self.backend.delete_framebuffer(framebuffer.raw);
        if let Some(texture) = self.textures.remove(framebuffer.color) {
            self.release_texture(texture);
        }
        true
    }

    /// Binds `target` (`None` = default output). Rebinding the bound target
    /// is elided.
    pub fn bind_framebuffer(&mut self, target: Option<FramebufferKey>) -> RenderResult<()> {
        self.ensure_init("bind_framebuffer")?;
        if target == self.active_framebuffer {
            return Ok(());
        }
        let raw = match target {
            Some(fb) => match self.framebuffers.get(fb) {
                Some(f) => Some(f.raw),
                None => {
                    log::warn!("bind_framebuffer: stale or unknown handle");
                    return Err(RenderError::StaleHandle("framebuffer"));
                }
            },
            None => None,
        };
        self.backend.bind_framebuffer(raw);
        self.active_framebuffer = target;
        Ok(())
    }

    /// Clears the bound target to the background colour.
    pub fn clear_framebuffer(&mut self) {
        if self.ensure_init("clear_framebuffer").is_ok() {
            self.backend.clear();
        }
    }

    /// Lets the backend drop the framebuffer's contents. No-op without
    /// discard support; the framebuffer itself stays valid.
    pub fn discard_framebuffer(&mut self, fb: FramebufferKey) {
        if !self.has(Features::FB_DISCARD) {
            return;
        }
        match self.framebuffers.get(fb) {
            Some(f) => self.backend.discard_framebuffer(f.raw),
            None => log::debug!("discard_framebuffer: stale or unknown handle"),
        }
    }

    // ── programs ──────────────────────────────────────────────────────────

    pub(crate) fn compile(
        &mut self,
        vertex: &str,
        fragment: &str,
        builtin: Option<DefaultShader>,
    ) -> RenderResult<ProgramKey> {
        let raw = self.backend.compile_program(vertex, fragment)?;
        Ok(self.programs.insert(ShaderProgram { raw, builtin }))
    }

    pub fn create_shader_program(&mut self, vertex: &str, fragment: &str) -> RenderResult<ProgramKey> {
        self.ensure_init("create_shader_program")?;
        self.compile(vertex, fragment, None).inspect_err(|e| {
            log::error!("shader program failed to compile: {e}");
        })
    }

    /// Deletes a custom program. Built-in programs live until `release`.
    pub fn delete_shader_program(&mut self, key: ProgramKey) -> bool {
        match self.programs.get(key) {
            None => {
                log::debug!("delete_shader_program: stale or unknown handle");
                return false;
            }
            Some(p) if p.builtin.is_some() => {
                log::error!("delete_shader_program: built-in programs cannot be deleted");
                return false;
            }
            Some(_) => {}
        }

        let Some(program) = self.programs.remove(key) else {
            return false;
        };
        if self.active_program == Some(key) {
            self.active_program = None;
        }
        self.uniforms.retain(|(k, _), _| *k != key);
        self.backend.delete_program(program.raw);
        true
    }

    pub fn default_shader(&self, shader: DefaultShader) -> Option<ProgramKey> {
        self.defaults.get(&shader).copied()
    }

    fn program_raw(&self, key: ProgramKey) -> RenderResult<RawProgram> {
        self.programs.get(key).map(|p| p.raw).ok_or_else(|| {
            log::warn!("stale or unknown program handle");
            RenderError::StaleHandle("program")
        })
    }

    /// Makes `key` the active program; enabling the active program is elided.
    pub fn enable_shader_program(&mut self, key: ProgramKey) -> RenderResult<()> {
        self.ensure_init("enable_shader_program")?;
        if self.active_program == Some(key) {
            return Ok(());
        }
        let raw = self.program_raw(key)?;
        self.backend.use_program(raw);
        self.active_program = Some(key);
        Ok(())
    }

    /// Sets a uniform, skipping the upload when the program already holds
    /// `value` in that slot.
    pub fn set_shader_program_params(&mut self, key: ProgramKey, slot: Uniform, value: &Mat4) -> RenderResult<()> {
        let raw = self.program_raw(key)?;
        if self.uniforms.get(&(key, slot)) == Some(value) {
            return Ok(());
        }
        self.backend.set_uniform(raw, slot, value);
        self.uniforms.insert((key, slot), *value);
        Ok(())
    }

    // ── vertex buffers ────────────────────────────────────────────────────

    pub fn create_vbo(&mut self, vertices: &[f32]) -> RenderResult<BufferKey> {
        self.ensure_init("create_vbo")?;
        if !self.has(Features::BUFFER_OBJECTS) {
            return Err(RenderError::CapabilityMissing("buffer objects"));
        }
        let raw = self.backend.create_buffer(vertices).inspect_err(|e| {
            log::warn!("vertex buffer allocation failed: {e}");
        })?;
        Ok(self.buffers.insert(raw))
    }

    pub fn delete_vbo(&mut self, key: BufferKey) -> bool {
        match self.buffers.remove(key) {
            Some(raw) => {
                self.backend.delete_buffer(raw);
                true
            }
            None => {
                log::debug!("delete_vbo: stale or unknown handle");
                false
            }
        }
    }
}

/// Cubic B-spline weights for fractional position `x`, folded into two
/// linear taps: `(offset0, offset1, weight0, 0)`.
pub fn bicubic_weights(x: f32) -> [f32; 4] {
    let w0 = (((-x + 3.0) * x - 3.0) * x + 1.0) / 6.0;
    let w1 = ((3.0 * x - 6.0) * x * x + 4.0) / 6.0;
    let w2 = (((-3.0 * x + 3.0) * x + 3.0) * x + 1.0) / 6.0;
    let w3 = x * x * x / 6.0;
    [
        1.0 + x - w1 / (w0 + w1),
        1.0 - x + w3 / (w2 + w3),
        w0 + w1,
        0.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bicubic_weights_at_zero() {
        let w = bicubic_weights(0.0);
        // w0 = 1/6, w1 = 4/6, w2 = 1/6, w3 = 0
        assert!((w[0] - (1.0 - 0.8)).abs() < 1e-6);
        assert!((w[1] - 1.0).abs() < 1e-6);
        assert!((w[2] - 5.0 / 6.0).abs() < 1e-6);
        assert_eq!(w[3], 0.0);
    }

    #[test]
    fn bicubic_weights_are_finite_across_the_table() {
        for i in 0..HELPER_TEXTURE_WIDTH {
            let w = bicubic_weights(i as f32 / HELPER_TEXTURE_WIDTH as f32);
            assert!(w.iter().all(|v| v.is_finite()), "{i}");
            assert!(w[2] > 0.0 && w[2] <= 1.0);
        }
    }
}
