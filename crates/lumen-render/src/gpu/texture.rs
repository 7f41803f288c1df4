use crate::cache::FLOATS_PER_VERTEX;
use crate::coords::{IRect, ISize};

use super::backend::{RawBuffer, RawTexture};
use super::format::{self, PixelFormat, PixelType, TextureFilter, TextureFormat, TextureWrap};
use super::keys::FramebufferKey;

/// Four `[x, y, u, v]` vertices as a triangle strip.
pub type TextureVertices = [f32; 4 * FLOATS_PER_VERTEX];

/// Texture creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSpec {
    pub size: ISize,
    pub pixel_type: PixelType,
    pub pixel_format: PixelFormat,
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
    /// Overrides the format inferred from `pixel_format` and `pixel_type`.
    pub internal_format: Option<TextureFormat>,
    /// Keep a CPU staging buffer for `with_texture_buffer`.
    pub staging: bool,
    /// Pixel rows are stored bottom-up.
    pub flip: bool,
    /// Clamp blits to the destination size instead of scaling.
    pub crop: bool,
}

impl TextureSpec {
    pub fn new(size: ISize) -> Self {
        Self {
            size,
            pixel_type: PixelType::UInt8,
            pixel_format: PixelFormat::Rgba,
            filter: TextureFilter::Linear,
            wrap: TextureWrap::ClampToEdge,
            internal_format: None,
            staging: false,
            flip: false,
            crop: false,
        }
    }

    pub fn format(mut self, pixel_format: PixelFormat, pixel_type: PixelType) -> Self {
        self.pixel_format = pixel_format;
        self.pixel_type = pixel_type;
        self
    }

    pub fn filter(mut self, filter: TextureFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn wrap(mut self, wrap: TextureWrap) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn internal_format(mut self, internal: TextureFormat) -> Self {
        self.internal_format = Some(internal);
        self
    }

    pub fn with_staging(mut self) -> Self {
        self.staging = true;
        self
    }

    pub fn flipped(mut self) -> Self {
        self.flip = true;
        self
    }

    pub fn cropped(mut self) -> Self {
        self.crop = true;
        self
    }

    pub fn resolved_format(&self) -> TextureFormat {
        self.internal_format
            .unwrap_or_else(|| TextureFormat::infer(self.pixel_format, self.pixel_type))
    }
}

/// Where a texture's storage comes from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextureOrigin {
    /// Allocated by the engine, uploaded from CPU memory.
    Owned,
    /// Bound to a decoder surface; no CPU-visible storage.
    External,
    /// Colour attachment of a framebuffer; released with it.
    Framebuffer(FramebufferKey),
}

/// Engine-side texture record.
#[derive(Debug)]
pub struct Texture {
    /// `None` for an external texture with no surface bound yet.
    pub(crate) raw: Option<RawTexture>,
    pub(crate) origin: TextureOrigin,
    pub(crate) pixel_format: PixelFormat,
    pub(crate) pixel_type: PixelType,
    pub(crate) internal_format: TextureFormat,
    pub(crate) filter: TextureFilter,
    pub(crate) wrap: TextureWrap,
    pub(crate) size: ISize,
    pub(crate) total_size: ISize,
    pub(crate) flip: bool,
    pub(crate) crop: bool,
    pub(crate) source: IRect,
    pub(crate) destination: IRect,
    pub(crate) vertices: TextureVertices,
    pub(crate) vertices_valid: bool,
    pub(crate) vbo: Option<RawBuffer>,
    pub(crate) staging: Option<Vec<u8>>,
}

impl Texture {
    pub(crate) fn new(
        raw: Option<RawTexture>,
        origin: TextureOrigin,
        spec: &TextureSpec,
        total_size: ISize,
    ) -> Self {
        let staging = spec.staging.then(|| vec![0u8; spec.data_size()]);
        Self {
            raw,
            origin,
            pixel_format: spec.pixel_format,
            pixel_type: spec.pixel_type,
            internal_format: spec.resolved_format(),
            filter: spec.filter,
            wrap: spec.wrap,
            size: spec.size,
            total_size,
            flip: spec.flip,
            crop: spec.crop,
            source: IRect::default(),
            destination: IRect::default(),
            vertices: [0.0; 16],
            vertices_valid: false,
            vbo: None,
            staging,
        }
    }

    /// Bytes per row of CPU pixel data.
    pub(crate) fn stride(&self) -> u32 {
        format::row_stride(self.size.width, self.pixel_format, self.pixel_type)
    }

    pub(crate) fn data_size(&self) -> usize {
        format::buffer_size(self.size, self.pixel_format, self.pixel_type)
    }

    /// Recomputes the vertex array for `(source, destination)`.
    ///
    /// Returns false when both rectangles are unchanged and the cached array
    /// is still valid.
    pub(crate) fn update_vertices(&mut self, source: IRect, destination: IRect) -> bool {
        if self.vertices_valid && source == self.source && destination == self.destination {
            return false;
        }

        self.source = source;
        self.destination = destination;
        self.vertices = compute_vertices(
            source,
            destination,
            self.total_size,
            self.flip,
            self.crop,
        );
        self.vertices_valid = true;
        true
    }

    pub(crate) fn info(&self) -> TextureInfo {
        TextureInfo {
            size: self.size,
            total_size: self.total_size,
            pixel_format: self.pixel_format,
            pixel_type: self.pixel_type,
            internal_format: self.internal_format,
            filter: self.filter,
            wrap: self.wrap,
            flip: self.flip,
            origin: self.origin,
            data_size: self.data_size(),
            has_staging: self.staging.is_some(),
        }
    }
}

impl TextureSpec {
    fn data_size(&self) -> usize {
        format::buffer_size(self.size, self.pixel_format, self.pixel_type)
    }
}

/// Snapshot of a texture's attributes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub size: ISize,
    pub total_size: ISize,
    pub pixel_format: PixelFormat,
    pub pixel_type: PixelType,
    pub internal_format: TextureFormat,
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
    pub flip: bool,
    pub origin: TextureOrigin,
    pub data_size: usize,
    pub has_staging: bool,
}

/// Vertex array for a blit of `source` (texels) to `destination` (pixels).
///
/// UVs are normalized against the allocated size so padding never shows.
/// With `crop`, the source extent is clamped to the destination size instead
/// of being scaled into it.
pub(crate) fn compute_vertices(
    source: IRect,
    destination: IRect,
    total: ISize,
    flip: bool,
    crop: bool,
) -> TextureVertices {
    let mut width = source.width;
    let mut height = source.height;
    if crop {
        width = width.min(destination.width);
        height = height.min(destination.height);
    }

    let tw = total.width.max(1) as f32;
    let th = total.height.max(1) as f32;
    let u0 = source.x as f32 / tw;
    let u1 = (source.x + width) as f32 / tw;
    let (mut v0, mut v1) = (source.y as f32 / th, (source.y + height) as f32 / th);
    if flip {
        std::mem::swap(&mut v0, &mut v1);
    }

    let l = destination.left() as f32;
    let t = destination.top() as f32;
    let r = destination.right() as f32;
    let b = destination.bottom() as f32;

    [
        l, t, u0, v0, //
        l, b, u0, v1, //
        r, t, u1, v0, //
        r, b, u1, v1,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertices_normalize_against_allocation() {
        let v = compute_vertices(
            IRect::new(0, 0, 32, 32),
            IRect::new(10, 20, 64, 64),
            ISize::new(64, 64),
            false,
            false,
        );
        assert_eq!(&v[0..4], &[10.0, 20.0, 0.0, 0.0]);
        assert_eq!(&v[12..16], &[74.0, 84.0, 0.5, 0.5]);
    }

    #[test]
    fn flip_swaps_vertical_texcoords() {
        let v = compute_vertices(
            IRect::new(0, 0, 8, 8),
            IRect::new(0, 0, 8, 8),
            ISize::new(8, 8),
            true,
            false,
        );
        assert_eq!(v[3], 1.0);
        assert_eq!(v[7], 0.0);
    }

    #[test]
    fn crop_clamps_source_to_destination() {
        let v = compute_vertices(
            IRect::new(0, 0, 100, 100),
            IRect::new(0, 0, 50, 25),
            ISize::new(100, 100),
            false,
            true,
        );
        assert_eq!(v[14], 0.5);
        assert_eq!(v[15], 0.25);
    }

    #[test]
    fn update_vertices_reports_changes_only() {
        let spec = TextureSpec::new(ISize::new(16, 16));
        let mut tex = Texture::new(Some(RawTexture(1)), TextureOrigin::Owned, &spec, spec.size);
        let src = IRect::new(0, 0, 16, 16);
        assert!(tex.update_vertices(src, src));
        assert!(!tex.update_vertices(src, src));
        assert!(tex.update_vertices(src, IRect::new(1, 1, 16, 16)));
    }

    #[test]
    fn staging_buffer_is_row_padded() {
        let spec = TextureSpec::new(ISize::new(3, 2))
            .format(PixelFormat::Red, PixelType::UInt8)
            .with_staging();
        let tex = Texture::new(Some(RawTexture(1)), TextureOrigin::Owned, &spec, spec.size);
        assert_eq!(tex.staging.as_ref().map(Vec::len), Some(8));
        assert_eq!(tex.stride(), 4);
    }
}
