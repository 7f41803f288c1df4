use crate::coords::ISize;

/// Channel layout of pixel data handed to the engine.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Red,
    Rg,
    #[default]
    Rgba,
    Bgra,
}

impl PixelFormat {
    pub const fn channels(self) -> u32 {
        match self {
            PixelFormat::Red => 1,
            PixelFormat::Rg => 2,
            PixelFormat::Rgba | PixelFormat::Bgra => 4,
        }
    }
}

/// Per-channel storage type.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum PixelType {
    #[default]
    UInt8,
    UInt16,
    Float32,
}

impl PixelType {
    pub const fn bytes(self) -> u32 {
        match self {
            PixelType::UInt8 => 1,
            PixelType::UInt16 => 2,
            PixelType::Float32 => 4,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

/// GPU-side storage format of a texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R8,
    Rg8,
    Rgba8,
    Bgra8,
    R16,
    Rg16,
    Rgba16,
    R32F,
    Rg32F,
    Rgba32F,
}

impl TextureFormat {
    /// Default internal format for a `(format, type)` pair.
    pub const fn infer(format: PixelFormat, ty: PixelType) -> TextureFormat {
        match (ty, format) {
            (PixelType::UInt8, PixelFormat::Red) => TextureFormat::R8,
            (PixelType::UInt8, PixelFormat::Rg) => TextureFormat::Rg8,
            (PixelType::UInt8, PixelFormat::Rgba) => TextureFormat::Rgba8,
            (PixelType::UInt8, PixelFormat::Bgra) => TextureFormat::Bgra8,
            (PixelType::UInt16, PixelFormat::Red) => TextureFormat::R16,
            (PixelType::UInt16, PixelFormat::Rg) => TextureFormat::Rg16,
            (PixelType::UInt16, _) => TextureFormat::Rgba16,
            (PixelType::Float32, PixelFormat::Red) => TextureFormat::R32F,
            (PixelType::Float32, PixelFormat::Rg) => TextureFormat::Rg32F,
            (PixelType::Float32, _) => TextureFormat::Rgba32F,
        }
    }

    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::Rg8 | TextureFormat::R16 => 2,
            TextureFormat::Rgba8 | TextureFormat::Bgra8 | TextureFormat::Rg16 | TextureFormat::R32F => 4,
            TextureFormat::Rgba16 | TextureFormat::Rg32F => 8,
            TextureFormat::Rgba32F => 16,
        }
    }

    pub const fn is_16bit(self) -> bool {
        matches!(self, TextureFormat::R16 | TextureFormat::Rg16 | TextureFormat::Rgba16)
    }

    pub const fn is_float(self) -> bool {
        matches!(self, TextureFormat::R32F | TextureFormat::Rg32F | TextureFormat::Rgba32F)
    }
}

/// Row alignment applied to pixel data (`GL_UNPACK_ALIGNMENT` equivalent).
pub const ROW_ALIGNMENT: u32 = 4;

/// Smallest edge of a texture on backends without NPOT support.
pub const MIN_POT_TEXTURE: u32 = 64;

/// Bytes per row of `width` pixels, padded to [`ROW_ALIGNMENT`].
pub const fn row_stride(width: u32, format: PixelFormat, ty: PixelType) -> u32 {
    let raw = width * format.channels() * ty.bytes();
    raw.div_ceil(ROW_ALIGNMENT) * ROW_ALIGNMENT
}

/// Size in bytes of a tightly packed (row-padded) image.
pub const fn buffer_size(size: ISize, format: PixelFormat, ty: PixelType) -> usize {
    row_stride(size.width, format, ty) as usize * size.height as usize
}

/// Allocation size for a texture with logical `size`.
///
/// Without NPOT support both edges round up to a power of two, never below
/// [`MIN_POT_TEXTURE`]. Edges with no representable power of two saturate
/// to `u32::MAX`, which no backend accepts.
pub fn allocation_size(size: ISize, npot: bool) -> ISize {
    if npot {
        return size;
    }
    let pot = |v: u32| v.max(MIN_POT_TEXTURE).checked_next_power_of_two().unwrap_or(u32::MAX);
    ISize::new(pot(size.width), pot(size.height))
}

/// Copies `height` rows of `row_bytes` from `src` (rows `src_stride` apart)
/// into a new buffer with rows `dst_stride` apart.
///
/// Returns `None` when `src` is too short for the requested rows.
pub fn repack_rows(
    src: &[u8],
    src_stride: usize,
    row_bytes: usize,
    height: usize,
    dst_stride: usize,
) -> Option<Vec<u8>> {
    if height == 0 {
        return Some(Vec::new());
    }
    if row_bytes > src_stride || row_bytes > dst_stride {
        return None;
    }
    if src.len() < src_stride * (height - 1) + row_bytes {
        return None;
    }

    let mut out = vec![0u8; dst_stride * height];
    for (row, dst) in out.chunks_exact_mut(dst_stride).enumerate() {
        let start = row * src_stride;
        dst[..row_bytes].copy_from_slice(&src[start..start + row_bytes]);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_pads_odd_rows() {
        assert_eq!(row_stride(3, PixelFormat::Red, PixelType::UInt8), 4);
        assert_eq!(row_stride(5, PixelFormat::Rg, PixelType::UInt8), 12);
        assert_eq!(row_stride(64, PixelFormat::Rgba, PixelType::UInt8), 256);
    }

    #[test]
    fn buffer_size_accounts_for_padding() {
        let size = ISize::new(3, 10);
        assert_eq!(buffer_size(size, PixelFormat::Red, PixelType::UInt8), 40);
        assert_eq!(buffer_size(size, PixelFormat::Rgba, PixelType::UInt16), 240);
    }

    #[test]
    fn npot_allocation_is_exact() {
        assert_eq!(allocation_size(ISize::new(100, 37), true), ISize::new(100, 37));
    }

    #[test]
    fn pot_allocation_rounds_up_with_minimum() {
        assert_eq!(allocation_size(ISize::new(100, 37), false), ISize::new(128, 64));
        assert_eq!(allocation_size(ISize::new(1, 1), false), ISize::new(64, 64));
        assert_eq!(allocation_size(ISize::new(1920, 1080), false), ISize::new(2048, 2048));
    }

    #[test]
    fn pot_allocation_saturates_past_the_largest_power() {
        assert_eq!(allocation_size(ISize::new(1 << 31, 8), false), ISize::new(1 << 31, 64));
        assert_eq!(allocation_size(ISize::new((1 << 31) + 1, u32::MAX), false), ISize::new(u32::MAX, u32::MAX));
    }

    #[test]
    fn allocation_covers_request() {
        for (w, h) in [(1, 1), (63, 65), (640, 480), (4000, 3)] {
            let size = ISize::new(w, h);
            assert!(allocation_size(size, false).covers(size));
            assert!(allocation_size(size, true).covers(size));
        }
    }

    #[test]
    fn infer_formats() {
        assert_eq!(TextureFormat::infer(PixelFormat::Red, PixelType::UInt8), TextureFormat::R8);
        assert_eq!(TextureFormat::infer(PixelFormat::Bgra, PixelType::UInt16), TextureFormat::Rgba16);
        assert_eq!(TextureFormat::Rgba32F.bytes_per_pixel(), 16);
    }

    #[test]
    fn repack_pads_rows_to_destination_stride() {
        let src = [1, 2, 3, 9, 4, 5, 6, 9];
        let out = repack_rows(&src, 4, 3, 2, 8).unwrap();
        assert_eq!(out, vec![1, 2, 3, 0, 0, 0, 0, 0, 4, 5, 6, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn repack_rejects_short_source() {
        assert!(repack_rows(&[0; 5], 4, 3, 2, 4).is_none());
        assert!(repack_rows(&[0; 7], 4, 3, 2, 4).is_some());
    }
}
