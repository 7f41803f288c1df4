use std::sync::Arc;

use crate::coords::ISize;
use crate::gpu::backend::ExternalHandle;
use crate::gpu::format::PixelFormat;

/// Compressed stream format.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    Mpeg2,
    H264,
    Hevc,
    Vp8,
    Vp9,
    Av1,
}

/// Codec plus the decode path that produced the frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CodecId {
    /// CPU decoder; planes arrive in system memory.
    Software(VideoCodec),
    /// Hardware decoder that copies frames back to system memory.
    HardwareCopy(VideoCodec),
    /// Hardware decoder that keeps frames in shareable GPU surfaces.
    HardwareSurface(VideoCodec),
    /// Identifier this build does not recognise.
    Unknown(u32),
}

/// Pixel layout of a decoded frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FrameFormat {
    /// Planar 4:2:0: Y, then U and V at half resolution.
    Yv12,
    /// Semi-planar 4:2:0: Y, then interleaved UV at half resolution.
    Nv12,
    /// Packed 8-bit RGBA.
    Rgba,
}

/// Size and layout of one texture plane of a frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlaneLayout {
    pub size: ISize,
    pub format: PixelFormat,
}

impl FrameFormat {
    /// Texture planes needed for a `size` frame, in sampling order.
    pub fn planes(self, size: ISize) -> Vec<PlaneLayout> {
        let chroma = ISize::new(size.width.div_ceil(2), size.height.div_ceil(2));
        let luma = PlaneLayout { size, format: PixelFormat::Red };
        match self {
            FrameFormat::Yv12 => vec![
                luma,
                PlaneLayout { size: chroma, format: PixelFormat::Red },
                PlaneLayout { size: chroma, format: PixelFormat::Red },
            ],
            FrameFormat::Nv12 => vec![luma, PlaneLayout { size: chroma, format: PixelFormat::Rg }],
            FrameFormat::Rgba => vec![PlaneLayout { size, format: PixelFormat::Rgba }],
        }
    }

    pub fn plane_count(self) -> usize {
        match self {
            FrameFormat::Yv12 => 3,
            FrameFormat::Nv12 => 2,
            FrameFormat::Rgba => 1,
        }
    }

    pub fn is_yuv(self) -> bool {
        !matches!(self, FrameFormat::Rgba)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum FrameScanType {
    #[default]
    Progressive,
    Interlaced,
}

/// Matrix coefficients of the source.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ColourMatrix {
    Bt601,
    #[default]
    Bt709,
    Bt2020,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ColourRange {
    /// 16..235 luma, 16..240 chroma.
    #[default]
    Limited,
    Full,
}

/// Colour description carried by each frame.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ColourMetadata {
    pub matrix: ColourMatrix,
    pub range: ColourRange,
}

/// CPU-visible plane data; rows are `pitch` bytes apart.
#[derive(Debug, Clone)]
pub struct FramePlane {
    pub data: Arc<[u8]>,
    pub pitch: u32,
}

/// Decoder surface that can be bound without copying.
#[derive(Debug, Clone)]
pub struct SharedSurface {
    /// Stable identity of the surface within the decoder's pool.
    pub id: u64,
    /// One handle per texture plane.
    pub planes: Vec<ExternalHandle>,
}

#[derive(Debug, Clone)]
pub enum FrameData {
    Cpu(Vec<FramePlane>),
    Shared(SharedSurface),
}

/// One decoded picture handed over by the decoder.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub codec: CodecId,
    pub format: FrameFormat,
    pub size: ISize,
    pub colour: ColourMetadata,
    pub data: FrameData,
}

impl VideoFrame {
    pub fn plane_layouts(&self) -> Vec<PlaneLayout> {
        self.format.planes(self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chroma_planes_round_up() {
        let planes = FrameFormat::Yv12.planes(ISize::new(1921, 1081));
        assert_eq!(planes.len(), 3);
        assert_eq!(planes[0].size, ISize::new(1921, 1081));
        assert_eq!(planes[1].size, ISize::new(961, 541));
        assert_eq!(planes[2].size, planes[1].size);
    }

    #[test]
    fn nv12_has_interleaved_chroma() {
        let planes = FrameFormat::Nv12.planes(ISize::new(64, 32));
        assert_eq!(planes.len(), FrameFormat::Nv12.plane_count());
        assert_eq!(planes[1].format, PixelFormat::Rg);
        assert_eq!(planes[1].size, ISize::new(32, 16));
    }
}
