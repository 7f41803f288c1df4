//! Fragment programs for YUV frames.
//!
//! Both pair with the engine's shared vertex stage
//! ([`VERTEX_SHADER`](crate::gpu::program::VERTEX_SHADER)) and expect the
//! colour matrix from [`VideoColourSpace::matrix`](super::VideoColourSpace::matrix)
//! in the parameters uniform.

use super::frame::FrameFormat;

pub const YV12_FRAGMENT: &str = include_str!("shaders/yv12.wgsl");
pub const NV12_FRAGMENT: &str = include_str!("shaders/nv12.wgsl");

/// Fragment source for frames in `format`; `None` for RGBA, which the
/// default textured program draws directly.
pub fn fragment_for(format: FrameFormat) -> Option<&'static str> {
    match format {
        FrameFormat::Yv12 => Some(YV12_FRAGMENT),
        FrameFormat::Nv12 => Some(NV12_FRAGMENT),
        FrameFormat::Rgba => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yuv_programs_sample_every_plane() {
        for format in [FrameFormat::Yv12, FrameFormat::Nv12] {
            let src = fragment_for(format).unwrap();
            assert!(src.contains("fn fs_main"));
            for plane in 0..format.plane_count() {
                assert!(src.contains(&format!("tex{plane}")), "{format:?} plane {plane}");
            }
        }
        assert!(fragment_for(FrameFormat::Rgba).is_none());
    }
}
