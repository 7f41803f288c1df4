//! Synthetic video source fed through the interop path.
//!
//! Produces limited-range BT.709 YV12 frames of colour bars with a moving
//! sweep, as a software decoder would, and draws them with the YV12 program.

use std::sync::Arc;

use lumen_render::RenderResult;
use lumen_render::coords::{IRect, ISize};
use lumen_render::gpu::program::VERTEX_SHADER;
use lumen_render::gpu::{ProgramKey, TextureKey, Uniform};
use lumen_render::interop::{
    CodecId, ColourMetadata, FrameData, FrameFormat, FramePlane, FrameScanType, Interop,
    InteropRegistry, VideoCodec, VideoColourSpace, VideoFrame, get_interop_type, shaders,
};

use crate::visualiser::Engine;

/// 75% colour bars: white, yellow, cyan, green, magenta, red, blue, black.
const BARS: [(f32, f32, f32); 8] = [
    (0.75, 0.75, 0.75),
    (0.75, 0.75, 0.0),
    (0.0, 0.75, 0.75),
    (0.0, 0.75, 0.0),
    (0.75, 0.0, 0.75),
    (0.75, 0.0, 0.0),
    (0.0, 0.0, 0.75),
    (0.0, 0.0, 0.0),
];

/// Limited-range BT.709 encoding of a straight RGB colour.
pub fn rgb_to_yuv709(r: f32, g: f32, b: f32) -> (u8, u8, u8) {
    let (kr, kb) = (0.2126, 0.0722);
    let y = kr * r + (1.0 - kr - kb) * g + kb * b;
    let u = (b - y) / (2.0 * (1.0 - kb));
    let v = (r - y) / (2.0 * (1.0 - kr));
    (
        (16.0 + 219.0 * y).round() as u8,
        (128.0 + 224.0 * u).round() as u8,
        (128.0 + 224.0 * v).round() as u8,
    )
}

pub struct TestCard {
    size: ISize,
    codec: CodecId,
    scan: FrameScanType,
    interop: Option<Interop>,
    program: Option<ProgramKey>,
    colourspace: VideoColourSpace,
    /// Planes of the last frame that made it to the GPU.
    planes: Vec<TextureKey>,
}

impl TestCard {
    pub fn new(size: ISize) -> Self {
        Self {
            size,
            codec: CodecId::Software(VideoCodec::H264),
            scan: FrameScanType::Progressive,
            interop: None,
            program: None,
            colourspace: VideoColourSpace::default(),
            planes: Vec::new(),
        }
    }

    /// (Re)creates the adapter and program on a freshly initialized engine.
    pub fn init(&mut self, engine: &Engine) -> RenderResult<()> {
        self.planes.clear();
        self.colourspace = VideoColourSpace::default();

        if let Some(caps) = engine.capabilities() {
            let kind = get_interop_type(self.codec, &caps);
            self.interop = InteropRegistry::default().create(engine, kind);
            if self.interop.is_none() {
                log::warn!("no video interop for {:?}; test card disabled", self.codec);
            }
        }
        self.program = Some(engine.create_shader_program(VERTEX_SHADER, shaders::YV12_FRAGMENT)?);
        Ok(())
    }

    pub fn toggle_scan(&mut self) {
        self.scan = match self.scan {
            FrameScanType::Progressive => FrameScanType::Interlaced,
            FrameScanType::Interlaced => FrameScanType::Progressive,
        };
        log::info!("test card scan: {:?}", self.scan);
    }

    /// Decodes the next frame and brings it onto the GPU. A frame the
    /// adapter rejects leaves the previous planes on screen.
    pub fn update(&mut self, engine: &Engine, t: f32) -> RenderResult<()> {
        let Some(interop) = self.interop.as_mut() else {
            return Ok(());
        };
        let frame = render_frame(self.codec, self.size, t);
        let planes = interop.acquire(engine, &mut self.colourspace, &frame, self.scan);
        if !planes.is_empty() {
            self.planes = planes;
        }

        if let Some(program) = self.program {
            if self.colourspace.is_changed() {
                engine.set_shader_program_params(program, Uniform::Parameters, &self.colourspace.matrix())?;
                self.colourspace.mark_uploaded();
            }
        }
        Ok(())
    }

    pub fn draw(&self, engine: &Engine, area: IRect) -> RenderResult<()> {
        match self.program {
            Some(program) if !self.planes.is_empty() => {
                engine.draw_bitmap_planes(&self.planes, None, IRect::from_size(self.size), area, program)
            }
            _ => Ok(()),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.size.width as f32 / self.size.height.max(1) as f32
    }

    pub fn release(&mut self, engine: &Engine) {
        if let Some(mut interop) = self.interop.take() {
            interop.release(engine);
        }
        if let Some(program) = self.program.take() {
            engine.delete_shader_program(program);
        }
        self.planes.clear();
    }
}

/// One YV12 frame: bars across the top two thirds, a grey ramp below, and a
/// white sweep line moving left to right.
fn render_frame(codec: CodecId, size: ISize, t: f32) -> VideoFrame {
    let (w, h) = (size.width as usize, size.height as usize);
    let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
    // Decoders hand out padded rows.
    let luma_pitch = w.next_multiple_of(64);
    let chroma_pitch = cw.next_multiple_of(32);

    let mut y_plane = vec![16u8; luma_pitch * h];
    let mut u_plane = vec![128u8; chroma_pitch * ch];
    let mut v_plane = vec![128u8; chroma_pitch * ch];

    let sweep = ((t * 0.25).fract() * w as f32) as usize;
    let bars_bottom = h * 2 / 3;

    for row in 0..h {
        for col in 0..w {
            let (yy, uu, vv) = if row < bars_bottom {
                let (r, g, b) = BARS[col * BARS.len() / w];
                rgb_to_yuv709(r, g, b)
            } else {
                let level = col as f32 / w as f32;
                rgb_to_yuv709(level, level, level)
            };
            y_plane[row * luma_pitch + col] = if col.abs_diff(sweep) < 2 { 235 } else { yy };
            if row % 2 == 0 && col % 2 == 0 {
                let at = (row / 2) * chroma_pitch + col / 2;
                u_plane[at] = uu;
                v_plane[at] = vv;
            }
        }
    }

    let plane = |data: Vec<u8>, pitch: usize| FramePlane { data: Arc::from(data), pitch: pitch as u32 };
    VideoFrame {
        codec,
        format: FrameFormat::Yv12,
        size,
        colour: ColourMetadata::default(),
        data: FrameData::Cpu(vec![
            plane(y_plane, luma_pitch),
            plane(u_plane, chroma_pitch),
            plane(v_plane, chroma_pitch),
        ]),
    }
}
