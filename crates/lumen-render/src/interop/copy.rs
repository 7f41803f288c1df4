use crate::coords::ISize;
use crate::error::{RenderError, RenderResult};
use crate::gpu::backend::GpuBackend;
use crate::gpu::format::{PixelType, TextureFilter, TextureWrap};
use crate::gpu::keys::TextureKey;
use crate::gpu::texture::TextureSpec;
use crate::render::RenderEngine;

use super::frame::{FrameData, FrameFormat, FrameScanType, VideoFrame};
use super::{scan_filter, VideoColourSpace};

/// Uploads CPU-visible planes into textures owned by the adapter.
///
/// Plane textures are reused frame to frame and only reallocated when the
/// frame format or size changes.
#[derive(Debug, Default)]
pub struct CopyInterop {
    textures: Vec<TextureKey>,
    geometry: Option<(FrameFormat, ISize)>,
}

impl CopyInterop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Textures returned by the last successful acquire.
    pub fn textures(&self) -> &[TextureKey] {
        &self.textures
    }

    pub(crate) fn acquire<B: GpuBackend>(
        &mut self,
        engine: &RenderEngine<B>,
        colourspace: &mut VideoColourSpace,
        frame: &VideoFrame,
        scan: FrameScanType,
    ) -> RenderResult<Vec<TextureKey>> {
        let FrameData::Cpu(planes) = &frame.data else {
            log::debug!("copy interop: frame has no CPU-visible planes");
            return Err(RenderError::NoStorage);
        };
        let layouts = frame.plane_layouts();
        if planes.len() < layouts.len() {
            log::warn!("copy interop: {} planes for {:?}, {} needed", planes.len(), frame.format, layouts.len());
            return Err(RenderError::NoStorage);
        }

        // Every plane is checked before the first upload so a bad frame
        // leaves the textures of the previous one intact.
        for (index, (plane, layout)) in planes.iter().zip(&layouts).enumerate() {
            let row = layout.size.width as usize * layout.format.channels() as usize;
            let pitch = plane.pitch as usize;
            let rows = layout.size.height as usize;
            if pitch < row {
                log::warn!("copy interop: plane {index} pitch {pitch} shorter than a row of {row} bytes");
                return Err(RenderError::NoStorage);
            }
            if rows > 0 && plane.data.len() < pitch * (rows - 1) + row {
                log::warn!("copy interop: plane {index} holds {} bytes, too short for {rows} rows", plane.data.len());
                return Err(RenderError::NoStorage);
            }
        }

        let geometry = (frame.format, frame.size);
        let live = self.textures.iter().all(|k| engine.texture_info(*k).is_some());
        if self.geometry != Some(geometry) || !live || self.textures.is_empty() {
            self.reallocate(engine, frame)?;
        }

        let filter = scan_filter(scan);
        for (key, plane) in self.textures.iter().zip(planes) {
            engine.set_texture_filters(*key, filter, TextureWrap::ClampToEdge)?;
            engine.update_texture_rows(*key, &plane.data, plane.pitch)?;
        }

        colourspace.update_from_frame(&frame.colour);
        Ok(self.textures.clone())
    }

    /// Allocates textures for the new geometry. The previous set is released
    /// only once the whole new set exists.
    fn reallocate<B: GpuBackend>(&mut self, engine: &RenderEngine<B>, frame: &VideoFrame) -> RenderResult<()> {
        let mut fresh = Vec::with_capacity(frame.format.plane_count());
        for layout in frame.plane_layouts() {
            let spec = TextureSpec::new(layout.size)
                .format(layout.format, PixelType::UInt8)
                .filter(TextureFilter::Linear);
            match engine.create_texture(&spec) {
                Ok(key) => fresh.push(key),
                Err(e) => {
                    for key in fresh {
                        engine.delete_texture(key);
                    }
                    return Err(e);
                }
            }
        }

        log::debug!(
            "copy interop: allocated {} planes for {:?} {}x{}",
            fresh.len(),
            frame.format,
            frame.size.width,
            frame.size.height
        );
        self.release(engine);
        self.textures = fresh;
        self.geometry = Some((frame.format, frame.size));
        Ok(())
    }

    pub(crate) fn release<B: GpuBackend>(&mut self, engine: &RenderEngine<B>) {
        for key in self.textures.drain(..) {
            engine.delete_texture(key);
        }
        self.geometry = None;
    }
}
