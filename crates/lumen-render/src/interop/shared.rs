use crate::cache::ResourceCache;
use crate::error::{RenderError, RenderResult};
use crate::gpu::backend::GpuBackend;
use crate::gpu::format::TextureWrap;
use crate::gpu::keys::TextureKey;
use crate::render::RenderEngine;

use super::frame::{FrameData, FrameScanType, VideoFrame};
use super::{scan_filter, VideoColourSpace};

/// Binds decoder surfaces as external textures without copying.
///
/// Decoders cycle through a small pool of surfaces, so the textures bound to
/// each surface id are kept in a bounded cache; evicted entries are deleted.
pub struct SharedInterop {
    surfaces: ResourceCache<Vec<TextureKey>>,
}

impl SharedInterop {
    pub fn new(limit: usize) -> Self {
        Self { surfaces: ResourceCache::new("shared surface", limit) }
    }

    /// Number of surfaces with resident textures.
    pub fn cached_surfaces(&self) -> usize {
        self.surfaces.len()
    }

    pub(crate) fn acquire<B: GpuBackend>(
        &mut self,
        engine: &RenderEngine<B>,
        colourspace: &mut VideoColourSpace,
        frame: &VideoFrame,
        scan: FrameScanType,
    ) -> RenderResult<Vec<TextureKey>> {
        let FrameData::Shared(surface) = &frame.data else {
            log::debug!("shared interop: frame is not backed by a shared surface");
            return Err(RenderError::NoStorage);
        };
        let layouts = frame.plane_layouts();
        if surface.planes.len() < layouts.len() {
            log::warn!("shared interop: surface {} has {} of {} planes", surface.id, surface.planes.len(), layouts.len());
            return Err(RenderError::NoStorage);
        }

        if let Some(cached) = self.surfaces.get(surface.id) {
            let valid = cached.len() == layouts.len()
                && cached
                    .iter()
                    .zip(&layouts)
                    .all(|(key, layout)| engine.texture_info(*key).is_some_and(|i| i.size == layout.size));
            if valid {
                return finish(engine, colourspace, frame, scan, cached);
            }
            // Textures died with the context, or the surface was reused at a
            // different size.
            if let Some(stale) = self.surfaces.remove(surface.id) {
                for key in stale {
                    engine.delete_texture(key);
                }
            }
        }

        let mut bound = Vec::with_capacity(layouts.len());
        for (layout, handle) in layouts.iter().zip(&surface.planes) {
            let result = engine
                .create_external_texture(layout.size)
                .and_then(|key| match engine.bind_external_texture(key, handle) {
                    Ok(()) => Ok(key),
                    Err(e) => {
                        engine.delete_texture(key);
                        Err(e)
                    }
                });
            match result {
                Ok(key) => bound.push(key),
                Err(e) => {
                    for key in bound {
                        engine.delete_texture(key);
                    }
                    return Err(e);
                }
            }
        }

        let (textures, evicted) = self
            .surfaces
            .get_or_try_create::<RenderError>(surface.id, || Ok(bound))?;
        for key in evicted.into_iter().flatten() {
            engine.delete_texture(key);
        }
        log::trace!("shared interop: bound surface {}", surface.id);
        finish(engine, colourspace, frame, scan, textures)
    }

    pub(crate) fn release<B: GpuBackend>(&mut self, engine: &RenderEngine<B>) {
        for key in self.surfaces.clear().into_iter().flatten() {
            engine.delete_texture(key);
        }
    }
}

/// Applies the scan filter to every plane and picks up the frame's colour
/// description.
fn finish<B: GpuBackend>(
    engine: &RenderEngine<B>,
    colourspace: &mut VideoColourSpace,
    frame: &VideoFrame,
    scan: FrameScanType,
    textures: Vec<TextureKey>,
) -> RenderResult<Vec<TextureKey>> {
    let filter = scan_filter(scan);
    for key in &textures {
        engine.set_texture_filters(*key, filter, TextureWrap::ClampToEdge)?;
    }
    colourspace.update_from_frame(&frame.colour);
    Ok(textures)
}
