//! Hardware-surface interop: decoded video frames to engine textures.
//!
//! [`get_interop_type`] picks a strategy for a codec without instantiating
//! anything; [`InteropRegistry::create`] builds the adapter; each frame then
//! goes through [`Interop::acquire`], whose textures feed the ordinary
//! bitmap draw path.

mod colourspace;
mod copy;
mod frame;
mod registry;
mod shared;
pub mod shaders;

pub use colourspace::VideoColourSpace;
pub use copy::CopyInterop;
pub use frame::{
    CodecId, ColourMatrix, ColourMetadata, ColourRange, FrameData, FrameFormat, FramePlane,
    FrameScanType, PlaneLayout, SharedSurface, VideoCodec, VideoFrame,
};
pub use registry::{InteropEntry, InteropRegistry, BUILTIN_INTEROPS};
pub use shared::SharedInterop;

use crate::gpu::backend::{Capabilities, Features, GpuBackend};
use crate::gpu::format::TextureFilter;
use crate::gpu::keys::TextureKey;
use crate::render::RenderEngine;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InteropType {
    Unsupported,
    GenericCopy,
    ZeroCopyShared,
}

/// Strategy for frames from `codec` on a backend with `caps`.
pub fn get_interop_type(codec: CodecId, caps: &Capabilities) -> InteropType {
    match codec {
        CodecId::Unknown(id) => {
            log::debug!("no interop for unknown codec id {id}");
            InteropType::Unsupported
        }
        CodecId::HardwareSurface(_) if caps.has(Features::EXTERNAL_TEXTURE) => InteropType::ZeroCopyShared,
        CodecId::Software(_) | CodecId::HardwareCopy(_) | CodecId::HardwareSurface(_) => {
            InteropType::GenericCopy
        }
    }
}

/// Interlaced frames are sampled texel-exact so fields do not blend.
pub(crate) fn scan_filter(scan: FrameScanType) -> TextureFilter {
    match scan {
        FrameScanType::Interlaced => TextureFilter::Nearest,
        FrameScanType::Progressive => TextureFilter::Linear,
    }
}

/// Frame-to-texture adapter selected once per stream.
pub enum Interop {
    GenericCopy(CopyInterop),
    ZeroCopyShared(SharedInterop),
}

impl Interop {
    pub fn interop_type(&self) -> InteropType {
        match self {
            Interop::GenericCopy(_) => InteropType::GenericCopy,
            Interop::ZeroCopyShared(_) => InteropType::ZeroCopyShared,
        }
    }

    /// Textures for `frame`, one per plane in sampling order.
    ///
    /// Returns an empty list when the frame cannot be handled (wrong codec
    /// for this adapter, missing planes, allocation failure); textures handed
    /// out for earlier frames are left as they were. The engine lock is held
    /// for the whole call.
    pub fn acquire<B: GpuBackend>(
        &mut self,
        engine: &RenderEngine<B>,
        colourspace: &mut VideoColourSpace,
        frame: &VideoFrame,
        scan: FrameScanType,
    ) -> Vec<TextureKey> {
        let _lock = engine.lock();

        let Some(caps) = engine.capabilities() else {
            log::error!("interop acquire before init()");
            return Vec::new();
        };
        let wanted = get_interop_type(frame.codec, &caps);
        let compatible = match (wanted, self.interop_type()) {
            (InteropType::Unsupported, _) => false,
            // A zero-copy adapter cannot read CPU planes and vice versa.
            (a, b) => a == b,
        };
        if !compatible {
            log::debug!("{:?} interop cannot take {:?} frames", self.interop_type(), frame.codec);
            return Vec::new();
        }

        let result = match self {
            Interop::GenericCopy(copy) => copy.acquire(engine, colourspace, frame, scan),
            Interop::ZeroCopyShared(shared) => shared.acquire(engine, colourspace, frame, scan),
        };
        match result {
            Ok(textures) => textures,
            Err(e) => {
                log::warn!("interop acquire failed: {e}");
                Vec::new()
            }
        }
    }

    /// Deletes every texture the adapter owns.
    pub fn release<B: GpuBackend>(&mut self, engine: &RenderEngine<B>) {
        match self {
            Interop::GenericCopy(copy) => copy.release(engine),
            Interop::ZeroCopyShared(shared) => shared.release(engine),
        }
    }
}
