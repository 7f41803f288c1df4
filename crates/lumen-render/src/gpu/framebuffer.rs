use crate::coords::ISize;

use super::backend::RawFramebuffer;
use super::keys::TextureKey;

/// Off-screen render target.
///
/// The colour texture is created together with the framebuffer and released
/// with it; `framebuffer_texture` only hands out its key.
#[derive(Debug)]
pub struct Framebuffer {
    pub(crate) raw: RawFramebuffer,
    pub(crate) size: ISize,
    pub(crate) color: TextureKey,
}
