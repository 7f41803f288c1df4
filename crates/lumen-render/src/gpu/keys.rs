use slotmap::new_key_type;

new_key_type! {
    /// Engine handle for a texture. Stale after `delete_texture` or re-init.
    pub struct TextureKey;
    /// Engine handle for an off-screen framebuffer.
    pub struct FramebufferKey;
    /// Engine handle for a shader program.
    pub struct ProgramKey;
    /// Engine handle for a caller-created vertex buffer.
    pub struct BufferKey;
}
