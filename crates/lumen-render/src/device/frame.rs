/// Swapchain image acquired for one frame.
///
/// Present or drop it promptly; holding it blocks acquisition of the next one.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

impl GpuFrame {
    /// Queues the image for display. Work that renders into it must have been
    /// submitted first.
    pub fn present(self) {
        drop(self.view);
        self.surface_texture.present();
    }
}
