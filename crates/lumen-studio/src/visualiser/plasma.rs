use lumen_render::RenderResult;
use lumen_render::coords::{IRect, ISize};
use lumen_render::gpu::{TextureFilter, TextureKey, TextureSpec};
use lumen_render::time::FrameTime;

use super::{Engine, Visualiser};

pub const NAME: &str = "Plasma";

const SIZE: ISize = ISize::new(256, 128);

/// Low-resolution plasma rendered on the CPU into the texture's staging
/// buffer every frame and stretched over the visualiser area.
#[derive(Default)]
pub struct Plasma {
    texture: Option<TextureKey>,
}

impl Visualiser for Plasma {
    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self, engine: &Engine) -> RenderResult<()> {
        let spec = TextureSpec::new(SIZE).filter(TextureFilter::Linear).with_staging();
        self.texture = Some(engine.create_texture(&spec)?);
        Ok(())
    }

    fn draw(&mut self, engine: &Engine, area: IRect, time: &FrameTime) -> RenderResult<()> {
        let Some(texture) = self.texture else {
            return Ok(());
        };
        let t = time.elapsed;
        engine.with_texture_buffer(texture, |pixels| fill(pixels, SIZE, t))?;
        engine.draw_bitmap(texture, None, IRect::from_size(SIZE), area, None, 255, (255, 255, 255))
    }

    fn release(&mut self, engine: &Engine) {
        if let Some(texture) = self.texture.take() {
            engine.delete_texture(texture);
        }
    }
}

/// Writes one plasma frame into tightly packed RGBA rows.
fn fill(pixels: &mut [u8], size: ISize, t: f32) {
    let stride = pixels.len() / size.height.max(1) as usize;
    for (y, row) in pixels.chunks_exact_mut(stride).enumerate() {
        let fy = y as f32 / size.height as f32;
        for (x, px) in row.chunks_exact_mut(4).take(size.width as usize).enumerate() {
            let fx = x as f32 / size.width as f32;
            let v = (fx * 10.0 + t).sin()
                + (fy * 8.0 - t * 1.3).sin()
                + ((fx + fy) * 6.0 + t * 0.7).sin()
                + ((fx * fx + fy * fy).sqrt() * 12.0 - t * 2.0).sin();
            let phase = v * 0.25 * std::f32::consts::PI;
            px[0] = (127.5 + 127.5 * phase.sin()) as u8;
            px[1] = (127.5 + 127.5 * (phase + 2.1).sin()) as u8;
            px[2] = (127.5 + 127.5 * (phase + 4.2).sin()) as u8;
            px[3] = 255;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_writes_opaque_pixels() {
        let size = ISize::new(8, 4);
        let mut pixels = vec![0u8; 8 * 4 * 4];
        fill(&mut pixels, size, 1.5);
        assert!(pixels.chunks_exact(4).all(|px| px[3] == 255));
        let mut other = pixels.clone();
        fill(&mut other, size, 2.5);
        assert_ne!(pixels, other);
    }
}
