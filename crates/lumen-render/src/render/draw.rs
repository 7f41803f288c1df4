//! Draw paths: bitmaps, plane sets, rectangles and rounded rectangles.

use std::sync::Arc;

use crate::cache::{geometry_key, GeometryKind};
use crate::coords::IRect;
use crate::error::{RenderError, RenderResult};
use crate::gpu::backend::{Features, GpuBackend, RawBuffer, RawTexture, Topology, Uniform, VertexSource};
use crate::gpu::keys::{FramebufferKey, ProgramKey, TextureKey};
use crate::gpu::program::DefaultShader;
use crate::math::Mat4;
use crate::paint::{Brush, Color, Pen};

use super::state::RenderCore;

/// Most texture planes a single draw binds (Y, U, V).
pub const MAX_PLANES: usize = 3;

/// Vertex data resolved for one draw.
enum Geometry {
    Buffer(RawBuffer),
    Cached(Arc<[f32]>),
    Uncached(Vec<f32>),
}

impl Geometry {
    fn source(&self) -> VertexSource<'_> {
        match self {
            Geometry::Buffer(b) => VertexSource::Buffer(*b),
            Geometry::Cached(v) => VertexSource::Inline(v),
            Geometry::Uncached(v) => VertexSource::Inline(v),
        }
    }
}

/// `params` matrix with `color` in column 0 and `extra` in column 1.
fn shape_params(color: Color, extra: [f32; 4]) -> Mat4 {
    let mut cols = Mat4::ZERO.cols;
    cols[0] = color.to_array();
    cols[1] = extra;
    Mat4::from_cols(cols)
}

impl<B: GpuBackend> RenderCore<B> {
    // ── geometry ──────────────────────────────────────────────────────────

    /// Cached vertex data for `(kind, rect)`: a buffer object when the backend
    /// has them, a shared CPU array otherwise.
    fn geometry(&mut self, kind: GeometryKind, rect: IRect) -> RenderResult<Geometry> {
        let Some(key) = geometry_key(kind, rect) else {
            log::trace!("uncacheable geometry {rect:?}");
            return Ok(Geometry::Uncached(kind.vertices(rect)));
        };

        if self.has(Features::BUFFER_OBJECTS) {
            let backend = &mut self.backend;
            let (buffer, evicted) = self
                .vbo_cache
                .get_or_try_create(key, || backend.create_buffer(&kind.vertices(rect)))
                .inspect_err(|e| log::warn!("vertex buffer allocation failed: {e}"))?;
            for old in evicted {
                self.backend.delete_buffer(old);
            }
            Ok(Geometry::Buffer(buffer))
        } else {
            let (vertices, _) = self
                .vertex_cache
                .get_or_try_create::<RenderError>(key, || Ok(Arc::from(kind.vertices(rect))))?;
            Ok(Geometry::Cached(vertices))
        }
    }

    /// Vertex data for a blit of `texture`, recomputed only when `src` or
    /// `dst` changed. A changed array gets a fresh buffer object.
    fn texture_geometry(&mut self, key: TextureKey, src: IRect, dst: IRect) -> RenderResult<Geometry> {
        let buffers = self.has(Features::BUFFER_OBJECTS);
        let texture = self.textures.get_mut(key).ok_or_else(|| {
            log::warn!("draw: stale or unknown texture handle");
            RenderError::StaleHandle("texture")
        })?;
        if texture.raw.is_none() {
            return Err(RenderError::NoStorage);
        }

        let changed = texture.update_vertices(src, dst);
        if !buffers {
            return Ok(Geometry::Uncached(texture.vertices.to_vec()));
        }

        if changed || texture.vbo.is_none() {
            match self.backend.create_buffer(&texture.vertices) {
                Ok(vbo) => {
                    if let Some(old) = texture.vbo.replace(vbo) {
                        self.backend.delete_buffer(old);
                    }
                }
                Err(e) => {
                    log::warn!("texture vertex buffer allocation failed, drawing inline: {e}");
                    if let Some(old) = texture.vbo.take() {
                        self.backend.delete_buffer(old);
                    }
                    return Ok(Geometry::Uncached(texture.vertices.to_vec()));
                }
            }
        }

        match texture.vbo {
            Some(vbo) => Ok(Geometry::Buffer(vbo)),
            None => Ok(Geometry::Uncached(texture.vertices.to_vec())),
        }
    }

    // ── state helpers ─────────────────────────────────────────────────────

    fn builtin(&self, shader: DefaultShader) -> RenderResult<ProgramKey> {
        self.defaults.get(&shader).copied().ok_or(RenderError::NotInitialized)
    }

    /// Binds `target` and `program` and uploads the current projection.
    fn begin_draw(&mut self, target: Option<FramebufferKey>, program: ProgramKey) -> RenderResult<()> {
        self.bind_framebuffer(target)?;
        self.enable_shader_program(program)?;
        let projection = self.combined_projection();
        self.set_shader_program_params(program, Uniform::Projection, &projection)
    }

    /// Binds `planes` to units `0..n` and unbinds units left over from the
    /// previous draw. At most `min(max_texture_units, MAX_PLANES)` planes are
    /// bound.
    fn bind_planes(&mut self, planes: &[TextureKey]) -> RenderResult<()> {
        let units = self
            .caps
            .as_ref()
            .map_or(0, |c| c.max_texture_units as usize)
            .min(MAX_PLANES);
        if planes.len() > units {
            log::debug!("binding {units} of {} planes", planes.len());
        }

        let mut raws: Vec<RawTexture> = Vec::with_capacity(units);
        for key in planes.iter().take(units) {
            let texture = self.texture(*key)?;
            raws.push(texture.raw.ok_or(RenderError::NoStorage)?);
        }

        for (unit, raw) in raws.iter().enumerate() {
            self.backend.bind_texture(unit as u32, Some(*raw));
        }
        for unit in raws.len() as u32..self.bound_units {
            self.backend.bind_texture(unit, None);
        }
        self.bound_units = raws.len() as u32;
        Ok(())
    }

    fn draw_shape(
        &mut self,
        target: Option<FramebufferKey>,
        shader: DefaultShader,
        params: Mat4,
        kind: GeometryKind,
        rect: IRect,
    ) -> RenderResult<()> {
        if rect.is_empty() {
            return Ok(());
        }
        let program = self.builtin(shader)?;
        self.begin_draw(target, program)?;
        self.set_shader_program_params(program, Uniform::Parameters, &params)?;

        let geometry = self.geometry(kind, rect)?;
        let topology = match kind {
            GeometryKind::Quad => Topology::TriangleStrip,
            GeometryKind::Outline => Topology::LineStrip,
        };
        self.backend.draw(topology, geometry.source(), kind.vertex_count());
        Ok(())
    }

    fn fill(&mut self, target: Option<FramebufferKey>, rect: IRect, color: Color) -> RenderResult<()> {
        self.draw_shape(target, DefaultShader::Simple, shape_params(color, [0.0; 4]), GeometryKind::Quad, rect)
    }

    fn horizontal_bar(&mut self, target: Option<FramebufferKey>, rect: IRect, color: Color) -> RenderResult<()> {
        let centre = rect.y as f32 + rect.height as f32 / 2.0;
        let params = shape_params(color, [centre, rect.height as f32 / 2.0, 0.0, 0.0]);
        self.draw_shape(target, DefaultShader::HorizLine, params, GeometryKind::Quad, rect)
    }

    fn vertical_bar(&mut self, target: Option<FramebufferKey>, rect: IRect, color: Color) -> RenderResult<()> {
        let centre = rect.x as f32 + rect.width as f32 / 2.0;
        let params = shape_params(color, [centre, rect.width as f32 / 2.0, 0.0, 0.0]);
        self.draw_shape(target, DefaultShader::VertLine, params, GeometryKind::Quad, rect)
    }

    // ── bitmaps ───────────────────────────────────────────────────────────

    /// Blits `src` of `texture` to `dst`, tinted by `(r, g, b)` and faded by
    /// `alpha`. `program = None` uses the default textured program.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_bitmap(
        &mut self,
        texture: TextureKey,
        target: Option<FramebufferKey>,
        src: IRect,
        dst: IRect,
        program: Option<ProgramKey>,
        alpha: u8,
        rgb: (u8, u8, u8),
    ) -> RenderResult<()> {
        self.ensure_init("draw_bitmap")?;
        let program = match program {
            Some(p) => p,
            None => self.builtin(DefaultShader::Default)?,
        };

        let geometry = self.texture_geometry(texture, src, dst)?;
        self.bind_planes(&[texture])?;
        self.begin_draw(target, program)?;

        let (r, g, b) = rgb;
        let tint = Color::from_straight(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            alpha as f32 / 255.0,
        );
        self.set_shader_program_params(program, Uniform::Parameters, &shape_params(tint, [0.0; 4]))?;

        self.backend.draw(Topology::TriangleStrip, geometry.source(), 4);
        Ok(())
    }

    /// Blits a multi-plane image (for example Y, U and V textures) with a
    /// caller-supplied program. Vertices follow the first plane; the program
    /// owns its parameter uniform.
    pub fn draw_bitmap_planes(
        &mut self,
        planes: &[TextureKey],
        target: Option<FramebufferKey>,
        src: IRect,
        dst: IRect,
        program: ProgramKey,
    ) -> RenderResult<()> {
        self.ensure_init("draw_bitmap_planes")?;
        let Some(&first) = planes.first() else {
            log::debug!("draw_bitmap_planes: no planes");
            return Ok(());
        };

        let geometry = self.texture_geometry(first, src, dst)?;
        self.bind_planes(planes)?;
        self.begin_draw(target, program)?;
        self.backend.draw(Topology::TriangleStrip, geometry.source(), 4);
        Ok(())
    }

    // ── shapes ────────────────────────────────────────────────────────────

    /// Fills `area` (inset by the pen width) and strokes its edge inside the
    /// rectangle.
    pub fn draw_rect(
        &mut self,
        target: Option<FramebufferKey>,
        area: IRect,
        brush: &Brush,
        pen: &Pen,
        alpha: u8,
    ) -> RenderResult<()> {
        self.ensure_init("draw_rect")?;
        let area = area.normalized();
        if area.is_empty() {
            return Ok(());
        }

        let stroke = pen.stroke().map(|(color, width)| {
            let max = (area.width.min(area.height) / 2).max(1);
            (color.faded(alpha), i32::try_from(width).unwrap_or(i32::MAX).min(max))
        });
        let lw = stroke.map_or(0, |(_, w)| w);

        if let Some(color) = brush.color() {
            self.fill(target, area.inset(lw), color.faded(alpha))?;
        }

        let Some((color, lw)) = stroke else {
            return Ok(());
        };

        if lw == 1 {
            let params = shape_params(color, [0.0; 4]);
            return self.draw_shape(target, DefaultShader::Simple, params, GeometryKind::Outline, area);
        }

        let IRect { x, y, width: w, height: h } = area;
        self.horizontal_bar(target, IRect::new(x, y, w, lw), color)?;
        self.horizontal_bar(target, IRect::new(x, area.bottom() - lw, w, lw), color)?;
        self.vertical_bar(target, IRect::new(x, y + lw, lw, h - 2 * lw), color)?;
        self.vertical_bar(target, IRect::new(area.right() - lw, y + lw, lw, h - 2 * lw), color)
    }

    /// Rounded rectangle: antialiased corner pieces plus straight strips.
    /// A zero radius draws a plain rectangle.
    pub fn draw_round_rect(
        &mut self,
        target: Option<FramebufferKey>,
        area: IRect,
        radius: i32,
        brush: &Brush,
        pen: &Pen,
        alpha: u8,
    ) -> RenderResult<()> {
        self.ensure_init("draw_round_rect")?;
        let area = area.normalized();
        if area.is_empty() {
            return Ok(());
        }

        let r = radius.clamp(0, area.width.min(area.height) / 2);
        if r == 0 {
            return self.draw_rect(target, area, brush, pen, alpha);
        }

        let stroke = pen
            .stroke()
            .map(|(color, width)| (color.faded(alpha), i32::try_from(width).unwrap_or(i32::MAX).min(r)));
        let lw = stroke.map_or(0, |(_, w)| w);

        if let Some(color) = brush.color() {
            self.round_fill(target, area.inset(lw), r - lw, color.faded(alpha))?;
        }
        if let Some((color, lw)) = stroke {
            self.round_stroke(target, area, r, lw, color)?;
        }
        Ok(())
    }

    fn round_fill(&mut self, target: Option<FramebufferKey>, inner: IRect, r: i32, color: Color) -> RenderResult<()> {
        if inner.is_empty() {
            return Ok(());
        }
        if r <= 0 {
            return self.fill(target, inner, color);
        }

        let IRect { x, y, width: w, height: h } = inner;
        let (right, bottom) = (inner.right(), inner.bottom());

        for (corner, cx, cy) in [
            (IRect::new(x, y, r, r), x + r, y + r),
            (IRect::new(right - r, y, r, r), right - r, y + r),
            (IRect::new(x, bottom - r, r, r), x + r, bottom - r),
            (IRect::new(right - r, bottom - r, r, r), right - r, bottom - r),
        ] {
            let params = shape_params(color, [cx as f32, cy as f32, r as f32, 0.0]);
            self.draw_shape(target, DefaultShader::Circle, params, GeometryKind::Quad, corner)?;
        }

        self.fill(target, IRect::new(x + r, y, w - 2 * r, h), color)?;
        self.fill(target, IRect::new(x, y + r, r, h - 2 * r), color)?;
        self.fill(target, IRect::new(right - r, y + r, r, h - 2 * r), color)
    }

    fn round_stroke(
        &mut self,
        target: Option<FramebufferKey>,
        area: IRect,
        r: i32,
        lw: i32,
        color: Color,
    ) -> RenderResult<()> {
        let IRect { x, y, width: w, height: h } = area;
        let (right, bottom) = (area.right(), area.bottom());
        let (outer, inner) = (r as f32, (r - lw) as f32);

        for (corner, cx, cy) in [
            (IRect::new(x, y, r, r), x + r, y + r),
            (IRect::new(right - r, y, r, r), right - r, y + r),
            (IRect::new(x, bottom - r, r, r), x + r, bottom - r),
            (IRect::new(right - r, bottom - r, r, r), right - r, bottom - r),
        ] {
            let params = shape_params(color, [cx as f32, cy as f32, outer, inner]);
            self.draw_shape(target, DefaultShader::CircleEdge, params, GeometryKind::Quad, corner)?;
        }

        self.horizontal_bar(target, IRect::new(x + r, y, w - 2 * r, lw), color)?;
        self.horizontal_bar(target, IRect::new(x + r, bottom - lw, w - 2 * r, lw), color)?;
        self.vertical_bar(target, IRect::new(x, y + r, lw, h - 2 * r), color)?;
        self.vertical_bar(target, IRect::new(right - lw, y + r, lw, h - 2 * r), color)
    }
}
