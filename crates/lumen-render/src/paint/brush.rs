use super::Color;

/// Fill style for `draw_rect` / `draw_round_rect`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub enum Brush {
    #[default]
    None,
    Solid(Color),
}

impl Brush {
    #[inline]
    pub fn solid(color: Color) -> Self {
        Brush::Solid(color)
    }

    /// The fill colour, or `None` when nothing would be drawn.
    #[inline]
    pub fn color(self) -> Option<Color> {
        match self {
            Brush::Solid(c) if !c.is_transparent() => Some(c),
            _ => None,
        }
    }
}

/// Stroke style: a solid line of `width` pixels drawn inside the shape edge.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Pen {
    pub color: Color,
    pub width: u32,
}

impl Pen {
    pub const NONE: Pen = Pen { color: Color::TRANSPARENT, width: 0 };

    #[inline]
    pub fn new(color: Color, width: u32) -> Self {
        Self { color, width }
    }

    /// The stroke, or `None` for a zero-width or transparent pen.
    #[inline]
    pub fn stroke(self) -> Option<(Color, u32)> {
        (self.width > 0 && !self.color.is_transparent()).then_some((self.color, self.width))
    }
}
