use crate::coords::{IRect, Vec2};

/// Anchor an effect pivots around, relative to the element's rectangle.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Centre {
    TopLeft,
    Top,
    TopRight,
    Left,
    #[default]
    Middle,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

/// Per-element visual effect.
///
/// `scale` multiplies both zoom axes. Angles are in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UiEffects {
    pub alpha: u8,
    pub scale: f32,
    pub hzoom: f32,
    pub vzoom: f32,
    pub angle: f32,
    pub hskew: f32,
    pub vskew: f32,
    pub centre: Centre,
}

impl Default for UiEffects {
    fn default() -> Self {
        Self {
            alpha: 255,
            scale: 1.0,
            hzoom: 1.0,
            vzoom: 1.0,
            angle: 0.0,
            hskew: 0.0,
            vskew: 0.0,
            centre: Centre::Middle,
        }
    }
}

impl UiEffects {
    pub fn zoom(hzoom: f32, vzoom: f32) -> Self {
        Self { hzoom, vzoom, ..Self::default() }
    }

    pub fn rotation(angle: f32) -> Self {
        Self { angle, ..Self::default() }
    }

    /// Effective horizontal and vertical zoom.
    pub fn zoom_factors(&self) -> (f32, f32) {
        (self.hzoom * self.scale, self.vzoom * self.scale)
    }

    /// True when the effect leaves geometry untouched (alpha aside).
    pub fn is_geometric_identity(&self) -> bool {
        let (h, v) = self.zoom_factors();
        h == 1.0 && v == 1.0 && self.angle == 0.0 && self.hskew == 0.0 && self.vskew == 0.0
    }

    /// Pivot point for `rect` shifted by `(xoff, yoff)`.
    pub fn centre_of(&self, rect: IRect, xoff: i32, yoff: i32) -> Vec2 {
        let x = (rect.x + xoff) as f32;
        let y = (rect.y + yoff) as f32;
        let w = rect.width as f32;
        let h = rect.height as f32;

        let (fx, fy) = match self.centre {
            Centre::TopLeft => (0.0, 0.0),
            Centre::Top => (0.5, 0.0),
            Centre::TopRight => (1.0, 0.0),
            Centre::Left => (0.0, 0.5),
            Centre::Middle => (0.5, 0.5),
            Centre::Right => (1.0, 0.5),
            Centre::BottomLeft => (0.0, 1.0),
            Centre::Bottom => (0.5, 1.0),
            Centre::BottomRight => (1.0, 1.0),
        };

        Vec2::new(x + w * fx, y + h * fy)
    }
}
