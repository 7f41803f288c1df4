use super::{ISize, Vec2};

/// Axis-aligned rectangle in device pixels (top-left origin).
///
/// Width and height may be negative while a caller is building geometry;
/// such rectangles are empty and never reach the GPU.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct IRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl IRect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub const fn from_size(size: ISize) -> Self {
        Self::new(0, 0, size.width as i32, size.height as i32)
    }

    #[inline]
    pub const fn left(self) -> i32 {
        self.x
    }

    #[inline]
    pub const fn top(self) -> i32 {
        self.y
    }

    /// Exclusive right edge.
    #[inline]
    pub const fn right(self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    pub const fn bottom(self) -> i32 {
        self.y + self.height
    }

    #[inline]
    pub fn size(self) -> ISize {
        ISize::new(self.width.max(0) as u32, self.height.max(0) as u32)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    #[inline]
    pub fn centre(self) -> Vec2 {
        Vec2::new(
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// Moves each edge inward by `d` pixels (outward for negative `d`).
    #[inline]
    pub fn inset(self, d: i32) -> Self {
        Self::new(self.x + d, self.y + d, self.width - 2 * d, self.height - 2 * d)
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let mut r = self;
        if r.width < 0 {
            r.x += r.width;
            r.width = -r.width;
        }
        if r.height < 0 {
            r.y += r.height;
            r.height = -r.height;
        }
        r
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, x: i32, y: i32) -> bool {
        let r = self.normalized();
        x >= r.x && y >= r.y && x < r.right() && y < r.bottom()
    }

    #[inline]
    pub fn intersect(self, other: IRect) -> Option<IRect> {
        let a = self.normalized();
        let b = other.normalized();

        let x0 = a.x.max(b.x);
        let y0 = a.y.max(b.y);
        let x1 = a.right().min(b.right());
        let y1 = a.bottom().min(b.bottom());

        if x1 <= x0 || y1 <= y0 {
            None
        } else {
            Some(IRect::new(x0, y0, x1 - x0, y1 - y0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: i32, y: i32, w: i32, h: i32) -> IRect { IRect::new(x, y, w, h) }

    // ── normalized ────────────────────────────────────────────────────────

    #[test]
    fn normalized_positive_is_identity() {
        let rect = r(1, 2, 10, 20);
        assert_eq!(rect.normalized(), rect);
    }

    #[test]
    fn normalized_negative_extent() {
        assert_eq!(r(10, 10, -4, -3).normalized(), r(6, 7, 4, 3));
    }

    // ── contains ──────────────────────────────────────────────────────────

    #[test]
    fn contains_is_half_open() {
        let rect = r(0, 0, 10, 10);
        assert!(rect.contains(0, 0));
        assert!(rect.contains(9, 9));
        assert!(!rect.contains(10, 10));
        assert!(!rect.contains(-1, 5));
    }

    // ── intersect ─────────────────────────────────────────────────────────

    #[test]
    fn intersect_overlapping() {
        assert_eq!(r(0, 0, 10, 10).intersect(r(5, 5, 10, 10)), Some(r(5, 5, 5, 5)));
    }

    #[test]
    fn intersect_touching_edge_returns_none() {
        assert!(r(0, 0, 10, 10).intersect(r(10, 0, 10, 10)).is_none());
    }

    // ── inset / size ──────────────────────────────────────────────────────

    #[test]
    fn inset_shrinks_every_edge() {
        let rect = r(10, 20, 100, 50).inset(2);
        assert_eq!(rect, r(12, 22, 96, 46));
        assert_eq!(rect.right(), 108);
        assert_eq!(rect.bottom(), 68);
    }

    #[test]
    fn empty_rect_has_zero_size() {
        let rect = r(0, 0, 4, 4).inset(3);
        assert!(rect.is_empty());
        assert_eq!(rect.size(), ISize::new(0, 0));
    }

    #[test]
    fn centre_is_fractional_for_odd_sizes() {
        assert_eq!(r(0, 0, 3, 5).centre(), Vec2::new(1.5, 2.5));
    }
}
