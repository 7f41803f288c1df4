use core::ops::{Add, Mul, Neg, Sub};

use super::IRect;

/// Point or offset in device pixels. Used where sub-pixel precision matters:
/// transform centres and shape geometry.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2::new(0.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Top-left corner of `rect`.
    #[inline]
    pub fn origin_of(rect: IRect) -> Self {
        Self::new(rect.x as f32, rect.y as f32)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Rotates clockwise on screen (the Y axis points down).
    pub fn rotated(self, degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    #[inline]
    pub fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    #[inline]
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_is_clockwise_on_screen() {
        let v = Vec2::new(10.0, 0.0).rotated(90.0);
        assert!(v.x.abs() < 1e-4 && (v.y - 10.0).abs() < 1e-4);
        assert!((Vec2::new(3.0, 4.0).rotated(33.0).length() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn origin_and_arithmetic() {
        let o = Vec2::origin_of(IRect::new(4, -2, 10, 10));
        assert_eq!(o, Vec2::new(4.0, -2.0));
        assert_eq!(o - o, Vec2::ZERO);
        assert_eq!(-(o * 2.0), Vec2::new(-8.0, 4.0));
    }
}
