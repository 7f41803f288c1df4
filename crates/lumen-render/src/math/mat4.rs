use core::ops::Mul;

use bytemuck::{Pod, Zeroable};

/// Column-major 4x4 matrix, laid out exactly as a WGSL `mat4x4<f32>`.
///
/// The mutating helpers post-multiply (`self = self * op`), so a sequence of
/// calls reads in the order the operations apply to a point, last call first.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const ZERO: Mat4 = Mat4 { cols: [[0.0; 4]; 4] };

    #[inline]
    pub const fn from_cols(cols: [[f32; 4]; 4]) -> Self {
        Self { cols }
    }

    /// Orthographic projection, same convention as `glOrtho`.
    pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let w = right - left;
        let h = top - bottom;
        let d = far - near;
        if w == 0.0 || h == 0.0 || d == 0.0 {
            return Self::IDENTITY;
        }
        Self::from_cols([
            [2.0 / w, 0.0, 0.0, 0.0],
            [0.0, 2.0 / h, 0.0, 0.0],
            [0.0, 0.0, -2.0 / d, 0.0],
            [-(right + left) / w, -(top + bottom) / h, -(far + near) / d, 1.0],
        ])
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        let mut t = Self::IDENTITY;
        t.cols[3][0] = x;
        t.cols[3][1] = y;
        *self = *self * t;
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        for i in 0..4 {
            self.cols[0][i] *= x;
            self.cols[1][i] *= y;
        }
    }

    /// Rotation about +Z; positive degrees turn +X towards +Y (clockwise on a
    /// top-left-origin screen).
    pub fn rotate(&mut self, degrees: f32) {
        if degrees == 0.0 {
            return;
        }
        let (s, c) = degrees.to_radians().sin_cos();
        let mut r = Self::IDENTITY;
        r.cols[0][0] = c;
        r.cols[0][1] = s;
        r.cols[1][0] = -s;
        r.cols[1][1] = c;
        *self = *self * r;
    }

    /// Shear: `x' = x + tan(hdeg) * y`, `y' = y + tan(vdeg) * x`.
    pub fn skew(&mut self, hdeg: f32, vdeg: f32) {
        if hdeg == 0.0 && vdeg == 0.0 {
            return;
        }
        let mut k = Self::IDENTITY;
        k.cols[1][0] = hdeg.to_radians().tan();
        k.cols[0][1] = vdeg.to_radians().tan();
        *self = *self * k;
    }

    /// Applies the matrix to `(x, y, 0, 1)` and returns the projected `(x, y)`.
    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        let c = &self.cols;
        let ox = c[0][0] * x + c[1][0] * y + c[3][0];
        let oy = c[0][1] * x + c[1][1] * y + c[3][1];
        let ow = c[0][3] * x + c[1][3] * y + c[3][3];
        if ow != 0.0 && ow != 1.0 {
            (ox / ow, oy / ow)
        } else {
            (ox, oy)
        }
    }

    pub fn approx_eq(&self, other: &Mat4, eps: f32) -> bool {
        self.cols
            .iter()
            .flatten()
            .zip(other.cols.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = Mat4::ZERO;
        for c in 0..4 {
            for r in 0..4 {
                out.cols[c][r] = (0..4).map(|k| self.cols[k][r] * rhs.cols[c][k]).sum();
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-4 && (a.1 - b.1).abs() < 1e-4
    }

    #[test]
    fn identity_is_neutral() {
        let mut m = Mat4::IDENTITY;
        m.translate(3.0, 4.0);
        assert_eq!(m * Mat4::IDENTITY, m);
        assert_eq!(Mat4::IDENTITY * m, m);
    }

    #[test]
    fn ortho_maps_viewport_corners_to_clip_space() {
        let m = Mat4::ortho(0.0, 1920.0, 1080.0, 0.0, 1.0, -1.0);
        assert!(close(m.map_point(0.0, 0.0), (-1.0, 1.0)));
        assert!(close(m.map_point(1920.0, 1080.0), (1.0, -1.0)));
    }

    #[test]
    fn degenerate_ortho_falls_back_to_identity() {
        assert_eq!(Mat4::ortho(0.0, 0.0, 10.0, 0.0, 1.0, -1.0), Mat4::IDENTITY);
    }

    #[test]
    fn operations_apply_last_call_first() {
        let mut m = Mat4::IDENTITY;
        m.translate(10.0, 0.0);
        m.scale(2.0, 2.0);
        // scale first, then translate
        assert!(close(m.map_point(1.0, 1.0), (12.0, 2.0)));
    }

    #[test]
    fn rotate_quarter_turn() {
        let mut m = Mat4::IDENTITY;
        m.rotate(90.0);
        assert!(close(m.map_point(1.0, 0.0), (0.0, 1.0)));
    }

    #[test]
    fn skew_shears_x_by_y() {
        let mut m = Mat4::IDENTITY;
        m.skew(45.0, 0.0);
        assert!(close(m.map_point(0.0, 2.0), (2.0, 2.0)));
    }
}
