use crate::coords::IRect;

/// Every vertex is `[x, y, u, v]`.
pub const FLOATS_PER_VERTEX: usize = 4;

/// What a cached vertex array describes.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// Filled quad as a 4-vertex triangle strip, UV spanning `0..1`.
    Quad = 1,
    /// Closed 1-pixel outline as a 5-vertex line strip through pixel centres.
    Outline = 2,
}

impl GeometryKind {
    pub fn vertex_count(self) -> u32 {
        match self {
            GeometryKind::Quad => 4,
            GeometryKind::Outline => 5,
        }
    }

    /// Builds the vertex array for `rect` in pixel space.
    pub fn vertices(self, rect: IRect) -> Vec<f32> {
        let l = rect.left() as f32;
        let t = rect.top() as f32;
        let r = rect.right() as f32;
        let b = rect.bottom() as f32;

        match self {
            GeometryKind::Quad => vec![
                l, t, 0.0, 0.0, //
                l, b, 0.0, 1.0, //
                r, t, 1.0, 0.0, //
                r, b, 1.0, 1.0,
            ],
            GeometryKind::Outline => {
                let (l, t, r, b) = (l + 0.5, t + 0.5, r - 0.5, b - 0.5);
                vec![
                    l, t, 0.0, 0.0, //
                    r, t, 1.0, 0.0, //
                    r, b, 1.0, 1.0, //
                    l, b, 0.0, 1.0, //
                    l, t, 0.0, 0.0,
                ]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_arrays_match_counts() {
        let rect = IRect::new(0, 0, 8, 8);
        for kind in [GeometryKind::Quad, GeometryKind::Outline] {
            assert_eq!(
                kind.vertices(rect).len(),
                kind.vertex_count() as usize * FLOATS_PER_VERTEX
            );
        }
    }

    #[test]
    fn outline_is_closed() {
        let v = GeometryKind::Outline.vertices(IRect::new(2, 3, 10, 20));
        assert_eq!(v[0..4], v[16..20]);
        assert_eq!(v[0..2], [2.5, 3.5]);
    }
}
