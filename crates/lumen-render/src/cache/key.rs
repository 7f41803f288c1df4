use crate::coords::IRect;

use super::GeometryKind;

/// Bits per packed rectangle field.
pub const FIELD_BITS: u32 = 12;

/// Largest value a packed field can hold.
pub const FIELD_MAX: i32 = (1 << FIELD_BITS) - 1;

/// The geometry kind sits above the four rectangle fields.
pub const KIND_SHIFT: u32 = FIELD_BITS * 4;

/// Packs `(kind, rect)` into a cache key.
///
/// Layout, low to high: `x`, `y`, `width`, `height` (12 bits each), then kind.
/// Returns `None` when a field does not fit; such geometry is built uncached
/// rather than aliasing another rectangle's entry.
pub fn geometry_key(kind: GeometryKind, rect: IRect) -> Option<u64> {
    let fits = |v: i32| (0..=FIELD_MAX).contains(&v);
    if rect.is_empty() || !fits(rect.x) || !fits(rect.y) || !fits(rect.width) || !fits(rect.height) {
        return None;
    }

    Some(
        rect.x as u64
            | (rect.y as u64) << FIELD_BITS
            | (rect.width as u64) << (FIELD_BITS * 2)
            | (rect.height as u64) << (FIELD_BITS * 3)
            | (kind as u64) << KIND_SHIFT,
    )
}

/// Inverse of [`geometry_key`], for diagnostics.
pub fn unpack_key(key: u64) -> (u64, IRect) {
    let field = |i: u32| ((key >> (FIELD_BITS * i)) & FIELD_MAX as u64) as i32;
    (
        key >> KIND_SHIFT,
        IRect::new(field(0), field(1), field(2), field(3)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_do_not_overlap() {
        let rect = IRect::new(FIELD_MAX, 0, 1, FIELD_MAX);
        let key = geometry_key(GeometryKind::Quad, rect).unwrap();
        assert_eq!(unpack_key(key), (GeometryKind::Quad as u64, rect));
    }

    #[test]
    fn kind_distinguishes_identical_rects() {
        let rect = IRect::new(10, 10, 200, 100);
        assert_ne!(
            geometry_key(GeometryKind::Quad, rect),
            geometry_key(GeometryKind::Outline, rect)
        );
    }

    #[test]
    fn out_of_range_rects_are_not_cacheable() {
        assert_eq!(geometry_key(GeometryKind::Quad, IRect::new(-1, 0, 10, 10)), None);
        assert_eq!(geometry_key(GeometryKind::Quad, IRect::new(0, 0, FIELD_MAX + 1, 10)), None);
        assert_eq!(geometry_key(GeometryKind::Quad, IRect::new(0, 0, 0, 10)), None);
    }

    #[test]
    fn distinct_rects_get_distinct_keys() {
        let a = geometry_key(GeometryKind::Quad, IRect::new(1, 0, 0x10, 0x10));
        let b = geometry_key(GeometryKind::Quad, IRect::new(0, 1, 0x10, 0x10));
        assert_ne!(a, b);
    }
}
