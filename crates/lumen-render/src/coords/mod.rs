//! Geometry types shared by the engine, the caches and interop.
//!
//! Canonical space:
//! - device pixels
//! - origin top-left
//! - +X right, +Y down
//!
//! The base projection maps this space to clip space; transforms from the
//! stack are applied in pixel space before projection.

mod rect;
mod size;
mod vec2;

pub use rect::IRect;
pub use size::ISize;
pub use vec2::Vec2;
