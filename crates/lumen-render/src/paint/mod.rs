//! Colour and fill/stroke styles.
//!
//! Geometry types remain in `coords`.

pub mod brush;
pub mod color;

pub use brush::{Brush, Pen};
pub use color::Color;
