//! Transformation stack for nested visual effects.
//!
//! An element with a zoom, rotation or skew pushes an entry before it draws
//! and pops it afterwards; the engine multiplies the base projection with the
//! current top when it uploads the projection uniform.

mod effects;
mod stack;

pub use effects::{Centre, UiEffects};
pub use stack::TransformStack;
