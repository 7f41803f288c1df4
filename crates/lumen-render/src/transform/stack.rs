use crate::coords::Vec2;
use crate::error::{RenderError, RenderResult};
use crate::math::Mat4;

use super::UiEffects;

/// Stack of model transforms with a permanent identity base entry.
#[derive(Debug, Clone)]
pub struct TransformStack {
    entries: Vec<Mat4>,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformStack {
    pub fn new() -> Self {
        Self {
            entries: vec![Mat4::IDENTITY],
        }
    }

    #[inline]
    pub fn top(&self) -> Mat4 {
        // The base entry is never removed.
        self.entries.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    /// Number of entries including the base.
    #[inline]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Composes `fx` around `centre` onto the current top and pushes the result.
    pub fn push(&mut self, fx: &UiEffects, centre: Vec2) -> Mat4 {
        let mut next = self.top();

        if !fx.is_geometric_identity() {
            let (hzoom, vzoom) = fx.zoom_factors();
            next.translate(centre.x, centre.y);
            next.scale(hzoom, vzoom);
            next.skew(fx.hskew, fx.vskew);
            next.rotate(fx.angle);
            next.translate(-centre.x, -centre.y);
        }

        self.entries.push(next);
        next
    }

    /// Pops one level and returns the new top. The base entry is never popped.
    pub fn pop(&mut self) -> RenderResult<Mat4> {
        if self.entries.len() <= 1 {
            return Err(RenderError::TransformUnderflow);
        }
        self.entries.pop();
        Ok(self.top())
    }

    /// Drops everything above the base entry.
    pub fn reset(&mut self) {
        self.entries.truncate(1);
    }
}
