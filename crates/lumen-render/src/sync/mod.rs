//! Serialized access to the graphics context.
//!
//! `RenderLocker` is the scoped guard every engine operation runs under;
//! `FenceSlot` holds the engine's single batch fence.

mod fence;
mod locker;

pub use fence::FenceSlot;
pub use locker::RenderLocker;
