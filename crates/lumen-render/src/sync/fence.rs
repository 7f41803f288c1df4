use crate::gpu::backend::RawFence;

/// The fence `set_fence` re-arms after each batch.
///
/// Created lazily on first use and kept for the engine's lifetime so a fence
/// object is not allocated per frame.
#[derive(Debug, Default)]
pub struct FenceSlot {
    fence: Option<RawFence>,
}

impl FenceSlot {
    #[inline]
    pub fn get(&self) -> Option<RawFence> {
        self.fence
    }

    /// Stores `fence`, returning the one it replaces.
    pub fn put(&mut self, fence: RawFence) -> Option<RawFence> {
        self.fence.replace(fence)
    }

    #[inline]
    pub fn take(&mut self) -> Option<RawFence> {
        self.fence.take()
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.fence.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_replaces_and_take_empties() {
        let mut slot = FenceSlot::default();
        assert!(!slot.is_set());
        assert_eq!(slot.put(RawFence(1)), None);
        assert_eq!(slot.put(RawFence(2)), Some(RawFence(1)));
        assert_eq!(slot.get(), Some(RawFence(2)));
        assert_eq!(slot.take(), Some(RawFence(2)));
        assert_eq!(slot.take(), None);
    }
}
