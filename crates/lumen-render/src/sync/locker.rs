use std::cell::{RefCell, RefMut};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::gpu::backend::GpuBackend;
use crate::render::RenderCore;

/// Scoped, reentrant hold on the render engine.
///
/// The first locker taken on a thread makes the backend current; the last one
/// dropped releases it. Nested lockers only move the depth counter, so a
/// caller can wrap a batch of engine calls (each of which locks internally)
/// and have the batch submitted without interleaving from other threads.
///
/// Release happens in `Drop`, so early returns and unwinding panics leave the
/// counter balanced.
pub struct RenderLocker<'a, B: GpuBackend> {
    guard: ReentrantMutexGuard<'a, RefCell<RenderCore<B>>>,
}

impl<'a, B: GpuBackend> RenderLocker<'a, B> {
    pub(crate) fn acquire(mutex: &'a ReentrantMutex<RefCell<RenderCore<B>>>) -> Self {
        let guard = mutex.lock();
        {
            let mut core = guard.borrow_mut();
            core.lock_depth += 1;
            if core.lock_depth == 1 {
                core.backend.make_current();
            }
        }
        Self { guard }
    }

    /// Nesting depth on the owning thread, this locker included.
    pub fn depth(&self) -> usize {
        self.guard.borrow().lock_depth
    }

    /// Runs `f` with the backend for work the engine does not wrap, such as
    /// presenting or reading back a frame.
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        f(&mut self.guard.borrow_mut().backend)
    }

    /// Borrows the engine state for the duration of `f`.
    ///
    /// `f` must not call back into the engine: the state is exclusively
    /// borrowed while it runs.
    pub(crate) fn with_core<R>(&self, f: impl FnOnce(&mut RenderCore<B>) -> R) -> R {
        f(&mut self.core())
    }

    pub(crate) fn core(&self) -> RefMut<'_, RenderCore<B>> {
        self.guard.borrow_mut()
    }
}

impl<B: GpuBackend> Drop for RenderLocker<'_, B> {
    fn drop(&mut self) {
        // Runs before `guard` is dropped, so the mutex is still held here.
        match self.guard.try_borrow_mut() {
            Ok(mut core) => {
                core.lock_depth = core.lock_depth.saturating_sub(1);
                if core.lock_depth == 0 {
                    core.backend.done_current();
                }
            }
            Err(_) => log::error!("render locker released while engine state is borrowed"),
        }
    }
}
