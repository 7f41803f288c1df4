//! Contract between the runtime loop and applications.
//!
//! Applications see a window, its render engine and the frame clock; the
//! runtime keeps surface, device and context-loss handling to itself.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
