//! Per-window frame timing for animated content (visualisers, transitions).

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
