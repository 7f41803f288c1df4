/// What the runtime should do after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// The device is gone; recreate it and re-initialize the engine.
    RecreateDevice,
    /// Out of memory; terminate gracefully.
    Fatal,
}
