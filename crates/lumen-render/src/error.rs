//! Error taxonomy for the render core.
//!
//! Nothing in here is fatal to the process. Capability and allocation errors
//! mean "skip this element"; state-misuse errors are programmer mistakes that
//! get logged and turned into no-ops; `ContextLost` means every outstanding key
//! is gone and the engine must be initialized again.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("render engine is not initialized")]
    NotInitialized,

    #[error("capability missing: {0}")]
    CapabilityMissing(&'static str),

    #[error("GPU allocation failed: {0}")]
    Allocation(String),

    #[error("invalid size {width}x{height} (max {max})")]
    InvalidSize { width: u32, height: u32, max: u32 },

    #[error("texture has no storage bound")]
    NoStorage,

    #[error("stale or unknown {0} handle")]
    StaleHandle(&'static str),

    #[error("transform stack underflow: the base entry cannot be popped")]
    TransformUnderflow,

    #[error("graphics context lost")]
    ContextLost,

    #[error("backend error: {0}")]
    Backend(String),
}

impl RenderError {
    /// True for errors that only mean "feature or element unavailable".
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RenderError::CapabilityMissing(_)
                | RenderError::Allocation(_)
                | RenderError::InvalidSize { .. }
                | RenderError::Backend(_)
        )
    }
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;
