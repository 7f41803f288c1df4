//! Engine configuration.
//!
//! Values are plain data with conservative defaults. `from_env` overlays the
//! `LUMEN_*` environment variables on top of the defaults so tuning does not
//! require a rebuild.

use std::time::Duration;

/// Runtime tuning for `RenderEngine`.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Maximum number of cached CPU vertex arrays kept after an insert.
    pub vertex_cache_limit: usize,

    /// Maximum number of cached vertex buffer objects kept after an insert.
    pub vbo_cache_limit: usize,

    /// When false, `flush` is a no-op (some drivers stall on explicit flushes).
    pub flush_enabled: bool,

    /// Upper bound for a fence wait inside `flush(true)`.
    pub fence_timeout: Duration,

    /// Forward `log_debug_marker` calls to the backend.
    pub debug_markers: bool,

    /// Number of shared decoder surfaces whose bound textures stay resident.
    pub shared_surface_cache: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vertex_cache_limit: 64,
            vbo_cache_limit: 64,
            flush_enabled: true,
            fence_timeout: Duration::from_millis(100),
            debug_markers: false,
            shared_surface_cache: 16,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `LUMEN_VERTEX_CACHE`, `LUMEN_VBO_CACHE`,
    /// `LUMEN_NO_FLUSH` and `LUMEN_GL_DEBUG`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(limit) = parse_limit(lookup("LUMEN_VERTEX_CACHE"), "LUMEN_VERTEX_CACHE") {
            config.vertex_cache_limit = limit;
        }
        if let Some(limit) = parse_limit(lookup("LUMEN_VBO_CACHE"), "LUMEN_VBO_CACHE") {
            config.vbo_cache_limit = limit;
        }
        if lookup("LUMEN_NO_FLUSH").is_some() {
            log::info!("explicit flushes disabled (LUMEN_NO_FLUSH)");
            config.flush_enabled = false;
        }
        if lookup("LUMEN_GL_DEBUG").is_some() {
            config.debug_markers = true;
        }

        config
    }
}

fn parse_limit(value: Option<String>, name: &str) -> Option<usize> {
    let value = value?;
    match value.trim().parse::<usize>() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring {name}={value:?}: not an unsigned integer");
            None
        }
    }
}
