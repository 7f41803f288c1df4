use crate::config::EngineConfig;
use crate::gpu::backend::{Capabilities, Features, GpuBackend};
use crate::render::RenderEngine;

use super::copy::CopyInterop;
use super::shared::SharedInterop;
use super::{Interop, InteropType};

/// One way of turning decoded frames into textures.
#[derive(Debug, Copy, Clone)]
pub struct InteropEntry {
    pub kind: InteropType,
    /// Whether the backend can run this adapter at all.
    pub supported: fn(&Capabilities) -> bool,
    pub create: fn(&EngineConfig) -> Interop,
}

fn always(_: &Capabilities) -> bool {
    true
}

fn has_external_textures(caps: &Capabilities) -> bool {
    caps.has(Features::EXTERNAL_TEXTURE)
}

fn create_copy(_: &EngineConfig) -> Interop {
    Interop::GenericCopy(CopyInterop::new())
}

fn create_shared(config: &EngineConfig) -> Interop {
    Interop::ZeroCopyShared(SharedInterop::new(config.shared_surface_cache))
}

/// Adapters compiled into this build, most preferred first.
pub static BUILTIN_INTEROPS: &[InteropEntry] = &[
    InteropEntry {
        kind: InteropType::ZeroCopyShared,
        supported: has_external_textures,
        create: create_shared,
    },
    InteropEntry {
        kind: InteropType::GenericCopy,
        supported: always,
        create: create_copy,
    },
];

/// Explicit table of interop adapters, built once at startup.
#[derive(Debug, Clone)]
pub struct InteropRegistry {
    entries: Vec<InteropEntry>,
}

impl Default for InteropRegistry {
    fn default() -> Self {
        Self::from_table(BUILTIN_INTEROPS)
    }
}

impl InteropRegistry {
    pub fn from_table(table: &[InteropEntry]) -> Self {
        Self { entries: table.to_vec() }
    }

    pub fn entries(&self) -> &[InteropEntry] {
        &self.entries
    }

    /// Adapter kinds the backend behind `caps` can run, in table order.
    pub fn available(&self, caps: &Capabilities) -> Vec<InteropType> {
        self.entries
            .iter()
            .filter(|e| (e.supported)(caps))
            .map(|e| e.kind)
            .collect()
    }

    /// Instantiates the adapter for `kind`. `None` for `Unsupported`, for a
    /// kind missing from the table, or when the engine cannot run it.
    pub fn create<B: GpuBackend>(&self, engine: &RenderEngine<B>, kind: InteropType) -> Option<Interop> {
        if kind == InteropType::Unsupported {
            return None;
        }
        let Some(caps) = engine.capabilities() else {
            log::error!("interop requested before the render engine was initialized");
            return None;
        };
        let entry = self.entries.iter().find(|e| e.kind == kind)?;
        if !(entry.supported)(&caps) {
            log::warn!("{kind:?} interop is not supported by '{}'", caps.renderer);
            return None;
        }
        log::info!("using {kind:?} video interop");
        Some((entry.create)(&engine.config()))
    }
}
