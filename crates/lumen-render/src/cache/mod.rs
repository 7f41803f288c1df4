//! Geometry caches.
//!
//! Draw rectangles recur frame after frame, so the engine keeps the derived
//! vertex layout (CPU arrays, or uploaded vertex buffers when the backend has
//! buffer objects) keyed by `(kind, rect)` packed into a `u64`.

mod geometry;
mod key;
mod lru_cache;

pub use geometry::{GeometryKind, FLOATS_PER_VERTEX};
pub use key::{geometry_key, unpack_key, FIELD_BITS, FIELD_MAX, KIND_SHIFT};
pub use lru_cache::{CacheStats, ResourceCache};
