//! Output layers.
//!
//! A layer is a directory under the layers root plus a `<name>.json` sidecar holding
//! its types (build, cache, launch) and the metadata it was contributed with. The
//! metadata doubles as the cache key: a [`LayerContributor`] reuses a layer whose
//! stored metadata matches what it expects and rebuilds it otherwise.
//!
//! # Submodules
//!
//! - [`contributor`] - Idempotent contribution of a single layer

pub mod contributor;
mod types;

pub use contributor::LayerContributor;
pub use types::*;
