//! Downloadable dependencies: the catalog they are resolved from, the cache they are
//! fetched into, and the bill-of-materials entries they produce.

pub mod cache;
mod types;

pub use cache::DependencyCache;
pub use types::*;
