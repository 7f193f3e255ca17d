//! Shared utilities.
//!
//! Content hashing for fingerprints plus test helpers.

pub mod hash;

#[cfg(test)]
pub mod testutil;
