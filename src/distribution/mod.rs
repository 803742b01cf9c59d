//! Random file-index sampling (§4.2): uniform and time-drifting Gaussian.
//!
//! Grounded on the teacher's `distribution::Distribution` trait shape
//! (`distribution/mod.rs`, `distribution/uniform.rs`,
//! `distribution/gaussian.rs`), generalized from "random block number in a
//! device" to "random file index in the tree", and extended with the
//! moving-mean simulated-time model the teacher's distributions don't need.

pub mod gaussian;
pub mod uniform;

/// Samples a file index in `[0, max_files)`.
///
/// `is_create` lets Gaussian mode lead creates ahead of the access center
/// (§4.2); uniform mode ignores it.
pub trait FileIndexGenerator: Send {
    fn next_index(&mut self, max_files: u64, is_create: bool) -> u64;
}
