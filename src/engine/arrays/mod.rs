//! Node Parallel Arrays
//!
//! All node state lives in these parallel arrays.
//! Each array index corresponds to one node.
//!
//! Arrays hold raw values only. Writes here never notify; change
//! notifications belong to [`crate::engine::node`], which is the only
//! public way to mutate geometry.
//!
//! # Array Categories
//!
//! - **core**: Parent index, construction flag
//! - **geometry**: Position, size, design-time size

pub mod core;
pub mod geometry;

use self::core as core_arrays;
use self::geometry as geometry_arrays;

/// Ensure all arrays have capacity for the given index.
///
/// Called by registry when allocating.
pub fn ensure_all_capacity(index: usize) {
    core_arrays::ensure_capacity(index);
    geometry_arrays::ensure_capacity(index);
}

/// Clear all array values at an index.
///
/// Called by registry when releasing.
pub fn clear_all_at_index(index: usize) {
    core_arrays::clear_at_index(index);
    geometry_arrays::clear_at_index(index);
}

/// Reset all parallel arrays to release memory.
pub fn reset_all_arrays() {
    core_arrays::reset();
    geometry_arrays::reset();
}
