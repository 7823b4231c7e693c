//! Core Arrays
//!
//! Tree structure and lifecycle state:
//! - parent: Index of the containing node (None at root)
//! - constructing: Node is a composite whose subtree is still being wired

use std::cell::RefCell;

// =============================================================================
// Arrays
// =============================================================================

thread_local! {
    /// Parent index per node.
    static PARENT: RefCell<Vec<Option<usize>>> = const { RefCell::new(Vec::new()) };

    /// Two-phase construction flag per node.
    static CONSTRUCTING: RefCell<Vec<bool>> = const { RefCell::new(Vec::new()) };
}

// =============================================================================
// Capacity Management
// =============================================================================

/// Ensure arrays have capacity for the given index.
pub fn ensure_capacity(index: usize) {
    PARENT.with(|arr| {
        let mut arr = arr.borrow_mut();
        if arr.len() <= index {
            arr.resize(index + 1, None);
        }
    });
    CONSTRUCTING.with(|arr| {
        let mut arr = arr.borrow_mut();
        if arr.len() <= index {
            arr.resize(index + 1, false);
        }
    });
}

/// Clear values at index.
pub fn clear_at_index(index: usize) {
    PARENT.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            *slot = None;
        }
    });
    CONSTRUCTING.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            *slot = false;
        }
    });
}

/// Reset all arrays.
pub fn reset() {
    PARENT.with(|arr| arr.borrow_mut().clear());
    CONSTRUCTING.with(|arr| arr.borrow_mut().clear());
}

// =============================================================================
// Parent
// =============================================================================

/// Get parent index.
pub fn get_parent_index(index: usize) -> Option<usize> {
    PARENT.with(|arr| arr.borrow().get(index).copied().flatten())
}

/// Set parent index.
pub fn set_parent_index(index: usize, parent: Option<usize>) {
    ensure_capacity(index);
    PARENT.with(|arr| arr.borrow_mut()[index] = parent);
}

// =============================================================================
// Constructing
// =============================================================================

/// Get the construction flag.
pub fn get_constructing(index: usize) -> bool {
    CONSTRUCTING.with(|arr| arr.borrow().get(index).copied().unwrap_or(false))
}

/// Set the construction flag.
pub fn set_constructing(index: usize, constructing: bool) {
    ensure_capacity(index);
    CONSTRUCTING.with(|arr| arr.borrow_mut()[index] = constructing);
}
