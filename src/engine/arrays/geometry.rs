//! Geometry Arrays
//!
//! Raw layout values per node:
//! - position: Offset in parent space
//! - size: Extent
//! - design_size: Size captured at creation, consulted only while the
//!   owning composite is constructing

use std::cell::RefCell;

use crate::types::Vec2;

// =============================================================================
// Arrays
// =============================================================================

thread_local! {
    static POSITION: RefCell<Vec<Vec2>> = const { RefCell::new(Vec::new()) };
    static SIZE: RefCell<Vec<Vec2>> = const { RefCell::new(Vec::new()) };
    static DESIGN_SIZE: RefCell<Vec<Vec2>> = const { RefCell::new(Vec::new()) };
}

fn grow(arr: &RefCell<Vec<Vec2>>, index: usize) {
    let mut arr = arr.borrow_mut();
    if arr.len() <= index {
        arr.resize(index + 1, Vec2::ZERO);
    }
}

fn read(arr: &RefCell<Vec<Vec2>>, index: usize) -> Vec2 {
    arr.borrow().get(index).copied().unwrap_or_default()
}

fn write(arr: &RefCell<Vec<Vec2>>, index: usize, value: Vec2) {
    grow(arr, index);
    arr.borrow_mut()[index] = value;
}

// =============================================================================
// Capacity Management
// =============================================================================

/// Ensure arrays have capacity for the given index.
pub fn ensure_capacity(index: usize) {
    POSITION.with(|arr| grow(arr, index));
    SIZE.with(|arr| grow(arr, index));
    DESIGN_SIZE.with(|arr| grow(arr, index));
}

/// Clear values at index.
pub fn clear_at_index(index: usize) {
    POSITION.with(|arr| write(arr, index, Vec2::ZERO));
    SIZE.with(|arr| write(arr, index, Vec2::ZERO));
    DESIGN_SIZE.with(|arr| write(arr, index, Vec2::ZERO));
}

/// Reset all arrays.
pub fn reset() {
    POSITION.with(|arr| arr.borrow_mut().clear());
    SIZE.with(|arr| arr.borrow_mut().clear());
    DESIGN_SIZE.with(|arr| arr.borrow_mut().clear());
}

// =============================================================================
// Accessors
// =============================================================================

pub fn get_position(index: usize) -> Vec2 {
    POSITION.with(|arr| read(arr, index))
}

pub fn set_position(index: usize, value: Vec2) {
    POSITION.with(|arr| write(arr, index, value));
}

pub fn get_size(index: usize) -> Vec2 {
    SIZE.with(|arr| read(arr, index))
}

pub fn set_size(index: usize, value: Vec2) {
    SIZE.with(|arr| write(arr, index, value));
}

pub fn get_design_size(index: usize) -> Vec2 {
    DESIGN_SIZE.with(|arr| read(arr, index))
}

pub fn set_design_size(index: usize, value: Vec2) {
    DESIGN_SIZE.with(|arr| write(arr, index, value));
}
