//! Node Registry - Index allocation for parallel arrays.
//!
//! Manages the lifecycle of node indices:
//! - ID ↔ Index bidirectional mapping
//! - Free index pool for O(1) reuse
//! - Parent/child bookkeeping (children kept in insertion order)
//! - Parent context stack for nested node creation
//! - Two-phase construction flag for composites

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use super::arrays;
use super::events;
use crate::relations;
use crate::state::{gear, transition};

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Map node ID to array index.
    static ID_TO_INDEX: RefCell<HashMap<String, usize>> = RefCell::new(HashMap::new());

    /// Map array index to node ID.
    static INDEX_TO_ID: RefCell<HashMap<usize, String>> = RefCell::new(HashMap::new());

    /// Set of currently allocated indices.
    static ALLOCATED_INDICES: RefCell<BTreeSet<usize>> = const { RefCell::new(BTreeSet::new()) };

    /// Children per parent, in insertion order.
    static CHILDREN: RefCell<HashMap<usize, Vec<usize>>> = RefCell::new(HashMap::new());

    /// Pool of freed indices for reuse.
    static FREE_INDICES: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };

    /// Next index to allocate if pool is empty.
    static NEXT_INDEX: RefCell<usize> = const { RefCell::new(0) };

    /// Counter for generating unique IDs.
    static ID_COUNTER: RefCell<usize> = const { RefCell::new(0) };

    /// Stack of parent indices for nested node creation.
    static PARENT_STACK: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };

    /// Destroy callbacks registered per index.
    static DESTROY_CALLBACKS: RefCell<HashMap<usize, Vec<Box<dyn FnOnce()>>>> = RefCell::new(HashMap::new());
}

// =============================================================================
// Parent Context Stack
// =============================================================================

/// Get current parent index (None if at root).
pub fn get_current_parent_index() -> Option<usize> {
    PARENT_STACK.with(|stack| {
        let stack = stack.borrow();
        stack.last().copied()
    })
}

/// Push a parent index onto the stack.
pub fn push_parent_context(index: usize) {
    PARENT_STACK.with(|stack| {
        stack.borrow_mut().push(index);
    })
}

/// Pop a parent index from the stack.
pub fn pop_parent_context() {
    PARENT_STACK.with(|stack| {
        stack.borrow_mut().pop();
    })
}

// =============================================================================
// Two-Phase Construction
// =============================================================================

/// Mark a composite as under construction.
///
/// While set, Width/Height and trailing-extension relations in which this
/// node contains its target measure against design-time sizes.
pub fn begin_construction(index: usize) {
    arrays::core::set_constructing(index, true);
}

/// Clear the construction flag once the subtree is wired.
pub fn end_construction(index: usize) {
    arrays::core::set_constructing(index, false);
}

/// Check whether a node is under construction.
pub fn is_constructing(index: usize) -> bool {
    arrays::core::get_constructing(index)
}

/// Build a composite's subtree.
///
/// Nodes created inside `build` become children of `index`, and `index`
/// stays under construction until `build` returns.
pub fn with_construction<R>(index: usize, build: impl FnOnce() -> R) -> R {
    begin_construction(index);
    push_parent_context(index);
    let result = build();
    pop_parent_context();
    end_construction(index);
    result
}

// =============================================================================
// Index Allocation
// =============================================================================

/// Allocate an index for a new node.
///
/// # Arguments
/// * `id` - Optional node ID. If not provided, one is generated.
///
/// The node is parented to the current parent context, if any.
///
/// # Returns
/// The allocated index.
pub fn allocate_index(id: Option<&str>) -> usize {
    // Generate ID if not provided
    let node_id = match id {
        Some(id) => id.to_string(),
        None => ID_COUNTER.with(|counter| {
            let mut counter = counter.borrow_mut();
            let id = format!("n{}", *counter);
            *counter += 1;
            id
        }),
    };

    // Check if already allocated
    let existing = ID_TO_INDEX.with(|map| map.borrow().get(&node_id).copied());
    if let Some(index) = existing {
        return index;
    }

    // Reuse free index or allocate new
    let index = FREE_INDICES.with(|free| {
        let mut free = free.borrow_mut();
        if let Some(index) = free.pop() {
            index
        } else {
            NEXT_INDEX.with(|next| {
                let mut next = next.borrow_mut();
                let index = *next;
                *next += 1;
                index
            })
        }
    });

    // Register mappings
    ID_TO_INDEX.with(|map| {
        map.borrow_mut().insert(node_id.clone(), index);
    });
    INDEX_TO_ID.with(|map| {
        map.borrow_mut().insert(index, node_id);
    });
    ALLOCATED_INDICES.with(|set| {
        set.borrow_mut().insert(index);
    });

    // Ensure arrays have capacity for this index
    arrays::ensure_all_capacity(index);

    set_parent(index, get_current_parent_index());

    index
}

/// Release an index back to the pool.
///
/// Also recursively releases all children, disposes the node's relations,
/// and drops relations on other nodes that target it.
pub fn release_index(index: usize) {
    let id = INDEX_TO_ID.with(|map| map.borrow().get(&index).cloned());
    let Some(id) = id else { return };

    // FIRST: release all children (recursive!)
    for child_index in get_children(index) {
        release_index(child_index);
    }

    // Run destroy callbacks before cleanup
    run_destroy_callbacks(index);

    relations::release_node(index);
    gear::detach_gears(index);
    transition::remove_transitions(index);
    events::clear_node(index);

    set_parent(index, None);
    CHILDREN.with(|children| {
        children.borrow_mut().remove(&index);
    });

    // Clean up mappings
    ID_TO_INDEX.with(|map| {
        map.borrow_mut().remove(&id);
    });
    INDEX_TO_ID.with(|map| {
        map.borrow_mut().remove(&index);
    });
    ALLOCATED_INDICES.with(|set| {
        set.borrow_mut().remove(&index);
    });

    // Clear all array values at this index
    arrays::clear_all_at_index(index);

    // Return to pool for reuse
    FREE_INDICES.with(|free| {
        free.borrow_mut().push(index);
    });

    tracing::debug!(node = index, id = %id, "released node");

    // When every node is gone, reset arrays to free memory
    let is_empty = ALLOCATED_INDICES.with(|set| set.borrow().is_empty());
    if is_empty {
        arrays::reset_all_arrays();
        FREE_INDICES.with(|free| {
            free.borrow_mut().clear();
        });
        NEXT_INDEX.with(|next| {
            *next.borrow_mut() = 0;
        });
    }
}

// =============================================================================
// Tree Structure
// =============================================================================

/// Re-parent a node. Children keep insertion order.
///
/// Relations already wired keep the subscriptions chosen when they were added.
pub fn set_parent(index: usize, parent: Option<usize>) {
    let previous = arrays::core::get_parent_index(index);
    if previous == parent {
        return;
    }

    CHILDREN.with(|children| {
        let mut children = children.borrow_mut();
        if let Some(previous) = previous {
            if let Some(list) = children.get_mut(&previous) {
                list.retain(|&child| child != index);
            }
        }
        if let Some(parent) = parent {
            children.entry(parent).or_default().push(index);
        }
    });

    arrays::core::set_parent_index(index, parent);
}

/// Get the parent of a node.
pub fn get_parent(index: usize) -> Option<usize> {
    arrays::core::get_parent_index(index)
}

/// Get the children of a node, in insertion order.
pub fn get_children(index: usize) -> Vec<usize> {
    CHILDREN.with(|children| children.borrow().get(&index).cloned().unwrap_or_default())
}

/// Find a direct child of `parent` by ID.
pub fn find_child(parent: usize, id: &str) -> Option<usize> {
    let index = get_index(id)?;
    (get_parent(index) == Some(parent)).then_some(index)
}

// =============================================================================
// Destroy Callbacks
// =============================================================================

/// Register a callback to run when the node at `index` is destroyed.
pub fn on_destroy(index: usize, callback: impl FnOnce() + 'static) {
    DESTROY_CALLBACKS.with(|callbacks| {
        callbacks
            .borrow_mut()
            .entry(index)
            .or_default()
            .push(Box::new(callback));
    });
}

/// Run and clear destroy callbacks for an index.
fn run_destroy_callbacks(index: usize) {
    let callbacks = DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().remove(&index));
    if let Some(callbacks) = callbacks {
        for callback in callbacks {
            callback();
        }
    }
}

// =============================================================================
// Lookups
// =============================================================================

/// Get index for a node ID.
pub fn get_index(id: &str) -> Option<usize> {
    ID_TO_INDEX.with(|map| map.borrow().get(id).copied())
}

/// Get ID for an index.
pub fn get_id(index: usize) -> Option<String> {
    INDEX_TO_ID.with(|map| map.borrow().get(&index).cloned())
}

/// Get all currently allocated indices, ascending.
pub fn get_allocated_indices() -> Vec<usize> {
    ALLOCATED_INDICES.with(|set| set.borrow().iter().copied().collect())
}

/// Check if an index is currently allocated.
pub fn is_allocated(index: usize) -> bool {
    ALLOCATED_INDICES.with(|set| set.borrow().contains(&index))
}

/// Get the count of currently allocated nodes.
pub fn get_allocated_count() -> usize {
    ALLOCATED_INDICES.with(|set| set.borrow().len())
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset all registry state (for testing).
pub fn reset_registry() {
    ID_TO_INDEX.with(|map| map.borrow_mut().clear());
    INDEX_TO_ID.with(|map| map.borrow_mut().clear());
    ALLOCATED_INDICES.with(|set| set.borrow_mut().clear());
    CHILDREN.with(|children| children.borrow_mut().clear());
    FREE_INDICES.with(|free| free.borrow_mut().clear());
    NEXT_INDEX.with(|next| *next.borrow_mut() = 0);
    ID_COUNTER.with(|counter| *counter.borrow_mut() = 0);
    PARENT_STACK.with(|stack| stack.borrow_mut().clear());
    DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().clear());
    events::reset_listeners();
    arrays::reset_all_arrays();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_index() {
        reset_registry();

        let idx1 = allocate_index(None);
        let idx2 = allocate_index(None);
        let idx3 = allocate_index(Some("my_box"));

        assert_eq!(idx1, 0);
        assert_eq!(idx2, 1);
        assert_eq!(idx3, 2);

        assert!(is_allocated(0));
        assert!(is_allocated(1));
        assert!(is_allocated(2));
        assert!(!is_allocated(3));

        assert_eq!(get_allocated_count(), 3);
    }

    #[test]
    fn test_release_and_reuse() {
        reset_registry();

        let idx1 = allocate_index(None);
        let idx2 = allocate_index(None);

        release_index(idx1);
        assert!(!is_allocated(idx1));
        assert!(is_allocated(idx2));

        // Should reuse the freed index
        let idx3 = allocate_index(None);
        assert_eq!(idx3, idx1);
    }

    #[test]
    fn test_id_mapping() {
        reset_registry();

        let idx = allocate_index(Some("panel"));
        assert_eq!(get_index("panel"), Some(idx));
        assert_eq!(get_id(idx), Some("panel".to_string()));
        assert_eq!(allocate_index(Some("panel")), idx);
    }

    #[test]
    fn test_parent_context_assigns_parent() {
        reset_registry();

        let root = allocate_index(Some("root"));
        push_parent_context(root);
        let a = allocate_index(Some("a"));
        let b = allocate_index(Some("b"));
        pop_parent_context();

        assert_eq!(get_current_parent_index(), None);
        assert_eq!(get_parent(a), Some(root));
        assert_eq!(get_children(root), vec![a, b]);
        assert_eq!(find_child(root, "b"), Some(b));
        assert_eq!(find_child(a, "b"), None);
    }

    #[test]
    fn test_release_is_recursive() {
        reset_registry();

        let root = allocate_index(None);
        let child = with_construction(root, || allocate_index(None));
        let keep = allocate_index(None);

        release_index(root);
        assert!(!is_allocated(root));
        assert!(!is_allocated(child));
        assert!(is_allocated(keep));
    }

    #[test]
    fn test_with_construction_flag() {
        reset_registry();

        let root = allocate_index(None);
        let seen = with_construction(root, || is_constructing(root));
        assert!(seen);
        assert!(!is_constructing(root));
    }

    #[test]
    fn test_destroy_callback() {
        use std::cell::Cell;
        use std::rc::Rc;

        reset_registry();

        let called = Rc::new(Cell::new(false));
        let called_clone = called.clone();

        let idx = allocate_index(None);
        on_destroy(idx, move || {
            called_clone.set(true);
        });

        assert!(!called.get());
        release_index(idx);
        assert!(called.get());
    }
}
