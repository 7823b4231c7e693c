//! Node Change Signals - Listener registry for position/size notifications.
//!
//! Every node exposes two synchronous signals: position changed and size
//! changed. Observers implement [`NodeListener`] and subscribe per node with
//! a [`ChangeFlags`] mask; subscribing returns a cleanup closure.
//!
//! # Dispatch
//!
//! Dispatch is inline and depth-first. The listener list is snapshotted
//! before any listener runs, so listeners may freely mutate other nodes,
//! subscribe, or unsubscribe. A listener removed while a dispatch is in
//! flight is skipped by that dispatch.
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use spark_relations::engine::events::{self, NodeListener};
//! use spark_relations::ChangeFlags;
//!
//! struct Logger;
//! impl NodeListener for Logger {
//!     fn position_changed(&self, node: usize, old: Vec2) {
//!         println!("{node} moved from {old:?}");
//!     }
//! }
//!
//! let cleanup = events::subscribe(node, ChangeFlags::POSITION, Rc::new(Logger));
//! // ...
//! cleanup();
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::types::{ChangeFlags, Vec2};

// =============================================================================
// TYPES
// =============================================================================

/// Observer of a node's geometry.
///
/// Both callbacks receive the node that changed and its previous value;
/// the new value is read from [`crate::engine::node`].
pub trait NodeListener {
    fn position_changed(&self, node: usize, old: Vec2) {
        let _ = (node, old);
    }

    fn size_changed(&self, node: usize, old: Vec2) {
        let _ = (node, old);
    }
}

struct ListenerEntry {
    id: usize,
    kinds: ChangeFlags,
    listener: Rc<dyn NodeListener>,
}

// =============================================================================
// REGISTRY
// =============================================================================

thread_local! {
    static LISTENERS: RefCell<HashMap<usize, Vec<ListenerEntry>>> = RefCell::new(HashMap::new());
    static NEXT_ID: Cell<usize> = const { Cell::new(0) };
}

fn next_id() -> usize {
    NEXT_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    })
}

fn is_subscribed(node: usize, id: usize) -> bool {
    LISTENERS.with(|listeners| {
        listeners
            .borrow()
            .get(&node)
            .is_some_and(|entries| entries.iter().any(|entry| entry.id == id))
    })
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Subscribe to changes of `node`.
///
/// `kinds` selects which signals reach the listener. Returns cleanup function.
pub fn subscribe(node: usize, kinds: ChangeFlags, listener: Rc<dyn NodeListener>) -> impl FnOnce() {
    let id = next_id();
    LISTENERS.with(|listeners| {
        listeners
            .borrow_mut()
            .entry(node)
            .or_default()
            .push(ListenerEntry { id, kinds, listener });
    });

    move || {
        LISTENERS.with(|listeners| {
            let mut listeners = listeners.borrow_mut();
            if let Some(entries) = listeners.get_mut(&node) {
                entries.retain(|entry| entry.id != id);
                if entries.is_empty() {
                    listeners.remove(&node);
                }
            }
        });
    }
}

/// Notify listeners of `node` that `kind` changed from `old`.
pub(crate) fn dispatch(node: usize, kind: ChangeFlags, old: Vec2) {
    let snapshot: Vec<(usize, Rc<dyn NodeListener>)> = LISTENERS.with(|listeners| {
        listeners
            .borrow()
            .get(&node)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.kinds.intersects(kind))
                    .map(|entry| (entry.id, Rc::clone(&entry.listener)))
                    .collect()
            })
            .unwrap_or_default()
    });

    for (id, listener) in snapshot {
        if !is_subscribed(node, id) {
            continue;
        }
        if kind.contains(ChangeFlags::POSITION) {
            listener.position_changed(node, old);
        } else if kind.contains(ChangeFlags::SIZE) {
            listener.size_changed(node, old);
        }
    }
}

/// Number of listeners currently subscribed to `node`.
pub fn listener_count(node: usize) -> usize {
    LISTENERS.with(|listeners| listeners.borrow().get(&node).map_or(0, Vec::len))
}

/// Drop every listener of a node (called when the node is released).
pub(crate) fn clear_node(node: usize) {
    LISTENERS.with(|listeners| {
        listeners.borrow_mut().remove(&node);
    });
}

/// Reset listener state (for testing).
pub fn reset_listeners() {
    LISTENERS.with(|listeners| listeners.borrow_mut().clear());
    NEXT_ID.with(|next| next.set(0));
}
