//! # spark-relations
//!
//! Reactive anchor-based relation layout for retained UI trees.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! controller state.
//!
//! ## Architecture
//!
//! Nodes are indices into columnar arrays rather than objects. A node may
//! declare relations to a target (its parent or a sibling) that keep its
//! position and size in sync with the target: fixed or percent offsets,
//! anchor-to-anchor, size-follows-size, and edge extensions.
//!
//! Propagation is synchronous and incremental:
//! ```text
//! target.set_size → size signal → RelationItem → owner.set_size/set_position → ...
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Core types (Vec2, RelationType, ChangeFlags, etc.)
//! - [`engine`] - Node registry, parallel arrays, change signals
//! - [`relations`] - Relation items, per-owner collections, setup parsing
//! - [`state`] - Controllers, gears and transitions
//! - [`config`] - Tween configuration
//! - [`error`] - Error types

pub mod config;
pub mod engine;
pub mod error;
pub mod relations;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::TweenConfig;
pub use error::{RelationError, Result};

pub use engine::{
    allocate_index, begin_construction, create_node, end_construction, find_child,
    get_allocated_indices, get_children, get_current_parent_index, get_id, get_index,
    get_parent, is_allocated, is_constructing, on_destroy, pop_parent_context,
    push_parent_context, release_index, reset_registry, set_parent, with_construction,
    NodeListener, NodeProps,
};

pub use relations::{RelationEntry, RelationItem};

pub use state::{Controller, GearKind, Transition, TransitionAction, TransitionItem};

/// Reset every registry (for testing).
///
/// Relations, gears and transitions are torn down before the node
/// registry so their subscriptions are released first.
pub fn reset_engine() {
    relations::reset_relations();
    state::gear::reset_gears();
    state::transition::reset_transitions();
    engine::reset_registry();
}
