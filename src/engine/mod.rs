//! Engine - Node registry, parallel arrays, change signals.
//!
//! The engine manages the core data structures:
//! - Registry: Index allocation, ID mapping, parent/child tree, construction flag
//! - Arrays: Parallel arrays for geometry and tree state
//! - Events: Position/size change signals and the [`NodeListener`] trait
//! - Node: The public geometry contract (getters + notifying setters)
//!
//! # Architecture
//!
//! Nodes are NOT objects. They are indices into parallel arrays:
//!
//! ```text
//! Index 0: panel  (parent=None, pos=(0,0),   size=(300,200))
//! Index 1: button (parent=0,    pos=(80,10), size=(40,20))
//! Index 2: label  (parent=0,    pos=(10,10), size=(60,20))
//! ```
//!
//! Relations, gears and transitions refer to nodes by index and observe
//! them through [`events`].

pub mod registry;
pub mod arrays;
pub mod events;
pub mod node;

pub use registry::*;
pub use events::NodeListener;
pub use node::{create_node, NodeProps};
