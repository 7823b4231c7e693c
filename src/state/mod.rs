//! State Module - Controller-driven state that cooperates with relations
//!
//! - **Controller** - Named pages with a reactive selected page
//! - **Gear** - Per-page recorded position/size of a node
//! - **Transition** - Keyframe timelines over a node's children
//!
//! Relation items report automatic moves to gears and transitions through
//! their `update_from_relations` hooks, so layout-driven movement is never
//! mistaken for a user edit.

pub mod controller;
pub mod gear;
pub mod transition;

pub use controller::Controller;
pub use gear::{attach_gear, detach_gears, gear_value, get_gear, with_gears_locked, Gear, GearKind};
pub use transition::{
    add_transition, get_transition, remove_transitions, transitions_of, Transition,
    TransitionAction, TransitionItem,
};
