//! Node - The geometry contract every layout participant exposes.
//!
//! A node is an index into the parallel arrays. This module is the only
//! public way to mutate geometry: setters write the arrays and then raise
//! the matching change signal exactly once. Re-setting an equal value is
//! silent.
//!
//! Resizing a node first lets its own relations compensate its position
//! (e.g. a right-anchored node keeps its right edge in place), then raises
//! the size signal, so size listeners already see the compensated position.

use super::arrays::geometry;
use super::{events, registry};
use crate::relations;
use crate::types::{ChangeFlags, Vec2};

/// Props for creating a node.
#[derive(Debug, Clone, Default)]
pub struct NodeProps {
    /// Unique ID. Generated when absent.
    pub id: Option<String>,
    /// Parent index. Defaults to the current parent context.
    pub parent: Option<usize>,
    pub position: Vec2,
    /// Initial size, also recorded as the design-time size.
    pub size: Vec2,
}

/// Create a node and return its index.
pub fn create_node(props: NodeProps) -> usize {
    let index = registry::allocate_index(props.id.as_deref());
    if props.parent.is_some() {
        registry::set_parent(index, props.parent);
    }
    geometry::set_position(index, props.position);
    geometry::set_size(index, props.size);
    geometry::set_design_size(index, props.size);
    index
}

// =============================================================================
// Accessors
// =============================================================================

/// Position in parent space.
pub fn position(index: usize) -> Vec2 {
    geometry::get_position(index)
}

/// Extent.
pub fn size(index: usize) -> Vec2 {
    geometry::get_size(index)
}

/// Size recorded at creation (or by [`set_design_size`]).
pub fn design_size(index: usize) -> Vec2 {
    geometry::get_design_size(index)
}

/// Override the design-time size.
pub fn set_design_size(index: usize, value: Vec2) {
    geometry::set_design_size(index, value);
}

/// Node ID.
pub fn id(index: usize) -> Option<String> {
    registry::get_id(index)
}

/// Parent index.
pub fn parent(index: usize) -> Option<usize> {
    registry::get_parent(index)
}

// =============================================================================
// Mutation
// =============================================================================

/// Move a node. Notifies position listeners once if the value changed.
pub fn set_position(index: usize, value: Vec2) {
    if !registry::is_allocated(index) {
        return;
    }
    let old = geometry::get_position(index);
    if old == value {
        return;
    }
    geometry::set_position(index, value);
    events::dispatch(index, ChangeFlags::POSITION, old);
}

/// Resize a node. Notifies size listeners once if the value changed.
pub fn set_size(index: usize, value: Vec2) {
    if !registry::is_allocated(index) {
        return;
    }
    let old = geometry::get_size(index);
    if old == value {
        return;
    }
    geometry::set_size(index, value);
    relations::on_owner_size_changed(index, value - old);
    events::dispatch(index, ChangeFlags::SIZE, old);
}

/// Move by a delta.
pub fn translate(index: usize, delta: Vec2) {
    set_position(index, position(index) + delta);
}

/// Commit position and size together: size first (so self-size
/// compensation runs), then the final absolute position.
///
/// Returns which parts changed.
pub fn set_rect(index: usize, position: Vec2, size: Vec2) -> ChangeFlags {
    let old_position = geometry::get_position(index);
    let old_size = geometry::get_size(index);

    set_size(index, size);
    set_position(index, position);

    let mut changed = ChangeFlags::NONE;
    if geometry::get_position(index) != old_position {
        changed |= ChangeFlags::POSITION;
    }
    if geometry::get_size(index) != old_size {
        changed |= ChangeFlags::SIZE;
    }
    changed
}

/// Write a rect computed by a relation in one step.
///
/// The position already includes the owner's self-size compensation, so
/// the owner's relations are not consulted again. Both values are written
/// before anything is notified; each signal fires at most once.
pub(crate) fn write_rect(index: usize, position: Vec2, size: Vec2) -> ChangeFlags {
    if !registry::is_allocated(index) {
        return ChangeFlags::NONE;
    }
    let old_position = geometry::get_position(index);
    let old_size = geometry::get_size(index);

    let mut changed = ChangeFlags::NONE;
    if old_position != position {
        geometry::set_position(index, position);
        changed |= ChangeFlags::POSITION;
    }
    if old_size != size {
        geometry::set_size(index, size);
        changed |= ChangeFlags::SIZE;
    }

    if changed.contains(ChangeFlags::POSITION) {
        events::dispatch(index, ChangeFlags::POSITION, old_position);
    }
    if changed.contains(ChangeFlags::SIZE) {
        events::dispatch(index, ChangeFlags::SIZE, old_size);
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::NodeListener;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counter {
        moves: Cell<usize>,
        resizes: Cell<usize>,
    }

    impl NodeListener for Counter {
        fn position_changed(&self, _node: usize, _old: Vec2) {
            self.moves.set(self.moves.get() + 1);
        }

        fn size_changed(&self, _node: usize, _old: Vec2) {
            self.resizes.set(self.resizes.get() + 1);
        }
    }

    #[test]
    fn test_create_node_records_design_size() {
        crate::reset_engine();

        let index = create_node(NodeProps {
            id: Some("box".into()),
            position: Vec2::new(5.0, 6.0),
            size: Vec2::new(40.0, 20.0),
            ..Default::default()
        });

        assert_eq!(id(index).as_deref(), Some("box"));
        assert_eq!(position(index), Vec2::new(5.0, 6.0));
        assert_eq!(design_size(index), Vec2::new(40.0, 20.0));
    }

    #[test]
    fn test_setters_notify_once_per_distinct_value() {
        crate::reset_engine();

        let index = create_node(NodeProps::default());
        let counter = Rc::new(Counter::default());
        let _cleanup = events::subscribe(
            index,
            ChangeFlags::POSITION | ChangeFlags::SIZE,
            counter.clone(),
        );

        set_position(index, Vec2::new(1.0, 1.0));
        set_position(index, Vec2::new(1.0, 1.0));
        set_size(index, Vec2::new(10.0, 10.0));
        set_size(index, Vec2::new(10.0, 10.0));

        assert_eq!(counter.moves.get(), 1);
        assert_eq!(counter.resizes.get(), 1);
    }

    #[test]
    fn test_set_rect_reports_changes() {
        crate::reset_engine();

        let index = create_node(NodeProps::default());
        let changed = set_rect(index, Vec2::new(3.0, 0.0), Vec2::ZERO);
        assert_eq!(changed, ChangeFlags::POSITION);

        let changed = set_rect(index, Vec2::new(3.0, 0.0), Vec2::new(1.0, 1.0));
        assert_eq!(changed, ChangeFlags::SIZE);
    }

    #[test]
    fn test_write_rect_notifies_each_signal_once() {
        crate::reset_engine();

        let index = create_node(NodeProps::default());
        let counter = Rc::new(Counter::default());
        let _cleanup = events::subscribe(
            index,
            ChangeFlags::POSITION | ChangeFlags::SIZE,
            counter.clone(),
        );

        let changed = write_rect(index, Vec2::new(4.0, 4.0), Vec2::new(8.0, 8.0));
        assert_eq!(changed, ChangeFlags::POSITION | ChangeFlags::SIZE);
        assert_eq!(counter.moves.get(), 1);
        assert_eq!(counter.resizes.get(), 1);

        let changed = write_rect(index, Vec2::new(4.0, 4.0), Vec2::new(8.0, 8.0));
        assert_eq!(changed, ChangeFlags::NONE);
        assert_eq!(counter.moves.get(), 1);
    }

    #[test]
    fn test_released_node_ignores_setters() {
        crate::reset_engine();

        let keep = create_node(NodeProps::default());
        let index = create_node(NodeProps::default());
        registry::release_index(index);

        set_position(index, Vec2::new(9.0, 9.0));
        assert_eq!(position(index), Vec2::ZERO);
        assert!(registry::is_allocated(keep));
    }
}
