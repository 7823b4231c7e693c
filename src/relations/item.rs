//! RelationItem - All relations from one owner to one target.
//!
//! An item owns exactly one subscription to its target. On every target
//! notification it recomputes the owner's rect from the delta against a
//! cached snapshot of the target, commits the rect once, refreshes the
//! snapshot, and reports the owner's movement to the gear and transition
//! hooks so those automatic moves are not recorded as user edits.
//!
//! # Subscription
//!
//! Size changes are always observed. Position changes are observed only
//! when the target is not the owner's parent: a parent's position is the
//! origin of the owner's space, so moving it never moves the owner.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::engine::events::{self, NodeListener};
use crate::engine::{node, registry};
use crate::state::gear::{self, GearKind};
use crate::state::transition;
use crate::types::{Axis, ChangeFlags, Edge, RelationDef, RelationShape, RelationType, Vec2};

/// Working copy of the owner's geometry while defs are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OwnerRect {
    position: Vec2,
    size: Vec2,
}

/// Target-side inputs to the size formulas.
struct SizeChange {
    /// Target position, or zero when the target is the owner's parent.
    origin: Vec2,
    old_size: Vec2,
    new_size: Vec2,
    target_is_parent: bool,
    owner_is_parent: bool,
    /// Owner is constructing and contains the target: measure design sizes.
    use_design: bool,
    owner_design: Vec2,
    target_design: Vec2,
}

pub struct RelationItem {
    owner: usize,
    target: Cell<Option<usize>>,
    defs: RefCell<Vec<RelationDef>>,
    target_position: Cell<Vec2>,
    target_size: Cell<Vec2>,
    /// Shared by every item of the same owner.
    handling: Rc<Cell<bool>>,
    cleanup: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl RelationItem {
    pub(crate) fn new(owner: usize, handling: Rc<Cell<bool>>) -> Rc<Self> {
        Rc::new(Self {
            owner,
            target: Cell::new(None),
            defs: RefCell::new(Vec::new()),
            target_position: Cell::new(Vec2::ZERO),
            target_size: Cell::new(Vec2::ZERO),
            handling,
            cleanup: RefCell::new(None),
        })
    }

    pub fn owner(&self) -> usize {
        self.owner
    }

    pub fn target(&self) -> Option<usize> {
        self.target.get()
    }

    /// Wire (or re-wire) the item to a target and snapshot it.
    pub fn set_target(self: &Rc<Self>, target: Option<usize>) {
        if self.target.get() == target {
            return;
        }
        self.release_target();
        self.target.set(target);

        let Some(target) = target else { return };

        let mut kinds = ChangeFlags::SIZE;
        if node::parent(self.owner) != Some(target) {
            kinds |= ChangeFlags::POSITION;
        }
        let listener: Rc<dyn NodeListener> = Rc::clone(self) as Rc<dyn NodeListener>;
        let cleanup = events::subscribe(target, kinds, listener);
        *self.cleanup.borrow_mut() = Some(Box::new(cleanup));

        self.target_position.set(node::position(target));
        self.target_size.set(node::size(target));
    }

    fn release_target(&self) {
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }

    // =========================================================================
    // Defs
    // =========================================================================

    /// Register a relation. Re-adding an existing kind is a no-op.
    pub fn add(&self, relation: RelationType, percent: bool) {
        let mut defs = self.defs.borrow_mut();
        for &kind in relation.expand() {
            if defs.iter().any(|def| def.relation == kind) {
                continue;
            }
            defs.push(RelationDef::new(kind, percent));
        }
    }

    /// Unregister a relation. Returns false when no def of that kind existed.
    pub fn remove(&self, relation: RelationType) -> bool {
        let kinds = relation.expand();
        let mut defs = self.defs.borrow_mut();
        let before = defs.len();
        defs.retain(|def| !kinds.contains(&def.relation));
        defs.len() != before
    }

    pub fn contains(&self, relation: RelationType) -> bool {
        let kinds = relation.expand();
        let defs = self.defs.borrow();
        kinds.iter().all(|kind| defs.iter().any(|def| def.relation == *kind))
    }

    pub fn defs(&self) -> Vec<RelationDef> {
        self.defs.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.borrow().is_empty()
    }

    /// Replace this item's defs with a copy of `source`'s.
    pub fn copy_from(&self, source: &RelationItem) {
        let defs = source.defs();
        *self.defs.borrow_mut() = defs;
    }

    /// Unsubscribe from the target and drop all defs. Never touches the target.
    pub fn dispose(&self) {
        self.release_target();
        self.target.set(None);
        self.defs.borrow_mut().clear();
    }

    // =========================================================================
    // Owner Size Changes
    // =========================================================================

    /// Position offset this item applies when the owner's size changes by `delta`.
    pub(crate) fn self_size_shift(&self, delta: Vec2) -> Vec2 {
        let mut shift = Vec2::ZERO;
        for def in self.defs.borrow().iter().filter(|def| def.affect_by_self_size) {
            if let RelationShape::Anchor { owner, .. } = def.relation.shape() {
                let axis = def.relation.axis();
                shift.set(axis, shift.get(axis) - delta.get(axis) * owner.factor());
            }
        }
        shift
    }

    /// Keep center/trailing anchors in place when the owner itself is resized.
    pub fn apply_on_self_size_changed(&self, delta: Vec2) {
        let shift = self.self_size_shift(delta);
        if shift.is_zero() {
            return;
        }

        let before = node::position(self.owner);
        node::set_position(self.owner, before + shift);
        let moved = node::position(self.owner) - before;
        if !moved.is_zero() {
            self.notify_moved(moved);
        }
    }

    // =========================================================================
    // Target Position Changes
    // =========================================================================

    fn on_target_position_changed(&self, target: usize) {
        let current = node::position(target);
        if self.handling.get() {
            self.target_position.set(current);
            return;
        }

        let delta = current - self.target_position.get();
        self.target_position.set(current);
        if delta.is_zero() {
            return;
        }

        tracing::trace!(owner = self.owner, target_node = target, dx = delta.x, dy = delta.y, "target moved");

        let mut rect = self.owner_rect();
        for def in self.defs() {
            self.apply_on_position_changed(&def, delta, &mut rect);
        }
        self.commit(rect);
    }

    fn apply_on_position_changed(&self, def: &RelationDef, delta: Vec2, rect: &mut OwnerRect) {
        let axis = def.relation.axis();
        let d = delta.get(axis);
        match def.relation.shape() {
            RelationShape::Anchor { .. } => {
                rect.position.set(axis, rect.position.get(axis) + d);
            }
            RelationShape::Size => {}
            RelationShape::Extension { owner: Edge::Leading, .. } => {
                rect.position.set(axis, rect.position.get(axis) + d);
                let extent = rect.size.get(axis) - d;
                self.resize_local(rect, axis, extent);
            }
            RelationShape::Extension { .. } => {
                let extent = rect.size.get(axis) + d;
                self.resize_local(rect, axis, extent);
            }
        }
    }

    // =========================================================================
    // Target Size Changes
    // =========================================================================

    fn on_target_size_changed(&self, target: usize) {
        let current = node::size(target);
        if self.handling.get() {
            self.target_size.set(current);
            return;
        }

        let old_size = self.target_size.get();
        self.target_size.set(current);

        let target_is_parent = node::parent(self.owner) == Some(target);
        let owner_is_parent = node::parent(target) == Some(self.owner);
        let change = SizeChange {
            origin: if target_is_parent { Vec2::ZERO } else { node::position(target) },
            old_size,
            new_size: current,
            target_is_parent,
            owner_is_parent,
            use_design: owner_is_parent && registry::is_constructing(self.owner),
            owner_design: node::design_size(self.owner),
            target_design: node::design_size(target),
        };

        tracing::trace!(
            owner = self.owner,
            target_node = target,
            old_w = old_size.x,
            old_h = old_size.y,
            new_w = current.x,
            new_h = current.y,
            "target resized"
        );

        let mut rect = self.owner_rect();
        for def in self.defs() {
            self.apply_on_size_changed(&def, &change, &mut rect);
        }
        self.commit(rect);
    }

    fn apply_on_size_changed(&self, def: &RelationDef, change: &SizeChange, rect: &mut OwnerRect) {
        let axis = def.relation.axis();
        let origin = change.origin.get(axis);
        let old = change.old_size.get(axis);
        let new = change.new_size.get(axis);
        let ratio = if def.percent && old != 0.0 { new / old } else { 1.0 };
        let pos = rect.position.get(axis);
        let extent = rect.size.get(axis);

        match def.relation.shape() {
            // Target leading edge does not move on resize; only a percent
            // offset inside the parent rescales.
            RelationShape::Anchor { owner: Edge::Leading, target: Edge::Leading } => {
                if def.percent && change.target_is_parent {
                    rect.position.set(axis, origin + (pos - origin) * ratio);
                }
            }
            RelationShape::Anchor { owner, target } => {
                let edge = pos + extent * owner.factor();
                let offset = (edge - (origin + old * target.factor())) * ratio;
                let edge = origin + new * target.factor() + offset;
                rect.position.set(axis, edge - extent * owner.factor());
            }
            RelationShape::Size => {
                let offset = if change.use_design {
                    change.owner_design.get(axis) - change.target_design.get(axis)
                } else {
                    extent - old
                };
                self.resize_local(rect, axis, new + offset * ratio);
            }
            RelationShape::Extension { owner: Edge::Leading, target } => {
                let offset = (pos - (origin + old * target.factor())) * ratio;
                let leading = origin + new * target.factor() + offset;
                rect.position.set(axis, leading);
                self.resize_local(rect, axis, extent - (leading - pos));
            }
            RelationShape::Extension { target, .. } => {
                if change.owner_is_parent {
                    // Target lives in the owner's space: the owner's trailing
                    // edge there is its extent, with no position offset.
                    let (own, base) = if change.use_design {
                        (change.owner_design.get(axis), change.target_design.get(axis))
                    } else {
                        (extent, old)
                    };
                    let offset = (own - (origin + base * target.factor())) * ratio;
                    self.resize_local(rect, axis, origin + new * target.factor() + offset);
                } else {
                    let offset = (pos + extent - (origin + old * target.factor())) * ratio;
                    let trailing = origin + new * target.factor() + offset;
                    self.resize_local(rect, axis, trailing - pos);
                }
            }
        }
    }

    // =========================================================================
    // Commit & Hooks
    // =========================================================================

    fn owner_rect(&self) -> OwnerRect {
        OwnerRect {
            position: node::position(self.owner),
            size: node::size(self.owner),
        }
    }

    /// Change the working extent on one axis, folding in the owner's
    /// self-size compensation as if it were resized right now.
    fn resize_local(&self, rect: &mut OwnerRect, axis: Axis, extent: f32) {
        let mut size = rect.size;
        size.set(axis, extent);
        let delta = size - rect.size;
        if delta.is_zero() {
            return;
        }
        rect.position += super::self_size_shift(self.owner, delta);
        rect.size = size;
    }

    /// Write the working rect to the owner once, then report the movement.
    fn commit(&self, rect: OwnerRect) {
        let before = self.owner_rect();
        if before == rect {
            return;
        }

        // `rect` already carries the self-size compensation.
        let was_handling = self.handling.replace(true);
        node::write_rect(self.owner, rect.position, rect.size);
        self.handling.set(was_handling);

        let moved = node::position(self.owner) - before.position;
        if !moved.is_zero() {
            self.notify_moved(moved);
        }
        let resized = node::size(self.owner) - before.size;
        if !resized.is_zero() {
            self.notify_resized(resized);
        }
    }

    fn notify_moved(&self, delta: Vec2) {
        gear::update_from_relations(self.owner, GearKind::Xy, delta);
        if let (Some(parent), Some(id)) = (node::parent(self.owner), node::id(self.owner)) {
            transition::update_from_relations(parent, &id, delta);
        }
    }

    fn notify_resized(&self, delta: Vec2) {
        gear::update_from_relations(self.owner, GearKind::Size, delta);
    }
}

impl NodeListener for RelationItem {
    fn position_changed(&self, node: usize, _old: Vec2) {
        if self.target.get() == Some(node) {
            self.on_target_position_changed(node);
        }
    }

    fn size_changed(&self, node: usize, _old: Vec2) {
        if self.target.get() == Some(node) {
            self.on_target_size_changed(node);
        }
    }
}
