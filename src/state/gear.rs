//! Gears - Per-page recorded geometry driven by a controller.
//!
//! A gear remembers one value (position or size) of its owner for every
//! page of a [`Controller`]. While a page is selected, user edits to the
//! owner are recorded for that page. Selecting another page applies the
//! value stored for it, or the default captured when the gear was attached.
//!
//! Automatic moves made by relations are not user edits. Relation items
//! report them through [`update_from_relations`], which shifts every
//! stored value by the same delta so each page keeps its layout intent.
//!
//! # Locking
//!
//! Applying a stored value writes the owner's geometry, which would
//! otherwise be recorded straight back. The owner's gears are locked
//! around every apply (see [`with_gears_locked`]); locked gears do not
//! record. Relation deltas are still folded in.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use spark_signals::effect;

use super::controller::Controller;
use crate::engine::events::{self, NodeListener};
use crate::engine::{node, registry};
use crate::types::{ChangeFlags, Vec2};

/// What a gear records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GearKind {
    /// Position.
    Xy,
    /// Size.
    Size,
}

impl GearKind {
    fn flags(self) -> ChangeFlags {
        match self {
            GearKind::Xy => ChangeFlags::POSITION,
            GearKind::Size => ChangeFlags::SIZE,
        }
    }

    fn read(self, owner: usize) -> Vec2 {
        match self {
            GearKind::Xy => node::position(owner),
            GearKind::Size => node::size(owner),
        }
    }

    fn write(self, owner: usize, value: Vec2) {
        match self {
            GearKind::Xy => node::set_position(owner, value),
            GearKind::Size => node::set_size(owner, value),
        }
    }
}

#[derive(Debug, Default)]
struct GearValues {
    default: Vec2,
    pages: HashMap<usize, Vec2>,
}

pub struct Gear {
    owner: usize,
    kind: GearKind,
    controller: Controller,
    values: RefCell<GearValues>,
    cleanups: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl Gear {
    pub fn owner(&self) -> usize {
        self.owner
    }

    pub fn kind(&self) -> GearKind {
        self.kind
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Value stored for `page`, falling back to the default.
    pub fn value(&self, page: usize) -> Vec2 {
        let values = self.values.borrow();
        values.pages.get(&page).copied().unwrap_or(values.default)
    }

    pub fn default_value(&self) -> Vec2 {
        self.values.borrow().default
    }

    /// Store the owner's current value for the selected page.
    fn record(&self) {
        let value = self.kind.read(self.owner);
        let page = self.controller.selected_page();
        self.values.borrow_mut().pages.insert(page, value);
    }

    /// Write the value stored for `page` onto the owner.
    fn apply(&self, page: usize) {
        let value = self.value(page);
        with_gears_locked(self.owner, || self.kind.write(self.owner, value));
    }

    fn shift(&self, delta: Vec2) {
        let mut values = self.values.borrow_mut();
        values.default += delta;
        for value in values.pages.values_mut() {
            *value += delta;
        }
    }

    fn stop(&self) {
        let cleanups = std::mem::take(&mut *self.cleanups.borrow_mut());
        for cleanup in cleanups {
            cleanup();
        }
    }
}

impl NodeListener for Gear {
    fn position_changed(&self, _node: usize, _old: Vec2) {
        if self.kind == GearKind::Xy && can_record(self.owner) {
            self.record();
        }
    }

    fn size_changed(&self, _node: usize, _old: Vec2) {
        if self.kind == GearKind::Size && can_record(self.owner) {
            self.record();
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

thread_local! {
    static GEARS: RefCell<HashMap<usize, Vec<Rc<Gear>>>> = RefCell::new(HashMap::new());
    static LOCKED: RefCell<HashMap<usize, usize>> = RefCell::new(HashMap::new());
}

fn can_record(owner: usize) -> bool {
    !is_locked(owner) && !registry::is_constructing(owner)
}

fn gears_of(owner: usize) -> Vec<Rc<Gear>> {
    GEARS.with(|gears| gears.borrow().get(&owner).cloned().unwrap_or_default())
}

/// Attach a gear to `owner`, replacing any gear of the same kind.
///
/// The owner's current value becomes the default for every page.
pub fn attach_gear(owner: usize, kind: GearKind, controller: &Controller) -> Rc<Gear> {
    detach_gear(owner, kind);

    let gear = Rc::new(Gear {
        owner,
        kind,
        controller: controller.clone(),
        values: RefCell::new(GearValues {
            default: kind.read(owner),
            pages: HashMap::new(),
        }),
        cleanups: RefCell::new(Vec::new()),
    });

    let listener: Rc<dyn NodeListener> = Rc::clone(&gear) as Rc<dyn NodeListener>;
    let unsubscribe = events::subscribe(owner, kind.flags(), listener);

    let weak: Weak<Gear> = Rc::downgrade(&gear);
    let selected = controller.selected_signal();
    let stop = effect(move || {
        let page = selected.get();
        if let Some(gear) = weak.upgrade() {
            gear.apply(page);
        }
    });

    gear.cleanups
        .borrow_mut()
        .extend([Box::new(unsubscribe) as Box<dyn FnOnce()>, Box::new(stop)]);

    GEARS.with(|gears| {
        gears.borrow_mut().entry(owner).or_default().push(Rc::clone(&gear));
    });
    tracing::debug!(owner, ?kind, controller = controller.name(), "gear attached");
    gear
}

/// Get the owner's gear of `kind`.
pub fn get_gear(owner: usize, kind: GearKind) -> Option<Rc<Gear>> {
    gears_of(owner).into_iter().find(|gear| gear.kind == kind)
}

/// Value recorded for `page` by the owner's gear of `kind`.
pub fn gear_value(owner: usize, kind: GearKind, page: usize) -> Option<Vec2> {
    get_gear(owner, kind).map(|gear| gear.value(page))
}

fn detach_gear(owner: usize, kind: GearKind) {
    let removed = GEARS.with(|gears| {
        let mut gears = gears.borrow_mut();
        let list = gears.get_mut(&owner)?;
        let position = list.iter().position(|gear| gear.kind == kind)?;
        let gear = list.remove(position);
        if list.is_empty() {
            gears.remove(&owner);
        }
        Some(gear)
    });
    if let Some(gear) = removed {
        gear.stop();
    }
}

/// Detach every gear of `owner`.
pub fn detach_gears(owner: usize) {
    let removed = GEARS.with(|gears| gears.borrow_mut().remove(&owner));
    for gear in removed.into_iter().flatten() {
        gear.stop();
    }
    LOCKED.with(|locked| {
        locked.borrow_mut().remove(&owner);
    });
}

/// Run `f` with the owner's gears locked. Nested locks are counted.
pub fn with_gears_locked<R>(owner: usize, f: impl FnOnce() -> R) -> R {
    LOCKED.with(|locked| {
        *locked.borrow_mut().entry(owner).or_insert(0) += 1;
    });
    let result = f();
    LOCKED.with(|locked| {
        let mut locked = locked.borrow_mut();
        if let Some(count) = locked.get_mut(&owner) {
            *count -= 1;
            if *count == 0 {
                locked.remove(&owner);
            }
        }
    });
    result
}

/// Whether the owner's gears are locked.
pub fn is_locked(owner: usize) -> bool {
    LOCKED.with(|locked| locked.borrow().contains_key(&owner))
}

/// Fold an automatic relation move into the owner's gear of `kind`.
///
/// Every stored page value and the default shift by `delta`, then the
/// selected page is re-recorded from the owner's actual value. This also
/// runs while the owner's gears are locked: a size applied from a page can
/// make relations move the owner, and that move belongs to every page.
pub fn update_from_relations(owner: usize, kind: GearKind, delta: Vec2) {
    if delta.is_zero() {
        return;
    }
    let Some(gear) = get_gear(owner, kind) else {
        return;
    };
    gear.shift(delta);
    gear.record();
    tracing::trace!(owner, ?kind, dx = delta.x, dy = delta.y, "gear shifted by relations");
}

/// Reset gear state (for testing).
pub fn reset_gears() {
    let all = GEARS.with(|gears| std::mem::take(&mut *gears.borrow_mut()));
    for gear in all.into_values().flatten() {
        gear.stop();
    }
    LOCKED.with(|locked| locked.borrow_mut().clear());
}
