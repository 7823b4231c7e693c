//! Relations - Per-owner relation collections.
//!
//! Every owner node has at most one relation collection, holding one
//! [`RelationItem`] per distinct target. Collections live in a thread-local
//! map keyed by owner index, in the same arena style as the node arrays.
//!
//! # Propagation
//!
//! Items react to their target's change signals directly. The collection
//! only fans out owner-side events (the owner's own size changed) and
//! guards against re-entrant propagation: while any item of an owner is
//! committing, further notifications reaching that owner only refresh
//! their snapshots. This bounds relation cycles to one pass.
//!
//! # Borrowing
//!
//! The registry borrow is never held while items run. Item lists are
//! cloned out (as `Rc`s) first.
//!
//! # Example
//!
//! ```ignore
//! use spark_relations::{relations, RelationType};
//!
//! relations::add(button, panel, RelationType::RightRight, false);
//! relations::add(button, panel, RelationType::Width, true);
//! ```

mod item;
pub mod parse;

pub use item::RelationItem;
pub use parse::{parse_relation_entries, parse_side_pairs, RelationEntry};

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::engine::{node, registry};
use crate::error::{RelationError, Result};
use crate::types::{RelationType, Vec2};

/// All relations of one owner.
struct Relations {
    items: Vec<Rc<RelationItem>>,
    handling: Rc<Cell<bool>>,
}

impl Relations {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            handling: Rc::new(Cell::new(false)),
        }
    }
}

thread_local! {
    static RELATIONS: RefCell<HashMap<usize, Relations>> = RefCell::new(HashMap::new());
}

fn items_of(owner: usize) -> Vec<Rc<RelationItem>> {
    RELATIONS.with(|relations| {
        relations
            .borrow()
            .get(&owner)
            .map(|rel| rel.items.clone())
            .unwrap_or_default()
    })
}

fn find_item(owner: usize, target: usize) -> Option<Rc<RelationItem>> {
    items_of(owner)
        .into_iter()
        .find(|item| item.target() == Some(target))
}

/// Get the item for `target`, creating (and wiring) it when absent.
fn item_for(owner: usize, target: usize) -> Rc<RelationItem> {
    if let Some(item) = find_item(owner, target) {
        return item;
    }

    let handling = RELATIONS.with(|relations| {
        let mut relations = relations.borrow_mut();
        Rc::clone(&relations.entry(owner).or_insert_with(Relations::new).handling)
    });
    let item = RelationItem::new(owner, handling);
    item.set_target(Some(target));

    RELATIONS.with(|relations| {
        relations
            .borrow_mut()
            .entry(owner)
            .or_insert_with(Relations::new)
            .items
            .push(Rc::clone(&item));
    });
    item
}

/// Detach an item from its owner's collection, then dispose it.
fn drop_item(owner: usize, target: usize) {
    let removed = RELATIONS.with(|relations| {
        let mut relations = relations.borrow_mut();
        let rel = relations.get_mut(&owner)?;
        let position = rel.items.iter().position(|item| item.target() == Some(target))?;
        let item = rel.items.remove(position);
        if rel.items.is_empty() {
            relations.remove(&owner);
        }
        Some(item)
    });
    if let Some(item) = removed {
        item.dispose();
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Relate `owner` to `target`. Re-adding an existing kind is a no-op.
pub fn add(owner: usize, target: usize, relation: RelationType, percent: bool) {
    if !registry::is_allocated(owner) || !registry::is_allocated(target) {
        return;
    }
    let item = item_for(owner, target);
    item.add(relation, percent);
    tracing::debug!(
        owner,
        target_node = target,
        relation = relation.as_side_pair(),
        percent,
        "relation added"
    );
}

/// Remove a relation. Removing the last kind for a target disposes that item.
///
/// Returns whether any def was removed.
pub fn remove(owner: usize, target: usize, relation: RelationType) -> bool {
    let Some(item) = find_item(owner, target) else {
        return false;
    };
    if !item.remove(relation) {
        return false;
    }
    if item.is_empty() {
        drop_item(owner, target);
    }
    tracing::debug!(owner, target_node = target, relation = relation.as_side_pair(), "relation removed");
    true
}

/// Check whether `owner` has any relation to `target`.
pub fn contains(owner: usize, target: usize) -> bool {
    find_item(owner, target).is_some()
}

/// Items of `owner`, in registration order.
pub fn items(owner: usize) -> Vec<Rc<RelationItem>> {
    items_of(owner)
}

/// Number of distinct targets `owner` is related to.
pub fn item_count(owner: usize) -> usize {
    RELATIONS.with(|relations| relations.borrow().get(&owner).map_or(0, |rel| rel.items.len()))
}

/// Drop every relation of `owner` to `target`.
pub fn clear_for(owner: usize, target: usize) {
    drop_item(owner, target);
}

/// Drop every relation of `owner`.
pub fn clear_all(owner: usize) {
    let removed = RELATIONS.with(|relations| relations.borrow_mut().remove(&owner));
    if let Some(rel) = removed {
        for item in rel.items {
            item.dispose();
        }
    }
}

/// Dispose the owner's collection.
pub fn dispose(owner: usize) {
    clear_all(owner);
}

/// Replace `owner`'s relations with copies of `source`'s, same targets.
pub fn copy_from(owner: usize, source: usize) {
    clear_all(owner);
    for source_item in items_of(source) {
        let Some(target) = source_item.target() else {
            continue;
        };
        let item = item_for(owner, target);
        item.copy_from(&source_item);
    }
}

/// Fan the owner's own size change out to its items.
///
/// Called by [`node::set_size`] after the new size is written.
pub(crate) fn on_owner_size_changed(owner: usize, delta: Vec2) {
    for item in items_of(owner) {
        item.apply_on_self_size_changed(delta);
    }
}

/// Total position offset the owner's items apply for a self-size `delta`.
pub(crate) fn self_size_shift(owner: usize, delta: Vec2) -> Vec2 {
    items_of(owner)
        .iter()
        .fold(Vec2::ZERO, |shift, item| shift + item.self_size_shift(delta))
}

/// Drop everything involving a released node: its own relations and every
/// item on other owners that targets it.
pub(crate) fn release_node(index: usize) {
    clear_all(index);
    let owners: Vec<usize> = RELATIONS.with(|relations| {
        relations
            .borrow()
            .iter()
            .filter(|(_, rel)| rel.items.iter().any(|item| item.target() == Some(index)))
            .map(|(&owner, _)| owner)
            .collect()
    });
    for owner in owners {
        drop_item(owner, index);
    }
}

// =============================================================================
// Setup
// =============================================================================

/// Resolve an authored target id relative to `owner`.
fn resolve_target(owner: usize, target: &str) -> Option<usize> {
    let parent = node::parent(owner);
    if target.is_empty() {
        return parent;
    }
    match parent {
        Some(parent) => registry::find_child(parent, target)
            .filter(|&index| index != owner)
            .or_else(|| registry::find_child(owner, target)),
        None => registry::find_child(owner, target),
    }
}

/// Wire authored entries onto `owner`.
///
/// Every entry is parsed and resolved before anything is wired, so an
/// error leaves the owner's relations untouched.
pub fn setup(owner: usize, entries: &[RelationEntry]) -> Result<()> {
    let mut resolved = Vec::with_capacity(entries.len());
    for entry in entries {
        let pairs = parse_side_pairs(&entry.side_pair)?;
        let target = resolve_target(owner, &entry.target).ok_or_else(|| {
            RelationError::UnresolvedTarget {
                owner,
                target: entry.target.clone(),
            }
        })?;
        resolved.push((target, pairs));
    }

    for (target, pairs) in resolved {
        for (relation, percent) in pairs {
            add(owner, target, relation, percent);
        }
    }
    tracing::debug!(owner, entries = entries.len(), "relations set up");
    Ok(())
}

/// Parse entry lines and wire them onto `owner`.
pub fn setup_from_str(owner: usize, text: &str) -> Result<()> {
    let entries = parse_relation_entries(text)?;
    setup(owner, &entries)
}

/// Reset all relation state (for testing).
pub fn reset_relations() {
    let all = RELATIONS.with(|relations| std::mem::take(&mut *relations.borrow_mut()));
    for (_, rel) in all {
        for item in rel.items {
            item.dispose();
        }
    }
}
