//! End-to-end relation propagation scenarios.

use std::cell::Cell;
use std::rc::Rc;

use spark_relations::engine::{events, node};
use spark_relations::state::{gear, transition};
use spark_relations::{
    create_node, relations, release_index, reset_engine, with_construction, ChangeFlags,
    Controller, GearKind, NodeListener, NodeProps, RelationError, RelationType, Transition,
    TransitionItem, TweenConfig, Vec2,
};

fn assert_close(actual: Vec2, expected: Vec2) {
    assert!(
        (actual.x - expected.x).abs() < 1e-4 && (actual.y - expected.y).abs() < 1e-4,
        "expected {expected:?}, got {actual:?}"
    );
}

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

fn rect(id: &str, parent: Option<usize>, x: f32, y: f32, w: f32, h: f32) -> usize {
    create_node(NodeProps {
        id: Some(id.into()),
        parent,
        position: Vec2::new(x, y),
        size: Vec2::new(w, h),
    })
}

// =============================================================================
// Core properties
// =============================================================================

#[test]
fn adding_twice_applies_once() {
    reset_engine();
    let panel = rect("panel", None, 0.0, 0.0, 300.0, 300.0);
    let target = rect("target", Some(panel), 0.0, 0.0, 50.0, 50.0);
    let owner = rect("owner", Some(panel), 0.0, 60.0, 50.0, 50.0);

    relations::add(owner, target, RelationType::LeftLeft, false);
    relations::add(owner, target, RelationType::LeftLeft, false);
    assert_eq!(relations::items(owner)[0].defs().len(), 1);

    node::set_position(target, Vec2::new(10.0, 0.0));
    assert_close(node::position(owner), Vec2::new(10.0, 60.0));
}

#[test]
fn rigid_follow_keeps_offset() {
    reset_engine();
    let panel = rect("panel", None, 0.0, 0.0, 500.0, 500.0);
    let target = rect("target", Some(panel), 0.0, 0.0, 100.0, 50.0);
    let owner = rect("owner", Some(panel), 110.0, 0.0, 30.0, 30.0);
    relations::add(owner, target, RelationType::LeftRight, false);

    node::set_position(target, Vec2::new(20.0, 0.0));
    assert_close(node::position(owner), Vec2::new(130.0, 0.0));

    node::set_size(target, Vec2::new(150.0, 50.0));
    // Left edge stays 10 past the target's right edge.
    assert_close(node::position(owner), Vec2::new(180.0, 0.0));
    assert_close(node::size(owner), Vec2::new(30.0, 30.0));
}

#[test]
fn percent_scales_offset_and_size() {
    reset_engine();
    let parent = rect("parent", None, 0.0, 0.0, 200.0, 100.0);
    let owner = rect("owner", Some(parent), 50.0, 0.0, 100.0, 20.0);
    relations::add(owner, parent, RelationType::LeftLeft, true);
    relations::add(owner, parent, RelationType::Width, true);

    node::set_size(parent, Vec2::new(400.0, 100.0));
    assert_close(node::position(owner), Vec2::new(100.0, 0.0));
    assert_close(node::size(owner), Vec2::new(200.0, 20.0));
}

#[test]
fn percent_with_zero_old_size_does_not_scale() {
    reset_engine();
    let parent = rect("parent", None, 0.0, 0.0, 0.0, 100.0);
    let owner = rect("owner", Some(parent), 0.0, 0.0, 10.0, 20.0);
    relations::add(owner, parent, RelationType::Width, true);

    node::set_size(parent, Vec2::new(50.0, 100.0));
    assert_close(node::size(owner), Vec2::new(60.0, 20.0));
}

#[test]
fn self_size_change_keeps_anchor() {
    reset_engine();
    let parent = rect("parent", None, 0.0, 0.0, 100.0, 100.0);
    let right = rect("right", Some(parent), 80.0, 0.0, 20.0, 20.0);
    let center = rect("center", Some(parent), 40.0, 0.0, 20.0, 20.0);
    relations::add(right, parent, RelationType::RightRight, false);
    relations::add(center, parent, RelationType::CenterCenter, false);

    node::set_size(right, Vec2::new(40.0, 20.0));
    assert_close(node::position(right), Vec2::new(60.0, 0.0));

    node::set_size(center, Vec2::new(30.0, 20.0));
    assert_close(node::position(center), Vec2::new(35.0, 0.0));
}

#[test]
fn trailing_extension_keeps_position() {
    reset_engine();
    let panel = rect("panel", None, 0.0, 0.0, 500.0, 500.0);
    let target = rect("target", Some(panel), 0.0, 0.0, 100.0, 10.0);
    let owner = rect("owner", Some(panel), 20.0, 20.0, 50.0, 10.0);
    relations::add(owner, target, RelationType::RightExtRight, false);

    node::set_position(target, Vec2::new(10.0, 0.0));
    assert_close(node::position(owner), Vec2::new(20.0, 20.0));
    assert_close(node::size(owner), Vec2::new(60.0, 10.0));

    node::set_size(target, Vec2::new(150.0, 10.0));
    assert_close(node::position(owner), Vec2::new(20.0, 20.0));
    assert_close(node::size(owner), Vec2::new(110.0, 10.0));

    // Moving the owner's own leading edge is not undone.
    node::set_position(owner, Vec2::new(30.0, 20.0));
    node::set_size(target, Vec2::new(160.0, 10.0));
    assert_close(node::position(owner), Vec2::new(30.0, 20.0));
    assert_close(node::size(owner), Vec2::new(120.0, 10.0));
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn scenario_right_anchor_follows_parent_resize() {
    reset_engine();
    let parent = rect("t", None, 0.0, 0.0, 100.0, 100.0);
    let owner = rect("o", Some(parent), 80.0, 0.0, 20.0, 20.0);
    relations::add(owner, parent, RelationType::RightRight, false);

    node::set_size(parent, Vec2::new(200.0, 100.0));
    assert_close(node::position(owner), Vec2::new(180.0, 0.0));
    assert_close(node::size(owner), Vec2::new(20.0, 20.0));
}

#[test]
fn scenario_width_follows_parent() {
    reset_engine();
    let parent = rect("t", None, 0.0, 0.0, 300.0, 100.0);
    let owner = rect("o", Some(parent), 0.0, 0.0, 300.0, 20.0);
    relations::add(owner, parent, RelationType::Width, false);

    node::set_size(parent, Vec2::new(400.0, 100.0));
    assert_close(node::size(owner), Vec2::new(400.0, 20.0));
    assert_close(node::position(owner), Vec2::ZERO);
}

#[test]
fn scenario_leading_extension_keeps_trailing_edge() {
    reset_engine();
    let panel = rect("panel", None, 0.0, 0.0, 500.0, 500.0);
    let target = rect("t", Some(panel), 50.0, 0.0, 10.0, 10.0);
    let owner = rect("o", Some(panel), 60.0, 20.0, 100.0, 10.0);
    relations::add(owner, target, RelationType::LeftExtRight, false);

    node::set_position(target, Vec2::new(70.0, 0.0));
    assert_close(node::position(owner), Vec2::new(80.0, 20.0));
    assert_close(node::size(owner), Vec2::new(80.0, 10.0));
}

#[test]
fn percent_scales_trailing_and_center_anchors() {
    reset_engine();
    let parent = rect("parent", None, 0.0, 0.0, 200.0, 100.0);
    let right = rect("right", Some(parent), 150.0, 0.0, 20.0, 20.0);
    let center = rect("center", Some(parent), 110.0, 30.0, 20.0, 20.0);
    relations::add(right, parent, RelationType::RightRight, true);
    relations::add(center, parent, RelationType::CenterCenter, true);

    node::set_size(parent, Vec2::new(400.0, 100.0));
    // Right edge was 30 inside, now 60 inside.
    assert_close(node::position(right), Vec2::new(320.0, 0.0));
    // Center was 20 past the middle, now 40 past it.
    assert_close(node::position(center), Vec2::new(230.0, 30.0));
    assert_close(node::size(center), Vec2::new(20.0, 20.0));
}

#[test]
fn vertical_leading_extension_follows_bottom_edge() {
    reset_engine();
    let panel = rect("panel", None, 0.0, 0.0, 500.0, 500.0);
    let target = rect("t", Some(panel), 0.0, 0.0, 10.0, 50.0);
    let owner = rect("o", Some(panel), 0.0, 60.0, 10.0, 100.0);
    relations::add(owner, target, RelationType::TopExtBottom, false);

    node::set_position(target, Vec2::new(0.0, 20.0));
    assert_close(node::position(owner), Vec2::new(0.0, 80.0));
    assert_close(node::size(owner), Vec2::new(10.0, 80.0));

    node::set_size(target, Vec2::new(10.0, 70.0));
    assert_close(node::position(owner), Vec2::new(0.0, 100.0));
    assert_close(node::size(owner), Vec2::new(10.0, 60.0));
}

#[test]
fn vertical_trailing_extension_keeps_top() {
    reset_engine();
    let panel = rect("panel", None, 0.0, 0.0, 500.0, 500.0);
    let target = rect("t", Some(panel), 0.0, 0.0, 10.0, 50.0);
    let owner = rect("o", Some(panel), 20.0, 10.0, 10.0, 30.0);
    relations::add(owner, target, RelationType::BottomExtBottom, false);

    node::set_position(target, Vec2::new(0.0, 20.0));
    assert_close(node::position(owner), Vec2::new(20.0, 10.0));
    assert_close(node::size(owner), Vec2::new(10.0, 50.0));

    node::set_size(target, Vec2::new(10.0, 70.0));
    assert_close(node::position(owner), Vec2::new(20.0, 10.0));
    assert_close(node::size(owner), Vec2::new(10.0, 70.0));
}

#[test]
fn trailing_extension_to_own_child() {
    reset_engine();
    let composite = rect("composite", None, 0.0, 0.0, 200.0, 50.0);
    let label = with_construction(composite, || rect("label", None, 10.0, 0.0, 150.0, 20.0));
    relations::add(composite, label, RelationType::RightExtRight, false);
    node::set_size(composite, Vec2::new(300.0, 50.0));
    assert_close(node::position(composite), Vec2::ZERO);

    // While constructing, the design-time margin (40) past the label is kept.
    with_construction(composite, || node::set_size(label, Vec2::new(180.0, 20.0)));
    assert_close(node::size(composite), Vec2::new(230.0, 50.0));
    assert_close(node::position(composite), Vec2::ZERO);

    // Afterwards, the live margin (40) is kept.
    node::set_size(label, Vec2::new(200.0, 20.0));
    assert_close(node::size(composite), Vec2::new(250.0, 50.0));
    assert_close(node::position(composite), Vec2::ZERO);
}

#[test]
fn percent_leading_extension_keeps_trailing_edge() {
    reset_engine();
    let panel = rect("panel", None, 0.0, 0.0, 500.0, 500.0);
    let target = rect("t", Some(panel), 0.0, 0.0, 100.0, 10.0);
    let owner = rect("o", Some(panel), 110.0, 20.0, 200.0, 10.0);
    relations::add(owner, target, RelationType::LeftExtRight, true);

    node::set_size(target, Vec2::new(200.0, 10.0));
    // Gap to the target's right edge doubles from 10 to 20.
    assert_close(node::position(owner), Vec2::new(220.0, 20.0));
    assert_close(node::size(owner), Vec2::new(90.0, 10.0));
}

// =============================================================================
// Notifications
// =============================================================================

fn count_changes(owner: usize) -> (Rc<Counter>, impl FnOnce()) {
    let counter = Rc::new(Counter::default());
    let cleanup = events::subscribe(
        owner,
        ChangeFlags::POSITION | ChangeFlags::SIZE,
        counter.clone(),
    );
    (counter, cleanup)
}

#[test]
fn self_size_compensation_stays_silent() {
    reset_engine();
    let panel = rect("panel", None, 0.0, 0.0, 500.0, 500.0);
    let target = rect("t", Some(panel), 0.0, 0.0, 100.0, 100.0);
    let owner = rect("o", Some(panel), 80.0, 200.0, 20.0, 20.0);
    relations::add(owner, target, RelationType::RightRight, false);
    relations::add(owner, target, RelationType::Width, false);
    let (counter, _cleanup) = count_changes(owner);

    node::set_size(target, Vec2::new(200.0, 100.0));
    // Width grows by 100 and the right edge moves by 100: the left edge stays.
    assert_close(node::position(owner), Vec2::new(80.0, 200.0));
    assert_close(node::size(owner), Vec2::new(120.0, 20.0));
    assert_eq!(counter.moves.get(), 0);
    assert_eq!(counter.resizes.get(), 1);
}

#[test]
fn one_notification_per_target_change() {
    reset_engine();
    let panel = rect("panel", None, 0.0, 0.0, 500.0, 500.0);
    let target = rect("t", Some(panel), 0.0, 0.0, 100.0, 100.0);
    let owner = rect("o", Some(panel), 80.0, 200.0, 20.0, 20.0);
    relations::add(owner, target, RelationType::RightRight, false);
    relations::add(owner, target, RelationType::Height, false);
    let (counter, _cleanup) = count_changes(owner);

    node::set_size(target, Vec2::new(200.0, 200.0));
    assert_close(node::position(owner), Vec2::new(180.0, 200.0));
    assert_close(node::size(owner), Vec2::new(20.0, 120.0));
    assert_eq!(counter.moves.get(), 1);
    assert_eq!(counter.resizes.get(), 1);

    node::set_position(target, Vec2::new(10.0, 0.0));
    assert_close(node::position(owner), Vec2::new(190.0, 200.0));
    assert_eq!(counter.moves.get(), 2);
    assert_eq!(counter.resizes.get(), 1);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn disposed_relations_stop_following() {
    reset_engine();
    let panel = rect("panel", None, 0.0, 0.0, 500.0, 500.0);
    let target = rect("target", Some(panel), 0.0, 0.0, 100.0, 10.0);
    let owner = rect("owner", Some(panel), 0.0, 20.0, 50.0, 10.0);
    relations::add(owner, target, RelationType::LeftLeft, false);
    relations::add(owner, target, RelationType::Width, false);

    relations::dispose(owner);
    assert_eq!(events::listener_count(target), 0);

    node::set_position(target, Vec2::new(40.0, 0.0));
    node::set_size(target, Vec2::new(10.0, 10.0));
    assert_close(node::position(owner), Vec2::new(0.0, 20.0));
    assert_close(node::size(owner), Vec2::new(50.0, 10.0));
    // Disposal never touches the target.
    assert_close(node::position(target), Vec2::new(40.0, 0.0));
}

#[test]
fn releasing_owner_or_target_unwires() {
    reset_engine();
    let panel = rect("panel", None, 0.0, 0.0, 500.0, 500.0);
    let target = rect("target", Some(panel), 0.0, 0.0, 100.0, 10.0);
    let owner = rect("owner", Some(panel), 0.0, 20.0, 50.0, 10.0);
    let other = rect("other", Some(panel), 0.0, 40.0, 50.0, 10.0);
    relations::add(owner, target, RelationType::TopBottom, false);
    relations::add(other, target, RelationType::TopBottom, false);

    release_index(owner);
    assert_eq!(events::listener_count(target), 1);

    release_index(target);
    assert_eq!(relations::item_count(other), 0);
}

// =============================================================================
// Propagation
// =============================================================================

#[test]
fn chained_relations_propagate() {
    reset_engine();
    let parent = rect("parent", None, 0.0, 0.0, 200.0, 100.0);
    let a = rect("a", Some(parent), 150.0, 0.0, 50.0, 20.0);
    let b = rect("b", Some(parent), 100.0, 0.0, 50.0, 20.0);
    relations::add(a, parent, RelationType::RightRight, false);
    relations::add(b, a, RelationType::RightLeft, false);

    node::set_size(parent, Vec2::new(300.0, 100.0));
    assert_close(node::position(a), Vec2::new(250.0, 0.0));
    assert_close(node::position(b), Vec2::new(200.0, 0.0));
}

#[test]
fn relation_cycle_terminates() {
    reset_engine();
    let parent = rect("parent", None, 0.0, 0.0, 500.0, 500.0);
    let a = rect("a", Some(parent), 0.0, 0.0, 10.0, 10.0);
    let b = rect("b", Some(parent), 50.0, 0.0, 10.0, 10.0);
    relations::add(a, b, RelationType::LeftLeft, false);
    relations::add(b, a, RelationType::LeftLeft, false);

    node::set_position(a, Vec2::new(10.0, 0.0));
    assert_close(node::position(b), Vec2::new(60.0, 0.0));
    assert_close(node::position(a), Vec2::new(20.0, 0.0));

    // Snapshots are consistent afterwards: an unrelated resize moves nothing.
    node::set_size(parent, Vec2::new(600.0, 500.0));
    assert_close(node::position(a), Vec2::new(20.0, 0.0));
    assert_close(node::position(b), Vec2::new(60.0, 0.0));
}

// =============================================================================
// Gears & transitions
// =============================================================================

#[test]
fn relation_moves_shift_gear_pages() {
    reset_engine();
    let parent = rect("parent", None, 0.0, 0.0, 100.0, 100.0);
    let owner = rect("o", Some(parent), 80.0, 0.0, 20.0, 20.0);
    relations::add(owner, parent, RelationType::RightRight, false);

    let controller = Controller::new("state", &["a", "b"]);
    gear::attach_gear(owner, GearKind::Xy, &controller);
    controller.select(1);
    node::set_position(owner, Vec2::new(50.0, 0.0));
    controller.select(0);
    assert_close(node::position(owner), Vec2::new(80.0, 0.0));

    node::set_size(parent, Vec2::new(200.0, 100.0));
    assert_close(node::position(owner), Vec2::new(180.0, 0.0));
    assert_eq!(gear::gear_value(owner, GearKind::Xy, 0), Some(Vec2::new(180.0, 0.0)));

    controller.select(1);
    assert_close(node::position(owner), Vec2::new(150.0, 0.0));
}

#[test]
fn relation_moves_shift_transition_keyframes() {
    reset_engine();
    let parent = rect("parent", None, 0.0, 0.0, 100.0, 100.0);
    let owner = rect("o", Some(parent), 80.0, 0.0, 20.0, 20.0);
    relations::add(owner, parent, RelationType::RightRight, false);

    let slide = transition::add_transition(Transition::new(
        "slide",
        parent,
        TweenConfig::default(),
    ));
    slide.add_item(TransitionItem::xy(
        "o",
        0.0,
        1.0,
        Vec2::new(80.0, 0.0),
        Vec2::new(80.0, 50.0),
    ));

    node::set_size(parent, Vec2::new(200.0, 100.0));

    let items = slide.items();
    assert_close(items[0].start, Vec2::new(180.0, 0.0));
    assert_close(items[0].end, Vec2::new(180.0, 50.0));

    slide.play();
    slide.advance(1.0);
    assert_close(node::position(owner), Vec2::new(180.0, 50.0));
}

// =============================================================================
// Setup & construction
// =============================================================================

#[test]
fn setup_from_text() {
    reset_engine();
    let parent = rect("parent", None, 0.0, 0.0, 100.0, 100.0);
    let owner = rect("o", Some(parent), 80.0, 0.0, 20.0, 20.0);

    relations::setup_from_str(owner, "target=; sidePair=right-right,height%").unwrap();
    node::set_size(parent, Vec2::new(200.0, 200.0));

    assert_close(node::position(owner), Vec2::new(180.0, 0.0));
    // Height offset -80 doubles to -160 against the new 200.
    assert_close(node::size(owner), Vec2::new(20.0, 40.0));
}

#[test]
fn setup_rejects_unknown_tokens_and_targets() {
    reset_engine();
    let parent = rect("parent", None, 0.0, 0.0, 100.0, 100.0);
    let owner = rect("o", Some(parent), 0.0, 0.0, 20.0, 20.0);

    assert!(matches!(
        relations::setup_from_str(owner, "target=; sidePair=left-nowhere"),
        Err(RelationError::UnknownSidePair { .. })
    ));
    assert!(matches!(
        relations::setup_from_str(owner, "target=missing; sidePair=left-left"),
        Err(RelationError::UnresolvedTarget { .. })
    ));
    assert_eq!(relations::item_count(owner), 0);
}

#[test]
fn construction_uses_design_sizes() {
    reset_engine();
    let composite = rect("composite", None, 0.0, 0.0, 200.0, 50.0);
    let label = with_construction(composite, || rect("label", None, 0.0, 0.0, 150.0, 20.0));
    assert_eq!(node::parent(label), Some(composite));

    relations::add(composite, label, RelationType::Width, false);
    node::set_size(composite, Vec2::new(300.0, 50.0));

    // While constructing, the design-time difference (50) is kept.
    with_construction(composite, || node::set_size(label, Vec2::new(180.0, 20.0)));
    assert_close(node::size(composite), Vec2::new(230.0, 50.0));

    // Afterwards, the live difference (50) is kept.
    node::set_size(label, Vec2::new(200.0, 20.0));
    assert_close(node::size(composite), Vec2::new(250.0, 50.0));
}
