//! Transitions - Keyframe timelines over a node's children.
//!
//! A transition belongs to an owner node and animates the position or size
//! of the owner's children (addressed by id, empty id for the owner
//! itself). Keyframes interpolate linearly from `start` to `end` over
//! `[time, time + duration]`.
//!
//! Playback is driven by the caller through [`Transition::advance`]; there
//! is no internal clock. With [`TweenConfig::enabled`] false, `play` jumps
//! straight to the end values.
//!
//! When relations move a child, [`update_from_relations`] shifts the
//! position keyframes addressed to it, so a timeline authored against one
//! layout keeps its intent after the layout moves.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::TweenConfig;
use crate::engine::{node, registry};
use crate::state::gear;
use crate::types::Vec2;

/// What a keyframe animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionAction {
    Xy,
    Size,
}

/// One keyframe.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionItem {
    /// Start time in seconds.
    pub time: f32,
    pub duration: f32,
    /// Child id. Empty addresses the owner itself.
    pub target_id: String,
    pub action: TransitionAction,
    pub start: Vec2,
    pub end: Vec2,
}

impl TransitionItem {
    /// Position keyframe.
    pub fn xy(target_id: &str, time: f32, duration: f32, start: Vec2, end: Vec2) -> Self {
        Self {
            time,
            duration,
            target_id: target_id.to_string(),
            action: TransitionAction::Xy,
            start,
            end,
        }
    }

    /// Size keyframe.
    pub fn size(target_id: &str, time: f32, duration: f32, start: Vec2, end: Vec2) -> Self {
        Self {
            action: TransitionAction::Size,
            ..Self::xy(target_id, time, duration, start, end)
        }
    }

    fn end_time(&self) -> f32 {
        self.time + self.duration
    }

    /// Interpolated value at `elapsed`, or None before the keyframe starts.
    fn value_at(&self, elapsed: f32) -> Option<Vec2> {
        if elapsed < self.time {
            return None;
        }
        let progress = if self.duration <= 0.0 {
            1.0
        } else {
            ((elapsed - self.time) / self.duration).clamp(0.0, 1.0)
        };
        Some(Vec2::new(
            self.start.x + (self.end.x - self.start.x) * progress,
            self.start.y + (self.end.y - self.start.y) * progress,
        ))
    }
}

#[derive(Debug, Default)]
struct PlayState {
    items: Vec<TransitionItem>,
    elapsed: f32,
    playing: bool,
}

pub struct Transition {
    name: String,
    owner: usize,
    config: TweenConfig,
    state: RefCell<PlayState>,
}

impl Transition {
    pub fn new(name: &str, owner: usize, config: TweenConfig) -> Self {
        Self {
            name: name.to_string(),
            owner,
            config,
            state: RefCell::new(PlayState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> usize {
        self.owner
    }

    pub fn config(&self) -> TweenConfig {
        self.config
    }

    pub fn add_item(&self, item: TransitionItem) {
        self.state.borrow_mut().items.push(item);
    }

    /// Add a position tween using the configured default duration.
    pub fn add_tween(&self, target_id: &str, time: f32, start: Vec2, end: Vec2) {
        let duration = self.config.default_duration;
        self.add_item(TransitionItem::xy(target_id, time, duration, start, end));
    }

    pub fn items(&self) -> Vec<TransitionItem> {
        self.state.borrow().items.clone()
    }

    /// End time of the last keyframe.
    pub fn total_duration(&self) -> f32 {
        self.state
            .borrow()
            .items
            .iter()
            .map(TransitionItem::end_time)
            .fold(0.0, f32::max)
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    /// Start from the beginning.
    pub fn play(&self) {
        tracing::debug!(owner = self.owner, transition = %self.name, "transition played");
        if !self.config.enabled {
            let total = self.total_duration();
            self.state.borrow_mut().elapsed = total;
            self.apply_at(total);
            return;
        }
        {
            let mut state = self.state.borrow_mut();
            state.elapsed = 0.0;
            state.playing = true;
        }
        self.apply_at(0.0);
    }

    /// Stop playback, optionally jumping to the end values.
    pub fn stop(&self, complete: bool) {
        let was_playing = std::mem::replace(&mut self.state.borrow_mut().playing, false);
        if was_playing && complete {
            let total = self.total_duration();
            self.state.borrow_mut().elapsed = total;
            self.apply_at(total);
        }
    }

    /// Advance playback by `dt` seconds. Returns whether it is still playing.
    pub fn advance(&self, dt: f32) -> bool {
        let total = self.total_duration();
        let elapsed = {
            let mut state = self.state.borrow_mut();
            if !state.playing {
                return false;
            }
            state.elapsed = (state.elapsed + dt).min(total);
            if state.elapsed >= total {
                state.playing = false;
            }
            state.elapsed
        };
        self.apply_at(elapsed);
        self.is_playing()
    }

    /// Shift position keyframes addressed to `target_id` by `delta`.
    pub fn update_from_relations(&self, target_id: &str, delta: Vec2) {
        let mut state = self.state.borrow_mut();
        for item in state
            .items
            .iter_mut()
            .filter(|item| item.action == TransitionAction::Xy && item.target_id == target_id)
        {
            item.start += delta;
            item.end += delta;
        }
    }

    fn resolve(&self, target_id: &str) -> Option<usize> {
        if target_id.is_empty() {
            Some(self.owner)
        } else {
            registry::find_child(self.owner, target_id)
        }
    }

    fn apply_at(&self, elapsed: f32) {
        let values: Vec<(String, TransitionAction, Vec2)> = self
            .state
            .borrow()
            .items
            .iter()
            .filter_map(|item| {
                item.value_at(elapsed)
                    .map(|value| (item.target_id.clone(), item.action, value))
            })
            .collect();

        for (target_id, action, value) in values {
            let Some(target) = self.resolve(&target_id) else {
                continue;
            };
            gear::with_gears_locked(target, || match action {
                TransitionAction::Xy => node::set_position(target, value),
                TransitionAction::Size => node::set_size(target, value),
            });
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

thread_local! {
    static TRANSITIONS: RefCell<HashMap<usize, Vec<Rc<Transition>>>> = RefCell::new(HashMap::new());
}

/// Register a transition on its owner. Replaces one with the same name.
pub fn add_transition(transition: Transition) -> Rc<Transition> {
    let transition = Rc::new(transition);
    let owner = transition.owner;
    TRANSITIONS.with(|transitions| {
        let mut transitions = transitions.borrow_mut();
        let list = transitions.entry(owner).or_default();
        list.retain(|existing| existing.name != transition.name);
        list.push(Rc::clone(&transition));
    });
    transition
}

/// Look up a transition by owner and name.
pub fn get_transition(owner: usize, name: &str) -> Option<Rc<Transition>> {
    transitions_of(owner)
        .into_iter()
        .find(|transition| transition.name == name)
}

/// All transitions of `owner`.
pub fn transitions_of(owner: usize) -> Vec<Rc<Transition>> {
    TRANSITIONS.with(|transitions| transitions.borrow().get(&owner).cloned().unwrap_or_default())
}

/// Shift keyframes of every transition on `owner` addressed to `target_id`.
pub fn update_from_relations(owner: usize, target_id: &str, delta: Vec2) {
    if delta.is_zero() {
        return;
    }
    for transition in transitions_of(owner) {
        transition.update_from_relations(target_id, delta);
    }
}

/// Drop every transition of `owner`.
pub fn remove_transitions(owner: usize) {
    TRANSITIONS.with(|transitions| {
        transitions.borrow_mut().remove(&owner);
    });
}

/// Reset transition state (for testing).
pub fn reset_transitions() {
    TRANSITIONS.with(|transitions| transitions.borrow_mut().clear());
}
