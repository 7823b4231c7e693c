//! Tween configuration.
//!
//! Passed explicitly into each [`Transition`](crate::state::transition::Transition)
//! instead of living in a process-wide switch.

/// Default tween duration in seconds.
pub const DEFAULT_TWEEN_DURATION: f32 = 0.3;

/// Tween behavior for a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenConfig {
    /// When false, playing a transition jumps straight to its end values.
    pub enabled: bool,
    /// Duration used by keyframes created without an explicit duration.
    pub default_duration: f32,
}

impl Default for TweenConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_duration: DEFAULT_TWEEN_DURATION,
        }
    }
}

impl TweenConfig {
    /// Config with all tween effects disabled.
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }
}
