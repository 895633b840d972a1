mod blend_1d;
mod blend_2d;
mod free_blend;
mod group;
mod queue;
mod random;
mod single;
mod transition;

pub use blend_1d::{Blend1dState, blend_1d_weights};
pub use blend_2d::Blend2dState;
pub use free_blend::FreeBlendState;
pub use group::StateGroup;
pub use queue::{QueueState, QueueStep};
pub use random::{RandomState, RandomStateOptions};
pub use single::{SingleState, SingleStateOptions};
pub use transition::TransitionState;

use bevy_math::Vec2;
use host_animation_core::prelude::*;

/// Bookkeeping shared by every kind of animation state: the user-facing weight (with its fade),
/// the computed internal weight, pause/discard flags and the deferred of the current play.
#[derive(Debug)]
pub struct StateCore {
    name: String,
    weight: Tweened<f32>,
    internal_weight: f32,
    paused: bool,
    discarded: bool,
    play: Deferred,
}

impl StateCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: Tweened::new(0.),
            internal_weight: 0.,
            paused: false,
            discarded: false,
            play: Deferred::resolved(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn weight(&self) -> f32 {
        self.weight.value()
    }

    pub fn set_weight(&mut self, weight: f32, seconds: f32, easing: Easing) -> Deferred {
        if self.discarded {
            return self.discarded_error();
        }
        self.weight.set(weight.clamp(0., 1.), seconds, easing)
    }

    pub fn set_weight_now(&mut self, weight: f32) {
        self.weight.set_now(weight.clamp(0., 1.));
    }

    pub fn internal_weight(&self) -> f32 {
        self.internal_weight
    }

    pub(crate) fn set_internal_weight(&mut self, internal_weight: f32) {
        self.internal_weight = internal_weight;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    /// Whether `update` should do anything this frame.
    pub(crate) fn is_active(&self) -> bool {
        !self.discarded && !self.paused
    }

    pub fn play_deferred(&self) -> &Deferred {
        &self.play
    }

    /// Pre-empts the current play and starts a fresh one.
    pub(crate) fn begin_play(&mut self) -> Deferred {
        self.play.cancel();
        self.play = Deferred::new();
        self.play.clone()
    }

    pub(crate) fn replace_play(&mut self, play: Deferred) {
        if !self.play.ptr_eq(&play) {
            self.play.cancel();
        }
        self.play = play;
    }

    /// Keeps a pending play, or arms a new one if the previous play already settled.
    pub(crate) fn rearm_play(&mut self) -> Deferred {
        if !self.play.is_pending() {
            self.play = Deferred::new();
        }
        self.play.clone()
    }

    pub(crate) fn advance_weight(&mut self, delta: f32) {
        self.weight.advance(delta);
    }

    pub(crate) fn discard(&mut self) {
        self.play.cancel();
        self.weight.cancel();
        self.internal_weight = 0.;
        self.paused = false;
        self.discarded = true;
    }

    pub(crate) fn discarded_error(&self) -> Deferred {
        Deferred::rejected(AnimationError::Discarded(self.name.clone()))
    }
}

/// Common interface of every animation state.
///
/// Times passed to [`StateLike::update`] are frame deltas in milliseconds. Durations given to
/// weight or blend-value fades are in seconds.
pub trait StateLike {
    fn core(&self) -> &StateCore;
    fn core_mut(&mut self) -> &mut StateCore;

    fn name(&self) -> &str {
        self.core().name()
    }

    fn weight(&self) -> f32 {
        self.core().weight()
    }

    fn internal_weight(&self) -> f32 {
        self.core().internal_weight()
    }

    fn is_paused(&self) -> bool {
        self.core().is_paused()
    }

    fn is_discarded(&self) -> bool {
        self.core().is_discarded()
    }

    /// `true` while the current play has neither finished nor been pre-empted.
    fn is_playing(&self) -> bool {
        self.core().play_deferred().is_pending()
    }

    fn play_deferred(&self) -> Deferred {
        self.core().play_deferred().clone()
    }

    /// Fades the user weight towards `weight` (clamped to `[0, 1]`) over `seconds`.
    fn set_weight(&mut self, weight: f32, seconds: f32, easing: Easing) -> Deferred {
        self.core_mut().set_weight(weight, seconds, easing)
    }

    /// Computes the internal weight from the user weight and the factor handed down by the
    /// parent, and propagates it to children or the clip.
    fn update_internal_weight(&mut self, factor: f32);

    fn update(&mut self, delta: f32);

    /// Starts playback from the beginning. The returned deferred resolves when playback finishes
    /// naturally, and is canceled if another play pre-empts it.
    fn play(&mut self) -> Deferred;

    fn pause(&mut self) -> bool;

    /// Continues playback from where it was, re-arming the play deferred if it had settled.
    fn resume(&mut self) -> Deferred;

    /// Cancels the current play without touching the clip position.
    fn cancel(&mut self) -> bool;

    /// Resolves the current play and rewinds.
    fn stop(&mut self) -> bool;

    /// Stops contributing to the pose until weights are computed again.
    fn deactivate(&mut self);

    /// Permanently disables the state. Every later operation fails or is a no-op.
    fn discard(&mut self);

    /// Playback progress in `[0, 1]`, used for phase matching.
    fn normalized_time(&self) -> f32;

    fn set_normalized_time(&mut self, time: f32);

    /// Whether this state never finishes on its own.
    fn loops_forever(&self) -> bool;

    fn set_blend_mode(&mut self, blend_mode: BlendMode);
}

/// The value driving a parametric blend: a scalar for 1D blends, a point for 2D blends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BlendValue {
    Scalar(f32),
    Planar(Vec2),
}

impl From<f32> for BlendValue {
    fn from(value: f32) -> Self {
        BlendValue::Scalar(value)
    }
}

impl From<Vec2> for BlendValue {
    fn from(value: Vec2) -> Self {
        BlendValue::Planar(value)
    }
}

/// Any animation state a layer can hold.
pub enum AnimationState {
    Single(SingleState),
    FreeBlend(FreeBlendState),
    Blend1d(Blend1dState),
    Blend2d(Blend2dState),
    Queue(QueueState),
    Random(RandomState),
}

macro_rules! dispatch {
    ($self:expr, $state:ident => $body:expr) => {
        match $self {
            AnimationState::Single($state) => $body,
            AnimationState::FreeBlend($state) => $body,
            AnimationState::Blend1d($state) => $body,
            AnimationState::Blend2d($state) => $body,
            AnimationState::Queue($state) => $body,
            AnimationState::Random($state) => $body,
        }
    };
}

impl StateLike for AnimationState {
    fn core(&self) -> &StateCore {
        dispatch!(self, state => state.core())
    }

    fn core_mut(&mut self) -> &mut StateCore {
        dispatch!(self, state => state.core_mut())
    }

    fn update_internal_weight(&mut self, factor: f32) {
        dispatch!(self, state => state.update_internal_weight(factor))
    }

    fn update(&mut self, delta: f32) {
        dispatch!(self, state => state.update(delta))
    }

    fn play(&mut self) -> Deferred {
        dispatch!(self, state => state.play())
    }

    fn pause(&mut self) -> bool {
        dispatch!(self, state => state.pause())
    }

    fn resume(&mut self) -> Deferred {
        dispatch!(self, state => state.resume())
    }

    fn cancel(&mut self) -> bool {
        dispatch!(self, state => state.cancel())
    }

    fn stop(&mut self) -> bool {
        dispatch!(self, state => state.stop())
    }

    fn deactivate(&mut self) {
        dispatch!(self, state => state.deactivate())
    }

    fn discard(&mut self) {
        dispatch!(self, state => state.discard())
    }

    fn normalized_time(&self) -> f32 {
        dispatch!(self, state => state.normalized_time())
    }

    fn set_normalized_time(&mut self, time: f32) {
        dispatch!(self, state => state.set_normalized_time(time))
    }

    fn loops_forever(&self) -> bool {
        dispatch!(self, state => state.loops_forever())
    }

    fn set_blend_mode(&mut self, blend_mode: BlendMode) {
        dispatch!(self, state => state.set_blend_mode(blend_mode))
    }
}

impl AnimationState {
    pub fn kind(&self) -> &'static str {
        match self {
            AnimationState::Single(_) => "single",
            AnimationState::FreeBlend(_) => "freeBlend",
            AnimationState::Blend1d(_) => "blend1d",
            AnimationState::Blend2d(_) => "blend2d",
            AnimationState::Queue(_) => "queue",
            AnimationState::Random(_) => "random",
        }
    }

    /// Sets the initial user weight.
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.core_mut().set_weight_now(weight);
        self
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.core_mut().set_name(name);
    }

    /// Child states of composite states, in order. Empty for single clips.
    pub fn children(&self) -> Option<&StateGroup> {
        match self {
            AnimationState::Single(_) => None,
            AnimationState::FreeBlend(state) => Some(state.states()),
            AnimationState::Blend1d(state) => Some(state.states()),
            AnimationState::Blend2d(state) => Some(state.states()),
            AnimationState::Queue(state) => Some(state.states()),
            AnimationState::Random(state) => Some(state.states()),
        }
    }

    fn unsupported(&self, operation: &'static str) -> AnimationError {
        AnimationError::UnsupportedOperation {
            animation: self.name().to_string(),
            operation,
        }
    }

    /// Fades the weight of one child of a free blend.
    pub fn set_blend_weight(
        &mut self,
        child: &str,
        weight: f32,
        seconds: f32,
        easing: Easing,
    ) -> AnimationResult<Deferred> {
        match self {
            AnimationState::FreeBlend(state) => state.set_blend_weight(child, weight, seconds, easing),
            other => Err(other.unsupported("blend weights")),
        }
    }

    pub fn blend_weight(&self, child: &str) -> AnimationResult<f32> {
        match self {
            AnimationState::FreeBlend(state) => state.blend_weight(child),
            other => Err(other.unsupported("blend weights")),
        }
    }

    /// Tweens the parameter of a 1D or 2D blend. A scalar drives a 1D blend and a point drives a
    /// 2D blend.
    pub fn set_blend_value(
        &mut self,
        value: BlendValue,
        seconds: f32,
        easing: Easing,
    ) -> AnimationResult<Deferred> {
        match (self, value) {
            (AnimationState::Blend1d(state), BlendValue::Scalar(value)) => {
                Ok(state.set_blend_value(value, seconds, easing))
            }
            (AnimationState::Blend2d(state), BlendValue::Planar(value)) => {
                Ok(state.set_blend_value(value, seconds, easing))
            }
            (other, _) => Err(other.unsupported("this blend value")),
        }
    }

    pub fn blend_value(&self) -> AnimationResult<BlendValue> {
        match self {
            AnimationState::Blend1d(state) => Ok(BlendValue::Scalar(state.blend_value())),
            AnimationState::Blend2d(state) => Ok(BlendValue::Planar(state.blend_value())),
            other => Err(other.unsupported("blend values")),
        }
    }

    /// Moves a queue to its next child or makes a random state pick again.
    pub fn play_next(&mut self) -> Deferred {
        match self {
            AnimationState::Queue(state) => state.next(),
            AnimationState::Random(state) => state.play_random_animation(),
            other => Deferred::rejected(other.unsupported("play next")),
        }
    }
}

macro_rules! impl_from_state {
    ($($variant:ident($state:ty)),* $(,)?) => {
        $(
            impl From<$state> for AnimationState {
                fn from(state: $state) -> Self {
                    AnimationState::$variant(state)
                }
            }
        )*
    };
}

impl_from_state!(
    Single(SingleState),
    FreeBlend(FreeBlendState),
    Blend1d(Blend1dState),
    Blend2d(Blend2dState),
    Queue(QueueState),
    Random(RandomState),
);

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn clip(name: &str, duration: f32) -> AnimationState {
        SingleState::new(name, SimulatedClip::new(duration), SingleStateOptions::default()).into()
    }

    pub fn finite_clip(name: &str, duration: f32, loops: u32) -> AnimationState {
        SingleState::new(
            name,
            SimulatedClip::new(duration),
            SingleStateOptions {
                loop_count: LoopCount::Finite(loops),
                ..Default::default()
            },
        )
        .into()
    }

    pub fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn weight_is_clamped() {
        let mut state = clip("idle", 1.);
        state.set_weight(3., 0., Easing::Linear);
        assert_eq!(state.weight(), 1.);
        state.set_weight(-1., 0., Easing::Linear);
        assert_eq!(state.weight(), 0.);
    }

    #[test]
    fn discarded_state_rejects_everything() {
        let mut state = clip("idle", 1.);
        state.discard();
        assert!(state.play().is_rejected());
        assert!(state.resume().is_rejected());
        assert!(state.set_weight(1., 0., Easing::Linear).is_rejected());
        assert!(!state.pause());
    }

    #[test]
    fn blend_operations_on_wrong_kind_fail() {
        let mut state = clip("idle", 1.);
        assert!(matches!(
            state.set_blend_value(BlendValue::Scalar(0.5), 0., Easing::Linear),
            Err(AnimationError::UnsupportedOperation { .. })
        ));
        assert!(state.blend_weight("x").is_err());
        assert!(state.play_next().is_rejected());
    }
}
