use host_animation_core::prelude::*;

use super::{
    AnimationState, StateCore, StateGroup, StateLike,
    group::phase_match_flags,
};

/// Blends children placed at thresholds along one axis, driven by a scalar blend value.
pub struct Blend1dState {
    core: StateCore,
    states: StateGroup,
    thresholds: Vec<f32>,
    phase_match: Vec<bool>,
    blend_value: Tweened<f32>,
    phase_lead: Option<usize>,
}

impl Blend1dState {
    /// `thresholds` holds one position per child. `phase_match` is either empty or one flag per
    /// child.
    pub fn new(
        name: impl Into<String>,
        states: impl IntoIterator<Item = AnimationState>,
        thresholds: Vec<f32>,
        phase_match: Vec<bool>,
    ) -> AnimationResult<Self> {
        let states = StateGroup::new(states);
        if thresholds.len() != states.len() {
            return Err(AnimationError::MismatchedThresholds {
                states: states.len(),
                thresholds: thresholds.len(),
            });
        }
        for (first, a) in thresholds.iter().enumerate() {
            if let Some(offset) = thresholds[first + 1..].iter().position(|b| a == b) {
                return Err(AnimationError::DuplicateThreshold {
                    first,
                    second: first + 1 + offset,
                });
            }
        }
        let phase_match = phase_match_flags(states.len(), phase_match)?;

        Ok(Self {
            core: StateCore::new(name),
            states,
            thresholds,
            phase_match,
            blend_value: Tweened::new(0.),
            phase_lead: None,
        })
    }

    pub fn states(&self) -> &StateGroup {
        &self.states
    }

    pub fn thresholds(&self) -> &[f32] {
        &self.thresholds
    }

    pub fn blend_value(&self) -> f32 {
        self.blend_value.value()
    }

    pub fn set_blend_value(&mut self, value: f32, seconds: f32, easing: Easing) -> Deferred {
        if self.core.is_discarded() {
            return self.core.discarded_error();
        }
        self.blend_value.set(value, seconds, easing)
    }

    /// Name of the child other phase-matched children were last synchronized to.
    pub fn phase_lead(&self) -> Option<&str> {
        self.phase_lead
            .and_then(|lead| self.states.get_index(lead))
            .map(StateLike::name)
    }
}

/// Weights of children at `thresholds` for the blend value `value`.
///
/// The two thresholds bracketing the value share the weight linearly; values outside the range
/// give full weight to the nearest end.
pub fn blend_1d_weights(thresholds: &[f32], value: f32) -> Vec<f32> {
    let mut weights = vec![0.; thresholds.len()];

    let mut order = (0..thresholds.len()).collect::<Vec<_>>();
    order.sort_by(|a, b| thresholds[*a].total_cmp(&thresholds[*b]));
    let (Some(&first), Some(&last)) = (order.first(), order.last()) else {
        return weights;
    };

    if value <= thresholds[first] {
        weights[first] = 1.;
    } else if value >= thresholds[last] {
        weights[last] = 1.;
    } else if let Some(pair) = order
        .windows(2)
        .find(|pair| value >= thresholds[pair[0]] && value <= thresholds[pair[1]])
    {
        let (low, high) = (pair[0], pair[1]);
        let t = (value - thresholds[low]) / (thresholds[high] - thresholds[low]);
        weights[low] = 1. - t;
        weights[high] = t;
    }

    weights
}

impl StateLike for Blend1dState {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn update_internal_weight(&mut self, factor: f32) {
        let internal_weight = self.core.weight() * factor;
        self.core.set_internal_weight(internal_weight);

        let weights = blend_1d_weights(&self.thresholds, self.blend_value.value());
        for (state, weight) in self.states.iter_mut().zip(weights) {
            state.core_mut().set_weight_now(weight);
            state.update_internal_weight(internal_weight);
        }
    }

    fn update(&mut self, delta: f32) {
        if !self.core.is_active() {
            return;
        }
        self.core.advance_weight(delta);
        self.blend_value.advance(delta);
        self.states.update_all(delta);
        self.phase_lead = self.states.sync_phases(&self.phase_match);
    }

    fn play(&mut self) -> Deferred {
        self.states.play_blended(&mut self.core)
    }

    fn pause(&mut self) -> bool {
        self.states.pause_blended(&mut self.core)
    }

    fn resume(&mut self) -> Deferred {
        self.states.resume_blended(&mut self.core)
    }

    fn cancel(&mut self) -> bool {
        self.states.cancel_blended(&mut self.core)
    }

    fn stop(&mut self) -> bool {
        self.states.stop_blended(&mut self.core)
    }

    fn deactivate(&mut self) {
        self.states.deactivate_blended(&mut self.core)
    }

    fn discard(&mut self) {
        self.blend_value.cancel();
        self.states.discard_blended(&mut self.core)
    }

    fn normalized_time(&self) -> f32 {
        self.states.dominant_normalized_time()
    }

    fn set_normalized_time(&mut self, time: f32) {
        self.states.set_normalized_time_all(time)
    }

    fn loops_forever(&self) -> bool {
        self.states.any_loops_forever()
    }

    fn set_blend_mode(&mut self, blend_mode: BlendMode) {
        self.states.set_blend_mode_all(blend_mode)
    }
}
