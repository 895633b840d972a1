use host_animation_core::prelude::*;

use super::{AnimationState, StateCore, StateGroup, StateLike};

/// Plays every child at once, each with its own user-controlled weight.
///
/// When the child weights add up to more than 1 they are scaled down so the blend never
/// contributes more than its own weight.
pub struct FreeBlendState {
    core: StateCore,
    states: StateGroup,
}

impl FreeBlendState {
    pub fn new(name: impl Into<String>, states: impl IntoIterator<Item = AnimationState>) -> Self {
        Self {
            core: StateCore::new(name),
            states: StateGroup::new(states),
        }
    }

    pub fn states(&self) -> &StateGroup {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut StateGroup {
        &mut self.states
    }

    fn missing(&self, child: &str) -> AnimationError {
        AnimationError::MissingBlendState {
            animation: self.core.name().to_string(),
            state: child.to_string(),
        }
    }

    pub fn blend_weight(&self, child: &str) -> AnimationResult<f32> {
        self.states
            .get(child)
            .map(StateLike::weight)
            .ok_or_else(|| self.missing(child))
    }

    pub fn set_blend_weight(
        &mut self,
        child: &str,
        weight: f32,
        seconds: f32,
        easing: Easing,
    ) -> AnimationResult<Deferred> {
        let missing = self.missing(child);
        self.states
            .get_mut(child)
            .map(|state| state.set_weight(weight, seconds, easing))
            .ok_or(missing)
    }
}

impl StateLike for FreeBlendState {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn update_internal_weight(&mut self, factor: f32) {
        let internal_weight = self.core.weight() * factor;
        self.core.set_internal_weight(internal_weight);

        let total: f32 = self.states.iter().map(StateLike::weight).sum();
        let scale = if total > 1. { total.recip() } else { 1. };
        for state in self.states.iter_mut() {
            state.update_internal_weight(internal_weight * scale);
        }
    }

    fn update(&mut self, delta: f32) {
        if !self.core.is_active() {
            return;
        }
        self.core.advance_weight(delta);
        self.states.update_all(delta);
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

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn blend() -> FreeBlendState {
        let mut blend = FreeBlendState::new(
            "face",
            [
                clip("smile", 1.).with_weight(0.8),
                clip("blink", 1.).with_weight(0.8),
            ],
        );
        blend.set_weight(1., 0., Easing::Linear);
        blend
    }

    #[test]
    fn overweight_children_are_normalized() {
        let mut blend = blend();
        blend.update_internal_weight(1.);

        for state in blend.states().iter() {
            assert!(approx(state.internal_weight(), 0.5));
        }
    }

    #[test]
    fn light_children_keep_their_weights() {
        let mut blend = blend();
        blend.set_blend_weight("blink", 0.1, 0., Easing::Linear).unwrap();
        blend.update_internal_weight(0.5);

        assert!(approx(blend.states().get("smile").unwrap().internal_weight(), 0.4));
        assert!(approx(blend.states().get("blink").unwrap().internal_weight(), 0.05));
    }

    #[test]
    fn blend_weight_fades_over_time() {
        let mut blend = blend();
        let fade = blend.set_blend_weight("smile", 0., 1., Easing::Linear).unwrap();
        blend.update(500.);
        assert!(approx(blend.blend_weight("smile").unwrap(), 0.4));
        blend.update(500.);
        assert!(fade.is_resolved());
        assert!(matches!(
            blend.blend_weight("frown"),
            Err(AnimationError::MissingBlendState { .. })
        ));
    }

    #[test]
    fn play_resolves_when_all_children_finish() {
        let mut blend = FreeBlendState::new(
            "wave",
            [finite_clip("left", 1., 1), finite_clip("right", 2., 1)],
        );
        let play = blend.play();
        blend.update(1000.);
        assert!(play.is_pending());
        blend.update(1000.);
        assert!(play.is_resolved());
    }

    #[test]
    fn canceling_blend_cancels_children() {
        let mut blend = blend();
        let play = blend.play();
        let smile = blend.states().get("smile").unwrap().play_deferred();
        blend.cancel();
        assert!(play.is_canceled());
        assert!(smile.is_canceled());
    }
}
