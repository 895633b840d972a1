use bevy_log::debug;
use host_animation_core::prelude::*;
use rand::{
    Rng, SeedableRng,
    distr::{Distribution, weighted::WeightedIndex},
    rngs::StdRng,
};

use super::{AnimationState, StateCore, StateGroup, StateLike};

#[derive(Clone, Debug, PartialEq)]
pub struct RandomStateOptions {
    /// Average number of seconds between picks. Each wait is drawn uniformly from half to one
    /// and a half times this value.
    pub play_interval: f32,
    /// Fixed seed for reproducible picks. Seeded from the OS when absent.
    pub seed: Option<u64>,
    /// Relative pick probability of each child. Uniform when absent.
    pub weights: Option<Vec<f32>>,
}

impl Default for RandomStateOptions {
    fn default() -> Self {
        Self {
            play_interval: 3.,
            seed: None,
            weights: None,
        }
    }
}

/// Keeps picking a child at random and playing it, forever.
pub struct RandomState {
    core: StateCore,
    states: StateGroup,
    current: Option<usize>,
    rng: StdRng,
    picker: Option<WeightedIndex<f32>>,
    play_interval: f32,
    timer: Deferred,
}

impl RandomState {
    pub fn new(
        name: impl Into<String>,
        states: impl IntoIterator<Item = AnimationState>,
        options: RandomStateOptions,
    ) -> AnimationResult<Self> {
        let states = StateGroup::new(states);

        let picker = match options.weights {
            Some(weights) if weights.len() != states.len() => {
                return Err(AnimationError::InvalidRandomWeights(format!(
                    "expected {} weights, got {}",
                    states.len(),
                    weights.len()
                )));
            }
            Some(weights) if !weights.is_empty() => Some(
                WeightedIndex::new(weights)
                    .map_err(|e| AnimationError::InvalidRandomWeights(e.to_string()))?,
            ),
            _ => None,
        };
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            core: StateCore::new(name),
            states,
            current: None,
            rng,
            picker,
            play_interval: options.play_interval.max(0.),
            timer: Deferred::canceled(),
        })
    }

    pub fn states(&self) -> &StateGroup {
        &self.states
    }

    pub fn play_interval(&self) -> f32 {
        self.play_interval
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current
            .and_then(|index| self.states.get_index(index))
            .map(StateLike::name)
    }

    /// Picks a child and plays it, restarting the pick timer. Returns the play of the picked
    /// child.
    pub fn play_random_animation(&mut self) -> Deferred {
        if self.core.is_discarded() {
            return self.core.discarded_error();
        }
        if self.states.is_empty() {
            let error = AnimationError::EmptyRandom(self.core.name().to_string());
            self.core.play_deferred().reject(error.clone());
            return Deferred::rejected(error);
        }

        let index = match &self.picker {
            Some(picker) => picker.sample(&mut self.rng),
            None => self.rng.random_range(0..self.states.len()),
        };

        if let Some(previous) = self.current.filter(|previous| *previous != index)
            && let Some(state) = self.states.get_index_mut(previous)
        {
            state.cancel();
            state.deactivate();
        }
        for (i, state) in self.states.iter_mut().enumerate() {
            state.core_mut().set_weight_now(if i == index { 1. } else { 0. });
        }
        self.current = Some(index);

        self.timer.cancel();
        let interval = self.play_interval * self.rng.random_range(0.5..=1.5);
        self.timer = wait(interval);

        match self.states.get_index_mut(index) {
            Some(state) => {
                debug!("Random {:?} picked {:?}", self.core.name(), state.name());
                state.play()
            }
            None => Deferred::canceled(),
        }
    }

    fn current_mut(&mut self) -> Option<&mut AnimationState> {
        self.current
            .and_then(|index| self.states.get_index_mut(index))
    }
}

impl StateLike for RandomState {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn update_internal_weight(&mut self, factor: f32) {
        let internal_weight = self.core.weight() * factor;
        self.core.set_internal_weight(internal_weight);

        let current = self.current;
        for (i, state) in self.states.iter_mut().enumerate() {
            if Some(i) == current {
                state.update_internal_weight(internal_weight);
            } else {
                state.deactivate();
            }
        }
    }

    fn update(&mut self, delta: f32) {
        if !self.core.is_active() {
            return;
        }
        self.core.advance_weight(delta);
        if !self.core.play_deferred().is_pending() {
            return;
        }

        let finished = match self.current_mut() {
            Some(current) => {
                current.update(delta);
                current.play_deferred().is_resolved()
            }
            None => false,
        };
        self.timer.execute(delta);

        if finished || self.timer.is_resolved() {
            self.play_random_animation();
        }
    }

    fn play(&mut self) -> Deferred {
        if self.core.is_discarded() {
            return self.core.discarded_error();
        }
        let deferred = self.core.begin_play();
        self.core.set_paused(false);
        self.play_random_animation();
        deferred
    }

    fn pause(&mut self) -> bool {
        if self.core.is_discarded() {
            return false;
        }
        self.core.set_paused(true);
        if let Some(current) = self.current_mut() {
            current.pause();
        }
        true
    }

    fn resume(&mut self) -> Deferred {
        if self.core.is_discarded() {
            return self.core.discarded_error();
        }
        self.core.set_paused(false);
        let deferred = self.core.rearm_play();
        match self.current_mut() {
            Some(current) => {
                current.resume();
            }
            None => {
                self.play_random_animation();
            }
        }
        deferred
    }

    fn cancel(&mut self) -> bool {
        let canceled = self.core.play_deferred().cancel();
        self.timer.cancel();
        if let Some(current) = self.current_mut() {
            current.cancel();
        }
        canceled
    }

    fn stop(&mut self) -> bool {
        if self.core.is_discarded() {
            return false;
        }
        self.core.set_paused(false);
        self.timer.cancel();
        self.states.stop_all();
        self.core.play_deferred().resolve();
        true
    }

    fn deactivate(&mut self) {
        self.core.set_internal_weight(0.);
        self.states.deactivate_all();
    }

    fn discard(&mut self) {
        self.timer.cancel();
        self.core.discard();
        self.states.discard_all();
    }

    fn normalized_time(&self) -> f32 {
        self.current
            .and_then(|index| self.states.get_index(index))
            .map_or(0., StateLike::normalized_time)
    }

    fn set_normalized_time(&mut self, time: f32) {
        if let Some(current) = self.current_mut() {
            current.set_normalized_time(time);
        }
    }

    fn loops_forever(&self) -> bool {
        true
    }

    fn set_blend_mode(&mut self, blend_mode: BlendMode) {
        self.states.set_blend_mode_all(blend_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn fidgets(seed: u64) -> RandomState {
        RandomState::new(
            "fidget",
            [clip("scratch", 1.), clip("stretch", 1.), clip("yawn", 1.)],
            RandomStateOptions {
                play_interval: 1.,
                seed: Some(seed),
                weights: None,
            },
        )
        .unwrap()
    }

    fn picks(state: &mut RandomState, count: usize) -> Vec<String> {
        (0..count)
            .map(|_| {
                state.play_random_animation();
                state.current_name().unwrap_or_default().to_string()
            })
            .collect()
    }

    #[test]
    fn same_seed_same_picks() {
        assert_eq!(picks(&mut fidgets(7), 10), picks(&mut fidgets(7), 10));
    }

    #[test]
    fn zero_weight_children_are_never_picked() {
        let mut state = RandomState::new(
            "fidget",
            [clip("scratch", 1.), clip("yawn", 1.)],
            RandomStateOptions {
                seed: Some(3),
                weights: Some(vec![1., 0.]),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(picks(&mut state, 20).iter().all(|name| name == "scratch"));
    }

    #[test]
    fn invalid_weights_fail_construction() {
        let result = RandomState::new(
            "fidget",
            [clip("scratch", 1.)],
            RandomStateOptions {
                weights: Some(vec![1., 2.]),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(AnimationError::InvalidRandomWeights(_))));
    }

    #[test]
    fn picks_again_when_timer_elapses() {
        let mut state = fidgets(11);
        let play = state.play();
        let first = state.current_name().map(str::to_string);
        let first_play = state.states().get(first.as_deref().unwrap()).unwrap().play_deferred();

        state.update(1600.);

        assert!(play.is_pending());
        assert!(!first_play.is_pending());
        assert!(state.loops_forever());
    }

    #[test]
    fn only_current_child_has_weight() {
        let mut state = fidgets(5);
        state.set_weight(1., 0., Easing::Linear);
        state.play();
        state.update_internal_weight(1.);

        let total: f32 = state.states().iter().map(StateLike::internal_weight).sum();
        assert!(approx(total, 1.));
    }

    #[test]
    fn empty_random_rejects() {
        let mut state = RandomState::new(
            "nothing",
            Vec::<AnimationState>::new(),
            RandomStateOptions::default(),
        )
        .unwrap();
        assert_eq!(
            state.play().error(),
            Some(AnimationError::EmptyRandom("nothing".into()))
        );
    }
}
