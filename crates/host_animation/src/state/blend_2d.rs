use bevy_math::Vec2;
use host_animation_core::{
    geometry::{Edge, Vertex, VertexId},
    prelude::*,
};

use super::{
    AnimationState, StateCore, StateGroup, StateLike,
    group::phase_match_flags,
};

const COINCIDENT_EPSILON: f32 = 1e-6;

/// Blends children placed at points on a plane, driven by a 2D blend value.
///
/// With three or more children the points are triangulated and the blend value is expressed in
/// barycentric coordinates of the triangle containing it (or the nearest one).
pub struct Blend2dState {
    core: StateCore,
    states: StateGroup,
    thresholds: Vec<Vec2>,
    triangulation: Triangulation,
    phase_match: Vec<bool>,
    blend_value: Tweened<Vec2>,
    phase_lead: Option<usize>,
}

impl Blend2dState {
    pub fn new(
        name: impl Into<String>,
        states: impl IntoIterator<Item = AnimationState>,
        thresholds: Vec<Vec2>,
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
            if let Some(offset) = thresholds[first + 1..]
                .iter()
                .position(|b| a.distance_squared(*b) <= COINCIDENT_EPSILON)
            {
                return Err(AnimationError::DuplicateThreshold {
                    first,
                    second: first + 1 + offset,
                });
            }
        }
        let phase_match = phase_match_flags(states.len(), phase_match)?;

        let triangulation = if thresholds.len() >= 3 {
            let triangulation = Triangulation::from_points_delaunay(&thresholds);
            if triangulation.is_empty() {
                return Err(AnimationError::CollinearThresholds);
            }
            triangulation
        } else {
            Triangulation::default()
        };

        Ok(Self {
            core: StateCore::new(name),
            states,
            thresholds,
            triangulation,
            phase_match,
            blend_value: Tweened::new(Vec2::ZERO),
            phase_lead: None,
        })
    }

    pub fn states(&self) -> &StateGroup {
        &self.states
    }

    pub fn thresholds(&self) -> &[Vec2] {
        &self.thresholds
    }

    pub fn blend_value(&self) -> Vec2 {
        self.blend_value.value()
    }

    pub fn set_blend_value(&mut self, value: Vec2, seconds: f32, easing: Easing) -> Deferred {
        if self.core.is_discarded() {
            return self.core.discarded_error();
        }
        self.blend_value.set(value, seconds, easing)
    }

    pub fn phase_lead(&self) -> Option<&str> {
        self.phase_lead
            .and_then(|lead| self.states.get_index(lead))
            .map(StateLike::name)
    }

    /// Child weights for `value`. They are non-negative and sum to 1 whenever there is at least
    /// one child.
    pub fn blend_weights(&self, value: Vec2) -> Vec<f32> {
        let mut weights = vec![0.; self.thresholds.len()];

        match self.thresholds.as_slice() {
            [] => {}
            [_] => weights[0] = 1.,
            [a, b] => {
                let edge = Edge::new(
                    Vertex::new(*a, VertexId::Index(0)),
                    Vertex::new(*b, VertexId::Index(1)),
                );
                let t = edge.segment_parameter(value);
                weights[0] = 1. - t;
                weights[1] = t;
            }
            _ => {
                if let Some(combination) = self.triangulation.find_linear_combination(value) {
                    for (index, weight) in combination {
                        weights[index] = weight;
                    }
                }
            }
        }

        weights
    }
}

impl StateLike for Blend2dState {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn update_internal_weight(&mut self, factor: f32) {
        let internal_weight = self.core.weight() * factor;
        self.core.set_internal_weight(internal_weight);

        let weights = self.blend_weights(self.blend_value.value());
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
