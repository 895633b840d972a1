use bevy_log::warn;
use host_animation_core::prelude::*;
use indexmap::IndexMap;

use super::{AnimationState, StateCore, StateLike};
use crate::utils::unique_name;

/// Ordered, uniquely named children of a composite state.
#[derive(Default)]
pub struct StateGroup {
    states: IndexMap<String, AnimationState>,
}

impl StateGroup {
    pub fn new(states: impl IntoIterator<Item = AnimationState>) -> Self {
        let mut group = Self::default();
        for state in states {
            group.insert(state);
        }
        group
    }

    /// Adds a child, renaming it if its name is already used. Returns the final name.
    pub fn insert(&mut self, mut state: AnimationState) -> String {
        let name = unique_name(state.name(), |n| self.states.contains_key(n));
        if name != state.name() {
            warn!(
                "Blend state name {:?} is already in use, renamed to {:?}",
                state.name(),
                name
            );
            state.set_name(name.clone());
        }
        self.states.insert(name.clone(), state);
        name
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&AnimationState> {
        self.states.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut AnimationState> {
        self.states.get_mut(name)
    }

    pub fn get_index(&self, index: usize) -> Option<&AnimationState> {
        self.states.get_index(index).map(|(_, state)| state)
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut AnimationState> {
        self.states.get_index_mut(index).map(|(_, state)| state)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.states.get_index_of(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnimationState> {
        self.states.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AnimationState> {
        self.states.values_mut()
    }

    pub fn play_all(&mut self) -> Deferred {
        Deferred::all(self.states.values_mut().map(StateLike::play))
    }

    pub fn resume_all(&mut self) -> Deferred {
        Deferred::all(self.states.values_mut().map(StateLike::resume))
    }

    pub fn pause_all(&mut self) {
        for state in self.states.values_mut() {
            state.pause();
        }
    }

    pub fn cancel_all(&mut self) {
        for state in self.states.values_mut() {
            state.cancel();
        }
    }

    pub fn stop_all(&mut self) {
        for state in self.states.values_mut() {
            state.stop();
        }
    }

    pub fn deactivate_all(&mut self) {
        for state in self.states.values_mut() {
            state.deactivate();
        }
    }

    pub fn discard_all(&mut self) {
        for state in self.states.values_mut() {
            state.discard();
        }
    }

    pub fn update_all(&mut self, delta: f32) {
        for state in self.states.values_mut() {
            state.update(delta);
        }
    }

    pub fn set_blend_mode_all(&mut self, blend_mode: BlendMode) {
        for state in self.states.values_mut() {
            state.set_blend_mode(blend_mode);
        }
    }

    pub fn set_normalized_time_all(&mut self, time: f32) {
        for state in self.states.values_mut() {
            state.set_normalized_time(time);
        }
    }

    pub fn any_loops_forever(&self) -> bool {
        self.states.values().any(StateLike::loops_forever)
    }

    /// Progress of the child contributing the most to the pose.
    pub fn dominant_normalized_time(&self) -> f32 {
        self.states
            .values()
            .fold(None, |best: Option<&AnimationState>, state| match best {
                Some(best) if best.internal_weight() >= state.internal_weight() => Some(best),
                _ => Some(state),
            })
            .map_or(0., StateLike::normalized_time)
    }

    /// Snaps every phase-matched child to the normalized time of the phase-matched child with the
    /// highest weight, and returns the index of that lead child.
    pub fn sync_phases(&mut self, phase_match: &[bool]) -> Option<usize> {
        let is_matched = |i: usize| phase_match.get(i).copied().unwrap_or(false);

        let (lead, _) = self
            .states
            .values()
            .enumerate()
            .filter(|(i, _)| is_matched(*i))
            .map(|(i, state)| (i, state.weight()))
            .fold(None, |best: Option<(usize, f32)>, candidate| match best {
                Some(best) if best.1 >= candidate.1 => Some(best),
                _ => Some(candidate),
            })?;

        let time = self.get_index(lead)?.normalized_time();
        for (i, state) in self.states.values_mut().enumerate() {
            if i != lead && is_matched(i) {
                state.set_normalized_time(time);
            }
        }

        Some(lead)
    }

    // Shared playback behavior of the blends, whose children all play together.

    pub(crate) fn play_blended(&mut self, core: &mut StateCore) -> Deferred {
        if core.is_discarded() {
            return core.discarded_error();
        }
        core.set_paused(false);
        let deferred = self.play_all();
        core.replace_play(deferred.clone());
        deferred
    }

    pub(crate) fn resume_blended(&mut self, core: &mut StateCore) -> Deferred {
        if core.is_discarded() {
            return core.discarded_error();
        }
        core.set_paused(false);
        let deferred = self.resume_all();
        if !core.play_deferred().is_pending() {
            core.replace_play(deferred);
        }
        core.play_deferred().clone()
    }

    pub(crate) fn pause_blended(&mut self, core: &mut StateCore) -> bool {
        if core.is_discarded() {
            return false;
        }
        core.set_paused(true);
        self.pause_all();
        true
    }

    pub(crate) fn cancel_blended(&mut self, core: &mut StateCore) -> bool {
        let canceled = core.play_deferred().cancel();
        self.cancel_all();
        canceled
    }

    pub(crate) fn stop_blended(&mut self, core: &mut StateCore) -> bool {
        if core.is_discarded() {
            return false;
        }
        core.set_paused(false);
        self.stop_all();
        core.play_deferred().resolve();
        true
    }

    pub(crate) fn deactivate_blended(&mut self, core: &mut StateCore) {
        core.set_internal_weight(0.);
        self.deactivate_all();
    }

    pub(crate) fn discard_blended(&mut self, core: &mut StateCore) {
        core.discard();
        self.discard_all();
    }
}

/// Checks that a per-child flag list is either empty or one flag per child.
pub(crate) fn phase_match_flags(states: usize, flags: Vec<bool>) -> AnimationResult<Vec<bool>> {
    match flags.len() {
        0 => Ok(vec![false; states]),
        n if n == states => Ok(flags),
        n => Err(AnimationError::MismatchedPhaseMatch { states, flags: n }),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn duplicate_names_are_suffixed() {
        let group = StateGroup::new([clip("walk", 1.), clip("walk", 1.), clip("run", 1.)]);
        assert_eq!(group.names().collect::<Vec<_>>(), ["walk", "walk1", "run"]);
        assert_eq!(group.get("walk1").map(StateLike::name), Some("walk1"));
    }

    #[test]
    fn phases_snap_to_heaviest_matched_child() {
        let mut group = StateGroup::new([
            clip("a", 1.).with_weight(0.2),
            clip("b", 2.).with_weight(0.8),
            clip("c", 4.).with_weight(1.),
        ]);
        group.play_all();
        group.get_mut("b").unwrap().set_normalized_time(0.25);

        let lead = group.sync_phases(&[true, true, false]);

        assert_eq!(lead, Some(1));
        assert!(approx(group.get("a").unwrap().normalized_time(), 0.25));
        assert!(approx(group.get("c").unwrap().normalized_time(), 0.));
    }

    #[test]
    fn phase_flags_must_match_child_count() {
        assert_eq!(phase_match_flags(2, vec![]), Ok(vec![false, false]));
        assert_eq!(
            phase_match_flags(2, vec![true]),
            Err(AnimationError::MismatchedPhaseMatch { states: 2, flags: 1 })
        );
    }
}
