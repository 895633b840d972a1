use bevy_log::{debug, warn};
use host_animation_core::prelude::*;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    state::{AnimationState, BlendValue, StateLike, TransitionState},
    utils::unique_name,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerOptions {
    pub blend_mode: BlendMode,
    pub weight: f32,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            blend_mode: BlendMode::Override,
            weight: 1.,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum StartMode {
    Play,
    Resume,
}

/// A named slot in the animation stack holding a set of states, at most one of which is current.
///
/// Switching the current state crossfades through a [`TransitionState`].
pub struct AnimationLayer {
    name: String,
    blend_mode: BlendMode,
    weight: Tweened<f32>,
    internal_weight: f32,
    paused: bool,
    states: IndexMap<String, AnimationState>,
    current: Option<String>,
    transition: TransitionState,
}

impl AnimationLayer {
    pub fn new(name: impl Into<String>, options: LayerOptions) -> Self {
        Self {
            name: name.into(),
            blend_mode: options.blend_mode,
            weight: Tweened::new(options.weight.clamp(0., 1.)),
            internal_weight: 0.,
            paused: false,
            states: IndexMap::new(),
            current: None,
            transition: TransitionState::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn weight(&self) -> f32 {
        self.weight.value()
    }

    pub fn set_weight(&mut self, weight: f32, seconds: f32, easing: Easing) -> Deferred {
        self.weight.set(weight.clamp(0., 1.), seconds, easing)
    }

    pub fn internal_weight(&self) -> f32 {
        self.internal_weight
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn transition(&self) -> &TransitionState {
        &self.transition
    }

    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    pub fn state(&self, name: &str) -> Option<&AnimationState> {
        self.states.get(name)
    }

    pub fn state_mut(&mut self, name: &str) -> Option<&mut AnimationState> {
        self.states.get_mut(name)
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_state(&self) -> Option<&AnimationState> {
        self.current.as_deref().and_then(|name| self.states.get(name))
    }

    /// Name of the current state while its play is still pending.
    pub fn playing_name(&self) -> Option<&str> {
        self.current_state()
            .filter(|state| state.is_playing())
            .map(StateLike::name)
    }

    /// Weight the current animation contributes, used to mask the layers below.
    pub fn current_internal_weight(&self) -> f32 {
        if self.transition.is_active() {
            self.transition.internal_weight()
        } else {
            self.current_state().map_or(0., StateLike::internal_weight)
        }
    }

    fn missing(&self, animation: &str) -> AnimationError {
        AnimationError::MissingAnimation {
            layer: self.name.clone(),
            animation: animation.to_string(),
        }
    }

    /// Adds a state, renaming it if its name is taken. Returns the final name.
    pub fn add_state(&mut self, state: impl Into<AnimationState>) -> String {
        let mut state = state.into();
        let name = unique_name(state.name(), |n| self.states.contains_key(n));
        if name != state.name() {
            warn!(
                "Animation {:?} already exists in layer {:?}, renamed to {:?}",
                state.name(),
                self.name,
                name
            );
            state.set_name(name.clone());
        }
        state.set_blend_mode(self.blend_mode);
        self.states.insert(name.clone(), state);
        name
    }

    /// Removes and discards a state.
    pub fn remove_state(&mut self, name: &str) -> AnimationResult<()> {
        if !self.states.contains_key(name) {
            return Err(self.missing(name));
        }
        if self.transition.involves(name) {
            self.transition.cancel(&mut self.states);
        }
        if let Some(mut state) = self.states.shift_remove(name) {
            state.discard();
        }
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        Ok(())
    }

    /// Renames a state in place, keeping its position. Returns the final name.
    pub fn rename_state(&mut self, old: &str, new: &str) -> AnimationResult<String> {
        if old == new {
            return if self.states.contains_key(old) {
                Ok(new.to_string())
            } else {
                Err(self.missing(old))
            };
        }
        let Some((index, _, mut state)) = self.states.shift_remove_full(old) else {
            return Err(self.missing(old));
        };

        let name = unique_name(new, |n| self.states.contains_key(n));
        if name != new {
            warn!(
                "Animation {:?} already exists in layer {:?}, renamed to {:?}",
                new, self.name, name
            );
        }
        state.set_name(name.clone());
        self.states.shift_insert(index, name.clone(), state);

        if self.current.as_deref() == Some(old) {
            self.current = Some(name.clone());
        }
        self.transition.rename(old, &name);
        Ok(name)
    }

    /// Every state currently contributing: the current one plus any still fading out.
    fn active_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if self.transition.is_active() {
            names.extend(self.transition.from_states().iter().cloned());
            names.extend(self.transition.to_state().map(str::to_string));
        }
        if let Some(current) = &self.current
            && !names.contains(current)
        {
            names.push(current.clone());
        }
        names
    }

    fn switch_to(&mut self, name: &str, seconds: f32, easing: Easing, mode: StartMode) -> Deferred {
        let Some(target) = self.states.get_mut(name) else {
            return Deferred::rejected(self.missing(name));
        };
        self.paused = false;
        let deferred = match mode {
            StartMode::Play => target.play(),
            StartMode::Resume => target.resume(),
        };

        let from = self
            .active_names()
            .into_iter()
            .filter(|n| n != name)
            .filter(|n| self.states.get(n).is_some_and(|state| state.weight() > 0.))
            .collect::<Vec<_>>();
        let fade = self
            .transition
            .configure(&mut self.states, from, name, seconds, easing);
        self.current = Some(name.to_string());
        if fade.is_resolved() {
            self.transition.finish(&mut self.states);
        }

        debug!(
            "Layer {:?} switched to {:?} over {}s",
            self.name, name, seconds
        );
        deferred
    }

    /// Plays `name` from the start, crossfading from whatever is current over `seconds`.
    pub fn play_animation(&mut self, name: &str, seconds: f32, easing: Easing) -> Deferred {
        self.switch_to(name, seconds, easing, StartMode::Play)
    }

    /// Resumes `name` (or the current animation) from where it was. Resuming another state than
    /// the current one crossfades to it like [`AnimationLayer::play_animation`].
    pub fn resume_animation(
        &mut self,
        name: Option<&str>,
        seconds: f32,
        easing: Easing,
    ) -> Deferred {
        let target = match (name, &self.current) {
            (Some(name), _) => name.to_string(),
            (None, Some(current)) => current.clone(),
            (None, None) => {
                return Deferred::rejected(AnimationError::NoCurrentAnimation(self.name.clone()));
            }
        };

        if self.current.as_deref() != Some(target.as_str()) {
            return self.switch_to(&target, seconds, easing, StartMode::Resume);
        }

        self.paused = false;
        for name in self.active_names() {
            if name != target
                && let Some(state) = self.states.get_mut(&name)
            {
                state.resume();
            }
        }
        match self.states.get_mut(&target) {
            Some(state) => state.resume(),
            None => Deferred::rejected(self.missing(&target)),
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.current.is_none() {
            return false;
        }
        self.paused = true;
        for name in self.active_names() {
            if let Some(state) = self.states.get_mut(&name) {
                state.pause();
            }
        }
        true
    }

    /// Stops the current animation, abandoning any transition in progress.
    pub fn stop(&mut self) -> bool {
        let Some(current) = self.current.clone() else {
            return false;
        };
        self.transition.cancel(&mut self.states);
        self.paused = false;
        match self.states.get_mut(&current) {
            Some(state) => {
                state.core_mut().set_weight_now(1.);
                state.stop()
            }
            None => false,
        }
    }

    pub fn set_animation_blend_weight(
        &mut self,
        animation: &str,
        state: &str,
        weight: f32,
        seconds: f32,
        easing: Easing,
    ) -> AnimationResult<Deferred> {
        let missing = self.missing(animation);
        self.states
            .get_mut(animation)
            .ok_or(missing)?
            .set_blend_weight(state, weight, seconds, easing)
    }

    pub fn animation_blend_weight(&self, animation: &str, state: &str) -> AnimationResult<f32> {
        self.states
            .get(animation)
            .ok_or_else(|| self.missing(animation))?
            .blend_weight(state)
    }

    pub fn set_animation_blend_value(
        &mut self,
        animation: &str,
        value: BlendValue,
        seconds: f32,
        easing: Easing,
    ) -> AnimationResult<Deferred> {
        let missing = self.missing(animation);
        self.states
            .get_mut(animation)
            .ok_or(missing)?
            .set_blend_value(value, seconds, easing)
    }

    pub fn animation_blend_value(&self, animation: &str) -> AnimationResult<BlendValue> {
        self.states
            .get(animation)
            .ok_or_else(|| self.missing(animation))?
            .blend_value()
    }

    pub fn play_next_animation(&mut self, animation: &str) -> Deferred {
        match self.states.get_mut(animation) {
            Some(state) => state.play_next(),
            None => Deferred::rejected(self.missing(animation)),
        }
    }

    /// Computes this layer's internal weight from the factor left over by the layers above and
    /// hands it down to the contributing states. Every other state is deactivated.
    pub fn update_internal_weight(&mut self, factor: f32) {
        self.internal_weight = self.weight.value() * factor;

        if self.transition.is_active() {
            self.transition
                .update_internal_weight(&mut self.states, self.internal_weight);
        } else if let Some(state) = self
            .current
            .as_deref()
            .and_then(|name| self.states.get_mut(name))
        {
            state.update_internal_weight(self.internal_weight);
        }

        let active = self.active_names();
        for (name, state) in self.states.iter_mut() {
            if !active.contains(name) {
                state.deactivate();
            }
        }
    }

    pub fn update(&mut self, delta: f32) {
        if self.paused {
            return;
        }
        self.weight.advance(delta);

        if self.transition.is_active() {
            if self.transition.update(&mut self.states, delta) {
                debug!(
                    "Layer {:?} finished transition to {:?}",
                    self.name, self.current
                );
            }
        } else if let Some(state) = self
            .current
            .as_deref()
            .and_then(|name| self.states.get_mut(name))
        {
            state.update(delta);
        }
    }

    /// Discards every state. The layer is unusable afterwards.
    pub(crate) fn discard(&mut self) {
        self.transition.cancel(&mut self.states);
        self.weight.cancel();
        for state in self.states.values_mut() {
            state.discard();
        }
        self.current = None;
    }
}
