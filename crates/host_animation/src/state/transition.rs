use host_animation_core::prelude::*;
use indexmap::IndexMap;

use super::{AnimationState, StateLike};

/// A crossfade between the states of a layer, referenced by name.
///
/// Every `from` state fades to weight 0 while the `to` state fades to 1. When every fade
/// resolves, the `from` states are canceled and the transition goes inactive.
#[derive(Debug, Default)]
pub struct TransitionState {
    from: Vec<String>,
    to: Option<String>,
    fade: Deferred,
    internal_weight: f32,
    active: bool,
}

impl TransitionState {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn from_states(&self) -> &[String] {
        &self.from
    }

    pub fn to_state(&self) -> Option<&str> {
        self.to.as_deref()
    }

    pub fn internal_weight(&self) -> f32 {
        self.internal_weight
    }

    /// Resolves when every fade of the transition has finished.
    pub fn fade(&self) -> &Deferred {
        &self.fade
    }

    pub fn involves(&self, name: &str) -> bool {
        self.active && (self.to.as_deref() == Some(name) || self.from.iter().any(|n| n == name))
    }

    fn names(&self) -> impl Iterator<Item = &String> {
        self.from.iter().chain(self.to.iter())
    }

    /// Starts crossfading from `from` to `to` over `seconds`.
    ///
    /// States of a previous transition that take no part in the new one are canceled and stop
    /// contributing immediately. States that are still fading keep their current weight as the
    /// starting point of the new fade.
    pub fn configure(
        &mut self,
        states: &mut IndexMap<String, AnimationState>,
        from: Vec<String>,
        to: &str,
        seconds: f32,
        easing: Easing,
    ) -> Deferred {
        if self.active {
            for name in self.names() {
                if name != to
                    && !from.contains(name)
                    && let Some(state) = states.get_mut(name)
                {
                    state.cancel();
                    state.deactivate();
                }
            }
        }
        self.fade.cancel();

        let mut fades = Vec::with_capacity(from.len() + 1);
        for name in &from {
            if let Some(state) = states.get_mut(name) {
                if state.is_paused() {
                    state.resume();
                }
                fades.push(state.set_weight(0., seconds, easing));
            }
        }
        if let Some(state) = states.get_mut(to) {
            fades.push(state.set_weight(1., seconds, easing));
        }

        self.from = from;
        self.to = Some(to.to_string());
        self.fade = Deferred::all(fades);
        self.active = true;

        self.fade.clone()
    }

    pub fn update_internal_weight(
        &mut self,
        states: &mut IndexMap<String, AnimationState>,
        factor: f32,
    ) {
        self.internal_weight = factor;
        for name in self.names() {
            if let Some(state) = states.get_mut(name) {
                state.update_internal_weight(factor);
            }
        }
    }

    /// Steps every state in the transition. Returns `true` on the frame the transition
    /// completes.
    pub fn update(&mut self, states: &mut IndexMap<String, AnimationState>, delta: f32) -> bool {
        if !self.active {
            return false;
        }
        for name in self.names() {
            if let Some(state) = states.get_mut(name) {
                state.update(delta);
            }
        }

        if self.fade.is_resolved() {
            self.finish(states);
            return true;
        }
        if !self.fade.is_pending() {
            // A fade was taken over from outside the transition.
            self.finish(states);
        }
        false
    }

    /// Completes the transition: the `from` states are canceled and stop contributing.
    pub fn finish(&mut self, states: &mut IndexMap<String, AnimationState>) {
        for name in self.from.drain(..) {
            if let Some(state) = states.get_mut(&name) {
                state.cancel();
                state.deactivate();
            }
        }
        self.active = false;
    }

    /// Abandons the transition, leaving the `to` state where it is.
    pub fn cancel(&mut self, states: &mut IndexMap<String, AnimationState>) {
        if !self.active {
            return;
        }
        self.fade.cancel();
        self.finish(states);
    }

    pub fn rename(&mut self, old: &str, new: &str) {
        for name in self.from.iter_mut().chain(self.to.iter_mut()) {
            if name == old {
                *name = new.to_string();
            }
        }
    }
}
