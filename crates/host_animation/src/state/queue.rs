use bevy_log::debug;
use host_animation_core::prelude::*;

use super::{AnimationState, StateCore, StateGroup, StateLike};

/// Passed to the queue callback every time the queue moves to another child.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueStep {
    pub name: String,
    /// `false` when the new child loops forever, so the queue only moves on when told to.
    pub can_advance: bool,
    pub is_queue_end: bool,
}

type OnNext = Box<dyn FnMut(&QueueStep)>;

/// Plays its children one after another.
///
/// The current child carries the whole weight of the queue. When it finishes on its own the
/// queue moves to the next one. After the last child the queue either wraps around or
/// resolves its play.
pub struct QueueState {
    core: StateCore,
    states: StateGroup,
    cursor: usize,
    done: bool,
    wrap: bool,
    on_next: Option<OnNext>,
}

impl QueueState {
    pub fn new(
        name: impl Into<String>,
        states: impl IntoIterator<Item = AnimationState>,
        wrap: bool,
    ) -> Self {
        Self {
            core: StateCore::new(name),
            states: StateGroup::new(states),
            cursor: 0,
            done: false,
            wrap,
            on_next: None,
        }
    }

    pub fn with_on_next(mut self, on_next: impl FnMut(&QueueStep) + 'static) -> Self {
        self.set_on_next(on_next);
        self
    }

    pub fn set_on_next(&mut self, on_next: impl FnMut(&QueueStep) + 'static) {
        self.on_next = Some(Box::new(on_next));
    }

    pub fn states(&self) -> &StateGroup {
        &self.states
    }

    pub fn wraps(&self) -> bool {
        self.wrap
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_name(&self) -> Option<&str> {
        self.states.get_index(self.cursor).map(StateLike::name)
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    fn empty_error(&mut self) -> Deferred {
        let error = AnimationError::EmptyQueue(self.core.name().to_string());
        self.core.play_deferred().reject(error.clone());
        Deferred::rejected(error)
    }

    /// Gives the whole weight to the child under the cursor.
    fn select_current(&mut self) {
        let cursor = self.cursor;
        for (i, state) in self.states.iter_mut().enumerate() {
            state.core_mut().set_weight_now(if i == cursor { 1. } else { 0. });
        }
    }

    fn start_current(&mut self) {
        self.select_current();
        if let Some(state) = self.states.get_index_mut(self.cursor) {
            state.play();
        }
    }

    fn notify_next(&mut self) {
        let Some(state) = self.states.get_index(self.cursor) else {
            return;
        };
        let step = QueueStep {
            name: state.name().to_string(),
            can_advance: !state.loops_forever(),
            is_queue_end: self.cursor + 1 == self.states.len(),
        };
        debug!("Queue {:?} moved to {:?}", self.core.name(), step.name);

        if let Some(on_next) = &mut self.on_next {
            on_next(&step);
        }
    }

    /// Ends the current child and moves on to the next one.
    pub fn next(&mut self) -> Deferred {
        if self.core.is_discarded() {
            return self.core.discarded_error();
        }
        if self.states.is_empty() {
            return self.empty_error();
        }
        if self.done {
            return self.core.play_deferred().clone();
        }

        if let Some(current) = self.states.get_index_mut(self.cursor) {
            current.cancel();
            current.deactivate();
        }

        if self.cursor + 1 < self.states.len() {
            self.cursor += 1;
        } else if self.wrap {
            self.cursor = 0;
        } else {
            self.done = true;
            self.core.play_deferred().resolve();
            return self.core.play_deferred().clone();
        }

        self.start_current();
        self.notify_next();
        self.core.play_deferred().clone()
    }
}

impl StateLike for QueueState {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn update_internal_weight(&mut self, factor: f32) {
        let internal_weight = self.core.weight() * factor;
        self.core.set_internal_weight(internal_weight);

        let cursor = self.cursor;
        for (i, state) in self.states.iter_mut().enumerate() {
            if i == cursor {
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
        if self.done || !self.core.play_deferred().is_pending() {
            return;
        }

        let finished = match self.states.get_index_mut(self.cursor) {
            Some(current) => {
                current.update(delta);
                current.play_deferred().is_resolved()
            }
            None => false,
        };
        if finished {
            self.next();
        }
    }

    fn play(&mut self) -> Deferred {
        if self.core.is_discarded() {
            return self.core.discarded_error();
        }
        if self.states.is_empty() {
            self.core.begin_play();
            return self.empty_error();
        }

        let deferred = self.core.begin_play();
        self.core.set_paused(false);
        self.states.cancel_all();
        self.cursor = 0;
        self.done = false;
        self.start_current();
        self.notify_next();
        deferred
    }

    fn pause(&mut self) -> bool {
        if self.core.is_discarded() {
            return false;
        }
        self.core.set_paused(true);
        if let Some(current) = self.states.get_index_mut(self.cursor) {
            current.pause();
        }
        true
    }

    fn resume(&mut self) -> Deferred {
        if self.core.is_discarded() {
            return self.core.discarded_error();
        }
        if self.states.is_empty() {
            return self.empty_error();
        }
        self.core.set_paused(false);
        if self.done {
            return self.core.play_deferred().clone();
        }
        if let Some(current) = self.states.get_index_mut(self.cursor) {
            current.resume();
        }
        self.core.rearm_play()
    }

    fn cancel(&mut self) -> bool {
        let canceled = self.core.play_deferred().cancel();
        if let Some(current) = self.states.get_index_mut(self.cursor) {
            current.cancel();
        }
        canceled
    }

    fn stop(&mut self) -> bool {
        if self.core.is_discarded() {
            return false;
        }
        self.core.set_paused(false);
        self.states.stop_all();
        self.core.play_deferred().resolve();
        self.cursor = 0;
        self.done = false;
        self.select_current();
        true
    }

    fn deactivate(&mut self) {
        self.core.set_internal_weight(0.);
        self.states.deactivate_all();
    }

    fn discard(&mut self) {
        self.core.discard();
        self.states.discard_all();
    }

    fn normalized_time(&self) -> f32 {
        self.states
            .get_index(self.cursor)
            .map_or(0., StateLike::normalized_time)
    }

    fn set_normalized_time(&mut self, time: f32) {
        if let Some(current) = self.states.get_index_mut(self.cursor) {
            current.set_normalized_time(time);
        }
    }

    fn loops_forever(&self) -> bool {
        self.wrap || self.states.any_loops_forever()
    }

    fn set_blend_mode(&mut self, blend_mode: BlendMode) {
        self.states.set_blend_mode_all(blend_mode)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::super::test_support::*;
    use super::*;

    fn greeting(wrap: bool) -> QueueState {
        let mut queue = QueueState::new(
            "greeting",
            [finite_clip("wave", 1., 1), finite_clip("nod", 0.5, 1)],
            wrap,
        );
        queue.set_weight(1., 0., Easing::Linear);
        queue
    }

    #[test]
    fn plays_children_in_order_and_resolves() {
        let mut queue = greeting(false);
        let play = queue.play();
        assert_eq!(queue.current_name(), Some("wave"));

        queue.update(1000.);
        assert_eq!(queue.current_name(), Some("nod"));
        assert!(play.is_pending());

        queue.update(500.);
        assert!(queue.is_done());
        assert!(play.is_resolved());
    }

    #[test]
    fn current_child_carries_the_weight() {
        let mut queue = greeting(false);
        queue.play();
        queue.next();
        queue.update_internal_weight(0.5);

        assert_eq!(queue.states().get("wave").unwrap().internal_weight(), 0.);
        assert!(approx(queue.states().get("nod").unwrap().internal_weight(), 0.5));
    }

    #[test]
    fn wrapping_queue_restarts() {
        let mut queue = greeting(true);
        let play = queue.play();
        queue.update(1000.);
        queue.update(500.);

        assert_eq!(queue.current_name(), Some("wave"));
        assert!(play.is_pending());
        assert!(queue.loops_forever());
    }

    #[test]
    fn replay_restarts_from_first_child() {
        let mut queue = greeting(false);
        let first = queue.play();
        queue.next();

        let second = queue.play();
        assert!(first.is_canceled());
        assert!(second.is_pending());
        assert_eq!(queue.cursor(), 0);
    }

    #[test]
    fn on_next_reports_each_step() {
        let steps = Rc::new(RefCell::new(Vec::new()));
        let recorded = steps.clone();
        let mut queue = QueueState::new(
            "intro",
            [finite_clip("wave", 1., 1), clip("idle", 1.)],
            false,
        )
        .with_on_next(move |step| recorded.borrow_mut().push(step.clone()));

        queue.play();
        queue.next();

        let steps = steps.borrow();
        assert_eq!(steps.len(), 2);
        assert_eq!(
            steps[1],
            QueueStep {
                name: "idle".into(),
                can_advance: false,
                is_queue_end: true,
            }
        );
        assert!(steps[0].can_advance);
    }

    #[test]
    fn empty_queue_rejects() {
        let mut queue = QueueState::new("nothing", Vec::<AnimationState>::new(), false);
        let play = queue.play();
        assert_eq!(
            play.error(),
            Some(AnimationError::EmptyQueue("nothing".into()))
        );
    }
}
