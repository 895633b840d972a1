use host_animation_core::prelude::*;

use super::{StateCore, StateLike};

#[derive(Clone, Copy, Debug)]
pub struct SingleStateOptions {
    pub time_scale: f32,
    pub loop_count: LoopCount,
    pub blend_mode: BlendMode,
}

impl Default for SingleStateOptions {
    fn default() -> Self {
        Self {
            time_scale: 1.,
            loop_count: LoopCount::Infinite,
            blend_mode: BlendMode::Override,
        }
    }
}

/// A state playing one clip.
pub struct SingleState {
    core: StateCore,
    clip: Box<dyn ClipAction>,
    time_scale: f32,
    loop_count: LoopCount,
    blend_mode: BlendMode,
}

impl SingleState {
    pub fn new(
        name: impl Into<String>,
        clip: impl ClipAction + 'static,
        options: SingleStateOptions,
    ) -> Self {
        Self::from_boxed(name, Box::new(clip), options)
    }

    pub fn from_boxed(
        name: impl Into<String>,
        mut clip: Box<dyn ClipAction>,
        options: SingleStateOptions,
    ) -> Self {
        clip.set_time_scale(options.time_scale);
        clip.set_loop_count(options.loop_count);
        clip.set_effective_weight(0.);

        Self {
            core: StateCore::new(name),
            clip,
            time_scale: options.time_scale,
            loop_count: options.loop_count,
            blend_mode: options.blend_mode,
        }
    }

    pub fn clip(&self) -> &dyn ClipAction {
        self.clip.as_ref()
    }

    pub fn clip_mut(&mut self) -> &mut dyn ClipAction {
        self.clip.as_mut()
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = time_scale;
        self.clip.set_time_scale(time_scale);
    }

    pub fn loop_count(&self) -> LoopCount {
        self.loop_count
    }

    pub fn set_loop_count(&mut self, loop_count: LoopCount) {
        self.loop_count = loop_count;
        self.clip.set_loop_count(loop_count);
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }
}

impl StateLike for SingleState {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn update_internal_weight(&mut self, factor: f32) {
        let internal_weight = self.core.weight() * factor;
        self.core.set_internal_weight(internal_weight);
        self.clip.set_effective_weight(internal_weight);
    }

    fn update(&mut self, delta: f32) {
        if !self.core.is_active() {
            return;
        }
        self.core.advance_weight(delta);

        if self.core.play_deferred().is_pending() && self.clip.advance(delta / 1000.) {
            self.core.play_deferred().resolve();
        }
    }

    fn play(&mut self) -> Deferred {
        if self.core.is_discarded() {
            return self.core.discarded_error();
        }
        let deferred = self.core.begin_play();
        self.core.set_paused(false);

        self.clip.reset();
        self.clip.set_time_scale(self.time_scale);
        self.clip.set_loop_count(self.loop_count);
        self.clip.play();

        deferred
    }

    fn pause(&mut self) -> bool {
        if self.core.is_discarded() {
            return false;
        }
        self.core.set_paused(true);
        self.clip.pause();
        true
    }

    fn resume(&mut self) -> Deferred {
        if self.core.is_discarded() {
            return self.core.discarded_error();
        }
        self.core.set_paused(false);
        self.clip.resume();
        self.core.rearm_play()
    }

    fn cancel(&mut self) -> bool {
        self.core.play_deferred().cancel()
    }

    fn stop(&mut self) -> bool {
        if self.core.is_discarded() {
            return false;
        }
        self.core.set_paused(false);
        self.core.play_deferred().resolve();
        self.clip.reset();
        self.clip.pause();
        true
    }

    fn deactivate(&mut self) {
        self.core.set_internal_weight(0.);
        self.clip.set_effective_weight(0.);
    }

    fn discard(&mut self) {
        self.core.discard();
        self.clip.pause();
        self.clip.set_effective_weight(0.);
    }

    fn normalized_time(&self) -> f32 {
        let duration = self.clip.duration();
        if duration > 0. {
            (self.clip.time() / duration).clamp(0., 1.)
        } else {
            0.
        }
    }

    fn set_normalized_time(&mut self, time: f32) {
        let duration = self.clip.duration();
        self.clip.set_time(time.clamp(0., 1.) * duration);
    }

    fn loops_forever(&self) -> bool {
        self.loop_count.is_infinite()
    }

    fn set_blend_mode(&mut self, blend_mode: BlendMode) {
        self.blend_mode = blend_mode;
    }
}
