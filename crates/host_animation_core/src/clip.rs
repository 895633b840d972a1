use serde::{Deserialize, Serialize};

/// Whether a layer (or clip) replaces the layers beneath it or adds on top of them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Override,
    Additive,
}

/// How many times a clip plays before finishing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopCount {
    #[default]
    Infinite,
    Finite(u32),
}

impl LoopCount {
    pub fn is_infinite(&self) -> bool {
        matches!(self, LoopCount::Infinite)
    }
}

/// Playable clip handle supplied by a rendering-engine adapter.
///
/// The engine only drives playback state and effective weight through this trait; how the
/// adapter applies the clip to a skeleton is its own business.
pub trait ClipAction {
    /// Length of one loop, in seconds
    fn duration(&self) -> f32;
    /// Playback position within the current loop, in seconds
    fn time(&self) -> f32;
    fn set_time(&mut self, time: f32);
    fn play(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    /// Rewinds to the start and clears any finished flag
    fn reset(&mut self);
    fn set_time_scale(&mut self, time_scale: f32);
    fn set_loop_count(&mut self, loop_count: LoopCount);
    fn set_effective_weight(&mut self, weight: f32);
    fn effective_weight(&self) -> f32;
    /// Advances playback by `delta` seconds. Returns `true` on the step in which the clip
    /// finishes its last loop.
    fn advance(&mut self, delta: f32) -> bool;
}

/// Headless [`ClipAction`] that just keeps track of time.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulatedClip {
    duration: f32,
    time: f32,
    time_scale: f32,
    loop_count: LoopCount,
    loops_completed: u32,
    playing: bool,
    finished: bool,
    effective_weight: f32,
}

impl SimulatedClip {
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.),
            time: 0.,
            time_scale: 1.,
            loop_count: LoopCount::Infinite,
            loops_completed: 0,
            playing: false,
            finished: false,
            effective_weight: 0.,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) -> bool {
        self.time = if self.time_scale < 0. { 0. } else { self.duration };
        self.playing = false;
        self.finished = true;
        true
    }
}

impl ClipAction for SimulatedClip {
    fn duration(&self) -> f32 {
        self.duration
    }

    fn time(&self) -> f32 {
        self.time
    }

    fn set_time(&mut self, time: f32) {
        self.time = time.clamp(0., self.duration);
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn resume(&mut self) {
        if !self.finished {
            self.playing = true;
        }
    }

    fn reset(&mut self) {
        self.time = 0.;
        self.loops_completed = 0;
        self.finished = false;
    }

    fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = time_scale;
    }

    fn set_loop_count(&mut self, loop_count: LoopCount) {
        self.loop_count = loop_count;
    }

    fn set_effective_weight(&mut self, weight: f32) {
        self.effective_weight = weight;
    }

    fn effective_weight(&self) -> f32 {
        self.effective_weight
    }

    fn advance(&mut self, delta: f32) -> bool {
        if !self.playing || self.finished {
            return false;
        }
        if self.duration <= 0. {
            return self.finish();
        }

        let unwrapped = self.time + delta * self.time_scale;
        let wraps = (unwrapped / self.duration).floor();
        let wraps_completed = wraps.abs() as u32;

        match self.loop_count {
            LoopCount::Infinite => {
                self.time = unwrapped.rem_euclid(self.duration);
                false
            }
            LoopCount::Finite(count) => {
                self.loops_completed = self.loops_completed.saturating_add(wraps_completed);
                if self.loops_completed >= count.max(1) {
                    self.finish()
                } else {
                    self.time = unwrapped.rem_euclid(self.duration);
                    false
                }
            }
        }
    }
}
