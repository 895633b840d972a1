use std::{cell::Cell, rc::Rc};

use bevy_math::Vec2;

use crate::{deferred::Deferred, easing::Easing};

/// Values that a [`Tween`] can interpolate between.
pub trait Interpolate: Copy + 'static {
    fn interpolate(self, to: Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Interpolate for Vec2 {
    fn interpolate(self, to: Self, t: f32) -> Self {
        self.lerp(to, t)
    }
}

/// Time-based interpolation of a value, driven by a [`Deferred`] executable.
///
/// Each call to [`Tween::advance`] feeds the frame delta (milliseconds) into the deferred, which
/// accumulates elapsed time, writes the eased value and resolves once the duration is reached.
/// Canceling the deferred freezes the value where it is.
#[derive(Debug, Clone)]
pub struct Tween<T: Interpolate> {
    value: Rc<Cell<T>>,
    deferred: Deferred,
}

impl<T: Interpolate> Tween<T> {
    /// Interpolates from `from` to `to` over `seconds`. A non-positive duration jumps straight to
    /// `to` and returns an already resolved tween.
    pub fn new(from: T, to: T, seconds: f32, easing: Easing) -> Self {
        if seconds <= 0. {
            return Self {
                value: Rc::new(Cell::new(to)),
                deferred: Deferred::resolved(),
            };
        }

        let value = Rc::new(Cell::new(from));
        let duration = seconds * 1000.;
        let mut elapsed = 0.;

        let target = value.clone();
        let deferred = Deferred::with_executable(move |deferred, delta| {
            elapsed += delta.max(0.);
            let t = (elapsed / duration).min(1.);
            if t >= 1. {
                target.set(to);
                deferred.resolve();
            } else {
                target.set(from.interpolate(to, easing.apply(t)));
            }
        });

        Self { value, deferred }
    }

    /// Steps the tween by `delta` milliseconds and returns the current value.
    pub fn advance(&self, delta: f32) -> T {
        self.deferred.execute(delta);
        self.value.get()
    }

    pub fn value(&self) -> T {
        self.value.get()
    }

    pub fn deferred(&self) -> &Deferred {
        &self.deferred
    }

    pub fn is_settled(&self) -> bool {
        !self.deferred.is_pending()
    }
}

/// A value together with the tween (if any) currently moving it.
///
/// Setting a new target replaces and cancels the previous tween, so one value is never driven
/// by two competing tweens.
#[derive(Debug, Default)]
pub struct Tweened<T: Interpolate> {
    value: T,
    tween: Option<Tween<T>>,
}

impl<T: Interpolate> Tweened<T> {
    pub fn new(value: T) -> Self {
        Self { value, tween: None }
    }

    pub fn value(&self) -> T {
        self.value
    }

    pub fn is_tweening(&self) -> bool {
        self.tween.is_some()
    }

    /// Starts moving towards `target` and returns the deferred that resolves when it gets there.
    pub fn set(&mut self, target: T, seconds: f32, easing: Easing) -> Deferred {
        self.cancel();

        let tween = Tween::new(self.value, target, seconds, easing);
        self.value = tween.value();
        let deferred = tween.deferred().clone();
        if deferred.is_pending() {
            self.tween = Some(tween);
        }
        deferred
    }

    /// Jumps to `value`, canceling any tween in flight.
    pub fn set_now(&mut self, value: T) {
        self.cancel();
        self.value = value;
    }

    pub fn advance(&mut self, delta: f32) {
        if let Some(tween) = &self.tween {
            self.value = tween.advance(delta);
            if tween.is_settled() {
                self.tween = None;
            }
        }
    }

    pub fn cancel(&mut self) {
        if let Some(tween) = self.tween.take() {
            tween.deferred().cancel();
        }
    }
}

/// Returns a deferred that resolves once `seconds` worth of deltas have been executed into it.
pub fn wait(seconds: f32) -> Deferred {
    if seconds <= 0. {
        return Deferred::resolved();
    }

    let duration = seconds * 1000.;
    let mut elapsed = 0.;
    Deferred::with_executable(move |deferred, delta| {
        elapsed += delta.max(0.);
        if elapsed >= duration {
            deferred.resolve();
        }
    })
}
