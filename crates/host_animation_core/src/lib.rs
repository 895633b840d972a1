//! # Host Animation Core
//!
//! Engine-agnostic building blocks for the host animation engine:
//!
//! - [`Deferred`]: a manually stepped, cancelable future. Every time-based operation in the
//!   engine (weight fades, blend value changes, queue and random timers) is a `Deferred` that its
//!   owner executes once per frame with the frame delta.
//! - [`Tween`] and [`wait`](tween::wait): interpolation and timers built on top of `Deferred`.
//! - [`Easing`]: easing curves for tweens.
//! - [`ClipAction`]: the interface a rendering adapter implements for a single playable clip,
//!   plus [`SimulatedClip`] for headless use.
//! - [`Triangulation`]: Delaunay triangulation used by 2D blend spaces.
//!
//! [`Deferred`]: deferred::Deferred
//! [`Tween`]: tween::Tween
//! [`Easing`]: easing::Easing
//! [`ClipAction`]: clip::ClipAction
//! [`SimulatedClip`]: clip::SimulatedClip
//! [`Triangulation`]: delaunay::Triangulation

pub mod clip;
pub mod deferred;
pub mod delaunay;
pub mod easing;
pub mod errors;
pub mod geometry;
pub mod tween;

pub mod prelude {
    pub use super::clip::{BlendMode, ClipAction, LoopCount, SimulatedClip};
    pub use super::deferred::{Deferred, DeferredStatus};
    pub use super::delaunay::Triangulation;
    pub use super::easing::Easing;
    pub use super::errors::{AnimationError, AnimationResult};
    pub use super::tween::{Interpolate, Tween, Tweened, wait};
}
