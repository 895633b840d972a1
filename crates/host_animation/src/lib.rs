//! # Host Animation
//!
//! A layered animation blending engine for character hosts.
//!
//! An [`AnimationFeature`] is a stack of [`AnimationLayer`]s, bottom first. Each layer owns a set
//! of named animation states (single clips, free blends, 1D/2D parametric blends, queues and
//! random pools) and crossfades between them. Every frame the host calls
//! [`AnimationFeature::update`] with the frame delta in milliseconds. Weights are then
//! computed from the top layer down and pushed to the clips through
//! [`ClipAction`](host_animation_core::clip::ClipAction).
//!
//! Time-based operations return a [`Deferred`](host_animation_core::deferred::Deferred) that is
//! stepped by the engine itself, so the host can hook into completion without an async runtime.
//!
//! Stacks can also be described in RON and loaded with [`AnimationFeature::from_ron`].
//!
//! [`AnimationFeature`]: feature::AnimationFeature
//! [`AnimationLayer`]: layer::AnimationLayer
//! [`AnimationFeature::update`]: feature::AnimationFeature::update
//! [`AnimationFeature::from_ron`]: feature::AnimationFeature::from_ron

pub mod errors;
pub mod events;
pub mod feature;
pub mod layer;
pub mod loader;
pub mod serial;
pub mod state;
pub mod utils;

pub mod prelude {
    pub use super::errors::ConfigError;
    pub use super::events::{AnimationEvent, LayerObserver};
    pub use super::feature::AnimationFeature;
    pub use super::layer::{AnimationLayer, LayerOptions};
    pub use super::loader::{ClipProvider, SimulatedClips};
    pub use super::serial::{AnimationStackSerial, LayerSerial, StateKindSerial, StateSerial};
    pub use super::state::{
        AnimationState, Blend1dState, Blend2dState, BlendValue, FreeBlendState, QueueState,
        QueueStep, RandomState, RandomStateOptions, SingleState, SingleStateOptions, StateLike,
    };
    pub use host_animation_core::prelude::*;
}
