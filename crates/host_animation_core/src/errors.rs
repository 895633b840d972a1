use thiserror::Error;

/// Possible errors produced while configuring or driving animation states.
///
/// Structural variants are returned directly from setup calls. Runtime playback failures are
/// delivered through a rejected [`Deferred`](crate::deferred::Deferred) instead.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnimationError {
    #[error("no layer named {0:?}")]
    MissingLayer(String),
    #[error("layer {layer:?} has no animation named {animation:?}")]
    MissingAnimation { layer: String, animation: String },
    #[error("animation {animation:?} has no blend state named {state:?}")]
    MissingBlendState { animation: String, state: String },
    #[error("layer {0:?} has no current animation")]
    NoCurrentAnimation(String),
    #[error("animation {animation:?} does not support {operation}")]
    UnsupportedOperation {
        animation: String,
        operation: &'static str,
    },
    #[error("expected {states} thresholds, got {thresholds}")]
    MismatchedThresholds { states: usize, thresholds: usize },
    #[error("expected {states} phase match flags, got {flags}")]
    MismatchedPhaseMatch { states: usize, flags: usize },
    #[error("thresholds {first} and {second} are at the same position")]
    DuplicateThreshold { first: usize, second: usize },
    #[error("2D thresholds are collinear, no triangle can be formed")]
    CollinearThresholds,
    #[error("queue {0:?} has no states to play")]
    EmptyQueue(String),
    #[error("random animation {0:?} has no states to pick from")]
    EmptyRandom(String),
    #[error("random weights are invalid: {0}")]
    InvalidRandomWeights(String),
    #[error("animation {0:?} has been discarded")]
    Discarded(String),
}

pub type AnimationResult<T> = Result<T, AnimationError>;
