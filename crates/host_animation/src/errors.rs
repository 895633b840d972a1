use host_animation_core::errors::AnimationError;
use thiserror::Error;

/// Possible errors produced while building an animation stack from its serialized description
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A [RON](ron) Error
    #[error("could not parse RON: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("no clip named {0:?} is available")]
    MissingClip(String),
    #[error("invalid animation {name:?}: {source}")]
    InvalidAnimation {
        name: String,
        #[source]
        source: AnimationError,
    },
    #[error(transparent)]
    Animation(#[from] AnimationError),
}
