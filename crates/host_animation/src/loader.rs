use std::collections::HashMap;

use bevy_math::Vec2;
use host_animation_core::{
    clip::{ClipAction, SimulatedClip},
    errors::AnimationError,
};

use crate::{
    errors::ConfigError,
    feature::AnimationFeature,
    layer::LayerOptions,
    serial::{AnimationStackSerial, StateKindSerial, StateSerial},
    state::{
        AnimationState, Blend1dState, Blend2dState, FreeBlendState, QueueState, RandomState,
        RandomStateOptions, SingleState, SingleStateOptions,
    },
};

/// Resolves clip names found in a serialized stack into playable clips.
pub trait ClipProvider {
    fn clip(&mut self, name: &str) -> Option<Box<dyn ClipAction>>;
}

impl<F> ClipProvider for F
where
    F: FnMut(&str) -> Option<Box<dyn ClipAction>>,
{
    fn clip(&mut self, name: &str) -> Option<Box<dyn ClipAction>> {
        self(name)
    }
}

/// Provides [`SimulatedClip`]s for a fixed set of clip names and durations.
#[derive(Clone, Debug, Default)]
pub struct SimulatedClips {
    durations: HashMap<String, f32>,
}

impl SimulatedClips {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clip(mut self, name: impl Into<String>, duration: f32) -> Self {
        self.durations.insert(name.into(), duration);
        self
    }
}

impl<S: Into<String>> FromIterator<(S, f32)> for SimulatedClips {
    fn from_iter<T: IntoIterator<Item = (S, f32)>>(iter: T) -> Self {
        Self {
            durations: iter
                .into_iter()
                .map(|(name, duration)| (name.into(), duration))
                .collect(),
        }
    }
}

impl ClipProvider for SimulatedClips {
    fn clip(&mut self, name: &str) -> Option<Box<dyn ClipAction>> {
        let duration = *self.durations.get(name)?;
        Some(Box::new(SimulatedClip::new(duration)))
    }
}

impl StateSerial {
    pub fn build(&self, clips: &mut impl ClipProvider) -> Result<AnimationState, ConfigError> {
        let invalid = |source: AnimationError| ConfigError::InvalidAnimation {
            name: self.name.clone(),
            source,
        };

        let state: AnimationState = match &self.kind {
            StateKindSerial::Single {
                clip,
                time_scale,
                loop_count,
            } => {
                let action = clips
                    .clip(clip)
                    .ok_or_else(|| ConfigError::MissingClip(clip.clone()))?;
                SingleState::from_boxed(
                    &self.name,
                    action,
                    SingleStateOptions {
                        time_scale: *time_scale,
                        loop_count: *loop_count,
                        ..Default::default()
                    },
                )
                .into()
            }
            StateKindSerial::FreeBlend { states } => {
                FreeBlendState::new(&self.name, build_all(states, clips)?).into()
            }
            StateKindSerial::Blend1d {
                states,
                thresholds,
                phase_match,
            } => Blend1dState::new(
                &self.name,
                build_all(states, clips)?,
                thresholds.clone(),
                phase_match.clone(),
            )
            .map_err(invalid)?
            .into(),
            StateKindSerial::Blend2d {
                states,
                thresholds,
                phase_match,
            } => Blend2dState::new(
                &self.name,
                build_all(states, clips)?,
                thresholds.iter().map(|(x, y)| Vec2::new(*x, *y)).collect(),
                phase_match.clone(),
            )
            .map_err(invalid)?
            .into(),
            StateKindSerial::Queue { states, wrap } => {
                QueueState::new(&self.name, build_all(states, clips)?, *wrap).into()
            }
            StateKindSerial::Random {
                states,
                play_interval,
                seed,
                weights,
            } => RandomState::new(
                &self.name,
                build_all(states, clips)?,
                RandomStateOptions {
                    play_interval: *play_interval,
                    seed: *seed,
                    weights: weights.clone(),
                },
            )
            .map_err(invalid)?
            .into(),
        };

        Ok(state.with_weight(self.weight))
    }
}

fn build_all(
    states: &[StateSerial],
    clips: &mut impl ClipProvider,
) -> Result<Vec<AnimationState>, ConfigError> {
    states.iter().map(|state| state.build(clips)).collect()
}

impl AnimationFeature {
    pub fn from_serial(
        serial: &AnimationStackSerial,
        clips: &mut impl ClipProvider,
    ) -> Result<Self, ConfigError> {
        let mut feature = Self::new();
        for layer in &serial.layers {
            let name = feature.add_layer(
                &layer.name,
                LayerOptions {
                    blend_mode: layer.blend_mode,
                    weight: layer.weight,
                },
                None,
            );
            for animation in &layer.animations {
                feature.add_animation(&name, animation.build(clips)?)?;
            }
        }
        Ok(feature)
    }

    /// Builds a stack from the contents of an `*.animstack.ron` file.
    pub fn from_ron(source: &str, clips: &mut impl ClipProvider) -> Result<Self, ConfigError> {
        let serial: AnimationStackSerial = ron::de::from_str(source)?;
        Self::from_serial(&serial, clips)
    }
}
