use host_animation_core::clip::{BlendMode, LoopCount};
use serde::{Deserialize, Serialize};

fn one() -> f32 {
    1.
}

fn default_play_interval() -> f32 {
    3.
}

/// Serialized form of a whole animation stack, as stored in `*.animstack.ron` files.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AnimationStackSerial {
    /// Bottom layer first
    #[serde(default)]
    pub layers: Vec<LayerSerial>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LayerSerial {
    pub name: String,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(default = "one")]
    pub weight: f32,
    #[serde(default)]
    pub animations: Vec<StateSerial>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StateSerial {
    pub name: String,
    #[serde(default)]
    pub weight: f32,
    pub kind: StateKindSerial,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum StateKindSerial {
    Single {
        clip: String,
        #[serde(default = "one")]
        time_scale: f32,
        #[serde(default)]
        loop_count: LoopCount,
    },
    FreeBlend {
        states: Vec<StateSerial>,
    },
    Blend1d {
        states: Vec<StateSerial>,
        thresholds: Vec<f32>,
        #[serde(default)]
        phase_match: Vec<bool>,
    },
    Blend2d {
        states: Vec<StateSerial>,
        thresholds: Vec<(f32, f32)>,
        #[serde(default)]
        phase_match: Vec<bool>,
    },
    Queue {
        states: Vec<StateSerial>,
        #[serde(default)]
        wrap: bool,
    },
    Random {
        states: Vec<StateSerial>,
        #[serde(default = "default_play_interval")]
        play_interval: f32,
        #[serde(default)]
        seed: Option<u64>,
        #[serde(default)]
        weights: Option<Vec<f32>>,
    },
}
