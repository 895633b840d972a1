use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// Maps normalized progress `t` in `[0, 1]` onto eased progress in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    QuadraticIn,
    QuadraticOut,
    QuadraticInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuarticIn,
    QuarticOut,
    QuarticInOut,
    SineIn,
    SineOut,
    SineInOut,
    ExponentialIn,
    ExponentialOut,
    ExponentialInOut,
    #[serde(skip)]
    Custom(fn(f32) -> f32),
}

impl Easing {
    /// Evaluates the easing curve. Input is clamped to `[0, 1]`.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0., 1.);
        match self {
            Easing::Linear => t,
            Easing::QuadraticIn => t * t,
            Easing::QuadraticOut => t * (2. - t),
            Easing::QuadraticInOut => {
                if t < 0.5 {
                    2. * t * t
                } else {
                    -1. + (4. - 2. * t) * t
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => {
                let u = t - 1.;
                u * u * u + 1.
            }
            Easing::CubicInOut => {
                if t < 0.5 {
                    4. * t * t * t
                } else {
                    let u = 2. * t - 2.;
                    0.5 * u * u * u + 1.
                }
            }
            Easing::QuarticIn => t * t * t * t,
            Easing::QuarticOut => {
                let u = t - 1.;
                1. - u * u * u * u
            }
            Easing::QuarticInOut => {
                if t < 0.5 {
                    8. * t * t * t * t
                } else {
                    let u = t - 1.;
                    1. - 8. * u * u * u * u
                }
            }
            Easing::SineIn => 1. - (t * PI / 2.).cos(),
            Easing::SineOut => (t * PI / 2.).sin(),
            Easing::SineInOut => 0.5 * (1. - (PI * t).cos()),
            Easing::ExponentialIn => {
                if t == 0. {
                    0.
                } else {
                    2f32.powf(10. * (t - 1.))
                }
            }
            Easing::ExponentialOut => {
                if t == 1. {
                    1.
                } else {
                    1. - 2f32.powf(-10. * t)
                }
            }
            Easing::ExponentialInOut => {
                if t == 0. || t == 1. {
                    t
                } else if t < 0.5 {
                    0.5 * 2f32.powf(20. * t - 10.)
                } else {
                    1. - 0.5 * 2f32.powf(-20. * t + 10.)
                }
            }
            Easing::Custom(f) => f(t),
        }
    }
}
