//! Easing curves
//!
//! Ten named curves, each usable as ease-in, ease-out, or ease-in-out.
//! All curves map progress 0 to 0 and progress 1 to 1; `back` and
//! `elastic` overshoot in between.

use std::f32::consts::TAU;

/// Named easing curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EasingFunc {
    /// Quarter sine wave
    Sine,
    /// Quadratic
    Quad,
    /// Cubic
    Cubic,
    /// Quartic
    Quart,
    /// Quintic
    Quint,
    /// Exponential (base 2)
    Expo,
    /// Circular arc
    Circ,
    /// Overshooting cubic
    Back,
    /// Exponentially decaying sine, overshooting
    Elastic,
    /// Piecewise parabolic bounce
    Bounce,
}

/// Which end of the curve accelerates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EasingMode {
    /// Slow start
    In,
    /// Slow end
    Out,
    /// Slow start and end
    InOut,
}

fn sine_in(t: f32) -> f32 {
    1.0 - (t * TAU / 4.0).cos()
}

fn sine_out(t: f32) -> f32 {
    (t * TAU / 4.0).sin()
}

fn sine_in_out(t: f32) -> f32 {
    -0.5 * ((t * TAU / 2.0).cos() - 1.0)
}

fn quad_in(t: f32) -> f32 {
    t * t
}

fn quad_out(t: f32) -> f32 {
    t * (2.0 - t)
}

fn quad_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

fn cubic_in(t: f32) -> f32 {
    t * t * t
}

fn cubic_out(t: f32) -> f32 {
    (t - 1.0) * (t - 1.0) * (t - 1.0) + 1.0
}

fn cubic_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        (t - 1.0) * (2.0 * t - 2.0) * (2.0 * t - 2.0) + 1.0
    }
}

fn quart_in(t: f32) -> f32 {
    t * t * t * t
}

fn quart_out(t: f32) -> f32 {
    1.0 - (t - 1.0) * (t - 1.0) * (t - 1.0) * (t - 1.0)
}

fn quart_in_out(t: f32) -> f32 {
    if t < 0.5 {
        8.0 * t * t * t * t
    } else {
        1.0 - 8.0 * (t - 1.0) * (t - 1.0) * (t - 1.0) * (t - 1.0)
    }
}

fn quint_in(t: f32) -> f32 {
    t * t * t * t * t
}

fn quint_out(t: f32) -> f32 {
    1.0 + (t - 1.0) * (t - 1.0) * (t - 1.0) * (t - 1.0) * (t - 1.0)
}

fn quint_in_out(t: f32) -> f32 {
    if t < 0.5 {
        16.0 * t * t * t * t * t
    } else {
        1.0 + 16.0 * (t - 1.0) * (t - 1.0) * (t - 1.0) * (t - 1.0) * (t - 1.0)
    }
}

fn expo_in(t: f32) -> f32 {
    2.0_f32.powf(10.0 * (t - 1.0))
}

fn expo_out(t: f32) -> f32 {
    1.0 - 2.0_f32.powf(-10.0 * t)
}

fn expo_in_out(t: f32) -> f32 {
    if t < 0.5 {
        0.5 * 2.0_f32.powf(10.0 * (2.0 * t - 1.0))
    } else {
        0.5 * (2.0 - 2.0_f32.powf(-10.0 * (t * 2.0 - 1.0)))
    }
}

fn circ_in(t: f32) -> f32 {
    1.0 - (1.0 - t * t).sqrt()
}

fn circ_out(t: f32) -> f32 {
    (1.0 - (t - 1.0) * (t - 1.0)).sqrt()
}

fn circ_in_out(t: f32) -> f32 {
    if t < 0.5 {
        0.5 * (-(1.0 - (t * 2.0) * (t * 2.0)).sqrt() + 1.0)
    } else {
        0.5 * ((1.0 - (t * 2.0 - 2.0) * (t * 2.0 - 2.0)).sqrt() + 1.0)
    }
}

const BACK_OVERSHOOT: f32 = 1.70158;

fn back_in(t: f32) -> f32 {
    let s = BACK_OVERSHOOT;
    t * t * ((s + 1.0) * t - s)
}

fn back_out(t: f32) -> f32 {
    let s = BACK_OVERSHOOT;
    (t - 1.0) * (t - 1.0) * ((s + 1.0) * (t - 1.0) + s) + 1.0
}

fn back_in_out(t: f32) -> f32 {
    let s = BACK_OVERSHOOT * 1.525;
    if t < 0.5 {
        0.5 * ((t * 2.0) * (t * 2.0) * ((s + 1.0) * (t * 2.0) - s))
    } else {
        0.5 * ((t * 2.0 - 2.0) * (t * 2.0 - 2.0) * ((s + 1.0) * (t * 2.0 - 2.0) + s) + 2.0)
    }
}

fn elastic_in(t: f32) -> f32 {
    if t == 0.0 || t == 1.0 {
        return t;
    }
    let p = 0.3;
    -(2.0_f32.powf(10.0 * (t - 1.0))) * (((t - 1.0) - p / 4.0) * TAU / p).sin()
}

fn elastic_out(t: f32) -> f32 {
    if t == 0.0 || t == 1.0 {
        return t;
    }
    let p = 0.3;
    2.0_f32.powf(-10.0 * t) * ((t - p / 4.0) * TAU / p).sin() + 1.0
}

fn elastic_in_out(t: f32) -> f32 {
    if t == 0.0 || t == 1.0 {
        return t;
    }
    let p = 0.3 * 1.5;
    if t < 0.5 {
        -0.5 * 2.0_f32.powf(10.0 * (t * 2.0 - 1.0)) * (((t * 2.0 - 1.0) - p / 4.0) * TAU / p).sin()
    } else {
        0.5 * 2.0_f32.powf(-10.0 * (t * 2.0 - 1.0)) * (((t * 2.0 - 1.0) - p / 4.0) * TAU / p).sin()
            + 1.0
    }
}

fn bounce_out(t: f32) -> f32 {
    if t < 1.0 / 2.75 {
        7.5625 * t * t
    } else if t < 2.0 / 2.75 {
        7.5625 * (t - 1.5 / 2.75) * (t - 1.5 / 2.75) + 0.75
    } else if t < 2.5 / 2.75 {
        7.5625 * (t - 2.25 / 2.75) * (t - 2.25 / 2.75) + 0.9375
    } else {
        7.5625 * (t - 2.625 / 2.75) * (t - 2.625 / 2.75) + 0.984375
    }
}

fn bounce_in(t: f32) -> f32 {
    1.0 - bounce_out(1.0 - t)
}

fn bounce_in_out(t: f32) -> f32 {
    if t < 0.5 {
        bounce_out(t * 2.0) * 0.5
    } else {
        bounce_out(t * 2.0 - 1.0) * 0.5 + 0.5
    }
}

/// Remap progress `t` in [0, 1] through the named curve and mode
pub fn ease(func: EasingFunc, mode: EasingMode, t: f32) -> f32 {
    match mode {
        EasingMode::In => match func {
            EasingFunc::Sine => sine_in(t),
            EasingFunc::Quad => quad_in(t),
            EasingFunc::Cubic => cubic_in(t),
            EasingFunc::Quart => quart_in(t),
            EasingFunc::Quint => quint_in(t),
            EasingFunc::Expo => expo_in(t),
            EasingFunc::Circ => circ_in(t),
            EasingFunc::Back => back_in(t),
            EasingFunc::Elastic => elastic_in(t),
            EasingFunc::Bounce => bounce_in(t),
        },
        EasingMode::Out => match func {
            EasingFunc::Sine => sine_out(t),
            EasingFunc::Quad => quad_out(t),
            EasingFunc::Cubic => cubic_out(t),
            EasingFunc::Quart => quart_out(t),
            EasingFunc::Quint => quint_out(t),
            EasingFunc::Expo => expo_out(t),
            EasingFunc::Circ => circ_out(t),
            EasingFunc::Back => back_out(t),
            EasingFunc::Elastic => elastic_out(t),
            EasingFunc::Bounce => bounce_out(t),
        },
        EasingMode::InOut => match func {
            EasingFunc::Sine => sine_in_out(t),
            EasingFunc::Quad => quad_in_out(t),
            EasingFunc::Cubic => cubic_in_out(t),
            EasingFunc::Quart => quart_in_out(t),
            EasingFunc::Quint => quint_in_out(t),
            EasingFunc::Expo => expo_in_out(t),
            EasingFunc::Circ => circ_in_out(t),
            EasingFunc::Back => back_in_out(t),
            EasingFunc::Elastic => elastic_in_out(t),
            EasingFunc::Bounce => bounce_in_out(t),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FUNCS: [EasingFunc; 10] = [
        EasingFunc::Sine,
        EasingFunc::Quad,
        EasingFunc::Cubic,
        EasingFunc::Quart,
        EasingFunc::Quint,
        EasingFunc::Expo,
        EasingFunc::Circ,
        EasingFunc::Back,
        EasingFunc::Elastic,
        EasingFunc::Bounce,
    ];

    #[test]
    fn test_endpoints() {
        // Expo does not pass exactly through the endpoints, by construction
        for func in FUNCS.iter().filter(|&&f| f != EasingFunc::Expo) {
            for mode in [EasingMode::In, EasingMode::Out, EasingMode::InOut] {
                assert_relative_eq!(ease(*func, mode, 0.0), 0.0, epsilon = 1e-5);
                assert_relative_eq!(ease(*func, mode, 1.0), 1.0, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_in_out_symmetry_at_midpoint() {
        for func in FUNCS {
            assert_relative_eq!(ease(func, EasingMode::InOut, 0.5), 0.5, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_quad_values() {
        assert_relative_eq!(ease(EasingFunc::Quad, EasingMode::In, 0.5), 0.25);
        assert_relative_eq!(ease(EasingFunc::Quad, EasingMode::Out, 0.5), 0.75);
    }

    #[test]
    fn test_quart_out_is_fourth_power() {
        // 1 - (t-1)^4
        assert_relative_eq!(ease(EasingFunc::Quart, EasingMode::Out, 0.5), 0.9375);
        assert_relative_eq!(ease(EasingFunc::Quart, EasingMode::Out, 0.0), 0.0);
        // A fourth power never leaves [0, 1]; a mis-paired cubic would
        for i in 0..=100 {
            let value = ease(EasingFunc::Quart, EasingMode::Out, i as f32 / 100.0);
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_back_overshoots() {
        // Ease-out overshoots above 1 partway through
        let peak = (0..100)
            .map(|i| ease(EasingFunc::Back, EasingMode::Out, i as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.0);
    }
}
