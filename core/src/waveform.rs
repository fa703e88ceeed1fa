//! Per-sample waveform generation.
//!
//! [`Waveform::sample`] is a pure function of the phase and the shape
//! parameters. Noise shapes are aperiodic, so their generator state lives in
//! [`NoiseState`] and the current noise value is passed in through
//! [`ShapeParams::noise`].

use std::{f32::consts::TAU, sync::Arc};

pub mod interpolation;
pub use interpolation::Interpolator;

pub mod noise;
pub use noise::{LfsrNoise, LfsrWidth, NoiseState, WhiteNoise};

pub mod polyblep;

pub mod wavetable;
pub use wavetable::{additive_table, warm_tables, AdditiveShape, Wavetable, WavetableError};

/// Narrowest and widest allowed pulse duty.
pub const MIN_PULSE_WIDTH: f32 = 0.01;
pub const MAX_PULSE_WIDTH: f32 = 0.99;

/// Clamps a pulse width away from the degenerate 0% and 100% duty cycles.
#[inline(always)]
pub fn clamp_pulse_width(width: f32) -> f32 {
    if width.is_nan() {
        0.5
    } else {
        width.clamp(MIN_PULSE_WIDTH, MAX_PULSE_WIDTH)
    }
}

/// Wraps any phase into [0, 1).
#[inline(always)]
pub fn wrap_phase(phase: f32) -> f32 {
    if !phase.is_finite() {
        return 0.0;
    }
    let wrapped = phase - phase.floor();
    // `phase - floor` can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// A waveform descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Waveform {
    Sine,
    Triangle,
    /// Rising sawtooth
    #[default]
    Saw,
    /// Falling sawtooth
    Ramp,
    Square,
    /// Pulse with the width taken from [`ShapeParams::pulse_width`]
    Pulse,
    Additive(AdditiveShape),
    ChipNoise15,
    ChipNoise7,
    WhiteNoise,
    User(Arc<Wavetable>),
}

/// Built-in waveforms in the order they are exposed as parameter values.
pub const BUILTIN_WAVEFORMS: [Waveform; 12] = [
    Waveform::Sine,
    Waveform::Triangle,
    Waveform::Saw,
    Waveform::Ramp,
    Waveform::Square,
    Waveform::Pulse,
    Waveform::Additive(AdditiveShape::Square),
    Waveform::Additive(AdditiveShape::Saw),
    Waveform::Additive(AdditiveShape::Triangle),
    Waveform::ChipNoise15,
    Waveform::ChipNoise7,
    Waveform::WhiteNoise,
];

/// Parameters shared by every shape at a given sample.
#[derive(Debug, Clone, Copy)]
pub struct ShapeParams {
    /// Phase advanced per sample, `frequency / sample_rate`
    pub phase_increment: f32,
    pub pulse_width: f32,
    pub interpolator: Interpolator,
    /// The current value of the noise generator, used by noise shapes
    pub noise: f32,
}

impl ShapeParams {
    pub fn new(phase_increment: f32) -> Self {
        ShapeParams {
            phase_increment,
            pulse_width: 0.5,
            interpolator: Interpolator::Linear,
            noise: 0.0,
        }
    }
}

impl Waveform {
    /// The parameter value of a built-in waveform. User tables have none.
    pub fn index(&self) -> Option<usize> {
        BUILTIN_WAVEFORMS.iter().position(|w| w == self)
    }

    pub fn from_index(index: usize) -> Self {
        BUILTIN_WAVEFORMS[index.min(BUILTIN_WAVEFORMS.len() - 1)].clone()
    }

    pub fn is_noise(&self) -> bool {
        matches!(
            self,
            Waveform::ChipNoise15 | Waveform::ChipNoise7 | Waveform::WhiteNoise
        )
    }

    /// Advances the matching generator of a noise shape and returns its value.
    #[inline(always)]
    pub fn step_noise(&self, state: &mut NoiseState) -> f32 {
        match self {
            Waveform::ChipNoise15 => state.long.step(),
            Waveform::ChipNoise7 => state.short.step(),
            Waveform::WhiteNoise => state.white.step(),
            _ => 0.0,
        }
    }

    /// Produces one sample at `phase`. The result is always within [-1, 1].
    #[inline(always)]
    pub fn sample(&self, phase: f32, params: &ShapeParams) -> f32 {
        let phase = wrap_phase(phase);
        let dt = if params.phase_increment.is_finite() {
            params.phase_increment.abs().min(0.5)
        } else {
            0.0
        };

        let value = match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Triangle => polyblep::triangle(phase, dt),
            Waveform::Saw => polyblep::saw(phase, dt),
            Waveform::Ramp => -polyblep::saw(phase, dt),
            Waveform::Square => polyblep::pulse(phase, dt, 0.5),
            Waveform::Pulse => polyblep::pulse(phase, dt, clamp_pulse_width(params.pulse_width)),
            Waveform::Additive(shape) => {
                additive_table(*shape).read(phase, dt, params.interpolator)
            }
            Waveform::ChipNoise15 | Waveform::ChipNoise7 | Waveform::WhiteNoise => params.noise,
            Waveform::User(table) => table.read(phase, params.interpolator),
        };

        if value.is_nan() {
            0.0
        } else {
            value.clamp(-1.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periodic_shapes() -> Vec<Waveform> {
        let user = Wavetable::from_samples(&[0.0, 1.0, 0.3, -0.7, -1.0, 0.2]).unwrap();
        let mut shapes = BUILTIN_WAVEFORMS
            .iter()
            .filter(|w| !w.is_noise())
            .cloned()
            .collect::<Vec<_>>();
        shapes.push(Waveform::User(Arc::new(user)));
        shapes
    }

    #[test]
    fn test_bounded_across_audible_range() {
        for sample_rate in [44100.0f32, 48000.0] {
            for freq in [18.0f32, 55.0, 440.0, 1000.0, 4186.0, 10000.0, 15000.0, 20000.0] {
                let dt = freq / sample_rate;
                for shape in periodic_shapes() {
                    for interpolator in Interpolator::ALL {
                        let mut params = ShapeParams::new(dt);
                        params.interpolator = interpolator;
                        params.pulse_width = 0.1;
                        let mut phase = 0.0;
                        for _ in 0..2000 {
                            let v = shape.sample(phase, &params);
                            assert!(
                                (-1.0..=1.0).contains(&v),
                                "{shape:?} at {freq}Hz/{sample_rate}: {v}"
                            );
                            phase = wrap_phase(phase + dt);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_sine_phase() {
        let params = ShapeParams::new(0.01);
        assert_eq!(Waveform::Sine.sample(0.0, &params), 0.0);
        assert!((Waveform::Sine.sample(0.25, &params) - 1.0).abs() < 1e-6);
        assert!((Waveform::Sine.sample(1.25, &params) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ramp_mirrors_saw() {
        let params = ShapeParams::new(0.001);
        for phase in [0.1, 0.3, 0.7] {
            assert_eq!(
                Waveform::Ramp.sample(phase, &params),
                -Waveform::Saw.sample(phase, &params)
            );
        }
    }

    #[test]
    fn test_pulse_width_clamped() {
        let mut params = ShapeParams::new(0.0001);
        params.pulse_width = 0.0;
        // A 0% duty would be silent DC, the clamp keeps a narrow pulse
        assert_eq!(Waveform::Pulse.sample(0.005, &params), 1.0);
        params.pulse_width = f32::NAN;
        assert_eq!(Waveform::Pulse.sample(0.25, &params), 1.0);
        assert_eq!(Waveform::Pulse.sample(0.75, &params), -1.0);
    }

    #[test]
    fn test_noise_passthrough() {
        let mut state = NoiseState::new();
        let mut params = ShapeParams::new(0.01);
        params.noise = Waveform::ChipNoise15.step_noise(&mut state);
        assert_eq!(Waveform::ChipNoise15.sample(0.3, &params), params.noise);
        assert_eq!(Waveform::Sine.step_noise(&mut state), 0.0);
    }

    #[test]
    fn test_waveform_indexes() {
        for (i, w) in BUILTIN_WAVEFORMS.iter().enumerate() {
            assert_eq!(w.index(), Some(i));
            assert_eq!(&Waveform::from_index(i), w);
        }
        assert_eq!(Waveform::from_index(100), Waveform::WhiteNoise);
    }

    #[test]
    fn test_wrap_phase() {
        assert_eq!(wrap_phase(1.25), 0.25);
        assert_eq!(wrap_phase(-0.25), 0.75);
        assert_eq!(wrap_phase(f32::INFINITY), 0.0);
        assert!(wrap_phase(-1e-9) < 1.0);
    }
}
