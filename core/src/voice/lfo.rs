use std::f32::consts::TAU;

use crate::waveform::wrap_phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LfoShape {
    #[default]
    Sine,
    Triangle,
    Saw,
    Square,
}

impl LfoShape {
    pub const ALL: [LfoShape; 4] = [
        LfoShape::Sine,
        LfoShape::Triangle,
        LfoShape::Saw,
        LfoShape::Square,
    ];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Bipolar value at `phase`.
    pub fn value(&self, phase: f32) -> f32 {
        match self {
            LfoShape::Sine => (phase * TAU).sin(),
            LfoShape::Triangle => {
                let y = 4.0 * phase;
                if y >= 3.0 {
                    y - 4.0
                } else if y > 1.0 {
                    2.0 - y
                } else {
                    y
                }
            }
            LfoShape::Saw => 2.0 * phase - 1.0,
            LfoShape::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

pub const MIN_LFO_RATE: f32 = 0.01;
pub const MAX_LFO_RATE: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct LfoDescriptor {
    pub shape: LfoShape,
    /// Hz
    pub rate: f32,
}

impl Default for LfoDescriptor {
    fn default() -> Self {
        LfoDescriptor {
            shape: LfoShape::Sine,
            rate: 5.0,
        }
    }
}

/// A free-running low frequency oscillator, restarted on every note on.
#[derive(Debug, Clone, Default)]
pub struct Lfo {
    phase: f32,
}

impl Lfo {
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Returns the value at the current phase, then moves `delta` seconds on.
    #[inline(always)]
    pub fn advance(&mut self, desc: &LfoDescriptor, delta: f32) -> f32 {
        let value = desc.shape.value(self.phase);
        let rate = if desc.rate.is_nan() {
            MIN_LFO_RATE
        } else {
            desc.rate.clamp(MIN_LFO_RATE, MAX_LFO_RATE)
        };
        self.phase = wrap_phase(self.phase + rate * delta);
        value
    }
}
