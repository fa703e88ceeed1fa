use std::f32::consts::TAU;

use lazy_static::lazy_static;
use rayon::prelude::*;
use thiserror::Error;
use to_vec::ToVec;

use super::interpolation::{read_periodic, Interpolator};

/// Length of every additive table.
pub const ADDITIVE_TABLE_SIZE: usize = 2048;

/// Harmonic counts of the mip levels, richest first.
const MIP_HARMONICS: [usize; 7] = [64, 32, 16, 8, 4, 2, 1];

/// Shapes that are built by summing sine harmonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AdditiveShape {
    Square,
    Saw,
    Triangle,
}

impl AdditiveShape {
    /// Amplitude of the n-th harmonic (1-based).
    fn harmonic_amplitude(&self, n: usize) -> f32 {
        let n_f = n as f32;
        match self {
            AdditiveShape::Square => {
                if n % 2 == 1 {
                    1.0 / n_f
                } else {
                    0.0
                }
            }
            AdditiveShape::Saw => {
                let sign = if n % 2 == 1 { 1.0 } else { -1.0 };
                sign / n_f
            }
            AdditiveShape::Triangle => {
                if n % 2 == 1 {
                    let sign = if (n / 2) % 2 == 0 { 1.0 } else { -1.0 };
                    sign / (n_f * n_f)
                } else {
                    0.0
                }
            }
        }
    }
}

/// Builds one table of `harmonics` summed partials, normalized to unit peak.
fn build_level(shape: AdditiveShape, harmonics: usize) -> Box<[f32]> {
    let mut table = (0..ADDITIVE_TABLE_SIZE)
        .map(|i| {
            let x = TAU * i as f32 / ADDITIVE_TABLE_SIZE as f32;
            (1..=harmonics)
                .map(|n| shape.harmonic_amplitude(n) * (x * n as f32).sin())
                .sum::<f32>()
        })
        .to_vec();

    normalize_peak(&mut table);
    table.into_boxed_slice()
}

fn normalize_peak(table: &mut [f32]) {
    let peak = table.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
    if peak > 0.0 {
        for v in table.iter_mut() {
            *v /= peak;
        }
    }
}

struct MipLevel {
    harmonics: usize,
    table: Box<[f32]>,
}

/// A band-limited additive waveform stored at several harmonic counts.
pub struct MipTable {
    levels: Box<[MipLevel]>,
}

impl MipTable {
    fn build(shape: AdditiveShape) -> Self {
        let levels = MIP_HARMONICS
            .par_iter()
            .map(|&harmonics| MipLevel {
                harmonics,
                table: build_level(shape, harmonics),
            })
            .collect::<Vec<_>>();

        MipTable {
            levels: levels.into_boxed_slice(),
        }
    }

    /// Picks the richest level whose highest harmonic stays under Nyquist.
    fn level_for(&self, phase_increment: f32) -> &MipLevel {
        self.levels
            .iter()
            .find(|level| level.harmonics as f32 * phase_increment < 0.5)
            .unwrap_or(&self.levels[self.levels.len() - 1])
    }

    /// Highest harmonic that would be used at the given phase increment.
    pub fn harmonics_for(&self, phase_increment: f32) -> usize {
        self.level_for(phase_increment).harmonics
    }

    pub fn read(&self, phase: f32, phase_increment: f32, interpolator: Interpolator) -> f32 {
        let level = self.level_for(phase_increment);
        read_periodic(
            &level.table,
            phase * ADDITIVE_TABLE_SIZE as f32,
            interpolator,
        )
    }

    pub fn level(&self, harmonics: usize) -> Option<&[f32]> {
        self.levels
            .iter()
            .find(|l| l.harmonics == harmonics)
            .map(|l| &*l.table)
    }
}

lazy_static! {
    static ref ADDITIVE_SQUARE: MipTable = MipTable::build(AdditiveShape::Square);
    static ref ADDITIVE_SAW: MipTable = MipTable::build(AdditiveShape::Saw);
    static ref ADDITIVE_TRIANGLE: MipTable = MipTable::build(AdditiveShape::Triangle);
}

/// The shared table of an additive shape.
pub fn additive_table(shape: AdditiveShape) -> &'static MipTable {
    match shape {
        AdditiveShape::Square => &*ADDITIVE_SQUARE,
        AdditiveShape::Saw => &*ADDITIVE_SAW,
        AdditiveShape::Triangle => &*ADDITIVE_TRIANGLE,
    }
}

/// Builds every static table so the first render doesn't pay for it.
pub fn warm_tables() {
    lazy_static::initialize(&ADDITIVE_SQUARE);
    lazy_static::initialize(&ADDITIVE_SAW);
    lazy_static::initialize(&ADDITIVE_TRIANGLE);
    lazy_static::initialize(&crate::helpers::FREQS);
}

#[derive(Debug, Error, PartialEq)]
pub enum WavetableError {
    #[error("Wavetable has no samples")]
    Empty,

    #[error("Wavetable sample {0} is not a finite number")]
    NonFinite(usize),
}

/// A single-cycle table supplied by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Wavetable {
    samples: Box<[f32]>,
}

impl Wavetable {
    /// Validates and copies one cycle of samples, normalizing it to unit peak.
    pub fn from_samples(samples: &[f32]) -> Result<Self, WavetableError> {
        if samples.is_empty() {
            return Err(WavetableError::Empty);
        }
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(WavetableError::NonFinite(index));
        }

        let mut samples = samples.to_vec();
        normalize_peak(&mut samples);

        Ok(Wavetable {
            samples: samples.into_boxed_slice(),
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn read(&self, phase: f32, interpolator: Interpolator) -> f32 {
        read_periodic(
            &self.samples,
            phase * self.samples.len() as f32,
            interpolator,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_have_unit_peak() {
        for shape in [
            AdditiveShape::Square,
            AdditiveShape::Saw,
            AdditiveShape::Triangle,
        ] {
            let mip = additive_table(shape);
            for harmonics in MIP_HARMONICS {
                let table = mip.level(harmonics).unwrap();
                assert_eq!(table.len(), ADDITIVE_TABLE_SIZE);
                let peak = table.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
                assert!((peak - 1.0).abs() < 1e-5, "{shape:?} {harmonics}: {peak}");
            }
        }
    }

    #[test]
    fn test_mip_selection_respects_nyquist() {
        let mip = additive_table(AdditiveShape::Saw);
        assert_eq!(mip.harmonics_for(440.0 / 48000.0), 32);
        assert_eq!(mip.harmonics_for(20.0 / 48000.0), 64);
        assert_eq!(mip.harmonics_for(0.4), 1);

        for freq in [18.0f32, 100.0, 1000.0, 5000.0, 12000.0] {
            let dt = freq / 44100.0;
            let harmonics = mip.harmonics_for(dt);
            assert!(harmonics == 1 || harmonics as f32 * dt < 0.5);
        }
    }

    #[test]
    fn test_single_harmonic_is_sine() {
        let table = additive_table(AdditiveShape::Square).level(1).unwrap();
        assert!((table[ADDITIVE_TABLE_SIZE / 4] - 1.0).abs() < 1e-5);
        assert!(table[0].abs() < 1e-5);
    }

    #[test]
    fn test_user_wavetable() {
        let table = Wavetable::from_samples(&[0.0, 0.5, 0.0, -0.25]).unwrap();
        assert_eq!(table.samples(), &[0.0, 1.0, 0.0, -0.5]);
        assert_eq!(table.read(0.25, Interpolator::Linear), 1.0);

        assert_eq!(Wavetable::from_samples(&[]), Err(WavetableError::Empty));
        assert_eq!(
            Wavetable::from_samples(&[0.0, f32::NAN]),
            Err(WavetableError::NonFinite(1))
        );
    }
}
