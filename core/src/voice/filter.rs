use biquad::*;

/// Lowest cutoff the voice filter accepts.
pub const MIN_CUTOFF: f32 = 20.0;

/// Upper cutoff limit as a fraction of the sample rate.
const MAX_CUTOFF_RATIO: f32 = 0.45;

pub const MIN_RESONANCE: f32 = 0.5;
pub const MAX_RESONANCE: f32 = 10.0;

/// Clamps a cutoff into `[MIN_CUTOFF, 0.45 * sample_rate]`.
pub fn clamp_cutoff(cutoff: f32, sample_rate: f32) -> f32 {
    let max = (sample_rate * MAX_CUTOFF_RATIO).max(MIN_CUTOFF);
    if cutoff.is_nan() {
        max
    } else {
        cutoff.clamp(MIN_CUTOFF, max)
    }
}

/// A resonant biquad low-pass owned by a single voice.
///
/// Coefficients are only recomputed when the cutoff or resonance move.
#[derive(Clone)]
pub struct VoiceFilter {
    filter: DirectForm1<f32>,
    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
}

impl VoiceFilter {
    pub fn new(sample_rate: f32) -> Self {
        let cutoff = clamp_cutoff(f32::MAX, sample_rate);
        let resonance = Q_BUTTERWORTH_F32;
        let coeffs = Self::get_coeffs(sample_rate, cutoff, resonance)
            .unwrap_or(Coefficients {
                a1: 0.0,
                a2: 0.0,
                b0: 1.0,
                b1: 0.0,
                b2: 0.0,
            });

        VoiceFilter {
            filter: DirectForm1::<f32>::new(coeffs),
            sample_rate,
            cutoff,
            resonance,
        }
    }

    fn get_coeffs(sample_rate: f32, cutoff: f32, resonance: f32) -> Option<Coefficients<f32>> {
        Coefficients::<f32>::from_params(Type::LowPass, sample_rate.hz(), cutoff.hz(), resonance)
            .ok()
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn reset(&mut self) {
        self.filter.reset_state();
    }

    fn set_params(&mut self, cutoff: f32, resonance: f32) {
        let cutoff = clamp_cutoff(cutoff, self.sample_rate);
        let resonance = if resonance.is_nan() {
            Q_BUTTERWORTH_F32
        } else {
            resonance.clamp(MIN_RESONANCE, MAX_RESONANCE)
        };

        if (cutoff - self.cutoff).abs() < 0.01 && resonance == self.resonance {
            return;
        }

        // Keep the previous coefficients if the new ones are rejected
        if let Some(coeffs) = Self::get_coeffs(self.sample_rate, cutoff, resonance) {
            self.filter.update_coefficients(coeffs);
            self.cutoff = cutoff;
            self.resonance = resonance;
        }
    }

    #[inline(always)]
    pub fn process(&mut self, input: f32, cutoff: f32, resonance: f32) -> f32 {
        self.set_params(cutoff, resonance);
        let out = self.filter.run(input);
        if out.is_finite() {
            out
        } else {
            self.filter.reset_state();
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rms(values: &[f32]) -> f32 {
        (values.iter().map(|v| v * v).sum::<f32>() / values.len() as f32).sqrt()
    }

    fn filtered_sine(freq: f32, cutoff: f32) -> Vec<f32> {
        let sample_rate = 48000.0;
        let mut filter = VoiceFilter::new(sample_rate);
        (0..4800)
            .map(|i| {
                let x = (i as f32 * freq / sample_rate * std::f32::consts::TAU).sin();
                filter.process(x, cutoff, Q_BUTTERWORTH_F32)
            })
            .skip(2400)
            .collect()
    }

    #[test]
    fn test_lowpass_attenuates_highs() {
        let low = rms(&filtered_sine(200.0, 1000.0));
        let high = rms(&filtered_sine(8000.0, 1000.0));
        assert!(low > 0.6, "{low}");
        assert!(high < 0.05, "{high}");
    }

    #[test]
    fn test_cutoff_is_clamped() {
        assert_eq!(clamp_cutoff(5.0, 48000.0), MIN_CUTOFF);
        assert_eq!(clamp_cutoff(40000.0, 48000.0), 48000.0 * 0.45);

        let mut filter = VoiceFilter::new(44100.0);
        filter.process(0.5, f32::INFINITY, f32::NAN);
        assert_eq!(filter.cutoff(), 44100.0 * 0.45);
    }
}
