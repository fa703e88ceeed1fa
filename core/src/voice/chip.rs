use crate::waveform::{
    noise::DEFAULT_LFSR_SEED, polyblep, wrap_phase, LfsrNoise, LfsrWidth,
};

/// The channel type a chip voice emulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ChipChannel {
    #[default]
    Pulse,
    /// 4-bit stepped triangle
    Triangle,
    Noise,
}

impl ChipChannel {
    pub const ALL: [ChipChannel; 3] = [ChipChannel::Pulse, ChipChannel::Triangle, ChipChannel::Noise];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Pulse duty cycles of the chip pulse channel.
pub const CHIP_DUTY_CYCLES: [f32; 4] = [0.125, 0.25, 0.5, 0.75];

/// The noise register is clocked this many times per cycle of the note frequency.
pub const NOISE_CLOCKS_PER_CYCLE: f32 = 16.0;

/// Number of volume steps the chip output is quantized to.
pub const CHIP_VOLUME_STEPS: f32 = 15.0;

/// Quantizes a 0-1 level to the chip's 4-bit volume.
pub fn quantize_volume(level: f32) -> f32 {
    (level.clamp(0.0, 1.0) * CHIP_VOLUME_STEPS).round() / CHIP_VOLUME_STEPS
}

/// Per-voice state of a chip channel.
#[derive(Debug, Clone)]
pub struct ChipVoice {
    phase: f32,
    clock_phase: f32,
    lfsr: LfsrNoise,
}

impl Default for ChipVoice {
    fn default() -> Self {
        ChipVoice {
            phase: 0.0,
            clock_phase: 0.0,
            lfsr: LfsrNoise::new(LfsrWidth::Long, DEFAULT_LFSR_SEED),
        }
    }
}

/// The 32-step triangle sequence, 15 down to 0 and back up.
#[inline(always)]
fn stepped_triangle(phase: f32) -> f32 {
    let step = ((phase * 32.0) as u32).min(31);
    let level = if step < 16 { 15 - step } else { step - 16 };
    level as f32 / 7.5 - 1.0
}

impl ChipVoice {
    pub fn reset(&mut self, noise_width: LfsrWidth) {
        self.phase = 0.0;
        self.clock_phase = 0.0;
        self.lfsr = LfsrNoise::new(noise_width, DEFAULT_LFSR_SEED);
    }

    /// Produces one sample and advances by `increment` cycles.
    #[inline(always)]
    pub fn next(&mut self, channel: ChipChannel, duty: usize, increment: f32) -> f32 {
        let value = match channel {
            ChipChannel::Pulse => {
                let width = CHIP_DUTY_CYCLES[duty.min(CHIP_DUTY_CYCLES.len() - 1)];
                polyblep::pulse(self.phase, increment.min(0.5), width).clamp(-1.0, 1.0)
            }
            ChipChannel::Triangle => stepped_triangle(self.phase),
            ChipChannel::Noise => {
                self.clock_phase += increment * NOISE_CLOCKS_PER_CYCLE;
                while self.clock_phase >= 1.0 {
                    self.lfsr.step();
                    self.clock_phase -= 1.0;
                }
                self.lfsr.value()
            }
        };

        self.phase = wrap_phase(self.phase + increment);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stepped_triangle() {
        assert_eq!(stepped_triangle(0.0), 1.0);
        assert_eq!(stepped_triangle(15.5 / 32.0), -1.0);
        assert_eq!(stepped_triangle(16.5 / 32.0), -1.0);
        assert_eq!(stepped_triangle(31.5 / 32.0), 1.0);

        // Only 16 distinct levels
        let mut levels = (0..320)
            .map(|i| stepped_triangle(i as f32 / 320.0).to_bits())
            .collect::<Vec<_>>();
        levels.sort();
        levels.dedup();
        assert_eq!(levels.len(), 16);
    }

    #[test]
    fn test_noise_clocked_by_frequency() {
        let mut voice = ChipVoice::default();
        voice.reset(LfsrWidth::Short);
        let mut reference = LfsrNoise::new(LfsrWidth::Short, DEFAULT_LFSR_SEED);

        // One clock every 4 samples
        let increment = 1.0 / (4.0 * NOISE_CLOCKS_PER_CYCLE);
        for i in 1..=64 {
            let value = voice.next(ChipChannel::Noise, 0, increment);
            if i % 4 == 0 {
                assert_eq!(value, reference.step());
            } else {
                assert_eq!(value, reference.value());
            }
        }
    }

    #[test]
    fn test_volume_quantization() {
        assert_eq!(quantize_volume(1.0), 1.0);
        assert_eq!(quantize_volume(0.0), 0.0);
        assert_eq!(quantize_volume(0.5), 8.0 / 15.0);
        assert_eq!(quantize_volume(2.0), 1.0);
    }
}
