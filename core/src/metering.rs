//! Output level and waveform metering.
//!
//! The render side owns a [`MeterWriter`] and updates it once per block.
//! Any other thread reads the results through the matching [`MeterReader`].
//! Levels are stored as `f32` bits in atomics; scope samples travel through
//! a lossy single-producer/single-consumer ring, so a slow reader only loses
//! samples and never stalls the audio thread.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use rtrb::{Consumer, Producer, RingBuffer};
use rustfft::{num_complex::Complex, FftPlanner};

#[derive(Debug, Default)]
struct AtomicLevel(AtomicU32);

impl AtomicLevel {
    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Default)]
struct SharedLevels {
    peak: [AtomicLevel; 2],
    rms: [AtomicLevel; 2],
}

/// Peak and RMS of the most recent block, left then right.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeterLevels {
    pub peak: [f32; 2],
    pub rms: [f32; 2],
}

/// Creates a connected writer and reader. `scope_capacity` is the number of
/// mono samples the scope keeps.
pub fn meter_pair(scope_capacity: usize, sample_rate: u32) -> (MeterWriter, MeterReader) {
    let scope_capacity = scope_capacity.max(1);
    let levels = Arc::new(SharedLevels::default());
    let (producer, consumer) = RingBuffer::new(scope_capacity);

    let writer = MeterWriter {
        levels: levels.clone(),
        scope: producer,
    };
    let reader = MeterReader {
        levels,
        scope: consumer,
        history: VecDeque::with_capacity(scope_capacity),
        capacity: scope_capacity,
        sample_rate,
        planner: FftPlanner::new(),
    };
    (writer, reader)
}

/// The render side of a meter.
pub struct MeterWriter {
    levels: Arc<SharedLevels>,
    scope: Producer<f32>,
}

impl MeterWriter {
    /// Measures one rendered block.
    pub fn process(&mut self, left: &[f32], right: &[f32]) {
        for (side, samples) in [left, right].into_iter().enumerate() {
            let (peak, sum) = samples
                .iter()
                .fold((0.0f32, 0.0f32), |(peak, sum), s| (peak.max(s.abs()), sum + s * s));
            let rms = if samples.is_empty() {
                0.0
            } else {
                (sum / samples.len() as f32).sqrt()
            };
            self.levels.peak[side].store(peak);
            self.levels.rms[side].store(rms);
        }

        for (l, r) in left.iter().zip(right.iter()) {
            if self.scope.push((l + r) * 0.5).is_err() {
                // The reader is behind, drop the rest of the block
                break;
            }
        }
    }
}

/// The reading side of a meter. Allocates, so keep it off the audio thread.
pub struct MeterReader {
    levels: Arc<SharedLevels>,
    scope: Consumer<f32>,
    history: VecDeque<f32>,
    capacity: usize,
    sample_rate: u32,
    planner: FftPlanner<f32>,
}

impl MeterReader {
    pub fn levels(&self) -> MeterLevels {
        MeterLevels {
            peak: [self.levels.peak[0].load(), self.levels.peak[1].load()],
            rms: [self.levels.rms[0].load(), self.levels.rms[1].load()],
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Moves everything the writer produced into the local history.
    fn update(&mut self) {
        while let Ok(sample) = self.scope.pop() {
            if self.history.len() == self.capacity {
                self.history.pop_front();
            }
            self.history.push_back(sample);
        }
    }

    /// Copies the newest scope samples into `out`, oldest first.
    /// Returns how many samples were written.
    pub fn waveform(&mut self, out: &mut [f32]) -> usize {
        self.update();
        let count = out.len().min(self.history.len());
        let start = self.history.len() - count;
        for (o, s) in out.iter_mut().zip(self.history.range(start..)) {
            *o = *s;
        }
        count
    }

    /// Magnitude spectrum of the newest `size` scope samples.
    ///
    /// Returns `size / 2 + 1` bins from 0 Hz to Nyquist, scaled so that a
    /// full scale sine reads close to 1 in its bin. Missing history is
    /// treated as silence.
    pub fn spectrum(&mut self, size: usize) -> Vec<f32> {
        self.update();
        let size = size.max(2);

        let available = self.history.len().min(size);
        let mut buffer = vec![Complex::new(0.0f32, 0.0); size];
        let offset = size - available;
        for (slot, sample) in buffer[offset..]
            .iter_mut()
            .zip(self.history.range(self.history.len() - available..))
        {
            slot.re = *sample;
        }

        // Hann window
        let denom = (size - 1) as f32;
        let mut window_sum = 0.0;
        for (i, slot) in buffer.iter_mut().enumerate() {
            let w = 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos());
            slot.re *= w;
            window_sum += w;
        }

        let fft = self.planner.plan_fft_forward(size);
        fft.process(&mut buffer);

        let scale = 2.0 / window_sum;
        buffer[..=size / 2]
            .iter()
            .map(|c| c.norm() * scale)
            .collect()
    }

    /// Center frequency of a spectrum bin for a given FFT size.
    pub fn bin_frequency(&self, bin: usize, size: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / size.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        let (mut writer, reader) = meter_pair(64, 48000);
        writer.process(&[0.5, -1.0, 0.0, 0.5], &[0.0; 4]);
        let levels = reader.levels();
        assert_eq!(levels.peak, [1.0, 0.0]);
        assert!((levels.rms[0] - (1.5f32 / 4.0).sqrt()).abs() < 1e-6);
        assert_eq!(levels.rms[1], 0.0);
    }

    #[test]
    fn test_scope_is_lossy() {
        let (mut writer, mut reader) = meter_pair(4, 48000);
        writer.process(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        // Only 1 slot left, the rest is dropped
        writer.process(&[4.0, 5.0], &[4.0, 5.0]);

        let mut out = [0.0; 8];
        assert_eq!(reader.waveform(&mut out), 4);
        assert_eq!(&out[..4], &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_history_keeps_newest() {
        let (mut writer, mut reader) = meter_pair(4, 48000);
        let mut out = [0.0; 4];
        writer.process(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        reader.waveform(&mut out);
        writer.process(&[4.0, 5.0], &[4.0, 5.0]);

        let mut last = [0.0; 2];
        assert_eq!(reader.waveform(&mut last), 2);
        assert_eq!(last, [4.0, 5.0]);
        assert_eq!(reader.waveform(&mut out), 4);
        assert_eq!(out, [2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_spectrum_peak() {
        let size = 1024;
        let (mut writer, mut reader) = meter_pair(size, 48000);
        // Exactly bin 64
        let freq = 64.0 * 48000.0 / size as f32;
        let sine = (0..size)
            .map(|i| (std::f32::consts::TAU * freq * i as f32 / 48000.0).sin())
            .collect::<Vec<_>>();
        writer.process(&sine, &sine);

        let spectrum = reader.spectrum(size);
        assert_eq!(spectrum.len(), size / 2 + 1);
        let (peak_bin, peak) = spectrum
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |acc, (i, v)| if *v > acc.1 { (i, *v) } else { acc });
        assert_eq!(peak_bin, 64);
        assert!((peak - 1.0).abs() < 0.05, "{peak}");
        assert_eq!(reader.bin_frequency(64, size), freq);
    }
}
