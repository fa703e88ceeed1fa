use lazy_static::lazy_static;

/// The lowest frequency an oscillator is allowed to run at.
pub const MIN_FREQUENCY: f32 = 18.0;

/// Create an array of key frequencies for keys 0-127
fn build_frequencies() -> [f32; 128] {
    let mut freqs = [0.0f32; 128];
    for (key, freq) in freqs.iter_mut().enumerate() {
        *freq = 2.0f32.powf((key as f32 - 69.0) / 12.0) * 440.0;
    }
    freqs
}

lazy_static! {
    /// Static array of all frequencies for keys 0-127.
    pub static ref FREQS: [f32; 128] = build_frequencies();
}

/// Frequency of a key in Hz. Keys above 127 are treated as 127.
pub fn key_frequency(key: u8) -> f32 {
    FREQS[key.min(127) as usize]
}

/// Clamps a frequency into `[MIN_FREQUENCY, sample_rate / 2.1]`.
///
/// NaN falls back to the minimum frequency.
#[inline(always)]
pub fn clamp_frequency(freq: f32, sample_rate: f32) -> f32 {
    let max = (sample_rate / 2.1).max(MIN_FREQUENCY);
    if freq.is_nan() {
        MIN_FREQUENCY
    } else {
        freq.clamp(MIN_FREQUENCY, max)
    }
}
