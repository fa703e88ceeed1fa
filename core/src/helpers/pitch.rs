/// Frequency ratio of a pitch offset in semitones.
#[inline(always)]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    if semitones == 0.0 || !semitones.is_finite() {
        1.0
    } else {
        2.0f32.powf(semitones / 12.0)
    }
}

/// Frequency ratio of a pitch offset in cents.
#[inline(always)]
pub fn cents_factor(cents: f32) -> f32 {
    semitones_to_ratio(cents / 100.0)
}

/// The playback speed of a sample recorded at `root_key` when played at `key`.
pub fn speed_mult_from_keys(key: u8, root_key: u8, fine_tune_cents: f32) -> f32 {
    semitones_to_ratio(key as f32 - root_key as f32) * cents_factor(fine_tune_cents)
}
