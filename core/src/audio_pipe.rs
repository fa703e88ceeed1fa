use crate::AudioStreamParams;

/// An object to read interleaved audio samples from.
pub trait AudioPipe {
    /// The audio stream parameters of the audio pipe.
    fn stream_params(&self) -> &'_ AudioStreamParams;

    /// Reads samples from the pipe.
    ///
    /// The amount of samples read determines the time of the currently active
    /// events. For example if a note on event is sent and 48000 frames are read
    /// at a 48kHz sample rate, the note will be audible for 1 second. If a note
    /// off event for the same key is sent after that, the key will be released
    /// on the next read.
    fn read_samples(&mut self, to: &mut [f32]) {
        assert!(to.len() % self.stream_params().channels.count() as usize == 0);
        self.read_samples_unchecked(to);
    }

    /// Reads samples from the pipe without checking the channel count of the output.
    fn read_samples_unchecked(&mut self, to: &mut [f32]);
}
