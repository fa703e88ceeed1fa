use crate::{
    channel::{InstrumentChannel, RetireSink},
    helpers::interleave_into,
    waveform::warm_tables,
    AudioPipe, AudioStreamParams,
};

mod config;
pub use config::*;
mod events;
pub use events::*;

/// A set of instrument channels rendered into one output.
///
/// All voices and buffers are allocated in [`ChannelGroup::new`]. Rendering
/// and event processing never allocate, lock or block.
pub struct ChannelGroup {
    channels: Box<[InstrumentChannel]>,
    audio_params: AudioStreamParams,
    max_block_size: usize,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl ChannelGroup {
    /// Creates a new ChannelGroup with the given configuration.
    /// See the `ChannelGroupConfig` documentation for the available options.
    pub fn new(config: ChannelGroupConfig) -> Self {
        // Build the static tables here rather than on the first note
        warm_tables();

        let max_block_size = config.max_block_size.max(1);
        let channels = (0..config.channel_count)
            .map(|_| InstrumentChannel::new(config.channel_init_options, config.audio_params))
            .collect::<Vec<_>>();

        tracing::debug!(
            channels = config.channel_count,
            voices = config.channel_init_options.voice_count,
            sample_rate = config.audio_params.sample_rate,
            "Created channel group"
        );

        Self {
            channels: channels.into_boxed_slice(),
            audio_params: config.audio_params,
            max_block_size,
            left: vec![0.0; max_block_size],
            right: vec![0.0; max_block_size],
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: u32) -> Option<&InstrumentChannel> {
        self.channels.get(index as usize)
    }

    pub fn channel_mut(&mut self, index: u32) -> Option<&mut InstrumentChannel> {
        self.channels.get_mut(index as usize)
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Sends replaced instruments and finished samples of every channel to `sink`.
    pub fn set_retire_sink(&mut self, sink: RetireSink) {
        for channel in self.channels.iter_mut() {
            channel.set_retire_sink(sink.clone());
        }
    }

    /// Sends a SynthEvent to the ChannelGroup.
    /// Events for channels that don't exist are ignored.
    pub fn send_event(&mut self, event: SynthEvent) {
        match event {
            SynthEvent::Channel(channel, event) => {
                if let Some(channel) = self.channels.get_mut(channel as usize) {
                    channel.process_event(event);
                }
            }
            SynthEvent::AllChannels(event) => {
                for channel in self.channels.iter_mut() {
                    channel.process_event(event.clone());
                }
            }
        }
    }

    /// Renders every channel into the planar outputs, replacing their contents.
    pub fn render_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        let len = left.len().min(right.len());
        let (left, right) = (&mut left[..len], &mut right[..len]);
        left.fill(0.0);
        right.fill(0.0);

        for (left, right) in left
            .chunks_mut(self.max_block_size)
            .zip(right.chunks_mut(self.max_block_size))
        {
            for channel in self.channels.iter_mut() {
                channel.render_block(left, right);
            }
        }
    }

    /// Returns the active voice count of the synthesizer.
    pub fn voice_count(&self) -> u64 {
        self.channels
            .iter()
            .map(|c| c.get_channel_stats().voice_count())
            .sum()
    }
}

impl AudioPipe for ChannelGroup {
    fn stream_params(&self) -> &AudioStreamParams {
        &self.audio_params
    }

    fn read_samples_unchecked(&mut self, out: &mut [f32]) {
        let channels = self.audio_params.channels;
        let frame_size = channels.count() as usize;

        for chunk in out.chunks_mut(self.max_block_size * frame_size) {
            let frames = chunk.len() / frame_size;
            let mut left = std::mem::take(&mut self.left);
            let mut right = std::mem::take(&mut self.right);

            self.render_block(&mut left[..frames], &mut right[..frames]);
            interleave_into(&left[..frames], &right[..frames], chunk, channels);

            self.left = left;
            self.right = right;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        channel::{ChannelAudioEvent, ChannelConfigEvent, ChannelEvent},
        instrument::InstrumentParams,
        ChannelCount,
    };

    fn group(channels: ChannelCount, max_block_size: usize) -> ChannelGroup {
        let mut group = ChannelGroup::new(ChannelGroupConfig {
            channel_count: 2,
            audio_params: AudioStreamParams::new(48000, channels),
            max_block_size,
            ..Default::default()
        });
        group.send_event(SynthEvent::AllChannels(ChannelEvent::Config(
            ChannelConfigEvent::SetInstrument(Box::new(InstrumentParams::sine())),
        )));
        group
    }

    fn note_on(channel: u32, key: u8) -> SynthEvent {
        SynthEvent::Channel(
            channel,
            ChannelEvent::Audio(ChannelAudioEvent::NoteOn { key, vel: 1.0 }),
        )
    }

    #[test]
    fn test_channels_are_summed() {
        let mut single = group(ChannelCount::Stereo, 256);
        single.send_event(note_on(0, 69));
        let mut one = vec![0.0; 512];
        single.read_samples(&mut one);

        let mut double = group(ChannelCount::Stereo, 256);
        double.send_event(note_on(0, 69));
        double.send_event(note_on(1, 69));
        let mut two = vec![0.0; 512];
        double.read_samples(&mut two);

        for (a, b) in one.iter().zip(two.iter()) {
            assert!((a * 2.0 - b).abs() < 1e-5);
        }
        assert_eq!(double.voice_count(), 2);
    }

    #[test]
    fn test_block_size_does_not_change_output() {
        let mut small = group(ChannelCount::Stereo, 64);
        let mut large = group(ChannelCount::Stereo, 4096);
        for g in [&mut small, &mut large] {
            g.send_event(note_on(0, 60));
            g.send_event(note_on(1, 67));
        }

        let mut a = vec![0.0; 3000];
        let mut b = vec![0.0; 3000];
        small.read_samples(&mut a);
        large.read_samples(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_mono_output() {
        let mut stereo = group(ChannelCount::Stereo, 256);
        let mut mono = group(ChannelCount::Mono, 256);
        stereo.send_event(note_on(0, 69));
        mono.send_event(note_on(0, 69));

        let mut a = vec![0.0; 600];
        let mut b = vec![0.0; 300];
        stereo.read_samples(&mut a);
        mono.read_samples(&mut b);
        for (frame, m) in a.chunks(2).zip(b.iter()) {
            assert!((frame[0] - m).abs() < 1e-6);
        }
    }

    #[test]
    fn test_unknown_channel_is_ignored() {
        let mut group = group(ChannelCount::Stereo, 256);
        group.send_event(note_on(7, 60));
        assert_eq!(group.voice_count(), 0);
    }
}
