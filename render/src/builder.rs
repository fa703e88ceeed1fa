use std::path::Path;

use thiserror::Error;

use wavesynth_core::{
    channel::{ChannelAudioEvent, ChannelConfigEvent, ChannelEvent},
    channel_group::SynthEvent,
    instrument::InstrumentParams,
    sample::SampleLoadError,
    ChannelCount,
};

use crate::{config::RenderConfig, OfflineRender, RenderSummary};

pub struct RenderStats {
    /// Seconds of the sequence rendered so far
    pub progress: f64,
    pub voice_count: u64,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Writing the audio file failed")]
    WavWriteFailed(#[from] hound::Error),

    #[error("Sample loading failed")]
    SampleLoadingFailed(#[from] SampleLoadError),
}

/// An event and the time since the previous event, in seconds.
#[derive(Debug, Clone)]
pub struct TimedEvent {
    pub delta: f64,
    pub event: SynthEvent,
}

impl TimedEvent {
    pub fn new(delta: f64, event: SynthEvent) -> Self {
        Self { delta, event }
    }

    pub fn note_on(delta: f64, channel: u32, key: u8, vel: f32) -> Self {
        Self::audio(delta, channel, ChannelAudioEvent::NoteOn { key, vel })
    }

    pub fn note_off(delta: f64, channel: u32, key: u8) -> Self {
        Self::audio(delta, channel, ChannelAudioEvent::NoteOff { key })
    }

    pub fn audio(delta: f64, channel: u32, event: ChannelAudioEvent) -> Self {
        Self::new(delta, SynthEvent::Channel(channel, ChannelEvent::Audio(event)))
    }
}

pub struct RenderBuilder<'a, StatsCallback: FnMut(RenderStats)> {
    config: RenderConfig,
    instruments: Vec<InstrumentParams>,
    out_path: &'a Path,
    stats_callback: StatsCallback,
}

pub fn wavesynth_renderer(out_path: &Path) -> RenderBuilder<'_, impl FnMut(RenderStats)> {
    RenderBuilder {
        config: RenderConfig::default(),
        instruments: vec![],
        out_path,
        stats_callback: |_| {},
    }
}

impl<'a, ProgressCallback: FnMut(RenderStats)> RenderBuilder<'a, ProgressCallback> {
    // Config functions
    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_channel_count(mut self, channels: u32) -> Self {
        self.config.group.channel_count = channels;
        self
    }

    pub fn with_voice_count(mut self, voices: usize) -> Self {
        self.config.group.channel_init_options.voice_count = voices;
        self
    }

    pub fn with_fade_out_killing(mut self, fade_out_killing: bool) -> Self {
        self.config.group.channel_init_options.fade_out_killing = fade_out_killing;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.config = self.config.with_sample_rate(sample_rate);
        self
    }

    pub fn with_audio_channels(mut self, audio_channels: ChannelCount) -> Self {
        self.config = self.config.with_audio_channels(audio_channels);
        self
    }

    pub fn with_tail_limit(mut self, seconds: f64) -> Self {
        self.config.tail_limit = seconds;
        self
    }

    // Set up functions

    /// Adds an instrument for the next channel. The channel count grows to
    /// fit the instruments if needed.
    pub fn add_instrument(mut self, instrument: InstrumentParams) -> Self {
        self.instruments.push(instrument);
        self
    }

    pub fn with_progress_callback<F: FnMut(RenderStats)>(
        self,
        stats_callback: F,
    ) -> RenderBuilder<'a, F> {
        RenderBuilder {
            config: self.config,
            instruments: self.instruments,
            out_path: self.out_path,
            stats_callback,
        }
    }

    /// Renders the events in order, releases every note and renders the tail.
    pub fn run(
        mut self,
        events: impl IntoIterator<Item = TimedEvent>,
    ) -> Result<RenderSummary, RenderError> {
        let instrument_count = self.instruments.len() as u32;
        if self.config.group.channel_count < instrument_count {
            self.config.group.channel_count = instrument_count;
        }

        let mut synth = OfflineRender::new(self.config, self.out_path)?;

        for (channel, instrument) in self.instruments.drain(..).enumerate() {
            synth.send_event(SynthEvent::Channel(
                channel as u32,
                ChannelEvent::Config(ChannelConfigEvent::SetInstrument(Box::new(instrument))),
            ));
        }

        let mut pos: f64 = 0.0;
        for e in events {
            if e.delta > 0.0 {
                synth.render_batch(e.delta)?;
                pos += e.delta;
            }
            (self.stats_callback)(RenderStats {
                progress: pos,
                voice_count: synth.voice_count(),
            });
            synth.send_event(e.event);
        }

        synth.send_event(SynthEvent::AllChannels(ChannelEvent::Audio(
            ChannelAudioEvent::AllNotesOff,
        )));
        synth.finalize()
    }
}
