use wavesynth_core::{channel_group::ChannelGroupConfig, AudioStreamParams, ChannelCount};

#[derive(Debug, PartialEq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RenderAudioFormat {
    /// 32-bit float WAV
    #[default]
    Wav,
}

/// Options for an offline render.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RenderConfig {
    /// Configuration of the synthesizer being rendered.
    /// The audio parameters here are also the parameters of the output file.
    pub group: ChannelGroupConfig,

    pub audio_format: RenderAudioFormat,

    /// How long the release tail may ring after the last event, in seconds.
    ///
    /// Default: `10.0`
    pub tail_limit: f64,

    /// Output below this level counts as silence when ending the tail.
    ///
    /// Default: `0.0001`
    pub silence_threshold: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            group: ChannelGroupConfig {
                channel_count: 1,
                ..Default::default()
            },
            audio_format: RenderAudioFormat::Wav,
            tail_limit: 10.0,
            silence_threshold: 0.0001,
        }
    }
}

impl RenderConfig {
    pub fn audio_params(&self) -> AudioStreamParams {
        self.group.audio_params
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.group.audio_params.sample_rate = sample_rate;
        self
    }

    pub fn with_audio_channels(mut self, channels: ChannelCount) -> Self {
        self.group.audio_params.channels = channels;
        self
    }
}
