use crate::{channel::ChannelInitOptions, AudioStreamParams};

/// Options for initializing a new ChannelGroup.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ChannelGroupConfig {
    /// Channel initialization options (same for all channels).
    /// See the `ChannelInitOptions` documentation for more information.
    pub channel_init_options: ChannelInitOptions,

    /// Amount of InstrumentChannel objects to be created.
    /// Each channel plays one instrument.
    pub channel_count: u32,

    /// Parameters of the output audio.
    /// See the `AudioStreamParams` documentation for more information.
    pub audio_params: AudioStreamParams,

    /// The longest block rendered in one pass, in frames. Longer reads are
    /// split into blocks of this size.
    pub max_block_size: usize,
}

impl Default for ChannelGroupConfig {
    fn default() -> Self {
        Self {
            channel_init_options: Default::default(),
            channel_count: 4,
            audio_params: Default::default(),
            max_block_size: 1024,
        }
    }
}
