/// Number of interleaved channels in an output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ChannelCount {
    Mono,
    Stereo,
}

impl ChannelCount {
    pub fn from_count(count: u16) -> Option<Self> {
        match count {
            1 => Some(ChannelCount::Mono),
            2 => Some(ChannelCount::Stereo),
            _ => None,
        }
    }

    pub fn count(&self) -> u16 {
        match self {
            ChannelCount::Mono => 1,
            ChannelCount::Stereo => 2,
        }
    }
}

impl From<u16> for ChannelCount {
    /// Anything other than 1 is treated as stereo.
    fn from(count: u16) -> Self {
        ChannelCount::from_count(count).unwrap_or(ChannelCount::Stereo)
    }
}

/// Parameters of the output audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AudioStreamParams {
    pub sample_rate: u32,
    pub channels: ChannelCount,
}

impl AudioStreamParams {
    pub fn new(sample_rate: u32, channels: ChannelCount) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// The length of one sample in seconds.
    pub fn sample_period(&self) -> f32 {
        1.0 / self.sample_rate.max(1) as f32
    }
}

impl Default for AudioStreamParams {
    fn default() -> Self {
        Self::new(48000, ChannelCount::Stereo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_count() {
        assert_eq!(ChannelCount::from_count(1), Some(ChannelCount::Mono));
        assert_eq!(ChannelCount::from_count(2), Some(ChannelCount::Stereo));
        assert_eq!(ChannelCount::from_count(6), None);
        assert_eq!(ChannelCount::from(1).count(), 1);
        assert_eq!(ChannelCount::from(0).count(), 2);
    }
}
