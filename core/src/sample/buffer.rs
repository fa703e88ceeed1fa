use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleLoadError {
    #[error("IO Error")]
    IOError(#[from] std::io::Error),

    #[error("Audio decoding failed for {0}")]
    AudioDecodingFailed(PathBuf, symphonia::core::errors::Error),

    #[error("Audio file {0} has no tracks")]
    NoTracks(PathBuf),

    #[error("Sample has an invalid channel count of {0}")]
    InvalidChannelCount(usize),

    #[error("Sample channels have different lengths")]
    MismatchedChannels,

    #[error("Sample has no frames")]
    Empty,

    #[error("Sample rate must be above 0")]
    InvalidSampleRate,

    #[error("Sample contains a non-finite value at frame {0}")]
    NonFinite(usize),

    #[error("Loop region {start}..{end} is invalid for a sample of {len} frames")]
    InvalidLoop { start: usize, end: usize, len: usize },

    #[error("Loop mode {0:?} needs a loop region")]
    MissingLoop(LoopMode),
}

/// How a sample behaves around its loop region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LoopMode {
    /// Plays once. Releasing the note releases the amp envelope.
    #[default]
    NoLoop,
    /// Plays once to the end, ignoring note off.
    OneShot,
    /// Loops for as long as the voice sounds.
    LoopContinuous,
    /// Loops until the note is released, then plays through to the end.
    LoopSustain,
}

/// Frame positions of a loop. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct LoopRegion {
    pub start: usize,
    pub end: usize,
    /// Length of the crossfade before `end`, in frames
    pub crossfade: usize,
}

impl LoopRegion {
    pub fn new(start: usize, end: usize, crossfade: usize) -> Self {
        LoopRegion {
            start,
            end,
            crossfade,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Options stored alongside decoded sample data.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SampleOptions {
    pub loop_region: Option<LoopRegion>,
    pub loop_mode: LoopMode,
    /// The key the sample was recorded at
    pub root_key: u8,
    /// Cents
    pub fine_tune: f32,
}

impl Default for SampleOptions {
    fn default() -> Self {
        SampleOptions {
            loop_region: None,
            loop_mode: LoopMode::NoLoop,
            root_key: 60,
            fine_tune: 0.0,
        }
    }
}

/// Immutable mono or stereo sample data, shared between voices.
#[derive(Debug)]
pub struct SampleBuffer {
    channels: Box<[Box<[f32]>]>,
    sample_rate: u32,
    loop_region: Option<LoopRegion>,
    loop_mode: LoopMode,
    root_key: u8,
    fine_tune: f32,
}

impl SampleBuffer {
    /// Validates planar channel data.
    ///
    /// The loop crossfade is shortened to fit both the loop and the material
    /// before the loop start.
    pub fn from_planar(
        channels: Vec<Vec<f32>>,
        sample_rate: u32,
        options: SampleOptions,
    ) -> Result<Self, SampleLoadError> {
        if channels.is_empty() || channels.len() > 2 {
            return Err(SampleLoadError::InvalidChannelCount(channels.len()));
        }
        let len = channels[0].len();
        if channels.iter().any(|c| c.len() != len) {
            return Err(SampleLoadError::MismatchedChannels);
        }
        if len == 0 {
            return Err(SampleLoadError::Empty);
        }
        if sample_rate == 0 {
            return Err(SampleLoadError::InvalidSampleRate);
        }
        for channel in channels.iter() {
            if let Some(frame) = channel.iter().position(|s| !s.is_finite()) {
                return Err(SampleLoadError::NonFinite(frame));
            }
        }

        let loop_region = match options.loop_region {
            Some(region) => {
                if region.is_empty() || region.end > len {
                    return Err(SampleLoadError::InvalidLoop {
                        start: region.start,
                        end: region.end,
                        len,
                    });
                }
                let crossfade = region.crossfade.min(region.len()).min(region.start);
                Some(LoopRegion {
                    crossfade,
                    ..region
                })
            }
            None => None,
        };

        let looping_mode = matches!(
            options.loop_mode,
            LoopMode::LoopContinuous | LoopMode::LoopSustain
        );
        if looping_mode && loop_region.is_none() {
            return Err(SampleLoadError::MissingLoop(options.loop_mode));
        }

        Ok(SampleBuffer {
            channels: channels
                .into_iter()
                .map(|c| c.into_boxed_slice())
                .collect(),
            sample_rate,
            loop_region,
            loop_mode: options.loop_mode,
            root_key: options.root_key.min(127),
            fine_tune: if options.fine_tune.is_finite() {
                options.fine_tune
            } else {
                0.0
            },
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn loop_region(&self) -> Option<LoopRegion> {
        self.loop_region
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn root_key(&self) -> u8 {
        self.root_key
    }

    pub fn fine_tune(&self) -> f32 {
        self.fine_tune
    }

    /// The left channel, or the only channel of a mono sample.
    pub fn left(&self) -> &[f32] {
        &self.channels[0]
    }

    /// The right channel, or the only channel of a mono sample.
    pub fn right(&self) -> &[f32] {
        &self.channels[self.channels.len() - 1]
    }

    pub fn is_mono(&self) -> bool {
        self.channels.len() == 1
    }

    /// Samples advanced per output sample when playing at the root key.
    pub fn base_playback_rate(&self, output_sample_rate: f64) -> f64 {
        self.sample_rate as f64 / output_sample_rate.max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        let opts = SampleOptions::default();
        assert!(matches!(
            SampleBuffer::from_planar(vec![], 44100, opts),
            Err(SampleLoadError::InvalidChannelCount(0))
        ));
        assert!(matches!(
            SampleBuffer::from_planar(vec![vec![0.0]; 3], 44100, opts),
            Err(SampleLoadError::InvalidChannelCount(3))
        ));
        assert!(matches!(
            SampleBuffer::from_planar(vec![vec![0.0; 2], vec![0.0; 3]], 44100, opts),
            Err(SampleLoadError::MismatchedChannels)
        ));
        assert!(matches!(
            SampleBuffer::from_planar(vec![vec![]], 44100, opts),
            Err(SampleLoadError::Empty)
        ));
        assert!(matches!(
            SampleBuffer::from_planar(vec![vec![0.0]], 0, opts),
            Err(SampleLoadError::InvalidSampleRate)
        ));
        assert!(matches!(
            SampleBuffer::from_planar(vec![vec![0.0, f32::INFINITY]], 44100, opts),
            Err(SampleLoadError::NonFinite(1))
        ));
    }

    #[test]
    fn test_loop_validation() {
        let looped = |region, mode| SampleOptions {
            loop_region: region,
            loop_mode: mode,
            ..Default::default()
        };

        let bad = looped(Some(LoopRegion::new(4, 20, 0)), LoopMode::LoopContinuous);
        assert!(matches!(
            SampleBuffer::from_planar(vec![vec![0.0; 10]], 44100, bad),
            Err(SampleLoadError::InvalidLoop { .. })
        ));

        let missing = looped(None, LoopMode::LoopSustain);
        assert!(matches!(
            SampleBuffer::from_planar(vec![vec![0.0; 10]], 44100, missing),
            Err(SampleLoadError::MissingLoop(LoopMode::LoopSustain))
        ));
    }

    #[test]
    fn test_crossfade_is_clamped() {
        let opts = SampleOptions {
            loop_region: Some(LoopRegion::new(3, 8, 100)),
            loop_mode: LoopMode::LoopContinuous,
            ..Default::default()
        };
        let buffer = SampleBuffer::from_planar(vec![vec![0.0; 10]], 44100, opts).unwrap();
        assert_eq!(buffer.loop_region().unwrap().crossfade, 3);

        let opts = SampleOptions {
            loop_region: Some(LoopRegion::new(6, 8, 100)),
            ..opts
        };
        let buffer = SampleBuffer::from_planar(vec![vec![0.0; 10]], 44100, opts).unwrap();
        assert_eq!(buffer.loop_region().unwrap().crossfade, 2);
    }

    #[test]
    fn test_mono_channels() {
        let buffer =
            SampleBuffer::from_planar(vec![vec![0.5; 4]], 22050, SampleOptions::default()).unwrap();
        assert!(buffer.is_mono());
        assert_eq!(buffer.left(), buffer.right());
        assert_eq!(buffer.base_playback_rate(44100.0), 0.5);
        assert!((buffer.base_playback_rate(44100.5) - 22050.0 / 44100.5).abs() < 1e-12);
        assert_eq!(buffer.base_playback_rate(0.0), 22050.0);
    }
}
