//! A realtime polyphonic synthesizer core.
//!
//! [`channel_group::ChannelGroup`] renders a set of instrument channels into
//! one output. Each [`channel::InstrumentChannel`] owns a fixed pool of
//! voices playing one instrument from a closed set of backends (subtractive,
//! dual wavetable, chip and sampler). For use from an audio callback,
//! [`realtime::realtime_pair`] splits a group into a lock-free control side
//! and audio side.

#![allow(clippy::let_and_return)]

pub mod channel;

pub mod channel_group;

pub mod voice;

mod audio_pipe;
pub use audio_pipe::*;

mod audio_stream;
pub use audio_stream::*;

pub mod helpers;

pub mod instrument;

pub mod metering;

pub mod realtime;

pub mod sample;

pub mod waveform;
