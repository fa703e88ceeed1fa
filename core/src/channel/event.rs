use crate::instrument::{InstrumentParams, ParameterKey};

use super::VoiceStealMode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelAudioEvent {
    /// Starts a new note voice. A velocity of 0 is a note off.
    NoteOn { key: u8, vel: f32 },
    /// Releases every voice playing the key
    NoteOff { key: u8 },
    /// Releases all voices
    AllNotesOff,
    /// Fades out all voices over a few milliseconds
    AllNotesKilled,
    /// Control event for the channel
    Control(ControlEvent),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    /// Sets an instrument parameter. The value is clamped to the parameter range.
    SetParameter(ParameterKey, f32),

    /// The pitch bend strength, in semitones
    PitchBendSensitivity(f32),

    /// The pitch bend value, between -1 and 1
    PitchBendValue(f32),
}

#[derive(Debug, Clone)]
pub enum ChannelConfigEvent {
    /// Replaces the instrument of the channel
    SetInstrument(Box<InstrumentParams>),
    /// Sets how voices are stolen when the pool is full
    SetStealMode(VoiceStealMode),
}

#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// Audio
    Audio(ChannelAudioEvent),

    /// Config event for the channel
    Config(ChannelConfigEvent),
}

impl From<ChannelAudioEvent> for ChannelEvent {
    fn from(event: ChannelAudioEvent) -> Self {
        ChannelEvent::Audio(event)
    }
}

impl From<ChannelConfigEvent> for ChannelEvent {
    fn from(event: ChannelConfigEvent) -> Self {
        ChannelEvent::Config(event)
    }
}
