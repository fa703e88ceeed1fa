//! The split between a control thread and an audio thread.
//!
//! [`realtime_pair`] builds a [`ChannelGroup`] and splits it into:
//! - [`RealtimeEventSender`], used on the control side. It keeps a mirror of
//!   every channel's instrument for parameter reads and validation.
//! - [`RealtimeRenderer`], owned by the audio callback. It drains the event
//!   queue at the start of every read and never allocates, locks or blocks.
//! - [`MeterReader`], for level and scope displays.
//!
//! Events travel through an `rtrb` ring. Anything the renderer replaces comes
//! back through a bounded `crossbeam-channel` queue and is dropped by
//! [`RealtimeEventSender::collect_garbage`], so memory is never freed on the
//! audio thread.

use crossbeam_channel::Receiver;
use rtrb::{Consumer, Producer, PushError, RingBuffer};
use thiserror::Error;

use crate::{
    channel::{
        ChannelAudioEvent, ChannelConfigEvent, ChannelEvent, ControlEvent, RetireSink, Retired,
        VoiceChannelStatsReader, VoiceStealMode,
    },
    channel_group::{ChannelGroup, ChannelGroupConfig, SynthEvent},
    helpers::interleave_into,
    instrument::{find_descriptor, InstrumentParams, ParameterKey},
    metering::{meter_pair, MeterReader, MeterWriter},
    AudioPipe, AudioStreamParams,
};

/// Options for [`realtime_pair`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RealtimeConfig {
    /// See the `ChannelGroupConfig` documentation.
    pub group: ChannelGroupConfig,

    /// Events that can wait for the next audio block.
    ///
    /// Default: `4096`
    pub event_queue_capacity: usize,

    /// Replaced instruments and samples that can wait for
    /// `collect_garbage`. Anything beyond this is dropped on the audio thread.
    ///
    /// Default: `1024`
    pub garbage_capacity: usize,

    /// Mono samples kept for the scope and spectrum.
    ///
    /// Default: `8192`
    pub scope_capacity: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            group: Default::default(),
            event_queue_capacity: 4096,
            garbage_capacity: 1024,
            scope_capacity: 8192,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SendEventError {
    #[error("The event queue is full")]
    QueueFull,

    #[error("Channel {0} does not exist")]
    UnknownTarget(u32),

    #[error("Unknown parameter {0}")]
    UnknownParameter(String),

    #[error("The instrument on channel {target} has no parameter {id}")]
    UnsupportedParameter { target: u32, id: String },
}

/// Everything [`realtime_pair`] creates.
pub struct RealtimeSynth {
    pub sender: RealtimeEventSender,
    pub renderer: RealtimeRenderer,
    pub meter: MeterReader,
}

/// Builds a channel group and splits it into a control side and an audio side.
pub fn realtime_pair(config: RealtimeConfig) -> RealtimeSynth {
    let (producer, consumer) = RingBuffer::new(config.event_queue_capacity.max(1));
    let (garbage_sender, garbage_receiver) =
        crossbeam_channel::bounded(config.garbage_capacity.max(1));
    let (meter_writer, meter_reader) =
        meter_pair(config.scope_capacity, config.group.audio_params.sample_rate);

    let mut group = ChannelGroup::new(config.group);
    group.set_retire_sink(RetireSink::new(garbage_sender));

    let channel_count = group.channel_count();
    let stats = (0..channel_count as u32)
        .filter_map(|i| group.channel(i).map(|c| c.get_channel_stats()))
        .collect();

    let max_block_size = group.max_block_size();
    let sender = RealtimeEventSender {
        producer,
        garbage: garbage_receiver,
        instruments: vec![InstrumentParams::default(); channel_count],
        stats,
    };
    let renderer = RealtimeRenderer {
        events: consumer,
        group,
        meter: meter_writer,
        left: vec![0.0; max_block_size],
        right: vec![0.0; max_block_size],
    };

    tracing::info!(
        channels = channel_count,
        queue = config.event_queue_capacity,
        "Created realtime synth"
    );

    RealtimeSynth {
        sender,
        renderer,
        meter: meter_reader,
    }
}

/// The control side of a realtime synth.
pub struct RealtimeEventSender {
    producer: Producer<SynthEvent>,
    garbage: Receiver<Retired>,
    instruments: Vec<InstrumentParams>,
    stats: Vec<VoiceChannelStatsReader>,
}

impl RealtimeEventSender {
    pub fn channel_count(&self) -> usize {
        self.instruments.len()
    }

    fn check_target(&self, target: u32) -> Result<(), SendEventError> {
        if (target as usize) < self.instruments.len() {
            Ok(())
        } else {
            Err(SendEventError::UnknownTarget(target))
        }
    }

    /// Queues an event for the renderer.
    ///
    /// Config events for all channels are split into one event per channel
    /// here, so the renderer never clones them. Instruments sent this way are
    /// mirrored like the ones from [`RealtimeEventSender::set_instrument`].
    pub fn send_event(&mut self, event: SynthEvent) -> Result<(), SendEventError> {
        self.collect_garbage();

        match event {
            SynthEvent::AllChannels(ChannelEvent::Config(config)) => {
                let count = self.instruments.len();
                if self.producer.slots() < count {
                    tracing::warn!("Event queue is full, dropping event for all channels");
                    return Err(SendEventError::QueueFull);
                }
                for target in 0..count as u32 {
                    self.push(SynthEvent::Channel(
                        target,
                        ChannelEvent::Config(config.clone()),
                    ))?;
                }
                Ok(())
            }
            SynthEvent::Channel(target, event) => {
                self.check_target(target)?;
                self.push(SynthEvent::Channel(target, event))
            }
            event => self.push(event),
        }
    }

    fn push(&mut self, event: SynthEvent) -> Result<(), SendEventError> {
        let mirrored = match &event {
            SynthEvent::Channel(
                target,
                ChannelEvent::Config(ChannelConfigEvent::SetInstrument(params)),
            ) => Some((*target as usize, InstrumentParams::clone(params))),
            _ => None,
        };

        match self.producer.push(event) {
            Ok(()) => {
                if let Some((target, params)) = mirrored {
                    self.instruments[target] = params;
                }
                Ok(())
            }
            Err(PushError::Full(_)) => {
                tracing::warn!("Event queue is full, dropping event");
                Err(SendEventError::QueueFull)
            }
        }
    }

    fn send_audio(&mut self, target: u32, event: ChannelAudioEvent) -> Result<(), SendEventError> {
        self.send_event(SynthEvent::Channel(target, ChannelEvent::Audio(event)))
    }

    pub fn note_on(&mut self, target: u32, note: u8, velocity: f32) -> Result<(), SendEventError> {
        self.send_audio(target, ChannelAudioEvent::NoteOn { key: note, vel: velocity })
    }

    pub fn note_off(&mut self, target: u32, note: u8) -> Result<(), SendEventError> {
        self.send_audio(target, ChannelAudioEvent::NoteOff { key: note })
    }

    pub fn all_notes_off(&mut self, target: u32) -> Result<(), SendEventError> {
        self.send_audio(target, ChannelAudioEvent::AllNotesOff)
    }

    /// Fades out every voice of the channel within a few milliseconds.
    pub fn all_notes_killed(&mut self, target: u32) -> Result<(), SendEventError> {
        self.send_audio(target, ChannelAudioEvent::AllNotesKilled)
    }

    /// Pitch bend between -1 and 1, scaled by the instrument's bend range.
    pub fn pitch_bend(&mut self, target: u32, value: f32) -> Result<(), SendEventError> {
        self.send_audio(
            target,
            ChannelAudioEvent::Control(ControlEvent::PitchBendValue(value)),
        )
    }

    /// Sets a parameter. Out of range values are clamped.
    pub fn set_parameter(
        &mut self,
        target: u32,
        key: ParameterKey,
        value: f32,
    ) -> Result<(), SendEventError> {
        self.check_target(target)?;
        if self.producer.slots() == 0 {
            tracing::warn!("Event queue is full, dropping parameter change");
            return Err(SendEventError::QueueFull);
        }

        let update = self.instruments[target as usize].set(key, value);
        if !update.is_applied() {
            return Err(SendEventError::UnsupportedParameter {
                target,
                id: key.id(),
            });
        }

        self.send_audio(
            target,
            ChannelAudioEvent::Control(ControlEvent::SetParameter(key, value)),
        )
    }

    /// Sets a parameter by its descriptor id, for example `"amp_env.attack"`.
    pub fn set_parameter_by_key(
        &mut self,
        target: u32,
        id: &str,
        value: f32,
    ) -> Result<(), SendEventError> {
        let key = self.lookup_key(target, id)?;
        self.set_parameter(target, key, value)
    }

    fn lookup_key(&self, target: u32, id: &str) -> Result<ParameterKey, SendEventError> {
        self.check_target(target)?;
        let kind = self.instruments[target as usize].kind();
        find_descriptor(kind, id)
            .map(|d| d.key)
            .ok_or_else(|| SendEventError::UnknownParameter(id.to_string()))
    }

    /// The value a parameter was last set to.
    pub fn parameter(&self, target: u32, key: ParameterKey) -> Option<f32> {
        self.instruments.get(target as usize)?.get(key)
    }

    pub fn parameter_by_key(&self, target: u32, id: &str) -> Option<f32> {
        let key = self.lookup_key(target, id).ok()?;
        self.parameter(target, key)
    }

    pub fn instrument(&self, target: u32) -> Option<&InstrumentParams> {
        self.instruments.get(target as usize)
    }

    /// Replaces the instrument of a channel. Playing voices carry on with the
    /// new parameters, or fade out if the new instrument uses another backend.
    pub fn set_instrument(
        &mut self,
        target: u32,
        params: InstrumentParams,
    ) -> Result<(), SendEventError> {
        let kind = params.kind();
        let event = ChannelConfigEvent::SetInstrument(Box::new(params));
        self.send_event(SynthEvent::Channel(target, ChannelEvent::Config(event)))?;
        tracing::info!(target, ?kind, "Instrument changed");
        Ok(())
    }

    pub fn set_steal_mode(
        &mut self,
        target: u32,
        mode: VoiceStealMode,
    ) -> Result<(), SendEventError> {
        let event = ChannelConfigEvent::SetStealMode(mode);
        self.send_event(SynthEvent::Channel(target, ChannelEvent::Config(event)))
    }

    /// Drops everything the renderer handed back. Returns how many items
    /// were freed.
    pub fn collect_garbage(&mut self) -> usize {
        let count = self.garbage.try_iter().count();
        if count > 0 {
            tracing::trace!(count, "Collected retired data");
        }
        count
    }

    /// Voices sounding on a channel as of the last rendered block.
    pub fn voice_count(&self, target: u32) -> Option<u64> {
        self.stats.get(target as usize).map(|s| s.voice_count())
    }

    pub fn total_voice_count(&self) -> u64 {
        self.stats.iter().map(|s| s.voice_count()).sum()
    }
}

/// The audio side of a realtime synth.
pub struct RealtimeRenderer {
    events: Consumer<SynthEvent>,
    group: ChannelGroup,
    meter: MeterWriter,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl RealtimeRenderer {
    pub fn group(&self) -> &ChannelGroup {
        &self.group
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.pop() {
            self.group.send_event(event);
        }
    }

    /// Applies pending events, then renders interleaved audio into `out`.
    /// The same as [`AudioPipe::read_samples`].
    pub fn render(&mut self, out: &mut [f32]) {
        self.read_samples(out);
    }

    /// Applies pending events, then renders into planar buffers.
    pub fn render_planar(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.drain_events();
        self.group.render_block(left, right);
        self.meter.process(left, right);
    }
}

impl AudioPipe for RealtimeRenderer {
    fn stream_params(&self) -> &AudioStreamParams {
        self.group.stream_params()
    }

    fn read_samples_unchecked(&mut self, out: &mut [f32]) {
        self.drain_events();

        let channels = self.group.stream_params().channels;
        let frame_size = channels.count() as usize;
        let block = self.left.len();

        for chunk in out.chunks_mut(block * frame_size) {
            let frames = chunk.len() / frame_size;
            let (left, right) = (&mut self.left[..frames], &mut self.right[..frames]);
            self.group.render_block(left, right);
            self.meter.process(left, right);
            interleave_into(left, right, chunk, channels);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synth() -> RealtimeSynth {
        realtime_pair(RealtimeConfig {
            event_queue_capacity: 8,
            ..Default::default()
        })
    }

    #[test]
    fn test_events_reach_renderer() {
        let RealtimeSynth {
            mut sender,
            mut renderer,
            ..
        } = synth();
        sender.note_on(0, 60, 1.0).unwrap();
        sender.note_on(1, 64, 1.0).unwrap();
        assert_eq!(sender.total_voice_count(), 0);

        let mut out = vec![0.0; 256];
        renderer.render(&mut out);
        assert_eq!(sender.voice_count(0), Some(1));
        assert_eq!(sender.total_voice_count(), 2);
        assert!(out.iter().any(|s| *s != 0.0));
    }

    #[test]
    fn test_queue_full() {
        let RealtimeSynth { mut sender, .. } = synth();
        for i in 0..8 {
            sender.note_on(0, 60 + i, 1.0).unwrap();
        }
        assert_eq!(sender.note_on(0, 80, 1.0), Err(SendEventError::QueueFull));
        assert_eq!(
            sender.set_parameter(0, ParameterKey::Volume, 0.1),
            Err(SendEventError::QueueFull)
        );
        // The mirror was left untouched
        assert_eq!(sender.parameter(0, ParameterKey::Volume), Some(0.8));
    }

    #[test]
    fn test_unknown_target_and_parameter() {
        let RealtimeSynth { mut sender, .. } = synth();
        assert_eq!(
            sender.note_on(9, 60, 1.0),
            Err(SendEventError::UnknownTarget(9))
        );
        assert_eq!(
            sender.set_parameter_by_key(0, "no.such.thing", 1.0),
            Err(SendEventError::UnknownParameter("no.such.thing".to_string()))
        );
        assert!(matches!(
            sender.set_parameter(0, ParameterKey::ChipDuty, 1.0),
            Err(SendEventError::UnsupportedParameter { target: 0, .. })
        ));
    }

    #[test]
    fn test_parameters_are_mirrored() {
        let RealtimeSynth {
            mut sender,
            mut renderer,
            ..
        } = synth();
        sender.set_parameter_by_key(0, "volume", 0.5).unwrap();
        sender.set_parameter_by_key(0, "amp_env.attack", -3.0).unwrap();
        assert_eq!(sender.parameter_by_key(0, "volume"), Some(0.5));
        assert_eq!(sender.parameter_by_key(0, "amp_env.attack"), Some(0.0));

        let mut out = vec![0.0; 64];
        renderer.read_samples(&mut out);
        let instrument = renderer.group().channel(0).unwrap().instrument();
        assert_eq!(instrument, sender.instrument(0).unwrap());
    }

    #[test]
    fn test_config_for_all_channels_is_split() {
        let RealtimeSynth {
            mut sender,
            mut renderer,
            ..
        } = synth();
        let sine = InstrumentParams::sine();
        let event = ChannelConfigEvent::SetInstrument(Box::new(sine.clone()));
        sender
            .send_event(SynthEvent::AllChannels(ChannelEvent::Config(event)))
            .unwrap();

        // One queued event per channel, nothing left to clone while rendering
        assert_eq!(renderer.events.slots(), 4);
        for target in 0..4 {
            assert_eq!(sender.instrument(target), Some(&sine));
        }

        let mut out = vec![0.0; 64];
        renderer.render(&mut out);
        for target in 0..4 {
            assert_eq!(renderer.group().channel(target).unwrap().instrument(), &sine);
        }
        assert_eq!(sender.collect_garbage(), 4);
    }

    #[test]
    fn test_config_for_all_channels_needs_room() {
        let RealtimeSynth { mut sender, .. } = synth();
        for i in 0..6 {
            sender.note_on(0, 60 + i, 1.0).unwrap();
        }
        let event = ChannelConfigEvent::SetInstrument(Box::new(InstrumentParams::sine()));
        assert_eq!(
            sender.send_event(SynthEvent::AllChannels(ChannelEvent::Config(event))),
            Err(SendEventError::QueueFull)
        );
        assert_eq!(sender.instrument(0), Some(&InstrumentParams::default()));
        // The remaining slots are still usable
        sender.note_on(0, 80, 1.0).unwrap();
        sender.note_on(0, 81, 1.0).unwrap();
    }

    #[test]
    fn test_meter_sees_output() {
        let RealtimeSynth {
            mut sender,
            mut renderer,
            mut meter,
        } = synth();
        sender.set_instrument(0, InstrumentParams::sine()).unwrap();
        sender.note_on(0, 69, 1.0).unwrap();

        let mut left = vec![0.0; 512];
        let mut right = vec![0.0; 512];
        renderer.render_planar(&mut left, &mut right);

        let peak = left.iter().fold(0.0f32, |a, b| a.max(b.abs()));
        assert!(peak > 0.0);
        assert_eq!(meter.levels().peak[0], peak);

        let mut scope = vec![0.0; 512];
        assert_eq!(meter.waveform(&mut scope), 512);
        assert_eq!(scope, left);
    }
}
