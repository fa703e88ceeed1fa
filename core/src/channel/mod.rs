use crate::{
    helpers::interleave_into,
    instrument::{InstrumentParams, ParameterKey, ParameterUpdate},
    voice::VoiceControlData,
    AudioPipe, AudioStreamParams,
};

mod params;
pub use params::*;

mod retire;
pub use retire::*;

mod voice_pool;
pub use voice_pool::*;

mod event;
pub use event::*;

/// Frames rendered at once when a channel is used as an [`AudioPipe`].
const PIPE_CHUNK_FRAMES: usize = 256;

/// Options for initializing a new InstrumentChannel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ChannelInitOptions {
    /// Number of voices that can sound at once.
    ///
    /// Default: `16`
    pub voice_count: usize,

    /// If set to true, stolen voices fade out over 5ms instead of being cut.
    ///
    /// Default: `true`
    pub fade_out_killing: bool,

    /// How many stolen voices can fade out at the same time. At least one
    /// tail is always allocated.
    ///
    /// Default: `8`
    pub fade_out_tails: usize,
}

impl Default for ChannelInitOptions {
    fn default() -> Self {
        Self {
            voice_count: 16,
            fade_out_killing: true,
            fade_out_tails: 8,
        }
    }
}

impl ChannelInitOptions {
    pub fn steal_mode(&self) -> VoiceStealMode {
        if self.fade_out_killing {
            VoiceStealMode::FadeOut
        } else {
            VoiceStealMode::HardCut
        }
    }
}

/// One instrument and the voices playing it.
///
/// Events are applied immediately, audio is rendered block by block with
/// [`InstrumentChannel::render_block`]. Nothing here allocates or blocks
/// after construction, so a channel can live on the audio thread.
pub struct InstrumentChannel {
    params: Box<InstrumentParams>,
    /// Replaced instrument of another backend, kept while its voices fade
    outgoing: Option<Box<InstrumentParams>>,
    pool: VoicePool,

    /// Processed control data, ready to feed to voices
    control: VoiceControlData,
    pitch_bend_value: f32,

    stats: VoiceChannelStats,
    retire: RetireSink,
    stream_params: AudioStreamParams,

    pipe_left: Vec<f32>,
    pipe_right: Vec<f32>,
}

impl InstrumentChannel {
    pub fn new(options: ChannelInitOptions, stream_params: AudioStreamParams) -> Self {
        let sample_rate = stream_params.sample_rate as f32;
        let stats = VoiceChannelStats::new();

        let mut pool = VoicePool::new(options.voice_count, options.fade_out_tails, sample_rate);
        pool.set_steal_mode(options.steal_mode());
        pool.set_stats(stats.clone());

        InstrumentChannel {
            params: Box::default(),
            outgoing: None,
            pool,
            control: VoiceControlData::new_defaults(sample_rate),
            pitch_bend_value: 0.0,
            stats,
            retire: RetireSink::inline(),
            stream_params,
            pipe_left: vec![0.0; PIPE_CHUNK_FRAMES],
            pipe_right: vec![0.0; PIPE_CHUNK_FRAMES],
        }
    }

    /// Sets where replaced instruments and finished samples are sent.
    pub fn set_retire_sink(&mut self, sink: RetireSink) {
        self.pool.set_retire_sink(sink.clone());
        self.retire = sink;
    }

    pub fn instrument(&self) -> &InstrumentParams {
        &self.params
    }

    pub fn voices(&self) -> &VoicePool {
        &self.pool
    }

    pub fn get_channel_stats(&self) -> VoiceChannelStatsReader {
        VoiceChannelStatsReader::new(self.stats.clone())
    }

    /// Starts a note and returns a handle to its voice.
    ///
    /// A velocity of 0 releases the note instead.
    pub fn note_on(&mut self, key: u8, vel: f32) -> Option<VoiceHandle> {
        if key > 127 {
            return None;
        }
        if vel <= 0.0 || vel.is_nan() {
            self.pool.note_off(key);
            return None;
        }
        Some(self.pool.note_on(key, vel, &self.params))
    }

    pub fn process_event(&mut self, event: ChannelEvent) {
        self.push_events_iter(std::iter::once(event));
    }

    pub fn push_events_iter<T: Iterator<Item = ChannelEvent>>(&mut self, iter: T) {
        for e in iter {
            match e {
                ChannelEvent::Audio(audio) => self.process_audio_event(audio),
                ChannelEvent::Config(config) => self.process_config_event(config),
            }
        }
    }

    pub fn process_audio_event(&mut self, event: ChannelAudioEvent) {
        match event {
            ChannelAudioEvent::NoteOn { key, vel } => {
                self.note_on(key, vel);
            }
            ChannelAudioEvent::NoteOff { key } => self.pool.note_off(key),
            ChannelAudioEvent::AllNotesOff => self.pool.all_notes_off(),
            ChannelAudioEvent::AllNotesKilled => self.pool.kill_all(),
            ChannelAudioEvent::Control(control) => self.process_control_event(control),
        }
    }

    pub fn process_control_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::SetParameter(key, value) => {
                self.set_parameter(key, value);
            }
            ControlEvent::PitchBendSensitivity(sensitivity) => {
                self.set_parameter(ParameterKey::PitchBendRange, sensitivity);
            }
            ControlEvent::PitchBendValue(value) => {
                self.pitch_bend_value = if value.is_nan() {
                    0.0
                } else {
                    value.clamp(-1.0, 1.0)
                };
                self.update_pitch_bend();
            }
        }
    }

    fn process_config_event(&mut self, event: ChannelConfigEvent) {
        match event {
            ChannelConfigEvent::SetInstrument(params) => {
                let previous = std::mem::replace(&mut self.params, params);
                // Voices of another backend can't continue on the new
                // instrument, they fade out on the one they started with
                if self.pool.kill_other_kinds(self.params.kind()) {
                    if let Some(older) = self.outgoing.replace(previous) {
                        self.retire.retire(Retired::Instrument(older));
                    }
                } else {
                    self.retire.retire(Retired::Instrument(previous));
                }
                self.update_pitch_bend();
            }
            ChannelConfigEvent::SetStealMode(mode) => self.pool.set_steal_mode(mode),
        }
    }

    /// Writes a parameter of the current instrument. Returns false if the
    /// instrument has no such parameter.
    pub fn set_parameter(&mut self, key: ParameterKey, value: f32) -> bool {
        let update = self.params.set(key, value);
        let applied = update.is_applied();
        if let ParameterUpdate::ReplacedTable(table) = update {
            self.retire.retire(Retired::Wavetable(table));
        }
        if key == ParameterKey::PitchBendRange {
            self.update_pitch_bend();
        }
        applied
    }

    fn update_pitch_bend(&mut self) {
        self.control.pitch_bend = self.pitch_bend_value * self.params.pitch_bend_range;
    }

    /// Renders all voices and adds them to `left` and `right`.
    pub fn render_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.pool.render_with_outgoing(
            &self.params,
            self.outgoing.as_deref(),
            &self.control,
            left,
            right,
        );

        if self.outgoing.is_some() && !self.pool.has_other_kinds(self.params.kind()) {
            if let Some(outgoing) = self.outgoing.take() {
                self.retire.retire(Retired::Instrument(outgoing));
            }
        }
    }
}

impl AudioPipe for InstrumentChannel {
    fn stream_params(&self) -> &AudioStreamParams {
        &self.stream_params
    }

    fn read_samples_unchecked(&mut self, out: &mut [f32]) {
        let channels = self.stream_params.channels;
        let frame_size = channels.count() as usize;

        for chunk in out.chunks_mut(PIPE_CHUNK_FRAMES * frame_size) {
            let frames = chunk.len() / frame_size;
            let mut left = std::mem::take(&mut self.pipe_left);
            let mut right = std::mem::take(&mut self.pipe_right);
            left[..frames].fill(0.0);
            right[..frames].fill(0.0);

            self.render_block(&mut left[..frames], &mut right[..frames]);
            interleave_into(&left[..frames], &right[..frames], chunk, channels);

            self.pipe_left = left;
            self.pipe_right = right;
        }
    }
}
