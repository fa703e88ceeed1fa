use std::sync::Arc;

use crate::{
    helpers::{clamp_frequency, finite_or_zero, key_frequency, semitones_to_ratio, speed_mult_from_keys},
    instrument::{BackendKind, BackendParams, InstrumentParams, LFO_COUNT, MAX_OSCILLATORS},
    sample::{LoopMode, SampleBuffer, SampleReader},
    waveform::{clamp_pulse_width, interpolation::lerp, Interpolator, LfsrWidth, Waveform},
};

mod envelopes;
pub use envelopes::*;

mod modulation;
pub use modulation::*;

mod lfo;
pub use lfo::*;

mod oscillator;
pub use oscillator::*;

mod filter;
pub use filter::*;

mod chip;
pub use chip::*;

/// Fade applied to voices that are stolen or killed, in seconds.
pub const KILL_FADE_SECONDS: f32 = 0.005;

/// Pitch modulation can not move a voice further than this, in semitones.
pub const MAX_PITCH_OFFSET: f32 = 24.0;

/// Octaves of cutoff movement for a filter modulation of 1.0.
pub const CUTOFF_MOD_OCTAVES: f32 = 5.0;

/// Channel wide values read by every voice once per block.
#[derive(Debug, Copy, Clone)]
pub struct VoiceControlData {
    /// Pitch bend in semitones
    pub pitch_bend: f32,
    pub sample_rate: f32,
}

impl VoiceControlData {
    pub fn new_defaults(sample_rate: f32) -> Self {
        VoiceControlData {
            pitch_bend: 0.0,
            sample_rate,
        }
    }
}

/// A single sounding note.
///
/// Voices live in a preallocated pool and are restarted in place, so starting
/// a note never allocates.
#[derive(Clone)]
pub struct Voice {
    note: u8,
    velocity: f32,
    frequency: f32,
    sequence: u64,
    /// Samples rendered since note on
    age: u64,
    released: bool,
    killed: bool,

    oscillators: [Oscillator; MAX_OSCILLATORS],
    sub: Oscillator,
    amp_envelope: Envelope,
    mod_envelope: Envelope,
    lfos: [Lfo; LFO_COUNT],
    filter: VoiceFilter,
    chip: ChipVoice,
    reader: Option<SampleReader>,
    sample_done: bool,
    /// Backend the voice was started with
    kind: BackendKind,
}

impl Voice {
    pub fn new(sample_rate: f32) -> Self {
        let mut amp_envelope = Envelope::new(EnvelopeDescriptor::default());
        amp_envelope.kill(0.0);
        amp_envelope.advance(0.0);

        Voice {
            note: 0,
            velocity: 0.0,
            frequency: key_frequency(0),
            sequence: 0,
            age: 0,
            released: true,
            killed: false,
            oscillators: Default::default(),
            sub: Oscillator::default(),
            amp_envelope,
            mod_envelope: Envelope::new(EnvelopeDescriptor::default()),
            lfos: Default::default(),
            filter: VoiceFilter::new(sample_rate),
            chip: ChipVoice::default(),
            reader: None,
            sample_done: false,
            kind: BackendKind::Subtractive,
        }
    }

    /// Restarts the voice for a new note.
    ///
    /// Returns the sample buffer held for the previous note, if any, so the
    /// caller decides where it is dropped.
    pub fn start(
        &mut self,
        note: u8,
        velocity: f32,
        sequence: u64,
        params: &InstrumentParams,
    ) -> Option<Arc<SampleBuffer>> {
        let note = note.min(127);
        self.note = note;
        self.velocity = if velocity.is_nan() {
            0.0
        } else {
            velocity.clamp(0.0, 1.0)
        };
        self.frequency = key_frequency(note);
        self.sequence = sequence;
        self.age = 0;
        self.released = false;
        self.killed = false;
        self.sample_done = false;
        self.kind = params.kind();

        for osc in self.oscillators.iter_mut() {
            osc.reset(0.0);
        }
        self.sub.reset(0.0);
        self.amp_envelope = Envelope::new(params.amp_envelope);
        self.mod_envelope = Envelope::new(params.mod_envelope);
        for lfo in self.lfos.iter_mut() {
            lfo.reset();
        }
        self.filter.reset();

        let noise_width = match &params.backend {
            BackendParams::Chip(chip) => chip.noise_width,
            _ => LfsrWidth::Long,
        };
        self.chip.reset(noise_width);

        let reader = match &params.backend {
            BackendParams::Sampler(sampler) => Some(SampleReader::new(sampler.buffer.clone())),
            _ => None,
        };
        std::mem::replace(&mut self.reader, reader).map(SampleReader::into_buffer)
    }

    /// Hands out the sample buffer of a finished voice.
    pub fn take_sample(&mut self) -> Option<Arc<SampleBuffer>> {
        self.reader.take().map(SampleReader::into_buffer)
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Samples rendered since note on.
    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn amp_envelope(&self) -> &Envelope {
        &self.amp_envelope
    }

    pub fn mod_envelope(&self) -> &Envelope {
        &self.mod_envelope
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn sample_reader(&self) -> Option<&SampleReader> {
        self.reader.as_ref()
    }

    pub fn is_releasing(&self) -> bool {
        self.released || self.killed
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    pub fn ended(&self) -> bool {
        self.amp_envelope.is_off() || self.sample_done
    }

    /// Starts the release of the voice.
    ///
    /// One-shot samples ignore note off and play to their end. Sustain loops
    /// stop looping and play through.
    pub fn note_off(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Some(reader) = self.reader.as_mut() {
            match reader.buffer().loop_mode() {
                LoopMode::OneShot => return,
                LoopMode::LoopSustain => reader.release(),
                LoopMode::NoLoop | LoopMode::LoopContinuous => {}
            }
        }

        self.amp_envelope.note_off();
        self.mod_envelope.note_off();
    }

    /// Fades the voice out over `fade_seconds`, regardless of its loop mode.
    pub fn kill(&mut self, fade_seconds: f32) {
        self.killed = true;
        self.amp_envelope.kill(fade_seconds);
    }

    /// Silences the voice immediately.
    pub fn cut(&mut self) {
        self.killed = true;
        self.amp_envelope.kill(0.0);
        self.amp_envelope.advance(0.0);
    }

    /// Renders the voice and adds it to `left` and `right`.
    ///
    /// `params` must use the backend the voice was started with, a voice
    /// handed another backend is cut.
    pub fn render_into(
        &mut self,
        params: &InstrumentParams,
        control: &VoiceControlData,
        left: &mut [f32],
        right: &mut [f32],
    ) {
        let len = left.len().min(right.len());
        self.age += len as u64;
        if self.ended() {
            return;
        }
        if params.kind() != self.kind {
            self.cut();
            return;
        }

        let sample_rate = control.sample_rate;
        let dt = 1.0 / sample_rate;
        let matrix = &params.modulation;

        let pan = if params.pan.is_nan() {
            0.0
        } else {
            params.pan.clamp(-1.0, 1.0)
        };
        let pan_left = (1.0 - pan).min(1.0);
        let pan_right = (1.0 + pan).min(1.0);

        let velocity = match &params.backend {
            BackendParams::Chip(_) => quantize_volume(self.velocity),
            _ => self.velocity,
        };

        // Most instruments don't modulate pitch, skip the per sample powf then
        let pitch_modulated = !matrix.slot(ModDestination::Pitch).is_empty();
        let block_pitch = semitones_to_ratio(
            finite_or_zero(control.pitch_bend).clamp(-MAX_PITCH_OFFSET, MAX_PITCH_OFFSET),
        );

        let osc_ratios: [f32; MAX_OSCILLATORS] = match &params.backend {
            BackendParams::Subtractive(sub) => std::array::from_fn(|i| sub.oscillators[i].ratio()),
            BackendParams::DualWavetable(wt) => [1.0, semitones_to_ratio(wt.detune_b), 1.0],
            _ => [1.0; MAX_OSCILLATORS],
        };

        let sample_rate_mult = match (&params.backend, self.reader.as_ref()) {
            (BackendParams::Sampler(sampler), Some(reader)) => {
                reader.buffer().base_playback_rate(sample_rate as f64)
                    * speed_mult_from_keys(self.note, sampler.root_key, sampler.fine_tune) as f64
            }
            _ => 1.0,
        };

        for i in 0..len {
            let amp = self.amp_envelope.advance(dt);
            let mod_env = self.mod_envelope.advance(dt);
            let sources = ModSources {
                envelopes: [amp, mod_env],
                lfos: [
                    self.lfos[0].advance(&params.lfos[0], dt),
                    self.lfos[1].advance(&params.lfos[1], dt),
                ],
            };

            if self.amp_envelope.is_off() {
                break;
            }

            let volume = (params.volume + matrix.resolve(ModDestination::Volume, &sources))
                .clamp(0.0, 1.0);
            let gain = volume * velocity * amp;

            let pitch = if pitch_modulated {
                let semitones = control.pitch_bend
                    + matrix.resolve(ModDestination::Pitch, &sources) * 12.0;
                semitones_to_ratio(
                    finite_or_zero(semitones).clamp(-MAX_PITCH_OFFSET, MAX_PITCH_OFFSET),
                )
            } else {
                block_pitch
            };
            let frequency = self.frequency * pitch;

            let (sample_l, sample_r) = match &params.backend {
                BackendParams::Subtractive(sub) => {
                    let phase_offset = matrix.resolve(ModDestination::Phase, &sources);
                    let width_mod = matrix.resolve(ModDestination::PulseWidth, &sources);

                    let mut value = 0.0;
                    for ((osc, osc_params), ratio) in self
                        .oscillators
                        .iter_mut()
                        .zip(sub.oscillators.iter())
                        .zip(osc_ratios.iter())
                    {
                        if osc_params.level <= 0.0 {
                            continue;
                        }
                        let freq = clamp_frequency(frequency * ratio, sample_rate);
                        value += osc_params.level
                            * osc.next(
                                &osc_params.waveform,
                                freq / sample_rate,
                                phase_offset,
                                clamp_pulse_width(osc_params.pulse_width + width_mod),
                                Interpolator::Linear,
                            );
                    }

                    let sub_level = (sub.sub_level
                        + matrix.resolve(ModDestination::SubMix, &sources))
                    .clamp(0.0, 1.0);
                    if sub_level > 0.0 {
                        let freq = clamp_frequency(frequency * 0.5, sample_rate);
                        value += sub_level
                            * self.sub.next(
                                &Waveform::Square,
                                freq / sample_rate,
                                0.0,
                                0.5,
                                Interpolator::Linear,
                            );
                    }

                    if sub.filter.enabled {
                        let octaves =
                            matrix.resolve(ModDestination::FilterCutoff, &sources) * CUTOFF_MOD_OCTAVES;
                        let cutoff = sub.filter.cutoff * 2.0f32.powf(octaves);
                        value = self.filter.process(value, cutoff, sub.filter.resonance);
                    }

                    (value, value)
                }
                BackendParams::DualWavetable(wt) => {
                    let phase_offset = matrix.resolve(ModDestination::Phase, &sources);
                    let width = clamp_pulse_width(
                        0.5 + matrix.resolve(ModDestination::PulseWidth, &sources),
                    );
                    let freq_a = clamp_frequency(frequency, sample_rate);
                    let freq_b = clamp_frequency(frequency * osc_ratios[1], sample_rate);

                    let (osc_a, rest) = self.oscillators.split_at_mut(1);
                    let a = osc_a[0].next(
                        &wt.a,
                        freq_a / sample_rate,
                        phase_offset,
                        width,
                        wt.interpolator,
                    );
                    let b = rest[0].next(
                        &wt.b,
                        freq_b / sample_rate,
                        phase_offset,
                        width,
                        wt.interpolator,
                    );

                    let mix = (wt.mix + matrix.resolve(ModDestination::SubMix, &sources))
                        .clamp(0.0, 1.0);
                    let value = lerp(a, b, mix);
                    (value, value)
                }
                BackendParams::Chip(chip) => {
                    let freq = clamp_frequency(frequency, sample_rate);
                    let value = self.chip.next(chip.channel, chip.duty, freq / sample_rate);
                    (value, value)
                }
                BackendParams::Sampler(sampler) => {
                    let rate = sample_rate_mult * pitch as f64;
                    match self
                        .reader
                        .as_mut()
                        .and_then(|reader| reader.next(rate, sampler.interpolator))
                    {
                        Some(frame) => frame,
                        None => {
                            self.sample_done = true;
                            break;
                        }
                    }
                }
            };

            left[i] += finite_or_zero(sample_l * gain * pan_left);
            right[i] += finite_or_zero(sample_r * gain * pan_right);
        }
    }
}
