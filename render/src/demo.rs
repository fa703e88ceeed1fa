//! Short phrases and patches used by the render binary to audition each
//! backend.

use std::sync::Arc;

use wavesynth_core::{
    channel::{ChannelAudioEvent, ControlEvent},
    instrument::{
        BackendKind, ChipParams, InstrumentParams, OscillatorParams, ParameterKey,
        SubtractiveParams, WavetableParams,
    },
    sample::{LoopMode, LoopRegion, SampleBuffer, SampleLoadError, SampleOptions},
    voice::{EnvelopeDescriptor, ModDestination, ModSource},
    waveform::Waveform,
};

use crate::TimedEvent;

const ARPEGGIO: [u8; 8] = [48, 55, 60, 63, 67, 63, 60, 55];
const CHORD: [u8; 3] = [60, 63, 67];

pub fn backend_name(kind: BackendKind) -> &'static str {
    match kind {
        BackendKind::Subtractive => "subtractive",
        BackendKind::DualWavetable => "wavetable",
        BackendKind::Chip => "chip",
        BackendKind::Sampler => "sampler",
    }
}

/// An arpeggio followed by a held chord with a pitch bend and vibrato.
pub fn demo_phrase(channel: u32) -> Vec<TimedEvent> {
    let mut events = Vec::new();

    let step = 0.25;
    let gate = 0.2;
    for (i, key) in ARPEGGIO.into_iter().enumerate() {
        let delta = if i == 0 { 0.0 } else { step - gate };
        events.push(TimedEvent::note_on(delta, channel, key, 0.8));
        events.push(TimedEvent::note_off(gate, channel, key));
    }

    let vibrato = ParameterKey::Modulation(ModDestination::Pitch, ModSource::Lfo1);
    events.push(TimedEvent::audio(
        0.0,
        channel,
        ChannelAudioEvent::Control(ControlEvent::SetParameter(vibrato, 0.01)),
    ));
    for key in CHORD {
        events.push(TimedEvent::note_on(step - gate, channel, key, 0.6));
    }

    // Bend up a whole tone and back over a second
    let bend_steps = 20;
    for i in 0..=bend_steps {
        let t = i as f32 / bend_steps as f32;
        let value = (t * std::f32::consts::PI).sin();
        events.push(TimedEvent::audio(
            1.0 / bend_steps as f64,
            channel,
            ChannelAudioEvent::Control(ControlEvent::PitchBendValue(value)),
        ));
    }

    for (i, key) in CHORD.into_iter().enumerate() {
        let delta = if i == 0 { 0.5 } else { 0.0 };
        events.push(TimedEvent::note_off(delta, channel, key));
    }
    events
}

/// A decaying two-partial tone with a sustain loop, used when no sample
/// file is given.
pub fn pluck_sample(sample_rate: u32) -> Result<SampleBuffer, SampleLoadError> {
    let len = sample_rate as usize;
    // Middle C, with a whole number of periods in the loop
    let period = sample_rate as f32 / 261.626;
    let frames = (0..len)
        .map(|i| {
            let t = i as f32 / period * std::f32::consts::TAU;
            let decay = (-3.0 * i as f32 / len as f32).exp();
            (t.sin() + 0.3 * (2.0 * t).sin()) * 0.6 * decay.max(0.2)
        })
        .collect();

    let loop_start = len / 2;
    let loop_len = (period * 40.0).round() as usize;
    SampleBuffer::from_planar(
        vec![frames],
        sample_rate,
        SampleOptions {
            loop_region: Some(LoopRegion::new(loop_start, loop_start + loop_len, 256)),
            loop_mode: LoopMode::LoopSustain,
            root_key: 60,
            ..Default::default()
        },
    )
}

/// A patch that shows off the given backend. `sample` is only used by the
/// sampler.
pub fn demo_instrument(kind: BackendKind, sample: Arc<SampleBuffer>) -> InstrumentParams {
    let envelope = EnvelopeDescriptor {
        attack: 0.01,
        decay: 0.3,
        sustain: 0.6,
        release: 0.3,
        ..Default::default()
    };

    let mut params = match kind {
        BackendKind::Subtractive => {
            let mut sub = SubtractiveParams::default();
            sub.oscillators[0] = OscillatorParams::new(Waveform::Saw, 0.6);
            sub.oscillators[1] = OscillatorParams {
                fine: 8.0,
                ..OscillatorParams::new(Waveform::Saw, 0.6)
            };
            sub.sub_level = 0.3;
            sub.filter.enabled = true;
            sub.filter.cutoff = 800.0;
            sub.filter.resonance = 2.0;

            let mut params = InstrumentParams::subtractive(sub);
            params
                .modulation
                .set(ModDestination::FilterCutoff, ModSource::ModEnvelope, 0.6);
            params
        }
        BackendKind::DualWavetable => {
            let mut params = InstrumentParams::wavetable(WavetableParams {
                detune_b: 0.1,
                ..Default::default()
            });
            params.lfos[1].rate = 0.5;
            params
                .modulation
                .set(ModDestination::SubMix, ModSource::Lfo2, 0.5);
            params
        }
        BackendKind::Chip => InstrumentParams::chip(ChipParams {
            duty: 1,
            ..Default::default()
        }),
        BackendKind::Sampler => InstrumentParams::sampler(sample),
    };

    params.amp_envelope = envelope;
    params.volume = 0.5;
    params.lfos[0].rate = 5.5;
    params
}
