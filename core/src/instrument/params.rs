use std::sync::Arc;

use crate::{
    helpers::semitones_to_ratio,
    sample::SampleBuffer,
    voice::{
        ChipChannel, EnvelopeDescriptor, LfoDescriptor, ModulationMatrix, CHIP_DUTY_CYCLES,
    },
    waveform::{AdditiveShape, Interpolator, LfsrWidth, Waveform, Wavetable},
};

/// Oscillators in a subtractive voice.
pub const MAX_OSCILLATORS: usize = 3;

/// LFOs in every voice.
pub const LFO_COUNT: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorParams {
    pub waveform: Waveform,
    /// 0 to 1, an oscillator at 0 is skipped entirely
    pub level: f32,
    /// Semitones
    pub detune: f32,
    /// Cents
    pub fine: f32,
    pub pulse_width: f32,
}

impl OscillatorParams {
    pub fn new(waveform: Waveform, level: f32) -> Self {
        OscillatorParams {
            waveform,
            level,
            detune: 0.0,
            fine: 0.0,
            pulse_width: 0.5,
        }
    }

    /// Frequency ratio from detune and fine tune.
    pub fn ratio(&self) -> f32 {
        semitones_to_ratio(self.detune + self.fine / 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FilterParams {
    pub enabled: bool,
    /// Hz
    pub cutoff: f32,
    /// Filter Q
    pub resonance: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        FilterParams {
            enabled: false,
            cutoff: 20000.0,
            resonance: biquad::Q_BUTTERWORTH_F32,
        }
    }
}

/// Up to three oscillators, a sub-oscillator one octave down and a low-pass filter.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtractiveParams {
    pub oscillators: [OscillatorParams; MAX_OSCILLATORS],
    pub sub_level: f32,
    pub filter: FilterParams,
}

impl Default for SubtractiveParams {
    fn default() -> Self {
        SubtractiveParams {
            oscillators: [
                OscillatorParams::new(Waveform::Saw, 1.0),
                OscillatorParams::new(Waveform::Square, 0.0),
                OscillatorParams::new(Waveform::Sine, 0.0),
            ],
            sub_level: 0.0,
            filter: FilterParams::default(),
        }
    }
}

/// Two wavetable oscillators crossfaded by `mix`.
#[derive(Debug, Clone, PartialEq)]
pub struct WavetableParams {
    pub a: Waveform,
    pub b: Waveform,
    /// 0 is only A, 1 is only B
    pub mix: f32,
    /// Semitones applied to oscillator B
    pub detune_b: f32,
    pub interpolator: Interpolator,
}

impl Default for WavetableParams {
    fn default() -> Self {
        WavetableParams {
            a: Waveform::Additive(AdditiveShape::Saw),
            b: Waveform::Additive(AdditiveShape::Square),
            mix: 0.5,
            detune_b: 0.0,
            interpolator: Interpolator::Linear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ChipParams {
    pub channel: ChipChannel,
    /// Index into the duty cycle table (12.5%, 25%, 50%, 75%)
    pub duty: usize,
    pub noise_width: LfsrWidth,
}

impl Default for ChipParams {
    fn default() -> Self {
        ChipParams {
            channel: ChipChannel::Pulse,
            duty: 2,
            noise_width: LfsrWidth::Long,
        }
    }
}

impl ChipParams {
    pub fn duty_cycle(&self) -> f32 {
        CHIP_DUTY_CYCLES[self.duty.min(CHIP_DUTY_CYCLES.len() - 1)]
    }
}

#[derive(Debug, Clone)]
pub struct SamplerParams {
    pub buffer: Arc<SampleBuffer>,
    pub root_key: u8,
    /// Cents
    pub fine_tune: f32,
    pub interpolator: Interpolator,
}

impl SamplerParams {
    /// Takes the root key and fine tune stored with the sample.
    pub fn new(buffer: Arc<SampleBuffer>) -> Self {
        SamplerParams {
            root_key: buffer.root_key(),
            fine_tune: buffer.fine_tune(),
            buffer,
            interpolator: Interpolator::Linear,
        }
    }
}

impl PartialEq for SamplerParams {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
            && self.root_key == other.root_key
            && self.fine_tune == other.fine_tune
            && self.interpolator == other.interpolator
    }
}

/// Which sound generator an instrument uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BackendKind {
    Subtractive,
    DualWavetable,
    Chip,
    Sampler,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Subtractive,
        BackendKind::DualWavetable,
        BackendKind::Chip,
        BackendKind::Sampler,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendParams {
    Subtractive(SubtractiveParams),
    DualWavetable(WavetableParams),
    Chip(ChipParams),
    Sampler(SamplerParams),
}

impl BackendParams {
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendParams::Subtractive(_) => BackendKind::Subtractive,
            BackendParams::DualWavetable(_) => BackendKind::DualWavetable,
            BackendParams::Chip(_) => BackendKind::Chip,
            BackendParams::Sampler(_) => BackendKind::Sampler,
        }
    }
}

/// Everything a voice reads while playing.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentParams {
    pub backend: BackendParams,
    pub amp_envelope: EnvelopeDescriptor,
    pub mod_envelope: EnvelopeDescriptor,
    pub lfos: [LfoDescriptor; LFO_COUNT],
    pub modulation: ModulationMatrix,
    /// 0 to 1
    pub volume: f32,
    /// -1 (left) to 1 (right)
    pub pan: f32,
    /// Semitones for a full pitch bend
    pub pitch_bend_range: f32,
}

/// Default modulation envelope: a short pluck with no sustain.
pub const DEFAULT_MOD_ENVELOPE: EnvelopeDescriptor = EnvelopeDescriptor {
    delay: 0.0,
    attack: 0.005,
    hold: 0.0,
    decay: 0.3,
    sustain: 0.0,
    release: 0.2,
    curve: 0.0,
};

impl InstrumentParams {
    pub fn new(backend: BackendParams) -> Self {
        InstrumentParams {
            backend,
            amp_envelope: EnvelopeDescriptor::default(),
            mod_envelope: DEFAULT_MOD_ENVELOPE,
            lfos: Default::default(),
            modulation: ModulationMatrix::default(),
            volume: 0.8,
            pan: 0.0,
            pitch_bend_range: 2.0,
        }
    }

    pub fn subtractive(params: SubtractiveParams) -> Self {
        Self::new(BackendParams::Subtractive(params))
    }

    pub fn wavetable(params: WavetableParams) -> Self {
        Self::new(BackendParams::DualWavetable(params))
    }

    pub fn chip(params: ChipParams) -> Self {
        Self::new(BackendParams::Chip(params))
    }

    pub fn sampler(buffer: Arc<SampleBuffer>) -> Self {
        Self::new(BackendParams::Sampler(SamplerParams::new(buffer)))
    }

    /// A subtractive instrument with a single sine oscillator.
    pub fn sine() -> Self {
        Self::subtractive(SubtractiveParams {
            oscillators: [
                OscillatorParams::new(Waveform::Sine, 1.0),
                OscillatorParams::new(Waveform::Square, 0.0),
                OscillatorParams::new(Waveform::Sine, 0.0),
            ],
            ..Default::default()
        })
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn with_amp_envelope(mut self, envelope: EnvelopeDescriptor) -> Self {
        self.amp_envelope = envelope;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// The sample buffer used by the instrument, if any.
    pub fn sample_buffer(&self) -> Option<&Arc<SampleBuffer>> {
        match &self.backend {
            BackendParams::Sampler(sampler) => Some(&sampler.buffer),
            _ => None,
        }
    }

    /// All user wavetables referenced by the instrument.
    pub fn user_wavetables(&self) -> impl Iterator<Item = &Arc<Wavetable>> {
        let waveforms: [Option<&Waveform>; 3] = match &self.backend {
            BackendParams::Subtractive(s) => [
                Some(&s.oscillators[0].waveform),
                Some(&s.oscillators[1].waveform),
                Some(&s.oscillators[2].waveform),
            ],
            BackendParams::DualWavetable(w) => [Some(&w.a), Some(&w.b), None],
            _ => [None, None, None],
        };

        waveforms.into_iter().flatten().filter_map(|w| match w {
            Waveform::User(table) => Some(table),
            _ => None,
        })
    }
}

impl Default for InstrumentParams {
    fn default() -> Self {
        Self::subtractive(SubtractiveParams::default())
    }
}
