use lazy_static::lazy_static;

use crate::{
    voice::{EnvelopeDescriptor, ModDestination, ModSource, MAX_LFO_RATE, MIN_LFO_RATE},
    waveform::BUILTIN_WAVEFORMS,
};

use super::{
    BackendKind, EnvelopeParam, EnvelopeTarget, OscParam, ParameterKey, DEFAULT_MOD_ENVELOPE,
    LFO_COUNT, MAX_OSCILLATORS,
};

/// How a UI should map a control to the parameter range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ParameterCurve {
    Linear,
    Logarithmic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ParameterCategory {
    Output,
    Envelope,
    Lfo,
    Modulation,
    Oscillator,
    Filter,
    Wavetable,
    Chip,
    Sample,
}

/// Legal values of a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
    /// 0 for continuous parameters
    pub step: f32,
    pub unit: &'static str,
    pub curve: ParameterCurve,
    pub category: ParameterCategory,
}

impl ParameterRange {
    const fn linear(
        min: f32,
        max: f32,
        default: f32,
        unit: &'static str,
        category: ParameterCategory,
    ) -> Self {
        ParameterRange {
            min,
            max,
            default,
            step: 0.0,
            unit,
            curve: ParameterCurve::Linear,
            category,
        }
    }

    const fn log(
        min: f32,
        max: f32,
        default: f32,
        unit: &'static str,
        category: ParameterCategory,
    ) -> Self {
        ParameterRange {
            min,
            max,
            default,
            step: 0.0,
            unit,
            curve: ParameterCurve::Logarithmic,
            category,
        }
    }

    const fn stepped(max: f32, default: f32, category: ParameterCategory) -> Self {
        ParameterRange {
            min: 0.0,
            max,
            default,
            step: 1.0,
            unit: "",
            curve: ParameterCurve::Linear,
            category,
        }
    }

    /// Clamps into the range. NaN becomes the default.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

const MAX_STAGE_SECONDS: f32 = 10.0;
const MAX_RELEASE_SECONDS: f32 = 20.0;

fn envelope_range(target: EnvelopeTarget, param: EnvelopeParam) -> ParameterRange {
    use ParameterCategory::Envelope;

    let defaults = match target {
        EnvelopeTarget::Amp => EnvelopeDescriptor::default(),
        EnvelopeTarget::Mod => DEFAULT_MOD_ENVELOPE,
    };

    match param {
        EnvelopeParam::Delay => ParameterRange::log(0.0, MAX_STAGE_SECONDS, defaults.delay, "s", Envelope),
        EnvelopeParam::Attack => ParameterRange::log(0.0, MAX_STAGE_SECONDS, defaults.attack, "s", Envelope),
        EnvelopeParam::Hold => ParameterRange::log(0.0, MAX_STAGE_SECONDS, defaults.hold, "s", Envelope),
        EnvelopeParam::Decay => ParameterRange::log(0.0, MAX_STAGE_SECONDS, defaults.decay, "s", Envelope),
        EnvelopeParam::Sustain => ParameterRange::linear(0.0, 1.0, defaults.sustain, "", Envelope),
        EnvelopeParam::Release => {
            ParameterRange::log(0.0, MAX_RELEASE_SECONDS, defaults.release, "s", Envelope)
        }
        EnvelopeParam::Curve => ParameterRange::linear(-1.0, 1.0, defaults.curve, "", Envelope),
    }
}

fn oscillator_range(index: u8, param: OscParam) -> ParameterRange {
    use ParameterCategory::Oscillator;

    match param {
        OscParam::Waveform => {
            let default = match index {
                0 => 2.0, // Saw
                1 => 4.0, // Square
                _ => 0.0, // Sine
            };
            ParameterRange::stepped((BUILTIN_WAVEFORMS.len() - 1) as f32, default, Oscillator)
        }
        OscParam::Level => {
            let default = if index == 0 { 1.0 } else { 0.0 };
            ParameterRange::linear(0.0, 1.0, default, "", Oscillator)
        }
        OscParam::Detune => ParameterRange {
            step: 1.0,
            ..ParameterRange::linear(-24.0, 24.0, 0.0, "st", Oscillator)
        },
        OscParam::Fine => ParameterRange::linear(-100.0, 100.0, 0.0, "ct", Oscillator),
        OscParam::PulseWidth => ParameterRange::linear(0.01, 0.99, 0.5, "", Oscillator),
    }
}

impl ParameterKey {
    /// The range, default and display metadata of the parameter.
    pub fn range(&self) -> ParameterRange {
        use ParameterCategory::*;

        match *self {
            ParameterKey::Volume => ParameterRange::linear(0.0, 1.0, 0.8, "", Output),
            ParameterKey::Pan => ParameterRange::linear(-1.0, 1.0, 0.0, "", Output),
            ParameterKey::PitchBendRange => ParameterRange {
                step: 1.0,
                ..ParameterRange::linear(0.0, 24.0, 2.0, "st", Output)
            },
            ParameterKey::Envelope(target, param) => envelope_range(target, param),
            ParameterKey::LfoShape(_) => ParameterRange::stepped(3.0, 0.0, Lfo),
            ParameterKey::LfoRate(_) => ParameterRange::log(MIN_LFO_RATE, MAX_LFO_RATE, 5.0, "Hz", Lfo),
            ParameterKey::Modulation(..) => ParameterRange::linear(-1.0, 1.0, 0.0, "", Modulation),

            ParameterKey::Oscillator(index, param) => oscillator_range(index, param),
            ParameterKey::SubLevel => ParameterRange::linear(0.0, 1.0, 0.0, "", Oscillator),
            ParameterKey::FilterEnabled => ParameterRange::stepped(1.0, 0.0, Filter),
            ParameterKey::FilterCutoff => ParameterRange::log(20.0, 20000.0, 20000.0, "Hz", Filter),
            ParameterKey::FilterResonance => {
                ParameterRange::log(0.5, 10.0, biquad::Q_BUTTERWORTH_F32, "", Filter)
            }

            ParameterKey::WavetableA => {
                ParameterRange::stepped((BUILTIN_WAVEFORMS.len() - 1) as f32, 7.0, Wavetable)
            }
            ParameterKey::WavetableB => {
                ParameterRange::stepped((BUILTIN_WAVEFORMS.len() - 1) as f32, 6.0, Wavetable)
            }
            ParameterKey::WavetableMix => ParameterRange::linear(0.0, 1.0, 0.5, "", Wavetable),
            ParameterKey::WavetableDetune => ParameterRange::linear(-24.0, 24.0, 0.0, "st", Wavetable),
            ParameterKey::WavetableInterpolation => ParameterRange::stepped(2.0, 1.0, Wavetable),

            ParameterKey::ChipChannel => ParameterRange::stepped(2.0, 0.0, Chip),
            ParameterKey::ChipDuty => ParameterRange::stepped(3.0, 2.0, Chip),
            ParameterKey::ChipNoiseMode => ParameterRange::stepped(1.0, 0.0, Chip),

            ParameterKey::SampleRootKey => ParameterRange::stepped(127.0, 60.0, Sample),
            ParameterKey::SampleFineTune => ParameterRange::linear(-100.0, 100.0, 0.0, "ct", Sample),
            ParameterKey::SampleInterpolation => ParameterRange::stepped(2.0, 1.0, Sample),
        }
    }

    /// Stable string key, e.g. `amp_env.attack` or `osc2.level`.
    pub fn id(&self) -> String {
        fn env_param(param: EnvelopeParam) -> &'static str {
            match param {
                EnvelopeParam::Delay => "delay",
                EnvelopeParam::Attack => "attack",
                EnvelopeParam::Hold => "hold",
                EnvelopeParam::Decay => "decay",
                EnvelopeParam::Sustain => "sustain",
                EnvelopeParam::Release => "release",
                EnvelopeParam::Curve => "curve",
            }
        }

        fn osc_param(param: OscParam) -> &'static str {
            match param {
                OscParam::Waveform => "waveform",
                OscParam::Level => "level",
                OscParam::Detune => "detune",
                OscParam::Fine => "fine",
                OscParam::PulseWidth => "pulse_width",
            }
        }

        match *self {
            ParameterKey::Volume => "volume".into(),
            ParameterKey::Pan => "pan".into(),
            ParameterKey::PitchBendRange => "pitch_bend_range".into(),
            ParameterKey::Envelope(EnvelopeTarget::Amp, p) => format!("amp_env.{}", env_param(p)),
            ParameterKey::Envelope(EnvelopeTarget::Mod, p) => format!("mod_env.{}", env_param(p)),
            ParameterKey::LfoShape(i) => format!("lfo{}.shape", i + 1),
            ParameterKey::LfoRate(i) => format!("lfo{}.rate", i + 1),
            ParameterKey::Modulation(dest, source) => {
                format!("mod.{}.{}", dest.id(), source.id())
            }
            ParameterKey::Oscillator(i, p) => format!("osc{}.{}", i + 1, osc_param(p)),
            ParameterKey::SubLevel => "sub.level".into(),
            ParameterKey::FilterEnabled => "filter.enabled".into(),
            ParameterKey::FilterCutoff => "filter.cutoff".into(),
            ParameterKey::FilterResonance => "filter.resonance".into(),
            ParameterKey::WavetableA => "wavetable.a".into(),
            ParameterKey::WavetableB => "wavetable.b".into(),
            ParameterKey::WavetableMix => "wavetable.mix".into(),
            ParameterKey::WavetableDetune => "wavetable.detune".into(),
            ParameterKey::WavetableInterpolation => "wavetable.interpolation".into(),
            ParameterKey::ChipChannel => "chip.channel".into(),
            ParameterKey::ChipDuty => "chip.duty".into(),
            ParameterKey::ChipNoiseMode => "chip.noise_mode".into(),
            ParameterKey::SampleRootKey => "sample.root_key".into(),
            ParameterKey::SampleFineTune => "sample.fine_tune".into(),
            ParameterKey::SampleInterpolation => "sample.interpolation".into(),
        }
    }

    /// Human readable name.
    pub fn name(&self) -> String {
        fn env_param(param: EnvelopeParam) -> &'static str {
            match param {
                EnvelopeParam::Delay => "Delay",
                EnvelopeParam::Attack => "Attack",
                EnvelopeParam::Hold => "Hold",
                EnvelopeParam::Decay => "Decay",
                EnvelopeParam::Sustain => "Sustain",
                EnvelopeParam::Release => "Release",
                EnvelopeParam::Curve => "Curve",
            }
        }

        match *self {
            ParameterKey::Volume => "Volume".into(),
            ParameterKey::Pan => "Pan".into(),
            ParameterKey::PitchBendRange => "Pitch Bend Range".into(),
            ParameterKey::Envelope(EnvelopeTarget::Amp, p) => format!("Amp {}", env_param(p)),
            ParameterKey::Envelope(EnvelopeTarget::Mod, p) => format!("Mod {}", env_param(p)),
            ParameterKey::LfoShape(i) => format!("LFO {} Shape", i + 1),
            ParameterKey::LfoRate(i) => format!("LFO {} Rate", i + 1),
            ParameterKey::Modulation(dest, source) => {
                format!("{} > {}", source.name(), dest.name())
            }
            ParameterKey::Oscillator(i, p) => {
                let param = match p {
                    OscParam::Waveform => "Waveform",
                    OscParam::Level => "Level",
                    OscParam::Detune => "Detune",
                    OscParam::Fine => "Fine",
                    OscParam::PulseWidth => "Pulse Width",
                };
                format!("Osc {} {}", i + 1, param)
            }
            ParameterKey::SubLevel => "Sub Level".into(),
            ParameterKey::FilterEnabled => "Filter".into(),
            ParameterKey::FilterCutoff => "Cutoff".into(),
            ParameterKey::FilterResonance => "Resonance".into(),
            ParameterKey::WavetableA => "Wavetable A".into(),
            ParameterKey::WavetableB => "Wavetable B".into(),
            ParameterKey::WavetableMix => "A/B Mix".into(),
            ParameterKey::WavetableDetune => "B Detune".into(),
            ParameterKey::WavetableInterpolation => "Interpolation".into(),
            ParameterKey::ChipChannel => "Channel".into(),
            ParameterKey::ChipDuty => "Duty".into(),
            ParameterKey::ChipNoiseMode => "Short Noise".into(),
            ParameterKey::SampleRootKey => "Root Key".into(),
            ParameterKey::SampleFineTune => "Fine Tune".into(),
            ParameterKey::SampleInterpolation => "Interpolation".into(),
        }
    }
}

/// Static metadata of one parameter, as exposed to user interfaces.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParameterDescriptor {
    pub key: ParameterKey,
    pub id: String,
    pub name: String,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub step: f32,
    pub unit: &'static str,
    pub curve: ParameterCurve,
    pub category: ParameterCategory,
}

impl ParameterDescriptor {
    pub fn new(key: ParameterKey) -> Self {
        let range = key.range();
        ParameterDescriptor {
            key,
            id: key.id(),
            name: key.name(),
            min: range.min,
            max: range.max,
            default: range.default,
            step: range.step,
            unit: range.unit,
            curve: range.curve,
            category: range.category,
        }
    }
}

/// Every key of a backend, in display order.
fn all_keys(kind: BackendKind) -> Vec<ParameterKey> {
    let mut keys = vec![
        ParameterKey::Volume,
        ParameterKey::Pan,
        ParameterKey::PitchBendRange,
    ];

    match kind {
        BackendKind::Subtractive => {
            for i in 0..MAX_OSCILLATORS as u8 {
                keys.extend(OscParam::ALL.iter().map(|p| ParameterKey::Oscillator(i, *p)));
            }
            keys.extend([
                ParameterKey::SubLevel,
                ParameterKey::FilterEnabled,
                ParameterKey::FilterCutoff,
                ParameterKey::FilterResonance,
            ]);
        }
        BackendKind::DualWavetable => keys.extend([
            ParameterKey::WavetableA,
            ParameterKey::WavetableB,
            ParameterKey::WavetableMix,
            ParameterKey::WavetableDetune,
            ParameterKey::WavetableInterpolation,
        ]),
        BackendKind::Chip => keys.extend([
            ParameterKey::ChipChannel,
            ParameterKey::ChipDuty,
            ParameterKey::ChipNoiseMode,
        ]),
        BackendKind::Sampler => keys.extend([
            ParameterKey::SampleRootKey,
            ParameterKey::SampleFineTune,
            ParameterKey::SampleInterpolation,
        ]),
    }

    for target in [EnvelopeTarget::Amp, EnvelopeTarget::Mod] {
        keys.extend(EnvelopeParam::ALL.iter().map(|p| ParameterKey::Envelope(target, *p)));
    }
    for i in 0..LFO_COUNT as u8 {
        keys.push(ParameterKey::LfoShape(i));
        keys.push(ParameterKey::LfoRate(i));
    }
    for dest in ModDestination::ALL {
        keys.extend(ModSource::ALL.iter().map(|s| ParameterKey::Modulation(dest, *s)));
    }

    keys
}

fn build_descriptors(kind: BackendKind) -> Vec<ParameterDescriptor> {
    all_keys(kind).into_iter().map(ParameterDescriptor::new).collect()
}

lazy_static! {
    static ref SUBTRACTIVE_DESCRIPTORS: Vec<ParameterDescriptor> =
        build_descriptors(BackendKind::Subtractive);
    static ref WAVETABLE_DESCRIPTORS: Vec<ParameterDescriptor> =
        build_descriptors(BackendKind::DualWavetable);
    static ref CHIP_DESCRIPTORS: Vec<ParameterDescriptor> = build_descriptors(BackendKind::Chip);
    static ref SAMPLER_DESCRIPTORS: Vec<ParameterDescriptor> =
        build_descriptors(BackendKind::Sampler);
}

/// The parameter list of a backend.
pub fn descriptors(kind: BackendKind) -> &'static [ParameterDescriptor] {
    match kind {
        BackendKind::Subtractive => SUBTRACTIVE_DESCRIPTORS.as_slice(),
        BackendKind::DualWavetable => WAVETABLE_DESCRIPTORS.as_slice(),
        BackendKind::Chip => CHIP_DESCRIPTORS.as_slice(),
        BackendKind::Sampler => SAMPLER_DESCRIPTORS.as_slice(),
    }
}

/// Looks up a parameter of a backend by its string key.
pub fn find_descriptor(kind: BackendKind, id: &str) -> Option<&'static ParameterDescriptor> {
    descriptors(kind).iter().find(|d| d.id == id)
}
