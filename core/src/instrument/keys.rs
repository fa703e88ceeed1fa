use std::sync::Arc;

use crate::{
    voice::{ChipChannel, EnvelopeDescriptor, LfoShape, ModDestination, ModSource},
    waveform::{Interpolator, LfsrWidth, Waveform, Wavetable},
};

use super::{BackendKind, BackendParams, InstrumentParams, LFO_COUNT, MAX_OSCILLATORS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum EnvelopeTarget {
    Amp,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum EnvelopeParam {
    Delay,
    Attack,
    Hold,
    Decay,
    Sustain,
    Release,
    Curve,
}

impl EnvelopeParam {
    pub const ALL: [EnvelopeParam; 7] = [
        EnvelopeParam::Delay,
        EnvelopeParam::Attack,
        EnvelopeParam::Hold,
        EnvelopeParam::Decay,
        EnvelopeParam::Sustain,
        EnvelopeParam::Release,
        EnvelopeParam::Curve,
    ];

    fn field(self, desc: &mut EnvelopeDescriptor) -> &mut f32 {
        match self {
            EnvelopeParam::Delay => &mut desc.delay,
            EnvelopeParam::Attack => &mut desc.attack,
            EnvelopeParam::Hold => &mut desc.hold,
            EnvelopeParam::Decay => &mut desc.decay,
            EnvelopeParam::Sustain => &mut desc.sustain,
            EnvelopeParam::Release => &mut desc.release,
            EnvelopeParam::Curve => &mut desc.curve,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OscParam {
    Waveform,
    Level,
    Detune,
    Fine,
    PulseWidth,
}

impl OscParam {
    pub const ALL: [OscParam; 5] = [
        OscParam::Waveform,
        OscParam::Level,
        OscParam::Detune,
        OscParam::Fine,
        OscParam::PulseWidth,
    ];
}

/// Identifies a single automatable parameter of an instrument.
///
/// Oscillator and LFO indexes are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ParameterKey {
    Volume,
    Pan,
    PitchBendRange,
    Envelope(EnvelopeTarget, EnvelopeParam),
    LfoShape(u8),
    LfoRate(u8),
    Modulation(ModDestination, ModSource),

    Oscillator(u8, OscParam),
    SubLevel,
    FilterEnabled,
    FilterCutoff,
    FilterResonance,

    WavetableA,
    WavetableB,
    WavetableMix,
    WavetableDetune,
    WavetableInterpolation,

    ChipChannel,
    ChipDuty,
    ChipNoiseMode,

    SampleRootKey,
    SampleFineTune,
    SampleInterpolation,
}

impl ParameterKey {
    /// Whether the key exists on instruments of the given backend.
    pub fn applies_to(&self, kind: BackendKind) -> bool {
        match self {
            ParameterKey::Volume
            | ParameterKey::Pan
            | ParameterKey::PitchBendRange
            | ParameterKey::Envelope(..)
            | ParameterKey::Modulation(..) => true,
            ParameterKey::LfoShape(i) | ParameterKey::LfoRate(i) => (*i as usize) < LFO_COUNT,
            ParameterKey::Oscillator(i, _) => {
                kind == BackendKind::Subtractive && (*i as usize) < MAX_OSCILLATORS
            }
            ParameterKey::SubLevel
            | ParameterKey::FilterEnabled
            | ParameterKey::FilterCutoff
            | ParameterKey::FilterResonance => kind == BackendKind::Subtractive,
            ParameterKey::WavetableA
            | ParameterKey::WavetableB
            | ParameterKey::WavetableMix
            | ParameterKey::WavetableDetune
            | ParameterKey::WavetableInterpolation => kind == BackendKind::DualWavetable,
            ParameterKey::ChipChannel | ParameterKey::ChipDuty | ParameterKey::ChipNoiseMode => {
                kind == BackendKind::Chip
            }
            ParameterKey::SampleRootKey
            | ParameterKey::SampleFineTune
            | ParameterKey::SampleInterpolation => kind == BackendKind::Sampler,
        }
    }
}

/// The result of writing a parameter into an instrument.
#[derive(Debug)]
pub enum ParameterUpdate {
    /// The key doesn't exist on this backend
    Unsupported,
    Applied,
    /// Applied, and a user wavetable was swapped out for a built-in waveform
    ReplacedTable(Arc<Wavetable>),
}

impl ParameterUpdate {
    pub fn is_applied(&self) -> bool {
        !matches!(self, ParameterUpdate::Unsupported)
    }
}

fn index_value(value: f32) -> usize {
    value.round().max(0.0) as usize
}

fn set_waveform(slot: &mut Waveform, value: f32) -> ParameterUpdate {
    let previous = std::mem::replace(slot, Waveform::from_index(index_value(value)));
    match previous {
        Waveform::User(table) => ParameterUpdate::ReplacedTable(table),
        _ => ParameterUpdate::Applied,
    }
}

fn waveform_value(waveform: &Waveform) -> f32 {
    // User tables have no index, report the first built-in shape
    waveform.index().unwrap_or(0) as f32
}

impl InstrumentParams {
    /// Writes a parameter, clamping the value into its legal range.
    pub fn set(&mut self, key: ParameterKey, value: f32) -> ParameterUpdate {
        if !key.applies_to(self.kind()) {
            return ParameterUpdate::Unsupported;
        }
        let value = key.range().clamp(value);

        match key {
            ParameterKey::Volume => self.volume = value,
            ParameterKey::Pan => self.pan = value,
            ParameterKey::PitchBendRange => self.pitch_bend_range = value,
            ParameterKey::Envelope(target, param) => {
                let desc = match target {
                    EnvelopeTarget::Amp => &mut self.amp_envelope,
                    EnvelopeTarget::Mod => &mut self.mod_envelope,
                };
                *param.field(desc) = value;
            }
            ParameterKey::LfoShape(i) => {
                self.lfos[i as usize].shape = LfoShape::from_index(index_value(value))
            }
            ParameterKey::LfoRate(i) => self.lfos[i as usize].rate = value,
            ParameterKey::Modulation(dest, source) => self.modulation.set(dest, source, value),
            _ => return self.set_backend(key, value),
        }

        ParameterUpdate::Applied
    }

    fn set_backend(&mut self, key: ParameterKey, value: f32) -> ParameterUpdate {
        match (&mut self.backend, key) {
            (BackendParams::Subtractive(s), ParameterKey::Oscillator(i, param)) => {
                let osc = &mut s.oscillators[i as usize];
                match param {
                    OscParam::Waveform => return set_waveform(&mut osc.waveform, value),
                    OscParam::Level => osc.level = value,
                    OscParam::Detune => osc.detune = value,
                    OscParam::Fine => osc.fine = value,
                    OscParam::PulseWidth => osc.pulse_width = value,
                }
            }
            (BackendParams::Subtractive(s), ParameterKey::SubLevel) => s.sub_level = value,
            (BackendParams::Subtractive(s), ParameterKey::FilterEnabled) => {
                s.filter.enabled = value >= 0.5
            }
            (BackendParams::Subtractive(s), ParameterKey::FilterCutoff) => s.filter.cutoff = value,
            (BackendParams::Subtractive(s), ParameterKey::FilterResonance) => {
                s.filter.resonance = value
            }

            (BackendParams::DualWavetable(w), ParameterKey::WavetableA) => {
                return set_waveform(&mut w.a, value)
            }
            (BackendParams::DualWavetable(w), ParameterKey::WavetableB) => {
                return set_waveform(&mut w.b, value)
            }
            (BackendParams::DualWavetable(w), ParameterKey::WavetableMix) => w.mix = value,
            (BackendParams::DualWavetable(w), ParameterKey::WavetableDetune) => {
                w.detune_b = value
            }
            (BackendParams::DualWavetable(w), ParameterKey::WavetableInterpolation) => {
                w.interpolator = Interpolator::from_index(index_value(value))
            }

            (BackendParams::Chip(c), ParameterKey::ChipChannel) => {
                c.channel = ChipChannel::from_index(index_value(value))
            }
            (BackendParams::Chip(c), ParameterKey::ChipDuty) => c.duty = index_value(value),
            (BackendParams::Chip(c), ParameterKey::ChipNoiseMode) => {
                c.noise_width = if value >= 0.5 {
                    LfsrWidth::Short
                } else {
                    LfsrWidth::Long
                }
            }

            (BackendParams::Sampler(s), ParameterKey::SampleRootKey) => {
                s.root_key = index_value(value).min(127) as u8
            }
            (BackendParams::Sampler(s), ParameterKey::SampleFineTune) => s.fine_tune = value,
            (BackendParams::Sampler(s), ParameterKey::SampleInterpolation) => {
                s.interpolator = Interpolator::from_index(index_value(value))
            }

            _ => return ParameterUpdate::Unsupported,
        }

        ParameterUpdate::Applied
    }

    /// Reads a parameter back as the value it would be set with.
    pub fn get(&self, key: ParameterKey) -> Option<f32> {
        if !key.applies_to(self.kind()) {
            return None;
        }

        let value = match (&self.backend, key) {
            (_, ParameterKey::Volume) => self.volume,
            (_, ParameterKey::Pan) => self.pan,
            (_, ParameterKey::PitchBendRange) => self.pitch_bend_range,
            (_, ParameterKey::Envelope(target, param)) => {
                let mut desc = match target {
                    EnvelopeTarget::Amp => self.amp_envelope,
                    EnvelopeTarget::Mod => self.mod_envelope,
                };
                *param.field(&mut desc)
            }
            (_, ParameterKey::LfoShape(i)) => self.lfos[i as usize].shape.index() as f32,
            (_, ParameterKey::LfoRate(i)) => self.lfos[i as usize].rate,
            (_, ParameterKey::Modulation(dest, source)) => {
                self.modulation.slot(dest).weight(source)
            }

            (BackendParams::Subtractive(s), ParameterKey::Oscillator(i, param)) => {
                let osc = &s.oscillators[i as usize];
                match param {
                    OscParam::Waveform => waveform_value(&osc.waveform),
                    OscParam::Level => osc.level,
                    OscParam::Detune => osc.detune,
                    OscParam::Fine => osc.fine,
                    OscParam::PulseWidth => osc.pulse_width,
                }
            }
            (BackendParams::Subtractive(s), ParameterKey::SubLevel) => s.sub_level,
            (BackendParams::Subtractive(s), ParameterKey::FilterEnabled) => {
                if s.filter.enabled {
                    1.0
                } else {
                    0.0
                }
            }
            (BackendParams::Subtractive(s), ParameterKey::FilterCutoff) => s.filter.cutoff,
            (BackendParams::Subtractive(s), ParameterKey::FilterResonance) => s.filter.resonance,

            (BackendParams::DualWavetable(w), ParameterKey::WavetableA) => waveform_value(&w.a),
            (BackendParams::DualWavetable(w), ParameterKey::WavetableB) => waveform_value(&w.b),
            (BackendParams::DualWavetable(w), ParameterKey::WavetableMix) => w.mix,
            (BackendParams::DualWavetable(w), ParameterKey::WavetableDetune) => w.detune_b,
            (BackendParams::DualWavetable(w), ParameterKey::WavetableInterpolation) => {
                w.interpolator.index() as f32
            }

            (BackendParams::Chip(c), ParameterKey::ChipChannel) => c.channel.index() as f32,
            (BackendParams::Chip(c), ParameterKey::ChipDuty) => c.duty as f32,
            (BackendParams::Chip(c), ParameterKey::ChipNoiseMode) => match c.noise_width {
                LfsrWidth::Long => 0.0,
                LfsrWidth::Short => 1.0,
            },

            (BackendParams::Sampler(s), ParameterKey::SampleRootKey) => s.root_key as f32,
            (BackendParams::Sampler(s), ParameterKey::SampleFineTune) => s.fine_tune,
            (BackendParams::Sampler(s), ParameterKey::SampleInterpolation) => {
                s.interpolator.index() as f32
            }

            _ => return None,
        };

        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::{ChipParams, WavetableParams};

    #[test]
    fn test_values_are_clamped() {
        let mut params = InstrumentParams::default();
        assert!(params.set(ParameterKey::Volume, 4.0).is_applied());
        assert_eq!(params.volume, 1.0);
        params.set(ParameterKey::Pan, -3.0);
        assert_eq!(params.pan, -1.0);
        params.set(
            ParameterKey::Envelope(EnvelopeTarget::Amp, EnvelopeParam::Attack),
            -1.0,
        );
        assert_eq!(params.amp_envelope.attack, 0.0);
        params.set(ParameterKey::Oscillator(0, OscParam::PulseWidth), 1.0);
        assert_eq!(
            params.get(ParameterKey::Oscillator(0, OscParam::PulseWidth)),
            Some(0.99)
        );
    }

    #[test]
    fn test_unsupported_keys() {
        let mut params = InstrumentParams::chip(ChipParams::default());
        assert!(!params.set(ParameterKey::FilterCutoff, 100.0).is_applied());
        assert!(!params.set(ParameterKey::LfoRate(5), 1.0).is_applied());
        assert_eq!(params.get(ParameterKey::SampleRootKey), None);

        assert!(params.set(ParameterKey::ChipNoiseMode, 1.0).is_applied());
        assert_eq!(params.get(ParameterKey::ChipNoiseMode), Some(1.0));
        assert!(!ParameterKey::Oscillator(3, OscParam::Level).applies_to(BackendKind::Subtractive));
    }

    #[test]
    fn test_replacing_user_table() {
        let table = Arc::new(Wavetable::from_samples(&[0.0, 1.0]).unwrap());
        let mut params = InstrumentParams::wavetable(WavetableParams {
            a: Waveform::User(table.clone()),
            ..Default::default()
        });

        match params.set(ParameterKey::WavetableA, 0.0) {
            ParameterUpdate::ReplacedTable(old) => assert!(Arc::ptr_eq(&old, &table)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(params.get(ParameterKey::WavetableA), Some(0.0));
    }

    #[test]
    fn test_modulation_round_trip() {
        let mut params = InstrumentParams::default();
        let key = ParameterKey::Modulation(ModDestination::Pitch, ModSource::Lfo2);
        params.set(key, 0.25);
        assert_eq!(params.get(key), Some(0.25));
        assert_eq!(
            params.modulation.slot(ModDestination::Pitch).weight(ModSource::Lfo2),
            0.25
        );
    }
}
