/// Parameters a modulation slot can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ModDestination {
    Volume,
    Pitch,
    Phase,
    PulseWidth,
    FilterCutoff,
    SubMix,
}

impl ModDestination {
    pub const ALL: [ModDestination; 6] = [
        ModDestination::Volume,
        ModDestination::Pitch,
        ModDestination::Phase,
        ModDestination::PulseWidth,
        ModDestination::FilterCutoff,
        ModDestination::SubMix,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn id(&self) -> &'static str {
        match self {
            ModDestination::Volume => "volume",
            ModDestination::Pitch => "pitch",
            ModDestination::Phase => "phase",
            ModDestination::PulseWidth => "pulse_width",
            ModDestination::FilterCutoff => "cutoff",
            ModDestination::SubMix => "sub_mix",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModDestination::Volume => "Volume",
            ModDestination::Pitch => "Pitch",
            ModDestination::Phase => "Phase",
            ModDestination::PulseWidth => "Pulse Width",
            ModDestination::FilterCutoff => "Filter Cutoff",
            ModDestination::SubMix => "Sub Mix",
        }
    }
}

/// Signals that can be routed into a modulation slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ModSource {
    AmpEnvelope,
    ModEnvelope,
    Lfo1,
    Lfo2,
}

impl ModSource {
    pub const ALL: [ModSource; 4] = [
        ModSource::AmpEnvelope,
        ModSource::ModEnvelope,
        ModSource::Lfo1,
        ModSource::Lfo2,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ModSource::AmpEnvelope => "amp_env",
            ModSource::ModEnvelope => "mod_env",
            ModSource::Lfo1 => "lfo1",
            ModSource::Lfo2 => "lfo2",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModSource::AmpEnvelope => "Amp Envelope",
            ModSource::ModEnvelope => "Mod Envelope",
            ModSource::Lfo1 => "LFO 1",
            ModSource::Lfo2 => "LFO 2",
        }
    }
}

/// Current values of every modulation source of a voice.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModSources {
    /// Amp and mod envelope, 0 to 1
    pub envelopes: [f32; 2],
    /// LFO 1 and 2, -1 to 1
    pub lfos: [f32; 2],
}

fn clamp_weight(weight: f32) -> f32 {
    if weight.is_nan() {
        0.0
    } else {
        weight.clamp(-1.0, 1.0)
    }
}

/// Signed weights for each source feeding one destination.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ModulationSlot {
    envelope_amounts: [f32; 2],
    lfo_amounts: [f32; 2],
}

impl ModulationSlot {
    pub fn new(envelope_amounts: [f32; 2], lfo_amounts: [f32; 2]) -> Self {
        ModulationSlot {
            envelope_amounts: envelope_amounts.map(clamp_weight),
            lfo_amounts: lfo_amounts.map(clamp_weight),
        }
    }

    pub fn weight(&self, source: ModSource) -> f32 {
        match source {
            ModSource::AmpEnvelope => self.envelope_amounts[0],
            ModSource::ModEnvelope => self.envelope_amounts[1],
            ModSource::Lfo1 => self.lfo_amounts[0],
            ModSource::Lfo2 => self.lfo_amounts[1],
        }
    }

    /// Sets a weight, clamped to [-1, 1].
    pub fn set_weight(&mut self, source: ModSource, weight: f32) {
        let weight = clamp_weight(weight);
        match source {
            ModSource::AmpEnvelope => self.envelope_amounts[0] = weight,
            ModSource::ModEnvelope => self.envelope_amounts[1] = weight,
            ModSource::Lfo1 => self.lfo_amounts[0] = weight,
            ModSource::Lfo2 => self.lfo_amounts[1] = weight,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.envelope_amounts.iter().all(|w| *w == 0.0)
            && self.lfo_amounts.iter().all(|w| *w == 0.0)
    }

    /// Weighted sum of the sources. The result is not clamped.
    #[inline(always)]
    pub fn resolve(&self, sources: &ModSources) -> f32 {
        self.envelope_amounts[0] * sources.envelopes[0]
            + self.envelope_amounts[1] * sources.envelopes[1]
            + self.lfo_amounts[0] * sources.lfos[0]
            + self.lfo_amounts[1] * sources.lfos[1]
    }
}

/// One modulation slot per destination.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ModulationMatrix {
    slots: [ModulationSlot; 6],
}

impl ModulationMatrix {
    pub fn slot(&self, destination: ModDestination) -> &ModulationSlot {
        &self.slots[destination.index()]
    }

    pub fn slot_mut(&mut self, destination: ModDestination) -> &mut ModulationSlot {
        &mut self.slots[destination.index()]
    }

    pub fn set(&mut self, destination: ModDestination, source: ModSource, weight: f32) {
        self.slot_mut(destination).set_weight(source, weight);
    }

    #[inline(always)]
    pub fn resolve(&self, destination: ModDestination, sources: &ModSources) -> f32 {
        self.slots[destination.index()].resolve(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_sum() {
        let slot = ModulationSlot::new([0.5, -1.0], [0.25, 0.0]);
        let sources = ModSources {
            envelopes: [1.0, 0.5],
            lfos: [-1.0, 1.0],
        };
        assert_eq!(slot.resolve(&sources), 0.5 - 0.5 - 0.25);
    }

    #[test]
    fn test_weights_are_clamped() {
        let mut slot = ModulationSlot::new([3.0, -3.0], [f32::NAN, 0.0]);
        assert_eq!(slot.weight(ModSource::AmpEnvelope), 1.0);
        assert_eq!(slot.weight(ModSource::ModEnvelope), -1.0);
        assert_eq!(slot.weight(ModSource::Lfo1), 0.0);
        slot.set_weight(ModSource::Lfo2, -7.0);
        assert_eq!(slot.weight(ModSource::Lfo2), -1.0);
    }

    #[test]
    fn test_result_is_unclamped() {
        let slot = ModulationSlot::new([1.0, 1.0], [1.0, 1.0]);
        let sources = ModSources {
            envelopes: [1.0, 1.0],
            lfos: [1.0, 1.0],
        };
        assert_eq!(slot.resolve(&sources), 4.0);
    }

    #[test]
    fn test_matrix_destinations_are_independent() {
        let mut matrix = ModulationMatrix::default();
        matrix.set(ModDestination::Pitch, ModSource::Lfo1, 0.5);
        let sources = ModSources {
            envelopes: [0.0, 0.0],
            lfos: [1.0, 0.0],
        };
        assert_eq!(matrix.resolve(ModDestination::Pitch, &sources), 0.5);
        assert_eq!(matrix.resolve(ModDestination::Volume, &sources), 0.0);
        assert!(matrix.slot(ModDestination::Volume).is_empty());
    }
}
