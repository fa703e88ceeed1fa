/// The stages of an envelope, in the order they are visited.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EnvelopeStage {
    Delay = 0,
    Attack = 1,
    Hold = 2,
    Decay = 3,
    Sustain = 4,
    Release = 5, // Goes to this stage as soon as the voice is released
    Off = 6,
}

impl EnvelopeStage {
    pub fn as_usize(&self) -> usize {
        *self as usize
    }

    pub fn next_stage(&self) -> EnvelopeStage {
        match self {
            EnvelopeStage::Delay => EnvelopeStage::Attack,
            EnvelopeStage::Attack => EnvelopeStage::Hold,
            EnvelopeStage::Hold => EnvelopeStage::Decay,
            EnvelopeStage::Decay => EnvelopeStage::Sustain,
            EnvelopeStage::Sustain => EnvelopeStage::Release,
            EnvelopeStage::Release => EnvelopeStage::Off,
            EnvelopeStage::Off => EnvelopeStage::Off,
        }
    }
}

/// Times are in seconds, levels between 0 and 1.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct EnvelopeDescriptor {
    pub delay: f32,
    pub attack: f32,
    pub hold: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    /// 0 is linear, positive values start slow and finish fast,
    /// negative values start fast and finish slow.
    pub curve: f32,
}

impl Default for EnvelopeDescriptor {
    fn default() -> Self {
        EnvelopeDescriptor {
            delay: 0.0,
            attack: 0.005,
            hold: 0.0,
            decay: 0.1,
            sustain: 0.8,
            release: 0.2,
            curve: 0.0,
        }
    }
}

fn sanitize_duration(seconds: f32) -> f32 {
    // NaN fails the comparison and ends up at 0 as well
    if seconds > 0.0 {
        seconds.min(f32::MAX)
    } else {
        0.0
    }
}

fn sanitize_unit(value: f32, min: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, 1.0)
    }
}

impl EnvelopeDescriptor {
    /// Treats negative and NaN durations as 0 and clamps the levels.
    pub fn sanitized(&self) -> Self {
        EnvelopeDescriptor {
            delay: sanitize_duration(self.delay),
            attack: sanitize_duration(self.attack),
            hold: sanitize_duration(self.hold),
            decay: sanitize_duration(self.decay),
            sustain: sanitize_unit(self.sustain, 0.0, 0.0),
            release: sanitize_duration(self.release),
            curve: sanitize_unit(self.curve, -1.0, 0.0),
        }
    }
}

/// Bends a ramp progress in [0, 1] according to the curve amount.
#[inline(always)]
pub fn apply_curve(progress: f32, curve: f32) -> f32 {
    let x = progress.clamp(0.0, 1.0);
    if curve > 0.0 {
        x.powf(1.0 + 2.0 * curve)
    } else if curve < 0.0 {
        1.0 - (1.0 - x).powf(1.0 - 2.0 * curve)
    } else {
        x
    }
}

/// A delay/attack/hold/decay/sustain/release envelope, advanced by time.
#[derive(Debug, Clone)]
pub struct Envelope {
    desc: EnvelopeDescriptor,
    stage: EnvelopeStage,
    stage_elapsed: f32,
    value: f32,
    release_start: f32,
    release_time: f32,
}

impl Envelope {
    pub fn new(desc: EnvelopeDescriptor) -> Self {
        let desc = desc.sanitized();
        Envelope {
            desc,
            stage: EnvelopeStage::Delay,
            stage_elapsed: 0.0,
            value: 0.0,
            release_start: 0.0,
            release_time: desc.release,
        }
    }

    pub fn descriptor(&self) -> &EnvelopeDescriptor {
        &self.desc
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Seconds spent in the current stage.
    pub fn stage_elapsed(&self) -> f32 {
        self.stage_elapsed
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_off(&self) -> bool {
        self.stage == EnvelopeStage::Off
    }

    pub fn is_releasing(&self) -> bool {
        matches!(self.stage, EnvelopeStage::Release | EnvelopeStage::Off)
    }

    /// Restarts the envelope from the delay stage.
    pub fn reset(&mut self) {
        *self = Envelope::new(self.desc);
    }

    /// Moves to the release stage, starting from the current value.
    pub fn note_off(&mut self) {
        if self.is_releasing() {
            return;
        }
        self.enter_release(self.desc.release);
    }

    /// Forces a release of `fade_seconds`, even when already releasing.
    pub fn kill(&mut self, fade_seconds: f32) {
        if self.is_off() {
            return;
        }
        let remaining = if self.stage == EnvelopeStage::Release {
            (self.release_time - self.stage_elapsed).max(0.0)
        } else {
            f32::MAX
        };
        self.enter_release(sanitize_duration(fade_seconds).min(remaining));
    }

    fn enter_release(&mut self, release_time: f32) {
        self.release_start = self.value;
        self.release_time = release_time;
        self.stage = EnvelopeStage::Release;
        self.stage_elapsed = 0.0;
    }

    fn stage_duration(&self) -> Option<f32> {
        match self.stage {
            EnvelopeStage::Delay => Some(self.desc.delay),
            EnvelopeStage::Attack => Some(self.desc.attack),
            EnvelopeStage::Hold => Some(self.desc.hold),
            EnvelopeStage::Decay => Some(self.desc.decay),
            EnvelopeStage::Release => Some(self.release_time),
            EnvelopeStage::Sustain | EnvelopeStage::Off => None,
        }
    }

    /// Advances the envelope by `delta` seconds and returns the new value.
    ///
    /// Time left over after a stage ends carries into the following ones,
    /// so a single call may cross several stages.
    pub fn advance(&mut self, delta: f32) -> f32 {
        let mut remaining = sanitize_duration(delta);

        loop {
            match self.stage {
                EnvelopeStage::Off => break,
                EnvelopeStage::Sustain => {
                    if self.desc.sustain <= 0.0 {
                        self.stage = EnvelopeStage::Off;
                        self.stage_elapsed = 0.0;
                    } else {
                        self.stage_elapsed += remaining;
                    }
                    break;
                }
                _ => {
                    let duration = self.stage_duration().unwrap_or(0.0);
                    let left = duration - self.stage_elapsed;
                    if duration <= 0.0 || remaining >= left {
                        remaining = (remaining - left.max(0.0)).max(0.0);
                        self.stage = self.stage.next_stage();
                        self.stage_elapsed = 0.0;
                    } else {
                        self.stage_elapsed += remaining;
                        break;
                    }
                }
            }
        }

        self.value = self.compute_value().clamp(0.0, 1.0);
        self.value
    }

    fn progress(&self, duration: f32) -> f32 {
        if duration <= 0.0 {
            1.0
        } else {
            apply_curve(self.stage_elapsed / duration, self.desc.curve)
        }
    }

    fn compute_value(&self) -> f32 {
        match self.stage {
            EnvelopeStage::Delay => 0.0,
            EnvelopeStage::Attack => self.progress(self.desc.attack),
            EnvelopeStage::Hold => 1.0,
            EnvelopeStage::Decay => {
                let sustain = self.desc.sustain;
                1.0 + (sustain - 1.0) * self.progress(self.desc.decay)
            }
            EnvelopeStage::Sustain => self.desc.sustain,
            EnvelopeStage::Release => {
                self.release_start * (1.0 - self.progress(self.release_time))
            }
            EnvelopeStage::Off => 0.0,
        }
    }
}
