/// Register width of a chip-style noise generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LfsrWidth {
    /// 15-bit register, period 32767
    Long,
    /// 7-bit register, period 127
    Short,
}

impl LfsrWidth {
    pub fn bits(&self) -> u32 {
        match self {
            LfsrWidth::Long => 15,
            LfsrWidth::Short => 7,
        }
    }

    pub fn period(&self) -> usize {
        (1 << self.bits()) - 1
    }

    fn mask(&self) -> u16 {
        ((1u32 << self.bits()) - 1) as u16
    }
}

/// Seed used when none (or an all-zero one) is given.
pub const DEFAULT_LFSR_SEED: u16 = 1;

/// Linear-feedback shift register noise.
///
/// Each step XORs bits 0 and 1, shifts the register right and inserts the
/// result at the top bit. The output is +1 when bit 0 is set, -1 otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LfsrNoise {
    state: u16,
    width: LfsrWidth,
}

impl LfsrNoise {
    pub fn new(width: LfsrWidth, seed: u16) -> Self {
        let mut state = seed & width.mask();
        if state == 0 {
            state = DEFAULT_LFSR_SEED;
        }
        LfsrNoise { state, width }
    }

    pub fn width(&self) -> LfsrWidth {
        self.width
    }

    pub fn state(&self) -> u16 {
        self.state
    }

    /// Advances the register by one step and returns the new output.
    #[inline(always)]
    pub fn step(&mut self) -> f32 {
        let feedback = (self.state ^ (self.state >> 1)) & 1;
        self.state = (self.state >> 1) | (feedback << (self.width.bits() - 1));
        self.value()
    }

    /// The current output without advancing.
    #[inline(always)]
    pub fn value(&self) -> f32 {
        if self.state & 1 == 1 {
            1.0
        } else {
            -1.0
        }
    }
}

/// Seedable xorshift white noise in [-1, 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhiteNoise {
    state: u32,
}

pub const DEFAULT_WHITE_SEED: u32 = 0x9E37_79B9;

impl WhiteNoise {
    pub fn new(seed: u32) -> Self {
        WhiteNoise {
            state: if seed == 0 { DEFAULT_WHITE_SEED } else { seed },
        }
    }

    #[inline(always)]
    pub fn step(&mut self) -> f32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        (x >> 8) as f32 / (1u32 << 23) as f32 - 1.0
    }
}

/// The noise generators an oscillator carries around.
#[derive(Debug, Clone)]
pub struct NoiseState {
    pub long: LfsrNoise,
    pub short: LfsrNoise,
    pub white: WhiteNoise,
}

impl NoiseState {
    pub fn new() -> Self {
        NoiseState {
            long: LfsrNoise::new(LfsrWidth::Long, DEFAULT_LFSR_SEED),
            short: LfsrNoise::new(LfsrWidth::Short, DEFAULT_LFSR_SEED),
            white: WhiteNoise::new(DEFAULT_WHITE_SEED),
        }
    }
}

impl Default for NoiseState {
    fn default() -> Self {
        Self::new()
    }
}
