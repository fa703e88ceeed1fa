//! Band-limited algorithmic waveforms.
//!
//! Discontinuities in the naive shapes are smoothed with a two-sample
//! polynomial residual (PolyBLEP), and corners with its integral (PolyBLAMP).
//! `dt` is the phase increment per sample.

/// Step residual for a jump of height 2 located at phase 0.
#[inline(always)]
pub fn poly_blep(t: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        let x = t / dt;
        x + x - x * x - 1.0
    } else if t > 1.0 - dt {
        let x = (t - 1.0) / dt;
        x * x + x + x + 1.0
    } else {
        0.0
    }
}

/// Ramp residual for a slope change located at phase 0, scaled so that
/// `4 * dt * poly_blamp` corrects a slope change of 8 per cycle.
#[inline(always)]
pub fn poly_blamp(t: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        let x = t / dt - 1.0;
        -x * x * x / 3.0
    } else if t > 1.0 - dt {
        let x = (t - 1.0) / dt + 1.0;
        x * x * x / 3.0
    } else {
        0.0
    }
}

#[inline(always)]
fn wrap(phase: f32) -> f32 {
    phase - phase.floor()
}

/// Rising sawtooth, -1 at phase 0.
#[inline(always)]
pub fn saw(t: f32, dt: f32) -> f32 {
    (2.0 * t - 1.0) - poly_blep(t, dt)
}

/// Pulse with a high section of `width` cycles.
#[inline(always)]
pub fn pulse(t: f32, dt: f32, width: f32) -> f32 {
    let naive = if t < width { 1.0 } else { -1.0 };
    naive + poly_blep(t, dt) - poly_blep(wrap(t - width + 1.0), dt)
}

/// Triangle in phase with a sine: 0 at phase 0 and +1 at a quarter cycle.
#[inline(always)]
pub fn triangle(t: f32, dt: f32) -> f32 {
    let mut y = 4.0 * t;
    if y >= 3.0 {
        y -= 4.0;
    } else if y > 1.0 {
        y = 2.0 - y;
    }

    y + 4.0 * dt * (poly_blamp(wrap(t + 0.25), dt) - poly_blamp(wrap(t + 0.75), dt))
}
