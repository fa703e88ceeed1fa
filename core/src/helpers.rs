mod frequencies;
pub use frequencies::*;

mod pitch;
pub use pitch::*;

use crate::ChannelCount;

/// Writes planar stereo buffers into an interleaved output.
///
/// For a mono output both sides are averaged.
pub fn interleave_into(left: &[f32], right: &[f32], out: &mut [f32], channels: ChannelCount) {
    match channels {
        ChannelCount::Mono => {
            for ((o, l), r) in out.iter_mut().zip(left).zip(right) {
                *o = (l + r) * 0.5;
            }
        }
        ChannelCount::Stereo => {
            for ((frame, l), r) in out.chunks_exact_mut(2).zip(left).zip(right) {
                frame[0] = *l;
                frame[1] = *r;
            }
        }
    }
}

/// Replaces NaN and infinite values with zero.
#[inline(always)]
pub fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave_stereo() {
        let left = [1.0, 2.0, 3.0];
        let right = [-1.0, -2.0, -3.0];
        let mut out = [0.0; 6];
        interleave_into(&left, &right, &mut out, ChannelCount::Stereo);
        assert_eq!(out, [1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
    }

    #[test]
    fn test_interleave_mono() {
        let left = [1.0, 0.5];
        let right = [0.0, 0.5];
        let mut out = [0.0; 2];
        interleave_into(&left, &right, &mut out, ChannelCount::Mono);
        assert_eq!(out, [0.5, 0.5]);
    }
}
