use std::sync::Arc;

use crate::waveform::interpolation::{interpolate, lerp, Interpolator};

use super::{LoopMode, LoopRegion, SampleBuffer};

/// Plays a shared [`SampleBuffer`] at fractional positions.
#[derive(Debug, Clone)]
pub struct SampleReader {
    buffer: Arc<SampleBuffer>,
    position: f64,
    released: bool,
    // Released inside the seam crossfade; looping continues until the next wrap
    draining: bool,
}

impl SampleReader {
    pub fn new(buffer: Arc<SampleBuffer>) -> Self {
        SampleReader {
            buffer,
            position: 0.0,
            released: false,
            draining: false,
        }
    }

    pub fn buffer(&self) -> &Arc<SampleBuffer> {
        &self.buffer
    }

    pub fn into_buffer(self) -> Arc<SampleBuffer> {
        self.buffer
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn set_position(&mut self, position: f64) {
        self.position = position.max(0.0);
    }

    /// Lets a sustain loop play through to the end of the sample.
    ///
    /// A release inside the seam crossfade finishes the fade first and leaves
    /// the loop at the wrap, where the output has already become the
    /// material before the loop start.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        if let Some(region) = self.active_loop() {
            let fade_start = (region.end - region.crossfade) as f64;
            self.draining = region.crossfade > 0 && self.position >= fade_start;
        }
        self.released = true;
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// The loop region, if it is currently being looped.
    fn active_loop(&self) -> Option<LoopRegion> {
        match self.buffer.loop_mode() {
            LoopMode::LoopContinuous => self.buffer.loop_region(),
            LoopMode::LoopSustain if !self.released || self.draining => self.buffer.loop_region(),
            _ => None,
        }
    }

    /// Whether a non-looping read position has passed the last frame.
    pub fn is_past_end(&self, position: f64) -> bool {
        self.active_loop().is_none() && position >= self.buffer.len() as f64
    }

    fn wrap_position(position: f64, region: &LoopRegion) -> f64 {
        if position >= region.end as f64 {
            let len = region.len() as f64;
            region.start as f64 + (position - region.start as f64) % len
        } else {
            position
        }
    }

    fn read_raw(&self, position: f64, interpolator: Interpolator, region: Option<&LoopRegion>) -> (f32, f32) {
        let floor = position.floor();
        let frac = (position - floor) as f32;
        let index = floor as isize;
        let last = self.buffer.len() as isize - 1;

        let map_index = |i: isize| -> usize {
            let i = match region {
                Some(r) if i >= r.end as isize => i - r.len() as isize,
                _ => i,
            };
            i.clamp(0, last) as usize
        };

        let left = self.buffer.left();
        let l = interpolate(interpolator, index, frac, |i| left[map_index(i)]);
        if self.buffer.is_mono() {
            (l, l)
        } else {
            let right = self.buffer.right();
            let r = interpolate(interpolator, index, frac, |i| right[map_index(i)]);
            (l, r)
        }
    }

    /// Reads both channels at `position`, applying loop wrapping and the
    /// loop seam crossfade while a loop is active.
    pub fn read(&self, position: f64, interpolator: Interpolator) -> (f32, f32) {
        let position = position.max(0.0);
        let Some(region) = self.active_loop() else {
            return self.read_raw(position, interpolator, None);
        };

        let position = Self::wrap_position(position, &region);
        let value = self.read_raw(position, interpolator, Some(&region));

        let fade_start = (region.end - region.crossfade) as f64;
        if region.crossfade == 0 || position < fade_start {
            return value;
        }

        // Blend towards the material just before the loop start, which is
        // what plays after the wrap
        let weight = ((position - fade_start) / region.crossfade as f64) as f32;
        let aligned = self.read_raw(position - region.len() as f64, interpolator, Some(&region));
        (
            lerp(value.0, aligned.0, weight),
            lerp(value.1, aligned.1, weight),
        )
    }

    /// Reads at the current position and moves on by `rate` frames.
    ///
    /// Returns `None` once a non-looping sample has played past its end.
    #[inline(always)]
    pub fn next(&mut self, rate: f64, interpolator: Interpolator) -> Option<(f32, f32)> {
        if self.is_past_end(self.position) {
            return None;
        }

        let value = self.read(self.position, interpolator);

        let rate = if rate.is_finite() { rate.max(0.0) } else { 0.0 };
        self.position += rate;
        if let Some(region) = self.active_loop() {
            let wrapped = Self::wrap_position(self.position, &region);
            if wrapped != self.position {
                self.draining = false;
            }
            self.position = wrapped;
        }

        Some(value)
    }
}
