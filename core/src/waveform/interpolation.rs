/// The interpolation kernel used when reading tables and samples at
/// fractional positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Interpolator {
    /// Reads the sample at the integer part of the position.
    Nearest,
    /// Straight line between the two surrounding samples.
    #[default]
    Linear,
    /// 4-point Catmull-Rom spline through one sample before and two after.
    Cubic,
}

impl Interpolator {
    pub const ALL: [Interpolator; 3] = [
        Interpolator::Nearest,
        Interpolator::Linear,
        Interpolator::Cubic,
    ];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

#[inline(always)]
pub fn lerp(a: f32, b: f32, factor: f32) -> f32 {
    a + (b - a) * factor
}

#[inline(always)]
pub fn cubic(y0: f32, y1: f32, y2: f32, y3: f32, t: f32) -> f32 {
    let a = -0.5 * y0 + 1.5 * y1 - 1.5 * y2 + 0.5 * y3;
    let b = y0 - 2.5 * y1 + 2.0 * y2 - 0.5 * y3;
    let c = -0.5 * y0 + 0.5 * y2;
    ((a * t + b) * t + c) * t + y1
}

/// Interpolates around `index + frac`, fetching neighbours through `fetch`.
#[inline(always)]
pub fn interpolate(
    interpolator: Interpolator,
    index: isize,
    frac: f32,
    fetch: impl Fn(isize) -> f32,
) -> f32 {
    match interpolator {
        Interpolator::Nearest => fetch(index),
        Interpolator::Linear => lerp(fetch(index), fetch(index + 1), frac),
        Interpolator::Cubic => cubic(
            fetch(index - 1),
            fetch(index),
            fetch(index + 1),
            fetch(index + 2),
            frac,
        ),
    }
}

/// Reads a periodic table. `position` is in table samples and wraps.
#[inline(always)]
pub fn read_periodic(table: &[f32], position: f32, interpolator: Interpolator) -> f32 {
    let len = table.len();
    if len == 0 {
        return 0.0;
    }

    let floor = position.floor();
    let frac = position - floor;
    let index = floor as isize;
    interpolate(interpolator, index, frac, |i| {
        table[i.rem_euclid(len as isize) as usize]
    })
}

/// Reads a one-shot buffer. Neighbours outside the buffer are clamped to its edges.
#[inline(always)]
pub fn read_clamped(data: &[f32], position: f64, interpolator: Interpolator) -> f32 {
    let len = data.len();
    if len == 0 {
        return 0.0;
    }

    let floor = position.floor();
    let frac = (position - floor) as f32;
    let index = floor as isize;
    let last = len as isize - 1;
    interpolate(interpolator, index, frac, |i| data[i.clamp(0, last) as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cubic_passes_through_points() {
        assert_eq!(cubic(0.0, 1.0, 2.0, 3.0, 0.0), 1.0);
        assert!((cubic(0.0, 1.0, 2.0, 3.0, 1.0) - 2.0).abs() < 1e-6);
        // Linear data stays linear
        assert!((cubic(0.0, 1.0, 2.0, 3.0, 0.5) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_read_periodic_wraps() {
        let table = [0.0, 1.0, 0.0, -1.0];
        assert_eq!(read_periodic(&table, 1.0, Interpolator::Linear), 1.0);
        assert_eq!(read_periodic(&table, 3.5, Interpolator::Linear), -0.5);
        assert_eq!(read_periodic(&table, 5.0, Interpolator::Nearest), 1.0);
        assert_eq!(read_periodic(&table, -1.0, Interpolator::Nearest), -1.0);
        // Cubic at the start reads the last entry as its left neighbour
        let value = read_periodic(&table, 0.0, Interpolator::Cubic);
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_read_clamped() {
        let data = [1.0, 2.0, 3.0];
        assert_eq!(read_clamped(&data, 0.5, Interpolator::Linear), 1.5);
        assert_eq!(read_clamped(&data, 2.5, Interpolator::Linear), 3.0);
        assert_eq!(read_clamped(&data, 1.7, Interpolator::Nearest), 2.0);
        assert!((read_clamped(&data, 0.5, Interpolator::Cubic) - 1.4375).abs() < 1e-6);
        assert_eq!(read_clamped(&[], 0.0, Interpolator::Cubic), 0.0);
    }
}
