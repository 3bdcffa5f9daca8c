//! Log-frequency bucketing and normalization of an FFT spectrum.
//!
//! Buckets start at bin 1 and grow geometrically by `step`, so low
//! frequencies get one bin per bucket and high frequencies are merged, roughly
//! following how pitch is perceived.

use rustfft::num_complex::Complex;
use std::ops::Range;

/// Natural-log power of one bin. Zero power is floored to the smallest
/// positive normal `f32` so silence stays finite.
pub fn magnitude(z: Complex<f32>) -> f32 {
    z.norm_sqr().max(f32::MIN_POSITIVE).ln()
}

/// Fixed geometric partition of bins `[1, fft_size / 2)`.
#[derive(Clone, Debug)]
pub struct LogBuckets {
    ranges: Vec<Range<usize>>,
}

impl LogBuckets {
    pub fn new(fft_size: usize, step: f32) -> Self {
        assert!(step > 1.0, "bucket step must be greater than 1, got {}", step);

        let half = fft_size / 2;
        let mut ranges = Vec::new();
        let mut f = 1.0f32;
        while (f as usize) < half {
            let f1 = (f * step).ceil();
            let start = f as usize;
            let end = (f1 as usize).min(half);
            ranges.push(start..end.max(start));
            f = f1;
        }

        Self { ranges }
    }

    /// Number of buckets, M.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[allow(dead_code)]
    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// Peak log-magnitude per bucket into `out`, returning the running
    /// maximum seeded at 1.0.
    pub fn bucketize(&self, spectrum: &[Complex<f32>], out: &mut [f32]) -> f32 {
        assert!(out.len() >= self.ranges.len());

        let mut max_amp = 1.0f32;
        for (range, slot) in self.ranges.iter().zip(out.iter_mut()) {
            let peak = spectrum[range.clone()]
                .iter()
                .map(|&z| magnitude(z))
                .fold(0.0f32, f32::max);
            max_amp = max_amp.max(peak);
            *slot = peak;
        }
        max_amp
    }
}

pub fn normalize(values: &mut [f32], max_amp: f32) {
    for v in values {
        *v /= max_amp;
    }
}
