//! Per-frame spectral analysis: sample history, Hann window, FFT, log-spaced
//! buckets, normalization and temporal smoothing.

pub mod bucket;
pub mod fft;
pub mod pipeline;
pub mod ring;
pub mod smooth;
pub mod window;
