use ringbuf::{HeapConsumer, HeapRb};
use rustfft::num_complex::Complex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::bucket::{self, LogBuckets};
use super::fft::FftEngine;
use super::ring::SampleRing;
use super::smooth::Smoother;
use super::window::HannWindow;
use crate::audio::ingest::IngestAdapter;
use crate::config::AnalysisConfig;

/// Smoothed bucket curves for one frame, valid until the next `tick`.
#[derive(Clone, Copy, Debug)]
pub struct SpectrumFrame<'a> {
    pub smooth: &'a [f32],
    pub smear: &'a [f32],
}

impl SpectrumFrame<'_> {
    pub fn count(&self) -> usize {
        self.smooth.len()
    }
}

/// Sample history in, log-spaced smoothed spectrum out, once per frame.
///
/// Samples reach the pipeline through the [`IngestAdapter`] returned by
/// [`SpectrumPipeline::new`] over a lock-free single-producer queue. Each
/// `tick` drains whatever arrived since the previous one, so the history is
/// at most one frame stale.
pub struct SpectrumPipeline {
    consumer: HeapConsumer<f32>,
    dropped: Arc<AtomicUsize>,
    reported_drops: usize,
    drain: Vec<f32>,

    ring: SampleRing,
    window: HannWindow,
    windowed: Vec<f32>,
    fft: FftEngine,
    spectrum: Vec<Complex<f32>>,
    buckets: LogBuckets,
    magnitudes: Vec<f32>,
    smoother: Smoother,
}

impl SpectrumPipeline {
    /// Panics if the configuration breaks a size or step precondition; run
    /// `AnalysisConfig::validate` first on user-supplied values.
    pub fn new(config: &AnalysisConfig) -> (Self, IngestAdapter) {
        let n = config.fft_size;
        let fft = FftEngine::new(n, config.fft_backend);
        let buckets = LogBuckets::new(n, config.bucket_step);
        let m = buckets.len();

        let (producer, consumer) = HeapRb::<f32>::new(config.queue_len()).split();
        let dropped = Arc::new(AtomicUsize::new(0));
        let adapter = IngestAdapter::new(producer, Arc::clone(&dropped));

        log::debug!(
            "Spectrum pipeline: fft_size={}, backend={:?}, buckets={}, queue={}",
            n,
            config.fft_backend,
            m,
            config.queue_len()
        );

        let pipeline = Self {
            consumer,
            dropped,
            reported_drops: 0,
            drain: vec![0.0; n],
            ring: SampleRing::new(n),
            window: HannWindow::new(n),
            windowed: vec![0.0; n],
            fft,
            spectrum: vec![Complex::new(0.0, 0.0); n],
            buckets,
            magnitudes: vec![0.0; m],
            smoother: Smoother::new(m, config.smooth_rate, config.smear_rate),
        };

        (pipeline, adapter)
    }

    /// Advance one frame of `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> SpectrumFrame<'_> {
        debug_assert!(dt.is_finite() && dt > 0.0, "frame dt must be positive, got {}", dt);

        self.drain_queue();

        self.ring.copy_chronological(&mut self.windowed);
        self.window.apply(&mut self.windowed);
        self.fft.process(&self.windowed, &mut self.spectrum);

        let max_amp = self.buckets.bucketize(&self.spectrum, &mut self.magnitudes);
        bucket::normalize(&mut self.magnitudes, max_amp);
        self.smoother.update(&self.magnitudes, dt);

        let m = self.buckets.len();
        SpectrumFrame {
            smooth: &self.smoother.smooth()[..m],
            smear: &self.smoother.smear()[..m],
        }
    }

    fn drain_queue(&mut self) {
        // Only what is queued now; a busy producer must not keep us here
        let mut pending = self.consumer.len();
        while pending > 0 {
            let take = pending.min(self.drain.len());
            let got = self.consumer.pop_slice(&mut self.drain[..take]);
            if got == 0 {
                break;
            }
            self.ring.extend(&self.drain[..got]);
            pending -= got;
        }

        let dropped = self.dropped.load(Ordering::Relaxed);
        if dropped > self.reported_drops {
            if self.reported_drops == 0 {
                log::warn!("Ingest queue overflowed, audio is arriving faster than frames drain it");
            }
            log::debug!("{} samples dropped so far", dropped);
            self.reported_drops = dropped;
        }
    }

    /// Bucket count M, constant for the pipeline's lifetime.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Normalized bucket values of the last frame, before smoothing.
    #[allow(dead_code)]
    pub fn normalized(&self) -> &[f32] {
        &self.magnitudes
    }

    /// Raw FFT output of the last frame.
    #[allow(dead_code)]
    pub fn spectrum(&self) -> &[Complex<f32>] {
        &self.spectrum
    }

    pub fn dropped_samples(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn shutdown(self) {
        log::debug!(
            "Spectrum pipeline shut down ({} samples dropped)",
            self.dropped_samples()
        );
    }
}
