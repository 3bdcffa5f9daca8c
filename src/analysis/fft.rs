use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::Deserialize;
use std::f32::consts::PI;
use std::sync::Arc;

/// Which transform implementation fills the spectrum buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FftBackend {
    /// Recursive radix-2 decimation-in-time
    #[default]
    Recursive,
    /// rustfft planner
    #[value(name = "rustfft")]
    RustFft,
}

enum Kind {
    Recursive {
        /// exp(-2πi·j/N) for j in [0, N/2)
        twiddles: Vec<Complex<f32>>,
    },
    RustFft {
        plan: Arc<dyn Fft<f32>>,
        scratch: Vec<Complex<f32>>,
    },
}

/// Forward FFT of a real signal of fixed power-of-two length.
pub struct FftEngine {
    size: usize,
    kind: Kind,
}

impl FftEngine {
    pub fn new(size: usize, backend: FftBackend) -> Self {
        assert!(
            size.is_power_of_two(),
            "FFT size must be a power of two, got {}",
            size
        );

        let kind = match backend {
            FftBackend::Recursive => Kind::Recursive {
                twiddles: (0..size / 2)
                    .map(|j| Complex::from_polar(1.0, -2.0 * PI * j as f32 / size as f32))
                    .collect(),
            },
            FftBackend::RustFft => {
                let mut planner = FftPlanner::<f32>::new();
                let plan = planner.plan_fft_forward(size);
                let scratch = vec![Complex::new(0.0, 0.0); plan.get_inplace_scratch_len()];
                Kind::RustFft { plan, scratch }
            }
        };

        Self { size, kind }
    }

    /// Transform `input` into `out`, both exactly the planned length.
    pub fn process(&mut self, input: &[f32], out: &mut [Complex<f32>]) {
        assert_eq!(input.len(), self.size);
        assert_eq!(out.len(), self.size);

        match &mut self.kind {
            Kind::Recursive { twiddles } => transform(input, 1, out, twiddles, self.size),
            Kind::RustFft { plan, scratch } => {
                for (o, &s) in out.iter_mut().zip(input) {
                    *o = Complex::new(s, 0.0);
                }
                plan.process_with_scratch(out, scratch);
            }
        }
    }
}

/// Cooley–Tukey over every `stride`-th sample of `input`; `out.len()` is the
/// sub-transform length.
fn transform(
    input: &[f32],
    stride: usize,
    out: &mut [Complex<f32>],
    twiddles: &[Complex<f32>],
    size: usize,
) {
    let n = out.len();
    if n == 1 {
        out[0] = Complex::new(input[0], 0.0);
        return;
    }

    let half = n / 2;
    {
        let (even, odd) = out.split_at_mut(half);
        transform(input, stride * 2, even, twiddles, size);
        transform(&input[stride..], stride * 2, odd, twiddles, size);
    }

    let step = size / n;
    for k in 0..half {
        let e = out[k];
        let v = twiddles[k * step] * out[k + half];
        out[k] = e + v;
        out[k + half] = e - v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(backend: FftBackend, input: &[f32]) -> Vec<Complex<f32>> {
        let mut engine = FftEngine::new(input.len(), backend);
        let mut out = vec![Complex::new(0.0, 0.0); input.len()];
        engine.process(input, &mut out);
        out
    }

    fn peak_bin(spectrum: &[Complex<f32>]) -> usize {
        spectrum[..spectrum.len() / 2]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm_sqr().partial_cmp(&b.1.norm_sqr()).unwrap())
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn single_sample_is_promoted() {
        let out = run(FftBackend::Recursive, &[0.25]);
        assert_eq!(out, vec![Complex::new(0.25, 0.0)]);
    }

    #[test]
    fn zero_input_gives_zero_output() {
        let out = run(FftBackend::Recursive, &vec![0.0; 256]);
        assert!(out.iter().all(|z| z.norm_sqr() == 0.0));
    }

    #[test]
    fn impulse_is_flat() {
        let mut input = vec![0.0; 16];
        input[0] = 1.0;
        let out = run(FftBackend::Recursive, &input);
        for z in out {
            assert!((z.re - 1.0).abs() < 1e-6);
            assert!(z.im.abs() < 1e-6);
        }
    }

    #[test]
    fn sinusoid_peaks_at_expected_bin() {
        let n = 4096;
        let sample_rate = 44100.0;
        let f0 = 1000.0;
        let input: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * f0 * i as f32 / sample_rate).sin())
            .collect();

        let out = run(FftBackend::Recursive, &input);
        let expected = (f0 * n as f32 / sample_rate).round() as usize;
        let bin = peak_bin(&out);
        assert!(
            bin.abs_diff(expected) <= 1,
            "peak at bin {}, expected {}",
            bin,
            expected
        );
    }

    #[test]
    fn recursive_matches_rustfft() {
        let n = 1024;
        let input: Vec<f32> = (0..n)
            .map(|i| {
                let t = i as f32;
                (t * 0.031).sin() + 0.5 * (t * 0.47).cos() - 0.25 * (t * 1.9).sin()
            })
            .collect();

        let ours = run(FftBackend::Recursive, &input);
        let reference = run(FftBackend::RustFft, &input);
        for (k, (a, b)) in ours.iter().zip(&reference).enumerate() {
            assert!((a - b).norm() < 1e-2, "bin {} differs: {} vs {}", k, a, b);
        }
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn rejects_non_power_of_two() {
        FftEngine::new(1000, FftBackend::Recursive);
    }

    #[test]
    fn backend_parses_from_toml_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            backend: FftBackend,
        }
        let w: Wrapper = toml::from_str("backend = \"rustfft\"").unwrap();
        assert_eq!(w.backend, FftBackend::RustFft);
        let w: Wrapper = toml::from_str("backend = \"recursive\"").unwrap();
        assert_eq!(w.backend, FftBackend::Recursive);
    }
}
