/// Precomputed Hann window coefficients for a fixed signal length.
#[derive(Clone, Debug)]
pub struct HannWindow {
    coefficients: Vec<f32>,
}

impl HannWindow {
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "window size must be non-zero");
        if size == 1 {
            return Self {
                coefficients: vec![1.0],
            };
        }
        let coefficients = (0..size)
            .map(|i| {
                let t = i as f32 / (size - 1) as f32;
                0.5 - 0.5 * (2.0 * std::f32::consts::PI * t).cos()
            })
            .collect();
        Self { coefficients }
    }

    #[allow(dead_code)]
    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }

    pub fn apply(&self, signal: &mut [f32]) {
        assert_eq!(signal.len(), self.coefficients.len());
        for (s, w) in signal.iter_mut().zip(&self.coefficients) {
            *s *= w;
        }
    }
}
