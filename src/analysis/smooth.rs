/// Two cascaded one-pole low-pass filters over the bucket values.
///
/// `smooth` chases the normalized spectrum, `smear` chases `smooth` more
/// slowly and leaves a trailing afterglow.
#[derive(Clone, Debug)]
pub struct Smoother {
    smooth: Vec<f32>,
    smear: Vec<f32>,
    smooth_rate: f32,
    smear_rate: f32,
}

impl Smoother {
    pub fn new(capacity: usize, smooth_rate: f32, smear_rate: f32) -> Self {
        Self {
            smooth: vec![0.0; capacity],
            smear: vec![0.0; capacity],
            smooth_rate,
            smear_rate,
        }
    }

    /// Advance both tracks by `dt` seconds toward `target`. Only the first
    /// `target.len()` entries are touched.
    pub fn update(&mut self, target: &[f32], dt: f32) {
        assert!(target.len() <= self.smooth.len());

        // A stalled frame snaps to the target rather than overshooting it
        let a = (self.smooth_rate * dt).min(1.0);
        let b = (self.smear_rate * dt).min(1.0);

        let tracks = self.smooth.iter_mut().zip(self.smear.iter_mut());
        for (&t, (smooth, smear)) in target.iter().zip(tracks) {
            *smooth += (t - *smooth) * a;
            *smear += (*smooth - *smear) * b;
        }
    }

    pub fn smooth(&self) -> &[f32] {
        &self.smooth
    }

    pub fn smear(&self) -> &[f32] {
        &self.smear
    }
}
