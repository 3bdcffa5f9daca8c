/// Most-recent-N sample history.
///
/// Appending evicts the oldest sample. Storage is circular, but every read
/// goes through [`SampleRing::copy_chronological`], which yields the same
/// order a shift-left-and-insert buffer would hold.
#[derive(Clone, Debug)]
pub struct SampleRing {
    data: Vec<f32>,
    /// Next slot to write, which is also the oldest sample.
    head: usize,
}

impl SampleRing {
    pub fn new(len: usize) -> Self {
        assert!(len > 0, "sample ring must hold at least one sample");
        Self {
            data: vec![0.0; len],
            head: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn append(&mut self, sample: f32) {
        self.data[self.head] = sample;
        self.head += 1;
        if self.head == self.data.len() {
            self.head = 0;
        }
    }

    pub fn extend(&mut self, samples: &[f32]) {
        // Anything older than the last N samples would be evicted anyway
        let keep = samples.len().saturating_sub(self.data.len());
        for &sample in &samples[keep..] {
            self.append(sample);
        }
    }

    /// Copy the history into `out`, oldest sample first.
    pub fn copy_chronological(&self, out: &mut [f32]) {
        assert_eq!(out.len(), self.len());
        let tail = self.data.len() - self.head;
        out[..tail].copy_from_slice(&self.data[self.head..]);
        out[tail..].copy_from_slice(&self.data[..self.head]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(ring: &SampleRing) -> Vec<f32> {
        let mut out = vec![0.0; ring.len()];
        ring.copy_chronological(&mut out);
        out
    }

    #[test]
    fn starts_zero_filled() {
        let ring = SampleRing::new(4);
        assert_eq!(snapshot(&ring), vec![0.0; 4]);
    }

    #[test]
    fn append_shifts_left() {
        let mut ring = SampleRing::new(4);
        ring.append(1.0);
        assert_eq!(snapshot(&ring), vec![0.0, 0.0, 0.0, 1.0]);
        ring.append(2.0);
        assert_eq!(snapshot(&ring), vec![0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn evicts_oldest_after_wrap() {
        let mut ring = SampleRing::new(3);
        for s in 1..=5 {
            ring.append(s as f32);
        }
        assert_eq!(snapshot(&ring), vec![3.0, 4.0, 5.0]);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn extend_longer_than_capacity_keeps_tail() {
        let mut ring = SampleRing::new(4);
        ring.append(9.0);
        let samples: Vec<f32> = (0..10).map(|s| s as f32).collect();
        ring.extend(&samples);
        assert_eq!(snapshot(&ring), vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn extend_matches_repeated_append() {
        let mut a = SampleRing::new(5);
        let mut b = SampleRing::new(5);
        let samples = [0.5, -0.25, 1.0, 0.0, 0.75, -1.0, 0.125];
        a.extend(&samples);
        for &s in &samples {
            b.append(s);
        }
        assert_eq!(snapshot(&a), snapshot(&b));
    }
}
