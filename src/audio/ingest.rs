use ringbuf::HeapProducer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Producer side of the analysis pipeline, handed to whatever delivers audio.
///
/// Safe to call from a real-time callback: pushing never blocks or
/// allocates. When the queue is full the sample is dropped and counted.
pub struct IngestAdapter {
    producer: HeapProducer<f32>,
    dropped: Arc<AtomicUsize>,
    channels: usize,
    channel: usize,
}

impl IngestAdapter {
    pub(crate) fn new(producer: HeapProducer<f32>, dropped: Arc<AtomicUsize>) -> Self {
        Self {
            producer,
            dropped,
            channels: 1,
            channel: 0,
        }
    }

    /// Interleaved layout of the blocks this adapter will receive.
    pub fn with_layout(mut self, channels: usize, channel: usize) -> Self {
        assert!(channels > 0, "audio blocks need at least one channel");
        assert!(
            channel < channels,
            "channel {} out of range for {} channels",
            channel,
            channels
        );
        self.channels = channels;
        self.channel = channel;
        self
    }

    /// Take the configured channel of each of the first `frame_count`
    /// frames in `samples`.
    pub fn on_audio_block(&mut self, samples: &[f32], frame_count: usize) {
        let mut lost = 0;
        for frame in samples.chunks_exact(self.channels).take(frame_count) {
            if self.producer.push(frame[self.channel]).is_err() {
                lost += 1;
            }
        }
        if lost > 0 {
            self.dropped.fetch_add(lost, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::HeapRb;

    fn adapter(capacity: usize) -> (IngestAdapter, ringbuf::HeapConsumer<f32>, Arc<AtomicUsize>) {
        let (producer, consumer) = HeapRb::<f32>::new(capacity).split();
        let dropped = Arc::new(AtomicUsize::new(0));
        (IngestAdapter::new(producer, Arc::clone(&dropped)), consumer, dropped)
    }

    fn drain(consumer: &mut ringbuf::HeapConsumer<f32>) -> Vec<f32> {
        let mut out = Vec::new();
        while let Some(s) = consumer.pop() {
            out.push(s);
        }
        out
    }

    #[test]
    fn mono_passes_through() {
        let (mut adapter, mut consumer, _) = adapter(16);
        adapter.on_audio_block(&[0.1, 0.2, 0.3], 3);
        assert_eq!(drain(&mut consumer), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn extracts_selected_channel() {
        let (adapter, mut consumer, _) = adapter(16);
        let mut adapter = adapter.with_layout(2, 1);
        // L R L R L R
        adapter.on_audio_block(&[1.0, -1.0, 2.0, -2.0, 3.0, -3.0], 3);
        assert_eq!(drain(&mut consumer), vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn frame_count_limits_and_is_clamped() {
        let (adapter, mut consumer, _) = adapter(16);
        let mut adapter = adapter.with_layout(2, 0);
        adapter.on_audio_block(&[1.0, 0.0, 2.0, 0.0, 3.0, 0.0], 2);
        assert_eq!(drain(&mut consumer), vec![1.0, 2.0]);

        adapter.on_audio_block(&[4.0, 0.0, 5.0], 10);
        assert_eq!(drain(&mut consumer), vec![4.0]);
    }

    #[test]
    fn overflow_is_counted() {
        let (mut adapter, mut consumer, dropped) = adapter(4);
        adapter.on_audio_block(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 6);
        assert_eq!(dropped.load(Ordering::Relaxed), 2);
        assert_eq!(drain(&mut consumer), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn rejects_missing_channel() {
        let (adapter, _consumer, _) = adapter(4);
        adapter.with_layout(2, 2);
    }
}
