//! Streams a decoded track into the pipeline as if an audio device were
//! delivering it, one block per simulated callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::decode::AudioData;
use super::ingest::IngestAdapter;
use super::SampleSource;

/// Read position over interleaved audio, advanced a block at a time.
pub struct BlockCursor {
    audio: Arc<AudioData>,
    frame: usize,
}

impl BlockCursor {
    pub fn new(audio: Arc<AudioData>) -> Self {
        Self { audio, frame: 0 }
    }

    pub fn is_done(&self) -> bool {
        self.frame >= self.audio.frames()
    }

    /// Hand up to `frames` frames to `adapter`, returning how many were sent.
    pub fn feed(&mut self, adapter: &mut IngestAdapter, frames: usize) -> usize {
        let channels = self.audio.channels;
        let count = frames.min(self.audio.frames() - self.frame.min(self.audio.frames()));
        if count == 0 {
            return 0;
        }
        let start = self.frame * channels;
        let end = start + count * channels;
        adapter.on_audio_block(&self.audio.samples[start..end], count);
        self.frame += count;
        count
    }
}

/// Real-time paced feeder thread.
pub struct FileFeeder {
    handle: Option<thread::JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl FileFeeder {
    pub fn spawn(audio: Arc<AudioData>, mut adapter: IngestAdapter, block_frames: usize) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let finished_flag = Arc::clone(&finished);

        let block_time = Duration::from_secs_f64(block_frames as f64 / audio.sample_rate as f64);

        let handle = thread::spawn(move || {
            let mut cursor = BlockCursor::new(audio);
            let start = Instant::now();
            let mut blocks: u32 = 0;

            while !stop_flag.load(Ordering::Relaxed) && !cursor.is_done() {
                // Schedule against the start time so sleeps don't accumulate drift
                let deadline = start + block_time * blocks;
                let now = Instant::now();
                if deadline > now {
                    thread::sleep(deadline - now);
                }
                cursor.feed(&mut adapter, block_frames);
                blocks += 1;
            }

            finished_flag.store(true, Ordering::Relaxed);
            log::debug!("File feeder done after {} blocks", blocks);
        });

        Self {
            handle: Some(handle),
            stop,
            finished,
        }
    }
}

impl SampleSource for FileFeeder {
    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }

    fn stop(mut self: Box<Self>) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("File feeder thread panicked");
            }
        }
    }
}
