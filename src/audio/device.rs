//! Hardware audio through cpal: microphone capture, and audible playback of a
//! decoded track whose output callback feeds the pipeline.

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::decode::AudioData;
use super::ingest::IngestAdapter;
use super::SampleSource;

/// Keeps a running cpal stream alive.
pub struct DeviceStream {
    _stream: cpal::Stream,
    finished: Arc<AtomicBool>,
}

impl SampleSource for DeviceStream {
    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }

    fn stop(self: Box<Self>) {
        if let Err(err) = self._stream.pause() {
            log::debug!("Pausing audio stream failed: {}", err);
        }
    }
}

/// Capture the default input device. Returns the stream and its sample rate.
pub fn capture(adapter: IngestAdapter, channel: usize) -> Result<(DeviceStream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .context("No audio input device found")?;

    let supported = device
        .default_input_config()
        .context("Failed to get input config")?;
    let supported = if supported.sample_format() == cpal::SampleFormat::F32 {
        supported
    } else {
        device
            .supported_input_configs()
            .context("Failed to list input configs")?
            .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
            .map(|c| c.with_max_sample_rate())
            .next()
            .context("Input device offers no f32 sample format")?
    };

    let channels = supported.channels() as usize;
    let sample_rate = supported.sample_rate().0;
    if channel >= channels {
        anyhow::bail!("Channel {} requested but input has {} channels", channel, channels);
    }

    log::info!(
        "Capturing from {} @ {}Hz, {} channels",
        device.name().unwrap_or_else(|_| "Unknown".to_string()),
        sample_rate,
        channels
    );

    let mut adapter = adapter.with_layout(channels, channel);
    let stream = device
        .build_input_stream(
            &supported.into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                adapter.on_audio_block(data, data.len() / channels);
            },
            |err| log::error!("Audio input error: {}", err),
            None,
        )
        .context("Failed to build input stream")?;

    stream.play().context("Failed to start input stream")?;

    Ok((
        DeviceStream {
            _stream: stream,
            finished: Arc::new(AtomicBool::new(false)),
        },
        sample_rate,
    ))
}

/// Play `audio` on the default output device, feeding every delivered block
/// to `adapter` as it goes out.
pub fn play(audio: Arc<AudioData>, adapter: IngestAdapter, channel: usize) -> Result<DeviceStream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("No audio output device found")?;

    let channels = audio.channels;
    let config = cpal::StreamConfig {
        channels: channels as u16,
        sample_rate: cpal::SampleRate(audio.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    log::info!(
        "Playing through {} @ {}Hz",
        device.name().unwrap_or_else(|_| "Unknown".to_string()),
        audio.sample_rate
    );

    let finished = Arc::new(AtomicBool::new(false));
    let finished_flag = Arc::clone(&finished);
    let mut adapter = adapter.with_layout(channels, channel);
    let mut position = 0usize;

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let remaining = audio.samples.len() - position;
                let n = data.len().min(remaining);
                data[..n].copy_from_slice(&audio.samples[position..position + n]);
                data[n..].fill(0.0);
                position += n;

                adapter.on_audio_block(&data[..n], n / channels);
                if position >= audio.samples.len() {
                    finished_flag.store(true, Ordering::Relaxed);
                }
            },
            |err| log::error!("Audio output error: {}", err),
            None,
        )
        .with_context(|| {
            format!(
                "Output device does not accept {} channels @ {}Hz",
                channels, audio.sample_rate
            )
        })?;

    stream.play().context("Failed to start output stream")?;

    Ok(DeviceStream {
        _stream: stream,
        finished,
    })
}
