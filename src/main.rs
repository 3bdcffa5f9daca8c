mod analysis;
mod audio;
mod cli;
mod config;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufWriter, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use analysis::pipeline::SpectrumPipeline;
use audio::decode::{decode_audio, AudioData};
use audio::feeder::BlockCursor;
#[cfg(not(feature = "live"))]
use audio::feeder::FileFeeder;
use audio::ingest::IngestAdapter;
use audio::SampleSource;
use cli::Cli;
use config::Config;
use render::bars::BarsRenderer;
use render::jsonl::JsonLinesRenderer;
use render::{Renderer, RendererKind};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    if let Some(seconds) = cli.duration {
        if !(seconds.is_finite() && seconds > 0.0) {
            anyhow::bail!("--duration must be a positive number of seconds");
        }
    }

    let mut config = match config::discover(cli.config.clone()) {
        Some(path) => match config::load_config(&path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None => {
                log::warn!("Failed to load config from {}", path.display());
                Config::default()
            }
        },
        None => Config::default(),
    };
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    log::info!(
        "FFT size {} ({:?}), bucket step {}, smooth {}/s, smear {}/s, {} fps",
        config.analysis.fft_size,
        config.analysis.fft_backend,
        config.analysis.bucket_step,
        config.analysis.smooth_rate,
        config.analysis.smear_rate,
        config.playback.fps
    );

    let mut renderer = open_renderer(&cli, &config)?;

    if cli.offline {
        run_offline(&cli, &mut config, renderer.as_mut())?;
    } else {
        run_realtime(&cli, &config, renderer.as_mut())?;
    }

    renderer.finish()?;
    Ok(())
}

fn open_renderer(cli: &Cli, config: &Config) -> Result<Box<dyn Renderer>> {
    let out: Box<dyn Write> = match cli.output {
        Some(ref path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            log::info!("Output: {}", path.display());
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(std::io::stdout())),
    };

    Ok(match cli.renderer_kind() {
        RendererKind::Bars => Box::new(BarsRenderer::new(out, &config.display)),
        RendererKind::Jsonl => Box::new(JsonLinesRenderer::new(out)),
    })
}

fn load_input(cli: &Cli, channel: usize) -> Result<Arc<AudioData>> {
    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    log::info!("Input: {}", input.display());

    let audio = decode_audio(input)?;
    if channel >= audio.channels {
        anyhow::bail!(
            "Channel {} requested but {} has {} channels",
            channel,
            input.display(),
            audio.channels
        );
    }
    Ok(Arc::new(audio))
}

/// Deterministic pass: every frame consumes exactly its share of the track
/// and advances by 1/fps.
fn run_offline(cli: &Cli, config: &mut Config, renderer: &mut dyn Renderer) -> Result<()> {
    let channel = config.analysis.channel;
    let audio = load_input(cli, channel)?;
    let fps = config.playback.fps;
    let sample_rate = audio.sample_rate;

    // One frame's worth of audio must fit the queue between ticks
    let per_frame = (sample_rate as usize).div_ceil(fps as usize);
    if config.analysis.queue_len() <= per_frame {
        config.analysis.queue_capacity = per_frame + 1;
    }

    let (mut pipeline, adapter) = SpectrumPipeline::new(&config.analysis);
    log::info!("{} frequency buckets", pipeline.bucket_count());
    let mut adapter = adapter.with_layout(audio.channels, channel);

    let mut seconds = audio.duration();
    if let Some(limit) = cli.duration {
        seconds = seconds.min(limit);
    }
    let total_frames = (seconds * fps as f32).ceil() as u64;
    let dt = 1.0 / fps as f32;
    log::info!("Offline analysis: {} frames, {:.1}s", total_frames, seconds);

    let pb = ProgressBar::new(total_frames);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );

    let mut cursor = BlockCursor::new(Arc::clone(&audio));
    let frame_edge = |i: u64| (i as u128 * sample_rate as u128 / fps as u128) as usize;

    for index in 0..total_frames {
        cursor.feed(&mut adapter, frame_edge(index + 1) - frame_edge(index));
        let frame = pipeline.tick(dt);
        renderer.draw(index, index as f32 * dt, &frame)?;
        pb.set_position(index + 1);
    }

    pb.finish_with_message("Analysis complete");
    pipeline.shutdown();
    Ok(())
}

fn start_source(cli: &Cli, config: &Config, adapter: IngestAdapter) -> Result<Box<dyn SampleSource>> {
    if cli.live {
        return start_capture(config, adapter);
    }

    let audio = load_input(cli, config.analysis.channel)?;
    log::info!(
        "Bin width {:.2}Hz",
        audio.sample_rate as f32 / config.analysis.fft_size as f32
    );
    start_playback(config, audio, adapter)
}

#[cfg(feature = "live")]
fn start_capture(config: &Config, adapter: IngestAdapter) -> Result<Box<dyn SampleSource>> {
    let (stream, sample_rate) = audio::device::capture(adapter, config.analysis.channel)?;
    log::info!(
        "Bin width {:.2}Hz",
        sample_rate as f32 / config.analysis.fft_size as f32
    );
    Ok(Box::new(stream))
}

#[cfg(not(feature = "live"))]
fn start_capture(_config: &Config, _adapter: IngestAdapter) -> Result<Box<dyn SampleSource>> {
    anyhow::bail!(
        "Live capture requires the 'live' feature. \
         Rebuild with: cargo build --features live"
    )
}

#[cfg(feature = "live")]
fn start_playback(
    config: &Config,
    audio: Arc<AudioData>,
    adapter: IngestAdapter,
) -> Result<Box<dyn SampleSource>> {
    let stream = audio::device::play(audio, adapter, config.analysis.channel)?;
    Ok(Box::new(stream))
}

#[cfg(not(feature = "live"))]
fn start_playback(
    config: &Config,
    audio: Arc<AudioData>,
    adapter: IngestAdapter,
) -> Result<Box<dyn SampleSource>> {
    log::info!("Built without audio device support, streaming silently");
    let adapter = adapter.with_layout(audio.channels, config.analysis.channel);
    Ok(Box::new(FileFeeder::spawn(
        audio,
        adapter,
        config.playback.block_frames,
    )))
}

/// Wall-clock loop: one tick per display frame with the measured dt.
fn run_realtime(cli: &Cli, config: &Config, renderer: &mut dyn Renderer) -> Result<()> {
    let (mut pipeline, adapter) = SpectrumPipeline::new(&config.analysis);
    log::info!("{} frequency buckets", pipeline.bucket_count());
    let source = start_source(cli, config, adapter)?;

    let frame_time = Duration::from_secs_f64(1.0 / config.playback.fps as f64);
    let limit = cli.duration.map(Duration::from_secs_f32);
    let start = Instant::now();
    let mut last = start;
    let mut index: u64 = 0;

    while !source.is_finished() {
        let elapsed = start.elapsed();
        if limit.is_some_and(|l| elapsed >= l) {
            break;
        }

        let deadline = start + frame_time * (index as u32 + 1);
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }

        let now = Instant::now();
        let dt = (now - last).as_secs_f32().max(f32::EPSILON);
        last = now;

        let frame = pipeline.tick(dt);
        renderer.draw(index, (now - start).as_secs_f32(), &frame)?;
        index += 1;
    }

    log::info!("Rendered {} frames in {:.1}s", index, start.elapsed().as_secs_f32());
    source.stop();
    pipeline.shutdown();
    Ok(())
}
