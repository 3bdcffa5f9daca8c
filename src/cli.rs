use clap::Parser;
use std::path::PathBuf;

use crate::analysis::fft::FftBackend;
use crate::config::Config;
use crate::render::RendererKind;

#[derive(Parser, Debug)]
#[command(name = "specviz", about = "Real-time log-frequency audio spectrum")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: Option<PathBuf>,

    /// Config file (default: ./specviz.toml or ~/.config/specviz/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Analyse the default input device instead of a file
    #[arg(long, conflicts_with = "offline")]
    pub live: bool,

    /// Process the whole file as fast as possible with a fixed frame step
    #[arg(long)]
    pub offline: bool,

    /// Output renderer (default: bars, or jsonl when offline)
    #[arg(short, long, value_enum)]
    pub renderer: Option<RendererKind>,

    /// Write frames here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration: Option<f32>,

    /// Frames per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// FFT size, a power of two
    #[arg(long)]
    pub fft_size: Option<usize>,

    /// Geometric growth between bucket edges
    #[arg(long)]
    pub bucket_step: Option<f32>,

    /// Fast smoothing rate (per second)
    #[arg(long)]
    pub smooth_rate: Option<f32>,

    /// Slow smear rate (per second)
    #[arg(long)]
    pub smear_rate: Option<f32>,

    /// FFT implementation
    #[arg(long, value_enum)]
    pub fft_backend: Option<FftBackend>,

    /// Audio channel to analyse
    #[arg(long)]
    pub channel: Option<usize>,
}

impl Cli {
    /// Flags that were given win over the config file.
    pub fn apply(&self, config: &mut Config) {
        let analysis = &mut config.analysis;
        if let Some(v) = self.fft_size {
            analysis.fft_size = v;
        }
        if let Some(v) = self.bucket_step {
            analysis.bucket_step = v;
        }
        if let Some(v) = self.smooth_rate {
            analysis.smooth_rate = v;
        }
        if let Some(v) = self.smear_rate {
            analysis.smear_rate = v;
        }
        if let Some(v) = self.fft_backend {
            analysis.fft_backend = v;
        }
        if let Some(v) = self.channel {
            analysis.channel = v;
        }
        if let Some(v) = self.fps {
            config.playback.fps = v;
        }
    }

    pub fn renderer_kind(&self) -> RendererKind {
        self.renderer.unwrap_or(if self.offline {
            RendererKind::Jsonl
        } else {
            RendererKind::Bars
        })
    }
}
