use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::fft::FftBackend;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_bucket_step")]
    pub bucket_step: f32,
    #[serde(default = "default_smooth_rate")]
    pub smooth_rate: f32,
    #[serde(default = "default_smear_rate")]
    pub smear_rate: f32,
    #[serde(default)]
    pub fft_backend: FftBackend,
    /// Ingest queue length in samples, 0 picks 4 x fft_size
    #[serde(default)]
    pub queue_capacity: usize,
    /// Channel extracted from interleaved input
    #[serde(default)]
    pub channel: usize,
}

#[derive(Debug, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Frames handed over per simulated audio callback
    #[serde(default = "default_block_frames")]
    pub block_frames: usize,
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_saturation")]
    pub saturation: f32,
    #[serde(default = "default_value")]
    pub value: f32,
    /// Columns for the bar display, 0 follows $COLUMNS
    #[serde(default)]
    pub width: usize,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("fft_size must be a power of two, got {0}")]
    FftSize(usize),
    #[error("bucket_step must be greater than 1.0, got {0}")]
    BucketStep(f32),
    #[error("{name} must be a positive finite number, got {value}")]
    Rate { name: &'static str, value: f32 },
    #[error("fps must be greater than zero")]
    Fps,
    #[error("block_frames must be greater than zero")]
    BlockFrames,
    #[error("queue_capacity {capacity} is smaller than one block of {block} samples")]
    QueueCapacity { capacity: usize, block: usize },
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            bucket_step: default_bucket_step(),
            smooth_rate: default_smooth_rate(),
            smear_rate: default_smear_rate(),
            fft_backend: FftBackend::default(),
            queue_capacity: 0,
            channel: 0,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            block_frames: default_block_frames(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            saturation: default_saturation(),
            value: default_value(),
            width: 0,
        }
    }
}

impl AnalysisConfig {
    pub fn queue_len(&self) -> usize {
        if self.queue_capacity == 0 {
            self.fft_size * 4
        } else {
            self.queue_capacity
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fft_size.is_power_of_two() {
            return Err(ConfigError::FftSize(self.fft_size));
        }
        // NaN fails this comparison too
        if !(self.bucket_step > 1.0) {
            return Err(ConfigError::BucketStep(self.bucket_step));
        }
        for (name, value) in [("smooth_rate", self.smooth_rate), ("smear_rate", self.smear_rate)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Rate { name, value });
            }
        }
        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        if self.playback.fps == 0 {
            return Err(ConfigError::Fps);
        }
        if self.playback.block_frames == 0 {
            return Err(ConfigError::BlockFrames);
        }
        let capacity = self.analysis.queue_len();
        if capacity < self.playback.block_frames {
            return Err(ConfigError::QueueCapacity {
                capacity,
                block: self.playback.block_frames,
            });
        }
        Ok(())
    }
}

fn default_fft_size() -> usize { 8192 }
fn default_bucket_step() -> f32 { 1.06 }
fn default_smooth_rate() -> f32 { 8.0 }
fn default_smear_rate() -> f32 { 3.0 }
fn default_fps() -> u32 { 144 }
fn default_block_frames() -> usize { 1024 }
fn default_saturation() -> f32 { 0.75 }
fn default_value() -> f32 { 1.0 }

/// Explicit path first, then ./specviz.toml, then the user config dirs.
pub fn discover(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        let local = PathBuf::from("specviz.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("specviz").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("specviz").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    })
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::debug!("{}: {}", path.display(), err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.analysis.fft_size, 8192);
        assert_eq!(config.analysis.bucket_step, 1.06);
        assert_eq!(config.analysis.smooth_rate, 8.0);
        assert_eq!(config.analysis.smear_rate, 3.0);
        assert_eq!(config.analysis.fft_backend, FftBackend::Recursive);
        assert_eq!(config.analysis.queue_len(), 8192 * 4);
        assert_eq!(config.playback.fps, 144);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [analysis]
            fft_size = 2048
            fft_backend = "rustfft"

            [playback]
            fps = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.fft_size, 2048);
        assert_eq!(config.analysis.fft_backend, FftBackend::RustFft);
        assert_eq!(config.analysis.smooth_rate, 8.0);
        assert_eq!(config.playback.fps, 60);
        assert_eq!(config.playback.block_frames, 1024);
        assert_eq!(config.display.saturation, 0.75);
    }

    #[test]
    fn rejects_bad_analysis_values() {
        let mut analysis = AnalysisConfig::default();
        analysis.fft_size = 1000;
        assert_eq!(analysis.validate(), Err(ConfigError::FftSize(1000)));

        let mut analysis = AnalysisConfig::default();
        analysis.bucket_step = 1.0;
        assert_eq!(analysis.validate(), Err(ConfigError::BucketStep(1.0)));

        let mut analysis = AnalysisConfig::default();
        analysis.smear_rate = -3.0;
        assert_eq!(
            analysis.validate(),
            Err(ConfigError::Rate { name: "smear_rate", value: -3.0 })
        );

        let mut analysis = AnalysisConfig::default();
        analysis.smooth_rate = f32::INFINITY;
        assert!(analysis.validate().is_err());
    }

    #[test]
    fn rejects_queue_smaller_than_block() {
        let mut config = Config::default();
        config.analysis.queue_capacity = 256;
        assert_eq!(
            config.validate(),
            Err(ConfigError::QueueCapacity { capacity: 256, block: 1024 })
        );
    }

    #[test]
    fn rejects_zero_fps() {
        let mut config = Config::default();
        config.playback.fps = 0;
        assert_eq!(config.validate(), Err(ConfigError::Fps));
    }
}
