pub mod bars;
pub mod color;
pub mod jsonl;

use anyhow::Result;

use crate::analysis::pipeline::SpectrumFrame;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum RendererKind {
    /// Coloured bar line in the terminal
    Bars,
    /// One JSON object per frame
    Jsonl,
}

/// Consumer of the per-frame spectrum curves.
pub trait Renderer {
    fn draw(&mut self, index: u64, time: f32, frame: &SpectrumFrame<'_>) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
