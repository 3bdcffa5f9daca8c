use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

use super::Renderer;
use crate::analysis::pipeline::SpectrumFrame;

#[derive(Serialize)]
struct FrameRecord<'a> {
    frame: u64,
    time: f32,
    count: usize,
    smooth: &'a [f32],
    smear: &'a [f32],
}

/// Writes each frame as one JSON object per line, for external visualisers.
pub struct JsonLinesRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Renderer for JsonLinesRenderer<W> {
    fn draw(&mut self, index: u64, time: f32, frame: &SpectrumFrame<'_>) -> Result<()> {
        let record = FrameRecord {
            frame: index,
            time,
            count: frame.count(),
            smooth: frame.smooth,
            smear: frame.smear,
        };
        serde_json::to_writer(&mut self.out, &record).context("Failed to serialize frame")?;
        self.out.write_all(b"\n").context("Failed to write frame")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().context("Failed to flush frame output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_line_per_frame() {
        let mut renderer = JsonLinesRenderer::new(Vec::new());
        let smooth = [0.5, 0.25];
        let smear = [0.125, 0.0];
        let frame = SpectrumFrame {
            smooth: &smooth,
            smear: &smear,
        };
        renderer.draw(0, 0.0, &frame).unwrap();
        renderer.draw(1, 0.5, &frame).unwrap();
        renderer.finish().unwrap();

        let text = String::from_utf8(renderer.out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["frame"], 1);
        assert_eq!(second["time"], 0.5);
        assert_eq!(second["count"], 2);
        assert_eq!(second["smooth"], serde_json::json!([0.5, 0.25]));
        assert_eq!(second["smear"], serde_json::json!([0.125, 0.0]));
    }
}
