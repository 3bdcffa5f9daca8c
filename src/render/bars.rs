use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::io::Write;

use super::color::hsv_to_rgb;
use super::Renderer;
use crate::analysis::pipeline::SpectrumFrame;
use crate::config::DisplayConfig;

const GLYPHS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Single-line terminal spectrum, redrawn in place each frame.
///
/// Bar height follows `smooth`; where `smear` is still higher its glyph is
/// drawn dimmed, giving the trailing afterglow.
pub struct BarsRenderer<W: Write> {
    out: W,
    width: usize,
    saturation: f32,
    value: f32,
    line: String,
}

impl<W: Write> BarsRenderer<W> {
    pub fn new(out: W, display: &DisplayConfig) -> Self {
        let width = if display.width > 0 {
            display.width
        } else {
            terminal_width()
        };
        Self {
            out,
            width,
            saturation: display.saturation,
            value: display.value,
            line: String::new(),
        }
    }

    fn compose(&mut self, frame: &SpectrumFrame<'_>) {
        self.line.clear();
        self.line.push('\r');

        let m = frame.count();
        if m == 0 {
            return;
        }

        for col in 0..self.width {
            let (lo, hi) = column_span(col, self.width, m);
            let smooth = peak(&frame.smooth[lo..hi]);
            let smear = peak(&frame.smear[lo..hi]);

            let hue = lo as f32 / m as f32 * 360.0;
            let [r, g, b] = hsv_to_rgb(hue, self.saturation, self.value);

            let level = glyph_level(smooth);
            let trail = glyph_level(smear);
            if trail > level {
                let dim = |c: u8| (c as f32 * 0.35) as u8;
                let _ = write!(
                    self.line,
                    "\x1b[38;2;{};{};{}m{}",
                    dim(r),
                    dim(g),
                    dim(b),
                    GLYPHS[trail]
                );
            } else {
                let _ = write!(self.line, "\x1b[38;2;{};{};{}m{}", r, g, b, GLYPHS[level]);
            }
        }
        self.line.push_str("\x1b[0m");
    }
}

impl<W: Write> Renderer for BarsRenderer<W> {
    fn draw(&mut self, _index: u64, _time: f32, frame: &SpectrumFrame<'_>) -> Result<()> {
        self.compose(frame);
        self.out
            .write_all(self.line.as_bytes())
            .and_then(|_| self.out.flush())
            .context("Failed to draw spectrum")
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(self.out, "\x1b[0m").context("Failed to draw spectrum")?;
        Ok(())
    }
}

/// Bucket range shown in column `col`; at least one bucket wide.
fn column_span(col: usize, width: usize, buckets: usize) -> (usize, usize) {
    let lo = col * buckets / width;
    let hi = ((col + 1) * buckets / width).max(lo + 1).min(buckets);
    (lo, hi)
}

fn peak(values: &[f32]) -> f32 {
    values.iter().copied().fold(0.0f32, f32::max)
}

fn glyph_level(v: f32) -> usize {
    // Negative and NaN render empty
    let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
    (v * (GLYPHS.len() - 1) as f32).round() as usize
}

fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.trim().parse().ok())
        .filter(|&c: &usize| c > 0)
        .unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(width: usize) -> DisplayConfig {
        DisplayConfig {
            width,
            ..DisplayConfig::default()
        }
    }

    #[test]
    fn columns_cover_every_bucket() {
        for &(width, buckets) in &[(10, 104), (104, 104), (200, 50), (7, 3)] {
            let mut covered = vec![false; buckets];
            for col in 0..width {
                let (lo, hi) = column_span(col, width, buckets);
                assert!(lo < hi && hi <= buckets);
                for c in &mut covered[lo..hi] {
                    *c = true;
                }
            }
            assert!(covered.iter().all(|&c| c), "{}x{}", width, buckets);
        }
    }

    #[test]
    fn levels_are_clamped() {
        assert_eq!(glyph_level(-0.5), 0);
        assert_eq!(glyph_level(f32::NAN), 0);
        assert_eq!(glyph_level(0.0), 0);
        assert_eq!(glyph_level(1.0), 8);
        assert_eq!(glyph_level(7.0), 8);
        assert_eq!(glyph_level(0.5), 4);
    }

    #[test]
    fn draws_one_glyph_per_column() {
        let mut renderer = BarsRenderer::new(Vec::new(), &display(4));
        let smooth = [1.0, 0.5, 0.0, 0.0];
        let smear = [0.2, 0.2, 0.0, 1.0];
        let frame = SpectrumFrame {
            smooth: &smooth,
            smear: &smear,
        };
        renderer.draw(0, 0.0, &frame).unwrap();

        let text = String::from_utf8(renderer.out.clone()).unwrap();
        assert!(text.starts_with('\r'));
        assert!(text.ends_with("\x1b[0m"));
        let glyphs: String = text.chars().filter(|c| GLYPHS[1..].contains(c)).collect();
        assert_eq!(glyphs, "█▄█");
        // The last column is smear only, so it is dimmed
        assert!(text.contains("\x1b[38;2;"));
    }

    #[test]
    fn empty_frame_draws_nothing_visible() {
        let mut renderer = BarsRenderer::new(Vec::new(), &display(8));
        let frame = SpectrumFrame {
            smooth: &[],
            smear: &[],
        };
        renderer.draw(0, 0.0, &frame).unwrap();
        assert_eq!(renderer.out, b"\r");
    }
}
