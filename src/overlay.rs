//! Drawing the probability text onto frames.
//!
//! Rendering is the only output of the pipeline, so failed frames still
//! draw: a fixed red failure marker when extraction or validation broke,
//! and a yellow "N/A" line when the state was fine but no model interval
//! covers the game time. Stale numbers are never left on screen.

use ab_glyph::{FontVec, PxScale};
use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed literal rendered when a frame fails extraction or validation.
pub const FAILURE_TEXT: &str = "OCR FAIL";

const TEXT_X: i32 = 30;
const TEXT_Y: i32 = 24;
const TEXT_SCALE: f32 = 34.0;

const COLOR_SUCCESS: Rgb<u8> = Rgb([0, 255, 0]);
const COLOR_FAILURE: Rgb<u8> = Rgb([255, 0, 0]);
const COLOR_UNAVAILABLE: Rgb<u8> = Rgb([255, 255, 0]);

/// Fonts tried when the config does not name one.
#[cfg(windows)]
const FONT_CANDIDATES: &[&str] = &[r"C:\Windows\Fonts\arial.ttf", r"C:\Windows\Fonts\segoeui.ttf"];

#[cfg(target_os = "macos")]
const FONT_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
];

#[cfg(all(not(windows), not(target_os = "macos")))]
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
];

pub struct OverlayRenderer {
    font: FontVec,
    scale: PxScale,
}

impl OverlayRenderer {
    /// Loads the overlay font once. A missing font is a construction-time
    /// error; per-frame drawing is infallible after this.
    pub fn new(font_path: Option<&Path>) -> Result<Self> {
        let path = match font_path {
            Some(path) => path.to_path_buf(),
            None => FONT_CANDIDATES
                .iter()
                .map(PathBuf::from)
                .find(|p| p.exists())
                .ok_or_else(|| {
                    anyhow!("no overlay font found; set overlay_font in the config")
                })?,
        };

        let data = fs::read(&path)
            .with_context(|| format!("failed to read overlay font {}", path.display()))?;
        let font = FontVec::try_from_vec(data)
            .map_err(|_| anyhow!("overlay font {} is not a usable font file", path.display()))?;

        Ok(Self {
            font,
            scale: PxScale::from(TEXT_SCALE),
        })
    }

    pub fn draw_probability(&self, frame: &mut RgbImage, abbr: &str, probability: f64) {
        let text = format_probability_text(abbr, probability);
        self.draw(frame, COLOR_SUCCESS, &text);
    }

    pub fn draw_failure(&self, frame: &mut RgbImage) {
        self.draw(frame, COLOR_FAILURE, FAILURE_TEXT);
    }

    pub fn draw_unavailable(&self, frame: &mut RgbImage, abbr: &str) {
        let text = format!("{} WP: N/A", abbr);
        self.draw(frame, COLOR_UNAVAILABLE, &text);
    }

    fn draw(&self, frame: &mut RgbImage, color: Rgb<u8>, text: &str) {
        draw_text_mut(frame, color, TEXT_X, TEXT_Y, self.scale, &self.font, text);
    }
}

/// Success overlay text: probability as a percentage with two decimals.
pub fn format_probability_text(abbr: &str, probability: f64) -> String {
    format!("{} WP: {:.2}%", abbr, probability * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_probability_text() {
        assert_eq!(format_probability_text("LAL", 0.598687), "LAL WP: 59.87%");
        assert_eq!(format_probability_text("BOS", 1.0), "BOS WP: 100.00%");
        assert_eq!(format_probability_text("LAC", 0.0), "LAC WP: 0.00%");
    }
}
