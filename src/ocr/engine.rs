//! Recognition backends.
//!
//! [`TextRecognizer`] is the seam between the frame pipeline and whatever
//! actually reads glyphs. The contract is deliberately blunt: a backend
//! never errors, it returns an empty string for anything it could not read
//! confidently. The pipeline treats an empty reading like any other noisy
//! sample and lets the consensus buffers sort it out.

use anyhow::{anyhow, Context, Result};
use log::warn;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::preprocess::PreparedRegion;
use super::setup::{find_tessdata_dir, find_tesseract_executable};
use super::{FieldKind, FieldWhitelists};

/// A text recognizer for one scoreboard field crop.
///
/// Implementations are selected once per pipeline instance, not per field;
/// the field only selects which character whitelist biases the read.
pub trait TextRecognizer {
    fn recognize(&mut self, region: &PreparedRegion, field: FieldKind) -> String;
}

/// Constrained glyph recognizer backed by a Tesseract subprocess.
///
/// Consumes the binarized mask and runs in single-line mode with the
/// field's character whitelist.
pub struct GlyphRecognizer {
    executable: PathBuf,
    tessdata: PathBuf,
    whitelists: FieldWhitelists,
}

impl GlyphRecognizer {
    /// Locates a Tesseract installation. Failure here is fatal to pipeline
    /// construction; after that, recognition never raises.
    pub fn new(whitelists: FieldWhitelists) -> Result<Self> {
        let executable =
            find_tesseract_executable().context("glyph backend needs a Tesseract install")?;
        let tessdata = find_tessdata_dir().context("glyph backend needs tessdata")?;
        Ok(Self { executable, tessdata, whitelists })
    }

    fn run_tesseract(&self, region: &PreparedRegion, field: FieldKind) -> Result<String> {
        let temp_input = NamedTempFile::with_suffix(".png")?;
        region.binary.save(temp_input.path())?;

        let output = Command::new(&self.executable)
            .arg(temp_input.path())
            .arg("stdout")
            .arg("--tessdata-dir")
            .arg(&self.tessdata)
            .arg("-l")
            .arg("eng")
            .arg("--psm")
            .arg("7") // single line of text
            .arg("-c")
            .arg(format!(
                "tessedit_char_whitelist={}",
                self.whitelists.for_field(field)
            ))
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("tesseract failed: {}", stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl TextRecognizer for GlyphRecognizer {
    fn recognize(&mut self, region: &PreparedRegion, field: FieldKind) -> String {
        match self.run_tesseract(region, field) {
            Ok(text) => text,
            Err(e) => {
                warn!("glyph recognition failed for {}: {}", field, e);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, RgbImage};

    struct CannedRecognizer(Vec<String>);

    impl TextRecognizer for CannedRecognizer {
        fn recognize(&mut self, _region: &PreparedRegion, _field: FieldKind) -> String {
            self.0.pop().unwrap_or_default()
        }
    }

    fn blank_region() -> PreparedRegion {
        PreparedRegion {
            color: RgbImage::new(4, 4),
            binary: GrayImage::new(4, 4),
        }
    }

    #[test]
    fn test_recognizer_is_object_safe() {
        let mut backend: Box<dyn TextRecognizer> =
            Box::new(CannedRecognizer(vec!["88".to_string()]));
        let region = blank_region();
        assert_eq!(backend.recognize(&region, FieldKind::Score1), "88");
        // Exhausted backend degrades to the empty reading, never an error.
        assert_eq!(backend.recognize(&region, FieldKind::Score1), "");
    }
}
