//! Neural scene-text backend.
//!
//! Runs a pretrained CRNN-style recognition model through ONNX Runtime on
//! CPU. The model takes a fixed-height grayscale strip and emits per-step
//! character logits that are collapsed with greedy CTC decoding against a
//! charset file (one character per line, index 0 reserved for the blank).
//!
//! Construction fails when the model or charset is missing; after that the
//! backend obeys the recognizer contract and degrades to an empty string.

use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use log::warn;
use ndarray::Array4;
use ort::inputs;
use ort::session::Session;
use ort::value::TensorRef;
use std::fs;
use std::path::Path;

use super::preprocess::PreparedRegion;
use super::{FieldKind, FieldWhitelists, TextRecognizer};

/// Input strip height expected by the recognition model.
const INPUT_HEIGHT: u32 = 32;

/// Narrow crops are padded up to this width so the recurrent head has
/// enough timesteps to emit anything.
const MIN_INPUT_WIDTH: u32 = 16;

pub struct SceneTextRecognizer {
    session: Session,
    charset: Vec<char>,
    whitelists: FieldWhitelists,
}

impl SceneTextRecognizer {
    pub fn new(
        model_path: &Path,
        charset_path: &Path,
        whitelists: FieldWhitelists,
    ) -> Result<Self> {
        let session = Session::builder()?
            .commit_from_file(model_path)
            .with_context(|| format!("loading scene-text model {}", model_path.display()))?;

        let raw = fs::read_to_string(charset_path)
            .with_context(|| format!("loading charset {}", charset_path.display()))?;
        let charset: Vec<char> = raw.lines().filter_map(|l| l.chars().next()).collect();
        if charset.is_empty() {
            return Err(anyhow!("charset {} is empty", charset_path.display()));
        }

        Ok(Self { session, charset, whitelists })
    }

    /// Scales the enhanced crop to the model's input strip and normalizes
    /// pixels to [-1, 1].
    fn build_input(&self, region: &PreparedRegion) -> Array4<f32> {
        let gray = imageops::grayscale(&region.color);
        let (w, h) = gray.dimensions();
        let scaled_w = ((w as f32 * INPUT_HEIGHT as f32 / h.max(1) as f32).round() as u32)
            .max(MIN_INPUT_WIDTH);
        let strip = imageops::resize(&gray, scaled_w, INPUT_HEIGHT, FilterType::CatmullRom);

        let mut input = Array4::<f32>::zeros((1, 1, INPUT_HEIGHT as usize, scaled_w as usize));
        for (x, y, pixel) in strip.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel.0[0] as f32 / 127.5 - 1.0;
        }
        input
    }

    fn infer(&mut self, region: &PreparedRegion) -> Result<String> {
        let input = self.build_input(region);
        let input_ref: TensorRef<f32> = TensorRef::from_array_view(input.view())?;
        let outputs = self
            .session
            .run(inputs![input_ref])
            .map_err(|e| anyhow!("scene-text inference failed: {e}"))?;
        let logits = outputs[0].try_extract_array::<f32>()?.into_owned();

        // Expect (batch, steps, classes); tolerate a leading batch of 1
        // being absent.
        let (steps, classes) = match logits.shape() {
            [1, t, c] => (*t, *c),
            [t, c] => (*t, *c),
            other => return Err(anyhow!("unexpected logit shape {:?}", other)),
        };
        let flat = logits
            .as_slice()
            .ok_or_else(|| anyhow!("non-contiguous logits"))?;

        // Greedy CTC: argmax per step, collapse repeats, drop blanks.
        let mut text = String::new();
        let mut previous = 0usize;
        for step in 0..steps {
            let row = &flat[step * classes..(step + 1) * classes];
            let best = row
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap_or(0);
            if best != 0 && best != previous {
                if let Some(&ch) = self.charset.get(best - 1) {
                    text.push(ch);
                }
            }
            previous = best;
        }

        Ok(text)
    }
}

impl TextRecognizer for SceneTextRecognizer {
    fn recognize(&mut self, region: &PreparedRegion, field: FieldKind) -> String {
        match self.infer(region) {
            Ok(text) => {
                // The model is unconstrained, so the whitelist is applied
                // as a soft filter after the fact: anything outside it is
                // dropped unless it is a letter, which the downstream
                // normalizers need to repair digit misreads like O for 0.
                let whitelist = self.whitelists.for_field(field);
                text.chars()
                    .filter(|c| whitelist.contains(*c) || c.is_ascii_alphabetic())
                    .collect()
            }
            Err(e) => {
                warn!("scene-text recognition failed for {}: {}", field, e);
                String::new()
            }
        }
    }
}
