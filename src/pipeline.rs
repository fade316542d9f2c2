//! Per-frame orchestration.
//!
//! One [`FramePipeline`] instance serves one video stream and must see its
//! frames in temporal order: the consensus buffers are sliding windows, so
//! reordered frames silently corrupt the vote. Independent streams get
//! independent pipeline instances; nothing mutable is shared between them.
//!
//! Each frame runs extraction, buffer pushes, consensus, parsing,
//! validation, model lookup, and rendering. Every failure along the way is
//! contained to the frame: the buffers still receive their (possibly
//! empty) pushes so the window stays aligned with frame cadence, the
//! failure marker is rendered, and the stream continues.

use anyhow::{Context, Result};
use image::RgbImage;
use log::{debug, warn};
use regex::Regex;
use std::sync::OnceLock;

use crate::config::{BackendKind, PipelineConfig};
use crate::consensus::ConsensusBuffer;
use crate::error::FrameError;
use crate::model::WinProbabilityModel;
use crate::ocr::{
    prepare_region, FieldKind, GlyphRecognizer, SceneTextRecognizer, TextRecognizer,
};
use crate::overlay::OverlayRenderer;
use crate::roi::{ScaledRegion, ScaledRegionSet};
use crate::text::{normalize_clock, normalize_quarter, parse_clock_seconds, Quarter};

/// Live game state derived from one frame's consensus values.
///
/// Always rebuilt from scratch; a state is only constructed once every
/// field passed validation, so a partially-read scoreboard never reaches
/// the model.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub score1: i64,
    pub score2: i64,
    /// Absolute game seconds remaining (quarter offset + quarter clock).
    pub time_remaining_sec: f64,
    pub quarter: Quarter,
}

/// Result of processing one frame. Exactly two terminal outcomes exist;
/// a model gap is a failure kind of its own so the renderer can show it
/// distinctly from a bad read.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Success { state: GameState, probability: f64 },
    Failure(FrameError),
}

/// One opportunistic read of a single frame, bypassing the consensus
/// buffers entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub score1: i64,
    pub score2: i64,
    pub time_remaining_sec: f64,
    pub score_diff: i64,
    /// Absent when no coefficient interval covers the game time.
    pub win_probability: Option<f64>,
}

struct FieldBuffers {
    score1: ConsensusBuffer,
    score2: ConsensusBuffer,
    clock: ConsensusBuffer,
    quarter: ConsensusBuffer,
}

impl FieldBuffers {
    fn new(capacity: usize) -> Self {
        Self {
            score1: ConsensusBuffer::new(capacity),
            score2: ConsensusBuffer::new(capacity),
            clock: ConsensusBuffer::new(capacity),
            quarter: ConsensusBuffer::new(capacity),
        }
    }
}

struct ScaledCache {
    width: u32,
    height: u32,
    regions: ScaledRegionSet,
}

pub struct FramePipeline {
    config: PipelineConfig,
    recognizer: Box<dyn TextRecognizer>,
    model: WinProbabilityModel,
    /// Absent in headless instances that only want outcomes, not overlays.
    overlay: Option<OverlayRenderer>,
    buffers: FieldBuffers,
    scaled: Option<ScaledCache>,
    frame_index: u64,
    warned_overtime: bool,
}

impl FramePipeline {
    /// Builds a pipeline from config: backend, coefficient table, and
    /// overlay font all load here, and all of them are fatal on failure.
    /// After construction, per-frame processing never returns an error.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let recognizer: Box<dyn TextRecognizer> = match config.backend {
            BackendKind::Glyph => Box::new(GlyphRecognizer::new(config.whitelists.clone())?),
            BackendKind::Scene => {
                // validate() guarantees the paths are present.
                let model_path = config.scene_model.as_deref().expect("validated");
                let charset_path = config.scene_charset.as_deref().expect("validated");
                Box::new(SceneTextRecognizer::new(
                    model_path,
                    charset_path,
                    config.whitelists.clone(),
                )?)
            }
        };

        let model = WinProbabilityModel::from_csv(&config.coefficients)
            .context("loading win probability coefficients")?;
        let overlay = Some(OverlayRenderer::new(config.overlay_font.as_deref())?);

        Ok(Self::assemble(config, recognizer, model, overlay))
    }

    /// Builds a pipeline around caller-supplied parts. Used by embedders
    /// and tests that script the recognizer; `overlay` may be `None` for
    /// headless processing.
    pub fn with_parts(
        config: PipelineConfig,
        recognizer: Box<dyn TextRecognizer>,
        model: WinProbabilityModel,
        overlay: Option<OverlayRenderer>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, recognizer, model, overlay))
    }

    fn assemble(
        config: PipelineConfig,
        recognizer: Box<dyn TextRecognizer>,
        model: WinProbabilityModel,
        overlay: Option<OverlayRenderer>,
    ) -> Self {
        let buffers = FieldBuffers::new(config.buffer_capacity);
        Self {
            config,
            recognizer,
            model,
            overlay,
            buffers,
            scaled: None,
            frame_index: 0,
            warned_overtime: false,
        }
    }

    /// Number of frames this pipeline has consumed.
    pub fn frames_processed(&self) -> u64 {
        self.frame_index
    }

    /// Processes one frame in stream order: extract, push, vote, parse,
    /// validate, score, render. The overlay is drawn onto `frame` as a
    /// side effect; the returned outcome says what was drawn.
    pub fn process_frame(&mut self, frame: &mut RgbImage) -> FrameOutcome {
        let outcome = self.evaluate(frame);

        if let Some(overlay) = &self.overlay {
            match &outcome {
                FrameOutcome::Success { probability, .. } => {
                    overlay.draw_probability(frame, &self.config.team1_abbr, *probability);
                }
                FrameOutcome::Failure(FrameError::ModelUnavailable(_)) => {
                    overlay.draw_unavailable(frame, &self.config.team1_abbr);
                }
                FrameOutcome::Failure(_) => {
                    overlay.draw_failure(frame);
                }
            }
        }

        outcome
    }

    fn evaluate(&mut self, frame: &RgbImage) -> FrameOutcome {
        let regions = self.scaled_regions(frame.dimensions());

        // Extraction failures degrade to empty readings; the pushes below
        // happen unconditionally so the windows track frame cadence.
        let s1_raw = self.read_field(frame, &regions.score1, FieldKind::Score1);
        let s2_raw = self.read_field(frame, &regions.score2, FieldKind::Score2);
        let clk_raw = self.read_field(frame, &regions.clock, FieldKind::Clock);
        let qtr_raw = self.read_field(frame, &regions.quarter, FieldKind::Quarter);

        self.buffers.score1.push(s1_raw);
        self.buffers.score2.push(s2_raw);
        self.buffers.clock.push(clk_raw);
        self.buffers.quarter.push(qtr_raw);
        self.frame_index += 1;

        // A push just happened, so every buffer has a consensus.
        let s1 = self.buffers.score1.consensus().unwrap_or_default().to_string();
        let s2 = self.buffers.score2.consensus().unwrap_or_default().to_string();
        let clk = normalize_clock(self.buffers.clock.consensus().unwrap_or_default());
        let qtr = normalize_quarter(self.buffers.quarter.consensus().unwrap_or_default());

        debug!(
            "[frame {}] score1={:?} score2={:?} clock={:?} quarter={:?}",
            self.frame_index, s1, s2, clk, qtr
        );

        match self.build_state(&s1, &s2, &clk, &qtr) {
            Ok(state) => self.score_state(state),
            Err(e) => FrameOutcome::Failure(e),
        }
    }

    /// Single-shot entry point: reads the given frame and returns the raw
    /// game tuple without consulting or updating any consensus buffer.
    /// Intended for callers that want one opportunistic reading rather
    /// than a smoothed stream; nothing is drawn.
    pub fn snapshot(&mut self, frame: &RgbImage) -> Result<GameSnapshot, FrameError> {
        let regions = self.scaled_regions(frame.dimensions());

        let s1 = self.read_field(frame, &regions.score1, FieldKind::Score1);
        let s2 = self.read_field(frame, &regions.score2, FieldKind::Score2);
        let clk = normalize_clock(&self.read_field(frame, &regions.clock, FieldKind::Clock));
        let qtr = normalize_quarter(&self.read_field(frame, &regions.quarter, FieldKind::Quarter));

        let state = self.build_state(&s1, &s2, &clk, &qtr)?;
        let win_probability = self.model.compute(
            state.score1,
            state.score2,
            state.time_remaining_sec,
            self.config.favored_by,
        );

        Ok(GameSnapshot {
            score1: state.score1,
            score2: state.score2,
            time_remaining_sec: state.time_remaining_sec,
            score_diff: state.score1 - state.score2,
            win_probability,
        })
    }

    /// Validates the four consensus values and derives a fresh GameState.
    /// Any invalid field fails the whole frame; a partial state is never
    /// built.
    fn build_state(
        &mut self,
        s1: &str,
        s2: &str,
        clk: &str,
        qtr: &str,
    ) -> Result<GameState, FrameError> {
        let score1 = parse_score(s1).ok_or_else(|| FrameError::NonNumericScore {
            field: FieldKind::Score1,
            value: s1.to_string(),
        })?;
        let score2 = parse_score(s2).ok_or_else(|| FrameError::NonNumericScore {
            field: FieldKind::Score2,
            value: s2.to_string(),
        })?;

        let quarter_clock = parse_clock_seconds(clk)
            .ok_or_else(|| FrameError::UnparsableClock(clk.to_string()))?;

        let quarter = Quarter::from_label(qtr);
        if quarter == Quarter::Overtime && !self.warned_overtime {
            warn!("overtime period has no model offset; scoring it like the fourth quarter");
            self.warned_overtime = true;
        }

        Ok(GameState {
            score1,
            score2,
            time_remaining_sec: quarter.start_offset_seconds() + quarter_clock,
            quarter,
        })
    }

    fn score_state(&self, state: GameState) -> FrameOutcome {
        match self.model.compute(
            state.score1,
            state.score2,
            state.time_remaining_sec,
            self.config.favored_by,
        ) {
            Some(probability) => FrameOutcome::Success { state, probability },
            None => FrameOutcome::Failure(FrameError::ModelUnavailable(
                state.time_remaining_sec.round() as i64,
            )),
        }
    }

    fn read_field(&mut self, frame: &RgbImage, region: &ScaledRegion, field: FieldKind) -> String {
        match prepare_region(frame, region, field) {
            Ok(prepared) => self.recognizer.recognize(&prepared, field),
            Err(e) => {
                debug!("extraction skipped: {}", e);
                String::new()
            }
        }
    }

    /// Scaled regions for the current frame size, recomputed only when the
    /// resolution changes.
    fn scaled_regions(&mut self, (width, height): (u32, u32)) -> ScaledRegionSet {
        match &self.scaled {
            Some(cache) if cache.width == width && cache.height == height => cache.regions,
            _ => {
                let regions = self.config.regions.scale_to(width, height);
                self.scaled = Some(ScaledCache { width, height, regions });
                regions
            }
        }
    }
}

/// Scores must be purely numeric; anything else fails frame validation.
fn parse_score(text: &str) -> Option<i64> {
    static SCORE_RE: OnceLock<Regex> = OnceLock::new();
    let re = SCORE_RE.get_or_init(|| Regex::new(r"^\d+$").expect("valid regex"));
    if !re.is_match(text) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score_numeric_only() {
        assert_eq!(parse_score("88"), Some(88));
        assert_eq!(parse_score("0"), Some(0));
        assert_eq!(parse_score(""), None);
        assert_eq!(parse_score("8a"), None);
        assert_eq!(parse_score("-3"), None);
        assert_eq!(parse_score("8 8"), None);
    }
}
