//! Pipeline configuration.
//!
//! Loaded from a JSON file at startup. Every field has a sensible default
//! so a minimal config can name just the coefficient table; malformed
//! values are fatal at construction, never per frame.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::consensus::DEFAULT_CAPACITY;
use crate::model::DEFAULT_FAVORED_BY;
use crate::ocr::FieldWhitelists;
use crate::roi::RegionSet;

/// Which recognition backend a pipeline instance uses. Selected once at
/// construction, never per field or per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Constrained glyph recognizer (Tesseract subprocess).
    Glyph,
    /// Neural scene-text recognizer (ONNX).
    Scene,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Scoreboard field rectangles in 1920x1080 reference coordinates.
    #[serde(default)]
    pub regions: RegionSet,

    #[serde(default = "default_backend")]
    pub backend: BackendKind,

    /// Sliding-window length of the per-field consensus buffers.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Per-field character whitelist overrides for the recognizer.
    ///
    /// Unset fields use the built-in sets. Overrides constrain what the
    /// backend may emit, not what the parsers accept, so an override that
    /// drops the clock separators or the quarter letters makes every frame
    /// fail validation.
    #[serde(default)]
    pub whitelists: FieldWhitelists,

    /// Abbreviation of the team whose probability is displayed.
    #[serde(default = "default_team1_abbr")]
    pub team1_abbr: String,

    #[serde(default = "default_team2_abbr")]
    pub team2_abbr: String,

    /// Pre-game point-spread prior fed to the model.
    #[serde(default = "default_favored_by")]
    pub favored_by: f64,

    /// Path to the coefficient table CSV.
    #[serde(default = "default_coefficients")]
    pub coefficients: PathBuf,

    /// Overlay font; system fonts are probed when unset.
    #[serde(default)]
    pub overlay_font: Option<PathBuf>,

    /// ONNX model for the scene backend. Required when `backend = scene`.
    #[serde(default)]
    pub scene_model: Option<PathBuf>,

    /// Charset file for the scene backend's CTC decode.
    #[serde(default)]
    pub scene_charset: Option<PathBuf>,
}

fn default_backend() -> BackendKind {
    BackendKind::Glyph
}

fn default_buffer_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_team1_abbr() -> String {
    "LAL".to_string()
}

fn default_team2_abbr() -> String {
    "LAC".to_string()
}

fn default_favored_by() -> f64 {
    DEFAULT_FAVORED_BY
}

fn default_coefficients() -> PathBuf {
    PathBuf::from("win_prob_coefficients.csv")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            regions: RegionSet::default(),
            backend: default_backend(),
            buffer_capacity: default_buffer_capacity(),
            whitelists: FieldWhitelists::default(),
            team1_abbr: default_team1_abbr(),
            team2_abbr: default_team2_abbr(),
            favored_by: default_favored_by(),
            coefficients: default_coefficients(),
            overlay_font: None,
            scene_model: None,
            scene_charset: None,
        }
    }
}

impl PipelineConfig {
    /// Loads and validates a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants a pipeline relies on. Called by the pipeline
    /// constructor as well, so hand-built configs get the same treatment.
    pub fn validate(&self) -> Result<()> {
        if !self.regions.is_well_formed() {
            return Err(anyhow!("region set contains a degenerate rectangle"));
        }
        if self.buffer_capacity == 0 {
            return Err(anyhow!("buffer_capacity must be at least 1"));
        }
        if self.backend == BackendKind::Scene
            && (self.scene_model.is_none() || self.scene_charset.is_none())
        {
            return Err(anyhow!(
                "scene backend needs scene_model and scene_charset paths"
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"coefficients\": \"coeffs.csv\"}}").unwrap();

        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.backend, BackendKind::Glyph);
        assert_eq!(config.buffer_capacity, 5);
        assert_eq!(config.team1_abbr, "LAL");
        assert_eq!(config.favored_by, 0.5);
        assert_eq!(config.coefficients, PathBuf::from("coeffs.csv"));
        assert_eq!(config.regions.score1.x1, 1518);
    }

    #[test]
    fn test_whitelist_overrides_from_config() {
        use crate::ocr::FieldKind;

        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "{{\"whitelists\": {{\"quarter\": \"0123456789QOTHRSTNDEV\"}}}}"
        )
        .unwrap();

        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(
            config.whitelists.for_field(FieldKind::Quarter),
            "0123456789QOTHRSTNDEV"
        );
        assert_eq!(config.whitelists.for_field(FieldKind::Clock), "0123456789:.");
    }

    #[test]
    fn test_malformed_json_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(PipelineConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_degenerate_region_is_fatal() {
        let mut config = PipelineConfig::default();
        config.regions.clock.x2 = config.regions.clock.x1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_capacity_is_fatal() {
        let config = PipelineConfig {
            buffer_capacity: 0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scene_backend_requires_model_paths() {
        let config = PipelineConfig {
            backend: BackendKind::Scene,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            backend: BackendKind::Scene,
            scene_model: Some(PathBuf::from("rec.onnx")),
            scene_charset: Some(PathBuf::from("charset.txt")),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
