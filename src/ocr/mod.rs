//! Scoreboard text recognition.
//!
//! A frame region goes through three steps here: preprocessing (crop,
//! upsample, enhance, binarize), then a recognition backend, then the
//! caller feeds the raw reading into the consensus buffers. Backends are
//! behind the [`TextRecognizer`] trait so each stream owns its engine and
//! tests can script one.

use serde::{Deserialize, Serialize};

pub mod engine;
pub mod preprocess;
pub mod scene;
pub mod setup;

pub use engine::{GlyphRecognizer, TextRecognizer};
pub use preprocess::{prepare_region, PreparedRegion};
pub use scene::SceneTextRecognizer;

/// One of the four scoreboard fields read per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Score1,
    Score2,
    Clock,
    Quarter,
}

impl FieldKind {
    /// Default characters the recognizer is allowed to emit for this field.
    ///
    /// Scores are bare numbers, the clock adds the separator glyphs, and
    /// the quarter needs the letters that appear in "1ST".."4TH" and "OT".
    pub fn whitelist(self) -> &'static str {
        match self {
            FieldKind::Score1 | FieldKind::Score2 => "0123456789",
            FieldKind::Clock => "0123456789:.",
            FieldKind::Quarter => "0123456789QOTHRSND",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Score1 => write!(f, "score1"),
            FieldKind::Score2 => write!(f, "score2"),
            FieldKind::Clock => write!(f, "clock"),
            FieldKind::Quarter => write!(f, "quarter"),
        }
    }
}

/// Per-field whitelist overrides from configuration.
///
/// An unset field uses [`FieldKind::whitelist`]. Overrides change what a
/// backend may emit, not what the parsers accept: the clock grammar still
/// expects digits with `:` and `.`, and the quarter offset table still
/// keys on the "1ST".."4TH"/"OT" labels, so an override that removes
/// those characters turns every frame into a validation failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWhitelists {
    #[serde(default)]
    pub score1: Option<String>,
    #[serde(default)]
    pub score2: Option<String>,
    #[serde(default)]
    pub clock: Option<String>,
    #[serde(default)]
    pub quarter: Option<String>,
}

impl FieldWhitelists {
    /// The effective whitelist for a field: the override when set, the
    /// built-in default otherwise.
    pub fn for_field(&self, field: FieldKind) -> &str {
        let configured = match field {
            FieldKind::Score1 => &self.score1,
            FieldKind::Score2 => &self.score2,
            FieldKind::Clock => &self.clock,
            FieldKind::Quarter => &self.quarter,
        };
        configured.as_deref().unwrap_or_else(|| field.whitelist())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitelists_default_to_field_sets() {
        let whitelists = FieldWhitelists::default();
        assert_eq!(whitelists.for_field(FieldKind::Score1), "0123456789");
        assert_eq!(whitelists.for_field(FieldKind::Clock), "0123456789:.");
        assert_eq!(whitelists.for_field(FieldKind::Quarter), "0123456789QOTHRSND");
    }

    #[test]
    fn test_whitelist_override_replaces_one_field() {
        let whitelists = FieldWhitelists {
            quarter: Some("0123456789QOTHRSTNDEV".to_string()),
            ..FieldWhitelists::default()
        };
        assert_eq!(whitelists.for_field(FieldKind::Quarter), "0123456789QOTHRSTNDEV");
        // Untouched fields keep their defaults.
        assert_eq!(whitelists.for_field(FieldKind::Score2), "0123456789");
    }
}
