//! Per-frame error taxonomy.
//!
//! Every variant here is contained by the frame pipeline: a failing frame
//! renders the failure marker and the stream moves on. Only construction-time
//! problems (bad config, missing coefficient columns, missing font) are
//! fatal, and those stay `anyhow::Error` at the constructor boundary.

use thiserror::Error;

use crate::ocr::FieldKind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    /// The scaled crop for a field has zero area or falls outside the frame.
    /// Swallowed into an empty reading during extraction; recognition
    /// backend failures never get a variant at all because the recognizer
    /// contract already reduces them to the empty string.
    #[error("{0} region is empty after scaling to the frame")]
    EmptyRegion(FieldKind),

    /// The clock consensus text matches none of the clock formats.
    #[error("clock text {0:?} matches no known clock format")]
    UnparsableClock(String),

    /// A score consensus text is not purely numeric.
    #[error("{field} consensus {value:?} is not a number")]
    NonNumericScore { field: FieldKind, value: String },

    /// No coefficient interval covers the queried game time.
    #[error("no model coefficients cover t={0}s")]
    ModelUnavailable(i64),
}
