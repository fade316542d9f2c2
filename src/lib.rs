//! Broadcast scoreboard OCR and live win probability overlay.
//!
//! Given a stream of broadcast basketball frames, the pipeline reads the
//! on-screen scoreboard (both scores, game clock, quarter) with OCR,
//! smooths the noisy per-frame readings with sliding-window majority
//! votes, rebuilds the live game state, scores it with a pretrained
//! piecewise logistic model, and draws the win probability onto the
//! frame. A frame that cannot be read draws a failure marker instead; the
//! stream itself never stops.
//!
//! Video decode/encode, player detection, and everything else around the
//! scoreboard are the caller's problem: the input here is an ordered
//! sequence of `image::RgbImage` frames for one stream.

pub mod config;
pub mod consensus;
pub mod error;
pub mod model;
pub mod ocr;
pub mod overlay;
pub mod pipeline;
pub mod roi;
pub mod text;

pub use config::{BackendKind, PipelineConfig};
pub use consensus::ConsensusBuffer;
pub use error::FrameError;
pub use model::{CoefficientRow, WinProbabilityModel};
pub use ocr::FieldWhitelists;
pub use overlay::OverlayRenderer;
pub use pipeline::{FrameOutcome, FramePipeline, GameSnapshot, GameState};
pub use roi::{RegionRect, RegionSet};
pub use text::Quarter;
