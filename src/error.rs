//! Error types
//!
//! The taxonomy is narrow: per-tick simulation code is total and never
//! returns these. They surface at startup, configuration load, and the
//! audio boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    /// The host page has no element to render into
    #[error("render target not found: #{id}")]
    MissingRenderTarget { id: String },

    #[error("invalid tuning JSON: {0}")]
    InvalidTuning(#[from] serde_json::Error),

    #[error("tuning value out of range: {0}")]
    TuningOutOfRange(String),

    /// Browser refused to start audio playback (autoplay policy)
    #[error("audio playback rejected: {0}")]
    AudioRejected(String),
}
