//! Classified failures.
//!
//! Public functions return [`anyhow::Result`]; the conditions a caller may want
//! to branch on are raised as an [`ExplorerError`] inside the `anyhow::Error`
//! and can be recovered with `err.downcast_ref::<ExplorerError>()`.
//!
//! An anatomical group without channels is not listed here: it is a fatal
//! configuration error and panics where group maps are built or consumed.
use std::path::PathBuf;
use thiserror::Error;

use crate::groups::Modality;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExplorerError {
    /// The subject/run does not resolve to a readable recording.
    #[error("subject {subject} run {run}: {} not found", path.display())]
    NotFound { subject: u32, run: u32, path: PathBuf },

    /// An argument outside its admissible range.
    #[error("invalid parameter: {0}")]
    Parameter(String),

    /// No event of the selected types produced a window in any run.
    #[error("no windows match the selected event types")]
    EmptySelection,

    #[error("channel {0} is not present in the recording")]
    MissingChannel(String),

    /// A channel picked into a modality's groups is not of that modality.
    #[error("channel {channel} cannot be expressed as {expected}")]
    UnitMismatch { channel: String, expected: Modality },

    #[error("sampling rate mismatch: expected {expected} Hz, found {found} Hz")]
    SamplingRateMismatch { expected: f64, found: f64 },

    /// Full-rate and downsampled annotation timelines disagree.
    #[error("annotation timelines disagree: {0}")]
    TimelineMismatch(String),
}

/// Classify an `anyhow` error, if it carries an [`ExplorerError`].
pub fn kind_of(err: &anyhow::Error) -> Option<&ExplorerError> {
    err.downcast_ref::<ExplorerError>()
}
