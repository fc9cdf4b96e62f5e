//! Explorer configuration.
//!
//! [`ExplorerConfig`] collects the tunable parameters of a session: where the
//! processed dataset lives and how event-locked windows are cut and reduced.
use std::path::PathBuf;
use anyhow::Result;

use crate::aggregate::WindowRequest;
use crate::events::EventSelection;
use crate::window::{Baseline, WindowMargins};

/// Configuration for dataset access and window aggregation.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use meeg::ExplorerConfig;
///
/// let cfg = ExplorerConfig {
///     pre:      0.2,    // 200 ms before the stimulus
///     with_std: true,
///     ..ExplorerConfig::default()
/// };
/// assert_eq!(cfg.margins().unwrap().window_len(100.0), 71);
/// ```
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// Directory holding `subject_data.json` and the `subject{S}/run{R}` folders.
    ///
    /// Default: `data/processed`.
    pub data_root: PathBuf,

    /// Window extent before the event, in seconds. Must lie in `(0, 1.5]`:
    /// the inter-stimulus interval is 1.7 s, so 1.5 s keeps neighbouring
    /// stimuli out of the window.
    ///
    /// Default: `0.5` s.
    pub pre: f64,

    /// Window extent after the event, in seconds, in `(0, 1.5]`.
    ///
    /// Default: `0.5` s.
    pub post: f64,

    /// Event types admitted into window aggregates.
    ///
    /// Default: all of them.
    pub selection: EventSelection,

    /// Per-window baseline correction.
    ///
    /// Default: [`Baseline::PreStimulus`], MNE's `baseline=(None, 0)`.
    pub baseline: Baseline,

    /// Also compute the across-trial standard deviation of window aggregates.
    ///
    /// Default: `false`.
    pub with_std: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data/processed"),
            pre: 0.5,
            post: 0.5,
            selection: EventSelection::all(),
            baseline: Baseline::PreStimulus,
            with_std: false,
        }
    }
}

impl ExplorerConfig {
    /// Validated window margins.
    pub fn margins(&self) -> Result<WindowMargins> {
        WindowMargins::new(self.pre, self.post)
    }

    /// Window request built from this configuration.
    pub fn window_request(&self) -> Result<WindowRequest> {
        Ok(WindowRequest {
            selection: self.selection.clone(),
            margins: self.margins()?,
            baseline: self.baseline,
            with_std: self.with_std,
        })
    }
}
