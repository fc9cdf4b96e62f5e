//! # meeg: event-locked averages and spectra over EEG/MEG runs
//!
//! `meeg` is the analytical core of a face-recognition EEG/MEG explorer. It
//! reads processed runs straight from FIFF files (no MNE needed), extracts the
//! stimulus events from their annotations, and reduces the channels of five
//! anatomical groups to time series and Welch spectra.
//!
//! ## Pipeline overview
//!
//! ```text
//! subject{S}/run{R}/processed*.fif
//!   │
//!   ├─ dataset::Dataset          full-rate + downsampled run pair
//!   ├─ events::extract_events    annotations → (sample, Famous|Scrambled|Unfamiliar)
//!   │
//!   ├─ aggregate::run            per run, per group:  channel mean + per-channel PSD
//!   │                            (downsampled runs, cheap overview)
//!   │
//!   └─ aggregate::window         windows [e − pre, e + post] pooled over runs
//!        ├─ baseline correct      per-window per-channel pre-stimulus mean removed
//!        ├─ trial mean → channel mean   (+ optional std)
//!        └─ Welch PSD of the trial-averaged window
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use meeg::{Dataset, ExplorerConfig, Modality, Session, SubjectData};
//!
//! let cfg  = ExplorerConfig::default();
//! let data = Dataset::new(&cfg.data_root);
//! let meta = SubjectData::load(data.subject_data_path()).unwrap();
//!
//! let eeg = meta.channel_group_membership(Modality::Eeg).unwrap();
//! let meg = meta.channel_group_membership(Modality::Meg).unwrap();
//! let mut session =
//!     Session::open(&data, 1, &[1, 2, 3], eeg, meg, cfg.window_request().unwrap()).unwrap();
//!
//! for (group, agg) in session.window_aggregates().unwrap().eeg.iter() {
//!     println!("{group}: {} samples, {} PSD rows", agg.mean.len(), agg.psd.n_rows());
//! }
//! ```
//!
//! ## Errors
//!
//! Fallible functions return [`anyhow::Result`]. Conditions worth branching on
//! are carried as an [`ExplorerError`]; see [`error`].

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod events;
pub mod fiff;
pub mod groups;
pub mod io;
pub mod metadata;
pub mod recording;
pub mod session;
pub mod spectral;
pub mod window;

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use aggregate::{
    run_aggregates, window_aggregates,
    GroupAggregate, ModalityAggregates,
    RunAggregate, RunAggregates,
    WindowAggregates, WindowRequest,
};
pub use config::ExplorerConfig;
pub use dataset::{Dataset, RunPair};
pub use error::{kind_of, ExplorerError};
pub use events::{bad_spans, extract_events, Event, EventSelection, EventType};
pub use groups::{AnatomicalGroup, GroupMembership, Modality};
pub use io::{write_run_aggregates, write_window_aggregates, StWriter};
pub use metadata::{Handedness, Sex, Subject, SubjectData};
pub use recording::{Channel, Recording};
pub use session::{Session, WindowCache};
pub use spectral::{welch, Spectrum};
pub use window::{cut_windows, Baseline, WindowMargins, Windows};
