//! On-disk layout of the processed dataset.
//!
//! ```text
//! <root>/subject_data.json
//! <root>/subject{S}/run{R}/processed.fif
//! <root>/subject{S}/run{R}/processed_annotations.fif
//! <root>/subject{S}/run{R}/processed_downsampled.fif
//! <root>/subject{S}/run{R}/processed_downsampled_annotations.fif
//! ```
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

use crate::error::ExplorerError;
use crate::fiff::Annotations;
use crate::recording::Recording;

pub const SUBJECT_DATA_FILE: &str = "subject_data.json";

/// Full-rate and downsampled versions of one run.
#[derive(Debug, Clone)]
pub struct RunPair {
    pub subject:     u32,
    pub run:         u32,
    pub full:        Recording,
    pub downsampled: Recording,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    root: PathBuf,
}

impl Dataset {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn subject_data_path(&self) -> PathBuf {
        self.root.join(SUBJECT_DATA_FILE)
    }

    pub fn run_dir(&self, subject: u32, run: u32) -> PathBuf {
        self.root.join(format!("subject{subject}")).join(format!("run{run}"))
    }

    /// Load both versions of a run and check that their timelines agree.
    pub fn read_recording(&self, subject: u32, run: u32) -> Result<RunPair> {
        let dir = self.run_dir(subject, run);
        let not_found = |path: PathBuf| ExplorerError::NotFound { subject, run, path };
        if !dir.is_dir() {
            return Err(not_found(dir).into());
        }

        let load = |stem: &str| -> Result<Recording> {
            let raw = dir.join(format!("{stem}.fif"));
            if !raw.is_file() {
                return Err(not_found(raw).into());
            }
            let sidecar = dir.join(format!("{stem}_annotations.fif"));
            let sidecar = sidecar.is_file().then_some(sidecar);
            if sidecar.is_none() {
                log::debug!("{}: no annotation sidecar, using embedded annotations", raw.display());
            }
            Recording::load(&raw, sidecar.as_deref())
        };

        let full = load("processed")?;
        let downsampled = load("processed_downsampled")?;
        check_timelines(&full.annotations, &downsampled.annotations, downsampled.sfreq)
            .with_context(|| format!("subject {subject} run {run}"))?;

        log::info!(
            "subject {subject} run {run}: {} Hz / {} Hz, {} annotations",
            full.sfreq, downsampled.sfreq, full.annotations.len()
        );
        Ok(RunPair { subject, run, full, downsampled })
    }

    /// Load several runs of one subject, in the given order.
    pub fn read_runs(&self, subject: u32, runs: &[u32]) -> Result<Vec<RunPair>> {
        runs.iter().map(|&run| self.read_recording(subject, run)).collect()
    }
}

/// Same markers in the same order, onsets within one downsampled period.
fn check_timelines(full: &Annotations, down: &Annotations, down_sfreq: f64) -> Result<()> {
    let mismatch = |msg: String| -> anyhow::Error { ExplorerError::TimelineMismatch(msg).into() };
    if full.len() != down.len() {
        return Err(mismatch(format!("{} vs {} annotations", full.len(), down.len())));
    }
    let tol = 1.0 / down_sfreq;
    for (i, ((fo, _, fd), (dn, _, dd))) in full.iter().zip(down.iter()).enumerate() {
        if fd != dd {
            return Err(mismatch(format!("annotation {i}: {fd:?} vs {dd:?}")));
        }
        if (fo - dn).abs() > tol {
            return Err(mismatch(format!("annotation {i}: onset {fo} s vs {dn} s")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann(items: &[(f64, &str)]) -> Annotations {
        let mut a = Annotations::new(None);
        for &(o, d) in items {
            a.push(o, 0.8, d);
        }
        a
    }

    #[test]
    fn timelines_within_one_period_agree() {
        let full = ann(&[(1.0, "Famous"), (2.7, "Scrambled")]);
        let down = ann(&[(1.01, "Famous"), (2.69, "Scrambled")]);
        assert!(check_timelines(&full, &down, 45.0).is_ok());
    }

    #[test]
    fn timelines_disagreeing_are_rejected() {
        let full = ann(&[(1.0, "Famous"), (2.7, "Scrambled")]);
        for down in [
            ann(&[(1.0, "Famous")]),
            ann(&[(1.0, "Famous"), (2.7, "Unfamiliar")]),
            ann(&[(1.0, "Famous"), (3.7, "Scrambled")]),
        ] {
            let err = check_timelines(&full, &down, 45.0).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ExplorerError>(),
                Some(ExplorerError::TimelineMismatch(_))
            ));
        }
    }

    #[test]
    fn missing_run_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Dataset::new(dir.path()).read_recording(3, 2).unwrap_err();
        match err.downcast_ref::<ExplorerError>() {
            Some(ExplorerError::NotFound { subject, run, path }) => {
                assert_eq!((*subject, *run), (3, 2));
                assert!(path.ends_with("subject3/run2"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
