//! Event-locked grand averages pooled across runs.
use std::ops::Range;
use anyhow::{Context, Result};
use ndarray::{concatenate, s, Array1, Array2, Array3, Axis};

use super::{assert_complete, GroupAggregate, ModalityAggregates};
use crate::error::ExplorerError;
use crate::events::{bad_spans, extract_events, EventSelection};
use crate::groups::{AnatomicalGroup, GroupMembership, Modality};
use crate::recording::Recording;
use crate::spectral::welch;
use crate::window::{cut_windows, Baseline, WindowMargins};

/// Parameters of a window aggregation.
///
/// ```
/// use meeg::{EventSelection, EventType, WindowMargins, WindowRequest};
///
/// let req = WindowRequest {
///     selection: EventSelection::from_types([EventType::Famous]),
///     margins:   WindowMargins::new(0.2, 0.6).unwrap(),
///     with_std:  true,
///     ..WindowRequest::default()
/// };
/// assert_eq!(req.margins.window_len(1100.0), 881);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WindowRequest {
    pub selection: EventSelection,
    pub margins:   WindowMargins,
    pub baseline:  Baseline,
    /// Also compute the across-trial standard deviation.
    pub with_std:  bool,
}

impl Default for WindowRequest {
    fn default() -> Self {
        Self {
            selection: EventSelection::all(),
            margins: WindowMargins::default(),
            baseline: Baseline::default(),
            with_std: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowAggregates {
    pub sfreq:      f64,
    /// Windows pooled across all runs.
    pub n_windows:  usize,
    /// Windows contributed by each run, in input order.
    pub per_run:    Vec<usize>,
    pub window_len: usize,
    /// Seconds relative to the event, one per window sample.
    pub times:      Array1<f64>,
    pub eeg:        ModalityAggregates,
    pub meg:        ModalityAggregates,
}

impl WindowAggregates {
    pub fn modality(&self, modality: Modality) -> &ModalityAggregates {
        match modality {
            Modality::Eeg => &self.eeg,
            Modality::Meg => &self.meg,
        }
    }
}

/// Rows of the stacked EEG + MEG matrix owned by each group.
struct RowLayout {
    names: Vec<(Modality, Vec<String>)>,
    rows:  Vec<(Modality, AnatomicalGroup, Range<usize>)>,
}

impl RowLayout {
    fn new(tables: [&GroupMembership; 2]) -> Self {
        let mut names = Vec::new();
        let mut rows = Vec::new();
        let mut at = 0;
        for table in tables {
            let mut picked = Vec::with_capacity(table.n_channels());
            for (group, channels) in table.iter() {
                rows.push((table.modality(), group, at..at + channels.len()));
                at += channels.len();
                picked.extend(channels.iter().cloned());
            }
            names.push((table.modality(), picked));
        }
        Self { names, rows }
    }

    /// Unit-scaled `[rows, n_times]` matrix of `rec`.
    fn stack(&self, rec: &Recording) -> Result<Array2<f64>> {
        let parts = self
            .names
            .iter()
            .map(|(modality, names)| rec.get_data(names, *modality))
            .collect::<Result<Vec<_>>>()?;
        let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
        Ok(concatenate(Axis(0), &views)?)
    }
}

/// Pool the selected windows of every recording and reduce them per group.
///
/// Fails with [`ExplorerError::EmptySelection`] when no window survives,
/// and with [`ExplorerError::SamplingRateMismatch`] when the recordings do
/// not share one sampling rate.
///
/// # Panics
///
/// If either membership table has an empty group or the wrong modality.
pub fn window_aggregates(
    recordings: &[Recording],
    request: &WindowRequest,
    eeg_groups: &GroupMembership,
    meg_groups: &GroupMembership,
) -> Result<WindowAggregates> {
    assert_complete(eeg_groups, Modality::Eeg);
    assert_complete(meg_groups, Modality::Meg);

    let Some(sfreq) = recordings.first().map(|r| r.sfreq) else {
        return Err(ExplorerError::EmptySelection.into());
    };
    if let Some(other) = recordings.iter().find(|r| (r.sfreq - sfreq).abs() > 1e-9 * sfreq) {
        return Err(ExplorerError::SamplingRateMismatch { expected: sfreq, found: other.sfreq }.into());
    }

    let layout = RowLayout::new([eeg_groups, meg_groups]);
    let margins = request.margins;

    let mut pool: Vec<Array3<f64>> = Vec::with_capacity(recordings.len());
    let mut per_run = Vec::with_capacity(recordings.len());
    for (i, rec) in recordings.iter().enumerate() {
        let events = extract_events(rec, Some(&request.selection));
        let data = layout.stack(rec).with_context(|| format!("run {i}"))?;
        let bad = bad_spans(rec);
        let windows = cut_windows(data.view(), &events, &bad, margins, sfreq, request.baseline);
        log::debug!(
            "run {i}: {} of {} events windowed, {} bad spans",
            windows.len(), events.len(), bad.len()
        );
        per_run.push(windows.len());
        pool.push(windows.data);
    }

    let n_windows: usize = per_run.iter().sum();
    if n_windows == 0 {
        return Err(ExplorerError::EmptySelection.into());
    }
    let views: Vec<_> = pool.iter().map(|w| w.view()).collect();
    let pooled = concatenate(Axis(0), &views)?;

    // [rows, window_len]
    let trial_mean = pooled
        .mean_axis(Axis(0))
        .ok_or(ExplorerError::EmptySelection)?;
    let trial_std = request.with_std.then(|| pooled.std_axis(Axis(0), 0.0));

    let mut eeg = ModalityAggregates::new(Modality::Eeg);
    let mut meg = ModalityAggregates::new(Modality::Meg);
    for (modality, group, range) in &layout.rows {
        let rows = trial_mean.slice(s![range.clone(), ..]);
        let mean = rows
            .mean_axis(Axis(0))
            .with_context(|| format!("{modality} {group}: no channels"))?;
        let std = match &trial_std {
            Some(sd) => sd.slice(s![range.clone(), ..]).mean_axis(Axis(0)),
            None => None,
        };
        let psd = welch(rows, sfreq)?;
        let target = match modality {
            Modality::Eeg => &mut eeg,
            Modality::Meg => &mut meg,
        };
        target.groups.insert(*group, GroupAggregate { mean, std, psd });
    }

    log::info!(
        "pooled {n_windows} windows of {} samples from {} runs",
        margins.window_len(sfreq), recordings.len()
    );
    Ok(WindowAggregates {
        sfreq,
        n_windows,
        per_run,
        window_len: margins.window_len(sfreq),
        times: margins.times(sfreq),
        eeg,
        meg,
    })
}
