//! Per-run group time series and spectra.
use anyhow::{Context, Result};
use ndarray::Axis;

use super::{assert_complete, GroupAggregate, ModalityAggregates};
use crate::events::{extract_events, Event};
use crate::groups::{GroupMembership, Modality};
use crate::recording::Recording;
use crate::spectral::welch;

/// Aggregates of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunAggregate {
    pub sfreq:  f64,
    pub eeg:    ModalityAggregates,
    pub meg:    ModalityAggregates,
    /// Every known event of the run.
    pub events: Vec<Event>,
}

impl RunAggregate {
    pub fn modality(&self, modality: Modality) -> &ModalityAggregates {
        match modality {
            Modality::Eeg => &self.eeg,
            Modality::Meg => &self.meg,
        }
    }
}

/// One [`RunAggregate`] per input recording, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct RunAggregates {
    pub runs: Vec<RunAggregate>,
}

impl RunAggregates {
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Group means and PSDs for each modality of `rec`.
///
/// The mean is taken across the group's channels; the PSD is estimated from
/// the per-channel matrix before that mean, one row per channel.
fn modality_aggregates(rec: &Recording, groups: &GroupMembership) -> Result<ModalityAggregates> {
    let modality = groups.modality();
    let mut out = ModalityAggregates::new(modality);
    for (group, channels) in groups.iter() {
        let data = rec
            .get_data(channels, modality)
            .with_context(|| format!("{modality} {group}"))?;
        let psd = welch(data.view(), rec.sfreq)?;
        let mean = data
            .mean_axis(Axis(0))
            .with_context(|| format!("{modality} {group}: no channels"))?;
        log::debug!("{modality} {group}: {} ch, {} samples", channels.len(), mean.len());
        out.groups.insert(group, GroupAggregate { mean, std: None, psd });
    }
    Ok(out)
}

/// Aggregate each recording independently.
///
/// # Panics
///
/// If either membership table has an empty group or the wrong modality.
pub fn run_aggregates(
    recordings: &[Recording],
    eeg_groups: &GroupMembership,
    meg_groups: &GroupMembership,
) -> Result<RunAggregates> {
    assert_complete(eeg_groups, Modality::Eeg);
    assert_complete(meg_groups, Modality::Meg);

    let runs = recordings
        .iter()
        .enumerate()
        .map(|(i, rec)| -> Result<RunAggregate> {
            let eeg = modality_aggregates(rec, eeg_groups).with_context(|| format!("run {i}"))?;
            let meg = modality_aggregates(rec, meg_groups).with_context(|| format!("run {i}"))?;
            Ok(RunAggregate { sfreq: rec.sfreq, eeg, meg, events: extract_events(rec, None) })
        })
        .collect::<Result<Vec<_>>>()?;

    log::info!("aggregated {} runs", runs.len());
    Ok(RunAggregates { runs })
}
