//! Group-level aggregation over runs.
//!
//! * [`run::run_aggregates`]: per run, the across-channel mean of every
//!   anatomical group and the Welch PSD of the group's member channels.
//! * [`window::window_aggregates`]: event-locked windows pooled over all runs,
//!   reduced to a trial-then-channel mean (optionally a std) per group, with
//!   the PSD of the trial-averaged window.
//!
//! Both return one [`ModalityAggregates`] per modality, indexed by
//! [`AnatomicalGroup`] in canonical order.
use std::collections::BTreeMap;
use ndarray::Array1;

use crate::groups::{AnatomicalGroup, GroupMembership, Modality};
use crate::spectral::Spectrum;

pub mod run;
pub mod window;

pub use run::{run_aggregates, RunAggregate, RunAggregates};
pub use window::{window_aggregates, WindowAggregates, WindowRequest};

/// Aggregate series of one anatomical group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAggregate {
    /// Across-channel mean, in the modality's unit.
    pub mean: Array1<f64>,
    /// Channel mean of the per-channel across-trial std (window aggregates only).
    pub std:  Option<Array1<f64>>,
    /// One PSD row per member channel.
    pub psd:  Spectrum,
}

/// Group aggregates of one modality.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalityAggregates {
    pub modality: Modality,
    pub groups:   BTreeMap<AnatomicalGroup, GroupAggregate>,
}

impl ModalityAggregates {
    pub(crate) fn new(modality: Modality) -> Self {
        Self { modality, groups: BTreeMap::new() }
    }

    pub fn get(&self, group: AnatomicalGroup) -> Option<&GroupAggregate> {
        self.groups.get(&group)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnatomicalGroup, &GroupAggregate)> + '_ {
        self.groups.iter().map(|(&g, a)| (g, a))
    }
}

/// Check a membership table before aggregating with it.
///
/// # Panics
///
/// If `groups` belongs to another modality or any group has no channels.
pub(crate) fn assert_complete(groups: &GroupMembership, modality: Modality) {
    assert_eq!(groups.modality(), modality, "{modality} aggregation given a {} group table", groups.modality());
    for group in AnatomicalGroup::ALL {
        assert!(!groups.channels(group).is_empty(), "{modality} group {group} has no channels");
    }
}
