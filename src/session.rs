//! Per-user exploration state.
//!
//! A [`Session`] owns the recordings of one subject, the run aggregates
//! computed from their downsampled versions, and a [`WindowCache`] over the
//! full-rate versions. Changing the margins or the event selection drops the
//! cached window aggregates; the next access recomputes them.
use anyhow::{Context, Result};

use crate::aggregate::{run_aggregates, window_aggregates, RunAggregates, WindowAggregates, WindowRequest};
use crate::dataset::{Dataset, RunPair};
use crate::events::EventSelection;
use crate::groups::GroupMembership;
use crate::recording::Recording;
use crate::window::{Baseline, WindowMargins};

/// Window aggregates for the current request, computed on first access.
#[derive(Debug, Clone, Default)]
pub struct WindowCache {
    request: WindowRequest,
    value:   Option<WindowAggregates>,
}

impl WindowCache {
    pub fn new(request: WindowRequest) -> Self {
        Self { request, value: None }
    }

    pub fn request(&self) -> &WindowRequest {
        &self.request
    }

    pub fn is_computed(&self) -> bool {
        self.value.is_some()
    }

    pub fn invalidate(&mut self) {
        self.value = None;
    }

    /// Returns whether the request changed.
    pub fn set_margins(&mut self, margins: WindowMargins) -> bool {
        self.update(|r| &mut r.margins, margins)
    }

    pub fn set_selection(&mut self, selection: EventSelection) -> bool {
        self.update(|r| &mut r.selection, selection)
    }

    pub fn set_baseline(&mut self, baseline: Baseline) -> bool {
        self.update(|r| &mut r.baseline, baseline)
    }

    pub fn set_with_std(&mut self, with_std: bool) -> bool {
        self.update(|r| &mut r.with_std, with_std)
    }

    fn update<T: PartialEq>(&mut self, field: impl FnOnce(&mut WindowRequest) -> &mut T, value: T) -> bool {
        let slot = field(&mut self.request);
        if *slot == value {
            return false;
        }
        *slot = value;
        self.invalidate();
        true
    }

    /// The cached value, or `compute(request)` stored and returned.
    pub fn get_or_compute<F>(&mut self, compute: F) -> Result<&WindowAggregates>
    where
        F: FnOnce(&WindowRequest) -> Result<WindowAggregates>,
    {
        let value = match self.value.take() {
            Some(v) => v,
            None => compute(&self.request)?,
        };
        Ok(self.value.insert(value))
    }
}

pub struct Session {
    subject:     Option<u32>,
    runs:        Vec<u32>,
    eeg_groups:  GroupMembership,
    meg_groups:  GroupMembership,
    full:        Vec<Recording>,
    downsampled: Vec<Recording>,
    overview:    RunAggregates,
    cache:       WindowCache,
}

impl Session {
    /// Load `runs` of `subject` and aggregate their downsampled versions.
    pub fn open(
        dataset: &Dataset,
        subject: u32,
        runs: &[u32],
        eeg_groups: GroupMembership,
        meg_groups: GroupMembership,
        request: WindowRequest,
    ) -> Result<Self> {
        let pairs = dataset.read_runs(subject, runs)?;
        let mut session = Self::from_pairs(pairs, eeg_groups, meg_groups, request)?;
        session.subject = Some(subject);
        Ok(session)
    }

    /// Session over already loaded runs.
    pub fn from_pairs(
        pairs: Vec<RunPair>,
        eeg_groups: GroupMembership,
        meg_groups: GroupMembership,
        request: WindowRequest,
    ) -> Result<Self> {
        let runs = pairs.iter().map(|p| p.run).collect();
        let (full, downsampled): (Vec<_>, Vec<_>) =
            pairs.into_iter().map(|p| (p.full, p.downsampled)).unzip();
        let overview = run_aggregates(&downsampled, &eeg_groups, &meg_groups)
            .context("run aggregates")?;
        Ok(Self {
            subject: None,
            runs,
            eeg_groups,
            meg_groups,
            full,
            downsampled,
            overview,
            cache: WindowCache::new(request),
        })
    }

    pub fn subject(&self) -> Option<u32> {
        self.subject
    }

    pub fn runs(&self) -> &[u32] {
        &self.runs
    }

    pub fn full(&self) -> &[Recording] {
        &self.full
    }

    pub fn downsampled(&self) -> &[Recording] {
        &self.downsampled
    }

    pub fn run_aggregates(&self) -> &RunAggregates {
        &self.overview
    }

    pub fn cache(&self) -> &WindowCache {
        &self.cache
    }

    pub fn set_margins(&mut self, margins: WindowMargins) -> bool {
        self.cache.set_margins(margins)
    }

    pub fn set_selection(&mut self, selection: EventSelection) -> bool {
        self.cache.set_selection(selection)
    }

    pub fn set_baseline(&mut self, baseline: Baseline) -> bool {
        self.cache.set_baseline(baseline)
    }

    pub fn set_with_std(&mut self, with_std: bool) -> bool {
        self.cache.set_with_std(with_std)
    }

    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Window aggregates of the full-rate runs for the current request.
    pub fn window_aggregates(&mut self) -> Result<&WindowAggregates> {
        let (full, eeg, meg) = (&self.full, &self.eeg_groups, &self.meg_groups);
        self.cache.get_or_compute(|req| window_aggregates(full, req, eeg, meg))
    }
}
