//! Event-locked windowing.
//!
//! Cuts a fixed-length window around each event of a continuous [C, T]
//! matrix and applies per-channel baseline correction to each kept window.
//! A window is rejected when it runs past either end of the data or overlaps
//! a `BAD*` annotation span.
//!
//! With `pre`/`post` margins in seconds the window of an event at sample `e`
//! covers `[e − round(pre·sfreq), e − round(pre·sfreq) + n)` where
//! `n = round((pre + post)·sfreq) + 1`.
use std::ops::Range;
use anyhow::Result;
use ndarray::{s, Array1, Array3, ArrayView2, Axis};

use crate::error::ExplorerError;
use crate::events::Event;

/// Largest admissible margin on either side of the event, in seconds.
pub const MAX_MARGIN_SECS: f64 = 1.5;

/// Pre/post-stimulus extent of a window, both strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowMargins {
    pre:  f64,
    post: f64,
}

impl Default for WindowMargins {
    /// 0.5 s before and after the stimulus.
    fn default() -> Self {
        Self { pre: 0.5, post: 0.5 }
    }
}

impl WindowMargins {
    /// `pre` and `post` are magnitudes in seconds, each in `(0, 1.5]`.
    pub fn new(pre: f64, post: f64) -> Result<Self> {
        let ok = |v: f64| v > 0.0 && v <= MAX_MARGIN_SECS;
        if !ok(pre) || !ok(post) {
            return Err(ExplorerError::Parameter(format!(
                "window margins pre={pre} s, post={post} s outside (0, {MAX_MARGIN_SECS}]"
            ))
            .into());
        }
        Ok(Self { pre, post })
    }

    /// Signed form: `tmin ∈ [−1.5, 0)`, `tmax ∈ (0, 1.5]`.
    pub fn from_tmin_tmax(tmin: f64, tmax: f64) -> Result<Self> {
        Self::new(-tmin, tmax)
    }

    pub fn pre(&self) -> f64 {
        self.pre
    }

    pub fn post(&self) -> f64 {
        self.post
    }

    /// Samples before the event: `round(pre·sfreq)`.
    pub fn pre_samples(&self, sfreq: f64) -> usize {
        (self.pre * sfreq).round() as usize
    }

    /// `round((pre + post)·sfreq) + 1`.
    pub fn window_len(&self, sfreq: f64) -> usize {
        ((self.pre + self.post) * sfreq).round() as usize + 1
    }

    /// Time of each window sample relative to the event, in seconds.
    pub fn times(&self, sfreq: f64) -> Array1<f64> {
        let pre = self.pre_samples(sfreq) as f64;
        Array1::from_shape_fn(self.window_len(sfreq), |k| (k as f64 - pre) / sfreq)
    }
}

/// Per-window baseline correction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Baseline {
    /// Keep the samples as cut.
    None,
    /// Subtract each channel's mean over `tmin..=0`.
    #[default]
    PreStimulus,
}

/// Windows cut from one recording.
#[derive(Debug, Clone)]
pub struct Windows {
    /// `[n_windows, n_channels, window_len]`.
    pub data:     Array3<f64>,
    /// Events that produced a window, in window order.
    pub events:   Vec<Event>,
    /// Events whose window did not fit inside the data or touched a bad span.
    pub rejected: usize,
}

impl Windows {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Cut one window per event out of `data` ([C, T]).
///
/// `bad` holds spans in seconds from column 0; a window `[start, start + n)`
/// is dropped when `span.start < (start + n) / sfreq` and
/// `span.end > start / sfreq`.
pub fn cut_windows(
    data: ArrayView2<f64>,
    events: &[Event],
    bad: &[Range<f64>],
    margins: WindowMargins,
    sfreq: f64,
    baseline: Baseline,
) -> Windows {
    let (n_ch, n_t) = data.dim();
    let pre = margins.pre_samples(sfreq);
    let n = margins.window_len(sfreq);

    let (mut at_edge, mut in_bad) = (0, 0);
    let mut starts: Vec<(usize, Event)> = Vec::with_capacity(events.len());
    for ev in events {
        let Some(start) = ev.sample.checked_sub(pre).filter(|s| s + n <= n_t) else {
            at_edge += 1;
            continue;
        };
        let (t0, t1) = (start as f64 / sfreq, (start + n) as f64 / sfreq);
        if bad.iter().any(|b| b.start < t1 && b.end > t0) {
            in_bad += 1;
            continue;
        }
        starts.push((start, *ev));
    }
    if at_edge > 0 {
        log::warn!("{at_edge} of {} windows run past the recording and were dropped", events.len());
    }
    if in_bad > 0 {
        log::warn!("{in_bad} of {} windows overlap a bad span and were dropped", events.len());
    }
    let rejected = at_edge + in_bad;

    let mut out = Array3::<f64>::zeros((starts.len(), n_ch, n));
    for (w, &(start, _)) in starts.iter().enumerate() {
        out.slice_mut(s![w, .., ..])
            .assign(&data.slice(s![.., start..start + n]));
    }

    if baseline == Baseline::PreStimulus {
        baseline_correct_inplace(&mut out, pre.min(n - 1));
    }

    Windows {
        data: out,
        events: starts.into_iter().map(|(_, ev)| ev).collect(),
        rejected,
    }
}

/// `windows[w, c, :] -= mean(windows[w, c, 0..=last])`.
pub fn baseline_correct_inplace(windows: &mut Array3<f64>, last: usize) {
    for mut window in windows.axis_iter_mut(Axis(0)) {
        for mut ch in window.axis_iter_mut(Axis(0)) {
            let m = ch.slice(s![..=last]).mean().unwrap_or(0.0);
            ch.mapv_inplace(|v| v - m);
        }
    }
}
