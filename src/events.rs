//! Stimulus events from the annotation timeline.
//!
//! Descriptions map onto a fixed id table, independent of which types a given
//! file happens to contain:
//!
//! | description    | id |
//! |----------------|----|
//! | `"Famous"`     | 1  |
//! | `"Scrambled"`  | 2  |
//! | `"Unfamiliar"` | 3  |
//!
//! Any other description (`"BAD_*"`, `"EDGE"`, responses, …) is ignored.
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use anyhow::Result;

use crate::error::ExplorerError;
use crate::recording::Recording;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    Famous,
    Scrambled,
    Unfamiliar,
}

impl EventType {
    pub const ALL: [EventType; 3] = [EventType::Famous, EventType::Scrambled, EventType::Unfamiliar];

    pub fn id(self) -> u8 {
        match self {
            EventType::Famous     => 1,
            EventType::Scrambled  => 2,
            EventType::Unfamiliar => 3,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        EventType::ALL.into_iter().find(|t| t.id() == id)
    }

    pub fn label(self) -> &'static str {
        match self {
            EventType::Famous     => "Famous",
            EventType::Scrambled  => "Scrambled",
            EventType::Unfamiliar => "Unfamiliar",
        }
    }

    /// Exact match on the annotation description.
    pub fn from_description(desc: &str) -> Option<Self> {
        EventType::ALL.into_iter().find(|t| t.label() == desc)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EventType {
    type Err = anyhow::Error;

    /// Accepts the label (any case) or the numeric id.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let found = match s.parse::<u8>() {
            Ok(id) => EventType::from_id(id),
            Err(_) => EventType::ALL.into_iter().find(|t| t.label().eq_ignore_ascii_case(s)),
        };
        found.ok_or_else(|| ExplorerError::Parameter(format!("unknown event type {s:?}")).into())
    }
}

/// A stimulus onset: column index into the recording's data plus its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub sample: usize,
    pub kind:   EventType,
}

/// The set of admitted event types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSelection(BTreeSet<EventType>);

impl Default for EventSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl EventSelection {
    pub fn all() -> Self {
        Self(EventType::ALL.into_iter().collect())
    }

    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn from_types<I: IntoIterator<Item = EventType>>(types: I) -> Self {
        Self(types.into_iter().collect())
    }

    /// Build from numeric ids; any id outside the table is a parameter error.
    pub fn from_ids(ids: &[u8]) -> Result<Self> {
        let mut set = BTreeSet::new();
        for &id in ids {
            let t = EventType::from_id(id)
                .ok_or_else(|| ExplorerError::Parameter(format!("unknown event id {id}")))?;
            set.insert(t);
        }
        Ok(Self(set))
    }

    pub fn contains(&self, t: EventType) -> bool {
        self.0.contains(&t)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = EventType> + '_ {
        self.0.iter().copied()
    }
}

/// Seconds to add to an annotation onset to make it relative to column 0.
fn onset_offset(rec: &Recording) -> f64 {
    match rec.annotations.orig_time {
        Some(orig) => orig - rec.meas_date.unwrap_or(orig) - rec.first_time(),
        None => 0.0,
    }
}

/// Extent of every `BAD*` annotation (any case), in seconds from column 0.
///
/// Windows touching one of these are dropped by
/// [`cut_windows`](crate::window::cut_windows).
pub fn bad_spans(rec: &Recording) -> Vec<Range<f64>> {
    let offset = onset_offset(rec);
    rec.annotations
        .iter()
        .filter(|(_, _, desc)| desc.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("bad")))
        .map(|(onset, duration, _)| onset + offset..onset + offset + duration)
        .collect()
}

/// Events of the admitted types, in timeline order.
///
/// `None` admits every known type. Onsets that land outside the data matrix
/// are dropped.
pub fn extract_events(rec: &Recording, selection: Option<&EventSelection>) -> Vec<Event> {
    if selection.is_some_and(EventSelection::is_empty) {
        return Vec::new();
    }
    let offset = onset_offset(rec);
    let n_times = rec.n_times() as i64;

    let mut out = Vec::new();
    for (onset, _, desc) in rec.annotations.iter() {
        let Some(kind) = EventType::from_description(desc) else { continue };
        if selection.is_some_and(|s| !s.contains(kind)) {
            continue;
        }
        let idx = ((onset + offset) * rec.sfreq).round() as i64;
        if !(0..n_times).contains(&idx) {
            log::debug!("{kind} at {onset:.3} s falls outside the data, dropped");
            continue;
        }
        out.push(Event { sample: idx as usize, kind });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiff::Annotations;
    use crate::recording::Channel;
    use ndarray::Array2;

    fn rec_with(annotations: Annotations) -> Recording {
        Recording::new(100.0, vec![Channel::eeg("EEG001")], Array2::zeros((1, 1000)), annotations)
            .unwrap()
    }

    #[test]
    fn ids_are_fixed() {
        assert_eq!(EventType::Famous.id(), 1);
        assert_eq!(EventType::Scrambled.id(), 2);
        assert_eq!(EventType::Unfamiliar.id(), 3);
        assert_eq!(EventType::from_description("Scrambled"), Some(EventType::Scrambled));
        assert_eq!(EventType::from_description("BAD_ACQ_SKIP"), None);
    }

    #[test]
    fn from_ids_rejects_unknown() {
        let err = EventSelection::from_ids(&[1, 7]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExplorerError>(),
            Some(ExplorerError::Parameter(_))
        ));
        let sel = EventSelection::from_ids(&[3, 1]).unwrap();
        assert_eq!(sel.iter().collect::<Vec<_>>(), vec![EventType::Famous, EventType::Unfamiliar]);
    }

    #[test]
    fn bad_spans_follow_the_event_timeline() {
        let mut ann = Annotations::new(Some(1000.0));
        ann.push(2.0, 0.5, "BAD_ACQ_SKIP");
        ann.push(3.0, 0.0, "Famous");
        ann.push(4.0, 1.0, "bad blink");
        ann.push(5.0, 1.0, "EDGE boundary");
        let mut rec = rec_with(ann);
        rec.meas_date = Some(1000.0);
        rec.first_samp = 100;
        let spans = bad_spans(&rec);
        assert_eq!(spans.len(), 2);
        approx::assert_abs_diff_eq!(spans[0].start, 1.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(spans[0].end, 1.5, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(spans[1].start, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn orig_time_shifts_onsets() {
        let mut ann = Annotations::new(Some(1000.0));
        ann.push(2.5, 0.0, "Famous");
        let mut rec = rec_with(ann);
        rec.meas_date = Some(1000.0);
        rec.first_samp = 100; // 1 s at 100 Hz
        let ev = extract_events(&rec, None);
        assert_eq!(ev, vec![Event { sample: 150, kind: EventType::Famous }]);
    }

    #[test]
    fn out_of_range_onsets_dropped() {
        let mut ann = Annotations::new(None);
        ann.push(-0.5, 0.0, "Famous");
        ann.push(3.0, 0.0, "Famous");
        ann.push(20.0, 0.0, "Famous");
        let ev = extract_events(&rec_with(ann), None);
        assert_eq!(ev.len(), 1);
        assert_eq!(ev[0].sample, 300);
    }
}
