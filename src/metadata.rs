//! Static per-subject metadata (`subject_data.json`).
//!
//! ```json
//! {
//!   "eeg_names": ["EEG001", ...], "eeg_types": ["Frontal lobe", ...],
//!   "meg_names": ["MEG0111", ...], "meg_types": ["Temporal lobe (L)", ...],
//!   "subjects": [{ "id": 1, "name": "subject 1", "age": 31, "sex": "m" }, ...]
//! }
//! ```
//!
//! `*_types[i]` is the anatomical group of `*_names[i]`. Unknown keys (sensor
//! coordinates, meshes) are ignored.
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::groups::{AnatomicalGroup, GroupMembership, Modality};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "f")]
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    #[serde(rename = "r")]
    Right,
    #[serde(rename = "l")]
    Left,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id:   u32,
    pub name: String,
    pub age:  u32,
    pub sex:  Sex,
    #[serde(default)]
    pub hand: Option<Handedness>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectData {
    pub eeg_names: Vec<String>,
    pub eeg_types: Vec<String>,
    pub meg_names: Vec<String>,
    pub meg_types: Vec<String>,
    pub subjects:  Vec<Subject>,
}

impl SubjectData {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let data: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse {}", path.display()))?;
        log::info!(
            "{}: {} subjects, {} EEG / {} MEG channels",
            path.display(), data.subjects.len(), data.eeg_names.len(), data.meg_names.len()
        );
        Ok(data)
    }

    /// Channel → group table of `modality`.
    ///
    /// Fails on an unknown group label or mismatched list lengths.
    ///
    /// # Panics
    ///
    /// If a channel repeats or a group ends up empty.
    pub fn channel_group_membership(&self, modality: Modality) -> Result<GroupMembership> {
        let (names, types) = match modality {
            Modality::Eeg => (&self.eeg_names, &self.eeg_types),
            Modality::Meg => (&self.meg_names, &self.meg_types),
        };
        if names.len() != types.len() {
            bail!("{modality}: {} channel names but {} group labels", names.len(), types.len());
        }
        let pairs = names
            .iter()
            .zip(types)
            .map(|(name, label)| {
                let group: AnatomicalGroup = label
                    .parse()
                    .with_context(|| format!("{modality} channel {name}"))?;
                Ok((name.clone(), group))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(GroupMembership::from_assignments(modality, pairs))
    }

    /// Subjects of the given sexes within `ages`, ordered by id.
    pub fn filter_subjects(&self, sexes: &[Sex], ages: RangeInclusive<u32>) -> Vec<&Subject> {
        let mut out: Vec<&Subject> = self
            .subjects
            .iter()
            .filter(|s| sexes.contains(&s.sex) && ages.contains(&s.age))
            .collect();
        out.sort_by_key(|s| s.id);
        out
    }

    /// Youngest and oldest subject age.
    pub fn age_range(&self) -> Option<RangeInclusive<u32>> {
        let min = self.subjects.iter().map(|s| s.age).min()?;
        let max = self.subjects.iter().map(|s| s.age).max()?;
        Some(min..=max)
    }

    pub fn subject(&self, id: u32) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "eeg_names": ["EEG001", "EEG002", "EEG003", "EEG004", "EEG005"],
        "eeg_types": ["Frontal lobe", "Parietal lobe", "Temporal lobe (L)", "Temporal lobe (R)", "Occipital lobe"],
        "meg_names": ["MEG0111", "MEG0211", "MEG0311", "MEG0411", "MEG0511", "MEG0611"],
        "meg_types": ["Frontal lobe", "Frontal lobe", "Parietal lobe", "Temporal lobe (L)", "Temporal lobe (R)", "Occipital lobe"],
        "meg_coords": [[0.0], [0.0], [0.0]],
        "subjects": [
            {"id": 3, "name": "subject 3", "age": 25, "sex": "f"},
            {"id": 1, "name": "subject 1", "age": 31, "sex": "m", "hand": "r"},
            {"id": 2, "name": "subject 2", "age": 23, "sex": "f", "hand": "l"}
        ]
    }"#;

    fn data() -> SubjectData {
        serde_json::from_str(JSON).unwrap()
    }

    #[test]
    fn membership_from_labels() {
        let meg = data().channel_group_membership(Modality::Meg).unwrap();
        assert_eq!(meg.channels(AnatomicalGroup::Frontal), &["MEG0111", "MEG0211"]);
        assert_eq!(meg.group_of("MEG0611"), Some(AnatomicalGroup::Occipital));
        assert_eq!(meg.n_channels(), 6);
    }

    #[test]
    fn unknown_label_is_an_error() {
        let mut d = data();
        d.eeg_types[0] = "Cerebellum".into();
        assert!(d.channel_group_membership(Modality::Eeg).is_err());
    }

    #[test]
    fn filter_by_sex_and_age() {
        let d = data();
        let ids: Vec<u32> = d.filter_subjects(&[Sex::Female], 20..=30).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 3]);
        let ids: Vec<u32> = d.filter_subjects(&[Sex::Male, Sex::Female], 30..=40).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(d.age_range(), Some(23..=31));
        assert_eq!(d.subject(1).and_then(|s| s.hand), Some(Handedness::Right));
        assert_eq!(d.subject(3).and_then(|s| s.hand), None);
    }
}
