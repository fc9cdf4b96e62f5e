//! Channel-group index: anatomical groups, modalities and the static
//! channel → group membership tables.
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Sensor modality and the physical unit its aggregates are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Modality {
    /// Scalp potential, reported in µV.
    Eeg,
    /// Magnetic flux, reported in fT.
    Meg,
}

impl Modality {
    pub const ALL: [Modality; 2] = [Modality::Eeg, Modality::Meg];

    /// Multiplier from the SI unit stored in the recording (V, T).
    pub fn si_scale(self) -> f64 {
        match self {
            Modality::Eeg => 1e6,
            Modality::Meg => 1e15,
        }
    }

    pub fn unit_label(self) -> &'static str {
        match self {
            Modality::Eeg => "uV",
            Modality::Meg => "fT",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Modality::Eeg => "eeg",
            Modality::Meg => "meg",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Eeg => write!(f, "EEG ({})", self.unit_label()),
            Modality::Meg => write!(f, "MEG ({})", self.unit_label()),
        }
    }
}

/// The five fixed anatomical channel groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnatomicalGroup {
    #[serde(rename = "Frontal lobe")]
    Frontal,
    #[serde(rename = "Parietal lobe")]
    Parietal,
    #[serde(rename = "Temporal lobe (L)")]
    TemporalLeft,
    #[serde(rename = "Temporal lobe (R)")]
    TemporalRight,
    #[serde(rename = "Occipital lobe")]
    Occipital,
}

impl AnatomicalGroup {
    pub const ALL: [AnatomicalGroup; 5] = [
        AnatomicalGroup::Frontal,
        AnatomicalGroup::Parietal,
        AnatomicalGroup::TemporalLeft,
        AnatomicalGroup::TemporalRight,
        AnatomicalGroup::Occipital,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AnatomicalGroup::Frontal       => "Frontal lobe",
            AnatomicalGroup::Parietal      => "Parietal lobe",
            AnatomicalGroup::TemporalLeft  => "Temporal lobe (L)",
            AnatomicalGroup::TemporalRight => "Temporal lobe (R)",
            AnatomicalGroup::Occipital     => "Occipital lobe",
        }
    }

    /// Short identifier used in export keys.
    pub fn key(self) -> &'static str {
        match self {
            AnatomicalGroup::Frontal       => "frontal",
            AnatomicalGroup::Parietal      => "parietal",
            AnatomicalGroup::TemporalLeft  => "temporal_l",
            AnatomicalGroup::TemporalRight => "temporal_r",
            AnatomicalGroup::Occipital     => "occipital",
        }
    }
}

impl fmt::Display for AnatomicalGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AnatomicalGroup {
    type Err = anyhow::Error;

    /// Accepts the display label or the short key.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match AnatomicalGroup::ALL
            .into_iter()
            .find(|g| g.label().eq_ignore_ascii_case(s) || g.key().eq_ignore_ascii_case(s))
        {
            Some(g) => Ok(g),
            None => bail!("unknown anatomical group {s:?}"),
        }
    }
}

/// Static channel → group table for one modality.
///
/// Every channel belongs to exactly one group and every group has at least
/// one channel; both are asserted on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMembership {
    modality: Modality,
    members:  BTreeMap<AnatomicalGroup, Vec<String>>,
    index:    HashMap<String, AnatomicalGroup>,
}

impl GroupMembership {
    /// Build from `(channel, group)` pairs; per-group order is input order.
    ///
    /// # Panics
    ///
    /// If a channel name repeats or a group ends up with no channels.
    pub fn from_assignments<I, S>(modality: Modality, assignments: I) -> Self
    where
        I: IntoIterator<Item = (S, AnatomicalGroup)>,
        S: Into<String>,
    {
        let mut members: BTreeMap<AnatomicalGroup, Vec<String>> = BTreeMap::new();
        let mut index = HashMap::new();
        for (name, group) in assignments {
            let name = name.into();
            let previous = index.insert(name.clone(), group);
            assert!(
                previous.is_none(),
                "{modality} channel {name} assigned to more than one group"
            );
            members.entry(group).or_default().push(name);
        }
        for group in AnatomicalGroup::ALL {
            assert!(
                members.get(&group).is_some_and(|m| !m.is_empty()),
                "{modality} group {group} has no channels"
            );
        }
        Self { modality, members, index }
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    /// The unique group owning `channel`.
    pub fn group_of(&self, channel: &str) -> Option<AnatomicalGroup> {
        self.index.get(channel).copied()
    }

    /// Member channels of `group`, in table order.
    pub fn channels(&self, group: AnatomicalGroup) -> &[String] {
        self.members.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Groups in canonical order with their members.
    pub fn iter(&self) -> impl Iterator<Item = (AnatomicalGroup, &[String])> + '_ {
        self.members.iter().map(|(&g, m)| (g, m.as_slice()))
    }

    pub fn n_channels(&self) -> usize {
        self.index.len()
    }
}
