//! MNE annotations (`mne.Annotations`) stored in FIFF.
//!
//! An annotations block holds parallel arrays:
//!
//! | tag                      | payload                                   |
//! |--------------------------|-------------------------------------------|
//! | `FIFF_MNE_BASELINE_MIN`  | onsets, seconds (f32 array)               |
//! | `FIFF_MNE_BASELINE_MAX`  | `onset + duration`, seconds (f32 array)   |
//! | `FIFF_COMMENT`           | descriptions joined by `:`                |
//! | `FIFF_MEAS_DATE`         | optional `orig_time` as `[sec, usec]` f64 |
//!
//! It is written either inside the raw measurement or as a stand-alone
//! `*_annotations.fif` file (`raw.annotations.save(...)`).
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use anyhow::{anyhow, bail, Context, Result};

use super::constants::*;
use super::tag::{read_float_array, read_string};
use super::tree::{load_tree, Node};

/// Timestamped markers attached to a recording, sorted by onset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    /// Seconds. Relative to `orig_time` when set, else to the first data sample.
    pub onset:       Vec<f64>,
    pub duration:    Vec<f64>,
    pub description: Vec<String>,
    /// Absolute reference time (seconds since the Unix epoch).
    pub orig_time:   Option<f64>,
}

impl Annotations {
    pub fn new(orig_time: Option<f64>) -> Self {
        Self { orig_time, ..Self::default() }
    }

    pub fn len(&self) -> usize {
        self.onset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.onset.is_empty()
    }

    /// Insert a marker, keeping onsets sorted (stable for equal onsets).
    pub fn push(&mut self, onset: f64, duration: f64, description: impl Into<String>) {
        let at = self.onset.partition_point(|&o| o <= onset);
        self.onset.insert(at, onset);
        self.duration.insert(at, duration);
        self.description.insert(at, description.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, &str)> + '_ {
        self.onset
            .iter()
            .zip(&self.duration)
            .zip(&self.description)
            .map(|((&o, &d), s)| (o, d, s.as_str()))
    }
}

/// Read the first annotations block of a stand-alone annotation file.
pub fn read_annotations<P: AsRef<Path>>(path: P) -> Result<Annotations> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let tree = load_tree(&mut reader)?;
    let node = tree
        .find_block(FIFFB_MNE_ANNOTATIONS)
        .ok_or_else(|| anyhow!("no annotations block in {}", path.display()))?;
    read_annotations_block(&mut reader, node)
        .with_context(|| format!("annotations of {}", path.display()))
}

/// Decode one `FIFFB_MNE_ANNOTATIONS` node.
pub fn read_annotations_block<R: Read + Seek>(reader: &mut R, node: &Node) -> Result<Annotations> {
    let mut onset = Vec::new();
    let mut ends = Vec::new();
    let mut description = Vec::new();
    let mut orig_time = None;

    for ent in &node.entries {
        match ent.kind {
            FIFF_MNE_BASELINE_MIN => onset = read_float_array(reader, ent)?,
            FIFF_MNE_BASELINE_MAX => ends = read_float_array(reader, ent)?,
            FIFF_COMMENT => {
                let joined = read_string(reader, ent)?;
                description = if joined.is_empty() {
                    Vec::new()
                } else {
                    joined.split(':').map(str::to_string).collect()
                };
            }
            FIFF_MEAS_DATE => {
                orig_time = match read_float_array(reader, ent)?[..] {
                    [sec, usec, ..] => Some(sec + usec * 1e-6),
                    [sec] => Some(sec),
                    [] => None,
                };
            }
            _ => {}
        }
    }

    if ends.is_empty() {
        ends = onset.clone();
    }
    if onset.len() != ends.len() || onset.len() != description.len() {
        bail!(
            "annotation arrays disagree: {} onsets, {} ends, {} descriptions",
            onset.len(), ends.len(), description.len()
        );
    }

    let mut out = Annotations::new(orig_time);
    for ((o, e), d) in onset.into_iter().zip(ends).zip(description) {
        out.push(o, (e - o).max(0.0), d);
    }
    Ok(out)
}
