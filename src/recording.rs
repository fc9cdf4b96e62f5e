//! In-memory continuous recordings.
//!
//! A [`Recording`] is a preloaded `[n_channels, n_times]` matrix in SI units
//! (V for EEG, T for MEG) plus its annotation timeline. It is built once,
//! from a FIF file or from arrays, and only read afterwards.
use std::path::Path;
use anyhow::{bail, Context, Result};
use ndarray::{Array2, Axis};

use crate::error::ExplorerError;
use crate::fiff::constants::*;
use crate::fiff::{open_raw, read_annotations, Annotations, ChannelInfo, RawFif};
use crate::groups::Modality;

/// A named sensor. `modality` is `None` for channels that cannot be reported
/// as µV or fT (stim, EOG, gradiometers, …).
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name:     String,
    pub modality: Option<Modality>,
}

impl Channel {
    pub fn new(name: impl Into<String>, modality: Option<Modality>) -> Self {
        Self { name: name.into(), modality }
    }

    pub fn eeg(name: impl Into<String>) -> Self {
        Self::new(name, Some(Modality::Eeg))
    }

    pub fn meg(name: impl Into<String>) -> Self {
        Self::new(name, Some(Modality::Meg))
    }

    fn from_info(ch: &ChannelInfo) -> Self {
        let modality = match (ch.kind, ch.unit) {
            (FIFFV_EEG_CH, FIFF_UNIT_V | FIFF_UNIT_NONE) => Some(Modality::Eeg),
            (FIFFV_MEG_CH, FIFF_UNIT_T) => Some(Modality::Meg),
            _ => None,
        };
        Self::new(ch.name.clone(), modality)
    }
}

#[derive(Debug, Clone)]
pub struct Recording {
    pub sfreq:       f64,
    /// Acquisition-time index of column 0.
    pub first_samp:  u64,
    /// Seconds since the Unix epoch.
    pub meas_date:   Option<f64>,
    pub channels:    Vec<Channel>,
    /// `[n_channels, n_times]`, SI units.
    pub data:        Array2<f64>,
    pub annotations: Annotations,
}

impl Recording {
    /// Build from arrays. `data` rows follow `channels`.
    pub fn new(
        sfreq: f64,
        channels: Vec<Channel>,
        data: Array2<f64>,
        annotations: Annotations,
    ) -> Result<Self> {
        if !(sfreq.is_finite() && sfreq > 0.0) {
            return Err(ExplorerError::Parameter(format!("sampling rate {sfreq} Hz")).into());
        }
        if data.nrows() != channels.len() {
            bail!("{} data rows for {} channels", data.nrows(), channels.len());
        }
        Ok(Self { sfreq, first_samp: 0, meas_date: None, channels, data, annotations })
    }

    /// Preload an opened raw file. `annotations` overrides the embedded ones.
    pub fn from_raw(raw: &RawFif, annotations: Option<Annotations>) -> Result<Self> {
        let data = raw.read_all_data()?;
        let annotations = annotations
            .or_else(|| raw.annotations.clone())
            .unwrap_or_default();
        Ok(Self {
            sfreq: raw.info.sfreq,
            first_samp: raw.first_samp,
            meas_date: raw.info.meas_date,
            channels: raw.info.chs.iter().map(Channel::from_info).collect(),
            data,
            annotations,
        })
    }

    /// Read a raw FIF file and, if given, its annotation sidecar.
    pub fn load(raw_path: &Path, annotations_path: Option<&Path>) -> Result<Self> {
        let raw = open_raw(raw_path)?;
        let annotations = match annotations_path {
            Some(p) => Some(read_annotations(p)?),
            None => None,
        };
        let rec = Self::from_raw(&raw, annotations)
            .with_context(|| format!("load {}", raw_path.display()))?;
        log::debug!(
            "loaded {}: {} ch × {:.1} s @ {} Hz, {} annotations",
            raw_path.display(), rec.n_channels(), rec.duration_secs(), rec.sfreq, rec.annotations.len()
        );
        Ok(rec)
    }

    #[inline]
    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    /// Time of column 0 in acquisition time (s).
    #[inline]
    pub fn first_time(&self) -> f64 {
        self.first_samp as f64 / self.sfreq
    }

    pub fn duration_secs(&self) -> f64 {
        self.n_times() as f64 / self.sfreq
    }

    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.name == name)
    }

    /// Row indices of `names`, each checked to be of `modality`.
    pub fn pick_indices<S: AsRef<str>>(&self, names: &[S], modality: Modality) -> Result<Vec<usize>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let idx = self
                    .channel_index(name)
                    .ok_or_else(|| ExplorerError::MissingChannel(name.to_string()))?;
                if self.channels[idx].modality != Some(modality) {
                    return Err(ExplorerError::UnitMismatch {
                        channel: name.to_string(),
                        expected: modality,
                    }
                    .into());
                }
                Ok(idx)
            })
            .collect()
    }

    /// `[names.len(), n_times]` in the modality's unit (µV or fT).
    pub fn get_data<S: AsRef<str>>(&self, names: &[S], modality: Modality) -> Result<Array2<f64>> {
        let picks = self.pick_indices(names, modality)?;
        let scale = modality.si_scale();
        Ok(self.data.select(Axis(0), &picks).mapv(|v| v * scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Recording {
        let data = Array2::from_shape_fn((3, 10), |(c, t)| (c * 10 + t) as f64 * 1e-6);
        Recording::new(
            100.0,
            vec![Channel::eeg("EEG001"), Channel::meg("MEG0111"), Channel::new("STI101", None)],
            data,
            Annotations::default(),
        )
        .unwrap()
    }

    #[test]
    fn get_data_scales_to_microvolts() {
        let rec = small();
        let eeg = rec.get_data(&["EEG001"], Modality::Eeg).unwrap();
        assert_eq!(eeg.dim(), (1, 10));
        approx::assert_abs_diff_eq!(eeg[[0, 3]], 3.0, epsilon = 1e-9);
    }

    #[test]
    fn wrong_modality_is_unit_mismatch() {
        let rec = small();
        let err = rec.get_data(&["EEG001"], Modality::Meg).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExplorerError>(),
            Some(ExplorerError::UnitMismatch { .. })
        ));
        let err = rec.get_data(&["STI101"], Modality::Eeg).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExplorerError>(),
            Some(ExplorerError::UnitMismatch { .. })
        ));
    }

    #[test]
    fn missing_channel_is_reported() {
        let err = small().pick_indices(&["EEG999"], Modality::Eeg).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ExplorerError>(),
            Some(&ExplorerError::MissingChannel("EEG999".into()))
        );
    }

    #[test]
    fn shape_mismatch_rejected() {
        let data = Array2::zeros((2, 5));
        assert!(Recording::new(100.0, vec![Channel::eeg("A")], data, Annotations::default()).is_err());
    }

    #[test]
    fn gradiometers_have_no_modality() {
        let mut raw = vec![0u8; crate::fiff::info::CH_INFO_LEN];
        raw[8..12].copy_from_slice(&FIFFV_MEG_CH.to_be_bytes());
        raw[72..76].copy_from_slice(&FIFF_UNIT_T_M.to_be_bytes());
        raw[80..87].copy_from_slice(b"MEG0112");
        let info = ChannelInfo::from_bytes(&raw).unwrap();
        assert_eq!(Channel::from_info(&info).modality, None);
    }
}
