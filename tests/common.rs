/// Shared helpers: synthetic recordings, group tables and a minimal FIF writer.
use meeg::fiff::constants::*;
use meeg::fiff::Annotations;
use meeg::{AnatomicalGroup, Channel, GroupMembership, Modality, Recording};
use ndarray::Array2;
use std::path::Path;

pub const EEG_NAMES: [&str; 7] = ["EEG001", "EEG002", "EEG003", "EEG004", "EEG005", "EEG006", "EEG007"];
pub const MEG_NAMES: [&str; 5] = ["MEG0111", "MEG0211", "MEG0311", "MEG0411", "MEG0511"];

/// EEG001..003 frontal, one channel for every other group.
#[allow(unused)]
pub fn eeg_groups() -> GroupMembership {
    let groups = [
        AnatomicalGroup::Frontal,
        AnatomicalGroup::Frontal,
        AnatomicalGroup::Frontal,
        AnatomicalGroup::Parietal,
        AnatomicalGroup::TemporalLeft,
        AnatomicalGroup::TemporalRight,
        AnatomicalGroup::Occipital,
    ];
    GroupMembership::from_assignments(Modality::Eeg, EEG_NAMES.into_iter().zip(groups))
}

#[allow(unused)]
pub fn meg_groups() -> GroupMembership {
    GroupMembership::from_assignments(Modality::Meg, MEG_NAMES.into_iter().zip(AnatomicalGroup::ALL))
}

/// The 7 EEG channels, the 5 MEG channels, then a stim channel.
#[allow(unused)]
pub fn channels() -> Vec<Channel> {
    EEG_NAMES
        .iter()
        .map(|n| Channel::eeg(*n))
        .chain(MEG_NAMES.iter().map(|n| Channel::meg(*n)))
        .chain(std::iter::once(Channel::new("STI101", None)))
        .collect()
}

/// `(onset seconds, description)` list as annotations without `orig_time`.
#[allow(unused)]
pub fn annotations(markers: &[(f64, &str)]) -> Annotations {
    let mut a = Annotations::new(None);
    for &(onset, desc) in markers {
        a.push(onset, 0.8, desc);
    }
    a
}

/// Recording over [`channels`] with samples `fill(channel, t)` in SI units.
#[allow(unused)]
pub fn recording(
    sfreq: f64,
    n_times: usize,
    markers: &[(f64, &str)],
    fill: impl Fn(usize, usize) -> f64,
) -> Recording {
    let chs = channels();
    let data = Array2::from_shape_fn((chs.len(), n_times), |(c, t)| fill(c, t));
    Recording::new(sfreq, chs, data, annotations(markers)).unwrap()
}

// ── Minimal FIF writer ─────────────────────────────────────────────────────────

/// Sequential tag chain, no directory.
#[derive(Default)]
pub struct FifWriter {
    bytes: Vec<u8>,
    last:  Option<usize>,
}

#[allow(unused)]
impl FifWriter {
    pub fn new() -> Self {
        let mut w = Self::default();
        w.tag(FIFF_FILE_ID, FIFFT_ID_STRUCT, &[0u8; 20]);
        w
    }

    pub fn tag(&mut self, kind: i32, ftype: u32, payload: &[u8]) -> &mut Self {
        self.last = Some(self.bytes.len());
        self.bytes.extend_from_slice(&kind.to_be_bytes());
        self.bytes.extend_from_slice(&ftype.to_be_bytes());
        self.bytes.extend_from_slice(&(payload.len() as i32).to_be_bytes());
        self.bytes.extend_from_slice(&FIFFV_NEXT_SEQ.to_be_bytes());
        self.bytes.extend_from_slice(payload);
        self
    }

    pub fn int(&mut self, kind: i32, v: i32) -> &mut Self {
        self.tag(kind, FIFFT_INT, &v.to_be_bytes())
    }

    pub fn start(&mut self, block: i32) -> &mut Self {
        self.int(FIFF_BLOCK_START, block)
    }

    pub fn end(&mut self, block: i32) -> &mut Self {
        self.int(FIFF_BLOCK_END, block)
    }

    pub fn floats(&mut self, kind: i32, values: &[f32]) -> &mut Self {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.tag(kind, FIFFT_FLOAT, &payload)
    }

    pub fn doubles(&mut self, kind: i32, values: &[f64]) -> &mut Self {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.tag(kind, FIFFT_DOUBLE, &payload)
    }

    pub fn string(&mut self, kind: i32, s: &str) -> &mut Self {
        self.tag(kind, FIFFT_STRING, s.as_bytes())
    }

    /// An `FIFFB_MNE_ANNOTATIONS` block.
    pub fn annotations(&mut self, a: &Annotations) -> &mut Self {
        let onsets: Vec<f32> = a.onset.iter().map(|&v| v as f32).collect();
        let ends: Vec<f32> = a.onset.iter().zip(&a.duration).map(|(o, d)| (o + d) as f32).collect();
        self.start(FIFFB_MNE_ANNOTATIONS)
            .floats(FIFF_MNE_BASELINE_MIN, &onsets)
            .floats(FIFF_MNE_BASELINE_MAX, &ends)
            .string(FIFF_COMMENT, &a.description.join(":"));
        if let Some(t) = a.orig_time {
            self.doubles(FIFF_MEAS_DATE, &[t.trunc(), (t.fract() * 1e6).round()]);
        }
        self.end(FIFFB_MNE_ANNOTATIONS)
    }

    /// Terminate the chain and write it out.
    pub fn save(&mut self, path: &Path) {
        if let Some(at) = self.last {
            self.bytes[at + 12..at + 16].copy_from_slice(&FIFFV_NEXT_NONE.to_be_bytes());
        }
        std::fs::write(path, &self.bytes).unwrap();
    }
}

#[allow(unused)]
pub fn ch_info(ch: &Channel) -> Vec<u8> {
    let (kind, unit) = match ch.modality {
        Some(Modality::Eeg) => (FIFFV_EEG_CH, FIFF_UNIT_V),
        Some(Modality::Meg) => (FIFFV_MEG_CH, FIFF_UNIT_T),
        None => (FIFFV_STIM_CH, FIFF_UNIT_NONE),
    };
    let mut raw = vec![0u8; 96];
    raw[8..12].copy_from_slice(&kind.to_be_bytes());
    raw[12..16].copy_from_slice(&1_f32.to_be_bytes());
    raw[16..20].copy_from_slice(&1_f32.to_be_bytes());
    raw[72..76].copy_from_slice(&unit.to_be_bytes());
    raw[80..80 + ch.name.len()].copy_from_slice(ch.name.as_bytes());
    raw
}

/// Write `rec` as a raw FIF file, split into buffers of `buf_len` samples.
/// Annotations are embedded only when `embed_annotations` is set.
#[allow(unused)]
pub fn write_raw_fif(path: &Path, rec: &Recording, buf_len: usize, embed_annotations: bool) {
    let mut w = FifWriter::new();
    w.start(FIFFB_MEAS).start(FIFFB_MEAS_INFO);
    w.int(FIFF_NCHAN, rec.n_channels() as i32)
        .floats(FIFF_SFREQ, &[rec.sfreq as f32]);
    if let Some(date) = rec.meas_date {
        let stamp: Vec<u8> = [date.trunc() as i32, (date.fract() * 1e6).round() as i32]
            .iter()
            .flat_map(|v| v.to_be_bytes())
            .collect();
        w.tag(FIFF_MEAS_DATE, FIFFT_INT, &stamp);
    }
    for ch in &rec.channels {
        w.tag(FIFF_CH_INFO, FIFFT_CH_INFO_STRUCT, &ch_info(ch));
    }
    w.end(FIFFB_MEAS_INFO);

    w.start(FIFFB_RAW_DATA).int(FIFF_FIRST_SAMPLE, rec.first_samp as i32);
    let n_t = rec.n_times();
    let mut start = 0;
    while start < n_t {
        let stop = (start + buf_len).min(n_t);
        let payload: Vec<u8> = (start..stop)
            .flat_map(|t| rec.data.column(t).iter().map(|&v| v as f32).collect::<Vec<_>>())
            .flat_map(|v| v.to_be_bytes())
            .collect();
        w.tag(FIFF_DATA_BUFFER, FIFFT_FLOAT, &payload);
        start = stop;
    }
    w.end(FIFFB_RAW_DATA);

    if embed_annotations {
        w.annotations(&rec.annotations);
    }
    w.end(FIFFB_MEAS);
    w.save(path);
}

/// Stand-alone `*_annotations.fif` file.
#[allow(unused)]
pub fn write_annotations_fif(path: &Path, a: &Annotations) {
    let mut w = FifWriter::new();
    w.annotations(a);
    w.save(path);
}
