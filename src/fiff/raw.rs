//! Raw FIF reader (`mne.io.read_raw_fif(..., preload=False)` equivalent).
//!
//! 1. Load the tag directory and fold it into a block tree.
//! 2. Read [`MeasInfo`] from `FIFFB_MEAS_INFO`.
//! 3. Index the data buffers of `FIFFB_RAW_DATA` / `FIFFB_CONTINUOUS_DATA`.
//! 4. Pick up annotations embedded in the measurement, if any.
//!
//! Samples are calibrated on read:
//! `value[ch, t] = stored[t, ch] × chs[ch].cal × chs[ch].range`.
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use anyhow::{anyhow, bail, Context, Result};
use ndarray::{s, Array2};

use super::annotations::{read_annotations_block, Annotations};
use super::constants::*;
use super::info::{read_meas_info, MeasInfo};
use super::tag::{read_i32, TagHeader};
use super::tree::load_tree;

/// One contiguous block of samples. `tag == None` marks a skipped gap,
/// read back as zeros.
#[derive(Debug, Clone)]
pub struct BufferRecord {
    pub tag:        Option<TagHeader>,
    pub first_samp: u64,
    pub n_samp:     usize,
}

/// An opened (not preloaded) raw FIF recording.
#[derive(Debug, Clone)]
pub struct RawFif {
    pub info:        MeasInfo,
    /// Acquisition-time index of the first stored sample.
    pub first_samp:  u64,
    /// Acquisition-time index of the last stored sample (inclusive).
    pub last_samp:   u64,
    pub path:        PathBuf,
    pub buffers:     Vec<BufferRecord>,
    /// Annotations stored inside the measurement block.
    pub annotations: Option<Annotations>,
}

impl RawFif {
    #[inline]
    pub fn n_times(&self) -> usize {
        (self.last_samp - self.first_samp + 1) as usize
    }

    /// All samples as a calibrated `[n_chan, n_times]` matrix in SI units.
    pub fn read_all_data(&self) -> Result<Array2<f64>> {
        self.read_slice(0, self.n_times())
    }

    /// Columns `[start, end)` counted from `first_samp`.
    pub fn read_slice(&self, start: usize, end: usize) -> Result<Array2<f64>> {
        if start > end || end > self.n_times() {
            bail!("slice {start}..{end} outside 0..{}", self.n_times());
        }
        let n_ch = self.info.n_chan;
        let cals = self.info.cals();
        let mut out = Array2::<f64>::zeros((n_ch, end - start));

        let file = File::open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        let mut reader = BufReader::new(file);

        let mut base = 0usize;
        for buf in &self.buffers {
            let buf_end = base + buf.n_samp;
            if base < end && buf_end > start {
                let lo = start.saturating_sub(base);
                let hi = buf.n_samp.min(end - base);
                let dst = base + lo - start;
                if let Some(tag) = &buf.tag {
                    let block = read_buffer(&mut reader, tag, buf.n_samp, n_ch, &cals)?;
                    out.slice_mut(s![.., dst..dst + (hi - lo)])
                        .assign(&block.slice(s![.., lo..hi]));
                }
            }
            base = buf_end;
        }
        Ok(out)
    }
}

/// Open a raw FIF file and index its buffers.
pub fn open_raw<P: AsRef<Path>>(path: P) -> Result<RawFif> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let tree = load_tree(&mut reader)?;
    let info = read_meas_info(&mut reader, &tree)?;
    let meas = tree
        .find_block(FIFFB_MEAS)
        .ok_or_else(|| anyhow!("FIFFB_MEAS not found"))?;
    let raw_node = meas
        .find_block(FIFFB_RAW_DATA)
        .or_else(|| meas.find_block(FIFFB_CONTINUOUS_DATA))
        .ok_or_else(|| anyhow!("no raw-data block in {}", path.display()))?;

    let mut next_samp: u64 = match raw_node.find_tag(FIFF_FIRST_SAMPLE) {
        Some(tag) => read_i32(&mut reader, tag)?.max(0) as u64,
        None => 0,
    };
    let mut pending_skip = 0usize;
    let mut buffers: Vec<BufferRecord> = Vec::new();

    for ent in &raw_node.entries {
        match ent.kind {
            FIFF_DATA_SKIP => pending_skip += read_i32(&mut reader, ent)?.max(0) as usize,
            FIFF_DATA_BUFFER => {
                let bps = bytes_per_sample(ent.ftype)
                    .ok_or_else(|| anyhow!("unsupported buffer type {}", ent.ftype))?;
                if info.n_chan == 0 {
                    bail!("data buffer in a file with zero channels");
                }
                let n_samp = ent.payload_len() / (bps * info.n_chan);
                if pending_skip > 0 {
                    // A skip before the first buffer only moves the origin.
                    let gap = n_samp * pending_skip;
                    if !buffers.is_empty() {
                        buffers.push(BufferRecord { tag: None, first_samp: next_samp, n_samp: gap });
                    }
                    next_samp += gap as u64;
                    pending_skip = 0;
                }
                buffers.push(BufferRecord { tag: Some(*ent), first_samp: next_samp, n_samp });
                next_samp += n_samp as u64;
            }
            _ => {}
        }
    }

    let first = buffers
        .first()
        .map(|b| b.first_samp)
        .ok_or_else(|| anyhow!("no FIFF_DATA_BUFFER tags in {}", path.display()))?;
    if next_samp <= first {
        bail!("raw-data block of {} holds no samples", path.display());
    }

    let annotations = match meas.find_block(FIFFB_MNE_ANNOTATIONS) {
        Some(node) => Some(read_annotations_block(&mut reader, node)?),
        None => None,
    };

    log::debug!(
        "opened {}: {} ch @ {} Hz, samples {}..={}, {} buffers",
        path.display(), info.n_chan, info.sfreq, first, next_samp - 1, buffers.len()
    );

    Ok(RawFif {
        info,
        first_samp: first,
        last_samp: next_samp - 1,
        path: path.to_path_buf(),
        buffers,
        annotations,
    })
}

/// Decode one interleaved `[n_samp, n_chan]` buffer into calibrated `[n_chan, n_samp]`.
fn read_buffer<R: Read + Seek>(
    reader: &mut R,
    tag:    &TagHeader,
    n_samp: usize,
    n_chan: usize,
    cals:   &[f64],
) -> Result<Array2<f64>> {
    let width = bytes_per_sample(tag.ftype)
        .ok_or_else(|| anyhow!("unsupported buffer type {}", tag.ftype))?;
    reader
        .seek(SeekFrom::Start(tag.data_pos()))
        .with_context(|| format!("seek to buffer @ {:#x}", tag.data_pos()))?;
    let mut raw = vec![0u8; n_samp * n_chan * width];
    reader.read_exact(&mut raw)
        .with_context(|| format!("read buffer @ {:#x}", tag.data_pos()))?;

    let decode: fn(&[u8]) -> f64 = match tag.ftype {
        FIFFT_FLOAT  => |b| f64::from(f32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        FIFFT_DOUBLE => |b| f64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
        FIFFT_INT    => |b| f64::from(i32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        _            => |b| f64::from(i16::from_be_bytes([b[0], b[1]])),
    };

    let mut out = Array2::<f64>::zeros((n_chan, n_samp));
    for (k, sample) in raw.chunks_exact(width).enumerate() {
        let (t, c) = (k / n_chan, k % n_chan);
        out[[c, t]] = decode(sample) * cals[c];
    }
    Ok(out)
}
