//! Safetensors export of aggregates.
//!
//! Keys follow `"{modality}/{group}/{field}"`, e.g. `eeg/frontal/mean`,
//! `meg/occipital/psd`. Run aggregates are prefixed with `run{R}/`.
use std::collections::HashMap;
use std::path::Path;
use anyhow::{anyhow, bail, Context, Result};
use ndarray::{Array1, Array2};

use crate::aggregate::{ModalityAggregates, RunAggregates, WindowAggregates};

// ── Low-level safetensors parser ──────────────────────────────────────────────

fn parse_header(bytes: &[u8]) -> Result<(serde_json::Map<String, serde_json::Value>, usize)> {
    let Some(len) = bytes.get(..8) else { bail!("safetensors file too small") };
    let mut n = [0u8; 8];
    n.copy_from_slice(len);
    let end = usize::try_from(u64::from_le_bytes(n))
        .ok()
        .and_then(|len| len.checked_add(8))
        .ok_or_else(|| anyhow!("truncated safetensors header"))?;
    let header = bytes.get(8..end).ok_or_else(|| anyhow!("truncated safetensors header"))?;
    let header = serde_json::from_slice(header).context("failed to parse safetensors header")?;
    Ok((header, end))
}

fn usize_list(v: &serde_json::Value, what: &str) -> Result<Vec<usize>> {
    v.as_array()
        .ok_or_else(|| anyhow!("{what} is not a list"))?
        .iter()
        .map(|x| x.as_u64().map(|x| x as usize).ok_or_else(|| anyhow!("bad {what} entry {x}")))
        .collect()
}

/// A tensor read back as `f64`, with its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    pub shape: Vec<usize>,
    pub data:  Vec<f64>,
}

/// Read every F64 / I32 tensor of a safetensors file.
pub fn read_tensors(path: &Path) -> Result<HashMap<String, Tensor>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let (header, data_start) = parse_header(&bytes)?;

    let mut out = HashMap::new();
    for (name, entry) in header {
        if name == "__metadata__" {
            continue;
        }
        let shape = usize_list(&entry["shape"], "shape")?;
        let offsets = usize_list(&entry["data_offsets"], "data_offsets")?;
        let [s, e] = offsets[..] else { bail!("{name}: malformed data_offsets") };
        let raw = data_start
            .checked_add(s)
            .zip(data_start.checked_add(e))
            .and_then(|(lo, hi)| bytes.get(lo..hi))
            .ok_or_else(|| anyhow!("{name}: data out of range"))?;
        let data = match entry["dtype"].as_str() {
            Some("F64") => raw
                .chunks_exact(8)
                .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
                .collect(),
            Some("I32") => raw
                .chunks_exact(4)
                .map(|b| f64::from(i32::from_le_bytes([b[0], b[1], b[2], b[3]])))
                .collect(),
            other => bail!("{name}: unsupported dtype {other:?}"),
        };
        out.insert(name, Tensor { shape, data });
    }
    Ok(out)
}

// ── Generic safetensors builder ───────────────────────────────────────────────

/// Simple safetensors file writer that handles F64 and I32 tensors.
///
/// Usage:
/// ```rust,no_run
/// use meeg::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f64("signal", &[1.0f64, 2.0, 3.0], &[1, 3]);
/// w.add_i32("count", &[3], &[1]);
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F64", shape.to_vec()));
    }

    pub fn add_f64_arr1(&mut self, name: &str, arr: &Array1<f64>) {
        let data: Vec<f64> = arr.iter().copied().collect();
        self.add_f64(name, &data, &[arr.len()]);
    }

    pub fn add_f64_arr2(&mut self, name: &str, arr: &Array2<f64>) {
        let data: Vec<f64> = arr.iter().copied().collect();
        self.add_f64(name, &data, &[arr.nrows(), arr.ncols()]);
    }

    pub fn add_i32(&mut self, name: &str, data: &[i32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "I32", shape.to_vec()));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(name.clone(), serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes.into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();
        let mut f = std::fs::File::create(path)
            .with_context(|| format!("create {}", path.display()))?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}

// ── Aggregate writers ─────────────────────────────────────────────────────────

fn add_modality(w: &mut StWriter, prefix: &str, agg: &ModalityAggregates) {
    for (group, ga) in agg.iter() {
        let key = format!("{prefix}{}/{}", agg.modality.key(), group.key());
        w.add_f64_arr1(&format!("{key}/mean"), &ga.mean);
        if let Some(std) = &ga.std {
            w.add_f64_arr1(&format!("{key}/std"), std);
        }
        w.add_f64_arr2(&format!("{key}/psd"), &ga.psd.power);
        w.add_f64_arr1(&format!("{key}/freqs"), &ga.psd.freqs);
    }
}

/// `run{R}/…` group series and spectra plus `run{R}/events` as `[n, 2]`
/// `(sample, id)` pairs. `run_ids` labels the runs in order.
pub fn write_run_aggregates(aggs: &RunAggregates, run_ids: &[u32], path: &Path) -> Result<()> {
    if run_ids.len() != aggs.len() {
        bail!("{} run ids for {} runs", run_ids.len(), aggs.len());
    }
    let mut w = StWriter::new();
    for (run, agg) in run_ids.iter().zip(&aggs.runs) {
        let prefix = format!("run{run}/");
        add_modality(&mut w, &prefix, &agg.eeg);
        add_modality(&mut w, &prefix, &agg.meg);
        let events: Vec<i32> = agg
            .events
            .iter()
            .flat_map(|e| [e.sample as i32, i32::from(e.kind.id())])
            .collect();
        w.add_i32(&format!("{prefix}events"), &events, &[agg.events.len(), 2]);
        w.add_f64(&format!("{prefix}sfreq"), &[agg.sfreq], &[1]);
    }
    w.write(path)?;
    log::info!("wrote {} tensors to {}", w.len(), path.display());
    Ok(())
}

/// Group series and spectra plus `times`, `sfreq` and `n_windows`.
pub fn write_window_aggregates(agg: &WindowAggregates, path: &Path) -> Result<()> {
    let mut w = StWriter::new();
    add_modality(&mut w, "", &agg.eeg);
    add_modality(&mut w, "", &agg.meg);
    w.add_f64_arr1("times", &agg.times);
    w.add_f64("sfreq", &[agg.sfreq], &[1]);
    w.add_i32("n_windows", &[agg.n_windows as i32], &[1]);
    w.write(path)?;
    log::info!("wrote {} tensors to {}", w.len(), path.display());
    Ok(())
}
