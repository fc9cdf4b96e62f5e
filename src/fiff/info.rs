//! Measurement info (`FIFFB_MEAS_INFO`): channel table, sampling rate and
//! measurement date. Projections, digitisation and head transforms are not read.
use std::io::{Read, Seek};
use anyhow::{anyhow, bail, Result};

use super::constants::*;
use super::tag::*;
use super::tree::Node;

/// One `FIFFT_CH_INFO_STRUCT` record.
///
/// ```text
/// off  size  field
///   0     4  scan_no    i32
///   4     4  log_no     i32
///   8     4  kind       i32
///  12     4  range      f32
///  16     4  cal        f32
///  20     4  coil_type  i32
///  24    48  loc        12 × f32
///  72     4  unit       i32
///  76     4  unit_mul   i32
///  80    16  ch_name    Latin-1, NUL-padded
/// ```
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub scan_no:   i32,
    pub log_no:    i32,
    pub kind:      i32,
    pub range:     f32,
    pub cal:       f32,
    pub coil_type: i32,
    pub loc:       [f32; 12],
    pub unit:      i32,
    pub unit_mul:  i32,
    pub name:      String,
}

pub const CH_INFO_LEN: usize = 96;

impl ChannelInfo {
    /// Factor turning stored samples into SI units: `cal × range`.
    #[inline]
    pub fn calibration(&self) -> f64 {
        f64::from(self.cal) * f64::from(self.range)
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() < CH_INFO_LEN {
            bail!("ch_info payload too short: {} bytes (need {CH_INFO_LEN})", raw.len());
        }
        let i = |at: usize| i32::from_be_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
        let f = |at: usize| f32::from_be_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);

        let mut loc = [0f32; 12];
        for (k, v) in loc.iter_mut().enumerate() {
            *v = f(24 + 4 * k);
        }
        let name_bytes = &raw[80..96];
        let end = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());

        Ok(ChannelInfo {
            scan_no:   i(0),
            log_no:    i(4),
            kind:      i(8),
            range:     f(12),
            cal:       f(16),
            coil_type: i(20),
            loc,
            unit:      i(72),
            unit_mul:  i(76),
            name:      name_bytes[..end].iter().map(|&b| char::from(b)).collect(),
        })
    }
}

/// Subset of MNE's `Info` needed to interpret a processed run.
#[derive(Debug, Clone)]
pub struct MeasInfo {
    pub n_chan:       usize,
    pub sfreq:        f64,
    /// Seconds since the Unix epoch, if the file records one.
    pub meas_date:    Option<f64>,
    pub chs:          Vec<ChannelInfo>,
}

impl MeasInfo {
    /// `cal × range` per channel.
    pub fn cals(&self) -> Vec<f64> {
        self.chs.iter().map(ChannelInfo::calibration).collect()
    }
}

/// Read the `FIFFB_MEAS_INFO` block below `tree`.
pub fn read_meas_info<R: Read + Seek>(reader: &mut R, tree: &Node) -> Result<MeasInfo> {
    let info_node = tree
        .find_block(FIFFB_MEAS)
        .and_then(|meas| meas.find_block(FIFFB_MEAS_INFO))
        .ok_or_else(|| anyhow!("FIFFB_MEAS_INFO block not found"))?;

    let mut n_chan = None::<usize>;
    let mut sfreq = None::<f64>;
    let mut meas_date = None::<f64>;
    let mut chs = Vec::new();

    for ent in &info_node.entries {
        match ent.kind {
            FIFF_NCHAN => n_chan = Some(read_i32(reader, ent)?.max(0) as usize),
            FIFF_SFREQ => sfreq = Some(f64::from(read_f32(reader, ent)?)),
            FIFF_MEAS_DATE => {
                if let [sec, usec, ..] = read_float_array(reader, ent)?[..] {
                    meas_date = Some(sec + usec * 1e-6);
                }
            }
            FIFF_CH_INFO => chs.push(ChannelInfo::from_bytes(&read_raw_bytes(reader, ent)?)?),
            _ => {}
        }
    }

    let n_chan = n_chan.ok_or_else(|| anyhow!("FIFF_NCHAN not found"))?;
    let sfreq = sfreq.ok_or_else(|| anyhow!("FIFF_SFREQ not found"))?;
    if !(sfreq.is_finite() && sfreq > 0.0) {
        bail!("invalid sampling rate {sfreq}");
    }
    if chs.len() != n_chan {
        bail!("expected {n_chan} ch_info structs, got {}", chs.len());
    }

    Ok(MeasInfo { n_chan, sfreq, meas_date, chs })
}
