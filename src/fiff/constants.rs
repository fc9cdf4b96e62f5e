//! FIFF format constants.
//!
//! Names follow [`mne/_fiff/constants.py`][mne-src] so that values can be
//! cross-checked against MNE.  Only the subset needed to read processed raw
//! runs and their annotation sidecars is listed here.
//!
//! Every item in a FIF file is a **tag**: a 16-byte big-endian header
//! (`kind`, `type`, `size`, `next`) followed by `size` payload bytes.
//! `FIFF_BLOCK_START` / `FIFF_BLOCK_END` tags nest tags into a tree of blocks.
//!
//! [mne-src]: https://github.com/mne-tools/mne-python/blob/main/mne/_fiff/constants.py

#![allow(dead_code)]

// ── Block kinds ───────────────────────────────────────────────────────────

/// Measurement block: one recording.
pub const FIFFB_MEAS:            i32 = 100;
/// Measurement info: channels, sfreq, measurement date.
pub const FIFFB_MEAS_INFO:       i32 = 101;
/// Raw (continuous) data block.
pub const FIFFB_RAW_DATA:        i32 = 102;
/// Continuous data block written by some acquisition systems.
pub const FIFFB_CONTINUOUS_DATA: i32 = 112;
/// MNE annotations block (stand-alone `*_annotations.fif` or embedded in raw).
pub const FIFFB_MNE_ANNOTATIONS: i32 = 3810;

// ── Tag kinds: structure ─────────────────────────────────────────────────

pub const FIFF_FILE_ID:          i32 = 100;
pub const FIFF_DIR_POINTER:      i32 = 101;
pub const FIFF_BLOCK_START:      i32 = 104;
pub const FIFF_BLOCK_END:        i32 = 105;

// ── Tag kinds: measurement info ──────────────────────────────────────────

/// Number of channels (i32).
pub const FIFF_NCHAN:            i32 = 200;
/// Sampling frequency in Hz (f32).
pub const FIFF_SFREQ:            i32 = 201;
/// One 96-byte channel info struct per channel.
pub const FIFF_CH_INFO:          i32 = 203;
/// Measurement date. `[sec, usec]` as i32 in measurement info,
/// as f64 in an annotations block.
pub const FIFF_MEAS_DATE:        i32 = 204;
/// Free-text comment. In an annotations block: colon-joined descriptions.
pub const FIFF_COMMENT:          i32 = 206;
/// Acquisition-time index of the first stored sample (i32).
pub const FIFF_FIRST_SAMPLE:     i32 = 208;
/// Colon-separated list of bad channel names.

// ── Tag kinds: data buffers ───────────────────────────────────────────────

/// Interleaved `[n_samp, n_chan]` big-endian sample buffer.
pub const FIFF_DATA_BUFFER:      i32 = 300;
/// Skip `n` buffers' worth of samples.
pub const FIFF_DATA_SKIP:        i32 = 301;

// ── Tag kinds: MNE annotations ───────────────────────────────────────────

/// Annotation onsets in seconds (f32 array).
pub const FIFF_MNE_BASELINE_MIN: i32 = 3546;
/// Annotation ends (`onset + duration`) in seconds (f32 array).
pub const FIFF_MNE_BASELINE_MAX: i32 = 3547;

// ── Tag payload types ─────────────────────────────────────────────────────

pub const FIFFT_SHORT:             u32 = 2;
pub const FIFFT_INT:               u32 = 3;
pub const FIFFT_FLOAT:             u32 = 4;
pub const FIFFT_DOUBLE:            u32 = 5;
pub const FIFFT_STRING:            u32 = 10;
pub const FIFFT_DAU_PACK16:        u32 = 16;
pub const FIFFT_CH_INFO_STRUCT:    u32 = 30;
pub const FIFFT_ID_STRUCT:         u32 = 31;
pub const FIFFT_DIR_ENTRY_STRUCT:  u32 = 32;

// ── `next` sentinels ──────────────────────────────────────────────────────

/// Next tag follows immediately at `pos + 16 + size`.
pub const FIFFV_NEXT_SEQ:  i32 = 0;
/// End of the tag chain.
pub const FIFFV_NEXT_NONE: i32 = -1;

// ── Channel kinds ─────────────────────────────────────────────────────────

pub const FIFFV_MEG_CH:  i32 = 1;
pub const FIFFV_EEG_CH:  i32 = 2;
pub const FIFFV_STIM_CH: i32 = 3;

// ── Physical units (`ChannelInfo::unit`) ──────────────────────────────────

pub const FIFF_UNIT_NONE: i32 = -1;
/// Volt: EEG.
pub const FIFF_UNIT_V:    i32 = 107;
/// Tesla: MEG magnetometers.
pub const FIFF_UNIT_T:    i32 = 112;
/// Tesla per metre: MEG planar gradiometers.
pub const FIFF_UNIT_T_M:  i32 = 201;

/// Bytes per sample for the buffer types a raw-data block may use.
///
/// ```
/// use meeg::fiff::constants::{bytes_per_sample, FIFFT_FLOAT, FIFFT_SHORT, FIFFT_STRING};
/// assert_eq!(bytes_per_sample(FIFFT_FLOAT),  Some(4));
/// assert_eq!(bytes_per_sample(FIFFT_SHORT),  Some(2));
/// assert_eq!(bytes_per_sample(FIFFT_STRING), None);
/// ```
pub fn bytes_per_sample(tag_type: u32) -> Option<usize> {
    match tag_type {
        FIFFT_SHORT | FIFFT_DAU_PACK16 => Some(2),
        FIFFT_INT | FIFFT_FLOAT        => Some(4),
        FIFFT_DOUBLE                   => Some(8),
        _                              => None,
    }
}
