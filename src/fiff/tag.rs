//! FIFF tag headers and payload decoding.
//!
//! ```text
//! ┌────────────┬────────────┬────────────┬────────────┬──────────────────┐
//! │ kind : i32 │ type : u32 │ size : i32 │ next : i32 │ size payload …   │
//! └────────────┴────────────┴────────────┴────────────┴──────────────────┘
//! ```
//!
//! All fields and payloads are big-endian.  Payload readers seek to
//! [`TagHeader::data_pos`] themselves, so callers can hand them any header
//! out of a directory in any order.
use std::io::{Read, Seek, SeekFrom};
use anyhow::{bail, Context, Result};

use super::constants::*;

/// A tag header without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub kind:  i32,
    /// The on-disk `type` field.
    pub ftype: u32,
    pub size:  i32,
    pub next:  i32,
    /// Byte offset of the header in the file.
    pub pos:   u64,
}

impl TagHeader {
    #[inline]
    pub fn data_pos(&self) -> u64 {
        self.pos + 16
    }

    #[inline]
    pub fn payload_len(&self) -> usize {
        self.size.max(0) as usize
    }

    /// Offset of the following header, `None` at the end of the chain.
    pub fn next_pos(&self) -> Option<u64> {
        match self.next {
            FIFFV_NEXT_SEQ => Some(self.data_pos() + self.payload_len() as u64),
            n if n > 0     => Some(n as u64),
            _              => None,
        }
    }
}

/// Decode one 16-byte header.
fn decode_header(buf: &[u8; 16], pos: u64) -> TagHeader {
    TagHeader {
        kind:  i32::from_be_bytes(word(buf, 0)),
        ftype: u32::from_be_bytes(word(buf, 4)),
        size:  i32::from_be_bytes(word(buf, 8)),
        next:  i32::from_be_bytes(word(buf, 12)),
        pos,
    }
}

#[inline]
fn word(buf: &[u8], at: usize) -> [u8; 4] {
    [buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]
}

/// Read the header stored at byte offset `pos`.
pub fn read_tag_header<R: Read + Seek>(reader: &mut R, pos: u64) -> Result<TagHeader> {
    reader.seek(SeekFrom::Start(pos))
        .with_context(|| format!("seek to tag header @ {pos:#x}"))?;
    let mut buf = [0u8; 16];
    reader.read_exact(&mut buf)
        .with_context(|| format!("read tag header @ {pos:#x}"))?;
    Ok(decode_header(&buf, pos))
}

/// Whole payload as bytes.
pub fn read_raw_bytes<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<Vec<u8>> {
    reader
        .seek(SeekFrom::Start(tag.data_pos()))
        .with_context(|| format!("seek to payload of tag {} @ {:#x}", tag.kind, tag.pos))?;
    let mut buf = vec![0u8; tag.payload_len()];
    reader.read_exact(&mut buf)
        .with_context(|| format!("read {} payload bytes of tag {}", buf.len(), tag.kind))?;
    Ok(buf)
}

// ── Scalars and arrays ────────────────────────────────────────────────────

fn first<T: Copy>(values: Vec<T>, tag: &TagHeader) -> Result<T> {
    match values.first() {
        Some(&v) => Ok(v),
        None => bail!("tag {} @ {:#x} has an empty payload", tag.kind, tag.pos),
    }
}

pub fn read_i32<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<i32> {
    first(read_i32_array(reader, tag)?, tag)
}

pub fn read_f32<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<f32> {
    first(read_f32_array(reader, tag)?, tag)
}

pub fn read_i32_array<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<Vec<i32>> {
    let raw = read_raw_bytes(reader, tag)?;
    Ok(raw.chunks_exact(4).map(|b| i32::from_be_bytes(word(b, 0))).collect())
}

pub fn read_f32_array<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<Vec<f32>> {
    let raw = read_raw_bytes(reader, tag)?;
    Ok(raw.chunks_exact(4).map(|b| f32::from_be_bytes(word(b, 0))).collect())
}

pub fn read_f64_array<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<Vec<f64>> {
    let raw = read_raw_bytes(reader, tag)?;
    Ok(raw
        .chunks_exact(8)
        .map(|b| f64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .collect())
}

/// Floating-point array payload widened to f64, whatever its stored width.
pub fn read_float_array<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<Vec<f64>> {
    match tag.ftype {
        FIFFT_FLOAT  => Ok(read_f32_array(reader, tag)?.into_iter().map(f64::from).collect()),
        FIFFT_DOUBLE => read_f64_array(reader, tag),
        FIFFT_INT    => Ok(read_i32_array(reader, tag)?.into_iter().map(f64::from).collect()),
        other => bail!("tag {} has non-numeric type {other}", tag.kind),
    }
}

/// Latin-1 string payload (not NUL-terminated on disk).
pub fn read_string<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<String> {
    Ok(read_raw_bytes(reader, tag)?.into_iter().map(char::from).collect())
}

/// Decode a `FIFFT_DIR_ENTRY_STRUCT` payload: one 16-byte entry per tag,
/// whose last word is the tag's file position.
pub fn read_directory<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<Vec<TagHeader>> {
    if tag.ftype != FIFFT_DIR_ENTRY_STRUCT {
        bail!("expected FIFFT_DIR_ENTRY_STRUCT, got type {}", tag.ftype);
    }
    let raw = read_raw_bytes(reader, tag)?;
    Ok(raw
        .chunks_exact(16)
        .map(|b| {
            let mut entry = [0u8; 16];
            entry.copy_from_slice(b);
            let mut header = decode_header(&entry, u32::from_be_bytes(word(b, 12)) as u64);
            header.next = FIFFV_NEXT_NONE;
            header
        })
        .collect())
}
