//! Block tree of a FIF file.
//!
//! The flat tag directory is folded into nested [`Node`]s at every
//! `FIFF_BLOCK_START` / `FIFF_BLOCK_END` pair, mirroring
//! `mne._fiff.tree.make_dir_tree`.
use std::io::{Read, Seek};
use anyhow::{Context, Result};

use super::constants::*;
use super::tag::{read_directory, read_i32, read_tag_header, TagHeader};

/// One block. The root node has `block == 0`.
#[derive(Debug, Default, Clone)]
pub struct Node {
    pub block:    i32,
    /// Non-structural tags directly inside this block.
    pub entries:  Vec<TagHeader>,
    pub children: Vec<Node>,
}

impl Node {
    fn new(block: i32) -> Self {
        Self { block, ..Self::default() }
    }

    /// Depth-first search for the first block of `kind`, self included.
    pub fn find_block(&self, kind: i32) -> Option<&Node> {
        if self.block == kind {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_block(kind))
    }

    /// First direct entry of `kind` (children are not searched).
    pub fn find_tag(&self, kind: i32) -> Option<&TagHeader> {
        self.entries.iter().find(|e| e.kind == kind)
    }
}

/// Fold a flat directory into a tree, reading each block kind from the file.
///
/// Unbalanced trailing blocks are closed into their parent.
pub fn read_tree<R: Read + Seek>(reader: &mut R, directory: &[TagHeader]) -> Result<Node> {
    let mut stack = vec![Node::new(0)];
    for tag in directory {
        match tag.kind {
            FIFF_BLOCK_START => {
                let kind = read_i32(reader, tag)
                    .with_context(|| format!("block kind @ {:#x}", tag.pos))?;
                stack.push(Node::new(kind));
            }
            FIFF_BLOCK_END if stack.len() > 1 => {
                close_top(&mut stack);
            }
            FIFF_BLOCK_END => {}
            _ => {
                if let Some(top) = stack.last_mut() {
                    top.entries.push(*tag);
                }
            }
        }
    }
    while stack.len() > 1 {
        close_top(&mut stack);
    }
    Ok(stack.pop().unwrap_or_default())
}

fn close_top(stack: &mut Vec<Node>) {
    if let Some(done) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(done);
        }
    }
}

/// Walk the `next` chain from offset 0 and collect every header.
pub fn scan_directory<R: Read + Seek>(reader: &mut R) -> Result<Vec<TagHeader>> {
    let mut directory = Vec::new();
    let mut pos = Some(0_u64);
    while let Some(p) = pos {
        let tag = read_tag_header(reader, p)?;
        pos = tag.next_pos();
        directory.push(tag);
    }
    Ok(directory)
}

/// The directory embedded behind `FIFF_DIR_POINTER`, if the file has a usable one.
pub fn try_load_directory<R: Read + Seek>(reader: &mut R) -> Result<Option<Vec<TagHeader>>> {
    let id = read_tag_header(reader, 0)?;
    if id.kind != FIFF_FILE_ID {
        return Ok(None);
    }
    let Some(next) = id.next_pos() else { return Ok(None) };
    let ptr = read_tag_header(reader, next)?;
    if ptr.kind != FIFF_DIR_POINTER {
        return Ok(None);
    }
    let dirpos = read_i32(reader, &ptr)?;
    if dirpos <= 0 {
        return Ok(None);
    }
    let dir = read_tag_header(reader, dirpos as u64)?;
    if dir.ftype != FIFFT_DIR_ENTRY_STRUCT {
        return Ok(None);
    }
    read_directory(reader, &dir).map(Some)
}

/// Directory (fast path, then full scan) folded into a tree.
pub fn load_tree<R: Read + Seek>(reader: &mut R) -> Result<Node> {
    let directory = match try_load_directory(reader)? {
        Some(d) => d,
        None    => scan_directory(reader)?,
    };
    read_tree(reader, &directory)
}
