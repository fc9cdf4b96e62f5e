//! FIFF reader for processed raw runs and their annotation sidecars.
//!
//! ```no_run
//! use meeg::fiff::{open_raw, read_annotations};
//!
//! let raw = open_raw("data/processed/subject1/run1/processed.fif").unwrap();
//! println!("{} channels @ {} Hz", raw.info.n_chan, raw.info.sfreq);
//! let annot = read_annotations("data/processed/subject1/run1/processed_annotations.fif").unwrap();
//! println!("{} markers", annot.len());
//! ```
pub mod annotations;
pub mod constants;
pub mod info;
pub mod raw;
pub mod tag;
pub mod tree;

pub use annotations::{read_annotations, Annotations};
pub use info::{ChannelInfo, MeasInfo, read_meas_info};
pub use raw::{open_raw, BufferRecord, RawFif};
pub use tag::{read_tag_header, TagHeader};
pub use tree::{load_tree, Node};
