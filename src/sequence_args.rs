//! Per-sequence input: the template, its regions and any caller-supplied oligos.
//! Positions are in user coordinates, i.e. offset by the first base index.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Most intervals accepted per region list.
pub const MAX_INTERVALS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: i64,
    pub len: i64,
}

impl Interval {
    pub fn new(start: i64, len: i64) -> Self {
        Self { start, len }
    }

    /// Last covered position.
    pub fn end(&self) -> i64 {
        self.start + self.len - 1
    }

    pub fn contains(&self, first: i64, last: i64) -> bool {
        first >= self.start && last <= self.end()
    }
}

/// One allowed placement of a pair: the left primer in `left`, the right one in
/// `right`. A missing side accepts any position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OkRegion {
    pub left: Option<Interval>,
    pub right: Option<Interval>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceArgs {
    pub sequence_id: String,
    pub sequence: Option<String>,
    pub included_region: Option<Interval>,
    pub targets: Vec<Interval>,
    pub excluded_regions: Vec<Interval>,
    pub internal_excluded_regions: Vec<Interval>,
    pub ok_regions: Vec<OkRegion>,
    /// Positions a primer must span, e.g. exon-exon junctions.
    pub overlap_junctions: Vec<i64>,
    /// One score per base; empty when unknown.
    pub quality: Vec<i32>,
    pub left_primer: Option<String>,
    pub right_primer: Option<String>,
    pub internal_oligo: Option<String>,
    pub start_codon_pos: Option<i64>,
    pub force_left_start: Option<i64>,
    pub force_left_end: Option<i64>,
    pub force_right_start: Option<i64>,
    pub force_right_end: Option<i64>,
}

impl SequenceArgs {
    pub fn new(sequence_id: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            sequence_id: sequence_id.into(),
            sequence: Some(sequence.into()),
            ..Self::default()
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn has_caller_primers(&self) -> bool {
        self.left_primer.is_some() || self.right_primer.is_some()
    }
}
