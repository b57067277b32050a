//! Mispriming and mishybridization libraries: named sequences an oligo must not
//! resemble, each with a weight applied to its alignment score.

use crate::PRIMER_ALIGNERS;
use crate::dna_sequence::{dna_to_upper, reverse_complement};
use crate::error::{PrimerError, Result};
use crate::oligo::OligoType;
use anyhow::anyhow;
use bio::io::fasta;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct RepeatEntry {
    pub name: String,
    pub seq: Vec<u8>,
    pub seq_rc: Vec<u8>,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepeatLibrary {
    entries: Vec<RepeatEntry>,
}

impl RepeatLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, seq: &[u8], weight: f64) -> Result<()> {
        if seq.is_empty() {
            return Err(PrimerError::Library(format!(
                "Empty sequence in repeat library entry '{name}'"
            )));
        }
        let (upper, offending) = dna_to_upper(seq, true);
        if let Some(c) = offending {
            return Err(PrimerError::Library(format!(
                "Illegal character in repeat library entry '{name}': {}",
                c as char
            )));
        }
        self.entries.push(RepeatEntry {
            name: name.to_string(),
            seq_rc: reverse_complement(&upper),
            seq: upper,
            weight,
        });
        Ok(())
    }

    /// Reads FASTA records. A `weight=<number>` token in the description sets
    /// the weight of that entry; the default is 1.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut ret = Self::new();
        for record in fasta::Reader::new(reader).records() {
            let record = record.map_err(|e| PrimerError::Library(e.to_string()))?;
            let weight = parse_weight(record.desc())?;
            ret.add(record.id(), record.seq(), weight)?;
        }
        Ok(ret)
    }

    pub fn load_fasta(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .map_err(|e| anyhow!("Could not open repeat library '{}': {e}", path.display()))?;
        Self::from_reader(file)
            .map_err(|e| anyhow!("Could not read repeat library '{}': {e}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RepeatEntry] {
        &self.entries
    }

    pub fn name(&self, i: usize) -> Option<&str> {
        self.entries.get(i).map(|e| e.name.as_str())
    }

    /// Weighted similarity of an oligo to entry `i`. `seq` is the oligo on the
    /// forward strand, `seq_r` its reverse complement. Right primers are
    /// compared to the reverse complement of the entry.
    pub fn score(
        &self,
        i: usize,
        kind: OligoType,
        seq: &[u8],
        seq_r: &[u8],
        consensus: bool,
    ) -> Result<f64> {
        let entry = self
            .entries
            .get(i)
            .ok_or_else(|| PrimerError::Library(format!("No repeat library entry {i}")))?;
        let a = &*PRIMER_ALIGNERS;
        let raw = match kind {
            OligoType::Left => {
                let args = if consensus { &a.local_end_ambig } else { &a.local_end };
                args.primer_score(seq, &entry.seq)?
            }
            OligoType::Internal => {
                let args = if consensus { &a.local_ambig } else { &a.local };
                args.primer_score(seq, &entry.seq)?
            }
            OligoType::Right => {
                let args = if consensus { &a.local_end_ambig } else { &a.local };
                args.primer_score(seq_r, &entry.seq_rc)?
            }
        };
        Ok(entry.weight * raw)
    }
}

/// The library screened for primers and the one screened for internal oligos.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Libraries {
    pub mispriming: RepeatLibrary,
    pub mishyb: RepeatLibrary,
}

impl Libraries {
    pub fn for_kind(&self, kind: OligoType) -> &RepeatLibrary {
        match kind {
            OligoType::Internal => &self.mishyb,
            _ => &self.mispriming,
        }
    }
}

fn parse_weight(desc: Option<&str>) -> Result<f64> {
    let token = desc
        .into_iter()
        .flat_map(str::split_whitespace)
        .find_map(|t| t.strip_prefix("weight="));
    match token {
        None => Ok(1.0),
        Some(t) => t
            .parse::<f64>()
            .map_err(|_| PrimerError::Library(format!("Illegal weight '{t}' in repeat library"))),
    }
}
