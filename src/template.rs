//! The template as the engine sees it: coordinates shifted to 0-based positions
//! inside the included region, upcased views of both strands, and the task
//! specific forced positions filled in.

use crate::dna_sequence::{dna_to_upper, find_stop_codon, reverse_complement};
use crate::error::Diagnostics;
use crate::sequence_args::{Interval, MAX_INTERVALS, OkRegion, SequenceArgs};
use crate::settings::{Settings, Task};

const TARGET_TAG: &str = "SEQUENCE_TARGET";
const EXCLUDED_TAG: &str = "SEQUENCE_EXCLUDED_REGION";
const INTERNAL_EXCLUDED_TAG: &str = "SEQUENCE_INTERNAL_EXCLUDED_REGION";
const OK_REGION_TAG: &str = "SEQUENCE_PRIMER_PAIR_OK_REGION_LIST";
const JUNCTION_TAG: &str = "SEQUENCE_OVERLAP_JUNCTION_LIST";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OkRegions {
    pub regions: Vec<OkRegion>,
    /// Some region accepts any left primer.
    pub any_left: bool,
    pub any_right: bool,
    /// Some region accepts any pair.
    pub any_pair: bool,
}

impl OkRegions {
    fn new(regions: Vec<OkRegion>) -> Self {
        Self {
            any_left: regions.iter().any(|r| r.left.is_none()),
            any_right: regions.iter().any(|r| r.right.is_none()),
            any_pair: regions
                .iter()
                .any(|r| r.left.is_none() && r.right.is_none()),
            regions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn admits_left(&self, first: i64, last: i64) -> bool {
        self.is_empty()
            || self.any_left
            || self
                .regions
                .iter()
                .any(|r| r.left.is_some_and(|i| i.contains(first, last)))
    }

    pub fn admits_right(&self, first: i64, last: i64) -> bool {
        self.is_empty()
            || self.any_right
            || self
                .regions
                .iter()
                .any(|r| r.right.is_some_and(|i| i.contains(first, last)))
    }

    /// Both primers must fall into the same region.
    pub fn admits_pair(&self, left: (i64, i64), right: (i64, i64)) -> bool {
        if self.is_empty() || self.any_pair {
            return true;
        }
        self.regions.iter().any(|r| match (r.left, r.right) {
            (None, Some(ri)) => ri.contains(right.0, right.1),
            (Some(li), None) => li.contains(left.0, left.1),
            (Some(li), Some(ri)) => li.contains(left.0, left.1) && ri.contains(right.0, right.1),
            (None, None) => true,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    pub sequence_id: String,
    /// Full sequence as given.
    pub sequence: Vec<u8>,
    /// Included region, 0-based on `sequence`.
    pub incl_start: i64,
    pub incl_len: i64,
    /// Upcased included region; unrecognized bases are `N`.
    pub trimmed: Vec<u8>,
    /// Included region with the caller's case, for lowercase masking.
    pub trimmed_orig: Vec<u8>,
    pub upcased: Vec<u8>,
    pub upcased_r: Vec<u8>,
    pub unrecognized_base: Option<u8>,
    pub targets: Vec<Interval>,
    pub excluded: Vec<Interval>,
    pub internal_excluded: Vec<Interval>,
    pub ok_regions: OkRegions,
    pub junctions: Vec<i64>,
    /// Per-base quality over the full sequence.
    pub quality: Vec<i32>,
    pub left_input: Option<Vec<u8>>,
    pub right_input: Option<Vec<u8>>,
    pub internal_input: Option<Vec<u8>>,
    pub start_codon_pos: Option<i64>,
    pub force_left_start: Option<i64>,
    pub force_left_end: Option<i64>,
    pub force_right_start: Option<i64>,
    pub force_right_end: Option<i64>,
    pub upstream_stop_codon: Option<usize>,
    pub downstream_stop_codon: Option<usize>,
}

impl Template {
    /// Applies the task rules and coordinate shifts. Returns `None` after
    /// recording a per-sequence error.
    pub fn adjust(settings: &Settings, args: &SequenceArgs, diag: &mut Diagnostics) -> Option<Self> {
        let mut sequence = args.sequence.as_ref().map(|s| s.as_bytes().to_vec());
        if settings.task == Task::CheckPrimers && sequence.is_none() {
            sequence = fake_sequence(settings, args);
        }
        if settings.task == Task::Sequencing && args.included_region.is_some() {
            diag.sequence_error("Task pick_sequencing_primers cannot be combined with included region");
            return None;
        }
        let sequence = match sequence {
            Some(s) => s,
            None => {
                if settings.task == Task::CheckPrimers {
                    diag.sequence_error("No primers provided");
                } else {
                    diag.sequence_error("Missing SEQUENCE tag");
                }
                return None;
            }
        };
        for (tag, count) in [
            (TARGET_TAG, args.targets.len()),
            (EXCLUDED_TAG, args.excluded_regions.len()),
            (INTERNAL_EXCLUDED_TAG, args.internal_excluded_regions.len()),
            (OK_REGION_TAG, args.ok_regions.len()),
        ] {
            if count > MAX_INTERVALS {
                diag.sequence_error(format!("Too many elements for tag {tag}"));
                return None;
            }
        }

        let seq_len = sequence.len() as i64;
        let fbi = settings.first_base_index;
        let mut ret = Self {
            sequence_id: args.sequence_id.clone(),
            targets: args.targets.clone(),
            excluded: args.excluded_regions.clone(),
            internal_excluded: args.internal_excluded_regions.clone(),
            ok_regions: OkRegions::new(args.ok_regions.clone()),
            junctions: args.overlap_junctions.clone(),
            quality: args.quality.clone(),
            left_input: caller_oligo(args.left_primer.as_deref()),
            right_input: caller_oligo(args.right_primer.as_deref()),
            internal_input: caller_oligo(args.internal_oligo.as_deref()),
            start_codon_pos: args.start_codon_pos,
            force_left_start: args.force_left_start,
            force_left_end: args.force_left_end,
            force_right_start: args.force_right_start,
            force_right_end: args.force_right_end,
            ..Self::default()
        };

        match settings.task {
            Task::Cloning => match args.included_region {
                None => {
                    ret.force_left_start = Some(fbi);
                    ret.force_right_start = Some(seq_len + fbi - 1);
                }
                Some(incl) => {
                    ret.force_left_start = Some(incl.start);
                    ret.force_right_start = Some(incl.end());
                }
            },
            Task::Discriminative => {
                if let [target] = args.targets.as_slice() {
                    ret.force_left_end = Some(target.start);
                    ret.force_right_end = Some(target.end());
                } else {
                    diag.sequence_error(
                        "Task pick_discriminative_primers requires exactly one SEQUENCE_TARGET",
                    );
                }
            }
            _ => {}
        }

        let incl = args.included_region.unwrap_or(Interval::new(fbi, seq_len));
        if settings.task == Task::Sequencing && ret.targets.is_empty() {
            ret.targets.push(Interval::new(fbi, seq_len));
        }

        ret.incl_start = incl.start - fbi;
        ret.incl_len = incl.len;
        let incl_start = ret.incl_start;
        ret.start_codon_pos = ret.start_codon_pos.map(|p| p - fbi);
        for pos in [
            &mut ret.force_left_start,
            &mut ret.force_left_end,
            &mut ret.force_right_start,
            &mut ret.force_right_end,
        ] {
            *pos = pos.map(|p| p - fbi - incl_start);
        }

        if ret.included_region_valid_for(seq_len) {
            let from = ret.incl_start as usize;
            let to = from + ret.incl_len as usize;
            ret.trimmed_orig = sequence[from..to].to_vec();
            let (trimmed, offending) = dna_to_upper(&ret.trimmed_orig, false);
            ret.trimmed = trimmed;
            ret.unrecognized_base = offending;
            ret.upcased = dna_to_upper(&sequence, true).0;
            ret.upcased_r = reverse_complement(&ret.upcased);
        }
        ret.sequence = sequence;

        if !ret.check_and_adjust_intervals(fbi, diag) {
            return None;
        }
        ret.start_codon_pos = ret.start_codon_pos.map(|p| p - incl_start);
        if !ret.check_and_adjust_junctions(fbi, diag) {
            return None;
        }
        if !ret.ok_regions.is_empty() {
            ret.optimize_ok_regions(settings);
        }
        if diag.sequence_errors.is_empty() {
            Some(ret)
        } else {
            None
        }
    }

    fn included_region_valid_for(&self, seq_len: i64) -> bool {
        self.incl_start >= 0 && self.incl_len >= 0 && self.incl_start + self.incl_len <= seq_len
    }

    pub fn included_region_valid(&self) -> bool {
        self.included_region_valid_for(self.sequence.len() as i64)
    }

    fn check_and_adjust_intervals(&mut self, fbi: i64, diag: &mut Diagnostics) -> bool {
        let seq_len = self.sequence.len() as i64;
        let (incl_start, incl_len) = (self.incl_start, self.incl_len);
        let check = |tag: &str, list: Vec<&mut Interval>, diag: &mut Diagnostics| {
            adjust_intervals(tag, list, seq_len, fbi, incl_start, incl_len, diag)
        };
        check(TARGET_TAG, self.targets.iter_mut().collect(), diag)
            && check(EXCLUDED_TAG, self.excluded.iter_mut().collect(), diag)
            && check(
                INTERNAL_EXCLUDED_TAG,
                self.internal_excluded.iter_mut().collect(),
                diag,
            )
            && check(
                OK_REGION_TAG,
                self.ok_regions
                    .regions
                    .iter_mut()
                    .filter_map(|r| r.left.as_mut())
                    .collect(),
                diag,
            )
            && check(
                OK_REGION_TAG,
                self.ok_regions
                    .regions
                    .iter_mut()
                    .filter_map(|r| r.right.as_mut())
                    .collect(),
                diag,
            )
    }

    fn check_and_adjust_junctions(&mut self, fbi: i64, diag: &mut Diagnostics) -> bool {
        let seq_len = self.sequence.len() as i64;
        let mut warned = false;
        for pos in self.junctions.iter_mut() {
            *pos -= fbi;
            if *pos >= seq_len {
                diag.sequence_error(format!("{JUNCTION_TAG} beyond end of sequence"));
                return false;
            }
            if *pos < 0 {
                diag.sequence_error(format!("Negative {JUNCTION_TAG} length"));
                return false;
            }
            *pos -= self.incl_start;
            if (*pos < 0 || *pos > self.incl_len) && !warned {
                diag.warning(format!("{JUNCTION_TAG} outside of INCLUDED_REGION"));
                warned = true;
            }
        }
        true
    }

    /// Narrows every ok region to the positions that can still form a product
    /// with the other side. Regions that admit any pair, and templates with
    /// caller primers, are left alone.
    fn optimize_ok_regions(&mut self, settings: &Settings) {
        if !settings.optimize_ok_regions
            || self.left_input.is_some()
            || self.right_input.is_some()
            || self.ok_regions.any_pair
        {
            return;
        }
        let pmin = settings.min_product_size() as i64;
        let pmax = settings.max_product_size() as i64;
        let omin = settings.primer.min_size as i64;
        let omax = settings.primer.max_size as i64;
        let limit = self.sequence.len() as i64;
        let bounds = |i: Interval| (i.start, i.end());

        for region in self.ok_regions.regions.iter_mut() {
            let mut left = region.left.map(bounds);
            let mut right = region.right.map(bounds);
            if let Some((ls, le)) = left {
                let (new_rs, new_re) = (ls + pmin - omax - 1, le - omin + pmax + 1);
                let (rs, re) = match right {
                    Some((rs, re)) => (rs.max(new_rs), re.min(new_re)),
                    None => (new_rs, new_re),
                };
                right = Some((rs.max(0), re.min(limit)));
            }
            if let Some((rs, re)) = right {
                let (new_ls, new_le) = (rs + omin - pmax - 1, re - pmin + omax + 1);
                let (ls, le) = match left {
                    Some((ls, le)) => (ls.max(new_ls), le.min(new_le)),
                    None => (new_ls, new_le),
                };
                left = Some((ls.max(0), le.min(limit)));
            }
            let to_interval = |(s, e): (i64, i64)| Interval::new(s, e - s + 1);
            region.left = left.map(to_interval);
            region.right = right.map(to_interval);
        }
        log::debug!(
            "{}: narrowed {} ok regions",
            self.sequence_id,
            self.ok_regions.regions.len()
        );
        self.ok_regions.any_left = false;
        self.ok_regions.any_right = false;
    }

    /// Stop codons in frame with the start codon, on included-region coordinates.
    pub fn compute_stop_codons(&mut self) {
        if let Some(scp) = self.start_codon_pos {
            self.upstream_stop_codon = find_stop_codon(&self.trimmed, scp, false);
            self.downstream_stop_codon = find_stop_codon(&self.trimmed, scp, true);
        }
    }

    pub fn trimmed_len(&self) -> usize {
        self.trimmed.len()
    }

    pub fn has_quality(&self) -> bool {
        !self.quality.is_empty()
    }

    /// Quality at a position of the included region.
    pub fn quality_at(&self, pos: usize) -> i32 {
        self.quality
            .get(pos + self.incl_start as usize)
            .copied()
            .unwrap_or(0)
    }
}

fn adjust_intervals(
    tag: &str,
    list: Vec<&mut Interval>,
    seq_len: i64,
    fbi: i64,
    incl_start: i64,
    incl_len: i64,
    diag: &mut Diagnostics,
) -> bool {
    let mut warned = false;
    for interval in list {
        interval.start -= fbi;
        if interval.start + interval.len > seq_len {
            diag.sequence_error(format!("{tag} beyond end of sequence"));
            return false;
        }
        interval.start -= incl_start;
        if (interval.start < 0 || interval.start + interval.len > incl_len) && !warned {
            diag.warning(format!("{tag} outside of INCLUDED_REGION"));
            warned = true;
        }
        if interval.len < 0 {
            diag.sequence_error(format!("Negative {tag} length"));
            return false;
        }
    }
    true
}

/// Empty caller oligos count as absent.
fn caller_oligo(oligo: Option<&str>) -> Option<Vec<u8>> {
    oligo
        .filter(|s| !s.is_empty())
        .map(|s| s.as_bytes().to_vec())
}

/// For checking primers without a template: the primers separated by enough
/// `N` to span the product size.
fn fake_sequence(settings: &Settings, args: &SequenceArgs) -> Option<Vec<u8>> {
    let left = args.left_primer.as_deref().map(str::as_bytes);
    let right = args
        .right_primer
        .as_deref()
        .map(|s| reverse_complement(s.as_bytes()));
    let internal = args.internal_oligo.as_deref().map(str::as_bytes);
    if left.is_none() && right.is_none() && internal.is_none() {
        return None;
    }
    let product_size = match settings.product_opt_size {
        Some(size) => size as i64,
        None => settings
            .product_size_ranges
            .first()
            .map(|(min, max)| *max as i64 - *min as i64)
            .unwrap_or(0),
    };
    let used: usize = [left.map(<[u8]>::len), right.as_ref().map(Vec::len), internal.map(<[u8]>::len)]
        .into_iter()
        .flatten()
        .sum();
    let to_fill = product_size - used as i64;
    let first = to_fill / 2;
    let second = to_fill - first;

    let mut ret = Vec::with_capacity(product_size.max(0) as usize);
    ret.extend_from_slice(left.unwrap_or_default());
    ret.extend(std::iter::repeat_n(b'N', first.max(0) as usize));
    ret.extend_from_slice(internal.unwrap_or_default());
    ret.extend(std::iter::repeat_n(b'N', second.max(0) as usize));
    if let Some(right) = right {
        ret.extend_from_slice(&right);
    }
    Some(ret)
}
