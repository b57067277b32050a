//! Building the candidate lists: every acceptable oligo in a window of 3'
//! positions, the single best one per window for sequencing, or the oligos a
//! caller supplied or placed.

use crate::dna_sequence::{eq_ignore_case, get_range_safe, reverse_complement};
use crate::error::{Diagnostics, Result};
use crate::oligo::{Oligo, OligoList, OligoType, OutputKind, PairStats};
use crate::oligo_evaluator::OligoEvaluator;
use crate::settings::Task;
use log::debug;

/// Quality every sequencing primer has to beat.
const BEST_PRIMER_START_QUALITY: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateLists {
    pub left: OligoList,
    pub right: OligoList,
    pub internal: OligoList,
}

impl Default for CandidateLists {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateLists {
    pub fn new() -> Self {
        Self {
            left: OligoList::new(OligoType::Left),
            right: OligoList::new(OligoType::Right),
            internal: OligoList::new(OligoType::Internal),
        }
    }

    pub fn list(&self, kind: OligoType) -> &OligoList {
        match kind {
            OligoType::Left => &self.left,
            OligoType::Right => &self.right,
            OligoType::Internal => &self.internal,
        }
    }

    pub fn list_mut(&mut self, kind: OligoType) -> &mut OligoList {
        match kind {
            OligoType::Left => &mut self.left,
            OligoType::Right => &mut self.right,
            OligoType::Internal => &mut self.internal,
        }
    }

    /// Leftmost 5' position of an accepted left primer, or the template length.
    pub fn left_extreme(&self, n: i64) -> i64 {
        self.left
            .oligos
            .iter()
            .map(|o| o.start as i64)
            .min()
            .unwrap_or(n)
    }

    /// Rightmost 5' position of an accepted right primer, or 0.
    pub fn right_extreme(&self) -> i64 {
        self.right
            .oligos
            .iter()
            .map(|o| o.start as i64)
            .max()
            .unwrap_or(0)
    }

    /// Checks a single candidate; acceptable ones get their penalty.
    fn consider(&mut self, eval: &OligoEvaluator, mut h: Oligo) -> Result<Oligo> {
        let list = self.list_mut(h.kind);
        list.stats.considered += 1;
        eval.check(&mut h, &mut list.stats)?;
        if h.ok_or_must_use() {
            h.quality = eval.penalty(&h);
        }
        Ok(h)
    }

    /// Every acceptable oligo whose 3' end lies in `start..=start+length`.
    /// Scans from the right; a problem that a longer oligo cannot fix ends
    /// the scan at that 3' position.
    pub fn pick_primer_range(
        &mut self,
        eval: &OligoEvaluator,
        kind: OligoType,
        start: i64,
        length: i64,
    ) -> Result<()> {
        let geometry = Geometry::new(eval, kind);
        for i in (start..=start + length).rev() {
            for j in geometry.min_size..=geometry.max_size {
                let Some(h_start) = geometry.placement(i, j) else {
                    if geometry.past_end(i, j) {
                        break;
                    }
                    continue;
                };
                let h = self.consider(eval, Oligo::new(kind, h_start, j as usize))?;
                if h.ok_or_must_use() {
                    self.list_mut(kind).oligos.push(h);
                } else if h.problems.has_five_prime_problem() {
                    break;
                }
            }
        }
        let list = self.list_mut(kind);
        list.stats.ok = list.len() as i64;
        Ok(())
    }

    /// The single best oligo with its 3' end in `start..start+length`.
    pub fn pick_only_best_primer(
        &mut self,
        eval: &OligoEvaluator,
        kind: OligoType,
        start: i64,
        length: i64,
        diag: &mut Diagnostics,
    ) -> Result<()> {
        let geometry = Geometry::new(eval, kind);
        let mut best: Option<Oligo> = None;
        for i in (start..start + length).rev() {
            for j in geometry.min_size..=geometry.max_size {
                let Some(h_start) = geometry.placement(i, j) else {
                    continue;
                };
                let h = self.consider(eval, Oligo::new(kind, h_start, j as usize))?;
                if h.ok_or_must_use() {
                    let to_beat = best
                        .as_ref()
                        .map_or(BEST_PRIMER_START_QUALITY, |b| b.quality);
                    if h.quality < to_beat {
                        best = Some(h);
                    }
                } else if h.problems.has_five_prime_problem() {
                    break;
                }
            }
        }
        let fbi = eval.settings().first_base_index;
        match best {
            Some(h) => {
                let list = self.list_mut(kind);
                list.oligos.push(h);
                list.stats.ok += 1;
            }
            None => {
                let side = if kind == OligoType::Right { "right" } else { "left" };
                diag.warning(format!(
                    "No {side} primer found in range {} - {}",
                    start + fbi,
                    start + length + fbi
                ));
            }
        }
        Ok(())
    }

    /// Places a caller-supplied oligo at every position where the template
    /// matches it.
    pub fn add_one_primer(
        &mut self,
        eval: &OligoEvaluator,
        kind: OligoType,
        oligo: &[u8],
        diag: &mut Diagnostics,
    ) -> Result<()> {
        let test = match kind {
            OligoType::Right => reverse_complement(oligo),
            _ => oligo.to_vec(),
        };
        let geometry = Geometry::new(eval, kind);
        let trimmed = &eval.template().trimmed;
        let j = test.len() as i64;
        for i in (0..=geometry.n).rev() {
            let Some(h_start) = geometry.placement_unbounded(i, j) else {
                continue;
            };
            let first = match kind {
                OligoType::Right => i,
                _ => h_start as i64,
            };
            let matches = get_range_safe(trimmed, first as usize, test.len())
                .is_some_and(|s| eq_ignore_case(s, &test));
            if !matches {
                continue;
            }
            let mut h = Oligo::new(kind, h_start, test.len());
            h.must_use = eval.settings().pick_anyway;
            let h = self.consider(eval, h)?;
            if h.ok_or_must_use() {
                self.list_mut(kind).oligos.push(h);
            }
        }
        let list = self.list_mut(kind);
        list.stats.ok = list.len() as i64;
        if list.len() > 1 {
            diag.warning(format!(
                "More than one position in template for input oligo {}",
                String::from_utf8_lossy(oligo)
            ));
        }
        Ok(())
    }

    /// One oligo at a fixed 5' position and length; ignored if it does not fit
    /// on the template.
    pub fn add_one_primer_by_position(
        &mut self,
        eval: &OligoEvaluator,
        kind: OligoType,
        start: i64,
        length: i64,
    ) -> Result<()> {
        let n = eval.template().trimmed_len() as i64;
        let fits = length > 0
            && start >= 0
            && start < n
            && match kind {
                OligoType::Right => start - length + 1 >= 0,
                _ => start + length <= n,
            };
        if fits {
            let mut h = Oligo::new(kind, start as usize, length as usize);
            h.must_use = eval.settings().pick_anyway;
            let h = self.consider(eval, h)?;
            if h.ok_or_must_use() {
                self.list_mut(kind).oligos.push(h);
            }
        }
        let list = self.list_mut(kind);
        list.stats.ok = list.len() as i64;
        Ok(())
    }

    /// Oligos with a forced 5' and/or 3' position; a missing end lets every
    /// allowed length through.
    pub fn pick_primers_by_position(
        &mut self,
        eval: &OligoEvaluator,
        kind: OligoType,
        start: Option<i64>,
        end: Option<i64>,
        diag: &mut Diagnostics,
    ) -> Result<()> {
        let args = eval.settings().oligo_args(kind);
        let sizes = args.min_size as i64..=args.max_size as i64;
        match (start, end) {
            (Some(start), Some(end)) => {
                let length = match kind {
                    OligoType::Right => start - end + 1,
                    _ => end - start + 1,
                };
                self.add_one_primer_by_position(eval, kind, start, length)?;
            }
            (Some(start), None) => {
                for j in sizes {
                    self.add_one_primer_by_position(eval, kind, start, j)?;
                }
            }
            (None, Some(end)) => {
                for j in sizes {
                    let start = match kind {
                        OligoType::Right => end + j - 1,
                        _ => end - j + 1,
                    };
                    self.add_one_primer_by_position(eval, kind, start, j)?;
                }
            }
            (None, None) => {
                diag.warning("Calculation error in forced primer position calculation");
            }
        }
        Ok(())
    }

    /// Lists for the detection tasks, bounded by the targets and the smallest
    /// product. Returns false if no pair can be formed from what was found.
    pub fn make_detection_lists(
        &mut self,
        eval: &OligoEvaluator,
        pair_stats: &mut PairStats,
        diag: &mut Diagnostics,
    ) -> Result<bool> {
        let settings = eval.settings();
        let t = eval.template();
        let n = t.trimmed_len() as i64;
        let pr_min = settings.min_product_size() as i64;
        let list_output = eval.output() == OutputKind::Lists;
        let primer = &settings.primer;
        let (min_size, max_size) = (primer.min_size as i64, primer.max_size as i64);

        let mut tar_r = 0;
        let mut tar_l = n;
        for target in &t.targets {
            tar_r = tar_r.max(target.start);
            tar_l = tar_l.min(target.end());
        }
        if settings.default_position_penalties() {
            if tar_r == 0 {
                tar_r = n;
            }
            if tar_l == n {
                tar_l = 0;
            }
        } else {
            tar_r = n;
            tar_l = 0;
        }

        if settings.pick_left_primer {
            let f_b = if list_output {
                n - 1
            } else if tar_r - 1 < n - pr_min + max_size - 1
                && !(settings.pick_anyway && t.left_input.is_some())
            {
                tar_r - 1
            } else {
                n - pr_min + max_size - 1
            };
            let forced = (
                t.force_left_start.filter(|&p| p > -1),
                t.force_left_end.filter(|&p| p > -1),
            );
            if let Some(input) = &t.left_input {
                self.add_one_primer(eval, OligoType::Left, input, diag)?;
            } else if forced.0.is_some() || forced.1.is_some() {
                self.pick_primers_by_position(eval, OligoType::Left, forced.0, forced.1, diag)?;
            } else {
                self.pick_primer_range(eval, OligoType::Left, min_size - 1, f_b - min_size + 1)?;
            }
        }

        if settings.pick_right_primer {
            let r_b = if list_output {
                0
            } else if tar_l + 1 > pr_min - max_size
                && !(settings.pick_anyway && t.right_input.is_some())
            {
                tar_l + 1
            } else {
                pr_min - max_size
            };
            let forced = (
                t.force_right_start.filter(|&p| p > -1),
                t.force_right_end.filter(|&p| p > -1),
            );
            if let Some(input) = &t.right_input {
                self.add_one_primer(eval, OligoType::Right, input, diag)?;
            } else if forced.0.is_some() || forced.1.is_some() {
                self.pick_primers_by_position(eval, OligoType::Right, forced.0, forced.1, diag)?;
            } else {
                self.pick_primer_range(eval, OligoType::Right, r_b, n - min_size - r_b + 1)?;
            }
        }

        if (settings.pick_left_primer && self.left.is_empty())
            || (settings.pick_right_primer && self.right.is_empty())
        {
            debug!(
                "{}: no acceptable {}",
                t.sequence_id,
                if self.left.is_empty() { "left primers" } else { "right primers" }
            );
            return Ok(false);
        }
        let both_given = t.left_input.is_some() && t.right_input.is_some();
        if !both_given
            && settings.pick_left_primer
            && settings.pick_right_primer
            && self.right_extreme() - self.left_extreme(n) < pr_min - 1
        {
            debug!("{}: primer lists too close for the smallest product", t.sequence_id);
            pair_stats.product = 1;
            pair_stats.considered = 1;
            return Ok(false);
        }
        Ok(true)
    }

    /// Internal oligos: the caller's one if given, else every acceptable one.
    pub fn make_internal_list(&mut self, eval: &OligoEvaluator, diag: &mut Diagnostics) -> Result<()> {
        let t = eval.template();
        if let Some(input) = &t.internal_input {
            return self.add_one_primer(eval, OligoType::Internal, input, diag);
        }
        if eval.settings().task == Task::CheckPrimers {
            return Ok(());
        }
        let n = t.trimmed_len() as i64;
        let min_size = eval.settings().internal.min_size as i64;
        self.pick_primer_range(eval, OligoType::Internal, min_size - 1, n - min_size)
    }

    /// Every acceptable oligo on the whole template, for each requested kind.
    pub fn make_complete_lists(&mut self, eval: &OligoEvaluator) -> Result<()> {
        let settings = eval.settings();
        let n = eval.template().trimmed_len() as i64;
        if settings.pick_left_primer {
            let min = settings.primer.min_size as i64;
            self.pick_primer_range(eval, OligoType::Left, min - 1, n - min)?;
        }
        if settings.pick_right_primer {
            let min = settings.primer.min_size as i64;
            self.pick_primer_range(eval, OligoType::Right, 0, n - min + 1)?;
        }
        if settings.pick_internal_oligo {
            let min = settings.internal.min_size as i64;
            self.pick_primer_range(eval, OligoType::Internal, min - 1, n - min)?;
        }
        Ok(())
    }

    /// The caller's oligos, each checked where it matches the template.
    pub fn add_primers_to_check(&mut self, eval: &OligoEvaluator, diag: &mut Diagnostics) -> Result<()> {
        let t = eval.template();
        for (kind, input) in [
            (OligoType::Left, &t.left_input),
            (OligoType::Right, &t.right_input),
            (OligoType::Internal, &t.internal_input),
        ] {
            if let Some(input) = input {
                self.add_one_primer(eval, kind, input, diag)?;
            }
        }
        Ok(())
    }

    /// Walks each target with evenly spaced sequencing primers and keeps the
    /// best one near every ideal position.
    pub fn pick_sequencing_lists(&mut self, eval: &OligoEvaluator, diag: &mut Diagnostics) -> Result<()> {
        let settings = eval.settings();
        let seq = &settings.sequencing;
        let t = eval.template();
        let n = t.trimmed_len() as i64;
        let min = settings.primer.min_size as i64;
        let both = settings.pick_left_primer && settings.pick_right_primer;

        for target in &t.targets {
            let mut primer_nr: i64 = 1;
            let mut sequenced_len;
            if both {
                sequenced_len = seq.interval;
                while sequenced_len < target.len {
                    primer_nr += 1;
                    sequenced_len = seq.spacing * (primer_nr - 1) + seq.interval;
                }
            } else {
                sequenced_len = seq.spacing;
                while sequenced_len < target.len {
                    primer_nr += 1;
                    sequenced_len = seq.spacing * primer_nr;
                }
            }
            let extra = (sequenced_len - target.len) / 2;

            for step in 0..primer_nr {
                let mut pos_f = target.start - extra + seq.spacing * step - seq.lead;
                let mut pos_r = if both {
                    target.start - extra + seq.spacing * step + seq.interval + seq.lead
                } else {
                    target.start - extra + seq.spacing * (step + 1) + seq.lead
                };
                if pos_f < min - 1 {
                    pos_f = min - 1;
                }
                if pos_f > n - min - 1 {
                    pos_f = n - min - 1;
                    diag.warning("Calculation error in forward sequencing position calculation");
                }
                if pos_r < min - 1 {
                    pos_r = min - 1;
                    diag.warning("Calculation error in reverse sequencing position calculation");
                }
                if pos_r > n - min - 1 {
                    pos_r = n - min - 1;
                }

                if settings.pick_left_primer {
                    let (start, length) = sequencing_window(pos_f, seq.accuracy, n);
                    self.pick_only_best_primer(eval, OligoType::Left, start, length, diag)?;
                }
                if settings.pick_right_primer {
                    let (start, length) = sequencing_window(pos_r, seq.accuracy, n);
                    self.pick_only_best_primer(eval, OligoType::Right, start, length, diag)?;
                }
            }
        }
        if self.left.len() > settings.num_return || self.right.len() > settings.num_return {
            diag.warning("Increase PRIMER_NUM_RETURN to obtain all sequencing primers");
        }
        Ok(())
    }
}

/// Window of 3' positions around an ideal sequencing primer position.
fn sequencing_window(pos: i64, accuracy: i64, n: i64) -> (i64, i64) {
    let (start, rest) = if pos - accuracy < 0 {
        (0, pos + 1)
    } else {
        (pos - accuracy, accuracy)
    };
    (start, (rest + accuracy).min(n - start))
}

/// How 3' positions and lengths map to oligo placements.
struct Geometry {
    kind: OligoType,
    n: i64,
    pr_min: i64,
    pairs: bool,
    min_size: i64,
    max_size: i64,
}

impl Geometry {
    fn new(eval: &OligoEvaluator, kind: OligoType) -> Self {
        let settings = eval.settings();
        let args = settings.oligo_args(kind);
        Self {
            kind,
            n: eval.template().trimmed_len() as i64,
            pr_min: settings.min_product_size() as i64,
            pairs: eval.output() == OutputKind::Pairs,
            min_size: args.min_size as i64,
            max_size: args.max_size as i64,
        }
    }

    /// Longer oligos at this 3' position run off the template.
    fn past_end(&self, i: i64, j: i64) -> bool {
        match self.kind {
            OligoType::Right => i + j > self.n,
            _ => i - j < -1,
        }
    }

    /// 5' position of the oligo of length `j` with its 3' end at `i`, or
    /// `None` if it cannot be part of a product or leaves the template.
    fn placement(&self, i: i64, j: i64) -> Option<usize> {
        if self.past_end(i, j) || i >= self.n || i < 0 {
            return None;
        }
        self.placement_unbounded(i, j)
    }

    /// Like [`Geometry::placement`], without requiring `i` on the template.
    fn placement_unbounded(&self, i: i64, j: i64) -> Option<usize> {
        if self.past_end(i, j) {
            return None;
        }
        match self.kind {
            OligoType::Right => {
                if i + j < self.pr_min && self.pairs {
                    return None;
                }
                usize::try_from(i + j - 1).ok()
            }
            _ => {
                if i - j > self.n - self.pr_min - 1 && self.pairs && self.kind == OligoType::Left {
                    return None;
                }
                usize::try_from(i - j + 1).ok()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repeat_library::Libraries;
    use crate::sequence_args::{Interval, SequenceArgs};
    use crate::settings::Settings;
    use crate::template::Template;

    const SEQ: &str = "GGCAGTCGAATTGGTCCGCGTGTAAATGTCTCTATCGTAGGCTCGTCCGTGAAGGCCCTGAGCAGGTGTGGGACGCGCTGGAGGAGCCGAGGACTGATTGGAGTGCTTGCCGACCCACCC";

    fn template(settings: &Settings, args: &SequenceArgs) -> Template {
        let mut diag = Diagnostics::default();
        Template::adjust(settings, args, &mut diag).unwrap()
    }

    #[test]
    fn test_sequencing_window() {
        assert_eq!(sequencing_window(5, 20, 100), (0, 26));
        assert_eq!(sequencing_window(50, 20, 100), (30, 40));
        assert_eq!(sequencing_window(95, 20, 100), (75, 25));
    }

    #[test]
    fn test_complete_left_list() {
        let settings = Settings {
            pick_right_primer: false,
            ..Settings::default()
        };
        let t = template(&settings, &SequenceArgs::new("t", SEQ));
        let libs = Libraries::default();
        let eval = OligoEvaluator::new(&settings, &t, &libs, OutputKind::Lists);
        let mut lists = CandidateLists::new();
        lists.make_complete_lists(&eval).unwrap();
        assert!(lists.right.is_empty());
        assert!(lists.internal.is_empty());
        assert!(
            lists
                .left
                .oligos
                .iter()
                .any(|o| o.start == 10 && o.length == 20)
        );
        for o in &lists.left.oligos {
            assert!(o.problems.is_ok());
            assert!(o.last() < SEQ.len());
            assert!(o.tm >= 57.0 && o.tm <= 63.0);
            assert!(o.self_any.is_some());
        }
        assert_eq!(lists.left.stats.ok, lists.left.len() as i64);
        assert!(lists.left.stats.considered > lists.left.stats.ok);
    }

    #[test]
    fn test_every_placement_is_considered() {
        let mut settings = Settings::default();
        // nothing that stops the 5' extension at a 3' position
        settings.primer.max_poly_x = 100;
        settings.primer.max_self_any = 100.0;
        let t = template(&settings, &SequenceArgs::new("t", SEQ));
        let libs = Libraries::default();
        let eval = OligoEvaluator::new(&settings, &t, &libs, OutputKind::Lists);
        let mut lists = CandidateLists::new();
        lists.make_complete_lists(&eval).unwrap();

        let n = SEQ.len();
        let lengths = settings.primer.min_size..=settings.primer.max_size;
        let left: usize = (0..n)
            .map(|end| lengths.clone().filter(|&len| len <= end + 1).count())
            .sum();
        let right: usize = (0..n)
            .map(|end| lengths.clone().filter(|&len| end + len <= n).count())
            .sum();
        assert_eq!(left, right);
        assert_eq!(lists.left.stats.considered, left as i64);
        assert_eq!(lists.right.stats.considered, right as i64);
        assert_eq!(lists.left.stats.ok, lists.left.len() as i64);
        assert_eq!(lists.right.stats.ok, lists.right.len() as i64);
    }

    #[test]
    fn test_detection_lists_respect_target() {
        let settings = Settings {
            product_size_ranges: vec![(60, 120)],
            ..Settings::default()
        };
        let mut args = SequenceArgs::new("t", SEQ);
        args.targets = vec![Interval::new(50, 10)];
        let t = template(&settings, &args);
        let libs = Libraries::default();
        let eval = OligoEvaluator::new(&settings, &t, &libs, OutputKind::Pairs);
        let mut lists = CandidateLists::new();
        let mut pair_stats = PairStats::default();
        let mut diag = Diagnostics::default();
        let ok = lists
            .make_detection_lists(&eval, &mut pair_stats, &mut diag)
            .unwrap();
        assert!(ok);
        assert!(lists.left.oligos.iter().all(|o| o.last() <= 49));
        assert!(lists.right.oligos.iter().all(|o| o.first() >= 60));
        assert!(lists.left.oligos.iter().any(|o| o.start == 10 && o.length == 20));
        assert!(lists.right.oligos.iter().any(|o| o.start == 99 && o.length == 20));
        assert_eq!(pair_stats, PairStats::default());
    }

    #[test]
    fn test_detection_fails_without_candidates() {
        let settings = Settings::default();
        let t = template(&settings, &SequenceArgs::new("t", "A".repeat(150)));
        let libs = Libraries::default();
        let eval = OligoEvaluator::new(&settings, &t, &libs, OutputKind::Pairs);
        let mut lists = CandidateLists::new();
        let mut diag = Diagnostics::default();
        let ok = lists
            .make_detection_lists(&eval, &mut PairStats::default(), &mut diag)
            .unwrap();
        assert!(!ok);
        assert!(lists.left.is_empty());
        assert!(lists.left.stats.considered > 0);
    }

    #[test]
    fn test_caller_primers() {
        let settings = Settings::default();
        let mut args = SequenceArgs::new("t", SEQ);
        args.left_primer = Some("ttggtccgcgtgtaaatgtc".into());
        args.right_primer = Some("CAATCAGTCCTCGGCTCCTC".into());
        let t = template(&settings, &args);
        let libs = Libraries::default();
        let eval = OligoEvaluator::new(&settings, &t, &libs, OutputKind::Pairs);
        let mut lists = CandidateLists::new();
        let mut diag = Diagnostics::default();
        lists.add_primers_to_check(&eval, &mut diag).unwrap();
        assert_eq!(lists.left.len(), 1);
        assert_eq!((lists.left.oligos[0].start, lists.left.oligos[0].length), (10, 20));
        assert!(!lists.left.oligos[0].must_use);
        assert_eq!(lists.right.len(), 1);
        assert_eq!(lists.right.oligos[0].start, 99);
        assert!(lists.internal.is_empty());
        assert!(diag.warnings.is_empty());
    }

    #[test]
    fn test_caller_primer_at_two_sites() {
        let settings = Settings::default();
        let mut seq = SEQ.to_string();
        seq.replace_range(60..80, &SEQ[10..30]);
        let mut args = SequenceArgs::new("t", seq);
        args.left_primer = Some(SEQ[10..30].to_string());
        let t = template(&settings, &args);
        let libs = Libraries::default();
        let eval = OligoEvaluator::new(&settings, &t, &libs, OutputKind::Lists);
        let mut lists = CandidateLists::new();
        let mut diag = Diagnostics::default();
        lists
            .add_one_primer(&eval, OligoType::Left, SEQ[10..30].as_bytes(), &mut diag)
            .unwrap();
        let starts: Vec<usize> = lists.left.oligos.iter().map(|o| o.start).collect();
        assert_eq!(starts, vec![60, 10]);
        assert_eq!(
            diag.warnings,
            vec![format!(
                "More than one position in template for input oligo {}",
                &SEQ[10..30]
            )]
        );
    }

    #[test]
    fn test_forced_positions() {
        let settings = Settings::default();
        let t = template(&settings, &SequenceArgs::new("t", SEQ));
        let libs = Libraries::default();
        let eval = OligoEvaluator::new(&settings, &t, &libs, OutputKind::Pairs);
        let mut diag = Diagnostics::default();

        let mut lists = CandidateLists::new();
        lists
            .pick_primers_by_position(&eval, OligoType::Left, Some(10), Some(29), &mut diag)
            .unwrap();
        assert_eq!(lists.left.stats.considered, 1);
        assert_eq!((lists.left.oligos[0].start, lists.left.oligos[0].length), (10, 20));

        let mut lists = CandidateLists::new();
        lists
            .pick_primers_by_position(&eval, OligoType::Left, Some(10), None, &mut diag)
            .unwrap();
        assert_eq!(lists.left.stats.considered, 10);
        assert!(lists.left.oligos.iter().all(|o| o.start == 10));

        let mut lists = CandidateLists::new();
        lists
            .pick_primers_by_position(&eval, OligoType::Right, None, Some(80), &mut diag)
            .unwrap();
        assert!(lists.right.oligos.iter().all(|o| o.first() == 80));
        assert!(lists.right.oligos.iter().any(|o| o.start == 99));

        // off the template
        let mut lists = CandidateLists::new();
        lists
            .add_one_primer_by_position(&eval, OligoType::Left, 110, 20)
            .unwrap();
        assert_eq!(lists.left.stats.considered, 0);

        assert!(diag.warnings.is_empty());
        lists
            .pick_primers_by_position(&eval, OligoType::Left, None, None, &mut diag)
            .unwrap();
        assert_eq!(
            diag.warnings,
            vec!["Calculation error in forced primer position calculation".to_string()]
        );
    }

    #[test]
    fn test_sequencing_walk() {
        let mut settings = Settings {
            task: Task::Sequencing,
            pick_right_primer: false,
            ..Settings::default()
        };
        settings.sequencing.lead = 10;
        settings.sequencing.spacing = 60;
        settings.sequencing.interval = 30;
        settings.sequencing.accuracy = 10;
        let t = template(&settings, &SequenceArgs::new("t", SEQ));
        assert_eq!(t.targets, vec![Interval::new(0, 120)]);
        let libs = Libraries::default();
        let eval = OligoEvaluator::new(&settings, &t, &libs, OutputKind::Lists);
        let mut lists = CandidateLists::new();
        let mut diag = Diagnostics::default();
        lists.pick_sequencing_lists(&eval, &mut diag).unwrap();
        for o in &lists.left.oligos {
            let end = o.last();
            assert!((7..27).contains(&end) || (40..60).contains(&end), "{end}");
            assert_eq!(o.position_penalty, 0.0);
        }
        let missing = diag
            .warnings
            .iter()
            .filter(|w| w.starts_with("No left primer found in range"))
            .count();
        assert_eq!(lists.left.len() + missing, 2);
    }
}
