//! A left and a right primer taken together: product geometry, pair
//! complementarity, pair mispriming and the pair penalty.

use crate::alignment_oracle::OracleKind;
use crate::candidate_list::CandidateLists;
use crate::error::Result;
use crate::oligo::{Oligo, OligoList, OligoType, PairStats};
use crate::oligo_evaluator::OligoEvaluator;
use crate::sequence_args::Interval;
use crate::settings::{Settings, Task};
use crate::thermodynamics::long_seq_tm;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Pair penalties closer than this count as equal.
const QUALITY_EPSILON: f64 = 1e-6;

/// Indices refer to the sorted candidate lists the pair was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimerPair {
    pub left: usize,
    pub right: usize,
    pub internal: Option<usize>,
    /// Penalty, lower is better.
    pub quality: f64,
    pub product_size: i64,
    pub product_tm: f64,
    pub product_tm_oligo_tm_diff: f64,
    /// Optimal annealing temperature after Rychlik.
    pub t_opt_a: f64,
    pub diff_tm: f64,
    pub compl_any: f64,
    pub compl_end: f64,
    pub repeat_sim: f64,
    pub repeat_name: Option<String>,
    pub template_mispriming: Option<f64>,
    /// `None` without targets, otherwise whether the product spans one.
    pub spans_target: Option<bool>,
    pub must_use: bool,
}

impl PrimerPair {
    fn new(left: usize, right: usize, product_size: i64) -> Self {
        Self {
            left,
            right,
            internal: None,
            quality: 0.0,
            product_size,
            product_tm: 0.0,
            product_tm_oligo_tm_diff: 0.0,
            t_opt_a: 0.0,
            diff_tm: 0.0,
            compl_any: 0.0,
            compl_end: 0.0,
            repeat_sim: 0.0,
            repeat_name: None,
            template_mispriming: None,
            spans_target: None,
            must_use: false,
        }
    }
}

/// Lower penalty first. Among equal penalties the pair with the rightmost left
/// primer, then the leftmost right primer, then the shorter primers wins.
pub fn compare_pairs(a: &PrimerPair, b: &PrimerPair, left: &OligoList, right: &OligoList) -> Ordering {
    if (a.quality - b.quality).abs() > QUALITY_EPSILON {
        return a.quality.total_cmp(&b.quality);
    }
    let (al, bl) = (&left.oligos[a.left], &left.oligos[b.left]);
    let (ar, br) = (&right.oligos[a.right], &right.oligos[b.right]);
    bl.start
        .cmp(&al.start)
        .then_with(|| ar.start.cmp(&br.start))
        .then_with(|| al.length.cmp(&bl.length))
        .then_with(|| ar.length.cmp(&br.length))
}

/// The primers sit on opposite sides of some target without touching it.
pub fn pair_spans_target(left: &Oligo, right: &Oligo, targets: &[Interval]) -> bool {
    let last_of_left = left.last() as i64;
    let first_of_right = right.first() as i64;
    targets.iter().any(|t| {
        last_of_left <= t.end() && first_of_right >= t.start && last_of_left < first_of_right
    })
}

/// Largest summed similarity of both primers to a single library entry,
/// truncated to whole units.
pub fn pair_repeat_sim(left: &Oligo, right: &Oligo) -> (f64, Option<String>) {
    let (Some(l), Some(r)) = (&left.repeat_sim, &right.repeat_sim) else {
        return (0.0, None);
    };
    if l.scores.is_empty() {
        return (0.0, None);
    }
    let mut max = 0.0;
    for (a, b) in l.scores.iter().zip(&r.scores) {
        let w = (a + b).trunc();
        if w > max {
            max = w;
        }
    }
    (max, l.name.clone())
}

/// Whether a candidate left primer comes too close to the left primer of a
/// chosen pair. A negative distance never rejects, zero rejects only the very
/// same primer.
pub fn left_overlaps_used(candidate: &Oligo, used: &Oligo, min_dist: i64) -> bool {
    overlaps_used(candidate, used, min_dist)
}

pub fn right_overlaps_used(candidate: &Oligo, used: &Oligo, min_dist: i64) -> bool {
    overlaps_used(candidate, used, min_dist)
}

fn overlaps_used(candidate: &Oligo, used: &Oligo, min_dist: i64) -> bool {
    match min_dist {
        d if d < 0 => false,
        0 => candidate.start == used.start && candidate.length == used.length,
        d => (candidate.three_prime() as i64 - used.three_prime() as i64).abs() < d,
    }
}

/// How a lazily completed oligo check went.
enum Completion {
    Passed,
    Failed,
}

/// Runs the alignment checks the list stage skipped, structure first.
fn complete_structure(eval: &OligoEvaluator, list: &mut OligoList, i: usize) -> Result<Completion> {
    let OligoList { oligos, stats, .. } = list;
    let h = &mut oligos[i];
    if h.self_any.is_none() {
        eval.self_complementarity(h, stats)?;
        if !h.ok_or_must_use() {
            return Ok(Completion::Failed);
        }
    }
    if eval.settings().oligo_oracle_kind() == OracleKind::Thermodynamic && h.hairpin.is_none() {
        eval.hairpin(h, stats)?;
        if !h.ok_or_must_use() {
            return Ok(Completion::Failed);
        }
    }
    Ok(Completion::Passed)
}

fn complete_mispriming(eval: &OligoEvaluator, list: &mut OligoList, i: usize) -> Result<Completion> {
    let OligoList { oligos, stats, .. } = list;
    let h = &mut oligos[i];
    let mut ran = false;
    if h.repeat_sim.is_none() {
        eval.repeat_similarity(h, stats)?;
        ran = true;
    }
    if h.ok_or_must_use() && h.template_mispriming.is_none() {
        eval.template_mispriming(h, stats)?;
        ran = true;
    }
    if ran && !h.ok_or_must_use() {
        return Ok(Completion::Failed);
    }
    Ok(Completion::Passed)
}

/// Characterizes left `l` with right `r`. Returns `None` if the pair is
/// unacceptable; the reason goes to `stats` when `update_stats` is set.
/// Checks the primers skipped in the list stage are run here, and their
/// results stay on the oligos.
pub fn characterize_pair(
    eval: &OligoEvaluator,
    lists: &mut CandidateLists,
    l: usize,
    r: usize,
    stats: &mut PairStats,
    update_stats: bool,
) -> Result<Option<PrimerPair>> {
    let settings = eval.settings();
    let t = eval.template();
    let (left, right) = (&lists.left.oligos[l], &lists.right.oligos[r]);
    let mut pair = PrimerPair::new(l, r, right.start as i64 - left.start as i64 + 1);
    if update_stats {
        stats.considered += 1;
    }

    let mut must_use = settings.task == Task::CheckPrimers;
    if left.must_use && right.must_use {
        must_use = true;
    }
    if pair.product_size < 1 {
        stats.reversed += 1;
        return Ok(None);
    }
    pair.must_use = must_use;

    if !t.targets.is_empty() {
        let spans = pair_spans_target(left, right, &t.targets);
        pair.spans_target = Some(spans);
        if !spans {
            if update_stats {
                stats.target += 1;
            }
            if !must_use {
                return Ok(None);
            }
        }
    }

    let left_span = (left.first() as i64, left.last() as i64);
    let right_span = (right.first() as i64, right.last() as i64);
    if !t.ok_regions.admits_pair(left_span, right_span) {
        if update_stats {
            stats.not_in_any_ok_region += 1;
        }
        if !must_use {
            return Ok(None);
        }
    }

    pair.product_tm = long_seq_tm(
        &t.trimmed,
        left.start,
        pair.product_size as usize,
        &settings.primer.conditions,
    )?;
    let min_oligo_tm = left.tm.min(right.tm);
    pair.product_tm_oligo_tm_diff = pair.product_tm - min_oligo_tm;
    pair.t_opt_a = 0.3 * min_oligo_tm + 0.7 * pair.product_tm - 14.9;

    if settings.product_min_tm.is_some_and(|m| pair.product_tm < m) {
        stats.low_tm += 1;
        if !must_use {
            return Ok(None);
        }
    }
    if settings.product_max_tm.is_some_and(|m| pair.product_tm > m) {
        stats.high_tm += 1;
        if !must_use {
            return Ok(None);
        }
    }

    pair.diff_tm = (left.tm - right.tm).abs();
    if pair.diff_tm > settings.max_diff_tm {
        stats.temp_diff += 1;
        if !must_use {
            return Ok(None);
        }
    }

    for (list, i) in [(&mut lists.left, l), (&mut lists.right, r)] {
        if let Completion::Failed = complete_structure(eval, list, i)? {
            stats.considered -= 1;
            if !must_use {
                return Ok(None);
            }
        }
    }
    for (list, i) in [(&mut lists.left, l), (&mut lists.right, r)] {
        if let Completion::Failed = complete_mispriming(eval, list, i)? {
            stats.considered -= 1;
            if !must_use {
                return Ok(None);
            }
        }
    }

    let (left, right) = (&lists.left.oligos[l], &lists.right.oligos[r]);
    let oracle = eval.oracle(OligoType::Left);
    let left_seq = eval.oligo_sequence(left);
    let right_seq = eval.oligo_sequence(right);

    pair.compl_any = oracle.any(&left_seq, &right_seq)?;
    if pair.compl_any > settings.pair_compl_any_threshold() {
        stats.compl_any += 1;
        if !must_use {
            return Ok(None);
        }
    }

    let end_threshold = settings.pair_compl_end_threshold();
    pair.compl_end = oracle.pair_end(&left_seq, &right_seq)?;
    if pair.compl_end > end_threshold {
        stats.compl_end += 1;
        if !must_use {
            return Ok(None);
        }
    }
    // the thermodynamic pair end already covers both orientations
    if oracle.kind() == OracleKind::Dp {
        let reverse = oracle.end(&right_seq, &left_seq)?;
        if reverse > pair.compl_end {
            if reverse > end_threshold {
                stats.compl_end += 1;
                if !must_use {
                    return Ok(None);
                }
            }
            pair.compl_end = reverse;
        }
    }

    let (repeat_sim, repeat_name) = pair_repeat_sim(left, right);
    pair.repeat_sim = repeat_sim;
    pair.repeat_name = repeat_name;
    if pair.repeat_sim > settings.pair_repeat_compl {
        stats.repeat_sim += 1;
        if !must_use {
            return Ok(None);
        }
    }

    if settings.need_pair_template_mispriming() {
        let l_fwd = left.template_mispriming.unwrap_or(0.0);
        let l_rev = left.template_mispriming_r.unwrap_or(0.0);
        let r_fwd = right.template_mispriming.unwrap_or(0.0);
        let r_rev = right.template_mispriming_r.unwrap_or(0.0);
        let value = (l_fwd + r_rev).max(l_rev + r_fwd);
        pair.template_mispriming = Some(value);
        if settings.pair_template_threshold().is_some_and(|m| value > m) {
            stats.template_mispriming += 1;
            if !must_use {
                return Ok(None);
            }
        }
    }

    Ok(Some(pair))
}

/// Pair penalty: the weighted primer penalties plus the pair terms.
pub fn pair_penalty(
    settings: &Settings,
    pair: &PrimerPair,
    left: &Oligo,
    right: &Oligo,
    internal: Option<&Oligo>,
) -> f64 {
    let w = &settings.pair_weights;
    let lower_tm = left.tm.min(right.tm);
    let mut sum = 0.0;

    if w.primer_quality != 0.0 {
        sum += w.primer_quality * (left.quality + right.quality);
    }
    if let Some(intl) = internal {
        if w.io_quality != 0.0 {
            sum += w.io_quality * intl.quality;
        }
    }
    if w.diff_tm != 0.0 {
        sum += w.diff_tm * pair.diff_tm;
    }

    match settings.oligo_oracle_kind() {
        OracleKind::Dp => {
            sum += w.compl_any * pair.compl_any + w.compl_end * pair.compl_end;
        }
        kind @ OracleKind::Thermodynamic => {
            sum += kind.penalty(w.compl_any_th, pair.compl_any, lower_tm, w.temp_cutoff);
            sum += kind.penalty(w.compl_end_th, pair.compl_end, lower_tm, w.temp_cutoff);
        }
    }

    if let Some(opt_tm) = settings.product_opt_tm {
        if pair.product_tm > opt_tm {
            sum += w.product_tm_gt * (pair.product_tm - opt_tm);
        }
        if pair.product_tm < opt_tm {
            sum += w.product_tm_lt * (opt_tm - pair.product_tm);
        }
    }

    if let Some(opt_size) = settings.product_opt_size {
        let opt_size = opt_size as i64;
        if pair.product_size > opt_size {
            sum += w.product_size_gt * (pair.product_size - opt_size) as f64;
        }
        if pair.product_size < opt_size {
            sum += w.product_size_lt * (opt_size - pair.product_size) as f64;
        }
    }

    if w.repeat_sim != 0.0 {
        sum += w.repeat_sim * pair.repeat_sim;
    }

    if let Some(value) = pair.template_mispriming {
        let kind = settings.template_oracle_kind();
        let weight = kind.select(w.template_mispriming, w.template_mispriming_th);
        sum += kind.penalty(weight, value, lower_tm, w.temp_cutoff);
    }

    sum
}

/// The best acceptable internal oligo strictly between the two primers, with
/// its remaining checks completed. `None` if there is none.
pub fn choose_internal_oligo(
    eval: &OligoEvaluator,
    lists: &mut CandidateLists,
    l: usize,
    r: usize,
) -> Result<Option<usize>> {
    let left_last = lists.left.oligos[l].last();
    let right_first = lists.right.oligos[r].first();
    let thermodynamic = eval.settings().oligo_oracle_kind() == OracleKind::Thermodynamic;
    let OligoList { oligos, stats, .. } = &mut lists.internal;

    let mut min = 1_000_000.0;
    let mut best = None;
    for (k, h) in oligos.iter_mut().enumerate() {
        if !(h.start > left_last && h.last() < right_first && h.quality < min && h.ok_or_must_use()) {
            continue;
        }
        if h.self_any.is_none() {
            eval.self_complementarity(h, stats)?;
            if !h.ok_or_must_use() {
                continue;
            }
        }
        if thermodynamic && h.hairpin.is_none() {
            eval.hairpin(h, stats)?;
            if !h.ok_or_must_use() {
                continue;
            }
        }
        if h.repeat_sim.is_none() {
            eval.repeat_similarity(h, stats)?;
            if !h.ok_or_must_use() {
                continue;
            }
        }
        min = h.quality;
        best = Some(k);
    }
    Ok(best)
}
