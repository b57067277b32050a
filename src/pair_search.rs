//! Greedy search for the best primer pairs. Both primer lists must be sorted by
//! penalty: the search stops scanning as soon as the primer penalties alone
//! exceed the best pair found so far. Characterized pairs are memoized for the
//! whole search, across product size ranges.

use crate::candidate_list::CandidateLists;
use crate::error::Result;
use crate::oligo::PairStats;
use crate::oligo_evaluator::OligoEvaluator;
use crate::primer_pair::{
    PrimerPair, characterize_pair, choose_internal_oligo, compare_pairs, left_overlaps_used,
    pair_penalty, right_overlaps_used,
};
use crate::settings::Task;
use log::debug;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Slot of a characterized pair in the search arena.
pub type PairHandle = usize;

/// Memo of characterized pairs. Each right primer has a row mapping left
/// primer indices to a stored pair, or to `None` if that pair is known to be
/// unusable or already chosen.
#[derive(Debug, Default)]
pub struct PairSearchState {
    rows: Vec<Option<HashMap<usize, Option<PairHandle>>>>,
    arena: Vec<Option<PrimerPair>>,
    free: Vec<PairHandle>,
    /// Highest left index looked at for each right primer in the current
    /// range; statistics are only collected beyond it.
    max_j_seen: Vec<i64>,
}

impl PairSearchState {
    pub fn new(num_right: usize) -> Self {
        Self {
            rows: vec![None; num_right],
            arena: vec![],
            free: vec![],
            max_j_seen: vec![-1; num_right],
        }
    }

    pub fn pair(&self, handle: PairHandle) -> Option<&PrimerPair> {
        self.arena.get(handle).and_then(Option::as_ref)
    }

    /// Number of pairs held in the arena.
    pub fn stored(&self) -> usize {
        self.arena.len() - self.free.len()
    }

    fn lookup(&self, i: usize, j: usize) -> Option<Option<PairHandle>> {
        self.rows[i].as_ref().and_then(|row| row.get(&j).copied())
    }

    fn store(&mut self, i: usize, j: usize, pair: Option<PrimerPair>) -> Option<PairHandle> {
        let handle = pair.map(|pair| match self.free.pop() {
            Some(h) => {
                self.arena[h] = Some(pair);
                h
            }
            None => {
                self.arena.push(Some(pair));
                self.arena.len() - 1
            }
        });
        self.rows[i].get_or_insert_with(HashMap::new).insert(j, handle);
        handle
    }

    fn release(&mut self, handle: PairHandle) -> Option<PrimerPair> {
        let pair = self.arena.get_mut(handle).and_then(Option::take);
        if pair.is_some() {
            self.free.push(handle);
        }
        pair
    }

    /// Forgets every pair of right primer `i`.
    fn drop_row(&mut self, i: usize) {
        if let Some(row) = self.rows[i].take() {
            for handle in row.into_values().flatten() {
                self.release(handle);
            }
        }
    }

    /// Takes a pair out of the memo and marks it as used.
    fn take(&mut self, i: usize, j: usize) -> Option<PrimerPair> {
        let handle = self.lookup(i, j).flatten()?;
        if let Some(row) = self.rows[i].as_mut() {
            row.insert(j, None);
        }
        self.release(handle)
    }

    fn reset_cursors(&mut self) {
        self.max_j_seen.iter_mut().for_each(|m| *m = -1);
    }
}

/// Best pair of the current pass.
#[derive(Clone, Copy)]
struct Best {
    i: usize,
    j: usize,
    handle: PairHandle,
}

/// Picks up to `num_return` pairs, best first within each product size range.
/// Ranges are tried in order; the next one is only used once the current one
/// yields nothing more. Oligos too close to a chosen one are marked as
/// overlapping and skipped from then on.
pub fn choose_pairs(
    eval: &OligoEvaluator,
    lists: &mut CandidateLists,
    stats: &mut PairStats,
) -> Result<Vec<PrimerPair>> {
    let settings = eval.settings();
    let t = eval.template();
    let ranges = &settings.product_size_ranges;
    let quality_weight = settings.pair_weights.primer_quality;
    let pick_internal =
        settings.pick_internal_oligo && settings.pick_left_primer && settings.pick_right_primer;
    let mut best_pairs = vec![];
    if lists.left.is_empty() || lists.right.is_empty() || ranges.is_empty() {
        return Ok(best_pairs);
    }

    let mut state = PairSearchState::new(lists.right.len());
    let mut range_index = 0;
    loop {
        let (pr_min, pr_max) = (ranges[range_index].0 as i64, ranges[range_index].1 as i64);
        let mut best: Option<Best> = None;
        let mut best_quality = f64::MAX;

        for i in 0..lists.right.len() {
            let right = &lists.right.oligos[i];
            if !right.ok_or_must_use() {
                state.drop_row(i);
                continue;
            }
            if quality_weight * (right.quality + lists.left.oligos[0].quality) > best_quality {
                break;
            }
            if right.overlaps {
                stats.overlaps_oligo_in_better_pair += 1;
                state.drop_row(i);
                continue;
            }

            for j in 0..lists.left.len() {
                // lazily completed checks may have rejected the right primer
                let right = &lists.right.oligos[i];
                if !right.ok_or_must_use() {
                    state.drop_row(i);
                    break;
                }
                let left = &lists.left.oligos[j];
                if !left.ok_or_must_use() {
                    continue;
                }
                if quality_weight * (left.quality + right.quality) > best_quality {
                    break;
                }

                let update_stats = j as i64 > state.max_j_seen[i];
                if update_stats {
                    state.max_j_seen[i] = j as i64;
                }
                if left.overlaps {
                    if update_stats {
                        stats.overlaps_oligo_in_better_pair += 1;
                    }
                    continue;
                }

                let must_use =
                    settings.task == Task::CheckPrimers || (left.must_use && right.must_use);
                if !t.junctions.is_empty() && !left.overlaps_junction && !right.overlaps_junction {
                    if update_stats {
                        stats.considered += 1;
                        stats.does_not_overlap_a_required_point += 1;
                    }
                    if !must_use {
                        continue;
                    }
                }

                let product_size = right.start as i64 - left.start as i64 + 1;
                if product_size < pr_min || product_size > pr_max {
                    if update_stats {
                        if !must_use {
                            stats.considered += 1;
                        }
                        stats.product += 1;
                    }
                    if !must_use {
                        continue;
                    }
                }

                let handle = match state.lookup(i, j) {
                    Some(None) => continue,
                    Some(Some(handle)) => {
                        if update_stats {
                            stats.considered += 1;
                            stats.ok += 1;
                        }
                        handle
                    }
                    None => {
                        let Some(mut pair) =
                            characterize_pair(eval, lists, j, i, stats, update_stats)?
                        else {
                            state.store(i, j, None);
                            continue;
                        };
                        if pick_internal {
                            match choose_internal_oligo(eval, lists, j, i)? {
                                Some(k) => pair.internal = Some(k),
                                None => {
                                    if update_stats {
                                        stats.internal += 1;
                                    }
                                    state.store(i, j, None);
                                    continue;
                                }
                            }
                        }
                        if update_stats {
                            stats.ok += 1;
                        }
                        pair.quality = pair_penalty(
                            settings,
                            &pair,
                            &lists.left.oligos[j],
                            &lists.right.oligos[i],
                            pair.internal.map(|k| &lists.internal.oligos[k]),
                        );
                        match state.store(i, j, Some(pair)) {
                            Some(handle) => handle,
                            None => continue,
                        }
                    }
                };

                let Some(pair) = state.pair(handle) else {
                    continue;
                };
                let better = match best.and_then(|b| state.pair(b.handle)) {
                    None => true,
                    Some(current) => {
                        compare_pairs(pair, current, &lists.left, &lists.right) == Ordering::Less
                    }
                };
                if better {
                    best_quality = pair.quality;
                    best = Some(Best { i, j, handle });
                }
                if best_quality == 0.0 {
                    break;
                }
            }
            if best_quality == 0.0 {
                break;
            }
        }

        let Some(Best { i, j, .. }) = best else {
            range_index += 1;
            state.reset_cursors();
            if range_index >= ranges.len() {
                break;
            }
            debug!("No more pairs in product size range, trying range {range_index}");
            continue;
        };
        let Some(pair) = state.take(i, j) else {
            break;
        };

        let chosen_left = lists.left.oligos[pair.left].clone();
        let chosen_right = lists.right.oligos[pair.right].clone();
        for h in lists.left.oligos.iter_mut() {
            if left_overlaps_used(h, &chosen_left, settings.min_left_three_prime_distance) {
                h.overlaps = true;
            }
        }
        for h in lists.right.oligos.iter_mut() {
            if right_overlaps_used(h, &chosen_right, settings.min_right_three_prime_distance) {
                h.overlaps = true;
            }
        }
        best_pairs.push(pair);
        if best_pairs.len() >= settings.num_return {
            break;
        }
    }
    debug!(
        "Pair search kept {} pairs, {} characterized pairs left in the memo",
        best_pairs.len(),
        state.stored()
    );
    Ok(best_pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostics;
    use crate::oligo::OutputKind;
    use crate::repeat_library::Libraries;
    use crate::sequence_args::SequenceArgs;
    use crate::settings::Settings;
    use crate::template::Template;

    const SEQ: &str = "GGCAGTCGAATTGGTCCGCGTGTAAATGTCTCTATCGTAGGCTCGTCCGTGAAGGCCCTGAGCAGGTGTGGGACGCGCTGGAGGAGCCGAGGACTGATTGGAGTGCTTGCCGACCCACCC";

    fn run(settings: &Settings, seq: &str) -> (Vec<PrimerPair>, CandidateLists, PairStats) {
        let mut diag = Diagnostics::default();
        let mut t = Template::adjust(settings, &SequenceArgs::new("t", seq), &mut diag).unwrap();
        t.compute_stop_codons();
        let libs = Libraries::default();
        let eval = OligoEvaluator::new(settings, &t, &libs, OutputKind::Pairs);
        let mut lists = CandidateLists::new();
        let mut stats = PairStats::default();
        if !lists.make_detection_lists(&eval, &mut stats, &mut diag).unwrap() {
            return (vec![], lists, stats);
        }
        if settings.pick_internal_oligo {
            lists.make_internal_list(&eval, &mut diag).unwrap();
            lists.internal.sort();
        }
        lists.left.sort();
        lists.right.sort();
        let pairs = choose_pairs(&eval, &mut lists, &mut stats).unwrap();
        (pairs, lists, stats)
    }

    fn settings() -> Settings {
        Settings {
            product_size_ranges: vec![(60, 120)],
            num_return: 3,
            ..Settings::default()
        }
    }

    #[test]
    fn test_state_memo() {
        let mut state = PairSearchState::new(2);
        assert_eq!(state.lookup(0, 3), None);
        state.store(0, 3, None);
        assert_eq!(state.lookup(0, 3), Some(None));
        let h = state.store(1, 2, Some(PrimerPair {
            quality: 1.5,
            ..test_pair()
        }));
        assert_eq!(state.stored(), 1);
        assert_eq!(state.pair(h.unwrap()).unwrap().quality, 1.5);
        assert_eq!(state.take(1, 2).unwrap().quality, 1.5);
        assert_eq!(state.lookup(1, 2), Some(None));
        assert_eq!(state.stored(), 0);

        // released slots are reused
        let h2 = state.store(1, 4, Some(test_pair()));
        assert_eq!(h2, h);
        state.drop_row(1);
        assert_eq!(state.lookup(1, 4), None);
        assert_eq!(state.stored(), 0);
    }

    fn test_pair() -> PrimerPair {
        PrimerPair {
            left: 0,
            right: 0,
            internal: None,
            quality: 0.0,
            product_size: 90,
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

    #[test]
    fn test_choose_pairs() {
        let settings = settings();
        let (pairs, lists, stats) = run(&settings, SEQ);
        assert_eq!(pairs.len(), 3);
        for w in pairs.windows(2) {
            assert!(w[0].quality <= w[1].quality + 1e-6);
        }
        for p in &pairs {
            assert!((60..=120).contains(&p.product_size));
            let left = &lists.left.oligos[p.left];
            let right = &lists.right.oligos[p.right];
            assert_eq!(p.product_size, right.start as i64 - left.start as i64 + 1);
            assert!(p.quality >= left.quality + right.quality - 1e-9);
        }
        // the known good pair at 10 and 99 bounds the best penalty
        assert!(pairs[0].quality <= 1.86563369775445 + 2.26191764799705 + 1e-6);
        assert!(stats.ok >= 3);
        assert!(stats.considered >= stats.ok);
    }

    #[test]
    fn test_ranges_tried_in_order() {
        let (single, _, _) = run(&settings(), SEQ);
        let settings = Settings {
            product_size_ranges: vec![(200, 300), (60, 120)],
            ..settings()
        };
        let (pairs, _, _) = run(&settings, SEQ);
        assert_eq!(pairs, single);
    }

    #[test]
    fn test_three_prime_distance() {
        let settings = Settings {
            min_left_three_prime_distance: 5,
            min_right_three_prime_distance: 5,
            ..settings()
        };
        let (pairs, lists, _) = run(&settings, SEQ);
        for (a, b) in pairs.iter().zip(pairs.iter().skip(1)) {
            let (la, lb) = (&lists.left.oligos[a.left], &lists.left.oligos[b.left]);
            assert!((la.three_prime() as i64 - lb.three_prime() as i64).abs() >= 5);
        }
        let mut seen = std::collections::HashSet::new();
        for p in &pairs {
            assert!(seen.insert(lists.left.oligos[p.left].three_prime()));
        }
    }

    #[test]
    fn test_no_pair_in_range() {
        let settings = Settings {
            product_size_ranges: vec![(500, 600)],
            ..settings()
        };
        let (pairs, _, stats) = run(&settings, SEQ);
        assert!(pairs.is_empty());
        assert_eq!(stats.ok, 0);
    }

    #[test]
    fn test_internal_oligo_between_primers() {
        let settings = Settings {
            pick_internal_oligo: true,
            ..settings()
        };
        let (pairs, lists, _) = run(&settings, SEQ);
        for p in &pairs {
            let k = p.internal.unwrap();
            let intl = &lists.internal.oligos[k];
            assert!(intl.start > lists.left.oligos[p.left].last());
            assert!(intl.last() < lists.right.oligos[p.right].first());
        }
    }

    #[test]
    fn test_internal_oligo_needs_both_primers() {
        let full = Settings {
            pick_internal_oligo: true,
            ..settings()
        };
        let mut diag = Diagnostics::default();
        let t = Template::adjust(&full, &SequenceArgs::new("t", SEQ), &mut diag).unwrap();
        let libs = Libraries::default();
        let eval = OligoEvaluator::new(&full, &t, &libs, OutputKind::Pairs);
        let mut lists = CandidateLists::new();
        let mut stats = PairStats::default();
        assert!(lists.make_detection_lists(&eval, &mut stats, &mut diag).unwrap());
        lists.make_internal_list(&eval, &mut diag).unwrap();
        lists.left.sort();
        lists.right.sort();
        lists.internal.sort();

        let left_only = Settings {
            pick_right_primer: false,
            ..full.clone()
        };
        let eval = OligoEvaluator::new(&left_only, &t, &libs, OutputKind::Pairs);
        let pairs = choose_pairs(&eval, &mut lists, &mut stats).unwrap();
        assert!(!pairs.is_empty());
        assert!(pairs.iter().all(|p| p.internal.is_none()));
    }
}
