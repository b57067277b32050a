//! Per-oligo checks and the oligo penalty. The checks run in a fixed order and
//! stop at the first failure unless the oligo must be used; expensive alignment
//! based checks are only run up front when their result is needed for the
//! penalty or for a list result, otherwise the pair search completes them on
//! demand.

use crate::alignment_oracle::{AlignmentOracle, OracleKind, oracle_for};
use crate::dna_sequence::{gc_and_n_counts, gc_percent, reverse_complement};
use crate::error::Result;
use crate::iupac_code::IupacCode;
use crate::oligo::{Oligo, OligoStats, OligoType, OutputKind, Problem, RepeatSimilarity};
use crate::repeat_library::Libraries;
use crate::settings::{Settings, Task};
use crate::template::Template;
use crate::thermodynamics::{end_oligo_dg, seq_tm};

/// Position penalty weights around a start codon.
const OUTSIDE_START_WT: f64 = 30.0;
const INSIDE_START_WT: f64 = 20.0;
const INSIDE_STOP_WT: f64 = 100.0;
const OUTSIDE_STOP_WT: f64 = 0.5;

/// Bases at the 3' end used for end stability and end GC.
const END_WINDOW: usize = 5;

pub struct OligoEvaluator<'a> {
    settings: &'a Settings,
    template: &'a Template,
    libraries: &'a Libraries,
    output: OutputKind,
    primer_oracle: Box<dyn AlignmentOracle>,
    internal_oracle: Box<dyn AlignmentOracle>,
    template_oracle: Box<dyn AlignmentOracle>,
}

impl<'a> OligoEvaluator<'a> {
    pub fn new(
        settings: &'a Settings,
        template: &'a Template,
        libraries: &'a Libraries,
        output: OutputKind,
    ) -> Self {
        let oligo_kind = settings.oligo_oracle_kind();
        Self {
            settings,
            template,
            libraries,
            output,
            primer_oracle: oracle_for(oligo_kind, settings.primer.conditions),
            internal_oracle: oracle_for(oligo_kind, settings.internal.conditions),
            template_oracle: oracle_for(
                settings.template_oracle_kind(),
                settings.primer.conditions,
            ),
        }
    }

    pub fn settings(&self) -> &Settings {
        self.settings
    }

    pub fn template(&self) -> &Template {
        self.template
    }

    pub fn output(&self) -> OutputKind {
        self.output
    }

    /// Oracle for duplexes formed by oligos of this kind.
    pub fn oracle(&self, kind: OligoType) -> &dyn AlignmentOracle {
        match kind {
            OligoType::Internal => self.internal_oracle.as_ref(),
            _ => self.primer_oracle.as_ref(),
        }
    }

    /// The oligo as synthesized, 5'->3'.
    pub fn oligo_sequence(&self, h: &Oligo) -> Vec<u8> {
        let (s, s_r) = self.strands(h);
        match h.kind {
            OligoType::Right => s_r,
            _ => s,
        }
    }

    /// Template bases under the oligo on the forward strand, and their reverse
    /// complement.
    fn strands(&self, h: &Oligo) -> (Vec<u8>, Vec<u8>) {
        let s = self.template.trimmed[h.first()..=h.last()].to_vec();
        let s_r = reverse_complement(&s);
        (s, s_r)
    }

    /// Runs every check on `h`, fills in its computed properties and records
    /// each rejection in `stats`. Problems are set on `h.problems`.
    pub fn check(&self, h: &mut Oligo, stats: &mut OligoStats) -> Result<()> {
        let settings = self.settings;
        let t = self.template;
        let args = settings.oligo_args(h.kind);
        let kind = h.kind;
        let (j, k) = (h.first(), h.last());
        let three_prime = h.three_prime();
        let (s, s_r) = self.strands(h);
        let oligo_seq: &[u8] = if kind == OligoType::Right { &s_r } else { &s };
        let list_output = self.output == OutputKind::Lists;
        let three_conditions = h.must_use || list_output;

        if kind == OligoType::Left {
            if let Some(scp) = t.start_codon_pos {
                let start = h.start as i64;
                let upstream = t.upstream_stop_codon.map(|u| u as i64);
                let downstream = t.downstream_stop_codon.map(|d| d as i64);
                if (start - scp) % 3 != 0
                    || upstream.is_some_and(|u| start <= u)
                    || downstream.is_some_and(|d| start >= d)
                {
                    stats.no_orf += 1;
                    h.problems.set(Problem::DoesNotAmplifyOrf);
                    if !settings.pick_anyway {
                        return Ok(());
                    }
                }
            }
        }

        if settings.lowercase_masking
            && t
                .trimmed_orig
                .get(three_prime)
                .is_some_and(|b| matches!(b, b'a' | b'c' | b'g' | b't'))
        {
            h.problems.set(Problem::OverlapsMaskedSequence);
            stats.gmasked += 1;
            if !h.must_use {
                return Ok(());
            }
        }

        if !must_match(oligo_seq, args.must_match_five_prime.as_deref(), true)
            || !must_match(oligo_seq, args.must_match_three_prime.as_deref(), false)
        {
            h.problems.set(Problem::MustMatchFailed);
            stats.must_match_fail += 1;
            if !h.must_use {
                return Ok(());
            }
        }

        let window = &t.trimmed[j..=k];
        h.gc_content = gc_percent(window);
        h.num_ns = gc_and_n_counts(window).1;
        if h.num_ns > args.num_ns_accepted {
            h.problems.set(Problem::TooManyNs);
            stats.ns += 1;
            if !h.must_use {
                return Ok(());
            }
        }

        self.assign_position_penalty(h);

        if let Some(scp) = t.start_codon_pos {
            let start = h.start as i64;
            match kind {
                OligoType::Left => {
                    h.position_penalty = if scp > start {
                        (scp - start) as f64 * OUTSIDE_START_WT
                    } else {
                        (start - scp) as f64 * INSIDE_START_WT
                    };
                }
                OligoType::Right => {
                    h.position_penalty = match t.downstream_stop_codon.map(|d| d as i64) {
                        None => (t.trimmed_len() as i64 - start - 1) as f64 * INSIDE_STOP_WT,
                        Some(d) if d < start => (start - d) as f64 * OUTSIDE_STOP_WT,
                        Some(d) => (d - start) as f64 * INSIDE_STOP_WT,
                    };
                }
                OligoType::Internal => {}
            }
        }

        let excluded = if kind == OligoType::Internal {
            &t.internal_excluded
        } else {
            &t.excluded
        };
        let overlaps_excluded = excluded
            .iter()
            .any(|e| !((k as i64) < e.start || (j as i64) > e.end()));
        h.problems
            .set_marker(Problem::OverlapsExcludedBit, overlaps_excluded);

        if kind != OligoType::Internal && h.problems.contains(Problem::OverlapsTargetBit) {
            h.problems.set(Problem::OverlapsTarget);
            stats.target += 1;
            if !h.must_use {
                return Ok(());
            }
        }
        if overlaps_excluded {
            h.problems.set(Problem::OverlapsExcludedRegion);
            stats.excluded += 1;
            if !h.must_use {
                return Ok(());
            }
        }

        match kind {
            OligoType::Left if !t.ok_regions.admits_left(j as i64, k as i64) => {
                h.problems.set(Problem::NotInAnyOkRegion);
                stats.not_in_any_left_ok_region += 1;
                if !h.must_use {
                    return Ok(());
                }
            }
            OligoType::Right if !t.ok_regions.admits_right(j as i64, k as i64) => {
                h.problems.set(Problem::NotInAnyOkRegion);
                stats.not_in_any_right_ok_region += 1;
                if !h.must_use {
                    return Ok(());
                }
            }
            _ => {}
        }

        if h.gc_content < args.min_gc {
            h.problems.set(Problem::LowGc);
            stats.gc += 1;
            if !h.must_use {
                return Ok(());
            }
        } else if h.gc_content > args.max_gc {
            h.problems.set(Problem::HighGc);
            stats.gc += 1;
            if !h.must_use {
                return Ok(());
            }
        }

        if kind.is_primer() {
            let clamp_ok = oligo_seq
                .iter()
                .rev()
                .take(settings.gc_clamp)
                .all(|b| matches!(b, b'G' | b'C'));
            if settings.gc_clamp > 0 && (oligo_seq.len() < settings.gc_clamp || !clamp_ok) {
                h.problems.set(Problem::NoGcClamp);
                stats.gc_clamp += 1;
                if !h.must_use {
                    return Ok(());
                }
            }
            if settings.max_end_gc < END_WINDOW {
                let end_gc = oligo_seq
                    .iter()
                    .rev()
                    .take(END_WINDOW)
                    .filter(|b| matches!(b, b'G' | b'C'))
                    .count();
                if end_gc > settings.max_end_gc {
                    h.problems.set(Problem::TooManyGcAtEnd);
                    stats.gc_end_high += 1;
                    if !h.must_use {
                        return Ok(());
                    }
                }
            }
        }

        let (seq_q, end_q) = self.quality_minima(h);
        h.seq_quality = seq_q;
        h.seq_end_quality = end_q;
        if seq_q < args.min_quality {
            h.problems.set(Problem::LowSequenceQuality);
            stats.seq_quality += 1;
            if !h.must_use {
                return Ok(());
            }
        }
        if kind.is_primer() && end_q < args.min_end_quality {
            h.problems.set(Problem::LowEndSequenceQuality);
            stats.seq_quality += 1;
            if !h.must_use {
                return Ok(());
            }
        }

        if args.max_poly_x > 0 && longest_run(window) > args.max_poly_x {
            h.problems.set(Problem::HighPolyX);
            stats.poly_x += 1;
            if !h.must_use {
                return Ok(());
            }
        }

        h.tm = seq_tm(
            oligo_seq,
            &args.conditions,
            settings.nn_max_len,
            settings.tm_method,
            settings.salt_correction,
        )?;
        if h.tm < args.min_tm {
            h.problems.set(Problem::LowTm);
            stats.temp_min += 1;
            if !h.must_use {
                return Ok(());
            }
        }
        if h.tm > args.max_tm {
            h.problems.set(Problem::HighTm);
            stats.temp_max += 1;
            if !h.must_use {
                return Ok(());
            }
        }

        if kind.is_primer() {
            h.end_stability = end_oligo_dg(oligo_seq, END_WINDOW, settings.tm_method)?;
            if h.end_stability > settings.max_end_stability {
                h.problems.set(Problem::HighEndStability);
                stats.stability += 1;
                if !h.must_use {
                    return Ok(());
                }
            }
        }

        let w = &args.weights;
        let oligo_kind = settings.oligo_oracle_kind();
        let compl_weighted = oligo_kind.select(
            w.compl_any != 0.0 || w.compl_end != 0.0,
            w.compl_any_th != 0.0 || w.compl_end_th != 0.0,
        );
        if three_conditions || compl_weighted {
            self.self_complementarity(h, stats)?;
            if !h.ok_or_must_use() {
                return Ok(());
            }
        }

        if oligo_kind == OracleKind::Thermodynamic && (three_conditions || w.hairpin_th != 0.0) {
            self.hairpin(h, stats)?;
        }

        if three_conditions || w.repeat_sim != 0.0 {
            self.repeat_similarity(h, stats)?;
        }
        if !h.ok_or_must_use() {
            return Ok(());
        }

        if (three_conditions || (kind.is_primer() && settings.template_in_penalty()))
            && !h.template_mispriming_ok
        {
            self.template_mispriming(h, stats)?;
        }

        if h.length > args.max_size {
            h.problems.set(Problem::TooLong);
            stats.size_max += 1;
            if !h.must_use {
                return Ok(());
            }
        }
        if h.length < args.min_size {
            h.problems.set(Problem::TooShort);
            stats.size_min += 1;
            if !h.must_use {
                return Ok(());
            }
        }

        if kind.is_primer() {
            h.overlaps_junction = self.overlaps_junction(h);
        }

        h.problems.set_marker(Problem::CompletelyWritten, true);
        Ok(())
    }

    /// Fills the position penalty and the target markers. Sequencing primers are
    /// placed by design and carry no position penalty.
    fn assign_position_penalty(&self, h: &mut Oligo) {
        let settings = self.settings;
        let t = self.template;
        h.position_penalty = 0.0;
        h.problems
            .set_marker(Problem::InfinitePositionPenalty, false);
        h.problems.set_marker(Problem::OverlapsTargetBit, false);
        if settings.task == Task::Sequencing || h.kind == OligoType::Internal {
            return;
        }
        if settings.default_position_penalties() {
            let (j, k) = (h.first() as i64, h.last() as i64);
            if t.targets.iter().any(|tg| !(k < tg.start || j > tg.end())) {
                h.problems
                    .set_marker(Problem::InfinitePositionPenalty, true);
                h.problems.set_marker(Problem::OverlapsTargetBit, true);
            }
        } else if t.targets.len() == 1 {
            self.compute_position_penalty(h);
            if h.position_penalty_infinite() {
                h.problems.set_marker(Problem::OverlapsTargetBit, true);
            }
        }
    }

    /// Distance penalty of the 3' end relative to the single target. A primer
    /// whose 3' end lies beyond the far side of the target cannot amplify it.
    pub fn compute_position_penalty(&self, h: &mut Oligo) {
        let Some(target) = self.template.targets.first() else {
            return;
        };
        let settings = self.settings;
        let (tbegin, tend) = (target.start, target.end());
        let three_prime = h.three_prime() as i64;
        let mut infinite = true;
        h.position_penalty = 0.0;
        match h.kind {
            OligoType::Left if three_prime <= tend => {
                infinite = false;
                h.position_penalty = if three_prime < tbegin {
                    (tbegin - three_prime - 1) as f64 * settings.outside_penalty
                } else {
                    (three_prime - tbegin + 1) as f64 * settings.inside_penalty
                };
            }
            OligoType::Right if three_prime >= tbegin => {
                infinite = false;
                h.position_penalty = if three_prime > tend {
                    (three_prime - tend - 1) as f64 * settings.outside_penalty
                } else {
                    (tend - three_prime + 1) as f64 * settings.inside_penalty
                };
            }
            _ => {}
        }
        h.problems
            .set_marker(Problem::InfinitePositionPenalty, infinite);
    }

    /// Lowest quality over the whole oligo and over the five bases at its 3'
    /// end. Without quality scores both are the top of the quality range.
    fn quality_minima(&self, h: &Oligo) -> (i32, i32) {
        let max = self.settings.quality_range_max;
        let t = self.template;
        if !t.has_quality() {
            return (max, max);
        }
        let (j, k) = (h.first(), h.last());
        let end_range = match h.kind {
            OligoType::Right => j..=(j + END_WINDOW - 1).min(k),
            _ => k.saturating_sub(END_WINDOW - 1).max(j)..=k,
        };
        let end_q = end_range
            .map(|i| t.quality_at(i))
            .fold(max, i32::min);
        let seq_q = (j..=k).map(|i| t.quality_at(i)).fold(end_q, i32::min);
        (seq_q, end_q)
    }

    fn overlaps_junction(&self, h: &Oligo) -> bool {
        let settings = self.settings;
        let min5 = settings.min_five_prime_overlap_of_junction as i64;
        let min3 = settings.min_three_prime_overlap_of_junction as i64;
        let start = h.start as i64;
        let len = h.length as i64;
        self.template.junctions.iter().any(|&junction| match h.kind {
            OligoType::Left => start + min5 - 1 <= junction && start + len - min3 > junction,
            OligoType::Right => start - len + min3 <= junction && start - min5 + 1 > junction,
            OligoType::Internal => false,
        })
    }

    /// Self-complementarity of the oligo with itself, anywhere and at the 3'
    /// end. Computed once.
    pub fn self_complementarity(&self, h: &mut Oligo, stats: &mut OligoStats) -> Result<()> {
        if h.self_any.is_some() {
            return Ok(());
        }
        let args = self.settings.oligo_args(h.kind);
        let oracle = self.oracle(h.kind);
        let oligo = self.oligo_sequence(h);
        let any = oracle.any(&oligo, &oligo)?;
        h.self_any = Some(any);
        if any > args.self_any_threshold(oracle.kind()) {
            h.problems.set(Problem::HighSelfAny);
            stats.compl_any += 1;
            stats.ok -= 1;
            if !h.must_use {
                return Ok(());
            }
        }
        let end = oracle.end(&oligo, &oligo)?;
        h.self_end = Some(end);
        if end > args.self_end_threshold(oracle.kind()) {
            h.problems.set(Problem::HighSelfEnd);
            stats.compl_end += 1;
            stats.ok -= 1;
        }
        Ok(())
    }

    /// Stem-loop stability; stays `None` under the DP model.
    pub fn hairpin(&self, h: &mut Oligo, stats: &mut OligoStats) -> Result<()> {
        if h.hairpin.is_some() {
            return Ok(());
        }
        let oracle = self.oracle(h.kind);
        let oligo = self.oligo_sequence(h);
        h.hairpin = oracle.hairpin(&oligo)?;
        if h
            .hairpin
            .is_some_and(|v| v > self.settings.oligo_args(h.kind).max_hairpin_th)
        {
            h.problems.set(Problem::HighHairpin);
            stats.hairpin_th += 1;
            stats.ok -= 1;
        }
        Ok(())
    }

    /// Scores against every entry of the matching repeat library. An empty
    /// library still marks the oligo as checked.
    pub fn repeat_similarity(&self, h: &mut Oligo, stats: &mut OligoStats) -> Result<()> {
        if h.repeat_sim.is_some() {
            return Ok(());
        }
        let lib = self.libraries.for_kind(h.kind);
        let (s, s_r) = self.strands(h);
        let consensus = self.settings.lib_ambiguity_codes_consensus;
        let mut sim = RepeatSimilarity {
            name: lib.name(0).map(str::to_string),
            ..Default::default()
        };
        for i in 0..lib.len() {
            let w = lib.score(i, h.kind, &s, &s_r, consensus)?;
            sim.scores.push(w);
            if w > sim.scores[sim.max] {
                sim.max = i;
                sim.name = lib.name(i).map(str::to_string);
            }
            if w < sim.scores[sim.min] {
                sim.min = i;
            }
        }
        let max = sim.max_score();
        h.repeat_sim = Some(sim);
        if max > self.settings.oligo_args(h.kind).max_repeat_compl {
            h.problems.set(Problem::HighSimilarityToNonTemplate);
            stats.repeat_score += 1;
            stats.ok -= 1;
        }
        Ok(())
    }

    /// Similarity of a primer to template sites other than its own, on both
    /// strands.
    pub fn template_mispriming(&self, h: &mut Oligo, stats: &mut OligoStats) -> Result<()> {
        let settings = self.settings;
        if h.template_mispriming_ok
            || !h.kind.is_primer()
            || !settings.need_template_mispriming()
        {
            return Ok(());
        }
        let t = self.template;
        let seqlen = t.upcased.len();
        let first_u = t.incl_start as usize + h.first();
        let last_u = t.incl_start as usize + h.last();
        let (s, s_r) = self.strands(h);
        let (oligo, target, target_r, first_u, last_u) = match h.kind {
            OligoType::Right => (
                s_r,
                &t.upcased_r,
                &t.upcased,
                seqlen - last_u - 1,
                seqlen - first_u - 1,
            ),
            _ => (s, &t.upcased, &t.upcased_r, first_u, last_u),
        };
        let oracle = self.template_oracle.as_ref();
        let upstream = oracle.template(&oligo, &target[..first_u])?;
        let downstream = oracle.template(&oligo, &target[last_u + 1..])?;
        h.template_mispriming = Some(upstream.max(downstream));
        h.template_mispriming_r = Some(oracle.template(&oligo, target_r)?);
        if let Some(threshold) = settings.primer.template_threshold(oracle.kind()) {
            if h.max_template_mispriming().unwrap_or(0.0) > threshold {
                h.problems
                    .set(Problem::HighSimilarityToMultipleTemplateSites);
                stats.template_mispriming += 1;
                stats.ok -= 1;
            } else {
                h.template_mispriming_ok = true;
            }
        }
        Ok(())
    }

    /// Penalty of a single oligo; lower is better.
    pub fn penalty(&self, h: &Oligo) -> f64 {
        let settings = self.settings;
        let args = settings.oligo_args(h.kind);
        let w = &args.weights;
        let mut sum = 0.0;

        if h.tm > args.opt_tm {
            sum += w.temp_gt * (h.tm - args.opt_tm);
        }
        if h.tm < args.opt_tm {
            sum += w.temp_lt * (args.opt_tm - h.tm);
        }
        if let Some(opt_gc) = args.opt_gc {
            if h.gc_content > opt_gc {
                sum += w.gc_content_gt * (h.gc_content - opt_gc);
            }
            if h.gc_content < opt_gc {
                sum += w.gc_content_lt * (opt_gc - h.gc_content);
            }
        }
        if h.length < args.opt_size {
            sum += w.length_lt * (args.opt_size - h.length) as f64;
        }
        if h.length > args.opt_size {
            sum += w.length_gt * (h.length - args.opt_size) as f64;
        }

        let self_any = h.self_any.unwrap_or(0.0);
        let self_end = h.self_end.unwrap_or(0.0);
        match settings.oligo_oracle_kind() {
            OracleKind::Dp => {
                sum += w.compl_any * self_any + w.compl_end * self_end;
            }
            kind @ OracleKind::Thermodynamic => {
                sum += kind.penalty(w.compl_any_th, self_any, h.tm, w.temp_cutoff);
                sum += kind.penalty(w.compl_end_th, self_end, h.tm, w.temp_cutoff);
                sum += kind.penalty(w.hairpin_th, h.hairpin.unwrap_or(0.0), h.tm, w.temp_cutoff);
            }
        }

        sum += w.num_ns * h.num_ns as f64;
        sum += w.repeat_sim * h.repeat_max();
        if h.kind.is_primer() {
            if !h.problems.contains(Problem::OverlapsTargetBit) {
                sum += w.pos_penalty * h.position_penalty;
            }
            sum += w.end_stability * h.end_stability;
        }
        sum += w.seq_quality * (settings.quality_range_max - h.seq_quality) as f64;

        if h.kind.is_primer() {
            let mispriming = h.max_template_mispriming().unwrap_or(0.0);
            let kind = settings.template_oracle_kind();
            sum += match kind {
                OracleKind::Dp => w.template_mispriming * mispriming,
                OracleKind::Thermodynamic => kind.penalty(
                    w.template_mispriming_th,
                    mispriming,
                    h.tm,
                    w.temp_cutoff,
                ),
            };
        }
        sum
    }
}

/// Compares the first (five_prime) or last five bases of `oligo` with an IUPAC
/// pattern. No pattern always matches.
fn must_match(oligo: &[u8], pattern: Option<&str>, five_prime: bool) -> bool {
    let Some(pattern) = pattern.map(str::as_bytes) else {
        return true;
    };
    if oligo.len() < pattern.len() {
        return false;
    }
    let part = if five_prime {
        &oligo[..pattern.len()]
    } else {
        &oligo[oligo.len() - pattern.len()..]
    };
    part.iter()
        .zip(pattern)
        .all(|(&b, &p)| IupacCode::compatible(p, b))
}

/// Longest mononucleotide run; an `N` extends the current run.
fn longest_run(seq: &[u8]) -> usize {
    let mut best = usize::from(!seq.is_empty());
    let mut run = 1;
    for i in 1..seq.len() {
        if seq[i] == seq[i - 1] || seq[i] == b'N' {
            run += 1;
            best = best.max(run);
        } else {
            run = 1;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostics;
    use crate::repeat_library::RepeatLibrary;
    use crate::sequence_args::{Interval, SequenceArgs};

    const SEQ: &str = "GGCAGTCGAATTGGTCCGCGTGTAAATGTCTCTATCGTAGGCTCGTCCGTGAAGGCCCTGAGCAGGTGTGGGACGCGCTGGAGGAGCCGAGGACTGATTGGAGTGCTTGCCGACCCACCC";

    fn template(settings: &Settings, args: &SequenceArgs) -> Template {
        let mut diag = Diagnostics::default();
        let mut t = Template::adjust(settings, args, &mut diag).unwrap();
        t.compute_stop_codons();
        t
    }

    fn evaluate(settings: &Settings, t: &Template, output: OutputKind, h: &mut Oligo) -> OligoStats {
        let libs = Libraries::default();
        let eval = OligoEvaluator::new(settings, t, &libs, output);
        let mut stats = OligoStats::default();
        eval.check(h, &mut stats).unwrap();
        stats
    }

    #[test]
    fn test_good_left_primer() {
        let settings = Settings::default();
        let t = template(&settings, &SequenceArgs::new("t", SEQ));
        let libs = Libraries::default();
        let eval = OligoEvaluator::new(&settings, &t, &libs, OutputKind::Pairs);
        let mut h = Oligo::new(OligoType::Left, 10, 20);
        let mut stats = OligoStats::default();
        eval.check(&mut h, &mut stats).unwrap();
        assert!(h.problems.is_ok());
        assert!(h.problems.is_completely_written());
        assert!((h.tm - 61.86563369775445).abs() < 1e-6);
        assert_eq!(h.gc_content, 50.0);
        assert_eq!(h.end_stability, 6.3);
        // no penalty term needs the alignments
        assert_eq!(h.self_any, None);
        assert_eq!(h.repeat_sim, None);
        assert!((eval.penalty(&h) - 1.86563369775445).abs() < 1e-6);
        assert_eq!(eval.oligo_sequence(&h), b"TTGGTCCGCGTGTAAATGTC".to_vec());
    }

    #[test]
    fn test_right_primer_reads_reverse_strand() {
        let settings = Settings::default();
        let t = template(&settings, &SequenceArgs::new("t", SEQ));
        let libs = Libraries::default();
        let eval = OligoEvaluator::new(&settings, &t, &libs, OutputKind::Pairs);
        let mut h = Oligo::new(OligoType::Right, 99, 20);
        eval.check(&mut h, &mut OligoStats::default()).unwrap();
        assert_eq!(eval.oligo_sequence(&h), b"CAATCAGTCCTCGGCTCCTC".to_vec());
        assert!((h.tm - 62.26191764799705).abs() < 1e-6);
        assert!(h.problems.is_ok());
    }

    #[test]
    fn test_list_output_computes_self_complementarity() {
        let settings = Settings::default();
        let t = template(&settings, &SequenceArgs::new("t", SEQ));
        let mut h = Oligo::new(OligoType::Left, 10, 20);
        evaluate(&settings, &t, OutputKind::Lists, &mut h);
        assert_eq!(h.self_any, Some(4.0));
        assert_eq!(h.self_end, Some(1.0));
        assert!(h.repeat_sim.is_some());
        assert!(h.problems.is_ok());
    }

    #[test]
    fn test_target_overlap_and_must_use() {
        let settings = Settings::default();
        let mut args = SequenceArgs::new("t", SEQ);
        args.targets = vec![Interval::new(25, 10)];
        let t = template(&settings, &args);

        let mut h = Oligo::new(OligoType::Left, 10, 20);
        let stats = evaluate(&settings, &t, OutputKind::Pairs, &mut h);
        assert!(h.problems.contains(Problem::OverlapsTarget));
        assert!(h.position_penalty_infinite());
        assert!(!h.problems.is_completely_written());
        assert_eq!(stats.target, 1);
        assert_eq!(h.tm, 0.0);

        let mut h = Oligo::new(OligoType::Left, 10, 20);
        h.must_use = true;
        evaluate(&settings, &t, OutputKind::Pairs, &mut h);
        assert!(h.problems.contains(Problem::OverlapsTarget));
        assert!(h.problems.is_completely_written());
        assert!(h.tm > 0.0);
        assert!(h.ok_or_must_use());
    }

    #[test]
    fn test_tm_bounds() {
        let mut settings = Settings::default();
        let t = template(&settings, &SequenceArgs::new("t", SEQ));

        // Tm 61.87
        settings.primer.min_tm = 62.0;
        let mut h = Oligo::new(OligoType::Left, 10, 20);
        let stats = evaluate(&settings, &t, OutputKind::Pairs, &mut h);
        assert!(h.problems.contains(Problem::LowTm));
        assert!(!h.problems.contains(Problem::HighTm));
        assert_eq!(stats.temp_min, 1);
        assert!(!h.ok_or_must_use());

        settings.primer.min_tm = 50.0;
        settings.primer.max_tm = 61.0;
        let mut h = Oligo::new(OligoType::Left, 10, 20);
        let stats = evaluate(&settings, &t, OutputKind::Pairs, &mut h);
        assert!(h.problems.contains(Problem::HighTm));
        assert_eq!(stats.temp_max, 1);

        settings.primer.max_tm = 62.0;
        let mut h = Oligo::new(OligoType::Left, 10, 20);
        let stats = evaluate(&settings, &t, OutputKind::Pairs, &mut h);
        assert!(h.problems.is_ok());
        assert_eq!(stats.temp_min + stats.temp_max, 0);

        // GTGTAAATGTCTCTATCG melts near 42.5
        let settings = Settings::default();
        let mut h = Oligo::new(OligoType::Left, 19, 18);
        evaluate(&settings, &t, OutputKind::Pairs, &mut h);
        assert!(h.problems.contains(Problem::LowTm));
        assert!(h.tm < 43.0 && h.tm > 42.0);
    }

    #[test]
    fn test_position_penalty_around_target() {
        let settings = Settings {
            outside_penalty: 1.0,
            inside_penalty: 2.0,
            ..Settings::default()
        };
        let mut args = SequenceArgs::new("t", SEQ);
        args.targets = vec![Interval::new(50, 10)];
        let t = template(&settings, &args);
        let libs = Libraries::default();
        let eval = OligoEvaluator::new(&settings, &t, &libs, OutputKind::Pairs);

        let mut h = Oligo::new(OligoType::Left, 10, 20);
        eval.compute_position_penalty(&mut h);
        assert_eq!(h.position_penalty, 20.0);
        assert!(!h.position_penalty_infinite());

        let mut h = Oligo::new(OligoType::Left, 36, 20);
        eval.compute_position_penalty(&mut h);
        assert_eq!(h.position_penalty, 12.0);

        let mut h = Oligo::new(OligoType::Left, 51, 20);
        eval.compute_position_penalty(&mut h);
        assert!(h.position_penalty_infinite());

        let mut h = Oligo::new(OligoType::Right, 89, 20);
        eval.compute_position_penalty(&mut h);
        assert_eq!(h.position_penalty, 10.0);

        let mut h = Oligo::new(OligoType::Right, 60, 20);
        eval.compute_position_penalty(&mut h);
        assert!(h.position_penalty_infinite());
    }

    #[test]
    fn test_lowercase_masked_three_prime_end() {
        let settings = Settings {
            lowercase_masking: true,
            ..Settings::default()
        };
        let mut seq = SEQ.to_string();
        seq.replace_range(29..30, "c");
        let t = template(&settings, &SequenceArgs::new("t", seq));
        let mut h = Oligo::new(OligoType::Left, 10, 20);
        let stats = evaluate(&settings, &t, OutputKind::Pairs, &mut h);
        assert!(h.problems.contains(Problem::OverlapsMaskedSequence));
        assert_eq!(stats.gmasked, 1);

        // only the 3' end matters
        let mut h = Oligo::new(OligoType::Left, 11, 20);
        evaluate(&settings, &t, OutputKind::Pairs, &mut h);
        assert!(!h.problems.contains(Problem::OverlapsMaskedSequence));
    }

    #[test]
    fn test_too_many_ns() {
        let settings = Settings::default();
        let mut seq = SEQ.to_string();
        seq.replace_range(15..16, "N");
        let t = template(&settings, &SequenceArgs::new("t", seq));
        let mut h = Oligo::new(OligoType::Left, 10, 20);
        let stats = evaluate(&settings, &t, OutputKind::Pairs, &mut h);
        assert_eq!(h.num_ns, 1);
        assert!(h.problems.contains(Problem::TooManyNs));
        assert!(h.problems.has_five_prime_problem());
        assert_eq!(stats.ns, 1);
    }

    #[test]
    fn test_orf_requirement() {
        let settings = Settings::default();
        let mut args = SequenceArgs::new("t", SEQ);
        args.start_codon_pos = Some(5);
        let t = template(&settings, &args);
        let mut h = Oligo::new(OligoType::Left, 10, 20);
        let stats = evaluate(&settings, &t, OutputKind::Pairs, &mut h);
        assert!(h.problems.contains(Problem::DoesNotAmplifyOrf));
        assert_eq!(stats.no_orf, 1);

        let mut h = Oligo::new(OligoType::Left, 2, 20);
        evaluate(&settings, &t, OutputKind::Pairs, &mut h);
        assert!(!h.problems.contains(Problem::DoesNotAmplifyOrf));
        assert_eq!(h.position_penalty, 3.0 * OUTSIDE_START_WT);
    }

    #[test]
    fn test_repeat_library_similarity() {
        let settings = Settings::default();
        let t = template(&settings, &SequenceArgs::new("t", SEQ));
        let mut libs = Libraries::default();
        libs.mispriming = RepeatLibrary::new();
        libs.mispriming.add("other", b"ACACACACACACACAC", 1.0).unwrap();
        libs.mispriming
            .add("copy", b"AAAATTGGTCCGCGTGTAAATGTCAAAA", 1.0)
            .unwrap();
        let eval = OligoEvaluator::new(&settings, &t, &libs, OutputKind::Lists);
        let mut h = Oligo::new(OligoType::Left, 10, 20);
        let mut stats = OligoStats::default();
        eval.check(&mut h, &mut stats).unwrap();
        let sim = h.repeat_sim.as_ref().unwrap();
        assert_eq!(sim.max, 1);
        assert_eq!(sim.name.as_deref(), Some("copy"));
        assert_eq!(h.repeat_max(), 20.0);
        assert!(h.problems.contains(Problem::HighSimilarityToNonTemplate));
        assert_eq!(stats.repeat_score, 1);
    }

    #[test]
    fn test_template_mispriming_second_site() {
        let settings = Settings {
            primer: crate::settings::OligoArgs {
                max_template_mispriming: Some(12.0),
                ..Default::default()
            },
            ..Settings::default()
        };
        let mut seq = SEQ.to_string();
        seq.replace_range(60..80, &SEQ[10..30]);
        let t = template(&settings, &SequenceArgs::new("t", seq));
        let mut h = Oligo::new(OligoType::Left, 10, 20);
        let stats = evaluate(&settings, &t, OutputKind::Lists, &mut h);
        assert_eq!(h.template_mispriming, Some(20.0));
        assert_eq!(h.template_mispriming_r, Some(3.0));
        assert!(h.problems.contains(Problem::HighSimilarityToMultipleTemplateSites));
        assert!(!h.template_mispriming_ok);
        assert_eq!(stats.template_mispriming, 1);

        let t = template(&settings, &SequenceArgs::new("t", SEQ));
        let mut h = Oligo::new(OligoType::Left, 10, 20);
        evaluate(&settings, &t, OutputKind::Lists, &mut h);
        assert_eq!(h.max_template_mispriming(), Some(3.0));
        assert!(h.template_mispriming_ok);
    }

    #[test]
    fn test_must_match_patterns() {
        assert!(must_match(b"ACGTACGTAG", None, true));
        assert!(must_match(b"ACGTACGTAG", Some("NNNNS"), false));
        assert!(!must_match(b"ACGTACGTAT", Some("NNNNS"), false));
        assert!(must_match(b"ACGTACGTAT", Some("RCKNN"), true));
        assert!(!must_match(b"ACG", Some("NNNNN"), true));
    }

    #[test]
    fn test_longest_run() {
        assert_eq!(longest_run(b""), 0);
        assert_eq!(longest_run(b"ACGT"), 1);
        assert_eq!(longest_run(b"ACGGGGNT"), 5);
        assert_eq!(longest_run(b"AAAACAAA"), 4);
    }
}
