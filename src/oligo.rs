use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OligoType {
    Left,
    Right,
    Internal,
}

impl OligoType {
    pub fn is_primer(&self) -> bool {
        !matches!(self, Self::Internal)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Left => "left primer",
            Self::Right => "right primer",
            Self::Internal => "internal oligo",
        }
    }
}

/// Whether the design ends in pairs or in independent oligo lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    Pairs,
    Lists,
}

/// Bit positions in [`Problems`]. The first seven are bookkeeping markers and
/// never make an oligo unacceptable on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Problem {
    PartiallyWritten = 0,
    CompletelyWritten = 1,
    OverlapsTargetBit = 2,
    OverlapsExcludedBit = 3,
    InfinitePositionPenalty = 4,
    NotInAnyOkRegion = 7,
    TooManyNs = 8,
    OverlapsTarget = 9,
    HighGc = 10,
    LowGc = 11,
    HighTm = 12,
    LowTm = 13,
    OverlapsExcludedRegion = 14,
    HighSelfAny = 15,
    HighSelfEnd = 16,
    NoGcClamp = 17,
    HighEndStability = 18,
    HighPolyX = 19,
    LowSequenceQuality = 20,
    LowEndSequenceQuality = 21,
    HighSimilarityToNonTemplate = 22,
    HighSimilarityToMultipleTemplateSites = 23,
    OverlapsMaskedSequence = 24,
    TooLong = 25,
    TooShort = 26,
    DoesNotAmplifyOrf = 27,
    TooManyGcAtEnd = 28,
    HighHairpin = 29,
    MustMatchFailed = 30,
}

const BOOKKEEPING_MASK: u32 = 0b111_1111;

/// Problems after which extending the oligo at its 5' end cannot help.
const FIVE_PRIME_PROBLEMS: [Problem; 12] = [
    Problem::TooManyNs,
    Problem::OverlapsTarget,
    Problem::OverlapsExcludedRegion,
    Problem::HighSelfAny,
    Problem::NoGcClamp,
    Problem::HighEndStability,
    Problem::HighPolyX,
    Problem::LowSequenceQuality,
    Problem::LowEndSequenceQuality,
    Problem::HighSimilarityToNonTemplate,
    Problem::TooLong,
    Problem::TooManyGcAtEnd,
];

/// Report order and wording.
const DESCRIPTIONS: [(Problem, &str); 24] = [
    (Problem::TooManyNs, "Too many Ns;"),
    (Problem::OverlapsTarget, "Overlaps target;"),
    (Problem::HighGc, "GC content too high;"),
    (Problem::LowGc, "GC content too low;"),
    (Problem::HighTm, "Temperature too high;"),
    (Problem::LowTm, "Temperature too low;"),
    (Problem::OverlapsExcludedRegion, "Overlaps an excluded region;"),
    (Problem::NotInAnyOkRegion, "Not in any ok region;"),
    (Problem::HighSelfAny, "Similarity to self too high;"),
    (Problem::HighSelfEnd, "Similary to 3' end of self too high;"),
    (Problem::HighHairpin, "Hairpin stability too high;"),
    (Problem::NoGcClamp, "No 3' GC clamp;"),
    (Problem::TooManyGcAtEnd, "Too many GCs at 3' end;"),
    (Problem::HighEndStability, "3' end too stable (delta-G too high);"),
    (Problem::HighPolyX, "Contains too-long poly nucleotide tract;"),
    (Problem::LowSequenceQuality, "Template sequence quality too low;"),
    (
        Problem::LowEndSequenceQuality,
        "Template sequence quality at 3' end too low;",
    ),
    (
        Problem::HighSimilarityToNonTemplate,
        "Similarity to non-template sequence too high;",
    ),
    (
        Problem::HighSimilarityToMultipleTemplateSites,
        "Similarity to multiple sites in template;",
    ),
    (Problem::OverlapsMaskedSequence, "3' base overlaps masked sequence;"),
    (Problem::TooLong, "Too long;"),
    (Problem::TooShort, "Too short;"),
    (Problem::DoesNotAmplifyOrf, "Would not amplify an open reading frame;"),
    (Problem::MustMatchFailed, "Failed must_match requirements;"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Problems(u32);

impl Problems {
    #[inline(always)]
    fn bit(p: Problem) -> u32 {
        1 << (p as u8)
    }

    /// Records a problem; any recorded problem also marks the set as partially written.
    pub fn set(&mut self, p: Problem) {
        self.0 |= Self::bit(p) | Self::bit(Problem::PartiallyWritten);
    }

    /// Sets or clears a bookkeeping marker; the written state is left alone.
    pub fn set_marker(&mut self, p: Problem, on: bool) {
        if on {
            self.0 |= Self::bit(p);
        } else {
            self.0 &= !Self::bit(p);
        }
    }

    #[inline(always)]
    pub fn contains(&self, p: Problem) -> bool {
        self.0 & Self::bit(p) != 0
    }

    /// True if no problem beyond the bookkeeping markers was recorded.
    #[inline(always)]
    pub fn is_ok(&self) -> bool {
        self.0 & !BOOKKEEPING_MASK == 0
    }

    pub fn has_five_prime_problem(&self) -> bool {
        FIVE_PRIME_PROBLEMS.iter().any(|&p| self.contains(p))
    }

    pub fn is_completely_written(&self) -> bool {
        self.contains(Problem::CompletelyWritten)
    }

    pub fn problems(&self) -> Vec<Problem> {
        DESCRIPTIONS
            .iter()
            .filter(|(p, _)| self.contains(*p))
            .map(|(p, _)| *p)
            .collect()
    }

    /// Human readable list of the recorded problems, empty if there are none.
    pub fn describe(&self) -> String {
        let mut parts = vec![];
        if self.contains(Problem::PartiallyWritten) && !self.is_completely_written() {
            parts.push("Not completely checked;");
        }
        parts.extend(
            DESCRIPTIONS
                .iter()
                .filter(|(p, _)| self.contains(*p))
                .map(|(_, text)| *text),
        );
        parts.join(" ")
    }
}

/// Similarity of one oligo to every entry of a repeat library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepeatSimilarity {
    pub scores: Vec<f64>,
    /// Index of the most similar entry.
    pub max: usize,
    pub min: usize,
    pub name: Option<String>,
}

impl RepeatSimilarity {
    pub fn max_score(&self) -> f64 {
        self.scores.get(self.max).copied().unwrap_or(0.0)
    }
}

/// One candidate oligo. `start` is the 5' position on the included region for
/// left primers and internal oligos, and the 5' position on the reverse strand
/// (the rightmost template base) for right primers. Values that are expensive
/// to compute stay `None` until somebody needs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Oligo {
    pub start: usize,
    pub length: usize,
    pub kind: OligoType,
    pub problems: Problems,
    pub must_use: bool,
    /// Too close to an oligo in an already selected pair.
    pub overlaps: bool,
    pub overlaps_junction: bool,
    pub tm: f64,
    pub gc_content: f64,
    pub num_ns: usize,
    pub position_penalty: f64,
    pub end_stability: f64,
    pub self_any: Option<f64>,
    pub self_end: Option<f64>,
    pub hairpin: Option<f64>,
    pub repeat_sim: Option<RepeatSimilarity>,
    pub template_mispriming: Option<f64>,
    pub template_mispriming_r: Option<f64>,
    pub template_mispriming_ok: bool,
    pub seq_quality: i32,
    pub seq_end_quality: i32,
    /// Penalty, lower is better.
    pub quality: f64,
}

impl Oligo {
    pub fn new(kind: OligoType, start: usize, length: usize) -> Self {
        Self {
            start,
            length,
            kind,
            problems: Problems::default(),
            must_use: false,
            overlaps: false,
            overlaps_junction: false,
            tm: 0.0,
            gc_content: 0.0,
            num_ns: 0,
            position_penalty: 0.0,
            end_stability: 0.0,
            self_any: None,
            self_end: None,
            hairpin: None,
            repeat_sim: None,
            template_mispriming: None,
            template_mispriming_r: None,
            template_mispriming_ok: false,
            seq_quality: 0,
            seq_end_quality: 0,
            quality: 0.0,
        }
    }

    /// Leftmost template position covered.
    pub fn first(&self) -> usize {
        match self.kind {
            OligoType::Right => self.start + 1 - self.length,
            _ => self.start,
        }
    }

    /// Rightmost template position covered.
    pub fn last(&self) -> usize {
        match self.kind {
            OligoType::Right => self.start,
            _ => self.start + self.length - 1,
        }
    }

    pub fn three_prime(&self) -> usize {
        match self.kind {
            OligoType::Right => self.first(),
            _ => self.last(),
        }
    }

    #[inline(always)]
    pub fn ok_or_must_use(&self) -> bool {
        self.must_use || self.problems.is_ok()
    }

    pub fn position_penalty_infinite(&self) -> bool {
        self.problems.contains(Problem::InfinitePositionPenalty)
    }

    pub fn max_template_mispriming(&self) -> Option<f64> {
        match (self.template_mispriming, self.template_mispriming_r) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn repeat_max(&self) -> f64 {
        self.repeat_sim
            .as_ref()
            .map(|r| r.max_score())
            .unwrap_or(0.0)
    }
}

/// Penalty first, then the rightmost start, then the shortest.
pub fn compare_oligos(a: &Oligo, b: &Oligo) -> Ordering {
    a.quality
        .total_cmp(&b.quality)
        .then_with(|| b.start.cmp(&a.start))
        .then_with(|| a.length.cmp(&b.length))
}

/// Why candidates of one list were rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OligoStats {
    pub considered: i64,
    pub ns: i64,
    pub target: i64,
    pub excluded: i64,
    pub gc: i64,
    pub gc_clamp: i64,
    pub gc_end_high: i64,
    pub temp_min: i64,
    pub temp_max: i64,
    pub size_min: i64,
    pub size_max: i64,
    pub compl_any: i64,
    pub compl_end: i64,
    pub hairpin_th: i64,
    pub repeat_score: i64,
    pub poly_x: i64,
    pub seq_quality: i64,
    pub stability: i64,
    pub no_orf: i64,
    pub template_mispriming: i64,
    pub ok: i64,
    pub gmasked: i64,
    pub must_match_fail: i64,
    pub not_in_any_left_ok_region: i64,
    pub not_in_any_right_ok_region: i64,
}

impl OligoStats {
    /// Warning text for a caller-supplied oligo that failed its checks.
    pub fn must_use_warning(&self, label: &str) -> Option<String> {
        let reasons: Vec<&str> = [
            (self.size_min, "Too short"),
            (self.size_max, "Too long"),
            (self.ns, "Too many Ns"),
            (self.target, "Overlaps Target"),
            (self.excluded, "Overlaps Excluded Region"),
            (self.gc, "Unacceptable GC content"),
            (self.gc_clamp, "No GC clamp"),
            (self.temp_min, "Tm too low"),
            (self.temp_max, "Tm too high"),
            (self.compl_any, "High self complementarity"),
            (self.compl_end, "High end self complementarity"),
            (self.hairpin_th, "High hairpin stability (thermod. approach)"),
            (
                self.repeat_score,
                "High similarity to mispriming or mishyb library",
            ),
            (self.poly_x, "Long poly-X"),
            (self.seq_quality, "Low sequence quality"),
            (self.stability, "High 3' stability"),
            (self.no_orf, "Would not amplify any ORF"),
            (self.not_in_any_left_ok_region, "Not in any ok left region"),
            (self.not_in_any_right_ok_region, "Not in any ok right region"),
            (self.gmasked, "Masked with lowercase letter"),
            (self.must_match_fail, "Failed must_match requirements"),
        ]
        .into_iter()
        .filter(|(n, _)| *n != 0)
        .map(|(_, text)| text)
        .collect();
        if reasons.is_empty() {
            None
        } else {
            Some(format!("{label} is unacceptable: {}", reasons.join("/")))
        }
    }
}

impl fmt::Display for OligoStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "considered {}", self.considered)?;
        for (n, text) in [
            (self.no_orf, "would not amplify any of the ORF"),
            (self.ns, "too many Ns"),
            (self.target, "overlap target"),
            (self.excluded, "overlap excluded region"),
            (self.gc, "GC content failed"),
            (self.gc_clamp, "GC clamp failed"),
            (self.temp_min, "low tm"),
            (self.temp_max, "high tm"),
            (self.compl_any, "high any compl"),
            (self.compl_end, "high end compl"),
            (self.hairpin_th, "high hairpin stability"),
            (self.repeat_score, "high repeat similarity"),
            (self.poly_x, "long poly-x seq"),
            (self.seq_quality, "low sequence quality"),
            (self.stability, "high 3' stability"),
            (self.template_mispriming, "high template mispriming score"),
            (self.gmasked, "lowercase masking of 3' end"),
            (self.must_match_fail, "failed must_match requirements"),
            (self.not_in_any_left_ok_region, "not in any ok left region"),
            (self.not_in_any_right_ok_region, "not in any ok right region"),
        ] {
            if n != 0 {
                write!(f, ", {text} {n}")?;
            }
        }
        write!(f, ", ok {}", self.ok)
    }
}

/// Why candidate pairs were rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairStats {
    pub considered: i64,
    pub product: i64,
    pub target: i64,
    pub temp_diff: i64,
    pub compl_any: i64,
    pub compl_end: i64,
    pub internal: i64,
    pub repeat_sim: i64,
    pub reversed: i64,
    pub low_tm: i64,
    pub high_tm: i64,
    pub template_mispriming: i64,
    pub does_not_overlap_a_required_point: i64,
    pub overlaps_oligo_in_better_pair: i64,
    pub not_in_any_ok_region: i64,
    pub ok: i64,
}

impl fmt::Display for PairStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "considered {}", self.considered)?;
        for (n, text) in [
            (self.target, "no target"),
            (self.product, "unacceptable product size"),
            (self.low_tm, "low product Tm"),
            (self.high_tm, "high product Tm"),
            (self.temp_diff, "tm diff too large"),
            (self.compl_any, "high any compl"),
            (self.compl_end, "high end compl"),
            (self.internal, "no internal oligo"),
            (self.repeat_sim, "high mispriming library similarity"),
            (
                self.does_not_overlap_a_required_point,
                "no overlap of required point",
            ),
            (
                self.overlaps_oligo_in_better_pair,
                "primer in pair overlaps a primer in a better pair",
            ),
            (self.template_mispriming, "high template mispriming score"),
            (self.not_in_any_ok_region, "not in any ok region"),
            (self.reversed, "left primer to right of right primer"),
        ] {
            if n != 0 {
                write!(f, ", {text} {n}")?;
            }
        }
        write!(f, ", ok {}", self.ok)
    }
}

/// Candidates of one type together with their rejection statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OligoList {
    pub kind: OligoType,
    pub oligos: Vec<Oligo>,
    pub stats: OligoStats,
}

impl OligoList {
    pub fn new(kind: OligoType) -> Self {
        Self {
            kind,
            oligos: vec![],
            stats: OligoStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.oligos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oligos.is_empty()
    }

    pub fn sort(&mut self) {
        self.oligos.sort_by(compare_oligos);
    }

    pub fn explain(&self) -> String {
        self.stats.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problems_ok_and_markers() {
        let mut p = Problems::default();
        assert!(p.is_ok());
        assert_eq!(p.describe(), "");
        p.set(Problem::InfinitePositionPenalty);
        assert!(p.is_ok());
        p.set(Problem::CompletelyWritten);
        assert!(p.is_ok());
        p.set(Problem::LowTm);
        assert!(!p.is_ok());
        assert!(!p.has_five_prime_problem());
        assert_eq!(p.describe(), "Temperature too low;");
    }

    #[test]
    fn test_problems_five_prime_category() {
        let mut p = Problems::default();
        p.set(Problem::NoGcClamp);
        assert!(p.has_five_prime_problem());
        let mut q = Problems::default();
        q.set(Problem::HighGc);
        q.set(Problem::TooShort);
        assert!(!q.has_five_prime_problem());
    }

    #[test]
    fn test_problems_describe_partial() {
        let mut p = Problems::default();
        p.set(Problem::HighTm);
        p.set(Problem::TooManyNs);
        assert_eq!(
            p.describe(),
            "Not completely checked; Too many Ns; Temperature too high;"
        );
        assert_eq!(p.problems(), vec![Problem::TooManyNs, Problem::HighTm]);
        p.set(Problem::CompletelyWritten);
        assert_eq!(p.describe(), "Too many Ns; Temperature too high;");
    }

    #[test]
    fn test_oligo_coordinates() {
        let left = Oligo::new(OligoType::Left, 10, 20);
        assert_eq!((left.first(), left.last(), left.three_prime()), (10, 29, 29));
        let right = Oligo::new(OligoType::Right, 99, 20);
        assert_eq!((right.first(), right.last(), right.three_prime()), (80, 99, 80));
    }

    #[test]
    fn test_ok_or_must_use() {
        let mut o = Oligo::new(OligoType::Left, 0, 20);
        o.problems.set(Problem::HighTm);
        assert!(!o.ok_or_must_use());
        o.must_use = true;
        assert!(o.ok_or_must_use());
    }

    #[test]
    fn test_template_mispriming_max() {
        let mut o = Oligo::new(OligoType::Left, 0, 20);
        assert_eq!(o.max_template_mispriming(), None);
        o.template_mispriming = Some(3.0);
        assert_eq!(o.max_template_mispriming(), Some(3.0));
        o.template_mispriming_r = Some(7.5);
        assert_eq!(o.max_template_mispriming(), Some(7.5));
    }

    #[test]
    fn test_sort_order() {
        let mut list = OligoList::new(OligoType::Left);
        let mut a = Oligo::new(OligoType::Left, 5, 20);
        a.quality = 1.0;
        let mut b = Oligo::new(OligoType::Left, 7, 21);
        b.quality = 1.0;
        let mut c = Oligo::new(OligoType::Left, 7, 19);
        c.quality = 1.0;
        let mut d = Oligo::new(OligoType::Left, 0, 18);
        d.quality = 0.5;
        list.oligos = vec![a, b, c, d];
        list.sort();
        let order: Vec<(usize, usize)> = list.oligos.iter().map(|o| (o.start, o.length)).collect();
        assert_eq!(order, vec![(0, 18), (7, 19), (7, 21), (5, 20)]);
    }

    #[test]
    fn test_oligo_explain() {
        let stats = OligoStats {
            considered: 120,
            gc: 3,
            temp_min: 40,
            temp_max: 12,
            ok: 65,
            ..Default::default()
        };
        assert_eq!(
            stats.to_string(),
            "considered 120, GC content failed 3, low tm 40, high tm 12, ok 65"
        );
    }

    #[test]
    fn test_pair_explain() {
        let stats = PairStats {
            considered: 30,
            product: 12,
            reversed: 1,
            ok: 17,
            ..Default::default()
        };
        assert_eq!(
            stats.to_string(),
            "considered 30, unacceptable product size 12, left primer to right of right primer 1, ok 17"
        );
    }

    #[test]
    fn test_must_use_warning() {
        assert_eq!(OligoStats::default().must_use_warning("Left primer"), None);
        let stats = OligoStats {
            size_min: 1,
            temp_min: 1,
            gmasked: 1,
            ..Default::default()
        };
        assert_eq!(
            stats.must_use_warning("Left primer").unwrap(),
            "Left primer is unacceptable: Too short/Tm too low/Masked with lowercase letter"
        );
    }
}
