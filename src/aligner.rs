//! Dynamic-programming alignment over a byte alphabet with gap runs bounded by
//! `max_gap`. The generic variant keeps the full score matrix and can trace the
//! path back; the rolling variants only compute the score and run in linear space.

use crate::error::{PrimerError, Result};
use crate::scoring_matrix::ScoringMatrix;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Longest sequence the generic (full matrix) aligner accepts.
pub const MAX_ALIGN: usize = 1600;

/// Stand-in for an unreachable gap move; far enough from the `i64` bounds that
/// adding penalties never wraps.
const NO_MOVE: i64 = i64::MIN / 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignmentMode {
    /// Best cell anywhere, scores floored at 0.
    Local,
    /// Best cell in the last row of the first sequence.
    GlobalEnd,
    /// Best cell in the last row or the last column.
    Global,
    /// Like [`AlignmentMode::GlobalEnd`] but with the local floor at 0.
    LocalEnd,
}

impl AlignmentMode {
    #[inline(always)]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local | Self::LocalEnd)
    }

    #[inline(always)]
    fn is_eligible(&self, i: usize, j: usize, xlen: usize, ylen: usize) -> bool {
        match self {
            Self::Local => true,
            Self::GlobalEnd | Self::LocalEnd => i + 1 == xlen,
            Self::Global => i + 1 == xlen || j + 1 == ylen,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlignerArgs {
    pub matrix: Arc<ScoringMatrix>,
    /// Cost of opening a gap (negative).
    pub gap: i32,
    /// Cost of each further gapped position (negative).
    pub gap_extend: i32,
    /// Longest allowed gap run; `None` means unbounded.
    pub max_gap: Option<usize>,
    pub mode: AlignmentMode,
    pub want_path: bool,
    pub check_chars: bool,
    pub force_generic: bool,
    pub force_long_generic: bool,
}

impl AlignerArgs {
    /// Argument set used for oligo complementarity: gap -200/-200, single
    /// position gaps, score only.
    pub fn primer(matrix: Arc<ScoringMatrix>, mode: AlignmentMode) -> Self {
        Self {
            matrix,
            gap: -200,
            gap_extend: -200,
            max_gap: Some(1),
            mode,
            want_path: false,
            check_chars: false,
            force_generic: false,
            force_long_generic: false,
        }
    }

    /// General purpose nucleotide alignment with traceback.
    pub fn nucleotide_default() -> Self {
        Self {
            matrix: Arc::new(ScoringMatrix::nucleotide_default()),
            gap: -100,
            gap_extend: -100,
            max_gap: Some(3),
            mode: AlignmentMode::Local,
            want_path: true,
            check_chars: true,
            force_generic: false,
            force_long_generic: false,
        }
    }

    pub fn with_mode(mut self, mode: AlignmentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Primer-level score: `max(score, 0) / 100`. In the local modes a second
    /// sequence shorter than 3 scores its own length.
    pub fn primer_score(&self, s1: &[u8], s2: &[u8]) -> Result<f64> {
        if self.mode.is_local() && s2.len() < 3 {
            return Ok(s2.len() as f64);
        }
        let res = align(s1, s2, self)?;
        if res.score < 0 {
            Ok(0.0)
        } else {
            Ok(res.score as f64 / 100.0)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    pub score: i64,
    /// Matched coordinate pairs, first to last; only filled on request.
    pub path: Vec<(usize, usize)>,
    pub align_end_1: Option<usize>,
    pub align_end_2: Option<usize>,
    pub message: Option<String>,
}

impl AlignmentResult {
    fn empty(message: &str) -> Self {
        Self {
            message: Some(message.to_string()),
            ..Default::default()
        }
    }
}

/// The primer-picking argument sets, shared for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct PrimerAligners {
    pub local: AlignerArgs,
    pub end: AlignerArgs,
    pub local_end: AlignerArgs,
    pub local_ambig: AlignerArgs,
    pub local_end_ambig: AlignerArgs,
}

impl PrimerAligners {
    pub fn new() -> Self {
        let plain = Arc::new(ScoringMatrix::primer_default());
        let ambig = Arc::new(ScoringMatrix::primer_default().with_ambiguity_codes());
        Self {
            local: AlignerArgs::primer(plain.clone(), AlignmentMode::Local),
            end: AlignerArgs::primer(plain.clone(), AlignmentMode::GlobalEnd),
            local_end: AlignerArgs::primer(plain, AlignmentMode::LocalEnd),
            local_ambig: AlignerArgs::primer(ambig.clone(), AlignmentMode::Local),
            local_end_ambig: AlignerArgs::primer(ambig, AlignmentMode::LocalEnd),
        }
    }
}

impl Default for PrimerAligners {
    fn default() -> Self {
        Self::new()
    }
}

/// Aligns `x` against `y` and picks the variant from the arguments and lengths.
pub fn align(x: &[u8], y: &[u8], args: &AlignerArgs) -> Result<AlignmentResult> {
    if args.max_gap == Some(0) {
        return Err(PrimerError::Alignment("max_gap must be at least 1".to_string()));
    }
    if args.check_chars {
        if let Some(c) = args
            .matrix
            .first_illegal(x)
            .or_else(|| args.matrix.first_illegal(y))
        {
            return Err(PrimerError::InvalidInput(format!(
                "Illegal character in input: {}",
                c as char
            )));
        }
    }
    if x.is_empty() {
        return Ok(AlignmentResult::empty("Empty first sequence"));
    }
    if y.is_empty() {
        return Ok(AlignmentResult::empty("Empty second sequence"));
    }

    let (xlen, ylen) = (x.len(), y.len());
    if args.want_path || args.force_generic {
        if xlen > MAX_ALIGN {
            return Err(PrimerError::Alignment(format!(
                "Sequence 1 longer than {MAX_ALIGN} and alignment is requested"
            )));
        }
        if ylen > MAX_ALIGN {
            return Err(PrimerError::Alignment(format!(
                "Sequence 2 longer than {MAX_ALIGN} and alignment is requested"
            )));
        }
        return generic(x, y, args);
    }
    if args.force_long_generic {
        return long_generic(x, y, args);
    }
    if args.max_gap == Some(1) {
        return match args.mode {
            AlignmentMode::Local | AlignmentMode::LocalEnd | AlignmentMode::GlobalEnd => {
                maxgap1(x, y, args)
            }
            AlignmentMode::Global if xlen <= MAX_ALIGN && ylen <= MAX_ALIGN => {
                generic(x, y, args)
            }
            AlignmentMode::Global => long_generic(x, y, args),
        };
    }
    if xlen < MAX_ALIGN && ylen < MAX_ALIGN {
        generic(x, y, args)
    } else {
        long_generic(x, y, args)
    }
}

fn alloc_cells<T: Clone>(n: usize, value: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n).map_err(|e| {
        PrimerError::ResourceExhausted(format!("alignment matrix of {n} cells: {e}"))
    })?;
    v.resize(n, value);
    Ok(v)
}

#[inline(always)]
fn substitution(args: &AlignerArgs, a: u8, b: u8) -> i64 {
    args.matrix.score(a, b) as i64
}

/// Highest reachable row index for a gap of up to `max_gap` positions ending
/// before coordinate `i`.
#[inline(always)]
fn gap_reach(max_gap: Option<usize>, i: usize) -> usize {
    match max_gap {
        Some(mg) if mg + 1 <= i => mg + 1,
        _ => i,
    }
}

/// Cell value given the diagonal and both gap candidates; ties prefer the
/// diagonal, then the gap along the first sequence.
#[inline(always)]
fn best_move(a: i64, b: i64, c: i64) -> (i64, u8) {
    if a >= b && a >= c {
        (a, 0)
    } else if b > a && b >= c {
        (b, 1)
    } else {
        (c, 2)
    }
}

fn generic(x: &[u8], y: &[u8], args: &AlignerArgs) -> Result<AlignmentResult> {
    let (xlen, ylen) = (x.len(), y.len());
    let mode = args.mode;
    let floor = mode.is_local();
    let gap = args.gap as i64;
    let gap_extend = args.gap_extend as i64;
    let idx = |i: usize, j: usize| i * ylen + j;

    let mut s = alloc_cells(xlen * ylen, 0i64)?;
    let mut p = if args.want_path {
        alloc_cells(xlen * ylen, (0usize, 0usize))?
    } else {
        vec![]
    };

    let mut smax = i64::MIN;
    let (mut best_i, mut best_j) = (0usize, 0usize);
    for i in 0..xlen {
        let mut score = substitution(args, x[i], y[0]);
        if floor && score < 0 {
            score = 0;
        }
        if mode == AlignmentMode::Local && score > smax {
            smax = score;
            (best_i, best_j) = (i, 0);
        }
        s[idx(i, 0)] = score;
    }
    if mode != AlignmentMode::Local {
        smax = s[idx(xlen - 1, 0)];
        (best_i, best_j) = (xlen - 1, 0);
    }
    for j in 0..ylen {
        let mut score = substitution(args, x[0], y[j]);
        if floor && score < 0 {
            score = 0;
        }
        if mode == AlignmentMode::Local && score > smax {
            smax = score;
            (best_i, best_j) = (0, j);
        }
        s[idx(0, j)] = score;
    }
    if mode != AlignmentMode::Local {
        // Border cells that already sit in the last row or column.
        let border = (0..xlen).map(|i| (i, 0)).chain((1..ylen).map(|j| (0, j)));
        for (i, j) in border {
            if mode.is_eligible(i, j, xlen, ylen) && s[idx(i, j)] > smax {
                smax = s[idx(i, j)];
                (best_i, best_j) = (i, j);
            }
        }
    }

    for i in 1..xlen {
        for j in 1..ylen {
            let a = s[idx(i - 1, j - 1)];
            let (mut b, mut c) = (NO_MOVE, NO_MOVE);
            let (mut b_from, mut c_from) = (0usize, 0usize);
            for k in 2..=gap_reach(args.max_gap, i) {
                let v = s[idx(i - k, j - 1)] + gap + gap_extend * (k as i64 - 2);
                if v > b {
                    b = v;
                    b_from = i - k;
                }
            }
            for k in 2..=gap_reach(args.max_gap, j) {
                let v = s[idx(i - 1, j - k)] + gap + gap_extend * (k as i64 - 2);
                if v > c {
                    c = v;
                    c_from = j - k;
                }
            }
            let (prev, dir) = best_move(a, b, c);
            let mut score = prev + substitution(args, x[i], y[j]);
            if args.want_path {
                p[idx(i, j)] = match dir {
                    0 => (i - 1, j - 1),
                    1 => (b_from, j - 1),
                    _ => (i - 1, c_from),
                };
            }
            if score >= smax && mode.is_eligible(i, j, xlen, ylen) {
                smax = score;
                (best_i, best_j) = (i, j);
            }
            if floor && score < 0 {
                score = 0;
            }
            s[idx(i, j)] = score;
        }
    }

    if floor && s[idx(best_i, best_j)] <= 0 {
        return Ok(AlignmentResult::default());
    }

    let mut path = vec![];
    if args.want_path {
        path.push((best_i, best_j));
        let (mut ci, mut cj) = (best_i, best_j);
        while ci != 0 && cj != 0 {
            if floor && s[idx(ci, cj)] == 0 {
                path.pop();
                break;
            }
            (ci, cj) = p[idx(ci, cj)];
            path.push((ci, cj));
        }
        path.reverse();
    }
    Ok(AlignmentResult {
        score: smax,
        path,
        align_end_1: Some(best_i),
        align_end_2: Some(best_j),
        message: None,
    })
}

/// Score-only variant keeping `max_gap + 2` rows of the matrix.
fn long_generic(x: &[u8], y: &[u8], args: &AlignerArgs) -> Result<AlignmentResult> {
    let (xlen, ylen) = (x.len(), y.len());
    let mode = args.mode;
    let floor = mode.is_local();
    let gap = args.gap as i64;
    let gap_extend = args.gap_extend as i64;
    let depth = match args.max_gap {
        Some(mg) => (mg + 2).min(xlen),
        None => xlen,
    };
    let mut rows = alloc_cells(depth, vec![])?;
    for row in rows.iter_mut() {
        *row = alloc_cells(ylen, 0i64)?;
    }

    let mut smax = i64::MIN;
    let mut tracked = false;
    for i in 0..xlen {
        let last = i + 1 == xlen;
        for j in 0..ylen {
            let mut score = if i == 0 || j == 0 {
                substitution(args, x[i], y[j])
            } else {
                let a = rows[(i - 1) % depth][j - 1];
                let mut b = NO_MOVE;
                for k in 2..=gap_reach(args.max_gap, i) {
                    b = b.max(rows[(i - k) % depth][j - 1] + gap + gap_extend * (k as i64 - 2));
                }
                let mut c = NO_MOVE;
                for k in 2..=gap_reach(args.max_gap, j) {
                    c = c.max(rows[(i - 1) % depth][j - k] + gap + gap_extend * (k as i64 - 2));
                }
                best_move(a, b, c).0 + substitution(args, x[i], y[j])
            };
            if floor && score < 0 {
                score = 0;
            }
            let eligible = match mode {
                AlignmentMode::Local => true,
                AlignmentMode::GlobalEnd | AlignmentMode::LocalEnd => last,
                AlignmentMode::Global => last || j + 1 == ylen,
            };
            if eligible && (!tracked || score > smax) {
                smax = score;
                tracked = true;
            }
            rows[i % depth][j] = score;
        }
    }
    if mode == AlignmentMode::Local && smax <= 0 {
        smax = 0;
    }
    Ok(AlignmentResult {
        score: smax,
        ..Default::default()
    })
}

/// Three rolling rows for single-position gaps in the LOCAL, LOCAL_END and
/// GLOBAL_END modes.
fn maxgap1(x: &[u8], y: &[u8], args: &AlignerArgs) -> Result<AlignmentResult> {
    let (xlen, ylen) = (x.len(), y.len());
    let mode = args.mode;
    if mode.is_local() && ylen < 3 {
        return Err(PrimerError::Alignment(format!(
            "{mode:?} alignment with single-position gaps needs a second sequence of at least 3"
        )));
    }
    let floor = mode.is_local();
    let gap = args.gap as i64;

    let mut two_back = alloc_cells(ylen, 0i64)?;
    let mut one_back = alloc_cells(ylen, 0i64)?;
    let mut current = alloc_cells(ylen, 0i64)?;
    let mut smax: Option<i64> = if floor { Some(0) } else { None };

    for i in 0..xlen {
        let track = mode == AlignmentMode::Local || i + 1 == xlen;
        for j in 0..ylen {
            let sub = args.matrix.score(x[i], y[j]);
            let mut score = if i == 0 || j == 0 {
                sub as i64
            } else {
                let a = one_back[j - 1];
                let b = if i > 1 { two_back[j - 1] + gap } else { NO_MOVE };
                let c = if j > 1 { one_back[j - 2] + gap } else { NO_MOVE };
                best_move(a, b, c).0 + sub as i64
            };
            if floor && score < 0 {
                score = 0;
            }
            if track && smax.is_none_or(|m| score > m) {
                smax = Some(score);
            }
            current[j] = score;
        }
        std::mem::swap(&mut two_back, &mut one_back);
        std::mem::swap(&mut one_back, &mut current);
    }
    Ok(AlignmentResult {
        score: smax.unwrap_or(0),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primer_args(mode: AlignmentMode) -> AlignerArgs {
        AlignerArgs::primer(Arc::new(ScoringMatrix::primer_default()), mode)
    }

    #[test]
    fn test_global_identical() {
        let args = primer_args(AlignmentMode::Global);
        let res = align(b"ACGTACGT", b"ACGTACGT", &args).unwrap();
        assert_eq!(res.score, 800);
        let res = align(b"ACGTACGT", b"ACGTACGT", &AlignerArgs::nucleotide_default().with_mode(AlignmentMode::Global)).unwrap();
        assert_eq!(res.score, 800);
        assert_eq!(res.path, (0..8).map(|i| (i, i)).collect::<Vec<_>>());
        assert_eq!(res.align_end_1, Some(7));
        assert_eq!(res.align_end_2, Some(7));
    }

    #[test]
    fn test_diagonal_preferred_on_tie() {
        // With a zero gap cost, skipping around the mismatch scores the same as
        // walking straight through it; the diagonal must win.
        let mut args = AlignerArgs::nucleotide_default().with_mode(AlignmentMode::Global);
        args.gap = 0;
        args.gap_extend = 0;
        args.max_gap = Some(1);
        args.matrix = Arc::new({
            let mut m = ScoringMatrix::primer_default();
            m.set(b'C', b'G', 0);
            m.set(b'G', b'C', 0);
            m
        });
        let res = align(b"ACA", b"AGA", &args).unwrap();
        assert_eq!(res.score, 200);
        assert_eq!(res.path, vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_local_with_path() {
        let args = AlignerArgs::nucleotide_default();
        let res = align(b"TTTTACGTACGTTTTT", b"GGACGTACGGG", &args).unwrap();
        assert_eq!(res.score, 700);
        assert_eq!(res.path.len(), 7);
        assert_eq!(res.path.first(), Some(&(4, 2)));
        assert_eq!(res.path.last(), Some(&(10, 8)));
    }

    #[test]
    fn test_local_no_similarity() {
        let args = AlignerArgs::nucleotide_default();
        let res = align(b"AAAA", b"CCCC", &args).unwrap();
        assert_eq!(res.score, 0);
        assert!(res.path.is_empty());
        assert_eq!(res.align_end_1, None);
    }

    #[test]
    fn test_illegal_and_empty() {
        let args = AlignerArgs::nucleotide_default();
        let err = align(b"ACXT", b"ACGT", &args).unwrap_err();
        assert_eq!(err.to_string(), "invalid input: Illegal character in input: X");
        let res = align(b"", b"ACGT", &args).unwrap();
        assert_eq!(res.score, 0);
        assert_eq!(res.message.as_deref(), Some("Empty first sequence"));
        let res = align(b"ACGT", b"", &args).unwrap();
        assert_eq!(res.message.as_deref(), Some("Empty second sequence"));
    }

    #[test]
    fn test_path_length_limit() {
        let args = AlignerArgs::nucleotide_default();
        let long = vec![b'A'; MAX_ALIGN + 1];
        assert!(align(&long, b"ACGT", &args).is_err());
        let mut score_only = args.clone();
        score_only.want_path = false;
        let res = align(&long, b"AAAA", &score_only).unwrap();
        assert_eq!(res.score, 400);
    }

    #[test]
    fn test_primer_score_wrapper() {
        let aligners = PrimerAligners::new();
        assert_eq!(aligners.local.primer_score(b"ACGTACGT", b"AC").unwrap(), 2.0);
        assert_eq!(aligners.local.primer_score(b"ACGT", b"ACGT").unwrap(), 4.0);
        // Global end alignments may be negative; the wrapper floors them.
        assert_eq!(aligners.end.primer_score(b"AAAA", b"CCCC").unwrap(), 0.0);
        assert_eq!(aligners.end.primer_score(b"AAGC", b"GC").unwrap(), 2.0);
    }

    #[test]
    fn test_ambiguity_matrix() {
        let aligners = PrimerAligners::new();
        assert_eq!(aligners.local.primer_score(b"ACGRT", b"ACGAT").unwrap(), 3.0);
        assert_eq!(aligners.local_ambig.primer_score(b"ACGRT", b"ACGAT").unwrap(), 5.0);
    }

    #[test]
    fn test_maxgap1_requires_three() {
        let args = primer_args(AlignmentMode::Local);
        assert!(align(b"ACGT", b"AC", &args).is_err());
    }

    #[test]
    fn test_end_anchored() {
        let args = primer_args(AlignmentMode::GlobalEnd);
        // The last base of x must be aligned; a trailing mismatch costs 100.
        assert_eq!(align(b"ACGTA", b"ACGTC", &args).unwrap().score, 300);
        let args = primer_args(AlignmentMode::LocalEnd);
        assert_eq!(align(b"ACGTA", b"ACGTC", &args).unwrap().score, 300);
        assert_eq!(align(b"CCCCA", b"GGGGG", &args).unwrap().score, 0);
    }
}
