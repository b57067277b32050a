//! Complementarity and mispriming estimates behind one interface. The DP
//! oracle scores alignments with the primer aligners; the thermodynamic oracle
//! reports melting temperatures of ungapped nearest-neighbor duplexes.

use crate::PRIMER_ALIGNERS;
use crate::dna_sequence::reverse_complement;
use crate::error::Result;
use crate::thermodynamics::{Conditions, SaltCorrection, TmMethod, duplex_terms, oligo_tm};
use serde::{Deserialize, Serialize};

const KELVIN: f64 = 273.15;

/// Hairpin loop entropies in cal/(K mol), indexed by loop length - 1.
const HAIRPIN_LOOP_ENTROPY: [f64; 30] = [
    -1.0, -1.0, -11.28, -11.28, -10.64, -12.89, -13.54, -13.86, -14.5, -14.83, -15.29, -16.12,
    -16.5, -16.44, -16.77, -17.08, -17.38, -17.73, -17.99, -18.37, -18.61, -18.84, -19.05,
    -19.26, -19.66, -19.85, -20.04, -20.21, -20.38, -20.31,
];
const MIN_HAIRPIN_LOOP: usize = 3;
const MIN_STEM: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleKind {
    Dp,
    Thermodynamic,
}

impl OracleKind {
    pub fn from_flag(thermodynamic: bool) -> Self {
        if thermodynamic {
            Self::Thermodynamic
        } else {
            Self::Dp
        }
    }

    /// Picks the threshold or weight that belongs to this kind of score.
    #[inline(always)]
    pub fn select<T>(self, dp: T, thermodynamic: T) -> T {
        match self {
            Self::Dp => dp,
            Self::Thermodynamic => thermodynamic,
        }
    }

    /// Penalty contribution of `value`. DP scores are weighted linearly. Duplex
    /// temperatures are compared with `tm - cutoff`: close to or above it the
    /// penalty grows linearly, well below it the penalty decays.
    pub fn penalty(self, weight: f64, value: f64, tm: f64, cutoff: f64) -> f64 {
        if weight == 0.0 {
            return 0.0;
        }
        match self {
            Self::Dp => weight * value,
            Self::Thermodynamic => {
                let limit = tm - cutoff;
                if limit <= value {
                    weight * (value - (limit - 1.0))
                } else {
                    weight / (limit + 1.0 - value)
                }
            }
        }
    }
}

/// All sequences are 5'->3'.
pub trait AlignmentOracle: Send + Sync {
    fn kind(&self) -> OracleKind;

    /// Duplex between `a` and `b` anywhere along the two strands.
    fn any(&self, a: &[u8], b: &[u8]) -> Result<f64>;

    /// Duplex that includes the 3' end of `a`.
    fn end(&self, a: &[u8], b: &[u8]) -> Result<f64>;

    /// End-anchored duplex of a primer pair.
    fn pair_end(&self, a: &[u8], b: &[u8]) -> Result<f64>;

    /// Stem-loop stability; `None` if the model has no notion of it.
    fn hairpin(&self, oligo: &[u8]) -> Result<Option<f64>>;

    /// Similarity of `oligo` to a site on `target`, read on the same strand,
    /// that ends at the 3' end of the oligo.
    fn template(&self, oligo: &[u8], target: &[u8]) -> Result<f64>;
}

pub fn oracle_for(kind: OracleKind, conditions: Conditions) -> Box<dyn AlignmentOracle> {
    match kind {
        OracleKind::Dp => Box::new(DpOracle),
        OracleKind::Thermodynamic => Box::new(ThermoOracle::new(conditions)),
    }
}

/// Scores in alignment units (raw score / 100).
#[derive(Debug, Clone, Copy, Default)]
pub struct DpOracle;

impl AlignmentOracle for DpOracle {
    fn kind(&self) -> OracleKind {
        OracleKind::Dp
    }

    fn any(&self, a: &[u8], b: &[u8]) -> Result<f64> {
        PRIMER_ALIGNERS
            .local
            .primer_score(a, &reverse_complement(b))
    }

    fn end(&self, a: &[u8], b: &[u8]) -> Result<f64> {
        PRIMER_ALIGNERS.end.primer_score(a, &reverse_complement(b))
    }

    fn pair_end(&self, a: &[u8], b: &[u8]) -> Result<f64> {
        self.end(a, b)
    }

    fn hairpin(&self, _oligo: &[u8]) -> Result<Option<f64>> {
        Ok(None)
    }

    fn template(&self, oligo: &[u8], target: &[u8]) -> Result<f64> {
        PRIMER_ALIGNERS.local_end.primer_score(oligo, target)
    }
}

/// Ungapped nearest-neighbor duplexes with the SantaLucia tables. Values are
/// melting temperatures in degrees Celsius, never below 0.
#[derive(Debug, Clone)]
pub struct ThermoOracle {
    conditions: Conditions,
}

impl ThermoOracle {
    pub fn new(conditions: Conditions) -> Self {
        Self { conditions }
    }

    fn stretch_tm(&self, stretch: &[u8]) -> Result<f64> {
        oligo_tm(
            stretch,
            &self.conditions,
            TmMethod::SantaLucia,
            SaltCorrection::SantaLucia,
        )
    }

    /// Highest Tm over maximal runs where `a` reads the same as `t`.
    fn best_run(&self, a: &[u8], t: &[u8]) -> Result<f64> {
        let mut best = 0.0_f64;
        let (la, lt) = (a.len() as i64, t.len() as i64);
        for offset in -(la - 1)..lt {
            let mut run_start: Option<usize> = None;
            let i_from = 0.max(-offset);
            let i_to = la.min(lt - offset);
            for i in i_from..=i_to {
                let matched = i < i_to && same_base(a[i as usize], t[(i + offset) as usize]);
                match (matched, run_start) {
                    (true, None) => run_start = Some(i as usize),
                    (false, Some(s)) => {
                        let e = i as usize;
                        if e - s >= MIN_STEM {
                            best = best.max(self.stretch_tm(&a[s..e])?);
                        }
                        run_start = None;
                    }
                    _ => {}
                }
            }
        }
        Ok(best)
    }

    /// Highest Tm over runs of `a` matching `t` that contain the last base of `a`.
    fn best_end_run(&self, a: &[u8], t: &[u8]) -> Result<f64> {
        let Some(&last) = a.last() else {
            return Ok(0.0);
        };
        let mut best = 0.0_f64;
        for j in 0..t.len() {
            if !same_base(last, t[j]) {
                continue;
            }
            let mut len = 1;
            while len < a.len() && len <= j && same_base(a[a.len() - 1 - len], t[j - len]) {
                len += 1;
            }
            if len >= MIN_STEM {
                best = best.max(self.stretch_tm(&a[a.len() - len..])?);
            }
        }
        Ok(best)
    }
}

impl AlignmentOracle for ThermoOracle {
    fn kind(&self) -> OracleKind {
        OracleKind::Thermodynamic
    }

    fn any(&self, a: &[u8], b: &[u8]) -> Result<f64> {
        self.best_run(a, &reverse_complement(b))
    }

    fn end(&self, a: &[u8], b: &[u8]) -> Result<f64> {
        self.best_end_run(a, &reverse_complement(b))
    }

    fn pair_end(&self, a: &[u8], b: &[u8]) -> Result<f64> {
        Ok(self.end(a, b)?.max(self.end(b, a)?))
    }

    fn hairpin(&self, oligo: &[u8]) -> Result<Option<f64>> {
        let n = oligo.len();
        let salt = self.conditions.effective_monovalent()?;
        let mut best = 0.0_f64;
        for p in 0..n {
            for q in (p + 1)..n {
                if !pairs(oligo[p], oligo[q]) {
                    continue;
                }
                // Only start at the outermost pair of a stem.
                if p > 0 && q + 1 < n && pairs(oligo[p - 1], oligo[q + 1]) {
                    continue;
                }
                let mut stem = 0;
                while q >= p + 2 * (stem + 1) + MIN_HAIRPIN_LOOP - 1
                    && pairs(oligo[p + stem], oligo[q - stem])
                {
                    stem += 1;
                }
                if stem < MIN_STEM {
                    continue;
                }
                let loop_len = q + 1 - p - 2 * stem;
                let (dh, mut ds) = duplex_terms(&oligo[p..p + stem], TmMethod::SantaLucia)?;
                ds += 0.368 * (stem - 1) as f64 * (salt / 1000.0).ln();
                ds += loop_entropy(loop_len);
                if ds >= 0.0 {
                    continue;
                }
                best = best.max(dh / ds - KELVIN);
            }
        }
        Ok(Some(best.max(0.0)))
    }

    fn template(&self, oligo: &[u8], target: &[u8]) -> Result<f64> {
        self.best_end_run(oligo, target)
    }
}

fn loop_entropy(loop_len: usize) -> f64 {
    let max = HAIRPIN_LOOP_ENTROPY.len();
    if loop_len <= max {
        HAIRPIN_LOOP_ENTROPY[loop_len - 1]
    } else {
        HAIRPIN_LOOP_ENTROPY[max - 1] - 2.44 * 1.987 * (loop_len as f64 / max as f64).ln()
    }
}

#[inline(always)]
fn same_base(a: u8, b: u8) -> bool {
    let a = a.to_ascii_uppercase();
    matches!(a, b'A' | b'C' | b'G' | b'T') && a == b.to_ascii_uppercase()
}

#[inline(always)]
fn pairs(a: u8, b: u8) -> bool {
    matches!(
        (a.to_ascii_uppercase(), b.to_ascii_uppercase()),
        (b'A', b'T') | (b'T', b'A') | (b'C', b'G') | (b'G', b'C')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalty_transform() {
        assert_eq!(OracleKind::Dp.penalty(2.0, 3.5, 60.0, 5.0), 7.0);
        assert_eq!(OracleKind::Dp.penalty(0.0, 3.5, 60.0, 5.0), 0.0);
        // limit 55: at or above it the penalty is linear
        let t = OracleKind::Thermodynamic;
        assert!((t.penalty(1.0, 55.0, 60.0, 5.0) - 1.0).abs() < 1e-12);
        assert!((t.penalty(1.0, 57.0, 60.0, 5.0) - 3.0).abs() < 1e-12);
        // far below it decays
        assert!((t.penalty(1.0, 45.0, 60.0, 5.0) - 1.0 / 11.0).abs() < 1e-12);
        assert_eq!(t.select(8.0, 47.0), 47.0);
        assert_eq!(OracleKind::Dp.select(8.0, 47.0), 8.0);
    }

    #[test]
    fn test_dp_oracle_self_complementarity() {
        let dp = DpOracle;
        // a palindrome is fully complementary to itself
        assert_eq!(dp.any(b"GAATTC", b"GAATTC").unwrap(), 6.0);
        assert_eq!(dp.end(b"GAATTC", b"GAATTC").unwrap(), 6.0);
        assert_eq!(dp.hairpin(b"GAATTC").unwrap(), None);
        assert_eq!(dp.kind(), OracleKind::Dp);
        // poly-A has no complement in itself
        assert_eq!(dp.any(b"AAAAAAAA", b"AAAAAAAA").unwrap(), 0.0);
    }

    #[test]
    fn test_dp_oracle_template() {
        let dp = DpOracle;
        let oligo = b"ACGTTGCA";
        let target = b"TTTTTTACGTTGCATTTTT";
        assert_eq!(dp.template(oligo, target).unwrap(), 8.0);
        assert_eq!(dp.template(oligo, b"CCCCCCCCCC").unwrap(), 0.0);
    }

    #[test]
    fn test_thermo_full_duplex_equals_oligo_tm() {
        let cond = Conditions::default();
        let oracle = ThermoOracle::new(cond);
        let seq = b"ACCGTTAGCTAGGCAT";
        let rc = reverse_complement(seq);
        let expected = oligo_tm(seq, &cond, TmMethod::SantaLucia, SaltCorrection::SantaLucia)
            .unwrap()
            .max(0.0);
        assert!((oracle.any(seq, &rc).unwrap() - expected).abs() < 1e-9);
        assert!((oracle.end(seq, &rc).unwrap() - expected).abs() < 1e-9);
        assert!((oracle.pair_end(seq, &rc).unwrap() - expected).abs() < 1e-9);
        assert!((oracle.template(seq, b"TTTTACCGTTAGCTAGGCAT").unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_thermo_no_complement() {
        let oracle = ThermoOracle::new(Conditions::default());
        assert_eq!(oracle.any(b"AAAAAAAA", b"AAAAAAAA").unwrap(), 0.0);
        assert_eq!(oracle.hairpin(b"AAAAAAAAAA").unwrap(), Some(0.0));
        assert_eq!(oracle.template(b"ACGT", b"").unwrap(), 0.0);
    }

    #[test]
    fn test_thermo_end_not_above_any() {
        let oracle = ThermoOracle::new(Conditions::default());
        let a = b"GGGCCCAATTAAAC";
        let b = b"GTTTGGGCCCTT";
        let any = oracle.any(a, b).unwrap();
        let end = oracle.end(a, b).unwrap();
        assert!(end <= any);
        assert!(any > 0.0);
    }

    #[test]
    fn test_thermo_hairpin() {
        let oracle = ThermoOracle::new(Conditions::default());
        let hp = oracle.hairpin(b"GGGGGAAAACCCCC").unwrap().unwrap();
        assert!(hp > 0.0);
        // same loop, one more stacked pair
        let short_stem = oracle.hairpin(b"GCGCAAGCGC").unwrap().unwrap();
        let long_stem = oracle.hairpin(b"GCGCAAAAGCGC").unwrap().unwrap();
        assert!(long_stem > short_stem);
    }

    #[test]
    fn test_loop_entropy_beyond_table() {
        assert_eq!(loop_entropy(3), -11.28);
        assert_eq!(loop_entropy(30), -20.31);
        assert!(loop_entropy(60) < -20.31);
    }
}
