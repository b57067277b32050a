//! Nearest-neighbor melting temperature and stability of short oligos, and the
//! GC-based approximation used for longer sequences.

use crate::error::{PrimerError, Result};
use serde::{Deserialize, Serialize};

/// Gas constant in cal/(K mol).
const R: f64 = 1.987;
const R_OWCZARZY: f64 = 1.9872;
const KELVIN: f64 = 273.15;

/// Oligos longer than this use [`long_seq_tm`] by default.
pub const DEFAULT_NN_MAX_LEN: usize = 36;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TmMethod {
    /// Breslauer et al. 1986 table.
    Breslauer,
    /// SantaLucia 1998 unified table.
    SantaLucia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaltCorrection {
    Schildkraut,
    SantaLucia,
    Owczarzy,
}

/// Reaction conditions shared by the Tm formulas. Concentrations are mM except
/// `dna_conc` (nM) and `dmso_conc` (percent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conditions {
    pub dna_conc: f64,
    pub salt_conc: f64,
    pub divalent_conc: f64,
    pub dntp_conc: f64,
    pub dmso_conc: f64,
    pub dmso_fact: f64,
    pub formamide_conc: f64,
}

impl Default for Conditions {
    fn default() -> Self {
        Self {
            dna_conc: 50.0,
            salt_conc: 50.0,
            divalent_conc: 0.0,
            dntp_conc: 0.0,
            dmso_conc: 0.0,
            dmso_fact: 0.6,
            formamide_conc: 0.0,
        }
    }
}

impl Conditions {
    /// Monovalent salt with the divalent cations converted to their equivalent.
    pub fn effective_monovalent(&self) -> Result<f64> {
        Ok(self.salt_conc + divalent_to_monovalent(self.divalent_conc, self.dntp_conc)?)
    }

    fn additive_correction(&self, gc_fraction: f64) -> f64 {
        -self.dmso_conc * self.dmso_fact + (0.453 * gc_fraction - 2.88) * self.formamide_conc
    }
}

// Rows are the 5' base, columns the 3' base, both in the order A C G T N.
// Entropies in -0.1 cal/(K mol), enthalpies in -100 cal/mol, free energies of
// disruption in cal/mol.

const BRESLAUER_S: [[i32; 5]; 5] = [
    [240, 173, 208, 239, 215],
    [129, 266, 278, 208, 220],
    [135, 267, 266, 173, 210],
    [169, 135, 129, 240, 168],
    [168, 210, 220, 215, 203],
];

const BRESLAUER_H: [[i32; 5]; 5] = [
    [91, 65, 78, 86, 80],
    [58, 110, 119, 78, 91],
    [56, 111, 110, 65, 85],
    [60, 56, 58, 91, 66],
    [66, 85, 91, 80, 80],
];

const BRESLAUER_G: [[i32; 5]; 5] = [
    [1900, 1300, 1600, 1500, 1575],
    [1900, 3100, 3600, 1600, 2550],
    [1600, 3100, 3100, 1300, 2275],
    [900, 1600, 1900, 1900, 1575],
    [1575, 2275, 2550, 1575, 1994],
];

const SANTALUCIA_S: [[i32; 5]; 5] = [
    [222, 224, 210, 204, 224],
    [227, 199, 272, 210, 272],
    [222, 244, 199, 224, 244],
    [213, 222, 227, 222, 227],
    [168, 210, 220, 215, 220],
];

const SANTALUCIA_H: [[i32; 5]; 5] = [
    [79, 84, 78, 72, 72],
    [85, 80, 106, 78, 78],
    [82, 98, 80, 84, 80],
    [72, 82, 85, 79, 72],
    [72, 80, 78, 72, 72],
];

const SANTALUCIA_G: [[i32; 5]; 5] = [
    [1000, 1440, 1280, 880, 880],
    [1450, 1840, 2170, 1280, 1450],
    [1300, 2240, 1840, 1440, 1300],
    [580, 1300, 1450, 1000, 580],
    [580, 1300, 1280, 880, 580],
];

#[inline(always)]
fn base_index(b: u8) -> Option<usize> {
    match b {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        b'N' | b'n' => Some(4),
        _ => None,
    }
}

fn indices(seq: &[u8]) -> Result<Vec<usize>> {
    if seq.len() < 2 {
        return Err(PrimerError::Thermodynamics(format!(
            "sequence of length {} is too short for a nearest-neighbor calculation",
            seq.len()
        )));
    }
    seq.iter()
        .map(|&b| {
            base_index(b).ok_or_else(|| {
                PrimerError::Thermodynamics(format!("Unrecognized base in input: {}", b as char))
            })
        })
        .collect()
}

fn gc_fraction(seq: &[u8]) -> f64 {
    let gc = seq
        .iter()
        .filter(|b| matches!(b, b'G' | b'g' | b'C' | b'c'))
        .count();
    gc as f64 / seq.len() as f64
}

#[inline(always)]
fn is_at(b: u8) -> bool {
    matches!(b, b'A' | b'a' | b'T' | b't')
}

#[inline(always)]
fn is_gc(b: u8) -> bool {
    matches!(b, b'G' | b'g' | b'C' | b'c')
}

/// True if the sequence equals its own reverse complement. Only defined for
/// even lengths; N and other letters never break the match on their own.
pub fn symmetry(seq: &[u8]) -> bool {
    if seq.len() % 2 == 1 {
        return false;
    }
    let half = seq.len() / 2;
    seq[..half]
        .iter()
        .zip(seq.iter().rev())
        .all(|(&s, &e)| {
            let (s, e) = (s.to_ascii_uppercase(), e.to_ascii_uppercase());
            let pairs = |a: u8, b: u8| match a {
                b'A' => b == b'T',
                b'T' => b == b'A',
                b'C' => b == b'G',
                b'G' => b == b'C',
                _ => true,
            };
            pairs(s, e) && pairs(e, s)
        })
}

/// Monovalent-equivalent concentration of divalent cations; the free Mg2+
/// left after dNTP chelation counts as `120 * sqrt(free)`.
pub fn divalent_to_monovalent(divalent: f64, dntp: f64) -> Result<f64> {
    if divalent < 0.0 || dntp < 0.0 {
        return Err(PrimerError::Thermodynamics(
            "negative divalent cation or dNTP concentration".to_string(),
        ));
    }
    let dntp = if divalent == 0.0 { 0.0 } else { dntp };
    Ok(120.0 * (divalent - dntp).max(0.0).sqrt())
}

/// Summed enthalpy (cal/mol) and entropy (cal/(K mol)) of a duplex, including
/// the initiation terms of the chosen table.
pub fn duplex_terms(seq: &[u8], method: TmMethod) -> Result<(f64, f64)> {
    let idx = indices(seq)?;
    let (mut dh, mut ds) = (0i32, 0i32);
    let (s_table, h_table) = match method {
        TmMethod::Breslauer => {
            ds = 108;
            (&BRESLAUER_S, &BRESLAUER_H)
        }
        TmMethod::SantaLucia => {
            if symmetry(seq) {
                ds += 14;
            }
            for end in [seq[0], seq[seq.len() - 1]] {
                if is_at(end) {
                    ds += -41;
                    dh += -23;
                } else if is_gc(end) {
                    ds += 28;
                    dh += -1;
                }
            }
            (&SANTALUCIA_S, &SANTALUCIA_H)
        }
    };
    for w in idx.windows(2) {
        ds += s_table[w[0]][w[1]];
        dh += h_table[w[0]][w[1]];
    }
    Ok((dh as f64 * -100.0, ds as f64 * -0.1))
}

/// Nearest-neighbor melting temperature of a short oligo against its perfect
/// complement.
pub fn oligo_tm(
    seq: &[u8],
    cond: &Conditions,
    method: TmMethod,
    salt_correction: SaltCorrection,
) -> Result<f64> {
    let (delta_h, mut delta_s) = duplex_terms(seq, method)?;
    let salt = cond.effective_monovalent()?;
    let len = seq.len() as f64;
    let sym = symmetry(seq);
    let strand_factor = if sym { 1e9 } else { 4e9 };
    let tm = match salt_correction {
        SaltCorrection::Schildkraut => {
            delta_h / (delta_s + R * (cond.dna_conc / 4e9).ln()) - KELVIN
                + 16.6 * (salt / 1000.0).log10()
        }
        SaltCorrection::SantaLucia => {
            delta_s += 0.368 * (len - 1.0) * (salt / 1000.0).ln();
            delta_h / (delta_s + R * (cond.dna_conc / strand_factor).ln()) - KELVIN
        }
        SaltCorrection::Owczarzy => {
            let gc = gc_fraction(seq);
            let ln_salt = (salt / 1000.0).ln();
            let correction = (4.29 * gc - 3.95) * 1e-5 * ln_salt + 9.40e-6 * ln_salt * ln_salt;
            let uncorrected = delta_h / (delta_s + R_OWCZARZY * (cond.dna_conc / strand_factor).ln());
            1.0 / (1.0 / uncorrected + correction) - KELVIN
        }
    };
    if !tm.is_finite() {
        return Err(PrimerError::Thermodynamics(format!(
            "melting temperature is not finite for {}",
            String::from_utf8_lossy(seq)
        )));
    }
    Ok(tm + cond.additive_correction(gc_fraction(seq)))
}

/// Stability of a duplex in kcal/mol as the sum of the nearest-neighbor free
/// energies of disruption.
pub fn oligo_dg(seq: &[u8], method: TmMethod) -> Result<f64> {
    let idx = indices(seq)?;
    let table = match method {
        TmMethod::Breslauer => &BRESLAUER_G,
        TmMethod::SantaLucia => &SANTALUCIA_G,
    };
    let mut dg: i32 = idx.windows(2).map(|w| table[w[0]][w[1]]).sum();
    if method == TmMethod::SantaLucia {
        dg += -1960;
        if is_at(seq[0]) {
            dg += -50;
        }
        if is_at(seq[seq.len() - 1]) {
            dg += -50;
        }
        if symmetry(seq) {
            dg += -430;
        }
    }
    Ok(dg as f64 / 1000.0)
}

/// [`oligo_dg`] of the last `len` bases.
pub fn end_oligo_dg(seq: &[u8], len: usize, method: TmMethod) -> Result<f64> {
    let from = seq.len().saturating_sub(len);
    oligo_dg(&seq[from..], method)
}

/// GC-based melting temperature for long sequences, over `seq[start..start+len]`.
pub fn long_seq_tm(seq: &[u8], start: usize, len: usize, cond: &Conditions) -> Result<f64> {
    let window = start
        .checked_add(len)
        .and_then(|end| seq.get(start..end))
        .filter(|w| !w.is_empty())
        .ok_or_else(|| {
            PrimerError::Thermodynamics(format!(
                "invalid window {start}+{len} on a sequence of length {}",
                seq.len()
            ))
        })?;
    let salt = cond.effective_monovalent()?;
    let gc = gc_fraction(window);
    let len = len as f64;
    Ok(81.5 + cond.additive_correction(gc) + 16.6 * (salt / 1000.0).log10() + 41.0 * gc
        - 600.0 / len)
}

/// Nearest-neighbor Tm up to `nn_max_len` bases, the long approximation beyond.
pub fn seq_tm(
    seq: &[u8],
    cond: &Conditions,
    nn_max_len: usize,
    method: TmMethod,
    salt_correction: SaltCorrection,
) -> Result<f64> {
    if seq.len() > nn_max_len {
        long_seq_tm(seq, 0, seq.len(), cond)
    } else {
        oligo_tm(seq, cond, method, salt_correction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_symmetry() {
        assert!(symmetry(b"GAATTC"));
        assert!(!symmetry(b"GAATTG"));
        assert!(!symmetry(b"GAATC"));
        assert!(symmetry(b"gcgcatatgcgc"));
    }

    #[test]
    fn test_oligo_tm_breslauer_schildkraut() {
        let cond = Conditions::default();
        let tm = oligo_tm(
            b"GCGCATATGCGC",
            &cond,
            TmMethod::Breslauer,
            SaltCorrection::Schildkraut,
        )
        .unwrap();
        assert!(close(tm, 48.74824337803108), "{tm}");
        let tm = oligo_tm(
            b"ACGTACGTACGTACGTAC",
            &cond,
            TmMethod::Breslauer,
            SaltCorrection::Schildkraut,
        )
        .unwrap();
        assert!(close(tm, 46.31227764393566), "{tm}");
    }

    #[test]
    fn test_oligo_tm_santalucia() {
        let cond = Conditions::default();
        let tm = oligo_tm(
            b"ACGTACGTACGTACGTAC",
            &cond,
            TmMethod::SantaLucia,
            SaltCorrection::SantaLucia,
        )
        .unwrap();
        assert!(close(tm, 48.31051175311842), "{tm}");
        let tm = oligo_tm(
            b"GCGCATATGCGC",
            &cond,
            TmMethod::SantaLucia,
            SaltCorrection::Owczarzy,
        )
        .unwrap();
        assert!(close(tm, 44.05736132287501), "{tm}");
    }

    #[test]
    fn test_divalent() {
        assert!(close(divalent_to_monovalent(1.5, 0.6).unwrap(), 113.84199576606166));
        assert_eq!(divalent_to_monovalent(0.0, 0.8).unwrap(), 0.0);
        assert_eq!(divalent_to_monovalent(0.5, 0.8).unwrap(), 0.0);
        assert!(divalent_to_monovalent(-1.0, 0.0).is_err());
        let cond = Conditions {
            divalent_conc: 1.5,
            dntp_conc: 0.6,
            ..Default::default()
        };
        let tm = oligo_tm(
            b"ACGTACGTACGTACGTAC",
            &cond,
            TmMethod::Breslauer,
            SaltCorrection::Schildkraut,
        )
        .unwrap();
        assert!(close(tm, 54.868834381439136), "{tm}");
    }

    #[test]
    fn test_dmso_and_formamide() {
        let base = Conditions::default();
        let dmso = Conditions {
            dmso_conc: 5.0,
            ..base
        };
        let plain = oligo_tm(b"ACGTACGTAC", &base, TmMethod::SantaLucia, SaltCorrection::SantaLucia).unwrap();
        let with_dmso = oligo_tm(b"ACGTACGTAC", &dmso, TmMethod::SantaLucia, SaltCorrection::SantaLucia).unwrap();
        assert!(close(plain - with_dmso, 3.0));
        let formamide = Conditions {
            formamide_conc: 1.0,
            ..base
        };
        let with_formamide = oligo_tm(b"ACGTACGTAC", &formamide, TmMethod::SantaLucia, SaltCorrection::SantaLucia).unwrap();
        assert!(close(with_formamide - plain, 0.453 * 0.5 - 2.88));
    }

    #[test]
    fn test_oligo_dg() {
        assert!(close(oligo_dg(b"GCGCATATGCGC", TmMethod::Breslauer).unwrap(), 27.3));
        assert!(close(oligo_dg(b"GCGCATATGCGC", TmMethod::SantaLucia).unwrap(), 16.15));
        assert!(close(end_oligo_dg(b"GCGCATATGCGC", 5, TmMethod::Breslauer).unwrap(), 11.7));
        assert!(close(end_oligo_dg(b"ACGTACGTACGTACGTAC", 5, TmMethod::Breslauer).unwrap(), 7.1));
        // Shorter than the window: the whole oligo is used.
        assert!(close(end_oligo_dg(b"GC", 5, TmMethod::Breslauer).unwrap(), 3.1));
    }

    #[test]
    fn test_long_seq_tm() {
        let seq = b"ACGT".repeat(20);
        let tm = long_seq_tm(&seq, 0, seq.len(), &Conditions::default()).unwrap();
        assert!(close(tm, 72.9029020719779), "{tm}");
        assert!(long_seq_tm(&seq, 70, 20, &Conditions::default()).is_err());
        assert!(long_seq_tm(&seq, 0, 0, &Conditions::default()).is_err());
        // seq_tm switches to the long formula past nn_max_len
        let tm2 = seq_tm(&seq, &Conditions::default(), 36, TmMethod::Breslauer, SaltCorrection::Schildkraut).unwrap();
        assert!(close(tm, tm2));
    }

    #[test]
    fn test_errors() {
        let cond = Conditions::default();
        assert!(oligo_tm(b"A", &cond, TmMethod::Breslauer, SaltCorrection::Schildkraut).is_err());
        assert!(oligo_tm(b"ACGXT", &cond, TmMethod::Breslauer, SaltCorrection::Schildkraut).is_err());
        assert!(oligo_dg(b"AC-G", TmMethod::SantaLucia).is_err());
        let bad = Conditions {
            dntp_conc: -0.1,
            divalent_conc: 1.0,
            ..cond
        };
        assert!(oligo_tm(b"ACGTACGT", &bad, TmMethod::Breslauer, SaltCorrection::Schildkraut).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn corrections() -> impl Strategy<Value = SaltCorrection> {
        prop_oneof![Just(SaltCorrection::Schildkraut), Just(SaltCorrection::SantaLucia)]
    }

    proptest! {
        #[test]
        fn prop_tm_monotonic_in_salt(
            seq in "[ACGT]{15,30}",
            low in 5.0f64..200.0,
            extra in 0.0f64..200.0,
            corr in corrections(),
        ) {
            let a = Conditions { salt_conc: low, ..Default::default() };
            let b = Conditions { salt_conc: low + extra, ..Default::default() };
            let ta = oligo_tm(seq.as_bytes(), &a, TmMethod::SantaLucia, corr).unwrap();
            let tb = oligo_tm(seq.as_bytes(), &b, TmMethod::SantaLucia, corr).unwrap();
            prop_assert!(tb >= ta - 1e-9);
        }

        #[test]
        fn prop_long_tm_monotonic_in_gc(len in 40usize..200, gc in 0usize..40) {
            let gc = gc.min(len - 1);
            let lower: Vec<u8> = (0..len).map(|i| if i < gc { b'G' } else { b'A' }).collect();
            let higher: Vec<u8> = (0..len).map(|i| if i <= gc { b'G' } else { b'A' }).collect();
            let cond = Conditions::default();
            let tl = long_seq_tm(&lower, 0, len, &cond).unwrap();
            let th = long_seq_tm(&higher, 0, len, &cond).unwrap();
            prop_assert!(th > tl);
        }
    }
}
