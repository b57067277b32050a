use crate::iupac_code::{AMBIGUITY_LETTERS, IupacCode};

/// Score for byte pairs that have no defined substitution value.
pub const ILLEGAL_SCORE: i32 = i32::MIN;

const PRIMER_BASES: &[u8] = b"ACGTN";
const CONCRETE_BASES: &[u8] = b"ACGT";

/// 256x256 substitution scores indexed by raw byte values.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoringMatrix {
    scores: Vec<[i32; 256]>,
}

impl ScoringMatrix {
    fn filled(value: i32) -> Self {
        Self {
            scores: vec![[value; 256]; 256],
        }
    }

    /// Upper-case ACGTN only: match 100, mismatch -100, anything against N -25.
    pub fn primer_default() -> Self {
        let mut ret = Self::filled(ILLEGAL_SCORE);
        for &a in PRIMER_BASES {
            for &b in PRIMER_BASES {
                let s = if a == b'N' || b == b'N' {
                    -25
                } else if a == b {
                    100
                } else {
                    -100
                };
                ret.set(a, b, s);
            }
        }
        ret
    }

    /// Matrix used by the general purpose nucleotide aligner; same values as
    /// [`ScoringMatrix::primer_default`].
    pub fn nucleotide_default() -> Self {
        Self::primer_default()
    }

    /// Hybridisation-weighted matrix: G/C matches 300, A/T matches 200, everything else -50.
    pub fn h_nt() -> Self {
        let mut ret = Self::filled(ILLEGAL_SCORE);
        for &a in PRIMER_BASES {
            for &b in PRIMER_BASES {
                let s = match (a, b) {
                    (b'N', _) | (_, b'N') => -50,
                    (b'C', b'C') | (b'G', b'G') => 300,
                    _ if a == b => 200,
                    _ => -50,
                };
                ret.set(a, b, s);
            }
        }
        ret
    }

    /// Extends a nucleotide matrix to IUPAC ambiguity codes. A code scores the best
    /// value over all concrete bases it stands for, against bases and other codes alike.
    pub fn with_ambiguity_codes(mut self) -> Self {
        for &c1 in AMBIGUITY_LETTERS {
            let bases1 = IupacCode::from_letter(c1).to_vec();
            for &c2 in AMBIGUITY_LETTERS {
                let bases2 = IupacCode::from_letter(c2).to_vec();
                let extreme = bases1
                    .iter()
                    .flat_map(|&b1| bases2.iter().map(move |&b2| (b1, b2)))
                    .map(|(b1, b2)| self.score(b1, b2))
                    .max()
                    .unwrap_or(ILLEGAL_SCORE);
                self.set(c1, c2, extreme);
            }
            for &b2 in CONCRETE_BASES {
                let extreme = bases1
                    .iter()
                    .map(|&b1| self.score(b1, b2))
                    .max()
                    .unwrap_or(ILLEGAL_SCORE);
                self.set(c1, b2, extreme);
                self.set(b2, c1, extreme);
            }
        }
        self
    }

    #[inline(always)]
    pub fn score(&self, a: u8, b: u8) -> i32 {
        self.scores[a as usize][b as usize]
    }

    #[inline(always)]
    pub fn set(&mut self, a: u8, b: u8, score: i32) {
        self.scores[a as usize][b as usize] = score;
    }

    /// A byte is legal if it scores against itself.
    #[inline(always)]
    pub fn is_legal(&self, c: u8) -> bool {
        self.score(c, c) != ILLEGAL_SCORE
    }

    /// First byte of `seq` that has no defined score against itself.
    pub fn first_illegal(&self, seq: &[u8]) -> Option<u8> {
        seq.iter().copied().find(|&c| !self.is_legal(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primer_default() {
        let m = ScoringMatrix::primer_default();
        assert_eq!(m.score(b'A', b'A'), 100);
        assert_eq!(m.score(b'A', b'C'), -100);
        assert_eq!(m.score(b'N', b'N'), -25);
        assert_eq!(m.score(b'G', b'N'), -25);
        assert_eq!(m.score(b'a', b'a'), ILLEGAL_SCORE);
        assert_eq!(m.score(b'R', b'A'), ILLEGAL_SCORE);
        assert!(m.is_legal(b'T'));
        assert_eq!(m.first_illegal(b"ACGRT"), Some(b'R'));
    }

    #[test]
    fn test_h_nt() {
        let m = ScoringMatrix::h_nt();
        assert_eq!(m.score(b'G', b'G'), 300);
        assert_eq!(m.score(b'A', b'A'), 200);
        assert_eq!(m.score(b'A', b'G'), -50);
        assert_eq!(m.score(b'N', b'A'), -50);
    }

    #[test]
    fn test_ambiguity_codes() {
        let m = ScoringMatrix::primer_default().with_ambiguity_codes();
        assert_eq!(m.score(b'R', b'A'), 100);
        assert_eq!(m.score(b'A', b'R'), 100);
        assert_eq!(m.score(b'R', b'C'), -100);
        assert_eq!(m.score(b'R', b'Y'), -100);
        assert_eq!(m.score(b'B', b'S'), 100);
        // N is an ambiguity code as well, so it now matches everything
        assert_eq!(m.score(b'N', b'T'), 100);
        assert_eq!(m.score(b'N', b'N'), 100);
        // plain bases are untouched
        assert_eq!(m.score(b'A', b'C'), -100);
        assert!(m.is_legal(b'W'));
    }
}
