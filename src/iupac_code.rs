const DNA_BITMASK_A: u8 = 1;
const DNA_BITMASK_C: u8 = 2;
const DNA_BITMASK_G: u8 = 4;
const DNA_BITMASK_T: u8 = 8;
const DNA_BITMASK_N: u8 = DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_G | DNA_BITMASK_T;

/// Ambiguity letters accepted by the scoring matrices, N last.
pub const AMBIGUITY_LETTERS: &[u8] = b"BDHVRYKMSWN";

/// A bitmasked IUPAC code for DNA bases, eg DNA_BITMASK_A|DNA_BITMASK_C
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct IupacCode(u8);

impl IupacCode {
    #[inline(always)]
    pub fn from_letter(letter: u8) -> Self {
        match letter.to_ascii_uppercase() {
            b'A' => Self(DNA_BITMASK_A),
            b'C' => Self(DNA_BITMASK_C),
            b'G' => Self(DNA_BITMASK_G),
            b'T' => Self(DNA_BITMASK_T),
            b'U' => Self(DNA_BITMASK_T),
            b'W' => Self(DNA_BITMASK_A | DNA_BITMASK_T),
            b'S' => Self(DNA_BITMASK_C | DNA_BITMASK_G),
            b'M' => Self(DNA_BITMASK_A | DNA_BITMASK_C),
            b'K' => Self(DNA_BITMASK_G | DNA_BITMASK_T),
            b'R' => Self(DNA_BITMASK_A | DNA_BITMASK_G),
            b'Y' => Self(DNA_BITMASK_C | DNA_BITMASK_T),
            b'B' => Self(DNA_BITMASK_C | DNA_BITMASK_G | DNA_BITMASK_T),
            b'D' => Self(DNA_BITMASK_A | DNA_BITMASK_G | DNA_BITMASK_T),
            b'H' => Self(DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_T),
            b'V' => Self(DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_G),
            b'N' => Self(DNA_BITMASK_N),
            _ => Self(0),
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True for A, C, G or T.
    #[inline(always)]
    pub fn is_concrete(&self) -> bool {
        self.0.count_ones() == 1
    }

    #[inline(always)]
    pub fn contains(self, other: Self) -> bool {
        !other.is_empty() && self.0 & other.0 == other.0
    }

    #[inline(always)]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut ret = Vec::with_capacity(4);
        if self.0 & DNA_BITMASK_A != 0 {
            ret.push(b'A');
        }
        if self.0 & DNA_BITMASK_C != 0 {
            ret.push(b'C');
        }
        if self.0 & DNA_BITMASK_G != 0 {
            ret.push(b'G');
        }
        if self.0 & DNA_BITMASK_T != 0 {
            ret.push(b'T');
        }
        ret
    }

    /// Complement of a base or ambiguity letter, keeping its case.
    /// Bytes that are not nucleotide letters are returned unchanged.
    #[inline(always)]
    pub fn letter_complement(letter: u8) -> u8 {
        let upper = match letter.to_ascii_uppercase() {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            b'T' => b'A',
            b'U' => b'A',
            b'B' => b'V',
            b'D' => b'H',
            b'H' => b'D',
            b'V' => b'B',
            b'R' => b'Y',
            b'Y' => b'R',
            b'K' => b'M',
            b'M' => b'K',
            b'S' => b'S',
            b'W' => b'W',
            b'N' => b'N',
            _ => return letter,
        };
        if letter.is_ascii_lowercase() {
            upper.to_ascii_lowercase()
        } else {
            upper
        }
    }

    /// Case-insensitive comparison used for must-match patterns: equal letters,
    /// an N on either side, or an ambiguity code that includes the other base.
    pub fn compatible(a: u8, b: u8) -> bool {
        let a = a.to_ascii_uppercase();
        let b = b.to_ascii_uppercase();
        if a == b || a == b'N' || b == b'N' {
            return true;
        }
        let (ca, cb) = (Self::from_letter(a), Self::from_letter(b));
        if ca.is_empty() || cb.is_empty() {
            return false;
        }
        (ca.is_concrete() && cb.contains(ca)) || (cb.is_concrete() && ca.contains(cb))
    }

    /// Letters allowed in a must-match pattern.
    #[inline(always)]
    pub fn is_pattern_letter(letter: u8) -> bool {
        matches!(
            letter.to_ascii_uppercase(),
            b'N' | b'A'
                | b'C'
                | b'T'
                | b'G'
                | b'R'
                | b'Y'
                | b'W'
                | b'S'
                | b'M'
                | b'K'
                | b'B'
                | b'H'
                | b'D'
                | b'V'
        )
    }
}
