use crate::iupac_code::IupacCode;

pub type DnaString = Vec<u8>;

/// Reverse complement over the IUPAC alphabet, preserving case.
pub fn reverse_complement(seq: &[u8]) -> DnaString {
    seq.iter()
        .rev()
        .map(|&b| IupacCode::letter_complement(b))
        .collect()
}

/// Upper-cases a nucleotide string. With `ambiguity_ok` the IUPAC codes are kept,
/// otherwise only ACGTN are. Any other byte becomes `N`; the first such byte is
/// returned alongside the result.
pub fn dna_to_upper(seq: &[u8], ambiguity_ok: bool) -> (DnaString, Option<u8>) {
    let mut unrecognized = None;
    let ret = seq
        .iter()
        .map(|&b| {
            let upper = b.to_ascii_uppercase();
            match upper {
                b'A' | b'C' | b'G' | b'T' | b'N' => upper,
                b'R' | b'Y' | b'M' | b'W' | b'S' | b'K' | b'D' | b'H' | b'V' | b'B'
                    if ambiguity_ok =>
                {
                    upper
                }
                // kept, upcased
                _ if ambiguity_ok => upper,
                _ => {
                    unrecognized.get_or_insert(b);
                    b'N'
                }
            }
        })
        .collect();
    (ret, unrecognized)
}

/// Position of the first in-frame stop codon (TAA, TAG, TGA) scanning from `start`
/// towards the 3' end (`forward`) or the 5' end. A negative start is moved into the
/// sequence in frame when scanning forward and yields `None` when scanning backward.
pub fn find_stop_codon(seq: &[u8], start: i64, forward: bool) -> Option<usize> {
    let step: i64 = if forward { 3 } else { -3 };
    let mut p = start;
    if p < 0 {
        if !forward {
            return None;
        }
        while p < 0 {
            p += 3;
        }
    }
    let len = seq.len() as i64;
    while p >= 0 && p + 2 < len {
        let i = p as usize;
        if is_stop_codon(&seq[i..i + 3]) {
            return Some(i);
        }
        p += step;
    }
    None
}

#[inline(always)]
fn is_stop_codon(codon: &[u8]) -> bool {
    matches!(
        [
            codon[0].to_ascii_uppercase(),
            codon[1].to_ascii_uppercase(),
            codon[2].to_ascii_uppercase()
        ],
        [b'T', b'A', b'A'] | [b'T', b'A', b'G'] | [b'T', b'G', b'A']
    )
}

/// Counts of G/C bases and of `N` in an upper-case sequence.
#[inline(always)]
pub fn gc_and_n_counts(seq: &[u8]) -> (usize, usize) {
    seq.iter().fold((0, 0), |(gc, n), &b| match b {
        b'G' | b'C' => (gc + 1, n),
        b'N' => (gc, n + 1),
        _ => (gc, n),
    })
}

/// Percent GC ignoring `N` bases; 0 if there are no called bases.
pub fn gc_percent(seq: &[u8]) -> f64 {
    let (gc, n) = gc_and_n_counts(seq);
    let called = seq.len() - n;
    if called == 0 {
        0.0
    } else {
        100.0 * gc as f64 / called as f64
    }
}

pub fn eq_ignore_case(a: &[u8], b: &[u8]) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Start positions of every case-insensitive occurrence of `needle`.
pub fn find_all_ignore_case(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return vec![];
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, w)| w.eq_ignore_ascii_case(needle))
        .map(|(i, _)| i)
        .collect()
}

pub fn get_range_safe(seq: &[u8], start: usize, len: usize) -> Option<&[u8]> {
    seq.get(start..start.checked_add(len)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement(b"ACGTN"), b"NACGT".to_vec());
        assert_eq!(reverse_complement(b"aacRg"), b"cYgtt".to_vec());
        assert_eq!(reverse_complement(b""), Vec::<u8>::new());
    }

    #[test]
    fn test_dna_to_upper() {
        assert_eq!(dna_to_upper(b"acgtn", false), (b"ACGTN".to_vec(), None));
        assert_eq!(dna_to_upper(b"acRyt", false), (b"ACNNT".to_vec(), Some(b'R')));
        assert_eq!(dna_to_upper(b"acRyt", true), (b"ACRYT".to_vec(), None));
        assert_eq!(dna_to_upper(b"AXG", false), (b"ANG".to_vec(), Some(b'X')));
        assert_eq!(dna_to_upper(b"axg", true), (b"AXG".to_vec(), None));
    }

    #[test]
    fn test_find_stop_codon() {
        //                  0  3  6  9  12
        let seq = b"ATGAAACCCTAGGGG";
        assert_eq!(find_stop_codon(seq, 0, true), Some(9));
        assert_eq!(find_stop_codon(seq, 1, true), Some(1));
        assert_eq!(find_stop_codon(seq, 2, true), None);
        assert_eq!(find_stop_codon(seq, 9, false), Some(9));
        assert_eq!(find_stop_codon(seq, 6, false), None);
        assert_eq!(find_stop_codon(seq, -3, true), Some(9));
        assert_eq!(find_stop_codon(seq, -1, false), None);
        let upstream = b"tgaCCCATGCCC";
        assert_eq!(find_stop_codon(upstream, 6, false), Some(0));
    }

    #[test]
    fn test_gc() {
        assert_eq!(gc_and_n_counts(b"GCATNN"), (2, 2));
        assert!((gc_percent(b"GCATNN") - 50.0).abs() < 1e-9);
        assert_eq!(gc_percent(b"NNN"), 0.0);
    }

    #[test]
    fn test_find_all_ignore_case() {
        assert_eq!(find_all_ignore_case(b"acgtACGTac", b"ACG"), vec![0, 4]);
        assert!(find_all_ignore_case(b"ACG", b"ACGT").is_empty());
        assert!(eq_ignore_case(b"acgT", b"ACGt"));
    }

    #[test]
    fn test_get_range_safe() {
        assert_eq!(get_range_safe(b"ACGT", 1, 2), Some(&b"CG"[..]));
        assert_eq!(get_range_safe(b"ACGT", 3, 2), None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_reverse_complement_is_involution(s in "[ACGTNRYKMBVDHSWacgt]{0,60}") {
            let bytes = s.as_bytes();
            prop_assert_eq!(reverse_complement(&reverse_complement(bytes)), bytes.to_vec());
        }
    }
}
