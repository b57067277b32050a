//! Sanity checks on the settings and on an adjusted template, run before any
//! candidate is generated. Problems with the settings are global errors,
//! problems with one sequence are sequence errors. Most checks stop at the
//! first error; a few only add a message and let the others run.

use crate::dna_sequence::{find_all_ignore_case, reverse_complement};
use crate::error::Diagnostics;
use crate::iupac_code::IupacCode;
use crate::repeat_library::Libraries;
use crate::settings::{MAX_PRIMER_LENGTH, OligoArgs, Settings, Task};
use crate::template::Template;

/// Smallest accepted first base index.
const MIN_FIRST_BASE_INDEX: i64 = -1_000_000;

/// Largest alignment score the DP aligners can report.
const MAX_DP_SCORE: f64 = i16::MAX as f64;

/// Length of a must-match pattern.
const PATTERN_LEN: usize = 5;

/// Runs every check. Returns true if the design may go ahead.
pub fn validate(
    settings: &Settings,
    t: &Template,
    libraries: &Libraries,
    diag: &mut Diagnostics,
) -> bool {
    let ok = check_settings(settings, libraries, diag) && check_template(settings, t, diag);
    if !ok || diag.has_errors() {
        log::debug!("{}: input rejected", t.sequence_id);
        return false;
    }
    true
}

fn check_settings(settings: &Settings, libraries: &Libraries, diag: &mut Diagnostics) -> bool {
    let p = &settings.primer;
    let o = &settings.internal;
    let dp_template = !settings.thermodynamic_template_alignment;
    let dp_oligo = !settings.thermodynamic_oligo_alignment;

    if settings.min_left_three_prime_distance < -1 || settings.min_right_three_prime_distance < -1 {
        diag.sequence_error("Minimum 3' distance must be >= -1 (min_*_three_prime_distance)");
    }
    if settings.first_base_index < MIN_FIRST_BASE_INDEX {
        diag.global_error("Value too small at tag PRIMER_FIRST_BASE_INDEX");
        return false;
    }

    let too_large = [
        (
            dp_template && p.max_template_mispriming.is_some_and(|v| v > MAX_DP_SCORE),
            "PRIMER_MAX_TEMPLATE_MISPRIMING",
        ),
        (
            dp_template
                && settings
                    .pair_max_template_mispriming
                    .is_some_and(|v| v > MAX_DP_SCORE),
            "PRIMER_PAIR_MAX_TEMPLATE_MISPRIMING",
        ),
        (
            dp_oligo && p.max_repeat_compl > MAX_DP_SCORE,
            "PRIMER_MAX_LIBRARY_MISPRIMING",
        ),
        (
            dp_oligo && o.max_repeat_compl > MAX_DP_SCORE,
            "PRIMER_INTERNAL_MAX_LIBRARY_MISHYB",
        ),
        (
            dp_oligo && settings.pair_repeat_compl > MAX_DP_SCORE,
            "PRIMER_PAIR_MAX_LIBRARY_MISPRIMING",
        ),
    ];
    if let Some((_, tag)) = too_large.iter().find(|(bad, _)| *bad) {
        diag.global_error(format!("Value too large at tag {tag}"));
        return false;
    }

    if dp_template && o.max_template_mispriming.is_some() {
        diag.global_error("PRIMER_INTERNAL_MAX_TEMPLATE_MISHYB is not supported");
    }
    if !dp_template && o.max_template_mispriming_th.is_some() {
        diag.global_error("PRIMER_INTERNAL_MAX_TEMPLATE_MISHYB_TH is not supported");
    }
    if p.min_size < 1 {
        diag.global_error("PRIMER_MIN_SIZE must be >= 1");
    }

    if p.max_size > MAX_PRIMER_LENGTH {
        diag.global_error(format!(
            "PRIMER_MAX_SIZE exceeds built-in maximum of {MAX_PRIMER_LENGTH}"
        ));
        return false;
    }
    if p.opt_size > p.max_size {
        diag.global_error("PRIMER_{OPT,DEFAULT}_SIZE > PRIMER_MAX_SIZE");
        return false;
    }
    if p.opt_size < p.min_size {
        diag.global_error("PRIMER_{OPT,DEFAULT}_SIZE < PRIMER_MIN_SIZE");
        return false;
    }
    if o.max_size > MAX_PRIMER_LENGTH {
        diag.global_error("PRIMER_INTERNAL_MAX_SIZE exceeds built-in maximum");
        return false;
    }
    if o.opt_size > o.max_size {
        diag.global_error("PRIMER_INTERNAL_{OPT,DEFAULT}_SIZE > MAX_SIZE");
        return false;
    }
    if o.opt_size < o.min_size {
        diag.global_error("PRIMER_INTERNAL_{OPT,DEFAULT}_SIZE < MIN_SIZE");
        return false;
    }
    if settings.gc_clamp > p.min_size {
        diag.global_error("PRIMER_GC_CLAMP > PRIMER_MIN_SIZE");
        return false;
    }
    if settings.max_end_gc > 5 {
        diag.global_error("PRIMER_MAX_END_GC must be between 0 to 5");
        return false;
    }

    if settings.product_size_ranges.is_empty() {
        diag.global_error("Empty value for PRIMER_PRODUCT_SIZE_RANGE");
        return false;
    }
    if settings.product_size_ranges.iter().any(|(min, max)| min > max) {
        diag.global_error("Illegal element in PRIMER_PRODUCT_SIZE_RANGE");
        return false;
    }
    let pr_min = settings.min_product_size();
    if p.max_size > pr_min {
        diag.global_error("PRIMER_MAX_SIZE > min PRIMER_PRODUCT_SIZE_RANGE");
        return false;
    }
    if settings.pick_internal_oligo && o.max_size > pr_min {
        diag.global_error("PRIMER_INTERNAL_MAX_SIZE > min PRIMER_PRODUCT_SIZE_RANGE");
        return false;
    }
    if settings.num_return < 1 {
        diag.global_error("PRIMER_NUM_RETURN < 1");
        return false;
    }

    for (args, prefix) in [(p, "PRIMER"), (o, "PRIMER_INTERNAL")] {
        for (pattern, end) in [
            (&args.must_match_five_prime, "FIVE_PRIME"),
            (&args.must_match_three_prime, "THREE_PRIME"),
        ] {
            if pattern.as_ref().is_some_and(|m| m.len() != PATTERN_LEN) {
                diag.global_error(format!(
                    "{prefix}_MUST_MATCH_{end} must have {PATTERN_LEN} characters"
                ));
                return false;
            }
        }
    }

    if settings.max_end_stability < 0.0 {
        diag.sequence_error("PRIMER_MAX_END_STABILITY must be non-negative");
        return false;
    }

    if p.opt_tm < p.min_tm || p.opt_tm > p.max_tm {
        diag.global_error("Optimum primer Tm lower than minimum or higher than maximum");
        return false;
    }
    if o.opt_tm < o.min_tm || o.opt_tm > o.max_tm {
        diag.global_error("Optimum internal oligo Tm lower than minimum or higher than maximum");
        return false;
    }
    if gc_bounds_illegal(p) {
        diag.global_error("Illegal value for PRIMER_MAX_GC and PRIMER_MIN_GC");
        return false;
    }
    if gc_bounds_illegal(o) {
        diag.global_error("Illegal value for PRIMER_INTERNAL_OLIGO_GC");
        return false;
    }

    let dp_range = |v: f64| !(0.0..=MAX_DP_SCORE).contains(&v);
    if dp_range(p.max_self_any)
        || dp_range(p.max_self_end)
        || dp_range(settings.pair_compl_any)
        || dp_range(settings.pair_compl_end)
    {
        diag.global_error("Illegal value for primer complementarity restrictions");
        return false;
    }
    if p.max_self_any_th < 0.0
        || p.max_self_end_th < 0.0
        || p.max_hairpin_th < 0.0
        || settings.pair_compl_any_th < 0.0
        || settings.pair_compl_end_th < 0.0
    {
        diag.global_error(
            "Illegal value for primer complementarity restrictions (thermod. approach)",
        );
        return false;
    }
    if dp_range(o.max_self_any)
        || dp_range(o.max_self_end)
        || o.max_self_any_th < 0.0
        || o.max_self_end_th < 0.0
        || o.max_hairpin_th < 0.0
    {
        diag.global_error("Illegal value for internal oligo complementarity restrictions");
        return false;
    }

    for (args, name) in [(p, "primer"), (o, "internal oligo")] {
        let c = &args.conditions;
        if c.salt_conc <= 0.0 || c.dna_conc <= 0.0 {
            diag.global_error(format!("Illegal value for {name} salt or dna concentration"));
            return false;
        }
        if (c.dntp_conc < 0.0 && c.divalent_conc != 0.0) || c.divalent_conc < 0.0 {
            diag.global_error(format!(
                "Illegal value for {name} divalent salt or dNTP concentration"
            ));
            return false;
        }
    }

    let w = &settings.pair_weights;
    if (w.product_tm_lt != 0.0 || w.product_tm_gt != 0.0) && settings.product_opt_tm.is_none() {
        diag.global_error(
            "Product temperature is part of objective function while optimum temperature is not defined",
        );
        return false;
    }
    if (w.product_size_lt != 0.0 || w.product_size_gt != 0.0) && settings.product_opt_size.is_none() {
        diag.global_error(
            "Product size is part of objective function while optimum size is not defined",
        );
        return false;
    }
    if gc_weight_without_optimum(p) {
        diag.global_error(
            "Primer GC content is part of objective function while optimum gc_content is not defined",
        );
        return false;
    }
    if gc_weight_without_optimum(o) {
        diag.global_error(
            "Hyb probe GC content is part of objective function while optimum gc_content is not defined",
        );
        return false;
    }
    if !settings.pick_internal_oligo && w.io_quality != 0.0 {
        diag.global_error(
            "Internal oligo quality is part of objective function while internal oligo choice is not required",
        );
        return false;
    }
    if (p.weights.repeat_sim != 0.0 || w.repeat_sim != 0.0) && libraries.mispriming.is_empty() {
        diag.global_error(
            "Mispriming score is part of objective function, but mispriming library is not defined",
        );
        return false;
    }
    if o.weights.repeat_sim != 0.0 && libraries.mishyb.is_empty() {
        diag.global_error(
            "Internal oligo mispriming score is part of objective function while mishyb library is not defined",
        );
        return false;
    }

    let seq = &settings.sequencing;
    for (value, tag) in [
        (seq.lead, "LEAD"),
        (seq.interval, "INTERVAL"),
        (seq.accuracy, "ACCURACY"),
        (seq.spacing, "SPACING"),
    ] {
        if value < 0 {
            diag.global_error(format!("Illegal value for PRIMER_SEQUENCING_{tag}"));
            return false;
        }
    }
    if seq.spacing < 1 {
        diag.global_error("Illegal value for PRIMER_SEQUENCING_SPACING");
        return false;
    }
    for (value, tag) in [
        (seq.interval, "INTERVAL"),
        (seq.accuracy, "ACCURACY"),
        (seq.lead, "LEAD"),
    ] {
        if value > seq.spacing {
            diag.global_error(format!(
                "PRIMER_SEQUENCING_{tag} > PRIMER_SEQUENCING_SPACING"
            ));
            return false;
        }
    }

    if settings.min_five_prime_overlap_of_junction < 1 {
        diag.global_error("Illegal value for PRIMER_MIN_5_PRIME_OVERLAP_OF_JUNCTION");
        return false;
    }
    if settings.min_three_prime_overlap_of_junction < 1 {
        diag.global_error("Illegal value for PRIMER_MIN_3_PRIME_OVERLAP_OF_JUNCTION");
        return false;
    }

    if p.conditions.divalent_conc > 0.0 && p.conditions.dntp_conc <= 0.0 {
        diag.warning(
            "PRIMER_SALT_DIVALENT > 0.0 but PRIMER_DNTP_CONC <= 0.0; use reasonable value for PRIMER_DNTP_CONC",
        );
    }

    for (args, prefix) in [(p, "PRIMER"), (o, "PRIMER_INTERNAL")] {
        for (pattern, end) in [
            (&args.must_match_five_prime, "FIVE_PRIME"),
            (&args.must_match_three_prime, "THREE_PRIME"),
        ] {
            let illegal = pattern
                .as_ref()
                .is_some_and(|m| !m.bytes().all(IupacCode::is_pattern_letter));
            if illegal {
                diag.global_error(format!("Illegal values for {prefix}_MUST_MATCH_{end}"));
                return false;
            }
        }
    }

    !diag.has_errors()
}

fn gc_bounds_illegal(args: &OligoArgs) -> bool {
    args.min_gc > args.max_gc || args.min_gc > 100.0 || args.max_gc < 0.0
}

fn gc_weight_without_optimum(args: &OligoArgs) -> bool {
    (args.weights.gc_content_lt != 0.0 || args.weights.gc_content_gt != 0.0) && args.opt_gc.is_none()
}

fn check_template(settings: &Settings, t: &Template, diag: &mut Diagnostics) -> bool {
    let p = &settings.primer;
    let o = &settings.internal;
    let seq_len = t.sequence.len() as i64;

    if t.has_quality() && t.quality.len() as i64 != seq_len {
        diag.sequence_error("Error in sequence quality data");
    }
    if (p.min_quality != 0 || o.min_quality != 0) && !t.has_quality() {
        diag.sequence_error("Sequence quality data missing");
    }

    if !t.included_region_valid() {
        diag.sequence_error("Illegal value for SEQUENCE_INCLUDED_REGION");
        return false;
    }

    let pr_min = settings.min_product_size() as i64;
    if t.incl_len < pr_min && settings.pick_left_primer && settings.pick_right_primer {
        let msg = "SEQUENCE_INCLUDED_REGION length < min PRIMER_PRODUCT_SIZE_RANGE";
        match settings.task {
            Task::CheckPrimers => diag.warning(msg),
            Task::PrimerList => {}
            _ => diag.sequence_error(msg),
        }
        if settings.task == Task::Generic {
            return false;
        }
    }

    if let Some(scp) = t.start_codon_pos {
        if !settings.default_position_penalties() {
            diag.sequence_error(
                "Cannot accept both SEQUENCE_START_CODON_POSITION and non-default arguments for PRIMER_INSIDE_PENALTY or PRIMER_OUTSIDE_PENALTY",
            );
        }
        // start codon checks work on whole-sequence positions
        let scp = scp + t.incl_start;
        if scp > t.incl_start + t.incl_len - 3 {
            diag.sequence_error("Start codon position not contained in SEQUENCE_INCLUDED_REGION");
            return false;
        }
        if scp >= 0 {
            let at = scp as usize;
            let codon = &t.sequence[at..at + 3];
            if !codon.eq_ignore_ascii_case(b"ATG") {
                diag.sequence_error("No start codon at SEQUENCE_START_CODON_POSITION");
                return false;
            }
        }
    }

    if t.has_quality() {
        for (args, prefix) in [(p, "PRIMER"), (o, "PRIMER_INTERNAL")] {
            if args.min_quality != 0 && args.min_quality < settings.quality_range_min {
                diag.global_error(format!("{prefix}_MIN_QUALITY < PRIMER_QUALITY_RANGE_MIN"));
                return false;
            }
            if args.min_quality != 0 && args.min_quality > settings.quality_range_max {
                diag.global_error(format!("{prefix}_MIN_QUALITY > PRIMER_QUALITY_RANGE_MAX"));
                return false;
            }
        }
        let range = settings.quality_range_min..=settings.quality_range_max;
        if t.quality.iter().any(|q| !range.contains(q)) {
            diag.sequence_error("Sequence quality score out of range");
            return false;
        }
    } else if p.weights.seq_quality != 0.0 || o.weights.seq_quality != 0.0 {
        diag.sequence_error(
            "Sequence quality is part of objective function but sequence quality is not defined",
        );
        return false;
    }

    if t.unrecognized_base.is_some() {
        if settings.liberal_base {
            diag.warning("Unrecognized base in input sequence");
        } else {
            diag.sequence_error("Unrecognized base in input sequence");
            return false;
        }
    }

    if !settings.default_position_penalties() {
        if t.targets.len() > 1 {
            diag.sequence_error(
                "Non-default inside penalty or outside penalty is valid only when number of targets <= 1",
            );
        }
        if t.targets.is_empty() {
            diag.warning(
                "Non-default inside penalty or outside penalty has no effect when number of targets is 0",
            );
        }
    }
    if !settings.pick_internal_oligo && t.internal_input.is_some() {
        diag.sequence_error(
            "Not specified to pick internal oligos but a specific internal oligo is provided",
        );
    }

    for (input, name, args, size_tag) in [
        (&t.internal_input, "internal oligo", o, "PRIMER_INTERNAL"),
        (&t.left_input, "left primer", p, "PRIMER"),
        (&t.right_input, "right primer", p, "PRIMER"),
    ] {
        let Some(input) = input else {
            continue;
        };
        if input.len() > MAX_PRIMER_LENGTH {
            diag.global_error(format!(
                "Specified {name} exceeds built-in maximum of {MAX_PRIMER_LENGTH}"
            ));
            return false;
        }
        if input.len() > args.max_size {
            diag.warning(format!("Specified {name} > {size_tag}_MAX_SIZE"));
        }
        if input.len() < args.min_size {
            diag.warning(format!("Specified {name} < {size_tag}_MIN_SIZE"));
        }
        let site = if name == "right primer" {
            reverse_complement(input)
        } else {
            input.clone()
        };
        if find_all_ignore_case(&t.sequence, &site).is_empty() {
            diag.sequence_error(format!("Specified {name} not in sequence"));
        } else if find_all_ignore_case(&t.trimmed_orig, &site).is_empty() {
            diag.sequence_error(format!("Specified {name} not in Included Region"));
        }
    }

    if let (Some(start), Some(end)) = (t.force_left_start, t.force_left_end) {
        if start > -1 && end > -1 && start > end {
            diag.global_error("SEQUENCE_FORCE_LEFT_START > SEQUENCE_FORCE_LEFT_END");
            return false;
        }
    }
    if let (Some(start), Some(end)) = (t.force_right_start, t.force_right_end) {
        if start > -1 && end > -1 && end > start {
            diag.global_error("SEQUENCE_FORCE_RIGHT_END > SEQUENCE_FORCE_RIGHT_START");
            return false;
        }
    }

    if !t.junctions.is_empty() {
        let half = p.max_size / 2;
        if settings.min_five_prime_overlap_of_junction > half {
            diag.global_error("PRIMER_MIN_5_PRIME_OVERLAP_OF_JUNCTION > PRIMER_MAX_SIZE / 2");
            return false;
        }
        if settings.min_three_prime_overlap_of_junction > half {
            diag.global_error("PRIMER_MIN_3_PRIME_OVERLAP_OF_JUNCTION > PRIMER_MAX_SIZE / 2");
            return false;
        }
    }

    !diag.has_errors()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence_args::{Interval, SequenceArgs};

    const SEQ: &str = "GGCAGTCGAATTGGTCCGCGTGTAAATGTCTCTATCGTAGGCTCGTCCGTGAAGGCCCTGAGCAGGTGTGGGACGCGCTGGAGGAGCCGAGGACTGATTGGAGTGCTTGCCGACCCACCC";

    fn run(settings: &Settings, args: &SequenceArgs) -> Diagnostics {
        let mut diag = Diagnostics::default();
        let t = Template::adjust(settings, args, &mut diag).unwrap();
        validate(settings, &t, &Libraries::default(), &mut diag);
        diag
    }

    fn small_products() -> Settings {
        Settings {
            product_size_ranges: vec![(60, 120)],
            ..Settings::default()
        }
    }

    #[test]
    fn test_defaults_pass() {
        let diag = run(&small_products(), &SequenceArgs::new("t", SEQ));
        assert!(!diag.has_errors(), "{diag:?}");
        assert!(diag.warnings.is_empty());
    }

    #[test]
    fn test_global_errors() {
        let mut settings = small_products();
        settings.primer.max_size = 40;
        let diag = run(&settings, &SequenceArgs::new("t", SEQ));
        assert_eq!(
            diag.global_errors,
            vec!["PRIMER_MAX_SIZE exceeds built-in maximum of 36".to_string()]
        );

        let mut settings = small_products();
        settings.product_size_ranges = vec![(120, 60)];
        let diag = run(&settings, &SequenceArgs::new("t", SEQ));
        assert_eq!(diag.global_errors, vec!["Illegal element in PRIMER_PRODUCT_SIZE_RANGE"]);

        let mut settings = small_products();
        settings.primer.must_match_five_prime = Some("NNNNX".to_string());
        let diag = run(&settings, &SequenceArgs::new("t", SEQ));
        assert_eq!(diag.global_errors, vec!["Illegal values for PRIMER_MUST_MATCH_FIVE_PRIME"]);

        let mut settings = small_products();
        settings.pair_weights.repeat_sim = 1.0;
        let diag = run(&settings, &SequenceArgs::new("t", SEQ));
        assert!(diag.global_errors[0].starts_with("Mispriming score is part of objective function"));
    }

    #[test]
    fn test_sequencing_spacing_must_be_positive() {
        let mut settings = small_products();
        settings.task = Task::Sequencing;
        settings.sequencing = crate::settings::Sequencing {
            lead: 0,
            spacing: 0,
            interval: 0,
            accuracy: 0,
        };
        let mut args = SequenceArgs::new("t", SEQ);
        args.targets = vec![Interval::new(40, 30)];
        let diag = run(&settings, &args);
        assert_eq!(diag.global_errors, vec!["Illegal value for PRIMER_SEQUENCING_SPACING"]);
    }

    #[test]
    fn test_included_region_too_short_for_product() {
        let long_products = Settings {
            product_size_ranges: vec![(130, 300)],
            ..Settings::default()
        };
        let diag = run(&long_products, &SequenceArgs::new("t", SEQ));
        assert_eq!(
            diag.sequence_errors,
            vec!["SEQUENCE_INCLUDED_REGION length < min PRIMER_PRODUCT_SIZE_RANGE"]
        );

        let settings = Settings {
            task: Task::CheckPrimers,
            ..long_products
        };
        let mut args = SequenceArgs::new("t", SEQ);
        args.left_primer = Some("TTGGTCCGCGTGTAAATGTC".to_string());
        let diag = run(&settings, &args);
        assert!(!diag.has_errors(), "{diag:?}");
        assert_eq!(diag.warnings.len(), 1);
    }

    #[test]
    fn test_start_codon() {
        let mut args = SequenceArgs::new("t", SEQ);
        args.start_codon_pos = Some(25);
        let diag = run(&small_products(), &args);
        assert!(!diag.has_errors(), "{diag:?}");

        args.start_codon_pos = Some(10);
        let diag = run(&small_products(), &args);
        assert_eq!(diag.sequence_errors, vec!["No start codon at SEQUENCE_START_CODON_POSITION"]);

        args.start_codon_pos = Some(119);
        let diag = run(&small_products(), &args);
        assert_eq!(
            diag.sequence_errors,
            vec!["Start codon position not contained in SEQUENCE_INCLUDED_REGION"]
        );
    }

    #[test]
    fn test_unrecognized_base() {
        let seq = SEQ.replacen('A', "X", 1);
        let diag = run(&small_products(), &SequenceArgs::new("t", seq.as_str()));
        assert_eq!(diag.sequence_errors, vec!["Unrecognized base in input sequence"]);

        let settings = Settings {
            liberal_base: true,
            ..small_products()
        };
        let diag = run(&settings, &SequenceArgs::new("t", seq.as_str()));
        assert!(!diag.has_errors());
        assert_eq!(diag.warnings, vec!["Unrecognized base in input sequence"]);
    }

    #[test]
    fn test_input_oligos() {
        let mut args = SequenceArgs::new("t", SEQ);
        args.included_region = Some(Interval::new(0, 110));
        args.left_primer = Some("ttggtccgcgtgtaaatgtc".to_string());
        args.right_primer = Some("GGGTGGGTCGGCAAGCACTC".to_string());
        let diag = run(&small_products(), &args);
        assert_eq!(
            diag.sequence_errors,
            vec!["Specified right primer not in Included Region"]
        );

        args.right_primer = Some("AAAAAAAAAAAAAAAAAAAA".to_string());
        let diag = run(&small_products(), &args);
        assert_eq!(diag.sequence_errors, vec!["Specified right primer not in sequence"]);

        let mut args = SequenceArgs::new("t", SEQ);
        args.internal_oligo = Some("GCTCGTCCGTGAAGGCCCTG".to_string());
        let diag = run(&small_products(), &args);
        assert_eq!(
            diag.sequence_errors,
            vec!["Not specified to pick internal oligos but a specific internal oligo is provided"]
        );
    }

    #[test]
    fn test_position_penalty_warnings() {
        let settings = Settings {
            inside_penalty: 1.0,
            ..small_products()
        };
        let diag = run(&settings, &SequenceArgs::new("t", SEQ));
        assert!(!diag.has_errors());
        assert_eq!(diag.warnings.len(), 1);

        let mut args = SequenceArgs::new("t", SEQ);
        args.targets = vec![Interval::new(40, 5), Interval::new(60, 5)];
        let diag = run(&settings, &args);
        assert_eq!(diag.sequence_errors.len(), 1);
    }

    #[test]
    fn test_divalent_without_dntp_warns() {
        let mut settings = small_products();
        settings.primer.conditions.divalent_conc = 1.5;
        let diag = run(&settings, &SequenceArgs::new("t", SEQ));
        assert!(!diag.has_errors());
        assert!(diag.warnings[0].starts_with("PRIMER_SALT_DIVALENT > 0.0"));
    }
}
