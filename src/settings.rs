//! Global design settings. Every struct deserializes with defaults for missing
//! fields, so a settings file only needs to name what it changes.

use crate::alignment_oracle::OracleKind;
use crate::error::Result;
use crate::oligo::OligoType;
use crate::thermodynamics::{Conditions, DEFAULT_NN_MAX_LEN, SaltCorrection, TmMethod};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Longest oligo the engine accepts.
pub const MAX_PRIMER_LENGTH: usize = 36;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Task {
    /// Detection primers with an optional hybridization probe.
    #[default]
    Generic,
    /// Primers forced to the ends of the included region.
    Cloning,
    /// Primers forced to end at the bounds of the single target.
    Discriminative,
    /// Primers walking along the targets at a fixed spacing.
    Sequencing,
    /// Every acceptable oligo, no pairing.
    PrimerList,
    /// Evaluate caller-supplied oligos.
    CheckPrimers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OligoWeights {
    pub temp_gt: f64,
    pub temp_lt: f64,
    pub gc_content_gt: f64,
    pub gc_content_lt: f64,
    pub length_gt: f64,
    pub length_lt: f64,
    pub compl_any: f64,
    pub compl_end: f64,
    pub compl_any_th: f64,
    pub compl_end_th: f64,
    pub hairpin_th: f64,
    pub num_ns: f64,
    pub repeat_sim: f64,
    pub seq_quality: f64,
    pub end_stability: f64,
    pub pos_penalty: f64,
    pub template_mispriming: f64,
    pub template_mispriming_th: f64,
    pub temp_cutoff: f64,
}

impl Default for OligoWeights {
    fn default() -> Self {
        Self {
            temp_gt: 1.0,
            temp_lt: 1.0,
            gc_content_gt: 0.0,
            gc_content_lt: 0.0,
            length_gt: 1.0,
            length_lt: 1.0,
            compl_any: 0.0,
            compl_end: 0.0,
            compl_any_th: 0.0,
            compl_end_th: 0.0,
            hairpin_th: 0.0,
            num_ns: 0.0,
            repeat_sim: 0.0,
            seq_quality: 0.0,
            end_stability: 0.0,
            pos_penalty: 1.0,
            template_mispriming: 0.0,
            template_mispriming_th: 0.0,
            temp_cutoff: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairWeights {
    pub primer_quality: f64,
    pub io_quality: f64,
    pub diff_tm: f64,
    pub compl_any: f64,
    pub compl_end: f64,
    pub compl_any_th: f64,
    pub compl_end_th: f64,
    pub product_tm_lt: f64,
    pub product_tm_gt: f64,
    pub product_size_lt: f64,
    pub product_size_gt: f64,
    pub repeat_sim: f64,
    pub template_mispriming: f64,
    pub template_mispriming_th: f64,
    pub temp_cutoff: f64,
}

impl Default for PairWeights {
    fn default() -> Self {
        Self {
            primer_quality: 1.0,
            io_quality: 0.0,
            diff_tm: 0.0,
            compl_any: 0.0,
            compl_end: 0.0,
            compl_any_th: 0.0,
            compl_end_th: 0.0,
            product_tm_lt: 0.0,
            product_tm_gt: 0.0,
            product_size_lt: 0.0,
            product_size_gt: 0.0,
            repeat_sim: 0.0,
            template_mispriming: 0.0,
            template_mispriming_th: 0.0,
            temp_cutoff: 5.0,
        }
    }
}

/// Constraints for one kind of oligo: primers or internal oligos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OligoArgs {
    pub opt_size: usize,
    pub min_size: usize,
    pub max_size: usize,
    pub opt_tm: f64,
    pub min_tm: f64,
    pub max_tm: f64,
    pub opt_gc: Option<f64>,
    pub min_gc: f64,
    pub max_gc: f64,
    pub conditions: Conditions,
    pub num_ns_accepted: usize,
    pub max_self_any: f64,
    pub max_self_end: f64,
    pub max_self_any_th: f64,
    pub max_self_end_th: f64,
    pub max_hairpin_th: f64,
    pub max_poly_x: usize,
    pub max_repeat_compl: f64,
    pub max_template_mispriming: Option<f64>,
    pub max_template_mispriming_th: Option<f64>,
    pub min_quality: i32,
    pub min_end_quality: i32,
    /// Five letter IUPAC patterns the oligo ends must match.
    pub must_match_five_prime: Option<String>,
    pub must_match_three_prime: Option<String>,
    pub weights: OligoWeights,
}

impl Default for OligoArgs {
    fn default() -> Self {
        Self {
            opt_size: 20,
            min_size: 18,
            max_size: 27,
            opt_tm: 60.0,
            min_tm: 57.0,
            max_tm: 63.0,
            opt_gc: None,
            min_gc: 20.0,
            max_gc: 80.0,
            conditions: Conditions::default(),
            num_ns_accepted: 0,
            max_self_any: 8.0,
            max_self_end: 3.0,
            max_self_any_th: 47.0,
            max_self_end_th: 47.0,
            max_hairpin_th: 47.0,
            max_poly_x: 5,
            max_repeat_compl: 12.0,
            max_template_mispriming: None,
            max_template_mispriming_th: None,
            min_quality: 0,
            min_end_quality: 0,
            must_match_five_prime: None,
            must_match_three_prime: None,
            weights: OligoWeights::default(),
        }
    }
}

impl OligoArgs {
    pub fn internal_default() -> Self {
        Self {
            max_self_any: 12.0,
            max_self_end: 12.0,
            weights: OligoWeights {
                pos_penalty: 0.0,
                ..OligoWeights::default()
            },
            ..Self::default()
        }
    }

    pub fn self_any_threshold(&self, kind: OracleKind) -> f64 {
        kind.select(self.max_self_any, self.max_self_any_th)
    }

    pub fn self_end_threshold(&self, kind: OracleKind) -> f64 {
        kind.select(self.max_self_end, self.max_self_end_th)
    }

    pub fn template_threshold(&self, kind: OracleKind) -> Option<f64> {
        kind.select(self.max_template_mispriming, self.max_template_mispriming_th)
    }
}

/// Placement of sequencing primers along a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sequencing {
    /// Bases between the 3' end of a primer and the first base read well.
    pub lead: i64,
    pub spacing: i64,
    pub interval: i64,
    /// Tolerance around the ideal 3' position.
    pub accuracy: i64,
}

impl Default for Sequencing {
    fn default() -> Self {
        Self {
            lead: 50,
            spacing: 500,
            interval: 250,
            accuracy: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub task: Task,
    pub pick_left_primer: bool,
    pub pick_right_primer: bool,
    pub pick_internal_oligo: bool,
    pub first_base_index: i64,
    pub num_return: usize,
    /// Keep caller-supplied oligos even when they violate constraints.
    pub pick_anyway: bool,
    pub liberal_base: bool,
    pub lib_ambiguity_codes_consensus: bool,
    pub lowercase_masking: bool,
    pub tm_method: TmMethod,
    pub salt_correction: SaltCorrection,
    pub thermodynamic_oligo_alignment: bool,
    pub thermodynamic_template_alignment: bool,
    pub nn_max_len: usize,
    pub max_end_stability: f64,
    pub max_end_gc: usize,
    pub gc_clamp: usize,
    pub product_size_ranges: Vec<(usize, usize)>,
    pub product_opt_size: Option<usize>,
    pub product_opt_tm: Option<f64>,
    pub product_min_tm: Option<f64>,
    pub product_max_tm: Option<f64>,
    pub max_diff_tm: f64,
    pub pair_compl_any: f64,
    pub pair_compl_end: f64,
    pub pair_compl_any_th: f64,
    pub pair_compl_end_th: f64,
    pub pair_repeat_compl: f64,
    pub pair_max_template_mispriming: Option<f64>,
    pub pair_max_template_mispriming_th: Option<f64>,
    pub quality_range_min: i32,
    pub quality_range_max: i32,
    pub outside_penalty: f64,
    pub inside_penalty: f64,
    pub min_left_three_prime_distance: i64,
    pub min_right_three_prime_distance: i64,
    pub min_five_prime_overlap_of_junction: usize,
    pub min_three_prime_overlap_of_junction: usize,
    pub sequencing: Sequencing,
    pub optimize_ok_regions: bool,
    pub primer: OligoArgs,
    pub internal: OligoArgs,
    pub pair_weights: PairWeights,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            task: Task::Generic,
            pick_left_primer: true,
            pick_right_primer: true,
            pick_internal_oligo: false,
            first_base_index: 0,
            num_return: 5,
            pick_anyway: false,
            liberal_base: false,
            lib_ambiguity_codes_consensus: true,
            lowercase_masking: false,
            tm_method: TmMethod::Breslauer,
            salt_correction: SaltCorrection::Schildkraut,
            thermodynamic_oligo_alignment: false,
            thermodynamic_template_alignment: false,
            nn_max_len: DEFAULT_NN_MAX_LEN,
            max_end_stability: 100.0,
            max_end_gc: 5,
            gc_clamp: 0,
            product_size_ranges: vec![(100, 300)],
            product_opt_size: None,
            product_opt_tm: None,
            product_min_tm: None,
            product_max_tm: None,
            max_diff_tm: 100.0,
            pair_compl_any: 8.0,
            pair_compl_end: 3.0,
            pair_compl_any_th: 47.0,
            pair_compl_end_th: 47.0,
            pair_repeat_compl: 24.0,
            pair_max_template_mispriming: None,
            pair_max_template_mispriming_th: None,
            quality_range_min: 0,
            quality_range_max: 100,
            outside_penalty: 0.0,
            inside_penalty: -1.0,
            min_left_three_prime_distance: -1,
            min_right_three_prime_distance: -1,
            min_five_prime_overlap_of_junction: 7,
            min_three_prime_overlap_of_junction: 4,
            sequencing: Sequencing::default(),
            optimize_ok_regions: true,
            primer: OligoArgs::default(),
            internal: OligoArgs::internal_default(),
            pair_weights: PairWeights::default(),
        }
    }
}

impl Settings {
    /// SantaLucia thermodynamics, the thermodynamic complementarity model and
    /// PCR buffer with magnesium and dNTPs.
    pub fn modern() -> Self {
        let mut ret = Self {
            tm_method: TmMethod::SantaLucia,
            salt_correction: SaltCorrection::SantaLucia,
            thermodynamic_oligo_alignment: true,
            ..Self::default()
        };
        for args in [&mut ret.primer, &mut ret.internal] {
            args.conditions.divalent_conc = 1.5;
            args.conditions.dntp_conc = 0.6;
        }
        ret
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn oligo_args(&self, kind: OligoType) -> &OligoArgs {
        match kind {
            OligoType::Internal => &self.internal,
            _ => &self.primer,
        }
    }

    pub fn oligo_oracle_kind(&self) -> OracleKind {
        OracleKind::from_flag(self.thermodynamic_oligo_alignment)
    }

    pub fn template_oracle_kind(&self) -> OracleKind {
        OracleKind::from_flag(self.thermodynamic_template_alignment)
    }

    /// Inside penalty -1 with outside penalty 0 means "avoid the target entirely".
    pub fn default_position_penalties(&self) -> bool {
        self.inside_penalty == -1.0 && self.outside_penalty == 0.0
    }

    pub fn min_product_size(&self) -> usize {
        self.product_size_ranges
            .iter()
            .map(|r| r.0)
            .min()
            .unwrap_or(0)
    }

    pub fn max_product_size(&self) -> usize {
        self.product_size_ranges
            .iter()
            .map(|r| r.1)
            .max()
            .unwrap_or(0)
    }

    pub fn pair_compl_any_threshold(&self) -> f64 {
        self.oligo_oracle_kind()
            .select(self.pair_compl_any, self.pair_compl_any_th)
    }

    pub fn pair_compl_end_threshold(&self) -> f64 {
        self.oligo_oracle_kind()
            .select(self.pair_compl_end, self.pair_compl_end_th)
    }

    pub fn pair_template_threshold(&self) -> Option<f64> {
        self.template_oracle_kind().select(
            self.pair_max_template_mispriming,
            self.pair_max_template_mispriming_th,
        )
    }

    fn primer_template_weight(&self) -> f64 {
        let w = &self.primer.weights;
        self.template_oracle_kind()
            .select(w.template_mispriming, w.template_mispriming_th)
    }

    fn pair_template_weight(&self) -> f64 {
        let w = &self.pair_weights;
        self.template_oracle_kind()
            .select(w.template_mispriming, w.template_mispriming_th)
    }

    /// True if any threshold or penalty term looks at primer-template mispriming.
    pub fn need_template_mispriming(&self) -> bool {
        self.primer
            .template_threshold(self.template_oracle_kind())
            .is_some()
            || self.primer_template_weight() != 0.0
            || self.need_pair_template_mispriming()
    }

    pub fn need_pair_template_mispriming(&self) -> bool {
        self.pair_template_threshold().is_some() || self.pair_template_weight() != 0.0
    }

    /// Template mispriming enters the oligo penalty.
    pub fn template_in_penalty(&self) -> bool {
        self.primer_template_weight() != 0.0
    }
}
