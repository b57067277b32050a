//! Serializable contracts for design results. Positions are in the caller's
//! coordinates, i.e. offset by the first base index.

use serde::{Deserialize, Serialize};

pub const DESIGN_REPORT_SCHEMA: &str = "primerforge.design_report.v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OligoRecord {
    pub sequence: String,
    /// 5' end; on the reverse strand for right primers.
    pub position: i64,
    pub length: usize,
    pub tm: f64,
    pub gc_percent: f64,
    pub self_any: Option<f64>,
    pub self_end: Option<f64>,
    pub hairpin: Option<f64>,
    pub end_stability: Option<f64>,
    pub repeat_max: Option<f64>,
    pub repeat_name: Option<String>,
    pub template_mispriming: Option<f64>,
    pub position_penalty: Option<f64>,
    pub min_seq_quality: Option<i32>,
    pub penalty: f64,
    pub problems: Option<String>,
    pub must_use: bool,
}

impl Default for OligoRecord {
    fn default() -> Self {
        Self {
            sequence: String::new(),
            position: 0,
            length: 0,
            tm: 0.0,
            gc_percent: 0.0,
            self_any: None,
            self_end: None,
            hairpin: None,
            end_stability: None,
            repeat_max: None,
            repeat_name: None,
            template_mispriming: None,
            position_penalty: None,
            min_seq_quality: None,
            penalty: 0.0,
            problems: None,
            must_use: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairRecord {
    pub rank: usize,
    pub penalty: f64,
    pub left: OligoRecord,
    pub right: OligoRecord,
    pub internal: Option<OligoRecord>,
    pub product_size: i64,
    pub product_tm: f64,
    pub product_tm_oligo_tm_diff: f64,
    pub t_opt_a: f64,
    pub compl_any: f64,
    pub compl_end: f64,
    pub repeat_sim: Option<f64>,
    pub repeat_name: Option<String>,
    pub template_mispriming: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListReport {
    pub kind: String,
    pub explain: String,
    pub oligos: Vec<OligoRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsRecord {
    pub global_errors: Vec<String>,
    pub sequence_errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl DiagnosticsRecord {
    pub fn has_errors(&self) -> bool {
        !self.global_errors.is_empty() || !self.sequence_errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignReport {
    pub schema: String,
    pub sequence_id: String,
    pub output_kind: String,
    pub pairs: Vec<PairRecord>,
    pub pair_explain: Option<String>,
    pub left: Option<ListReport>,
    pub right: Option<ListReport>,
    pub internal: Option<ListReport>,
    pub upstream_stop_codon: Option<i64>,
    pub downstream_stop_codon: Option<i64>,
    pub diagnostics: DiagnosticsRecord,
}

impl Default for DesignReport {
    fn default() -> Self {
        Self {
            schema: DESIGN_REPORT_SCHEMA.to_string(),
            sequence_id: String::new(),
            output_kind: "pairs".to_string(),
            pairs: vec![],
            pair_explain: None,
            left: None,
            right: None,
            internal: None,
            upstream_stop_codon: None,
            downstream_stop_codon: None,
            diagnostics: DiagnosticsRecord::default(),
        }
    }
}

impl DesignReport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
