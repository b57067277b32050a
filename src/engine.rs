//! Design driver: adjusts and validates one template, builds the candidate
//! lists the task asks for and, when both primers are picked, searches for the
//! best pairs.

use crate::candidate_list::CandidateLists;
use crate::error::{Diagnostics, EngineError, Result};
use crate::oligo::{OligoList, OligoType, OutputKind, PairStats};
use crate::oligo_evaluator::OligoEvaluator;
use crate::pair_search::choose_pairs;
use crate::primer_pair::PrimerPair;
use crate::repeat_library::Libraries;
use crate::sequence_args::SequenceArgs;
use crate::settings::{Settings, Task};
use crate::template::Template;
use crate::validation::validate;
use itertools::Itertools;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Everything one design run produced. `template` is `None` if the input was
/// rejected before any candidate was generated.
#[derive(Debug, Clone)]
pub struct DesignResult {
    pub sequence_id: String,
    pub output_kind: OutputKind,
    pub left: OligoList,
    pub right: OligoList,
    pub internal: OligoList,
    pub pairs: Vec<PrimerPair>,
    pub pair_stats: PairStats,
    pub diagnostics: Diagnostics,
    pub upstream_stop_codon: Option<usize>,
    pub downstream_stop_codon: Option<usize>,
    pub template: Option<Template>,
}

impl DesignResult {
    fn new(sequence_id: &str, output: OutputKind) -> Self {
        let lists = CandidateLists::new();
        Self {
            sequence_id: sequence_id.to_string(),
            output_kind: output,
            left: lists.left,
            right: lists.right,
            internal: lists.internal,
            pairs: vec![],
            pair_stats: PairStats::default(),
            diagnostics: Diagnostics::default(),
            upstream_stop_codon: None,
            downstream_stop_codon: None,
            template: None,
        }
    }

    pub fn list(&self, kind: OligoType) -> &OligoList {
        match kind {
            OligoType::Left => &self.left,
            OligoType::Right => &self.right,
            OligoType::Internal => &self.internal,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Pairs unless only one primer is picked or the task asks for lists.
pub fn output_kind(settings: &Settings) -> OutputKind {
    match settings.task {
        Task::PrimerList | Task::Sequencing => OutputKind::Lists,
        _ if settings.pick_left_primer && settings.pick_right_primer => OutputKind::Pairs,
        _ => OutputKind::Lists,
    }
}

/// Designs primers for one template.
pub fn choose_primers(
    settings: &Settings,
    libraries: &Libraries,
    args: &SequenceArgs,
) -> Result<DesignResult> {
    let output = output_kind(settings);
    let mut ret = DesignResult::new(&args.sequence_id, output);
    let mut diag = Diagnostics::default();

    let Some(mut template) = Template::adjust(settings, args, &mut diag) else {
        ret.diagnostics = diag;
        return Ok(ret);
    };
    if !validate(settings, &template, libraries, &mut diag) {
        ret.diagnostics = diag;
        return Ok(ret);
    }
    template.compute_stop_codons();
    ret.upstream_stop_codon = template.upstream_stop_codon;
    ret.downstream_stop_codon = template.downstream_stop_codon;

    let eval = OligoEvaluator::new(settings, &template, libraries, output);
    let mut lists = CandidateLists::new();
    let mut pair_stats = PairStats::default();
    let mut search = true;
    match settings.task {
        Task::PrimerList => lists.make_complete_lists(&eval)?,
        Task::Sequencing => lists.pick_sequencing_lists(&eval, &mut diag)?,
        Task::CheckPrimers => lists.add_primers_to_check(&eval, &mut diag)?,
        _ => {
            search = lists.make_detection_lists(&eval, &mut pair_stats, &mut diag)?;
            if search && settings.pick_internal_oligo {
                lists.make_internal_list(&eval, &mut diag)?;
            }
        }
    }
    debug!(
        "{}: {} left, {} right, {} internal candidates",
        args.sequence_id,
        lists.left.len(),
        lists.right.len(),
        lists.internal.len()
    );

    let mut pairs = vec![];
    if search {
        if settings.task != Task::Sequencing {
            if settings.pick_right_primer {
                lists.right.sort();
            }
            if settings.pick_left_primer {
                lists.left.sort();
            }
        }
        if output == OutputKind::Lists && settings.pick_internal_oligo {
            lists.internal.sort();
        }
        if output == OutputKind::Pairs {
            pairs = choose_pairs(&eval, &mut lists, &mut pair_stats)?;
            info!("{}: {} primer pairs", args.sequence_id, pairs.len());
        }
    }

    if settings.pick_anyway && output == OutputKind::Pairs {
        for (input, stats, label) in [
            (&template.left_input, &lists.left.stats, "Left primer"),
            (&template.right_input, &lists.right.stats, "Right primer"),
            (&template.internal_input, &lists.internal.stats, "Hybridization probe"),
        ] {
            if let Some(msg) = input.as_ref().and_then(|_| stats.must_use_warning(label)) {
                diag.warning(msg);
            }
        }
    }
    if !diag.warnings.is_empty() {
        warn!("{}: {}", args.sequence_id, diag.warnings.iter().join("; "));
    }

    ret.left = lists.left;
    ret.right = lists.right;
    ret.internal = lists.internal;
    ret.pairs = pairs;
    ret.pair_stats = pair_stats;
    ret.diagnostics = diag;
    ret.template = Some(template);
    Ok(ret)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    pub protocol_version: String,
    pub supported_tasks: Vec<String>,
    pub alignment_models: Vec<String>,
    pub deterministic_results: bool,
}

pub trait Designer {
    fn design(&self, args: &SequenceArgs) -> std::result::Result<DesignResult, EngineError>;
    fn design_batch(
        &self,
        batch: &[SequenceArgs],
    ) -> Vec<std::result::Result<DesignResult, EngineError>>;
}

/// Settings and libraries shared by every design.
#[derive(Debug, Clone, Default)]
pub struct PrimerEngine {
    settings: Settings,
    libraries: Libraries,
}

impl PrimerEngine {
    pub fn new(settings: Settings, libraries: Libraries) -> Self {
        Self {
            settings,
            libraries,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn libraries(&self) -> &Libraries {
        &self.libraries
    }

    pub fn capabilities() -> Capabilities {
        Capabilities {
            protocol_version: "v1".to_string(),
            supported_tasks: vec![
                "Generic".to_string(),
                "Cloning".to_string(),
                "Discriminative".to_string(),
                "Sequencing".to_string(),
                "PrimerList".to_string(),
                "CheckPrimers".to_string(),
            ],
            alignment_models: vec!["Dp".to_string(), "Thermodynamic".to_string()],
            deterministic_results: true,
        }
    }
}

impl Designer for PrimerEngine {
    fn design(&self, args: &SequenceArgs) -> std::result::Result<DesignResult, EngineError> {
        choose_primers(&self.settings, &self.libraries, args).map_err(EngineError::from)
    }

    /// Independent designs in parallel, results in input order.
    fn design_batch(
        &self,
        batch: &[SequenceArgs],
    ) -> Vec<std::result::Result<DesignResult, EngineError>> {
        batch.par_iter().map(|args| self.design(args)).collect()
    }
}
