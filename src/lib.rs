use aligner::PrimerAligners;
use lazy_static::lazy_static;

pub mod about;
pub mod aligner;
pub mod alignment_oracle;
pub mod candidate_list;
pub mod dna_sequence;
pub mod engine;
pub mod error;
pub mod iupac_code;
pub mod oligo;
pub mod oligo_evaluator;
pub mod pair_search;
pub mod primer_pair;
pub mod repeat_library;
pub mod report;
pub mod scoring_matrix;
pub mod sequence_args;
pub mod settings;
pub mod template;
pub mod thermodynamics;
pub mod validation;

pub use engine::{DesignResult, Designer, PrimerEngine, choose_primers};
pub use error::{Diagnostics, EngineError, ErrorCode, PrimerError};
pub use sequence_args::SequenceArgs;
pub use settings::Settings;

lazy_static! {
    // Default aligner argument sets for primer checks
    pub static ref PRIMER_ALIGNERS: PrimerAligners = PrimerAligners::new();
}
