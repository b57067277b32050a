use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrimerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("alignment error: {0}")]
    Alignment(String),

    #[error("thermodynamics error: {0}")]
    Thermodynamics(String),

    /// Allocation or size limit hit somewhere below a design call; unwinds the whole call.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("repeat library error: {0}")]
    Library(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, PrimerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    Unsupported,
    Io,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineError {
    pub code: ErrorCode,
    pub message: String,
}

impl EngineError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for EngineError {}

impl From<PrimerError> for EngineError {
    fn from(err: PrimerError) -> Self {
        let code = match &err {
            PrimerError::InvalidInput(_) | PrimerError::Library(_) | PrimerError::Json(_) => {
                ErrorCode::InvalidInput
            }
            PrimerError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => ErrorCode::NotFound,
            PrimerError::Io(_) | PrimerError::Csv(_) => ErrorCode::Io,
            PrimerError::Alignment(_)
            | PrimerError::Thermodynamics(_)
            | PrimerError::ResourceExhausted(_) => ErrorCode::Internal,
        };
        EngineError::new(code, err.to_string())
    }
}

/// Message channels filled while validating settings and per-sequence input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Diagnostics {
    /// Errors in the global settings; nothing can be designed.
    pub global_errors: Vec<String>,
    /// Errors that only concern the current sequence.
    pub sequence_errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Diagnostics {
    pub fn global_error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        log::debug!("global error: {msg}");
        self.global_errors.push(msg);
    }

    pub fn sequence_error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        log::debug!("sequence error: {msg}");
        self.sequence_errors.push(msg);
    }

    pub fn warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.global_errors.is_empty() || !self.sequence_errors.is_empty()
    }

    pub fn joined_warnings(&self) -> String {
        self.warnings.join("; ")
    }
}
