// ❗ Engine errors and validation results
//
// Validation failures are VALUES (SynonymValidation), not errors: callers
// render them directly. EngineError is for operations that cannot proceed.

use crate::entities::SpecialtyKey;
use serde::{Deserialize, Serialize};

// ============================================================================
// VALIDATION RESULT
// ============================================================================

/// Outcome of validating a synonym or specialty name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymValidation {
    pub is_valid: bool,
    pub message: Option<String>,
}

impl SynonymValidation {
    pub fn valid() -> Self {
        SynonymValidation {
            is_valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        SynonymValidation {
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// ENGINE ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    SourceNotFound(SpecialtyKey),
    AlreadyMapped {
        key: SpecialtyKey,
        group_id: String,
    },
    CandidateNotFound {
        source: SpecialtyKey,
        target: SpecialtyKey,
    },
    NoPendingSuggestions(SpecialtyKey),
    GroupNotFound(String),
    InvalidGroup(String),
    InvalidName(String),
    /// A percentile breakpoint is zero, negative or not finite
    InvalidBreakpoint {
        percentile: u8,
        value: f64,
    },
    InvalidValue(f64),
    MissingBreakpoint {
        metric: String,
        percentile: u8,
    },
    StaleRevision {
        expected: u64,
        found: u64,
    },
    Persistence(String),
    InvalidImport(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::SourceNotFound(key) => write!(f, "Source specialty not found: {}", key),
            EngineError::AlreadyMapped { key, group_id } => {
                write!(f, "{} already belongs to group {}", key, group_id)
            }
            EngineError::CandidateNotFound { source, target } => {
                write!(f, "No candidate {} for source {}", target, source)
            }
            EngineError::NoPendingSuggestions(key) => {
                write!(f, "No suggestions pending for {}", key)
            }
            EngineError::GroupNotFound(id) => write!(f, "Mapping group not found: {}", id),
            EngineError::InvalidGroup(reason) => write!(f, "Invalid mapping group: {}", reason),
            EngineError::InvalidName(reason) => write!(f, "Invalid name: {}", reason),
            EngineError::InvalidBreakpoint { percentile, value } => {
                write!(f, "Invalid p{} breakpoint: {}", percentile, value)
            }
            EngineError::InvalidValue(value) => write!(f, "Invalid lookup value: {}", value),
            EngineError::MissingBreakpoint { metric, percentile } => {
                write!(f, "No {} p{} breakpoint available", metric, percentile)
            }
            EngineError::StaleRevision { expected, found } => write!(
                f,
                "Stale revision: expected {} but store holds {}",
                expected, found
            ),
            EngineError::Persistence(reason) => write!(f, "Persistence failure: {}", reason),
            EngineError::InvalidImport(reason) => write!(f, "Invalid import: {}", reason),
        }
    }
}

impl std::error::Error for EngineError {}

pub type EngineResult<T> = Result<T, EngineError>;
