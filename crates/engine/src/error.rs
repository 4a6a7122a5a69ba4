//! Engine error types

use thiserror::Error;

/// Errors that abort a generation run.
///
/// Reference failures inside the model (unknown send targets, missing
/// classes) are not errors; they are recorded as diagnostics and the run
/// continues.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cycle detected in group graph between groups {groups:?}")]
    CycleDetected { groups: Vec<Vec<String>> },

    #[error("group graph could not be ordered; groups left unplaced: {remaining:?}")]
    UnorderableGroups { remaining: Vec<usize> },

    #[error(transparent)]
    Core(#[from] rebtest_core::Error),
}

impl EngineError {
    pub fn cycle_detected(groups: Vec<Vec<String>>) -> Self {
        Self::CycleDetected { groups }
    }

    pub fn unorderable_groups(remaining: Vec<usize>) -> Self {
        Self::UnorderableGroups { remaining }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;
