//! Error taxonomy for the execution engine.

use thiserror::Error;

use crate::core::path::PositionPath;
use crate::core::types::{SerializedError, TransportedError};

/// Error delivered to continuations when a step failed, and the error type
/// step thunks may return to name their failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StepError {
    pub name: String,
    pub message: String,
}

impl StepError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<&SerializedError> for StepError {
    fn from(err: &SerializedError) -> Self {
        Self::new(err.name.clone(), err.message.clone())
    }
}

impl From<&TransportedError> for StepError {
    fn from(err: &TransportedError) -> Self {
        match err {
            TransportedError::Serialized(err) => err.into(),
            TransportedError::Raw(raw) => Self::new("Error", raw.clone()),
        }
    }
}

/// Why a history record could not be reconciled with the op tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriftKind {
    /// No node exists at the given depth of the path.
    #[error("no op registered at depth {depth}")]
    MissingNode { depth: usize },
    /// A run record targets an op without an executable thunk.
    #[error("op is not runnable")]
    NotRunnable,
    /// The op was already settled by an earlier record.
    #[error("op was already settled")]
    AlreadySettled,
}

/// The function's step topology diverged from what history describes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("control flow drift at history[{index}] {path}: {kind}")]
pub struct DriftError {
    pub index: usize,
    pub path: PositionPath,
    pub kind: DriftKind,
}

/// Failure to encode a step error for transport.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode step error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("encoded step error is {size} bytes (limit {limit})")]
    Oversized { size: usize, limit: usize },
}

/// Invocation-level failure. The orchestrator sees no partial outcome.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid history: {}", .0.join("; "))]
    InvalidHistory(Vec<String>),
    #[error(transparent)]
    Drift(#[from] DriftError),
    #[error("function failed: {0:#}")]
    Function(anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drift_error_names_record_and_path() {
        let err = DriftError {
            index: 2,
            path: PositionPath::from([0, 3]),
            kind: DriftKind::MissingNode { depth: 1 },
        };
        assert_eq!(
            err.to_string(),
            "control flow drift at history[2] [0, 3]: no op registered at depth 1"
        );
    }

    #[test]
    fn raw_transported_error_becomes_generic_step_error() {
        let err = StepError::from(&TransportedError::Raw("disk full".to_string()));
        assert_eq!(err, StepError::new("Error", "disk full"));
        assert_eq!(err.to_string(), "disk full");
    }
}
