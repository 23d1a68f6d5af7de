//! Shared wire types exchanged with the orchestrator.
//!
//! These types define stable contracts between the engine and whatever carries
//! its payloads. They hold no executable state and serialize deterministically.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::path::PositionPath;

/// Kind tag of a registered op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    /// Runnable unit of work registered with `run`.
    Step,
    /// Orchestrator-side pause registered with `sleep`.
    Sleep,
    /// Orchestrator-side wait registered with `wait_for_event`.
    WaitForEvent,
}

/// Identity of an op as registered by user code, without its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpSpec {
    pub kind: OpKind,
    pub id: String,
    pub name: String,
    pub options: Map<String, Value>,
}

/// An op registered by the function but not matched by any history record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredOp {
    pub kind: OpKind,
    pub id: String,
    pub name: String,
    pub options: Map<String, Value>,
    /// True when the engine holds a thunk for this op and can execute it.
    pub run: bool,
    pub position_path: PositionPath,
}

/// Structured form of an error thrown by a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedError {
    /// Type discriminator (`"Error"` unless the step raised a named `StepError`).
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// A step error as carried over the wire.
///
/// `Raw` is the degraded form used when structured encoding failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransportedError {
    Serialized(SerializedError),
    Raw(String),
}

impl TransportedError {
    pub fn message(&self) -> &str {
        match self {
            TransportedError::Serialized(err) => &err.message,
            TransportedError::Raw(raw) => raw,
        }
    }
}

/// Result of executing the one selected step: `{"value": ..}` or `{"error": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutput {
    Value(Value),
    Error(TransportedError),
}

/// Terminal outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum Outcome {
    /// The function used no step tools; its return value, verbatim.
    Single(Value),
    /// The step selected by history was executed now.
    StepResult(StepOutput),
    /// Newly registered, not yet run steps in registration order.
    Discovery(Vec<DiscoveredOp>),
}
