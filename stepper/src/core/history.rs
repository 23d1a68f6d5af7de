//! Historical step records and their semantic invariants.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::path::PositionPath;
use crate::core::types::TransportedError;

/// What the orchestrator recorded for one step position.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordState {
    /// Execute this step now.
    Run,
    /// The step resolved with this value (`null` included).
    Value(Value),
    /// The step failed with this error.
    Error(TransportedError),
}

/// One entry of the orchestrator-supplied history.
///
/// On the wire exactly one of `run`, `value` or `error` is present; anything
/// else is rejected while parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord", into = "RawRecord")]
pub struct HistoricalStepRecord {
    pub position_path: PositionPath,
    pub state: RecordState,
}

impl HistoricalStepRecord {
    pub fn run(path: impl Into<PositionPath>) -> Self {
        Self {
            position_path: path.into(),
            state: RecordState::Run,
        }
    }

    pub fn value(path: impl Into<PositionPath>, value: Value) -> Self {
        Self {
            position_path: path.into(),
            state: RecordState::Value(value),
        }
    }

    pub fn error(path: impl Into<PositionPath>, error: TransportedError) -> Self {
        Self {
            position_path: path.into(),
            state: RecordState::Error(error),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawRecord {
    position_path: PositionPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    run: Option<bool>,
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<TransportedError>,
}

// Distinguishes `"value": null` (a step that resolved to null) from a missing key.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl TryFrom<RawRecord> for HistoricalStepRecord {
    type Error = String;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        if raw.run == Some(false) {
            return Err(format!(
                "record {}: run must be true when present",
                raw.position_path
            ));
        }
        let state = match (raw.run.is_some(), raw.value, raw.error) {
            (true, None, None) => RecordState::Run,
            (false, Some(value), None) => RecordState::Value(value),
            (false, None, Some(error)) => RecordState::Error(error),
            (false, None, None) => {
                return Err(format!(
                    "record {} has none of run, value or error",
                    raw.position_path
                ));
            }
            _ => {
                return Err(format!(
                    "record {} sets more than one of run, value or error",
                    raw.position_path
                ));
            }
        };
        Ok(Self {
            position_path: raw.position_path,
            state,
        })
    }
}

impl From<HistoricalStepRecord> for RawRecord {
    fn from(record: HistoricalStepRecord) -> Self {
        let mut raw = RawRecord {
            position_path: record.position_path,
            run: None,
            value: None,
            error: None,
        };
        match record.state {
            RecordState::Run => raw.run = Some(true),
            RecordState::Value(value) => raw.value = Some(value),
            RecordState::Error(error) => raw.error = Some(error),
        }
        raw
    }
}

/// Check history invariants that parsing alone cannot express:
/// - At most `max_records` records
/// - Every position path is non-empty
/// - No position path appears twice
///
/// Records after a run record are accepted; replay stops at the selection.
pub fn validate_history(history: &[HistoricalStepRecord], max_records: usize) -> Vec<String> {
    let mut errors = Vec::new();
    if history.len() > max_records {
        errors.push(format!(
            "history has {} records (limit {})",
            history.len(),
            max_records
        ));
    }

    let mut seen: HashMap<&PositionPath, usize> = HashMap::new();
    for (index, record) in history.iter().enumerate() {
        if record.position_path.is_empty() {
            errors.push(format!("history[{index}]: position path must not be empty"));
        }

        if let Some(first) = seen.insert(&record.position_path, index) {
            errors.push(format!(
                "history[{index}]: duplicate position path {} (first at history[{first}])",
                record.position_path
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<HistoricalStepRecord, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn parses_each_record_form() {
        let run = parse(json!({"positionPath": [0], "run": true})).expect("run");
        assert_eq!(run, HistoricalStepRecord::run([0]));

        let value = parse(json!({"positionPath": [1], "value": {"ok": 1}})).expect("value");
        assert_eq!(value, HistoricalStepRecord::value([1], json!({"ok": 1})));

        let error = parse(json!({
            "positionPath": [2],
            "error": {"name": "Error", "message": "boom"}
        }))
        .expect("error");
        assert_eq!(error.state_message(), Some("boom"));
    }

    #[test]
    fn null_value_is_a_resolved_value() {
        let record = parse(json!({"positionPath": [0], "value": null})).expect("parse");
        assert_eq!(record.state, RecordState::Value(Value::Null));
    }

    #[test]
    fn rejects_empty_and_ambiguous_records() {
        let err = parse(json!({"positionPath": [0]})).expect_err("empty");
        assert!(err.to_string().contains("none of run, value or error"));

        let err = parse(json!({"positionPath": [0], "run": true, "value": 1})).expect_err("both");
        assert!(err.to_string().contains("more than one"));

        let err = parse(json!({"positionPath": [0], "run": false})).expect_err("run false");
        assert!(err.to_string().contains("run must be true"));
    }

    #[test]
    fn explicit_run_false_is_not_a_value_record() {
        let err = parse(json!({"positionPath": [0], "run": false, "value": 1}))
            .expect_err("run false with value");
        assert!(err.to_string().contains("run must be true"));
    }

    #[test]
    fn serializes_back_to_wire_shape() {
        let value = serde_json::to_value(HistoricalStepRecord::run([0, 1])).expect("serialize");
        assert_eq!(value, json!({"positionPath": [0, 1], "run": true}));
    }

    #[test]
    fn validate_reports_duplicate_and_empty_paths() {
        let history = vec![
            HistoricalStepRecord::value([0], json!(1)),
            HistoricalStepRecord::value([0], json!(2)),
            HistoricalStepRecord::value(PositionPath::root(), json!(3)),
        ];

        let errors = validate_history(&history, 10);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|err| err.contains("duplicate position path [0]")));
        assert!(errors.iter().any(|err| err.contains("must not be empty")));
    }

    #[test]
    fn validate_accepts_records_after_run() {
        let history = vec![
            HistoricalStepRecord::run([0]),
            HistoricalStepRecord::value([1], json!(1)),
        ];
        assert!(validate_history(&history, 10).is_empty());
    }

    #[test]
    fn validate_enforces_record_limit() {
        let history = vec![
            HistoricalStepRecord::value([0], json!(1)),
            HistoricalStepRecord::value([1], json!(2)),
        ];
        assert_eq!(
            validate_history(&history, 1),
            vec!["history has 2 records (limit 1)".to_string()]
        );
        assert!(validate_history(&history, 2).is_empty());
    }

    impl HistoricalStepRecord {
        fn state_message(&self) -> Option<&str> {
            match &self.state {
                RecordState::Error(err) => Some(err.message()),
                _ => None,
            }
        }
    }
}
