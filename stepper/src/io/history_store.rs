//! History load/save helpers with schema + invariant validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::Draft;
use serde_json::Value;
use tracing::debug;

use crate::core::history::{HistoricalStepRecord, validate_history};

/// JSON Schema (Draft 2020-12) every history document must satisfy.
pub const HISTORY_SCHEMA: &str = include_str!("../../schemas/history/v1.schema.json");

/// Load and validate history from disk (schema + invariants).
pub fn load_history(path: &Path, max_records: usize) -> Result<Vec<HistoricalStepRecord>> {
    debug!(path = %path.display(), "loading history");
    let contents =
        fs::read_to_string(path).with_context(|| format!("read history {}", path.display()))?;
    let history = parse_history(&contents, max_records)
        .with_context(|| format!("load history {}", path.display()))?;
    debug!(records = history.len(), "history loaded");
    Ok(history)
}

/// Parse and validate a history document held in memory.
pub fn parse_history(contents: &str, max_records: usize) -> Result<Vec<HistoricalStepRecord>> {
    let value: Value = serde_json::from_str(contents).context("parse history json")?;
    validate_schema(&value)?;
    let history: Vec<HistoricalStepRecord> =
        serde_json::from_value(value).context("deserialize history records")?;
    let errors = validate_history(&history, max_records);
    if !errors.is_empty() {
        return Err(anyhow!("history invariants failed: {}", errors.join("; ")));
    }
    Ok(history)
}

/// Write history to disk as pretty JSON with a trailing newline.
pub fn write_history(path: &Path, history: &[HistoricalStepRecord]) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(history)?;
    buf.push('\n');
    fs::write(path, buf).with_context(|| format!("write history {}", path.display()))
}

fn validate_schema(history: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(HISTORY_SCHEMA).context("parse history schema")?;
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .map_err(|err| anyhow!("invalid history schema: {}", err))?;
    let messages: Vec<String> = compiled
        .iter_errors(history)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        return Err(anyhow!(
            "history schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{SerializedError, TransportedError};
    use serde_json::json;

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("history.json");
        let history = vec![
            HistoricalStepRecord::value([0], json!({"user": 7})),
            HistoricalStepRecord::error(
                [1],
                TransportedError::Serialized(SerializedError {
                    name: "Error".to_string(),
                    message: "boom".to_string(),
                    stack: None,
                }),
            ),
            HistoricalStepRecord::run([2]),
        ];

        write_history(&path, &history).expect("write");
        let loaded = load_history(&path, 100).expect("load");
        assert_eq!(loaded, history);
    }

    #[test]
    fn schema_rejects_records_with_two_outcomes() {
        let err = parse_history(r#"[{"positionPath": [0], "run": true, "value": 1}]"#, 100)
            .expect_err("invalid");
        assert!(err.to_string().contains("schema validation failed"));
    }

    #[test]
    fn schema_rejects_negative_indices() {
        let err = parse_history(r#"[{"positionPath": [-1], "value": 1}]"#, 100)
            .expect_err("invalid");
        assert!(err.to_string().contains("schema validation failed"));
    }

    #[test]
    fn records_after_run_are_accepted() {
        let history = parse_history(
            r#"[{"positionPath": [0], "run": true}, {"positionPath": [1], "value": 2}]"#,
            100,
        )
        .expect("parse");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn invariants_reject_duplicate_paths() {
        let err = parse_history(
            r#"[{"positionPath": [0], "value": 1}, {"positionPath": [0], "value": 2}]"#,
            100,
        )
        .expect_err("invalid");
        assert!(err.to_string().contains("duplicate position path"));
    }

    #[test]
    fn schema_rejects_run_false() {
        let err = parse_history(r#"[{"positionPath": [0], "run": false, "value": 1}]"#, 100)
            .expect_err("invalid");
        assert!(err.to_string().contains("schema validation failed"));
    }

    #[test]
    fn missing_file_reports_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = load_history(&temp.path().join("nope.json"), 100).expect_err("missing");
        assert!(format!("{err:#}").contains("nope.json"));
    }
}
