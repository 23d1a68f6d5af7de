//! Orchestration for a single stateless invocation.
//!
//! Runs the user function once, replays history against the ops it
//! registers, and reports exactly one [`Outcome`].

use serde_json::Value;
use tracing::{debug, info};

use crate::core::codec::ErrorCodec;
use crate::core::error::EngineError;
use crate::core::history::{HistoricalStepRecord, validate_history};
use crate::core::replay::{ReplayEnd, replay};
use crate::core::run_state::RunState;
use crate::core::types::{Outcome, StepOutput};
use crate::io::config::EngineConfig;

/// A function whose body may call step tools.
///
/// The body runs once per invocation. When it calls no tools its return value
/// is the invocation's result; otherwise the return value is ignored and the
/// outcome is driven by history.
pub trait StepFunction {
    fn call(&self, input: &Value, steps: &mut RunState) -> anyhow::Result<Value>;
}

impl<F> StepFunction for F
where
    F: Fn(&Value, &mut RunState) -> anyhow::Result<Value>,
{
    fn call(&self, input: &Value, steps: &mut RunState) -> anyhow::Result<Value> {
        self(input, steps)
    }
}

/// Execution coordinator configured once and reused across invocations.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    codec: ErrorCodec,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let codec = ErrorCodec::new(config.max_error_bytes, config.include_error_stack);
        Self { config, codec }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute the next action for `function` given `input` and `history`.
    ///
    /// Step failures are reported inside [`Outcome::StepResult`]; drift,
    /// invalid history and function failures abort the invocation.
    pub fn execute<F>(
        &self,
        function: &F,
        input: &Value,
        history: &[HistoricalStepRecord],
    ) -> Result<Outcome, EngineError>
    where
        F: StepFunction + ?Sized,
    {
        let errors = validate_history(history, self.config.max_history_records);
        if !errors.is_empty() {
            return Err(EngineError::InvalidHistory(errors));
        }

        let mut state = RunState::new();
        let returned = function.call(input, &mut state);
        if !state.tools_used() {
            let value = returned.map_err(EngineError::Function)?;
            info!("function used no steps; returning single result");
            return Ok(Outcome::Single(value));
        }
        returned.map_err(EngineError::Function)?;
        debug!(
            registered = state.tree.len(),
            records = history.len(),
            "replaying history"
        );

        match replay(&mut state, history)? {
            ReplayEnd::Selected { node, thunk } => {
                let step_id = state.tree.node(node).spec.id.clone();
                let output = match thunk() {
                    Ok(value) => StepOutput::Value(value),
                    Err(err) => {
                        info!(step = %step_id, error = %err, "step failed");
                        StepOutput::Error(self.codec.transport(&err))
                    }
                };
                info!(step = %step_id, "executed step");
                Ok(Outcome::StepResult(output))
            }
            ReplayEnd::Exhausted => {
                let ops = state.discovered();
                info!(discovered = ops.len(), "reporting discovered steps");
                Ok(Outcome::Discovery(ops))
            }
        }
    }
}

/// Run one invocation with the default configuration.
pub fn execute<F>(
    function: &F,
    input: &Value,
    history: &[HistoricalStepRecord],
) -> Result<Outcome, EngineError>
where
    F: StepFunction + ?Sized,
{
    Engine::default().execute(function, input, history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path::PositionPath;
    use crate::core::types::TransportedError;
    use anyhow::anyhow;
    use serde_json::json;

    fn increment(input: &Value, _: &mut RunState) -> anyhow::Result<Value> {
        let x = input["x"].as_i64().ok_or_else(|| anyhow!("x must be an integer"))?;
        Ok(json!(x + 1))
    }

    fn two_steps(_: &Value, steps: &mut RunState) -> anyhow::Result<Value> {
        let a = steps.run("a", || Ok(json!(1)));
        steps.then(a, |steps, _| {
            steps.run("b", || Err(anyhow!("boom")));
            Ok(())
        });
        Ok(Value::Null)
    }

    #[test]
    fn plain_function_returns_single() {
        let outcome = execute(&increment, &json!({"x": 4}), &[]).expect("execute");
        assert_eq!(outcome, Outcome::Single(json!(5)));
    }

    #[test]
    fn plain_function_error_propagates() {
        let err = execute(&increment, &json!({}), &[]).expect_err("error");
        assert!(matches!(err, EngineError::Function(_)));
        assert!(err.to_string().contains("x must be an integer"));
    }

    #[test]
    fn invalid_history_fails_before_running() {
        let history = [
            HistoricalStepRecord::value([0], json!(1)),
            HistoricalStepRecord::value([0], json!(2)),
        ];
        let err = execute(&two_steps, &Value::Null, &history).expect_err("invalid");
        assert!(matches!(err, EngineError::InvalidHistory(_)));
    }

    #[test]
    fn run_record_wins_over_trailing_records() {
        let history = [
            HistoricalStepRecord::run([0]),
            HistoricalStepRecord::value([1], json!(1)),
        ];
        let outcome = execute(&two_steps, &Value::Null, &history).expect("execute");
        assert_eq!(outcome, Outcome::StepResult(StepOutput::Value(json!(1))));
    }

    #[test]
    fn thrown_step_error_becomes_step_result() {
        let history = [
            HistoricalStepRecord::value([0], json!(1)),
            HistoricalStepRecord::run([1]),
        ];
        let outcome = execute(&two_steps, &Value::Null, &history).expect("execute");
        let Outcome::StepResult(StepOutput::Error(TransportedError::Serialized(err))) = outcome
        else {
            panic!("expected serialized step error");
        };
        assert_eq!(err.name, "Error");
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn engine_config_controls_codec() {
        let engine = Engine::new(EngineConfig {
            max_error_bytes: 8,
            ..EngineConfig::default()
        });
        let history = [
            HistoricalStepRecord::value([0], json!(1)),
            HistoricalStepRecord::run([1]),
        ];
        let outcome = engine
            .execute(&two_steps, &Value::Null, &history)
            .expect("execute");
        assert_eq!(
            outcome,
            Outcome::StepResult(StepOutput::Error(TransportedError::Raw("boom".to_string())))
        );
    }

    #[test]
    fn history_limit_comes_from_config() {
        let engine = Engine::new(EngineConfig {
            max_history_records: 1,
            ..EngineConfig::default()
        });
        let history = [
            HistoricalStepRecord::value([0], json!(1)),
            HistoricalStepRecord::value([1], json!(2)),
        ];
        let err = engine
            .execute(&two_steps, &Value::Null, &history)
            .expect_err("too long");
        assert!(err.to_string().contains("limit 1"));
    }

    #[test]
    fn discovery_paths_follow_last_record() {
        let outcome = execute(
            &two_steps,
            &Value::Null,
            &[HistoricalStepRecord::value([0], json!(1))],
        )
        .expect("execute");
        let Outcome::Discovery(ops) = outcome else {
            panic!("expected discovery");
        };
        assert_eq!(ops[0].position_path, PositionPath::from([1]));
    }
}
