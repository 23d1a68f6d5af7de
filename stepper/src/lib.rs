//! Durable multi-step function execution core.
//!
//! A user function is re-run from the top on every stateless invocation. The
//! steps it registers are matched by position against an orchestrator-held
//! history, and the invocation reports exactly one [`Outcome`]: a single
//! result, the result of the one step selected to run now, or the steps it
//! newly discovered. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (op tree, step tools, replay,
//!   error transport). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (history files, configuration).
//!
//! [`execute`] coordinates one invocation; [`catalog`] holds the functions the
//! `stepper` binary can run.

pub mod catalog;
pub mod core;
pub mod execute;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::core::error::{DriftError, DriftKind, EngineError, StepError};
pub use crate::core::history::{HistoricalStepRecord, RecordState};
pub use crate::core::path::PositionPath;
pub use crate::core::run_state::RunState;
pub use crate::core::tools::StepHandle;
pub use crate::core::types::{
    DiscoveredOp, OpKind, Outcome, SerializedError, StepOutput, TransportedError,
};
pub use crate::execute::{Engine, StepFunction, execute};
