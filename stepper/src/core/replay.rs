//! Tick-advancing replay of history against the op tree.
//!
//! Each record is matched to a node purely by its absolute position path.
//! After a record settles its node, the context moves to the list that node
//! lives in and every ready continuation is drained, so steps registered from
//! continuations exist before the next record is matched.

use tracing::debug;

use crate::core::error::{DriftError, DriftKind, EngineError, StepError};
use crate::core::history::{HistoricalStepRecord, RecordState};
use crate::core::op_tree::{NodeId, Thunk};
use crate::core::run_state::RunState;

/// Why the replay loop stopped.
pub enum ReplayEnd {
    /// A run record selected this node's thunk for execution now.
    Selected { node: NodeId, thunk: Thunk },
    /// Every record was applied without selecting a step.
    Exhausted,
}

/// Replay `history` from `state.cursor` onwards.
///
/// Fails with [`EngineError::Drift`] when a record cannot be matched, and
/// with [`EngineError::Function`] when a drained continuation fails.
pub fn replay(
    state: &mut RunState,
    history: &[HistoricalStepRecord],
) -> Result<ReplayEnd, EngineError> {
    while let Some(record) = history.get(state.cursor) {
        let index = state.cursor;
        let drift = |kind| DriftError {
            index,
            path: record.position_path.clone(),
            kind,
        };

        let (parent, node) = state
            .tree
            .resolve(record.position_path.indices())
            .map_err(|depth| drift(DriftKind::MissingNode { depth }))?;

        let settlement = match &record.state {
            RecordState::Run => {
                let thunk = state
                    .tree
                    .take_thunk(node)
                    .ok_or_else(|| drift(DriftKind::NotRunnable))?;
                debug!(
                    index,
                    path = %record.position_path,
                    ignored = history.len() - index - 1,
                    "selected step to run"
                );
                return Ok(ReplayEnd::Selected { node, thunk });
            }
            RecordState::Value(value) => Ok(value.clone()),
            RecordState::Error(err) => Err(StepError::from(err)),
        };

        let ready = state
            .tree
            .settle(node, settlement)
            .map_err(|_| drift(DriftKind::AlreadySettled))?;
        debug!(
            index,
            path = %record.position_path,
            continuations = ready.len(),
            "settled step from history"
        );
        state.enqueue(ready);

        let context_path = record.position_path.parent().unwrap_or_default();
        state.enter(parent, context_path);
        state.drain_ready().map_err(EngineError::Function)?;

        state.cursor += 1;
    }
    Ok(ReplayEnd::Exhausted)
}
