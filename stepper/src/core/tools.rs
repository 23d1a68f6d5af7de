//! Step tools exposed to user functions.
//!
//! Every tool registers a pending op under the current context, in call order,
//! and returns a [`StepHandle`]. Ops are matched against history by position
//! only; ids are never deduplicated.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::core::op_tree::{NodeId, Settlement, Thunk};
use crate::core::run_state::RunState;
use crate::core::types::{OpKind, OpSpec};

/// Deferred value of a registered step. Consume it with [`RunState::then`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepHandle(NodeId);

impl RunState {
    /// Register a runnable unit of work identified by `id`.
    ///
    /// The thunk only executes when history selects this step to run now.
    pub fn run<F>(&mut self, id: impl Into<String>, thunk: F) -> StepHandle
    where
        F: FnOnce() -> anyhow::Result<Value> + 'static,
    {
        let id = id.into();
        let spec = OpSpec {
            kind: OpKind::Step,
            name: id.clone(),
            id,
            options: Map::new(),
        };
        self.register(spec, Some(Box::new(thunk)))
    }

    /// Register an orchestrator-side pause. Resolves when history says so.
    pub fn sleep(&mut self, id: impl Into<String>, duration: Duration) -> StepHandle {
        let id = id.into();
        let mut options = Map::new();
        options.insert(
            "duration".to_string(),
            Value::String(humantime::format_duration(duration).to_string()),
        );
        let spec = OpSpec {
            kind: OpKind::Sleep,
            name: id.clone(),
            id,
            options,
        };
        self.register(spec, None)
    }

    /// Register a wait for an external `event`, optionally filtered by a
    /// `matcher` expression the orchestrator evaluates.
    pub fn wait_for_event(
        &mut self,
        id: impl Into<String>,
        event: impl Into<String>,
        timeout: Duration,
        matcher: Option<&str>,
    ) -> StepHandle {
        let event = event.into();
        let mut options = Map::new();
        options.insert("event".to_string(), Value::String(event.clone()));
        options.insert(
            "timeout".to_string(),
            Value::String(humantime::format_duration(timeout).to_string()),
        );
        if let Some(matcher) = matcher {
            options.insert("match".to_string(), Value::String(matcher.to_string()));
        }
        let spec = OpSpec {
            kind: OpKind::WaitForEvent,
            id: id.into(),
            name: event,
            options,
        };
        self.register(spec, None)
    }

    /// Attach a continuation to `handle`'s pending value.
    ///
    /// The continuation runs when the step settles during replay, or on the
    /// next drain if it has already settled. It may register further steps.
    pub fn then<F>(&mut self, handle: StepHandle, continuation: F)
    where
        F: FnOnce(&mut RunState, Settlement) -> anyhow::Result<()> + 'static,
    {
        if let Some(ready) = self.tree.attach(handle.0, Box::new(continuation)) {
            self.enqueue([ready]);
        }
    }

    fn register(&mut self, spec: OpSpec, thunk: Option<Thunk>) -> StepHandle {
        self.mark_tools_used();
        let node = self.tree.insert(self.context(), spec, thunk);
        StepHandle(node)
    }
}
