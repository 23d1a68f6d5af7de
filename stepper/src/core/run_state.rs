//! Per-invocation mutable state, owned by exactly one invocation.
//!
//! The step tools (see [`crate::core::tools`]), the continuations they attach
//! and the replay loop all receive this value by `&mut`; nothing in it
//! outlives the invocation.

use std::collections::VecDeque;
use std::fmt;

use tracing::trace;

use crate::core::op_tree::{NodeId, OpTree, ReadyContinuation};
use crate::core::path::PositionPath;
use crate::core::types::DiscoveredOp;

#[derive(Default)]
pub struct RunState {
    pub(crate) tree: OpTree,
    tools_used: bool,
    /// Index of the next history record to replay.
    pub(crate) cursor: usize,
    /// Node whose child list receives newly registered ops (`None` = top level).
    context: Option<NodeId>,
    context_path: PositionPath,
    ready: VecDeque<ReadyContinuation>,
}

impl fmt::Debug for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunState")
            .field("tree", &self.tree)
            .field("tools_used", &self.tools_used)
            .field("cursor", &self.cursor)
            .field("context", &self.context)
            .field("context_path", &self.context_path)
            .field("ready", &self.ready.len())
            .finish()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once any step tool has been called during this invocation.
    pub fn tools_used(&self) -> bool {
        self.tools_used
    }

    pub(crate) fn mark_tools_used(&mut self) {
        self.tools_used = true;
    }

    pub(crate) fn context(&self) -> Option<NodeId> {
        self.context
    }

    pub fn context_path(&self) -> &PositionPath {
        &self.context_path
    }

    /// Make `node`'s child list, located at `path`, the target for new ops.
    pub(crate) fn enter(&mut self, node: Option<NodeId>, path: PositionPath) {
        self.context = node;
        self.context_path = path;
    }

    pub(crate) fn enqueue(&mut self, ready: impl IntoIterator<Item = ReadyContinuation>) {
        self.ready.extend(ready);
    }

    /// Run ready continuations until none remain, including any that become
    /// ready while draining. Returns how many ran.
    pub(crate) fn drain_ready(&mut self) -> anyhow::Result<usize> {
        let mut ran = 0;
        while let Some((continuation, settlement)) = self.ready.pop_front() {
            continuation(self, settlement)?;
            ran += 1;
        }
        if ran > 0 {
            trace!(ran, "drained continuations");
        }
        Ok(ran)
    }

    /// Unsettled ops under the current context, in registration order.
    pub fn discovered(&self) -> Vec<DiscoveredOp> {
        self.tree
            .children(self.context)
            .iter()
            .enumerate()
            .filter_map(|(index, &id)| {
                let node = self.tree.node(id);
                if node.settlement().is_some() {
                    return None;
                }
                Some(DiscoveredOp {
                    kind: node.spec.kind,
                    id: node.spec.id.clone(),
                    name: node.spec.name.clone(),
                    options: node.spec.options.clone(),
                    run: node.is_runnable(),
                    position_path: self.context_path.child(index),
                })
            })
            .collect()
    }
}
