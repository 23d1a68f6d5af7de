//! Arena-backed op tree built during a single invocation.
//!
//! Nodes are stored flat and addressed by [`NodeId`]. The root is implicit:
//! its children are kept in `roots`, so a parent of `None` means "top level".
//! Position paths resolve in O(depth) by indexing child lists.
//!
//! Replay always registers new ops in the list that holds the node a record
//! settled, and the first ops are registered at top level, so every node
//! produced by the step tools is a root and discovery only reports
//! single-element paths. A history path deeper than one element therefore
//! resolves to drift at depth 1. Nested child lists are supported by the
//! tree itself for hosts that build it directly.

use std::fmt;

use serde_json::Value;

use crate::core::error::StepError;
use crate::core::run_state::RunState;
use crate::core::types::OpSpec;

/// Executable body of a `run` step. Only ever present on the invoking side.
pub type Thunk = Box<dyn FnOnce() -> anyhow::Result<Value>>;

/// How a pending step value ended: its value, or the error it failed with.
pub type Settlement = Result<Value, StepError>;

/// Callback attached to a step's pending value with `then`.
pub type Continuation = Box<dyn FnOnce(&mut RunState, Settlement) -> anyhow::Result<()>>;

/// A continuation paired with the settlement it will receive.
pub type ReadyContinuation = (Continuation, Settlement);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

pub struct OpNode {
    pub spec: OpSpec,
    thunk: Option<Thunk>,
    settled: Option<Settlement>,
    continuations: Vec<Continuation>,
    children: Vec<NodeId>,
}

impl OpNode {
    pub fn is_runnable(&self) -> bool {
        self.thunk.is_some()
    }

    pub fn settlement(&self) -> Option<&Settlement> {
        self.settled.as_ref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

impl fmt::Debug for OpNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpNode")
            .field("spec", &self.spec)
            .field("runnable", &self.thunk.is_some())
            .field("settled", &self.settled)
            .field("continuations", &self.continuations.len())
            .field("children", &self.children)
            .finish()
    }
}

/// Node was settled twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadySettled;

#[derive(Debug, Default)]
pub struct OpTree {
    nodes: Vec<OpNode>,
    roots: Vec<NodeId>,
}

impl OpTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &OpNode {
        &self.nodes[id.0]
    }

    /// Child list of `parent`, or the top-level list for `None`.
    pub fn children(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            Some(id) => &self.nodes[id.0].children,
            None => &self.roots,
        }
    }

    /// Append a new pending node to `parent`'s child list.
    pub fn insert(&mut self, parent: Option<NodeId>, spec: OpSpec, thunk: Option<Thunk>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(OpNode {
            spec,
            thunk,
            settled: None,
            continuations: Vec::new(),
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Walk `indices` from the top level.
    ///
    /// Returns the node plus the parent whose list it was found in, or the
    /// depth at which no child existed.
    pub fn resolve(&self, indices: &[usize]) -> Result<(Option<NodeId>, NodeId), usize> {
        let mut parent = None;
        let mut found = None;
        for (depth, &index) in indices.iter().enumerate() {
            if let Some(node) = found {
                parent = Some(node);
            }
            let child = self.children(parent).get(index).copied().ok_or(depth)?;
            found = Some(child);
        }
        found.map(|node| (parent, node)).ok_or(0)
    }

    pub fn take_thunk(&mut self, id: NodeId) -> Option<Thunk> {
        self.nodes[id.0].thunk.take()
    }

    /// Settle `id` and hand back its continuations, now ready to run.
    pub fn settle(
        &mut self,
        id: NodeId,
        settlement: Settlement,
    ) -> Result<Vec<ReadyContinuation>, AlreadySettled> {
        let node = &mut self.nodes[id.0];
        if node.settled.is_some() {
            return Err(AlreadySettled);
        }
        let ready = std::mem::take(&mut node.continuations)
            .into_iter()
            .map(|continuation| (continuation, settlement.clone()))
            .collect();
        node.settled = Some(settlement);
        Ok(ready)
    }

    /// Attach `continuation` to `id`. Returns it back, ready, when the node has
    /// already settled.
    pub fn attach(&mut self, id: NodeId, continuation: Continuation) -> Option<ReadyContinuation> {
        let node = &mut self.nodes[id.0];
        match &node.settled {
            Some(settlement) => Some((continuation, settlement.clone())),
            None => {
                node.continuations.push(continuation);
                None
            }
        }
    }
}
