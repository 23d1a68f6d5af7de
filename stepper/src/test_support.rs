//! Test-only helpers for building histories and observing settlements.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::history::HistoricalStepRecord;
use crate::core::op_tree::Settlement;
use crate::core::run_state::RunState;
use crate::core::types::{SerializedError, TransportedError};
use crate::io::history_store::write_history;

/// Structured step error with no stack.
pub fn serialized_error(name: &str, message: &str) -> TransportedError {
    TransportedError::Serialized(SerializedError {
        name: name.to_string(),
        message: message.to_string(),
        stack: None,
    })
}

/// Records every settlement delivered to the continuations it hands out.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    seen: Rc<RefCell<Vec<Settlement>>>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continuation that records its settlement and succeeds.
    pub fn sink(&self) -> impl FnOnce(&mut RunState, Settlement) -> Result<()> + 'static {
        let seen = Rc::clone(&self.seen);
        move |_, settlement| {
            seen.borrow_mut().push(settlement);
            Ok(())
        }
    }

    pub fn seen(&self) -> Vec<Settlement> {
        self.seen.borrow().clone()
    }
}

/// Temporary workspace holding history and config files for CLI tests.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp workspace")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `history` as `<name>` inside the workspace.
    pub fn write_history(&self, name: &str, history: &[HistoricalStepRecord]) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        write_history(&path, history)?;
        Ok(path)
    }

    /// Write raw file contents, for malformed-input cases.
    pub fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}
