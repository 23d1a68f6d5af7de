//! Deterministic, pure logic of the execution engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data owned by a single invocation and return deterministic outputs suitable
//! for tests.

pub mod codec;
pub mod error;
pub mod history;
pub mod op_tree;
pub mod path;
pub mod replay;
pub mod run_state;
pub mod tools;
pub mod types;
