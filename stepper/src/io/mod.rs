//! I/O helpers for the `stepper` binary and embedding hosts.

pub mod config;
pub mod history_store;
