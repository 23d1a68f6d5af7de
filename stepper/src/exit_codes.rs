//! Stable exit codes for `stepper` CLI commands.

/// Command succeeded (history valid, or an outcome was produced).
pub const OK: i32 = 0;
/// Invalid input: unreadable or malformed history, config, or input JSON.
pub const INVALID: i32 = 1;
/// History no longer matches the function's step topology.
pub const DRIFT: i32 = 2;
/// The function body (or one of its continuations) failed.
pub const FUNCTION_FAILED: i32 = 3;
