//! Stable exit codes for the CLI.

/// A flow reached a terminal state, including user-requested cancellation
/// and exits that leave a merge in progress for the next run.
pub const OK: i32 = 0;
/// Fatal precondition or backend failure; no flow outcome was reached.
pub const FATAL: i32 = 1;
