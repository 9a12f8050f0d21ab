//! Fatal precondition failures shared by the interactive flows.

use thiserror::Error;

/// Violations of a flow's entry or input contract. Always fatal: reported
/// to the user, the process exits non-zero, and no partial mutation is left
/// behind.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("not inside a git repository")]
    NotARepository,
    #[error("uncommitted changes detected; commit or stash them first")]
    DirtyTree,
    #[error("empty messages are not allowed")]
    EmptyMessage,
    #[error("directory \"{0}\" already exists")]
    CloneTargetExists(String),
}
