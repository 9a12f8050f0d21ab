//! Ref selection for a merge attempt.

use thiserror::Error;

/// One merge attempt: where from, where to, and where the user started.
///
/// `origin` is the ref to restore on abort. It is only known when the
/// attempt was created in this run; a resumed merge has no memory of it and
/// abort then stays on the target ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeAttempt {
    pub source: String,
    pub target: String,
    pub origin: String,
}

/// Rejections produced while validating a source/target pair.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("the from-branch and the into-branch must be different")]
    IdenticalRefs,
}

impl MergeAttempt {
    /// Validate and build an attempt. Merging a ref into itself is rejected
    /// here, before any backend call is made.
    pub fn new(source: String, target: String, origin: String) -> Result<Self, SelectionError> {
        if source == target {
            return Err(SelectionError::IdenticalRefs);
        }
        Ok(Self {
            source,
            target,
            origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_refs_are_rejected() {
        let err = MergeAttempt::new("main".into(), "main".into(), "main".into()).unwrap_err();
        assert_eq!(err, SelectionError::IdenticalRefs);
    }

    #[test]
    fn distinct_refs_build_an_attempt() {
        let attempt =
            MergeAttempt::new("feature".into(), "main".into(), "feature".into()).expect("attempt");
        assert_eq!(attempt.source, "feature");
        assert_eq!(attempt.target, "main");
        assert_eq!(attempt.origin, "feature");
    }
}
