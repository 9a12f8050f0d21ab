//! Merge workflow state machine.
//!
//! The interactive merge flow is an explicit transition table so the control
//! flow can be tested without driving real prompts or a real backend. States
//! say where the conversation stands; events are the facts the driver
//! observes (user answers, probe outcomes, backend state). The driver in
//! [`crate::merge`] computes one event per non-terminal state and feeds it
//! back through [`transition`].

/// A position in the merge workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Decide between a fresh attempt and resuming an in-progress merge.
    Entry,
    /// Choosing source and target refs for a fresh attempt.
    SelectRefs,
    /// Running the non-destructive trial merge.
    TrialMerge,
    /// Trial was clean; waiting for approval of the real merge.
    CleanConfirm,
    /// Trial conflicted; waiting for the user to start a real merge.
    ConflictStart,
    /// A merge marker was found; context comes from the backend alone.
    Resume,
    /// Presenting the current unresolved set and the abort option.
    ShowUnresolved,
    /// Offering the configured merge tool.
    ToolOffered,
    /// The merge tool ran; deciding what happens next.
    ToolActive,
    /// Verifying resolution before the finalize commit.
    FinalizeCheck,
    /// Terminal: complete a conflict-free merge.
    FinalizeClean,
    /// Terminal: commit the resolved in-progress merge.
    FinalizeMerge,
    /// Terminal: abort the in-progress merge and restore the tree.
    AbortMerge,
    /// Terminal: the user backed out before any real merge began.
    Cancelled,
    /// Terminal: exit while the merge marker stays behind for the next run.
    ManualEditWait,
}

impl State {
    /// Terminal states end the run. The driver performs their closing
    /// actions and never feeds them another event.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            State::FinalizeClean
                | State::FinalizeMerge
                | State::AbortMerge
                | State::Cancelled
                | State::ManualEditWait
        )
    }
}

/// An observed fact that advances the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The backend reports a merge marker; this run resumes it.
    MergeMarkerFound,
    /// No marker; this run starts a fresh attempt.
    NoMergeMarker,
    /// A valid source/target pair was selected.
    RefsChosen,
    /// The selection was rejected (identical refs); ask again.
    SelectionRejected,
    /// The trial merge applied without conflicts.
    TrialClean,
    /// The trial merge hit conflicts.
    TrialConflicted,
    /// The user approved the conflict-free merge.
    Confirmed,
    /// The user declined the conflict-free merge.
    Declined,
    /// The user declined to start a real merge; nothing has been mutated.
    StartDeclined,
    /// The real merge started and a merge tool is configured.
    StartedWithTool,
    /// The real merge started but no merge tool is configured.
    StartedWithoutTool,
    /// Resume bookkeeping done; move on to the unresolved listing.
    Proceed,
    /// The user asked to abort the in-progress merge.
    AbortRequested,
    /// Abort declined and conflicts remain, with a tool to offer.
    ConflictsRemain,
    /// The unresolved set is empty (or independently verified empty).
    AllResolved,
    /// Abort declined, conflicts remain, and there is no tool to offer.
    NoToolConfigured,
    /// The user accepted the merge tool offer.
    ToolAccepted,
    /// The user declined the merge tool offer.
    ToolDeclined,
    /// The tool exited reporting an unfinished merge.
    ToolGaveUp,
    /// The user wants to complete the merge now.
    ReadyToFinalize,
    /// The user wants to keep editing instead of finalizing or aborting.
    KeepEditing,
    /// The user answered that resolution is not complete.
    ResolutionDenied,
    /// Residual unresolved paths were shown and the user overrode them.
    ForceAccepted,
    /// Residual unresolved paths were shown and the user backed off.
    ForceDeclined,
}

/// Transition table for the merge workflow.
///
/// Returns `None` for (state, event) pairs the driver must never produce;
/// the driver reports that as an internal error rather than panicking.
pub fn transition(state: State, event: Event) -> Option<State> {
    use Event as E;
    use State as S;

    match (state, event) {
        (S::Entry, E::MergeMarkerFound) => Some(S::Resume),
        (S::Entry, E::NoMergeMarker) => Some(S::SelectRefs),

        (S::SelectRefs, E::RefsChosen) => Some(S::TrialMerge),
        (S::SelectRefs, E::SelectionRejected) => Some(S::SelectRefs),

        (S::TrialMerge, E::TrialClean) => Some(S::CleanConfirm),
        (S::TrialMerge, E::TrialConflicted) => Some(S::ConflictStart),

        (S::CleanConfirm, E::Confirmed) => Some(S::FinalizeClean),
        (S::CleanConfirm, E::Declined) => Some(S::Cancelled),

        (S::ConflictStart, E::StartDeclined) => Some(S::Cancelled),
        (S::ConflictStart, E::StartedWithTool) => Some(S::ToolOffered),
        (S::ConflictStart, E::StartedWithoutTool) => Some(S::ManualEditWait),

        (S::Resume, E::Proceed) => Some(S::ShowUnresolved),

        (S::ShowUnresolved, E::AbortRequested) => Some(S::AbortMerge),
        (S::ShowUnresolved, E::ConflictsRemain) => Some(S::ToolOffered),
        (S::ShowUnresolved, E::AllResolved) => Some(S::FinalizeCheck),
        (S::ShowUnresolved, E::NoToolConfigured) => Some(S::FinalizeCheck),

        (S::ToolOffered, E::ToolAccepted) => Some(S::ToolActive),
        (S::ToolOffered, E::ToolDeclined) => Some(S::ManualEditWait),

        (S::ToolActive, E::ToolGaveUp) => Some(S::ManualEditWait),
        (S::ToolActive, E::ReadyToFinalize) => Some(S::FinalizeCheck),
        (S::ToolActive, E::AbortRequested) => Some(S::AbortMerge),
        (S::ToolActive, E::KeepEditing) => Some(S::ManualEditWait),

        (S::FinalizeCheck, E::ResolutionDenied) => Some(S::ManualEditWait),
        (S::FinalizeCheck, E::AllResolved) => Some(S::FinalizeMerge),
        (S::FinalizeCheck, E::ForceAccepted) => Some(S::FinalizeMerge),
        (S::FinalizeCheck, E::ForceDeclined) => Some(S::ManualEditWait),

        _ => None,
    }
}
