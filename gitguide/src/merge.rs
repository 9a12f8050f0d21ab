//! Merge orchestration: drives the state machine against the backend and
//! the prompt surface.
//!
//! The orchestrator owns one merge attempt per invocation. Whether a merge
//! is in progress, and which paths are unresolved, are backend facts that
//! get re-queried at every decision point instead of being cached across
//! steps: the merge tool or manual edits may change them between prompts,
//! and the tool may be re-invoked after a crash with no memory at all.

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument};

use crate::core::machine::{Event, State, transition};
use crate::core::select::{MergeAttempt, SelectionError};
use crate::errors::PreconditionError;
use crate::io::git::{RefScope, TrialOutcome, Vcs};
use crate::io::prompt::{Prompter, required_message};
use crate::io::style;

/// Terminal result of one merge run. Every variant exits 0; fatal failures
/// are errors instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A merge commit was created (clean path or finalized resolution).
    Merged,
    /// The user backed out before any real merge began.
    Cancelled,
    /// The in-progress merge was aborted and the tree restored.
    Aborted,
    /// A merge is still in progress; the user will resolve and re-run.
    AwaitingResolution,
}

/// Run the merge workflow to a terminal state.
#[instrument(skip_all)]
pub fn run_merge<B: Vcs, P: Prompter>(backend: &B, ui: &P) -> Result<MergeOutcome> {
    let mut state = State::Entry;
    let mut attempt: Option<MergeAttempt> = None;
    loop {
        debug!(?state, "merge state");
        if state.is_terminal() {
            return finish(state, backend, ui, attempt.as_ref());
        }
        let event = next_event(state, backend, ui, &mut attempt)?;
        state = transition(state, event)
            .ok_or_else(|| anyhow!("invalid merge transition from {state:?} on {event:?}"))?;
    }
}

fn next_event<B: Vcs, P: Prompter>(
    state: State,
    backend: &B,
    ui: &P,
    attempt: &mut Option<MergeAttempt>,
) -> Result<Event> {
    match state {
        State::Entry => entry_event(backend),
        State::SelectRefs => select_refs_event(backend, ui, attempt),
        State::TrialMerge => trial_event(backend, current_attempt(attempt)?),
        State::CleanConfirm => clean_confirm_event(ui, current_attempt(attempt)?),
        State::ConflictStart => conflict_start_event(backend, ui, current_attempt(attempt)?),
        State::Resume => {
            println!("Merge operation in progress.");
            Ok(Event::Proceed)
        }
        State::ShowUnresolved => show_unresolved_event(backend, ui),
        State::ToolOffered => tool_offered_event(backend, ui),
        State::ToolActive => tool_active_event(backend, ui),
        State::FinalizeCheck => finalize_check_event(backend, ui),
        terminal => Err(anyhow!("no events are produced in {terminal:?}")),
    }
}

/// Entry contract: resume when the backend says a merge is mid-flight;
/// otherwise require a clean tree before anything else happens.
fn entry_event<B: Vcs>(backend: &B) -> Result<Event> {
    let resumable = backend
        .merge_in_progress()
        .context(PreconditionError::NotARepository)?;
    if resumable {
        info!("merge marker found, resuming");
        return Ok(Event::MergeMarkerFound);
    }
    if backend.has_uncommitted_changes()? {
        return Err(PreconditionError::DirtyTree.into());
    }
    Ok(Event::NoMergeMarker)
}

fn select_refs_event<B: Vcs, P: Prompter>(
    backend: &B,
    ui: &P,
    attempt: &mut Option<MergeAttempt>,
) -> Result<Event> {
    let locals = backend.list_refs(RefScope::Local)?;
    if locals.is_empty() {
        return Err(anyhow!("no local branches to merge"));
    }
    let current = backend.current_ref()?;
    println!("Currently on branch: {current}");
    let default = locals.iter().position(|name| *name == current).unwrap_or(0);
    let from = ui.choose("Which branch do you want to merge from?", &locals, default)?;
    let into = ui.choose("Which branch do you want to merge into?", &locals, default)?;
    match MergeAttempt::new(locals[from].clone(), locals[into].clone(), current) {
        Ok(selected) => {
            *attempt = Some(selected);
            Ok(Event::RefsChosen)
        }
        Err(SelectionError::IdenticalRefs) => {
            println!(
                "{}",
                style::error("The from-branch and the into-branch must be different.")
            );
            Ok(Event::SelectionRejected)
        }
    }
}

/// Probe first, then branch the UI: the user is never promised "no
/// conflicts" that a real merge would break, and no real merge starts
/// before they ask for one.
fn trial_event<B: Vcs>(backend: &B, attempt: &MergeAttempt) -> Result<Event> {
    match backend.trial_merge(&attempt.source, &attempt.target)? {
        TrialOutcome::Clean => {
            println!("No merge conflicts detected.");
            Ok(Event::TrialClean)
        }
        TrialOutcome::Conflicted => {
            println!("Merge conflicts detected. You will need to resolve them before you can merge.");
            Ok(Event::TrialConflicted)
        }
    }
}

fn clean_confirm_event<P: Prompter>(ui: &P, attempt: &MergeAttempt) -> Result<Event> {
    if ui.confirm(&format!(
        "Merge {} into {}?",
        attempt.source, attempt.target
    ))? {
        Ok(Event::Confirmed)
    } else {
        Ok(Event::Declined)
    }
}

fn conflict_start_event<B: Vcs, P: Prompter>(
    backend: &B,
    ui: &P,
    attempt: &MergeAttempt,
) -> Result<Event> {
    if !ui.confirm("Start merge operation?")? {
        return Ok(Event::StartDeclined);
    }
    backend.start_real_merge(&attempt.source, &attempt.target)?;
    info!(source = %attempt.source, target = %attempt.target, "real merge started");
    list_paths(
        "Files with unresolved merge conflicts:",
        &backend.unresolved_paths()?,
    );
    if backend.merge_tool_name()?.is_some() {
        Ok(Event::StartedWithTool)
    } else {
        println!(
            "{}",
            style::warn("No merge tool is configured (git config merge.tool).")
        );
        Ok(Event::StartedWithoutTool)
    }
}

fn show_unresolved_event<B: Vcs, P: Prompter>(backend: &B, ui: &P) -> Result<Event> {
    let unresolved = backend.unresolved_paths()?;
    if unresolved.is_empty() {
        println!("All conflicts appear to be resolved.");
    } else {
        list_paths("The following files are marked as unresolved:", &unresolved);
    }
    if ui.confirm("Abort merge?")? {
        return Ok(Event::AbortRequested);
    }
    if unresolved.is_empty() {
        return Ok(Event::AllResolved);
    }
    if backend.merge_tool_name()?.is_some() {
        Ok(Event::ConflictsRemain)
    } else {
        Ok(Event::NoToolConfigured)
    }
}

fn tool_offered_event<B: Vcs, P: Prompter>(backend: &B, ui: &P) -> Result<Event> {
    let tool = backend
        .merge_tool_name()?
        .unwrap_or_else(|| "the configured merge tool".to_string());
    if ui.confirm(&format!("Resolve conflicts using {tool}?"))? {
        Ok(Event::ToolAccepted)
    } else {
        Ok(Event::ToolDeclined)
    }
}

fn tool_active_event<B: Vcs, P: Prompter>(backend: &B, ui: &P) -> Result<Event> {
    let completed = backend.invoke_merge_tool()?;
    if !completed {
        return Ok(Event::ToolGaveUp);
    }
    if ui.confirm("Ready to complete the merge operation?")? {
        return Ok(Event::ReadyToFinalize);
    }
    if ui.confirm("Abort merge?")? {
        return Ok(Event::AbortRequested);
    }
    Ok(Event::KeepEditing)
}

/// The finalize gate: an explicit confirmation plus an independent
/// re-query of the unresolved set. Forcing past residual paths is allowed
/// only after the list has been shown.
fn finalize_check_event<B: Vcs, P: Prompter>(backend: &B, ui: &P) -> Result<Event> {
    if !ui.confirm("Have ALL merge conflicts been resolved and all changes tested?")? {
        return Ok(Event::ResolutionDenied);
    }
    let unresolved = backend.unresolved_paths()?;
    if unresolved.is_empty() {
        return Ok(Event::AllResolved);
    }
    list_paths(
        "The following files are still marked as unresolved:",
        &unresolved,
    );
    if ui.confirm("Mark all files as resolved and merge anyway?")? {
        Ok(Event::ForceAccepted)
    } else {
        Ok(Event::ForceDeclined)
    }
}

fn finish<B: Vcs, P: Prompter>(
    state: State,
    backend: &B,
    ui: &P,
    attempt: Option<&MergeAttempt>,
) -> Result<MergeOutcome> {
    match state {
        State::FinalizeClean => {
            let attempt =
                attempt.ok_or_else(|| anyhow!("clean finalize without a selected attempt"))?;
            backend.switch(&attempt.target)?;
            backend.merge(&attempt.source)?;
            info!(source = %attempt.source, target = %attempt.target, "merge completed");
            println!("{}", style::success("Done!"));
            Ok(MergeOutcome::Merged)
        }
        State::FinalizeMerge => {
            let message = required_message(ui, "Merge commit message")?;
            backend.stage_all()?;
            backend.commit(&message)?;
            backend.clean_untracked()?;
            info!("in-progress merge finalized");
            println!("{}", style::success("Done!"));
            Ok(MergeOutcome::Merged)
        }
        State::AbortMerge => {
            backend.abort_merge()?;
            backend.clean_untracked()?;
            // Restoring the user's starting point is best-effort: a
            // resumed run never knew it and stays on the target ref.
            if let Some(attempt) = attempt {
                backend.switch(&attempt.origin)?;
            }
            info!("merge aborted");
            println!("Merge aborted.");
            Ok(MergeOutcome::Aborted)
        }
        State::Cancelled => {
            println!("Merge canceled.");
            Ok(MergeOutcome::Cancelled)
        }
        State::ManualEditWait => {
            println!(
                "Edit the files to resolve all conflicts, then re-run this command to \
                 complete or abort the merge."
            );
            Ok(MergeOutcome::AwaitingResolution)
        }
        other => Err(anyhow!("finish called on non-terminal state {other:?}")),
    }
}

fn current_attempt(attempt: &Option<MergeAttempt>) -> Result<&MergeAttempt> {
    attempt
        .as_ref()
        .ok_or_else(|| anyhow!("no merge attempt selected yet"))
}

fn list_paths(heading: &str, paths: &[String]) {
    println!("{heading}");
    for path in paths {
        println!("\t{path}");
    }
}
