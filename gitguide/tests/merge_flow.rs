//! End-to-end merge orchestration tests against scripted doubles.
//!
//! Every scenario drives `run_merge` with a `FakeVcs` repository model and
//! a `ScriptedPrompter`, then asserts on the terminal outcome, the backend
//! call order, and the repository state left behind.

use gitguide::errors::PreconditionError;
use gitguide::merge::{MergeOutcome, run_merge};
use gitguide::test_support::{Answer, FakeRepo, FakeVcs, ScriptedPrompter};

fn position(calls: &[String], needle: &str) -> usize {
    calls
        .iter()
        .position(|call| call == needle)
        .unwrap_or_else(|| panic!("expected call '{needle}' in {calls:?}"))
}

/// Selecting the same ref for both sides is rejected and re-prompted, and
/// the trial merge never runs for the rejected pair.
#[test]
fn identical_refs_reprompt_without_trial() {
    let backend = FakeVcs::new(FakeRepo::default());
    let ui = ScriptedPrompter::new(vec![
        Answer::Choice(0), // from: main
        Answer::Choice(0), // into: main (rejected)
        Answer::Choice(1), // from: feature
        Answer::Choice(0), // into: main
        Answer::Confirm(false),
    ]);

    let outcome = run_merge(&backend, &ui).expect("merge run");
    assert_eq!(outcome, MergeOutcome::Cancelled);
    assert!(ui.exhausted());

    let calls = backend.calls();
    let trials: Vec<_> = calls
        .iter()
        .filter(|call| call.starts_with("trial_merge"))
        .collect();
    assert_eq!(
        trials,
        vec!["trial_merge feature main"],
        "only the valid pair is probed"
    );
    assert!(!backend.snapshot().merge_marker);
}

/// Non-overlapping edits: the trial reports clean, the user confirms, and
/// the orchestrator switches to the target and merges with no marker left.
#[test]
fn clean_trial_then_confirmed_merge() {
    let backend = FakeVcs::new(FakeRepo::default());
    let ui = ScriptedPrompter::new(vec![
        Answer::Choice(1), // from: feature
        Answer::Choice(0), // into: main
        Answer::Confirm(true),
    ]);

    let outcome = run_merge(&backend, &ui).expect("merge run");
    assert_eq!(outcome, MergeOutcome::Merged);

    let calls = backend.calls();
    let trial = position(&calls, "trial_merge feature main");
    let switch = position(&calls, "switch main");
    let merge = position(&calls, "merge feature");
    assert!(trial < switch && switch < merge, "probe before mutation");

    let state = backend.snapshot();
    assert!(!state.merge_marker, "no residual marker after a clean merge");
    assert_eq!(state.current, "main");
}

/// Two fresh runs over identical repositories produce the same prompt
/// sequence and the same backend call order.
#[test]
fn fresh_runs_are_idempotent() {
    let script = || {
        ScriptedPrompter::new(vec![
            Answer::Choice(1),
            Answer::Choice(0),
            Answer::Confirm(false),
        ])
    };

    let first_backend = FakeVcs::new(FakeRepo::default());
    let first_ui = script();
    let first = run_merge(&first_backend, &first_ui).expect("first run");

    let second_backend = FakeVcs::new(FakeRepo::default());
    let second_ui = script();
    let second = run_merge(&second_backend, &second_ui).expect("second run");

    assert_eq!(first, second);
    assert_eq!(first_ui.prompts(), second_ui.prompts());
    assert_eq!(first_backend.calls(), second_backend.calls());
}

/// Conflicting edits: a real merge starts, the unresolved set is surfaced,
/// the user declines the tool and exits; the next invocation resumes from
/// backend state alone and reproduces the same unresolved set.
#[test]
fn conflicted_merge_is_resumable_across_runs() {
    let repo = FakeRepo::default().with_conflict("feature", "main", &["a.txt"]);
    let backend = FakeVcs::new(repo);

    let first_ui = ScriptedPrompter::new(vec![
        Answer::Choice(1),      // from: feature
        Answer::Choice(0),      // into: main
        Answer::Confirm(true),  // start merge operation
        Answer::Confirm(false), // decline the merge tool
    ]);
    let first = run_merge(&backend, &first_ui).expect("first run");
    assert_eq!(first, MergeOutcome::AwaitingResolution);

    let state = backend.snapshot();
    assert!(state.merge_marker, "marker persists for the next run");
    assert_eq!(state.unresolved, vec!["a.txt"]);

    // Second invocation: no ref selection, straight to resume.
    let second_ui = ScriptedPrompter::new(vec![
        Answer::Confirm(false), // abort?
        Answer::Confirm(false), // decline the merge tool again
    ]);
    let second = run_merge(&backend, &second_ui).expect("second run");
    assert_eq!(second, MergeOutcome::AwaitingResolution);
    assert!(
        second_ui
            .prompts()
            .iter()
            .all(|p| !p.contains("merge from")),
        "resume skips ref selection"
    );
    assert_eq!(backend.snapshot().unresolved, vec!["a.txt"]);
}

/// Resume, run the tool, confirm, and finalize: commit-then-clean leaves no
/// marker and an empty unresolved set.
#[test]
fn resumed_merge_finalizes_after_tool_resolution() {
    let repo = FakeRepo {
        merge_marker: true,
        unresolved: vec!["a.txt".to_string()],
        ..FakeRepo::default()
    };
    let backend = FakeVcs::new(repo);
    let ui = ScriptedPrompter::new(vec![
        Answer::Confirm(false), // abort?
        Answer::Confirm(true),  // resolve with the tool
        Answer::Confirm(true),  // ready to complete
        Answer::Confirm(true),  // all resolved and tested
        Answer::Message("Merge feature work".to_string()),
    ]);

    let outcome = run_merge(&backend, &ui).expect("merge run");
    assert_eq!(outcome, MergeOutcome::Merged);

    let calls = backend.calls();
    let stage = position(&calls, "stage_all");
    let commit = position(&calls, "commit Merge feature work");
    let clean = position(&calls, "clean_untracked");
    assert!(stage < commit && commit < clean, "stage, commit, then clean");

    let state = backend.snapshot();
    assert!(!state.merge_marker);
    assert!(state.unresolved.is_empty());
    assert_eq!(state.commits, vec!["Merge feature work"]);
}

/// Aborting from resume clears the marker and cleans untracked artifacts;
/// with no remembered origin the tree stays where the backend left it.
#[test]
fn abort_from_resume_cleans_without_switching() {
    let repo = FakeRepo {
        merge_marker: true,
        unresolved: vec!["a.txt".to_string()],
        ..FakeRepo::default()
    };
    let backend = FakeVcs::new(repo);
    let ui = ScriptedPrompter::new(vec![Answer::Confirm(true)]);

    let outcome = run_merge(&backend, &ui).expect("merge run");
    assert_eq!(outcome, MergeOutcome::Aborted);

    let calls = backend.calls();
    let abort = position(&calls, "abort_merge");
    let clean = position(&calls, "clean_untracked");
    assert!(abort < clean, "clean always follows abort");
    assert!(
        !calls.iter().any(|call| call.starts_with("switch")),
        "origin unknown on resume, no switch"
    );
    assert!(!backend.snapshot().merge_marker);
}

/// Aborting a merge started in the same run restores the ref the user was
/// on when the attempt began, as the final step.
#[test]
fn abort_in_same_run_restores_origin_ref() {
    let repo = FakeRepo {
        current: "feature".to_string(),
        ..FakeRepo::default()
    }
    .with_conflict("feature", "main", &["a.txt"]);
    let backend = FakeVcs::new(repo);
    let ui = ScriptedPrompter::new(vec![
        Answer::Choice(1),      // from: feature
        Answer::Choice(0),      // into: main
        Answer::Confirm(true),  // start merge operation
        Answer::Confirm(true),  // resolve with the tool
        Answer::Confirm(false), // not ready to complete
        Answer::Confirm(true),  // abort
    ]);

    let outcome = run_merge(&backend, &ui).expect("merge run");
    assert_eq!(outcome, MergeOutcome::Aborted);

    let calls = backend.calls();
    let abort = position(&calls, "abort_merge");
    let clean = position(&calls, "clean_untracked");
    let restore = calls
        .iter()
        .rposition(|call| call == "switch feature")
        .expect("restore switch");
    assert!(abort < clean && clean < restore, "switch back is last");
    assert_eq!(backend.snapshot().current, "feature");
}

/// With no merge tool configured, resume goes straight to the finalize
/// check, and residual unresolved paths can only be overridden after the
/// list is shown again.
#[test]
fn forced_finalize_requires_showing_residual_list() {
    let repo = FakeRepo {
        merge_marker: true,
        unresolved: vec!["a.txt".to_string()],
        merge_tool: None,
        ..FakeRepo::default()
    };
    let backend = FakeVcs::new(repo);
    let ui = ScriptedPrompter::new(vec![
        Answer::Confirm(false), // abort?
        Answer::Confirm(true),  // claims everything is resolved
        Answer::Confirm(true),  // override the residual list
        Answer::Message("Forced merge".to_string()),
    ]);

    let outcome = run_merge(&backend, &ui).expect("merge run");
    assert_eq!(outcome, MergeOutcome::Merged);
    assert!(
        ui.prompts()
            .iter()
            .any(|p| p.contains("merge anyway")),
        "override is offered only via the explicit prompt"
    );
    assert_eq!(backend.snapshot().commits, vec!["Forced merge"]);
}

/// A merge tool that exits reporting failure sends the user back to manual
/// editing and keeps the merge resumable.
#[test]
fn failing_tool_leaves_merge_resumable() {
    let repo = FakeRepo {
        merge_marker: true,
        unresolved: vec!["a.txt".to_string()],
        tool_resolves: false,
        tool_exit_ok: false,
        ..FakeRepo::default()
    };
    let backend = FakeVcs::new(repo);
    let ui = ScriptedPrompter::new(vec![
        Answer::Confirm(false), // abort?
        Answer::Confirm(true),  // run the tool
    ]);

    let outcome = run_merge(&backend, &ui).expect("merge run");
    assert_eq!(outcome, MergeOutcome::AwaitingResolution);
    let state = backend.snapshot();
    assert!(state.merge_marker);
    assert_eq!(state.unresolved, vec!["a.txt"]);
}

/// An empty finalize message is a fatal precondition failure; the merge
/// stays in progress for the next run.
#[test]
fn empty_finalize_message_is_fatal() {
    let repo = FakeRepo {
        merge_marker: true,
        unresolved: Vec::new(),
        ..FakeRepo::default()
    };
    let backend = FakeVcs::new(repo);
    let ui = ScriptedPrompter::new(vec![
        Answer::Confirm(false), // abort?
        Answer::Confirm(true),  // all resolved
        Answer::Message("   ".to_string()),
    ]);

    let err = run_merge(&backend, &ui).unwrap_err();
    assert_eq!(
        err.downcast_ref::<PreconditionError>(),
        Some(&PreconditionError::EmptyMessage)
    );
    assert!(backend.snapshot().merge_marker, "merge stays resumable");
}

/// A dirty tree blocks a fresh merge before any prompt or probe.
#[test]
fn dirty_tree_fails_fast_on_fresh_start() {
    let repo = FakeRepo {
        dirty: true,
        ..FakeRepo::default()
    };
    let backend = FakeVcs::new(repo);
    let ui = ScriptedPrompter::new(Vec::new());

    let err = run_merge(&backend, &ui).unwrap_err();
    assert_eq!(
        err.downcast_ref::<PreconditionError>(),
        Some(&PreconditionError::DirtyTree)
    );
    assert!(ui.prompts().is_empty(), "no prompt before the guard");
    assert!(
        !backend.calls().iter().any(|c| c.starts_with("trial_merge")),
        "no probe before the guard"
    );
}

/// A dirty tree does not block resumption: mid-merge trees are dirty by
/// definition.
#[test]
fn dirty_tree_does_not_block_resume() {
    let repo = FakeRepo {
        dirty: true,
        merge_marker: true,
        unresolved: Vec::new(),
        ..FakeRepo::default()
    };
    let backend = FakeVcs::new(repo);
    let ui = ScriptedPrompter::new(vec![
        Answer::Confirm(false), // abort?
        Answer::Confirm(true),  // all resolved
        Answer::Message("Wrap up".to_string()),
    ]);

    let outcome = run_merge(&backend, &ui).expect("merge run");
    assert_eq!(outcome, MergeOutcome::Merged);
    assert!(!backend.snapshot().merge_marker);
}
