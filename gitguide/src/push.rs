//! Push the current branch to a remote, optionally via a squash merge.

use anyhow::{Context, Result, anyhow};
use tracing::info;

use crate::FlowOutcome;
use crate::core::names;
use crate::errors::PreconditionError;
use crate::io::git::{GitBackend, RefScope, Vcs};
use crate::io::prompt::{Prompter, required_message};
use crate::io::style;

pub fn run_push<P: Prompter>(backend: &GitBackend, ui: &P) -> Result<FlowOutcome> {
    let dirty = backend
        .has_uncommitted_changes()
        .context(PreconditionError::NotARepository)?;
    if dirty {
        return Err(PreconditionError::DirtyTree.into());
    }

    let remote = backend.remote_name()?;
    backend.fetch_all()?;
    let current = backend.current_ref()?;
    let remotes = backend.list_refs(RefScope::Remote)?;
    println!("Currently on branch: {current}");

    let mut options = vec![String::from("(new branch)")];
    options.extend(remotes.iter().cloned());
    let choice = ui.choose("Choose branch to push to:", &options, 0)?;
    if choice == 0 {
        return push_new_branch(backend, ui, &remote, &current);
    }
    let push_branch = &remotes[choice - 1];

    if !ui.confirm(&format!(
        "Push from local branch {current} to remote branch {push_branch}?"
    ))? {
        println!("Push canceled.");
        return Ok(FlowOutcome::Cancelled);
    }

    let squash_message = if ui.confirm("Squash push into a single commit?")? {
        Some(required_message(ui, "Enter squashed commit message")?)
    } else {
        None
    };

    let local_target = names::local_name(push_branch).to_string();
    if current == local_target {
        backend.pull(&remote, &local_target)?;
    } else {
        backend.switch(&local_target)?;
        backend.pull(&remote, &local_target)?;
        merge_into_target(backend, &current, &local_target, squash_message.as_deref())?;
    }

    backend.push(&remote, &local_target)?;
    info!(branch = %local_target, remote = %remote, "pushed");

    if current != local_target {
        offer_branch_cleanup(backend, ui, &remote, &current, &remotes)?;
    }
    println!("{}", style::success("Done!"));
    Ok(FlowOutcome::Completed)
}

fn push_new_branch<P: Prompter>(
    backend: &GitBackend,
    ui: &P,
    remote: &str,
    current: &str,
) -> Result<FlowOutcome> {
    let name = loop {
        let typed = ui.line("New branch name")?;
        let candidate = typed.trim();
        if !candidate.is_empty() {
            break candidate.to_string();
        }
        println!("{}", style::error("A branch name is required."));
    };
    if !ui.confirm(&format!(
        "Push from local branch {current} to new remote branch {name}?"
    ))? {
        println!("Push canceled.");
        return Ok(FlowOutcome::Cancelled);
    }
    backend.push_with_upstream(remote, &format!("{current}:{name}"))?;
    info!(branch = %name, remote = %remote, "new upstream branch pushed");
    println!("{}", style::success("Done!"));
    Ok(FlowOutcome::Completed)
}

/// Bring `current` into the checked-out `target`, squashed or not. A
/// conflicted merge unwinds completely and fails the flow: conflict
/// resolution belongs to the merge command, not here.
fn merge_into_target(
    backend: &GitBackend,
    current: &str,
    target: &str,
    squash_message: Option<&str>,
) -> Result<()> {
    match squash_message {
        Some(message) => {
            backend.squash_merge(current)?;
            backend.commit(message)?;
        }
        None => {
            // Generated, never user-entered, so non-empty by construction.
            let message = format!("Merge from {current} to {target}");
            if !backend.merge_with_message(current, &message)? {
                backend.abort_merge()?;
                backend.clean_untracked()?;
                backend.switch(current)?;
                println!(
                    "Please merge from {target} into {current} and resolve conflicts, then try again."
                );
                return Err(anyhow!("unable to cleanly merge {current} into {target}"));
            }
        }
    }
    Ok(())
}

/// After a cross-branch push: offer to delete the working branch, or to
/// push it too (with upstream tracking when it has no remote counterpart).
fn offer_branch_cleanup<P: Prompter>(
    backend: &GitBackend,
    ui: &P,
    remote: &str,
    current: &str,
    remotes: &[String],
) -> Result<()> {
    if ui.confirm(&format!("Delete branch {current}?"))? {
        backend.delete_branch(current)?;
        return Ok(());
    }
    backend.switch(current)?;
    let has_counterpart = remotes.iter().any(|r| names::local_name(r) == current);
    if has_counterpart {
        if ui.confirm("Push this branch as well?")? {
            backend.push(remote, current)?;
        }
    } else if ui.confirm("Add this branch to the remote repository?")? {
        backend.push_with_upstream(remote, current)?;
    }
    Ok(())
}
