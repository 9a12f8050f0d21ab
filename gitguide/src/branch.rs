//! Interactive branch creation from any commit of a chosen base branch.

use anyhow::{Context, Result, anyhow};
use tracing::info;

use crate::FlowOutcome;
use crate::core::history::{self, PAGE_SIZE, PageSelection};
use crate::core::names;
use crate::errors::PreconditionError;
use crate::io::git::{GitBackend, RefScope, Vcs};
use crate::io::prompt::Prompter;
use crate::io::style;

pub fn run_branch<P: Prompter>(backend: &GitBackend, ui: &P) -> Result<FlowOutcome> {
    let dirty = backend
        .has_uncommitted_changes()
        .context(PreconditionError::NotARepository)?;
    if dirty {
        return Err(PreconditionError::DirtyTree.into());
    }

    let current = backend.current_ref()?;
    let locals = backend.list_refs(RefScope::Local)?;
    let mut options = vec![format!("current branch ({current})")];
    options.extend(locals.iter().cloned());
    let choice = ui.choose("Which branch do you want to branch from?", &options, 0)?;
    let base = if choice == 0 {
        current
    } else {
        locals[choice - 1].clone()
    };

    let entries = backend.history(&base)?;
    if entries.is_empty() {
        return Err(anyhow!("branch \"{base}\" has no commits"));
    }
    let displays: Vec<String> = entries.iter().map(|e| e.display.clone()).collect();
    let picked = &entries[pick_commit(ui, &displays)?];
    println!("Branching from commit:");
    println!("{}", picked.display);

    let typed = ui.line("New branch name? (leave blank to auto-name)")?;
    let name = if typed.trim().is_empty() {
        let remotes = backend.list_refs(RefScope::Remote)?;
        names::unique_branch_name(&base, &locals, &remotes)
    } else {
        typed.trim().to_string()
    };

    if !ui.confirm(&format!(
        "Create new branch {name} from commit {}?",
        short_hash(&picked.hash)
    ))? {
        println!("Branch creation canceled.");
        return Ok(FlowOutcome::Cancelled);
    }
    backend.create_branch(&name, &picked.hash)?;
    info!(branch = %name, "branch created");
    println!("Branch {name} successfully created!");
    println!("{}", style::success("Done!"));
    Ok(FlowOutcome::Completed)
}

/// Walk the history pager until the user lands on a commit. Selecting the
/// HEAD sentinel means the newest commit.
fn pick_commit<P: Prompter>(ui: &P, entries: &[String]) -> Result<usize> {
    let mut start = 0;
    loop {
        let page = history::page(entries, start, PAGE_SIZE);
        let choice = ui.choose("Choose a commit to branch from:", &page.options, 0)?;
        match page
            .selection(choice)
            .ok_or_else(|| anyhow!("selection out of range"))?
        {
            PageSelection::Head => return Ok(0),
            PageSelection::Previous => start = page.prev_start(PAGE_SIZE),
            PageSelection::Next => start = page.next_start(),
            PageSelection::Entry(index) => return Ok(index),
        }
    }
}

fn short_hash(hash: &str) -> &str {
    &hash[..hash.len().min(7)]
}
