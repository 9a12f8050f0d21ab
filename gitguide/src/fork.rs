//! Clone/bootstrap a repository and fork a remote branch locally.

use anyhow::{Result, anyhow};
use tracing::info;

use crate::FlowOutcome;
use crate::core::names;
use crate::errors::PreconditionError;
use crate::io::git::{GitBackend, RefScope, Vcs};
use crate::io::prompt::Prompter;
use crate::io::style;

pub fn run_fork<P: Prompter>(backend: &GitBackend, ui: &P) -> Result<FlowOutcome> {
    let repo = if backend.is_repository()? {
        backend.clone()
    } else {
        bootstrap_clone(backend, ui)?
    };

    repo.fetch_all()?;
    let remotes = repo.list_refs(RefScope::Remote)?;
    if remotes.is_empty() {
        return Err(anyhow!("no remote branches to fork from"));
    }
    let choice = ui.choose("Which branch would you like to fork from?", &remotes, 0)?;
    let source = remotes[choice].clone();

    let locals = repo.list_refs(RefScope::Local)?;
    let name = loop {
        let typed = ui.line("Name of new local branch")?;
        let candidate = typed.trim();
        if names::is_available_branch_name(candidate, &locals, &remotes) {
            break candidate.to_string();
        }
        println!(
            "{}",
            style::error(&format!(
                "Branch name \"{candidate}\" is invalid or already exists. Try again."
            ))
        );
    };

    repo.create_branch(&name, &source)?;
    info!(branch = %name, source = %source, "fork created");
    println!("{}", style::success("Done!"));
    Ok(FlowOutcome::Completed)
}

/// Not inside a repository yet: clone one and configure identity, then
/// hand back an adapter rooted in the clone.
fn bootstrap_clone<P: Prompter>(backend: &GitBackend, ui: &P) -> Result<GitBackend> {
    let typed = ui.line("Enter remote git repository URL")?;
    let url = typed.trim();
    if url.is_empty() {
        return Err(anyhow!("a repository URL is required"));
    }
    let dir_name = names::clone_dir_name(url);
    let clone_dir = backend.workdir().join(&dir_name);
    if clone_dir.is_dir() {
        return Err(PreconditionError::CloneTargetExists(dir_name).into());
    }
    backend.clone_repository(url, &dir_name)?;
    info!(url, dir = %dir_name, "repository cloned");

    let repo = GitBackend::new(clone_dir);
    repo.set_config("credential.helper", "cache")?;
    let user = ui.line("Enter your name on this project")?;
    let email = loop {
        let candidate = ui.line("Enter your email address on this project")?;
        let candidate = candidate.trim();
        if names::is_plausible_email(candidate) {
            break candidate.to_string();
        }
        println!(
            "{}",
            style::error("That does not look like an email address. Try again.")
        );
    };
    repo.set_config("user.name", user.trim())?;
    repo.set_config("user.email", &email)?;
    Ok(repo)
}
