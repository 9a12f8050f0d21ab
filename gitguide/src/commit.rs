//! Stage-everything commit flow with double confirmation.

use anyhow::{Context, Result};
use tracing::info;

use crate::FlowOutcome;
use crate::core::message;
use crate::errors::PreconditionError;
use crate::io::git::{GitBackend, Vcs};
use crate::io::prompt::Prompter;
use crate::io::style;

pub fn run_commit<P: Prompter>(backend: &GitBackend, ui: &P) -> Result<FlowOutcome> {
    backend
        .stage_all()
        .context(PreconditionError::NotARepository)?;
    print!("{}", backend.status_text()?);

    if !ui.confirm("Commit all file changes?")? {
        return cancel(backend);
    }

    let raw = ui.message("Enter commit message")?;
    let Some(text) = message::non_empty(&raw) else {
        // Unwind the staging before failing, so the fatal exit leaves no
        // partial mutation behind.
        backend.unstage_all()?;
        return Err(PreconditionError::EmptyMessage.into());
    };
    let text = text.to_string();

    println!();
    println!("Changed files:");
    print!("{}", backend.status_text()?);
    println!();
    println!("Commit message:");
    println!("{text}");
    println!();
    if !ui.confirm("Confirm?")? {
        return cancel(backend);
    }

    backend.commit(&text)?;
    info!("changes committed");
    println!("{}", style::success("Done!"));
    Ok(FlowOutcome::Completed)
}

fn cancel(backend: &GitBackend) -> Result<FlowOutcome> {
    backend.unstage_all()?;
    println!("Commit canceled.");
    Ok(FlowOutcome::Cancelled)
}
