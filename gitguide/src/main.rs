//! Guided git workflows for non-expert users.
//!
//! One interactive subcommand per workflow; every decision is made through
//! sequential prompts, never flags.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use gitguide::io::git::GitBackend;
use gitguide::io::prompt::TerminalPrompter;
use gitguide::io::style;
use gitguide::{branch, commit, exit_codes, fork, logging, merge, push};

#[derive(Parser)]
#[command(
    name = "gitguide",
    version,
    about = "Guided git workflows for non-expert users"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge one branch into another, with conflict-aware hand-holding.
    Merge,
    /// Create a branch from any commit of a chosen base branch.
    Branch,
    /// Stage everything and commit with a confirmed message.
    Commit,
    /// Clone and configure a repository, then branch from a remote ref.
    Fork,
    /// Push the current work to a remote branch, optionally squashed.
    Push,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{}", style::error(&format!("{err:#}")));
        std::process::exit(exit_codes::FATAL);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let workdir = std::env::current_dir().context("determine working directory")?;
    let backend = GitBackend::new(workdir);
    let ui = TerminalPrompter;
    match cli.command {
        Command::Merge => {
            merge::run_merge(&backend, &ui)?;
        }
        Command::Branch => {
            branch::run_branch(&backend, &ui)?;
        }
        Command::Commit => {
            commit::run_commit(&backend, &ui)?;
        }
        Command::Fork => {
            fork::run_fork(&backend, &ui)?;
        }
        Command::Push => {
            push::run_push(&backend, &ui)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_merge() {
        let cli = Cli::parse_from(["gitguide", "merge"]);
        assert!(matches!(cli.command, Command::Merge));
    }

    #[test]
    fn parse_push() {
        let cli = Cli::parse_from(["gitguide", "push"]);
        assert!(matches!(cli.command, Command::Push));
    }
}
