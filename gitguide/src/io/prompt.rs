//! Interactive prompt surface.
//!
//! The flows depend on [`Prompter`] abstractly so tests can substitute a
//! scripted double; [`TerminalPrompter`] is the real console implementation
//! on top of `dialoguer`.

use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, Select};

use crate::core::message;
use crate::errors::PreconditionError;

/// Synchronous prompt capabilities the flows are written against.
pub trait Prompter {
    /// Choose one of `options`, with the cursor starting on `default`.
    /// Returns the selected index.
    fn choose(&self, prompt: &str, options: &[String], default: usize) -> Result<usize>;
    /// Ask a yes/no question with no preselected answer.
    fn confirm(&self, prompt: &str) -> Result<bool>;
    /// Read a single line; empty input is allowed.
    fn line(&self, prompt: &str) -> Result<String>;
    /// Read a multi-line message, terminated by a blank line.
    fn message(&self, prompt: &str) -> Result<String>;
}

/// Console implementation used by the real CLI.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn choose(&self, prompt: &str, options: &[String], default: usize) -> Result<usize> {
        Select::new()
            .with_prompt(prompt)
            .items(options)
            .default(default)
            .interact()
            .context("read selection")
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .interact()
            .context("read confirmation")
    }

    fn line(&self, prompt: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .context("read input")
    }

    fn message(&self, prompt: &str) -> Result<String> {
        println!("{prompt} (finish with an empty line):");
        let mut lines = Vec::new();
        loop {
            let line: String = Input::new()
                .with_prompt(">>>")
                .allow_empty(true)
                .interact_text()
                .context("read message line")?;
            if line.trim().is_empty() {
                break;
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }
}

/// Read a message and enforce the non-empty rule applied at every
/// message-entry point.
pub fn required_message<P: Prompter>(ui: &P, prompt: &str) -> Result<String> {
    let raw = ui.message(prompt)?;
    match message::non_empty(&raw) {
        Some(msg) => Ok(msg.to_string()),
        None => Err(PreconditionError::EmptyMessage.into()),
    }
}
