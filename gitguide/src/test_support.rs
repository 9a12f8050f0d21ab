//! Scripted doubles for the prompt surface and the VCS backend.
//!
//! [`ScriptedPrompter`] replays a fixed answer sequence; [`FakeVcs`] is an
//! in-memory repository model whose merge-marker and unresolved-set
//! bookkeeping evolves the way the real backend's would. Both record what
//! they were asked so tests can assert on ordering.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::{Result, bail};

use crate::io::git::{BackendError, RefScope, TrialOutcome, Vcs};
use crate::io::prompt::Prompter;

/// One scripted answer for a [`ScriptedPrompter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Choice(usize),
    Confirm(bool),
    Line(String),
    Message(String),
}

/// Prompter that replays a fixed sequence of answers and records the
/// prompts it was asked.
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<Answer>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: RefCell::new(answers.into()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// All prompts asked so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    /// True when every scripted answer was consumed.
    pub fn exhausted(&self) -> bool {
        self.answers.borrow().is_empty()
    }

    fn next(&self, prompt: &str) -> Result<Answer> {
        self.prompts.borrow_mut().push(prompt.to_string());
        match self.answers.borrow_mut().pop_front() {
            Some(answer) => Ok(answer),
            None => bail!("script ran out of answers at prompt '{prompt}'"),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn choose(&self, prompt: &str, options: &[String], _default: usize) -> Result<usize> {
        match self.next(prompt)? {
            Answer::Choice(index) if index < options.len() => Ok(index),
            Answer::Choice(index) => {
                bail!("scripted choice {index} out of range at prompt '{prompt}'")
            }
            other => bail!("expected Choice at prompt '{prompt}', got {other:?}"),
        }
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        match self.next(prompt)? {
            Answer::Confirm(value) => Ok(value),
            other => bail!("expected Confirm at prompt '{prompt}', got {other:?}"),
        }
    }

    fn line(&self, prompt: &str) -> Result<String> {
        match self.next(prompt)? {
            Answer::Line(value) => Ok(value),
            other => bail!("expected Line at prompt '{prompt}', got {other:?}"),
        }
    }

    fn message(&self, prompt: &str) -> Result<String> {
        match self.next(prompt)? {
            Answer::Message(value) => Ok(value),
            other => bail!("expected Message at prompt '{prompt}', got {other:?}"),
        }
    }
}

/// Mutable model behind a [`FakeVcs`].
#[derive(Debug, Clone)]
pub struct FakeRepo {
    pub current: String,
    pub local_refs: Vec<String>,
    pub remote_refs: Vec<String>,
    pub dirty: bool,
    pub merge_marker: bool,
    pub unresolved: Vec<String>,
    /// (source, target) pairs that conflict, with the paths they leave
    /// unresolved when a real merge starts.
    pub conflicts: Vec<(String, String, Vec<String>)>,
    pub merge_tool: Option<String>,
    /// Whether running the tool clears the unresolved set.
    pub tool_resolves: bool,
    /// Whether the tool process exits zero.
    pub tool_exit_ok: bool,
    pub commits: Vec<String>,
    /// Number of `clean_untracked` calls so far.
    pub cleaned: u32,
}

impl Default for FakeRepo {
    fn default() -> Self {
        Self {
            current: "main".to_string(),
            local_refs: vec!["main".to_string(), "feature".to_string()],
            remote_refs: Vec::new(),
            dirty: false,
            merge_marker: false,
            unresolved: Vec::new(),
            conflicts: Vec::new(),
            merge_tool: Some("meld".to_string()),
            tool_resolves: true,
            tool_exit_ok: true,
            commits: Vec::new(),
            cleaned: 0,
        }
    }
}

impl FakeRepo {
    /// Declare that merging `source` into `target` conflicts on `paths`.
    pub fn with_conflict(mut self, source: &str, target: &str, paths: &[&str]) -> Self {
        self.conflicts.push((
            source.to_string(),
            target.to_string(),
            paths.iter().map(|p| (*p).to_string()).collect(),
        ));
        self
    }
}

/// In-memory [`Vcs`] implementation with call recording.
pub struct FakeVcs {
    state: RefCell<FakeRepo>,
    calls: RefCell<Vec<String>>,
}

impl FakeVcs {
    pub fn new(repo: FakeRepo) -> Self {
        Self {
            state: RefCell::new(repo),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Copy of the current repository model.
    pub fn snapshot(&self) -> FakeRepo {
        self.state.borrow().clone()
    }

    /// Every backend operation invoked so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    fn conflict_paths(&self, source: &str, target: &str) -> Option<Vec<String>> {
        self.state
            .borrow()
            .conflicts
            .iter()
            .find(|(s, t, _)| s == source && t == target)
            .map(|(_, _, paths)| paths.clone())
    }
}

impl Vcs for FakeVcs {
    fn current_ref(&self) -> Result<String, BackendError> {
        self.record("current_ref");
        Ok(self.state.borrow().current.clone())
    }

    fn list_refs(&self, scope: RefScope) -> Result<Vec<String>, BackendError> {
        self.record(format!("list_refs {scope:?}"));
        let state = self.state.borrow();
        Ok(match scope {
            RefScope::Local => state.local_refs.clone(),
            RefScope::Remote => state.remote_refs.clone(),
        })
    }

    fn has_uncommitted_changes(&self) -> Result<bool, BackendError> {
        self.record("has_uncommitted_changes");
        Ok(self.state.borrow().dirty)
    }

    fn merge_in_progress(&self) -> Result<bool, BackendError> {
        self.record("merge_in_progress");
        Ok(self.state.borrow().merge_marker)
    }

    fn trial_merge(&self, source: &str, target: &str) -> Result<TrialOutcome, BackendError> {
        self.record(format!("trial_merge {source} {target}"));
        // Probe contract: neither the marker nor the current ref survives
        // the call changed.
        Ok(if self.conflict_paths(source, target).is_some() {
            TrialOutcome::Conflicted
        } else {
            TrialOutcome::Clean
        })
    }

    fn start_real_merge(&self, source: &str, target: &str) -> Result<(), BackendError> {
        self.record(format!("start_real_merge {source} {target}"));
        let paths = self.conflict_paths(source, target).unwrap_or_default();
        let mut state = self.state.borrow_mut();
        state.current = target.to_string();
        state.merge_marker = true;
        state.unresolved = paths;
        Ok(())
    }

    fn abort_merge(&self) -> Result<(), BackendError> {
        self.record("abort_merge");
        let mut state = self.state.borrow_mut();
        state.merge_marker = false;
        state.unresolved.clear();
        Ok(())
    }

    fn clean_untracked(&self) -> Result<(), BackendError> {
        self.record("clean_untracked");
        self.state.borrow_mut().cleaned += 1;
        Ok(())
    }

    fn unresolved_paths(&self) -> Result<Vec<String>, BackendError> {
        self.record("unresolved_paths");
        Ok(self.state.borrow().unresolved.clone())
    }

    fn merge_tool_name(&self) -> Result<Option<String>, BackendError> {
        self.record("merge_tool_name");
        Ok(self.state.borrow().merge_tool.clone())
    }

    fn invoke_merge_tool(&self) -> Result<bool, BackendError> {
        self.record("invoke_merge_tool");
        let mut state = self.state.borrow_mut();
        if state.tool_resolves {
            state.unresolved.clear();
        }
        Ok(state.tool_exit_ok)
    }

    fn stage_all(&self) -> Result<(), BackendError> {
        self.record("stage_all");
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<(), BackendError> {
        self.record(format!("commit {message}"));
        let mut state = self.state.borrow_mut();
        state.commits.push(message.to_string());
        state.merge_marker = false;
        state.unresolved.clear();
        Ok(())
    }

    fn switch(&self, ref_name: &str) -> Result<(), BackendError> {
        self.record(format!("switch {ref_name}"));
        self.state.borrow_mut().current = ref_name.to_string();
        Ok(())
    }

    fn merge(&self, source: &str) -> Result<(), BackendError> {
        self.record(format!("merge {source}"));
        Ok(())
    }
}
