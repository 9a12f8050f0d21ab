//! Adapter over the external `git` binary.
//!
//! All repository access goes through this module; the rest of the crate
//! never parses raw git output. Operations that are expected to succeed
//! surface [`BackendError`] on a non-zero exit. Probe operations treat the
//! exit status as data: the trial merge's dry run, the in-progress check,
//! and the merge tool all report outcomes, not errors.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use thiserror::Error;
use tracing::{debug, instrument, warn};

/// A git invocation failed that was expected to succeed.
#[derive(Debug, Error)]
#[error("`{command}` failed (exit {exit_code}): {diagnostic}")]
pub struct BackendError {
    /// The command line that failed.
    pub command: String,
    /// Exit code, or -1 when the process never produced one.
    pub exit_code: i32,
    /// Trimmed stderr, or the spawn error text.
    pub diagnostic: String,
}

impl BackendError {
    fn spawn(command: String, err: &std::io::Error) -> Self {
        Self {
            command,
            exit_code: -1,
            diagnostic: err.to_string(),
        }
    }

    fn unexpected_output(command: &str, detail: impl Into<String>) -> Self {
        Self {
            command: command.to_string(),
            exit_code: 0,
            diagnostic: detail.into(),
        }
    }
}

/// Which ref namespace to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefScope {
    Local,
    Remote,
}

/// Result of a non-destructive trial merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOutcome {
    Clean,
    Conflicted,
}

/// One line of `git log` as exposed to the branch flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
    /// Full 40-hex commit hash.
    pub hash: String,
    /// Short hash plus date, author, and subject for display.
    pub display: String,
}

/// Capability interface the merge orchestrator depends on.
///
/// The real implementation shells out to git; a scripted in-memory one
/// lives in `test_support` so the orchestrator can be driven in tests.
pub trait Vcs {
    /// Name of the currently checked-out ref. Fails outside a repository.
    fn current_ref(&self) -> Result<String, BackendError>;
    /// Enumerate branch names in the given scope, in git's order. Empty
    /// when none exist.
    fn list_refs(&self, scope: RefScope) -> Result<Vec<String>, BackendError>;
    /// True iff the porcelain status output is non-empty after trimming.
    fn has_uncommitted_changes(&self) -> Result<bool, BackendError>;
    /// True iff the backend's merge marker exists and is non-empty.
    fn merge_in_progress(&self) -> Result<bool, BackendError>;
    /// Probe whether `source` merges into `target` without conflicts,
    /// leaving no residue: the trial is unconditionally reverted and the
    /// original ref restored before returning.
    fn trial_merge(&self, source: &str, target: &str) -> Result<TrialOutcome, BackendError>;
    /// Switch to `target` and begin a non-committing, non-fast-forward
    /// merge from `source`. The one operation that creates the persisted
    /// merge marker.
    fn start_real_merge(&self, source: &str, target: &str) -> Result<(), BackendError>;
    /// Cancel an in-progress merge and restore the pre-merge tree.
    fn abort_merge(&self) -> Result<(), BackendError>;
    /// Remove untracked artifacts (merge tool backups and the like).
    fn clean_untracked(&self) -> Result<(), BackendError>;
    /// Paths still carrying conflict markers, in git's order.
    fn unresolved_paths(&self) -> Result<Vec<String>, BackendError>;
    /// The configured merge tool, if any.
    fn merge_tool_name(&self) -> Result<Option<String>, BackendError>;
    /// Run the configured merge tool interactively. The returned flag is
    /// the tool's exit status, which is opaque; the flow asks the user
    /// rather than trusting it.
    fn invoke_merge_tool(&self) -> Result<bool, BackendError>;
    /// Stage every change, including untracked files.
    fn stage_all(&self) -> Result<(), BackendError>;
    /// Commit staged changes with `message`.
    fn commit(&self, message: &str) -> Result<(), BackendError>;
    /// Switch the working tree to `ref_name`.
    fn switch(&self, ref_name: &str) -> Result<(), BackendError>;
    /// Merge `source` into the current ref, expecting success (used on the
    /// clean path after a trial said so).
    fn merge(&self, source: &str) -> Result<(), BackendError>;
}

/// Adapter rooted in one working directory.
#[derive(Debug, Clone)]
pub struct GitBackend {
    workdir: PathBuf,
}

impl GitBackend {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Probe: inside a git repository at all?
    pub fn is_repository(&self) -> Result<bool, BackendError> {
        self.probe(&["rev-parse", "--git-dir"])
    }

    pub fn fetch_all(&self) -> Result<(), BackendError> {
        self.run_checked(&["fetch", "--all"])?;
        Ok(())
    }

    /// Full history of `ref_name`, newest first.
    pub fn history(&self, ref_name: &str) -> Result<Vec<CommitEntry>, BackendError> {
        let raw = self.run_capture(&[
            "--no-pager",
            "log",
            ref_name,
            "--date=short",
            "--pretty=%H  %ad  %an  %s",
        ])?;
        raw.lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(parse_history_line)
            .collect()
    }

    /// Create `name` at `start_point` and check it out.
    pub fn create_branch(&self, name: &str, start_point: &str) -> Result<(), BackendError> {
        self.run_checked(&["checkout", "-b", name, start_point])?;
        Ok(())
    }

    /// Delete a fully merged-or-not local branch.
    pub fn delete_branch(&self, name: &str) -> Result<(), BackendError> {
        self.run_checked(&["branch", "-D", name])?;
        Ok(())
    }

    /// Name of the configured remote. Errors when none is set up.
    pub fn remote_name(&self) -> Result<String, BackendError> {
        let raw = self.run_capture(&["remote"])?;
        raw.lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| BackendError::unexpected_output("git remote", "no remote configured"))
    }

    pub fn pull(&self, remote: &str, branch: &str) -> Result<(), BackendError> {
        self.run_checked(&["pull", remote, branch])?;
        Ok(())
    }

    pub fn push(&self, remote: &str, branch: &str) -> Result<(), BackendError> {
        self.run_checked(&["push", remote, branch])?;
        Ok(())
    }

    /// Push `refspec` and record the upstream relationship.
    pub fn push_with_upstream(&self, remote: &str, refspec: &str) -> Result<(), BackendError> {
        self.run_checked(&["push", "--set-upstream", remote, refspec])?;
        Ok(())
    }

    /// Squash-merge `source` into the current ref. Leaves the result
    /// staged; callers commit separately with a validated message.
    pub fn squash_merge(&self, source: &str) -> Result<(), BackendError> {
        self.run_checked(&["merge", "--squash", source])?;
        Ok(())
    }

    /// Merge `source` into the current ref with a message, reporting
    /// whether the merge applied cleanly. Conflicts are data here, not an
    /// error; the caller decides how to unwind.
    pub fn merge_with_message(&self, source: &str, message: &str) -> Result<bool, BackendError> {
        self.probe(&["merge", source, "-m", message])
    }

    pub fn clone_repository(&self, url: &str, dir: &str) -> Result<(), BackendError> {
        self.run_checked(&["clone", url, dir])?;
        Ok(())
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.run_checked(&["config", key, value])?;
        Ok(())
    }

    /// Porcelain status text for display, untracked files included.
    pub fn status_text(&self) -> Result<String, BackendError> {
        self.run_capture(&["status", "-uall", "--porcelain"])
    }

    /// Unstage everything staged so far.
    pub fn unstage_all(&self) -> Result<(), BackendError> {
        self.run_checked(&["reset"])?;
        Ok(())
    }

    fn run(&self, args: &[&str]) -> Result<Output, BackendError> {
        debug!(?args, "running git");
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|err| BackendError::spawn(command_line(args), &err))
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output, BackendError> {
        let output = self.run(args)?;
        if !output.status.success() {
            let err = BackendError {
                command: command_line(args),
                exit_code: output.status.code().unwrap_or(-1),
                diagnostic: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            };
            warn!(%err, "git command failed");
            return Err(err);
        }
        Ok(output)
    }

    fn run_capture(&self, args: &[&str]) -> Result<String, BackendError> {
        let output = self.run_checked(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run a command whose exit status is data rather than an error.
    fn probe(&self, args: &[&str]) -> Result<bool, BackendError> {
        Ok(self.run(args)?.status.success())
    }
}

impl Vcs for GitBackend {
    fn current_ref(&self) -> Result<String, BackendError> {
        let raw = self.run_capture(&["symbolic-ref", "--short", "-q", "HEAD"])?;
        Ok(raw.trim().to_string())
    }

    fn list_refs(&self, scope: RefScope) -> Result<Vec<String>, BackendError> {
        let namespace = match scope {
            RefScope::Local => "refs/heads/",
            RefScope::Remote => "refs/remotes/",
        };
        let raw = self.run_capture(&["for-each-ref", "--format", "%(refname:short)", namespace])?;
        Ok(split_ref_lines(&raw))
    }

    fn has_uncommitted_changes(&self) -> Result<bool, BackendError> {
        Ok(!self.status_text()?.trim().is_empty())
    }

    fn merge_in_progress(&self) -> Result<bool, BackendError> {
        let git_dir = self.run_capture(&["rev-parse", "--git-dir"])?;
        let marker = self.workdir.join(git_dir.trim()).join("MERGE_HEAD");
        Ok(marker_is_live(&marker))
    }

    #[instrument(skip_all, fields(source, target))]
    fn trial_merge(&self, source: &str, target: &str) -> Result<TrialOutcome, BackendError> {
        let origin = self.current_ref()?;
        self.run_checked(&["switch", target])?;
        let clean = self.probe(&["merge", "--no-commit", "--no-ff", source])?;
        // Nothing to undo when the trial found the target already up to
        // date, so the abort itself is a probe.
        let _ = self.probe(&["merge", "--abort"]);
        self.run_checked(&["switch", &origin])?;
        debug!(clean, "trial merge finished");
        Ok(if clean {
            TrialOutcome::Clean
        } else {
            TrialOutcome::Conflicted
        })
    }

    fn start_real_merge(&self, source: &str, target: &str) -> Result<(), BackendError> {
        self.run_checked(&["switch", target])?;
        // A conflicted merge exits non-zero here; the unresolved set, not
        // the exit status, carries the information from this point on.
        self.probe(&["merge", "--no-commit", "--no-ff", source])?;
        Ok(())
    }

    fn abort_merge(&self) -> Result<(), BackendError> {
        self.run_checked(&["merge", "--abort"])?;
        Ok(())
    }

    fn clean_untracked(&self) -> Result<(), BackendError> {
        self.run_checked(&["clean", "-f"])?;
        Ok(())
    }

    fn unresolved_paths(&self) -> Result<Vec<String>, BackendError> {
        let raw = self.run_capture(&["diff", "--name-only", "--diff-filter=U"])?;
        Ok(split_ref_lines(&raw))
    }

    fn merge_tool_name(&self) -> Result<Option<String>, BackendError> {
        let output = self.run(&["config", "--get", "merge.tool"])?;
        if !output.status.success() {
            return Ok(None);
        }
        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(if name.is_empty() { None } else { Some(name) })
    }

    fn invoke_merge_tool(&self) -> Result<bool, BackendError> {
        // The tool owns the terminal while it runs.
        let status = Command::new("git")
            .arg("mergetool")
            .current_dir(&self.workdir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|err| BackendError::spawn("git mergetool".to_string(), &err))?;
        Ok(status.success())
    }

    fn stage_all(&self) -> Result<(), BackendError> {
        self.run_checked(&["add", "--all"])?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<(), BackendError> {
        self.run_checked(&["commit", "-m", message])?;
        Ok(())
    }

    fn switch(&self, ref_name: &str) -> Result<(), BackendError> {
        self.run_checked(&["switch", ref_name])?;
        Ok(())
    }

    fn merge(&self, source: &str) -> Result<(), BackendError> {
        self.run_checked(&["merge", source])?;
        Ok(())
    }
}

fn command_line(args: &[&str]) -> String {
    format!("git {}", args.join(" "))
}

/// Split one-name-per-line git output into names, dropping the blank tail
/// line git appends and any carriage returns.
fn split_ref_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// True iff the merge marker file exists and is non-empty.
fn marker_is_live(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|contents| !contents.trim().is_empty())
        .unwrap_or(false)
}

/// Parse one `%H  %ad  %an  %s` log line: the first 40 characters are the
/// full hash, the display keeps the short hash plus the rest.
fn parse_history_line(line: &str) -> Result<CommitEntry, BackendError> {
    if line.len() < 40 || !line[..40].bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(BackendError::unexpected_output(
            "git log",
            format!("unexpected log line: '{line}'"),
        ));
    }
    Ok(CommitEntry {
        hash: line[..40].to_string(),
        display: format!("{}{}", &line[..7], &line[40..]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_blank_tail_and_carriage_returns() {
        let raw = "main\r\nfeature\n\n";
        assert_eq!(split_ref_lines(raw), vec!["main", "feature"]);
        assert!(split_ref_lines("").is_empty());
    }

    #[test]
    fn marker_requires_nonempty_contents() {
        let temp = tempfile::tempdir().expect("tempdir");
        let marker = temp.path().join("MERGE_HEAD");
        assert!(!marker_is_live(&marker), "missing file is not a merge");

        fs::write(&marker, "  \n").expect("write");
        assert!(!marker_is_live(&marker), "blank marker is not a merge");

        fs::write(&marker, "1111111111111111111111111111111111111111\n").expect("write");
        assert!(marker_is_live(&marker));
    }

    #[test]
    fn history_line_parses_hash_and_display() {
        let line = format!("{}  2024-03-01  Ada  fix the thing", "ab12cd34".repeat(5));
        let entry = parse_history_line(&line).expect("entry");
        assert_eq!(entry.hash.len(), 40);
        assert!(entry.display.starts_with("ab12cd3"));
        assert!(entry.display.ends_with("fix the thing"));
    }

    #[test]
    fn malformed_history_line_is_rejected() {
        let err = parse_history_line("not a log line").unwrap_err();
        assert!(err.diagnostic.contains("unexpected log line"));
    }

    #[test]
    fn backend_error_display_names_the_command() {
        let err = BackendError {
            command: command_line(&["merge", "--abort"]),
            exit_code: 128,
            diagnostic: "fatal: no merge to abort".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("git merge --abort"));
        assert!(text.contains("128"));
        assert!(text.contains("no merge to abort"));
    }
}
