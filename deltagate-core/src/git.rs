//! Revision range lookup through the local `git` binary.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::error::{DeltaGateError, Result};

/// Lists the revisions between two points in history.
#[cfg_attr(test, mockall::automock)]
pub trait RevisionRangeProvider {
    /// Revisions in `from..to`: excluding `from`, including `to`.
    fn revisions(&self, from: &str, to: &str) -> Result<Vec<String>>;
}

/// Range provider backed by `git log --pretty=%H from..to`.
#[derive(Debug, Clone)]
pub struct GitLogRangeProvider {
    workdir: PathBuf,
}

impl GitLogRangeProvider {
    /// Run git inside `workdir`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }
}

impl RevisionRangeProvider for GitLogRangeProvider {
    fn revisions(&self, from: &str, to: &str) -> Result<Vec<String>> {
        let from = checked_revision(from)?;
        let to = checked_revision(to)?;
        let range = format!("{from}..{to}");
        let stdout = run_git(
            &self.workdir,
            &["log", "--pretty=%H", "--end-of-options", &range],
        )?;
        let revisions = parse_revision_lines(&stdout);
        debug!("git log {range} returned {} revision(s)", revisions.len());
        Ok(revisions)
    }
}

fn checked_revision(revision: &str) -> Result<&str> {
    let trimmed = revision.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return Err(DeltaGateError::RevisionRange(format!(
            "invalid revision: {revision:?}"
        )));
    }
    Ok(trimmed)
}

/// Split `git log` output into revisions, trimming lines and dropping blanks.
pub fn parse_revision_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn run_git(path: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .map_err(|err| DeltaGateError::RevisionRange(format!("git command failed: {err}")))?;
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(DeltaGateError::RevisionRange(format!(
            "git {:?} failed: {}",
            args, detail
        )));
    }
    Ok(stdout)
}
