use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::error::{MemoryBankError, Result};

pub const DEFAULT_COMMIT_LIMIT: usize = 10;

/// Read-only view of a git working tree.
pub struct GitAnalyzer {
    repo_path: PathBuf,
}

/// One line of `git log --oneline`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub hash: String,
    pub message: String,
}

/// A path with uncommitted changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub path: String,
    pub status: ChangeStatus,
}

/// Type of change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl ChangeStatus {
    /// Maps the two-column `git status --porcelain` code.
    pub fn from_porcelain(code: &str) -> Self {
        if code.starts_with('?') || code.contains('A') {
            ChangeStatus::Added
        } else if code.contains('D') {
            ChangeStatus::Deleted
        } else if code.contains('R') {
            ChangeStatus::Renamed
        } else {
            ChangeStatus::Modified
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Added => "added",
            ChangeStatus::Modified => "modified",
            ChangeStatus::Deleted => "deleted",
            ChangeStatus::Renamed => "renamed",
        }
    }
}

impl GitAnalyzer {
    /// Returns `None` when `repo_path` has no `.git` metadata.
    pub fn open(repo_path: impl AsRef<Path>) -> Option<Self> {
        let repo_path = repo_path.as_ref().to_path_buf();
        if repo_path.join(".git").exists() {
            Some(Self { repo_path })
        } else {
            None
        }
    }

    pub fn current_branch(&self) -> Result<String> {
        let stdout = self.run(&["branch", "--show-current"])?;
        Ok(stdout.trim().to_string())
    }

    /// Last `limit` commits, newest first. Empty for a repository without commits.
    pub fn recent_commits(&self, limit: usize) -> Result<Vec<CommitSummary>> {
        let limit_arg = format!("-{}", limit);
        let stdout = match self.run(&["log", "--oneline", "--no-decorate", &limit_arg]) {
            Ok(stdout) => stdout,
            // `git log` fails on an unborn branch
            Err(_) => return Ok(Vec::new()),
        };

        Ok(stdout.lines().filter_map(Self::parse_log_line).collect())
    }

    pub fn uncommitted_changes(&self) -> Result<Vec<ChangedFile>> {
        let stdout = self.run(&["status", "--porcelain"])?;
        Ok(stdout.lines().filter_map(Self::parse_status_line).collect())
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        // without this, `git status` may refresh and rewrite .git/index
        let output = Command::new("git")
            .arg("--no-optional-locks")
            .args(args)
            .current_dir(&self.repo_path)
            .env("GIT_OPTIONAL_LOCKS", "0")
            .output()?;

        if !output.status.success() {
            return Err(MemoryBankError::Io(std::io::Error::other(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ))));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn parse_log_line(line: &str) -> Option<CommitSummary> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (hash, message) = line.split_once(' ').unwrap_or((line, ""));
        Some(CommitSummary {
            hash: hash.to_string(),
            message: message.trim().to_string(),
        })
    }

    fn parse_status_line(line: &str) -> Option<ChangedFile> {
        if line.len() <= 3 {
            return None;
        }
        let code = &line[0..2];
        let raw_path = line[3..].trim();
        // Renames are reported as "old -> new"
        let path = raw_path
            .rsplit_once(" -> ")
            .map(|(_, new)| new)
            .unwrap_or(raw_path)
            .trim_matches('"')
            .to_string();

        Some(ChangedFile {
            path,
            status: ChangeStatus::from_porcelain(code),
        })
    }
}
