//! Project context collection.
//!
//! Builds the read-only [`ProjectContext`] every agent receives: a bounded
//! file tree, dependency manifests, key file excerpts, git state and the
//! applicable assistant rules. Collection never writes to the project.

pub mod key_files;
pub mod manifests;
pub mod rules;
pub mod tree;

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MemoryBankError, Result};
use crate::git::{ChangedFile, CommitSummary, GitAnalyzer, DEFAULT_COMMIT_LIMIT};

pub use key_files::KeyFile;
pub use manifests::{Dependency, DependencyInfo, Ecosystem, Manifest};
pub use rules::ProjectKind;
pub use tree::FileTree;

/// Character budget for a single file excerpt.
pub const MAX_EXCERPT_CHARS: usize = 5000;

/// Bytes read from a key file; covers `MAX_EXCERPT_CHARS` of any UTF-8 text.
pub const MAX_EXCERPT_BYTES: u64 = (MAX_EXCERPT_CHARS * 4) as u64;

const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Cuts `text` to at most `limit` characters, appending a marker when
/// something was dropped. Always splits on a char boundary.
pub fn truncate_text(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}{}", &text[..idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Reads at most `max_bytes` of `path`, decoding lossily. The flag is set
/// when the file continues past what was read.
pub(crate) fn read_prefix(path: &Path, max_bytes: u64) -> io::Result<(String, bool)> {
    let mut bytes = Vec::new();
    File::open(path)?
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)?;

    let clipped = bytes.len() as u64 > max_bytes;
    if clipped {
        bytes.truncate(max_bytes as usize);
        // drop a multi-byte character cut in half by the limit
        let valid = match std::str::from_utf8(&bytes) {
            Ok(_) => bytes.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => bytes.len(),
        };
        bytes.truncate(valid);
    }
    Ok((String::from_utf8_lossy(&bytes).into_owned(), clipped))
}

/// Excerpt of text read with [`read_prefix`]; a clipped file is always marked.
pub(crate) fn excerpt(text: &str, clipped: bool) -> String {
    let out = truncate_text(text, MAX_EXCERPT_CHARS);
    if clipped && !out.ends_with(TRUNCATION_MARKER) {
        format!("{}{}", out, TRUNCATION_MARKER)
    } else {
        out
    }
}

/// Canonicalizes `path` and checks that it is a readable directory.
pub fn resolve_project_path(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(MemoryBankError::InvalidProjectPath(
            "project path is empty".to_string(),
        ));
    }

    let resolved = path.canonicalize().map_err(|e| {
        MemoryBankError::InvalidProjectPath(format!("{}: {}", path.display(), e))
    })?;

    if !resolved.is_dir() {
        return Err(MemoryBankError::InvalidProjectPath(format!(
            "{} is not a directory",
            resolved.display()
        )));
    }

    fs::read_dir(&resolved).map_err(|e| {
        MemoryBankError::InvalidProjectPath(format!(
            "{} is not readable: {}",
            resolved.display(),
            e
        ))
    })?;

    Ok(resolved)
}

/// Immutable snapshot of the analyzed project. Absent facts are empty values,
/// never missing fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectContext {
    /// Absolute project root
    pub root_path: PathBuf,
    pub project_name: String,
    pub file_summary: String,
    pub dependency_info: DependencyInfo,
    pub key_files: Vec<KeyFile>,
    pub is_git_repo: bool,
    pub git_branch: String,
    pub git_log_excerpt: Vec<CommitSummary>,
    pub uncommitted_status: Vec<ChangedFile>,
    pub project_kinds: Vec<ProjectKind>,
    /// Markdown section of applicable assistant rules
    pub ai_rules: String,
}

impl ProjectContext {
    /// Renders the context block shared by every agent prompt.
    pub fn render(&self) -> String {
        let kinds = self
            .project_kinds
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut out = String::new();
        out.push_str("PROJECT ANALYSIS CONTEXT\n\n");
        out.push_str(&format!("Project Path: {}\n", self.root_path.display()));
        out.push_str(&format!("Project Name: {}\n", self.project_name));
        out.push_str(&format!("Project Type: {}\n\n", kinds));

        out.push_str("=== PROJECT STRUCTURE ===\n");
        out.push_str(&self.file_summary);
        out.push_str("\n\n=== DEPENDENCY MANIFESTS ===\n");
        out.push_str(&self.dependency_info.render());
        out.push_str("\n\n=== KEY FILES CONTENT ===\n");
        out.push_str(&key_files::render_key_files(&self.key_files));
        out.push_str("\n\n=== GIT INFORMATION ===\n");
        out.push_str(&self.render_git());

        if !self.ai_rules.is_empty() {
            out.push_str("\n\n=== AI ASSISTANT BEST PRACTICES ===\n");
            out.push_str(&self.ai_rules);
        }
        out.push('\n');
        out
    }

    fn render_git(&self) -> String {
        if !self.is_git_repo {
            return "Not a git repository".to_string();
        }

        let mut lines = Vec::new();
        if !self.git_branch.is_empty() {
            lines.push(format!("Current branch: {}", self.git_branch));
        }

        if self.git_log_excerpt.is_empty() {
            lines.push("No commits yet".to_string());
        } else {
            lines.push("Recent commits:".to_string());
            lines.extend(
                self.git_log_excerpt
                    .iter()
                    .map(|c| format!("{} {}", c.hash, c.message)),
            );
        }

        if self.uncommitted_status.is_empty() {
            lines.push("Working directory clean".to_string());
        } else {
            lines.push("Uncommitted changes:".to_string());
            lines.extend(
                self.uncommitted_status
                    .iter()
                    .map(|f| format!("{} {}", f.status.as_str(), f.path)),
            );
        }

        lines.join("\n")
    }
}

/// Gathers a [`ProjectContext`] from a directory.
#[derive(Debug, Clone)]
pub struct ContextCollector {
    pub tree: FileTree,
    pub commit_limit: usize,
}

impl Default for ContextCollector {
    fn default() -> Self {
        Self {
            tree: FileTree::default(),
            commit_limit: DEFAULT_COMMIT_LIMIT,
        }
    }
}

impl ContextCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails only with `InvalidProjectPath`; every other problem degrades to
    /// empty fields.
    pub fn collect(&self, root: &Path) -> Result<ProjectContext> {
        let root_path = resolve_project_path(root)?;
        let project_name = root_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root_path.display().to_string());

        tracing::debug!("Collecting project context for {}", root_path.display());

        let file_summary = self.tree.summarize(&root_path);
        let dependency_info = DependencyInfo::detect(&root_path);
        let key_files = key_files::read_key_files(&root_path);

        let mut context = ProjectContext {
            root_path: root_path.clone(),
            project_name,
            file_summary,
            project_kinds: rules::detect_project_kinds(&root_path, &dependency_info),
            dependency_info,
            key_files,
            is_git_repo: false,
            git_branch: String::new(),
            git_log_excerpt: Vec::new(),
            uncommitted_status: Vec::new(),
            ai_rules: String::new(),
        };

        if let Some(git) = GitAnalyzer::open(&root_path) {
            context.is_git_repo = true;
            context.git_branch = git.current_branch().unwrap_or_else(|e| {
                tracing::warn!("Could not read current branch: {}", e);
                String::new()
            });
            context.git_log_excerpt = git.recent_commits(self.commit_limit).unwrap_or_default();
            context.uncommitted_status = git.uncommitted_changes().unwrap_or_else(|e| {
                tracing::warn!("Could not read git status: {}", e);
                Vec::new()
            });
        }

        let rules = rules::applicable_rules(&context.project_kinds);
        context.ai_rules = rules::format_rules_markdown(&rules);

        tracing::debug!(
            manifests = context.dependency_info.manifests.len(),
            key_files = context.key_files.len(),
            commits = context.git_log_excerpt.len(),
            "Project context collected"
        );

        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("exact", 5), "exact");
        assert_eq!(truncate_text("abcdef", 3), "abc\n... (truncated)");
        // multi-byte characters are never split
        assert_eq!(truncate_text("ééé", 2), "éé\n... (truncated)");
    }

    #[test]
    fn test_read_prefix_stops_at_budget() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");

        fs::write(&path, "0123456789").unwrap();
        assert_eq!(read_prefix(&path, 10).unwrap(), ("0123456789".to_string(), false));
        assert_eq!(read_prefix(&path, 4).unwrap(), ("0123".to_string(), true));

        // the limit falls inside the second 'é'
        fs::write(&path, "aéé").unwrap();
        assert_eq!(read_prefix(&path, 4).unwrap(), ("aé".to_string(), true));

        assert_eq!(excerpt("0123", true), "0123\n... (truncated)");
        assert_eq!(excerpt("0123", false), "0123");
    }

    #[test]
    fn test_resolve_project_path_errors() {
        let err = resolve_project_path(Path::new("")).unwrap_err();
        assert!(matches!(err, MemoryBankError::InvalidProjectPath(_)));

        let err = resolve_project_path(Path::new("/no/such/project/dir")).unwrap_err();
        assert!(matches!(err, MemoryBankError::InvalidProjectPath(_)));

        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        let err = resolve_project_path(&file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_resolve_project_path_is_absolute() {
        let temp_dir = TempDir::new().unwrap();
        let resolved = resolve_project_path(temp_dir.path()).unwrap();
        assert!(resolved.is_absolute());
    }

    #[test]
    fn test_collect_plain_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), "# Sample\n\nA sample project.").unwrap();
        fs::write(
            temp_dir.path().join("Cargo.toml"),
            "[package]\nname = \"sample\"\n\n[dependencies]\nserde = \"1\"\n",
        )
        .unwrap();

        let context = ContextCollector::new().collect(temp_dir.path()).unwrap();
        assert!(!context.is_git_repo);
        assert!(context.git_branch.is_empty());
        assert!(context.git_log_excerpt.is_empty());
        assert!(context.uncommitted_status.is_empty());
        assert_eq!(context.key_files.len(), 1);
        assert_eq!(context.dependency_info.ecosystems(), vec![Ecosystem::Cargo]);
        assert_eq!(context.project_kinds, vec![ProjectKind::General]);
        assert!(!context.ai_rules.is_empty());

        let rendered = context.render();
        assert!(rendered.starts_with("PROJECT ANALYSIS CONTEXT"));
        assert!(rendered.contains("=== PROJECT STRUCTURE ==="));
        assert!(rendered.contains("README.md"));
        assert!(rendered.contains("Dependencies: serde 1"));
        assert!(rendered.contains("A sample project."));
        assert!(rendered.contains("Not a git repository"));
        assert!(rendered.contains("=== AI ASSISTANT BEST PRACTICES ==="));
    }

    #[test]
    fn test_collect_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let context = ContextCollector::new().collect(temp_dir.path()).unwrap();
        assert!(context.dependency_info.is_empty());
        assert!(context.key_files.is_empty());

        let rendered = context.render();
        assert!(rendered.contains("No dependency manifests found."));
        assert!(rendered.contains("No key files found."));
    }

    #[test]
    fn test_collect_leaves_git_index_untouched() {
        use std::process::Command;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let git = |args: &[&str]| {
            Command::new("git")
                .args(args)
                .current_dir(dir)
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
        };
        if !git(&["init", "-q"]) {
            // git binary unavailable in this environment
            return;
        }
        git(&["config", "user.email", "dev@example.com"]);
        git(&["config", "user.name", "Dev"]);
        fs::write(dir.join("a.txt"), "one").unwrap();
        git(&["add", "a.txt"]);
        git(&["commit", "-q", "-m", "Initial commit"]);

        // same bytes, newer mtime: the index stat data is now stale
        std::thread::sleep(std::time::Duration::from_millis(1100));
        fs::write(dir.join("a.txt"), "one").unwrap();

        let index = dir.join(".git/index");
        let before = (fs::read(&index).unwrap(), fs::metadata(&index).unwrap().modified().unwrap());

        let context = ContextCollector::new().collect(dir).unwrap();
        assert!(context.is_git_repo);
        assert_eq!(context.git_log_excerpt.len(), 1);
        assert!(context.uncommitted_status.is_empty());

        let after = (fs::read(&index).unwrap(), fs::metadata(&index).unwrap().modified().unwrap());
        assert_eq!(before, after);
        assert!(!dir.join(".git/index.lock").exists());
    }

    #[test]
    fn test_collect_invalid_path() {
        let err = ContextCollector::new()
            .collect(Path::new("/no/such/project/dir"))
            .unwrap_err();
        assert!(matches!(err, MemoryBankError::InvalidProjectPath(_)));
    }

    #[test]
    fn test_render_git_section() {
        let temp_dir = TempDir::new().unwrap();
        let mut context = ContextCollector::new().collect(temp_dir.path()).unwrap();
        context.is_git_repo = true;
        context.git_branch = "main".to_string();
        context.git_log_excerpt = vec![CommitSummary {
            hash: "abc1234".to_string(),
            message: "Initial commit".to_string(),
        }];

        let git = context.render_git();
        assert!(git.contains("Current branch: main"));
        assert!(git.contains("abc1234 Initial commit"));
        assert!(git.contains("Working directory clean"));
    }
}
