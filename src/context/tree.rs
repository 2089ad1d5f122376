//! Bounded textual digest of a project's file tree.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use ignore::{DirEntry, WalkBuilder};

pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_MAX_CHILDREN: usize = 20;
pub const DEFAULT_MAX_ENTRIES: usize = 500;

/// Upper bound on entries visited before the digest is cut short.
const MAX_SCANNED: usize = 20_000;

const SKIP_DIRS: &[&str] = &[
    ".git",
    "__pycache__",
    "node_modules",
    ".venv",
    "venv",
    ".pytest_cache",
    "target",
    "memory-bank",
];

const ALLOWED_HIDDEN: &[&str] = &[".gitignore", ".env.example", ".python-version"];

/// Renders an indented tree, truncated by depth, per-directory fan-out and
/// total size so huge repositories cannot blow up the prompt.
#[derive(Debug, Clone)]
pub struct FileTree {
    pub max_depth: usize,
    pub max_children: usize,
    pub max_entries: usize,
}

impl Default for FileTree {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_children: DEFAULT_MAX_CHILDREN,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

struct TreeEntry {
    path: PathBuf,
    parent: PathBuf,
    depth: usize,
    is_dir: bool,
}

impl FileTree {
    pub fn summarize(&self, root: &Path) -> String {
        let entries = self.scan(root);
        let root_name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());

        // First pass: decide which entries survive the per-directory limit.
        let mut child_counts: HashMap<&Path, usize> = HashMap::new();
        let mut overflow: HashMap<&Path, usize> = HashMap::new();
        let mut kept = vec![false; entries.len()];
        let mut kept_dirs: HashSet<&Path> = HashSet::from([root]);

        for (i, entry) in entries.iter().enumerate() {
            if !kept_dirs.contains(entry.parent.as_path()) {
                continue;
            }
            let count = child_counts.entry(entry.parent.as_path()).or_insert(0);
            if *count < self.max_children {
                *count += 1;
                kept[i] = true;
                if entry.is_dir {
                    kept_dirs.insert(entry.path.as_path());
                }
            } else {
                *overflow.entry(entry.parent.as_path()).or_insert(0) += 1;
            }
        }

        // Second pass: render, placing one overflow marker per directory.
        let mut lines = vec![format!("{}/", root_name)];
        let mut marked: HashSet<&Path> = HashSet::new();
        let mut rendered = 0usize;

        for (i, entry) in entries.iter().enumerate() {
            if rendered >= self.max_entries {
                lines.push(format!(
                    "... (tree truncated after {} entries)",
                    self.max_entries
                ));
                break;
            }
            let indent = "  ".repeat(entry.depth);
            if kept[i] {
                let name = entry
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let suffix = if entry.is_dir { "/" } else { "" };
                lines.push(format!("{}{}{}", indent, name, suffix));
                rendered += 1;
            } else if let Some(extra) = overflow.get(entry.parent.as_path()) {
                if marked.insert(entry.parent.as_path()) {
                    lines.push(format!("{}... ({} more items)", indent, extra));
                }
            }
        }

        lines.join("\n")
    }

    fn scan(&self, root: &Path) -> Vec<TreeEntry> {
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .parents(false)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .ignore(true)
            .max_depth(Some(self.max_depth))
            .sort_by_file_path(compare_paths)
            .filter_entry(keep_entry)
            .build();

        walker
            .flatten()
            .filter(|entry| entry.depth() > 0)
            .take(MAX_SCANNED)
            .map(|entry| {
                let path = entry.path().to_path_buf();
                TreeEntry {
                    parent: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                    depth: entry.depth(),
                    is_dir: entry.file_type().map(|t| t.is_dir()).unwrap_or(false),
                    path,
                }
            })
            .collect()
    }
}

/// Directories before files, then case-insensitive name order.
fn compare_paths(a: &Path, b: &Path) -> Ordering {
    let key = |p: &Path| {
        (
            p.is_file(),
            p.file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default(),
        )
    };
    key(a).cmp(&key(b))
}

fn keep_entry(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

    if is_dir && SKIP_DIRS.contains(&name.as_ref()) {
        return false;
    }
    !name.starts_with('.') || ALLOWED_HIDDEN.contains(&name.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_lists_files_and_directories() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "README.md", "# readme");
        create_file(temp_dir.path(), "src/main.rs", "fn main() {}");
        create_file(temp_dir.path(), ".gitignore", "target/");

        let tree = FileTree::default().summarize(temp_dir.path());
        assert!(tree.contains("README.md"));
        assert!(tree.contains("src/"));
        assert!(tree.contains("main.rs"));
        assert!(tree.contains(".gitignore"));
    }

    #[test]
    fn test_directories_listed_before_files() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "a.txt", "");
        create_file(temp_dir.path(), "zdir/inner.txt", "");

        let tree = FileTree::default().summarize(temp_dir.path());
        let dir_pos = tree.find("zdir/").unwrap();
        let file_pos = tree.find("a.txt").unwrap();
        assert!(dir_pos < file_pos);
    }

    #[test]
    fn test_respects_max_depth() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "level1/level2/level3/level4/deep_file.txt", "");

        let tree = FileTree {
            max_depth: 2,
            ..Default::default()
        }
        .summarize(temp_dir.path());

        assert!(tree.contains("level1"));
        assert!(tree.contains("level2"));
        assert!(!tree.contains("level3"));
        assert!(!tree.contains("deep_file.txt"));
    }

    #[test]
    fn test_skips_noise_directories_and_hidden_files() {
        let temp_dir = TempDir::new().unwrap();
        for dir in [".git", "__pycache__", "node_modules", ".venv", ".pytest_cache"] {
            create_file(temp_dir.path(), &format!("{}/file.txt", dir), "content");
        }
        create_file(temp_dir.path(), ".secret", "x");
        create_file(temp_dir.path(), "memory-bank/progress.md", "x");
        create_file(temp_dir.path(), "main.py", "print()");

        let tree = FileTree::default().summarize(temp_dir.path());
        assert!(tree.contains("main.py"));
        for hidden in [
            ".git",
            "__pycache__",
            "node_modules",
            ".venv",
            ".pytest_cache",
            ".secret",
            "memory-bank",
        ] {
            assert!(!tree.contains(hidden), "{hidden} should be skipped");
        }
    }

    #[test]
    fn test_limits_children_per_directory() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..25 {
            create_file(temp_dir.path(), &format!("file_{:02}.txt", i), "");
        }

        let tree = FileTree::default().summarize(temp_dir.path());
        assert!(tree.contains("file_19.txt"));
        assert!(!tree.contains("file_20.txt"));
        assert!(tree.contains("... (5 more items)"));
    }

    #[test]
    fn test_limits_total_entries() {
        let temp_dir = TempDir::new().unwrap();
        for d in 0..5 {
            for f in 0..5 {
                create_file(temp_dir.path(), &format!("d{}/f{}.txt", d, f), "");
            }
        }

        let tree = FileTree {
            max_entries: 10,
            ..Default::default()
        }
        .summarize(temp_dir.path());

        assert!(tree.contains("tree truncated after 10 entries"));
        assert_eq!(tree.lines().count(), 12);
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let tree = FileTree::default().summarize(temp_dir.path());
        assert_eq!(tree.lines().count(), 1);
        assert!(tree.ends_with('/'));
    }
}
