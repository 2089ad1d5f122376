//! Excerpts of well-known top-level project files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{excerpt, read_prefix, MAX_EXCERPT_BYTES};

pub const KEY_FILE_NAMES: &[&str] = &[
    "README.md",
    "README.rst",
    "README.txt",
    "CHANGELOG.md",
    "CHANGELOG.rst",
    "Dockerfile",
    "docker-compose.yml",
    ".gitignore",
    "LICENSE",
    "LICENSE.txt",
    "LICENSE.md",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFile {
    pub name: String,
    pub excerpt: String,
}

/// Reads every present key file, in the order of [`KEY_FILE_NAMES`].
/// Only a bounded prefix is read. Non-UTF-8 content is decoded lossily;
/// unreadable files are skipped.
pub fn read_key_files(root: &Path) -> Vec<KeyFile> {
    KEY_FILE_NAMES
        .iter()
        .filter_map(|name| {
            let path = root.join(name);
            if !path.is_file() {
                return None;
            }
            match read_prefix(&path, MAX_EXCERPT_BYTES) {
                Ok((text, clipped)) => Some(KeyFile {
                    name: name.to_string(),
                    excerpt: excerpt(&text, clipped),
                }),
                Err(e) => {
                    tracing::warn!("Could not read {}: {}", path.display(), e);
                    None
                }
            }
        })
        .collect()
}

pub fn render_key_files(files: &[KeyFile]) -> String {
    if files.is_empty() {
        return "No key files found.".to_string();
    }
    files
        .iter()
        .map(|f| format!("--- {} ---\n{}", f.name, f.excerpt))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_reads_present_files_in_order() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("LICENSE"), "MIT").unwrap();
        fs::write(temp_dir.path().join("README.md"), "# Demo").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        let files = read_key_files(temp_dir.path());
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["README.md", "LICENSE"]);
        assert_eq!(files[0].excerpt, "# Demo");
    }

    #[test]
    fn test_long_files_are_truncated() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), "x".repeat(6000)).unwrap();

        let files = read_key_files(temp_dir.path());
        assert!(files[0].excerpt.ends_with("... (truncated)"));
        assert!(files[0].excerpt.starts_with(&"x".repeat(5000)));
        assert!(!files[0].excerpt.contains(&"x".repeat(5001)));
    }

    #[test]
    fn test_huge_file_reads_only_a_prefix() {
        let temp_dir = TempDir::new().unwrap();
        // multi-byte text longer than the byte budget
        let body = "é".repeat(MAX_EXCERPT_BYTES as usize);
        fs::write(temp_dir.path().join("Dockerfile"), &body).unwrap();

        let files = read_key_files(temp_dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].excerpt.starts_with(&"é".repeat(5000)));
        assert!(files[0].excerpt.ends_with("\n... (truncated)"));
        assert!(!files[0].excerpt.contains('\u{FFFD}'));
    }

    #[test]
    fn test_non_utf8_is_decoded_lossily() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.txt"), b"caf\xe9 notes").unwrap();

        let files = read_key_files(temp_dir.path());
        assert_eq!(files[0].excerpt, "caf\u{FFFD} notes");
    }

    #[test]
    fn test_render() {
        assert_eq!(render_key_files(&[]), "No key files found.");
        let rendered = render_key_files(&[KeyFile {
            name: "Dockerfile".to_string(),
            excerpt: "FROM rust".to_string(),
        }]);
        assert_eq!(rendered, "--- Dockerfile ---\nFROM rust");
    }
}
