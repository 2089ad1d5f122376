//! File-based memory-bank persistence.
//!
//! Layout: `<project_root>/memory-bank/<role file>` plus a `token-reports/`
//! subdirectory. Writes go to a temp file in the same directory and are
//! renamed into place, so a crash never leaves a truncated file where a
//! good one used to be.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::agents::AgentRole;
use crate::error::{MemoryBankError, Result};

pub const MEMORY_BANK_DIR: &str = "memory-bank";
pub const TOKEN_REPORTS_DIR: &str = "token-reports";

#[derive(Debug, Clone)]
pub struct MemoryBankStore {
    dir: PathBuf,
}

impl MemoryBankStore {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            dir: project_root.as_ref().join(MEMORY_BANK_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.dir.join(TOKEN_REPORTS_DIR)
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    pub fn ensure_dir(&self) -> Result<&Path> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            MemoryBankError::Persistence(format!(
                "failed to create {}: {}",
                self.dir.display(),
                e
            ))
        })?;
        Ok(&self.dir)
    }

    pub fn path_for(&self, role: AgentRole) -> PathBuf {
        self.dir.join(role.file_name())
    }

    /// Replaces the file for `role` with `markdown`.
    pub fn write(&self, role: AgentRole, markdown: &str) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.path_for(role);
        write_atomic(&path, markdown.as_bytes()).map_err(|e| {
            MemoryBankError::Persistence(format!("failed to write {}: {}", path.display(), e))
        })?;
        tracing::debug!(agent = %role, path = %path.display(), "memory bank file written");
        Ok(path)
    }

    /// Returns the current content for `role`, or `None` when there is no file.
    pub fn read(&self, role: AgentRole) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(role)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Roles that currently have a file on disk.
    pub fn list_existing(&self) -> BTreeSet<AgentRole> {
        AgentRole::ALL
            .iter()
            .copied()
            .filter(|role| self.path_for(*role).is_file())
            .collect()
    }
}

/// Writes `bytes` to a sibling temp file, syncs it and renames it over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = parent.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4().simple()));

    let result = (|| {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
