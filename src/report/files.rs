//! Token report files under `memory-bank/token-reports/`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{MemoryBankError, Result};
use crate::store::write_atomic;

use super::TokenUsageReport;

const REPORT_PREFIX: &str = "token_usage_";

#[derive(Debug, Clone)]
pub struct ReportDirectory {
    dir: PathBuf,
}

impl ReportDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `report` as pretty JSON named after its start time. An existing
    /// report with the same name is never overwritten; a `_N` suffix is added.
    pub fn save(&self, report: &TokenUsageReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            MemoryBankError::Report(format!("failed to create {}: {}", self.dir.display(), e))
        })?;

        let stem = format!(
            "{}{}",
            REPORT_PREFIX,
            report.start_time.format("%Y%m%d_%H%M%S")
        );
        let mut path = self.dir.join(format!("{}.json", stem));
        let mut suffix = 1;
        while path.exists() {
            path = self.dir.join(format!("{}_{}.json", stem, suffix));
            suffix += 1;
        }

        let bytes = serde_json::to_vec_pretty(report)?;
        write_atomic(&path, &bytes).map_err(|e| {
            MemoryBankError::Report(format!("failed to write {}: {}", path.display(), e))
        })?;

        tracing::debug!("Token usage report saved to {}", path.display());
        Ok(path)
    }

    /// All `*.json` reports, newest first by modification time.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        // the directory part may contain glob metacharacters
        let pattern = format!(
            "{}/*.json",
            glob::Pattern::escape(&self.dir.to_string_lossy())
        );

        let entries = glob::glob(&pattern)
            .map_err(|e| MemoryBankError::Report(format!("invalid report pattern: {}", e)))?;

        let mut reports: Vec<(SystemTime, PathBuf)> = entries
            .flatten()
            .filter(|p| p.is_file())
            .map(|p| {
                let modified = fs::metadata(&p)
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (modified, p)
            })
            .collect();

        reports.sort_by(|a, b| b.cmp(a));
        Ok(reports.into_iter().map(|(_, p)| p).collect())
    }

    pub fn latest(&self) -> Result<Option<PathBuf>> {
        Ok(self.list()?.into_iter().next())
    }

    pub fn load(path: &Path) -> Result<TokenUsageReport> {
        let content = fs::read_to_string(path).map_err(|e| {
            MemoryBankError::Report(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            MemoryBankError::Report(format!("invalid report {}: {}", path.display(), e))
        })
    }
}
