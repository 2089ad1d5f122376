//! Run configuration built once at CLI entry.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agents::{select_agents, AgentRole};
use crate::context::resolve_project_path;
use crate::error::{MemoryBankError, Result};

pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const RECOMMENDED_MAX_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const API_BASE_ENV: &str = "OPENAI_API_BASE";

/// Which session command is running. All three share one executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Init,
    Update,
    Refresh,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Init => "init",
            SessionMode::Update => "update",
            SessionMode::Refresh => "refresh",
        }
    }

    /// Whether existing files of unselected roles seed the accumulated context.
    pub fn seeds_from_disk(&self) -> bool {
        matches!(self, SessionMode::Update)
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated options as they arrive from the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub project_path: PathBuf,
    pub model: String,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub timeout_secs: u64,
    pub agents: Vec<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            project_path: PathBuf::from("."),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_base: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            agents: Vec::new(),
        }
    }
}

/// Immutable, validated configuration for one session.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: SessionMode,
    /// Absolute path of the analyzed project.
    pub project_path: PathBuf,
    pub model: String,
    pub api_key: String,
    pub api_base: Option<String>,
    /// Per-agent wall-clock budget.
    pub timeout: Duration,
    /// Roles to run, in canonical order.
    pub plan: Vec<AgentRole>,
}

impl RunConfig {
    /// Validates path, role names and credentials, in that order.
    pub fn new(mode: SessionMode, options: RunOptions) -> Result<Self> {
        let project_path = resolve_project_path(&options.project_path)?;
        let plan = select_agents(&options.agents)?;

        let api_key = options
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| MemoryBankError::MissingCredentials(API_KEY_ENV.to_string()))?;

        let timeout_secs = options.timeout_secs.max(1);
        if timeout_secs > RECOMMENDED_MAX_TIMEOUT_SECS {
            tracing::warn!(
                "timeout of {}s exceeds the recommended ceiling of {}s",
                timeout_secs,
                RECOMMENDED_MAX_TIMEOUT_SECS
            );
        }

        let api_base = options
            .api_base
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());

        Ok(Self {
            mode,
            project_path,
            model: options.model,
            api_key,
            api_base,
            timeout: Duration::from_secs(timeout_secs),
            plan,
        })
    }
}
