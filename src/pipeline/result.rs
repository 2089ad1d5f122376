use std::fmt;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::agents::{AgentCallResult, AgentRole};
use crate::error::MemoryBankError;

/// Why an agent run did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentErrorKind {
    Invocation,
    Timeout,
    Persistence,
}

impl AgentErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentErrorKind::Invocation => "invocation",
            AgentErrorKind::Timeout => "timeout",
            AgentErrorKind::Persistence => "persistence",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentError {
    pub kind: AgentErrorKind,
    pub message: String,
}

impl AgentError {
    pub fn new(kind: AgentErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<MemoryBankError> for AgentError {
    fn from(err: MemoryBankError) -> Self {
        let kind = match err {
            MemoryBankError::AgentTimeout(_) => AgentErrorKind::Timeout,
            MemoryBankError::Persistence(_) => AgentErrorKind::Persistence,
            _ => AgentErrorKind::Invocation,
        };
        Self::new(kind, err.to_string())
    }
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

/// Per-agent state machine. Terminal states are never left within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Pending,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl AgentState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AgentState::Succeeded | AgentState::Failed | AgentState::TimedOut
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentState::Pending => "pending",
            AgentState::Running => "running",
            AgentState::Succeeded => "succeeded",
            AgentState::Failed => "failed",
            AgentState::TimedOut => "timed out",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one agent run. `success` holds exactly when there is output
/// and no error; a persistence failure keeps the generated markdown.
#[derive(Debug, Clone)]
pub struct AgentRunResult {
    pub role: AgentRole,
    pub success: bool,
    pub output_markdown: Option<String>,
    pub error: Option<AgentError>,
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    pub duration: Duration,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Wall-clock bounds of a run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunTiming {
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    pub duration: Duration,
}

impl AgentRunResult {
    pub(crate) fn succeeded(role: AgentRole, call: AgentCallResult, timing: RunTiming) -> Self {
        Self {
            role,
            success: true,
            output_markdown: Some(call.markdown),
            error: None,
            started_at: timing.started_at,
            finished_at: timing.finished_at,
            duration: timing.duration,
            prompt_tokens: call.prompt_tokens,
            completion_tokens: call.completion_tokens,
            total_tokens: call.total_tokens,
        }
    }

    pub(crate) fn failed(role: AgentRole, error: AgentError, timing: RunTiming) -> Self {
        Self {
            role,
            success: false,
            output_markdown: None,
            error: Some(error),
            started_at: timing.started_at,
            finished_at: timing.finished_at,
            duration: timing.duration,
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
        }
    }

    /// The agent produced output but it could not be written to the bank.
    pub(crate) fn unpersisted(
        role: AgentRole,
        call: AgentCallResult,
        error: AgentError,
        timing: RunTiming,
    ) -> Self {
        let mut result = Self::succeeded(role, call, timing);
        result.success = false;
        result.error = Some(error);
        result
    }

    pub fn state(&self) -> AgentState {
        match &self.error {
            None => AgentState::Succeeded,
            Some(e) if e.kind == AgentErrorKind::Timeout => AgentState::TimedOut,
            Some(_) => AgentState::Failed,
        }
    }
}
