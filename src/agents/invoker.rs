use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

use super::AgentRole;

/// The two messages sent for one agent call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentPrompt {
    /// Role instructions (system message).
    pub instructions: String,
    /// Project context plus accumulated memory-bank files (user message).
    pub input: String,
}

/// Markdown and token usage returned by one successful agent call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentCallResult {
    pub markdown: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Capability boundary between the pipeline and any LLM provider.
///
/// Implementations report provider timeouts as
/// [`MemoryBankError::AgentTimeout`](crate::error::MemoryBankError::AgentTimeout)
/// and every other failure as
/// [`MemoryBankError::AgentInvocation`](crate::error::MemoryBankError::AgentInvocation).
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(
        &self,
        role: AgentRole,
        prompt: &AgentPrompt,
        model: &str,
        timeout: Duration,
    ) -> Result<AgentCallResult>;
}
