//! Agent roles and plan selection.
//!
//! The pipeline has a fixed set of roles. Each role produces exactly one
//! memory-bank file and has a fixed position in the canonical execution
//! order: later roles may read earlier roles' output, never the reverse.

pub mod client;
pub mod invoker;
pub mod prompts;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MemoryBankError, Result};

pub use client::{AgentClient, AgentClientConfig};
pub use invoker::{AgentCallResult, AgentInvoker, AgentPrompt};

/// One step of the memory-bank pipeline.
///
/// Variant order is the canonical execution order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentRole {
    #[serde(rename = "projectbrief")]
    ProjectBrief,
    #[serde(rename = "productContext")]
    ProductContext,
    #[serde(rename = "activeContext")]
    ActiveContext,
    #[serde(rename = "systemPatterns")]
    SystemPatterns,
    #[serde(rename = "techContext")]
    TechContext,
    #[serde(rename = "progress")]
    Progress,
    #[serde(rename = "aiGuidelines")]
    AiGuidelines,
}

/// Static per-role data. One generic execution path is parameterized by it.
#[derive(Debug)]
pub struct AgentSpec {
    pub role: AgentRole,
    pub name: &'static str,
    pub file_name: &'static str,
    pub description: &'static str,
    pub instructions: &'static str,
}

static AGENT_TABLE: [AgentSpec; 7] = [
    AgentSpec {
        role: AgentRole::ProjectBrief,
        name: "projectbrief",
        file_name: "projectbrief.md",
        description: "Generate a comprehensive project brief",
        instructions: prompts::PROJECT_BRIEF,
    },
    AgentSpec {
        role: AgentRole::ProductContext,
        name: "productContext",
        file_name: "productContext.md",
        description: "Analyze the product context and problem space",
        instructions: prompts::PRODUCT_CONTEXT,
    },
    AgentSpec {
        role: AgentRole::ActiveContext,
        name: "activeContext",
        file_name: "activeContext.md",
        description: "Determine current development context",
        instructions: prompts::ACTIVE_CONTEXT,
    },
    AgentSpec {
        role: AgentRole::SystemPatterns,
        name: "systemPatterns",
        file_name: "systemPatterns.md",
        description: "Analyze system architecture and patterns",
        instructions: prompts::SYSTEM_PATTERNS,
    },
    AgentSpec {
        role: AgentRole::TechContext,
        name: "techContext",
        file_name: "techContext.md",
        description: "Document technical context and setup",
        instructions: prompts::TECH_CONTEXT,
    },
    AgentSpec {
        role: AgentRole::Progress,
        name: "progress",
        file_name: "progress.md",
        description: "Assess project progress and status",
        instructions: prompts::PROGRESS,
    },
    AgentSpec {
        role: AgentRole::AiGuidelines,
        name: "aiGuidelines",
        file_name: "aiGuidelines.md",
        description: "Write guidelines for AI coding assistants",
        instructions: prompts::AI_GUIDELINES,
    },
];

impl AgentRole {
    /// All roles in canonical pipeline order.
    pub const ALL: [AgentRole; 7] = [
        AgentRole::ProjectBrief,
        AgentRole::ProductContext,
        AgentRole::ActiveContext,
        AgentRole::SystemPatterns,
        AgentRole::TechContext,
        AgentRole::Progress,
        AgentRole::AiGuidelines,
    ];

    pub fn spec(&self) -> &'static AgentSpec {
        &AGENT_TABLE[self.order_index()]
    }

    pub fn order_index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        self.spec().name
    }

    pub fn file_name(&self) -> &'static str {
        self.spec().file_name
    }

    /// Case-sensitive lookup by canonical role name.
    pub fn from_name(name: &str) -> Option<Self> {
        AGENT_TABLE.iter().find(|s| s.name == name).map(|s| s.role)
    }

    pub fn valid_names() -> String {
        AGENT_TABLE
            .iter()
            .map(|s| s.name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves requested role names to an execution plan.
///
/// Unknown names fail before anything runs. The plan is always emitted in
/// canonical order regardless of request order; an empty request selects
/// every role. Comma-separated tokens are split so `--agents a,b` works too.
pub fn select_agents<S: AsRef<str>>(requested: &[S]) -> Result<Vec<AgentRole>> {
    let mut selected = BTreeSet::new();

    for token in requested
        .iter()
        .flat_map(|r| r.as_ref().split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        let role = AgentRole::from_name(token).ok_or_else(|| MemoryBankError::UnknownAgentRole {
            name: token.to_string(),
            valid: AgentRole::valid_names(),
        })?;
        selected.insert(role);
    }

    if selected.is_empty() {
        return Ok(AgentRole::ALL.to_vec());
    }

    Ok(AgentRole::ALL
        .iter()
        .copied()
        .filter(|role| selected.contains(role))
        .collect())
}
