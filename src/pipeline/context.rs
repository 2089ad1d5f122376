//! Accumulated context and prompt assembly.

use std::collections::BTreeMap;

use crate::agents::{AgentPrompt, AgentRole};
use crate::context::truncate_text;

/// Character budget for each memory-bank document injected into a prompt.
pub const MAX_PRIOR_OUTPUT_CHARS: usize = 12_000;

/// Memory-bank documents visible to the next agent.
///
/// `generated` holds outputs of agents that succeeded earlier in this session.
/// `seeded` holds on-disk documents of roles outside the plan (update only).
/// Both are truncated by the same rule when inserted.
#[derive(Debug, Clone)]
pub struct AccumulatedContext {
    limit: usize,
    seeded: BTreeMap<AgentRole, String>,
    generated: BTreeMap<AgentRole, String>,
}

impl Default for AccumulatedContext {
    fn default() -> Self {
        Self::new(MAX_PRIOR_OUTPUT_CHARS)
    }
}

impl AccumulatedContext {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            seeded: BTreeMap::new(),
            generated: BTreeMap::new(),
        }
    }

    pub fn seed(&mut self, role: AgentRole, markdown: &str) {
        self.seeded.insert(role, truncate_text(markdown, self.limit));
    }

    pub fn record(&mut self, role: AgentRole, markdown: &str) {
        self.seeded.remove(&role);
        self.generated
            .insert(role, truncate_text(markdown, self.limit));
    }

    pub fn generated(&self) -> impl Iterator<Item = (AgentRole, &str)> {
        self.generated.iter().map(|(r, md)| (*r, md.as_str()))
    }

    pub fn seeded(&self) -> impl Iterator<Item = (AgentRole, &str)> {
        self.seeded.iter().map(|(r, md)| (*r, md.as_str()))
    }

    fn render_section(out: &mut String, title: &str, docs: &BTreeMap<AgentRole, String>) {
        if docs.is_empty() {
            return;
        }
        out.push_str(&format!("\n=== {} ===\n", title));
        for (role, markdown) in docs {
            out.push_str(&format!("\n--- {} ---\n{}\n", role.file_name(), markdown));
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        Self::render_section(
            &mut out,
            "EXISTING MEMORY BANK FILES (not regenerated in this run)",
            &self.seeded,
        );
        Self::render_section(
            &mut out,
            "MEMORY BANK FILES GENERATED IN THIS SESSION",
            &self.generated,
        );
        out
    }
}

/// Builds the prompt for `role`: shared project context, the accumulated
/// documents and, when revising, the role's own previous document.
pub fn build_prompt(
    role: AgentRole,
    project_context: &str,
    accumulated: &AccumulatedContext,
    previous_version: Option<&str>,
) -> AgentPrompt {
    let spec = role.spec();
    let mut input = String::with_capacity(project_context.len() + 1024);
    input.push_str(project_context);
    input.push_str(&accumulated.render());

    if let Some(previous) = previous_version {
        input.push_str(&format!(
            "\n=== CURRENT VERSION OF {} ===\n{}\n",
            spec.file_name,
            truncate_text(previous, accumulated.limit)
        ));
        input.push_str(
            "\nRevise this document so it reflects the project as it is now. \
             Keep accurate content, correct outdated statements and add what is missing.\n",
        );
    }

    input.push_str(&format!(
        "\n=== TASK ===\n{} for the {} memory bank file. \
         Respond with the complete markdown document only.\n",
        spec.description, spec.file_name
    ));

    AgentPrompt {
        instructions: spec.instructions.to_string(),
        input,
    }
}
