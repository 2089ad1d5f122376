//! Coding-assistant best practices included in every project context.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::manifests::{DependencyInfo, Ecosystem};

/// Coarse project classification used to pick applicable rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Web,
    Frontend,
    Api,
    Database,
    Mobile,
    General,
}

impl ProjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectKind::Web => "web",
            ProjectKind::Frontend => "frontend",
            ProjectKind::Api => "api",
            ProjectKind::Database => "database",
            ProjectKind::Mobile => "mobile",
            ProjectKind::General => "general",
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulePriority {
    Low,
    Medium,
    High,
}

/// Which projects a rule applies to. `All` matches every kind.
#[derive(Debug, Clone, Copy)]
pub enum AppliesTo {
    All,
    Kinds(&'static [ProjectKind]),
}

#[derive(Debug, Clone)]
pub struct ServiceRule {
    pub service: &'static str,
    pub category: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub example: &'static str,
    pub priority: RulePriority,
    pub applies_to: AppliesTo,
}

impl ServiceRule {
    pub fn applies(&self, kind: ProjectKind) -> bool {
        match self.applies_to {
            AppliesTo::All => true,
            AppliesTo::Kinds(kinds) => kinds.contains(&kind),
        }
    }
}

macro_rules! rule {
    ($service:literal, $category:literal, $title:literal, $description:literal, $example:literal, $priority:ident, $applies:expr) => {
        ServiceRule {
            service: $service,
            category: $category,
            title: $title,
            description: $description,
            example: $example,
            priority: RulePriority::$priority,
            applies_to: $applies,
        }
    };
}

pub static RULES: &[ServiceRule] = &[
    rule!(
        "Cursor",
        "code_context",
        "Provide Clear Context in Comments",
        "Explain what non-obvious code does, especially complex logic.",
        "// Validates JWT tokens and checks the session cache",
        High,
        AppliesTo::All
    ),
    rule!(
        "Cursor",
        "file_organization",
        "Use Descriptive File and Function Names",
        "Names should state purpose and behavior.",
        "get_user_authentication_status() instead of check_user()",
        Medium,
        AppliesTo::All
    ),
    rule!(
        "Cursor",
        "error_handling",
        "Implement Comprehensive Error Handling",
        "Handle edge cases and return meaningful error messages.",
        "return Err(ProcessingError::new(\"user data validation failed\", source));",
        High,
        AppliesTo::All
    ),
    rule!(
        "Windsurf",
        "code_consistency",
        "Follow Established Patterns",
        "Stay consistent with the conventions already present in the codebase.",
        "If the codebase uses async/await, keep using it.",
        High,
        AppliesTo::All
    ),
    rule!(
        "Windsurf",
        "dependency_management",
        "Minimize External Dependencies",
        "Prefer built-in solutions when they are reasonable.",
        "",
        Medium,
        AppliesTo::All
    ),
    rule!(
        "Windsurf",
        "performance",
        "Optimize for Common Use Cases",
        "Make the most frequent operations fast.",
        "Cache frequently accessed data and pick suitable data structures.",
        Medium,
        AppliesTo::All
    ),
    rule!(
        "Copilot",
        "testing",
        "Write Tests for All Public Functions",
        "Every public function should have corresponding unit tests.",
        "",
        High,
        AppliesTo::All
    ),
    rule!(
        "Copilot",
        "documentation",
        "Document Function Parameters and Return Values",
        "Use doc comments or docstrings to describe interfaces.",
        "",
        Medium,
        AppliesTo::All
    ),
    rule!(
        "Copilot",
        "security",
        "Validate All User Inputs",
        "Never trust user input; validate and sanitize it.",
        "",
        High,
        AppliesTo::All
    ),
    rule!(
        "Claude",
        "code_clarity",
        "Prefer Explicit Over Implicit",
        "Make intent obvious and avoid hidden behavior.",
        "Explicit types, clear variable names, obvious control flow.",
        High,
        AppliesTo::All
    ),
    rule!(
        "Claude",
        "modularity",
        "Design for Reusability",
        "Build small composable functions with a single responsibility.",
        "",
        Medium,
        AppliesTo::All
    ),
    rule!(
        "Claude",
        "configuration",
        "Use Configuration Files for Settings",
        "Keep environment-specific settings out of code.",
        "Use .env files, config.toml or similar.",
        Medium,
        AppliesTo::All
    ),
    rule!(
        "General",
        "code_review",
        "Follow Language-Specific Best Practices",
        "Adhere to the conventions of the language in use.",
        "Python: PEP 8. Rust: rustfmt and clippy.",
        High,
        AppliesTo::All
    ),
    rule!(
        "General",
        "git_practices",
        "Write Meaningful Commit Messages",
        "Commit messages should explain what changed and why.",
        "'Add user authentication validation' instead of 'Update auth.js'",
        Medium,
        AppliesTo::All
    ),
    rule!(
        "General",
        "logging",
        "Implement Structured Logging",
        "Use consistent levels and structured fields.",
        "",
        Medium,
        AppliesTo::All
    ),
    rule!(
        "General",
        "api_design",
        "Design RESTful APIs",
        "Follow REST principles when building web services.",
        "GET /users/:id, POST /users, PUT /users/:id",
        Medium,
        AppliesTo::Kinds(&[ProjectKind::Web, ProjectKind::Api])
    ),
    rule!(
        "General",
        "database",
        "Use Database Migrations",
        "Version schema changes with migration files.",
        "Never edit a migration that has already been applied.",
        High,
        AppliesTo::Kinds(&[ProjectKind::Database])
    ),
    rule!(
        "General",
        "frontend",
        "Implement Responsive Design",
        "Make the UI work across screen sizes and devices.",
        "CSS Grid/Flexbox, media queries, mobile-first layouts.",
        Medium,
        AppliesTo::Kinds(&[ProjectKind::Frontend, ProjectKind::Web])
    ),
    rule!(
        "General",
        "mobile",
        "Respect Platform Guidelines",
        "Follow the platform's UI conventions and lifecycle rules.",
        "",
        Medium,
        AppliesTo::Kinds(&[ProjectKind::Mobile])
    ),
    rule!(
        "General",
        "collaboration",
        "Use Type Annotations",
        "Give other developers type information for every interface.",
        "",
        Medium,
        AppliesTo::All
    ),
    rule!(
        "General",
        "collaboration",
        "Include Setup Instructions",
        "Document how to set up the development environment.",
        "README with prerequisites, installation and a getting started guide.",
        High,
        AppliesTo::All
    ),
];

const FRONTEND_PACKAGES: &[&str] = &["react", "vue", "angular", "@angular/core", "svelte"];
const API_PACKAGES: &[&str] = &["express", "fastify", "koa", "hapi"];
const PYTHON_WEB_PACKAGES: &[&str] = &["django", "flask", "fastapi", "tornado"];
const RUST_WEB_CRATES: &[&str] = &["axum", "actix-web", "rocket", "warp", "poem"];
const GO_WEB_MODULES: &[&str] = &["github.com/gin-gonic/gin", "github.com/labstack/echo/v4"];
const DATABASE_PATHS: &[&str] = &["models.py", "schema.sql", "migrations", "alembic"];
const MOBILE_PATHS: &[&str] = &["android", "ios", "flutter", "react-native"];

/// Classifies the project from its manifests and well-known top-level paths.
/// Returns `[General]` when nothing specific is found.
pub fn detect_project_kinds(root: &Path, deps: &DependencyInfo) -> Vec<ProjectKind> {
    let mut kinds = Vec::new();
    let mut push = |kind: ProjectKind| {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    };

    if deps.get("package.json").is_some() {
        push(ProjectKind::Web);
        if deps.has_any_dependency(Ecosystem::Npm, FRONTEND_PACKAGES) {
            push(ProjectKind::Frontend);
        }
        if deps.has_any_dependency(Ecosystem::Npm, API_PACKAGES) {
            push(ProjectKind::Api);
        }
    }

    let web_backend = deps.has_any_dependency(Ecosystem::Python, PYTHON_WEB_PACKAGES)
        || deps.has_any_dependency(Ecosystem::Cargo, RUST_WEB_CRATES)
        || deps.has_any_dependency(Ecosystem::Go, GO_WEB_MODULES);
    if web_backend {
        push(ProjectKind::Web);
        push(ProjectKind::Api);
    }

    if DATABASE_PATHS.iter().any(|p| root.join(p).exists()) {
        push(ProjectKind::Database);
    }
    if MOBILE_PATHS.iter().any(|p| root.join(p).exists()) {
        push(ProjectKind::Mobile);
    }

    if kinds.is_empty() {
        kinds.push(ProjectKind::General);
    }
    kinds
}

/// Rules matching any of `kinds`, deduplicated by (service, category, title)
/// and kept in table order.
pub fn applicable_rules(kinds: &[ProjectKind]) -> Vec<&'static ServiceRule> {
    let mut seen = HashSet::new();
    RULES
        .iter()
        .filter(|rule| kinds.iter().any(|k| rule.applies(*k)))
        .filter(|rule| seen.insert((rule.service, rule.category, rule.title)))
        .collect()
}

/// Renders rules grouped by category, in first-appearance order.
pub fn format_rules_markdown(rules: &[&ServiceRule]) -> String {
    if rules.is_empty() {
        return String::new();
    }

    let mut categories: Vec<&str> = Vec::new();
    for rule in rules {
        if !categories.contains(&rule.category) {
            categories.push(rule.category);
        }
    }

    let mut out = vec![
        "## AI Assistant Best Practices and Patterns".to_string(),
        String::new(),
        "*Practices recommended by AI coding assistants to improve code quality, maintainability and collaboration.*".to_string(),
        String::new(),
    ];

    for category in categories {
        out.push(format!("### {}", title_case(category)));
        for rule in rules.iter().filter(|r| r.category == category) {
            out.push(format!("**{}** ({})", rule.title, rule.service));
            out.push(rule.description.to_string());
            if !rule.example.is_empty() {
                out.push("```".to_string());
                out.push(rule.example.to_string());
                out.push("```".to_string());
            }
            out.push(String::new());
        }
    }

    out.join("\n")
}

fn title_case(category: &str) -> String {
    category
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
