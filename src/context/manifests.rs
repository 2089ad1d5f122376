//! Dependency manifest detection and parsing.
//!
//! Only the project root is probed. Every recognized manifest contributes its
//! raw text; the parsed dependency list is best-effort and a manifest that
//! fails to parse is still reported with its excerpt.

use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MemoryBankError, Result};

use super::{excerpt, read_prefix};

/// Manifests past this size are kept as an excerpt and not parsed.
pub const MAX_MANIFEST_BYTES: u64 = 1024 * 1024;

/// Supported package ecosystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Cargo,
    Npm,
    Python,
    Go,
}

impl Ecosystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Cargo => "cargo",
            Ecosystem::Npm => "npm",
            Ecosystem::Python => "python",
            Ecosystem::Go => "go",
        }
    }

    /// Returns the manifest file names for this ecosystem
    pub fn manifest_names(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::Cargo => &["Cargo.toml"],
            Ecosystem::Npm => &["package.json"],
            Ecosystem::Python => &["pyproject.toml", "requirements.txt", "Pipfile"],
            Ecosystem::Go => &["go.mod"],
        }
    }
}

const ECOSYSTEMS: [Ecosystem; 4] = [
    Ecosystem::Python,
    Ecosystem::Npm,
    Ecosystem::Cargo,
    Ecosystem::Go,
];

/// A declared project dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    /// Version requirement as written, or `*` when none is given
    pub version: String,
    pub is_dev: bool,
}

impl Dependency {
    fn new(name: impl Into<String>, version: impl Into<String>, is_dev: bool) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            is_dev,
        }
    }
}

/// One manifest file found at the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub ecosystem: Ecosystem,
    pub file_name: String,
    pub excerpt: String,
    pub dependencies: Vec<Dependency>,
    /// False when the file could not be parsed and only the excerpt is available.
    pub parsed: bool,
}

/// All manifests recognized in a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyInfo {
    pub manifests: Vec<Manifest>,
}

impl DependencyInfo {
    /// Probes `root` for known manifests. Never fails: unreadable files are
    /// skipped, and content that is not UTF-8 is decoded lossily.
    pub fn detect(root: &Path) -> Self {
        let mut manifests = Vec::new();

        for ecosystem in ECOSYSTEMS {
            for file_name in ecosystem.manifest_names() {
                let path = root.join(file_name);
                if !path.is_file() {
                    continue;
                }
                let (content, clipped) = match read_prefix(&path, MAX_MANIFEST_BYTES) {
                    Ok(read) => read,
                    Err(e) => {
                        tracing::warn!("Skipping unreadable manifest {}: {}", path.display(), e);
                        continue;
                    }
                };

                let parse_result = if clipped {
                    Err(MemoryBankError::Parse(format!(
                        "larger than {} bytes",
                        MAX_MANIFEST_BYTES
                    )))
                } else {
                    parse_manifest(file_name, &content)
                };
                let (dependencies, parsed) = match parse_result {
                    Ok(deps) => (deps, true),
                    Err(e) => {
                        tracing::debug!("Manifest {} kept as raw text: {}", file_name, e);
                        (Vec::new(), false)
                    }
                };

                manifests.push(Manifest {
                    ecosystem,
                    file_name: file_name.to_string(),
                    excerpt: excerpt(&content, clipped),
                    dependencies,
                    parsed,
                });
            }
        }

        Self { manifests }
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    /// Distinct ecosystems, in detection order.
    pub fn ecosystems(&self) -> Vec<Ecosystem> {
        let mut out: Vec<Ecosystem> = Vec::new();
        for manifest in &self.manifests {
            if !out.contains(&manifest.ecosystem) {
                out.push(manifest.ecosystem);
            }
        }
        out
    }

    pub fn get(&self, file_name: &str) -> Option<&Manifest> {
        self.manifests.iter().find(|m| m.file_name == file_name)
    }

    /// Case-insensitive check for any of `names` among the parsed dependencies
    /// of manifests in `ecosystem`.
    pub fn has_any_dependency(&self, ecosystem: Ecosystem, names: &[&str]) -> bool {
        self.manifests
            .iter()
            .filter(|m| m.ecosystem == ecosystem)
            .flat_map(|m| m.dependencies.iter())
            .any(|dep| names.iter().any(|n| dep.name.eq_ignore_ascii_case(n)))
    }

    pub fn render(&self) -> String {
        if self.manifests.is_empty() {
            return "No dependency manifests found.".to_string();
        }

        let mut sections = Vec::new();
        for manifest in &self.manifests {
            let mut lines = vec![format!(
                "--- {} ({}) ---",
                manifest.file_name,
                manifest.ecosystem.as_str()
            )];

            let (dev, runtime): (Vec<&Dependency>, Vec<&Dependency>) =
                manifest.dependencies.iter().partition(|d| d.is_dev);
            if !runtime.is_empty() {
                lines.push(format!("Dependencies: {}", join_deps(&runtime)));
            }
            if !dev.is_empty() {
                lines.push(format!("Dev dependencies: {}", join_deps(&dev)));
            }

            lines.push(manifest.excerpt.clone());
            sections.push(lines.join("\n"));
        }
        sections.join("\n\n")
    }
}

fn join_deps(deps: &[&Dependency]) -> String {
    deps.iter()
        .map(|d| {
            if d.version == "*" {
                d.name.clone()
            } else {
                format!("{} {}", d.name, d.version)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_manifest(file_name: &str, content: &str) -> Result<Vec<Dependency>> {
    match file_name {
        "Cargo.toml" => parse_cargo_toml(content),
        "package.json" => parse_package_json(content),
        "pyproject.toml" => parse_pyproject(content),
        "requirements.txt" => Ok(parse_requirements(content)),
        "Pipfile" => parse_pipfile(content),
        "go.mod" => Ok(parse_go_mod(content)),
        other => Err(MemoryBankError::Parse(format!(
            "no parser for manifest {}",
            other
        ))),
    }
}

fn parse_toml(content: &str, file_name: &str) -> Result<toml::Value> {
    content.parse().map_err(|e: toml::de::Error| {
        MemoryBankError::Parse(format!("Invalid {}: {}", file_name, e))
    })
}

/// Parses `[dependencies]`, `[dev-dependencies]`, `[build-dependencies]` and
/// `[workspace.dependencies]` of a Cargo manifest.
pub fn parse_cargo_toml(content: &str) -> Result<Vec<Dependency>> {
    let value = parse_toml(content, "Cargo.toml")?;
    let mut deps = Vec::new();

    if let Some(table) = value.get("dependencies") {
        deps.extend(parse_cargo_table(table, false));
    }
    if let Some(table) = value.get("dev-dependencies") {
        deps.extend(parse_cargo_table(table, true));
    }
    if let Some(table) = value.get("build-dependencies") {
        deps.extend(parse_cargo_table(table, true));
    }
    if let Some(table) = value.get("workspace").and_then(|w| w.get("dependencies")) {
        deps.extend(parse_cargo_table(table, false));
    }

    Ok(deps)
}

fn parse_cargo_table(table: &toml::Value, is_dev: bool) -> Vec<Dependency> {
    let Some(map) = table.as_table() else {
        return Vec::new();
    };

    map.iter()
        .map(|(name, value)| {
            let version = match value {
                // dependency = "1.0"
                toml::Value::String(v) => v.clone(),
                // dependency = { version = "1.0", features = [...] }
                toml::Value::Table(t) => {
                    if let Some(v) = t.get("version").and_then(|v| v.as_str()) {
                        v.to_string()
                    } else if t.contains_key("path") {
                        "path".to_string()
                    } else if t.contains_key("git") {
                        "git".to_string()
                    } else if t.get("workspace").and_then(|w| w.as_bool()) == Some(true) {
                        "workspace".to_string()
                    } else {
                        "*".to_string()
                    }
                }
                _ => "*".to_string(),
            };
            Dependency::new(name, version, is_dev)
        })
        .collect()
}

/// Minimal representation of package.json
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    #[serde(default)]
    dependencies: Option<BTreeMap<String, String>>,
    #[serde(default)]
    dev_dependencies: Option<BTreeMap<String, String>>,
    #[serde(default)]
    peer_dependencies: Option<BTreeMap<String, String>>,
}

pub fn parse_package_json(content: &str) -> Result<Vec<Dependency>> {
    let pkg: PackageJson = serde_json::from_str(content)
        .map_err(|e| MemoryBankError::Parse(format!("Invalid package.json: {}", e)))?;

    let mut deps = Vec::new();
    for (map, is_dev) in [
        (pkg.dependencies, false),
        (pkg.peer_dependencies, false),
        (pkg.dev_dependencies, true),
    ] {
        if let Some(map) = map {
            deps.extend(
                map.into_iter()
                    .map(|(name, version)| Dependency::new(name, version, is_dev)),
            );
        }
    }
    Ok(deps)
}

const PYTHON_DEV_GROUPS: &[&str] = &["dev", "test", "tests", "lint", "docs"];

/// Parses PEP 621 `[project]` dependencies and Poetry's `[tool.poetry]` tables.
pub fn parse_pyproject(content: &str) -> Result<Vec<Dependency>> {
    let value = parse_toml(content, "pyproject.toml")?;
    let mut deps = Vec::new();

    if let Some(project) = value.get("project") {
        if let Some(list) = project.get("dependencies").and_then(|d| d.as_array()) {
            deps.extend(
                list.iter()
                    .filter_map(|v| v.as_str())
                    .filter_map(|spec| parse_requirement(spec, false)),
            );
        }
        if let Some(groups) = project
            .get("optional-dependencies")
            .and_then(|d| d.as_table())
        {
            for (group, list) in groups {
                let is_dev = PYTHON_DEV_GROUPS.contains(&group.as_str());
                if let Some(list) = list.as_array() {
                    deps.extend(
                        list.iter()
                            .filter_map(|v| v.as_str())
                            .filter_map(|spec| parse_requirement(spec, is_dev)),
                    );
                }
            }
        }
    }

    if let Some(poetry) = value.get("tool").and_then(|t| t.get("poetry")) {
        if let Some(table) = poetry.get("dependencies") {
            deps.extend(parse_python_table(table, false));
        }
        if let Some(table) = poetry.get("dev-dependencies") {
            deps.extend(parse_python_table(table, true));
        }
        if let Some(groups) = poetry.get("group").and_then(|g| g.as_table()) {
            for group in groups.values() {
                if let Some(table) = group.get("dependencies") {
                    deps.extend(parse_python_table(table, true));
                }
            }
        }
    }

    Ok(deps)
}

/// Parses `[packages]` and `[dev-packages]` of a Pipfile.
pub fn parse_pipfile(content: &str) -> Result<Vec<Dependency>> {
    let value = parse_toml(content, "Pipfile")?;
    let mut deps = Vec::new();
    if let Some(table) = value.get("packages") {
        deps.extend(parse_python_table(table, false));
    }
    if let Some(table) = value.get("dev-packages") {
        deps.extend(parse_python_table(table, true));
    }
    Ok(deps)
}

fn parse_python_table(table: &toml::Value, is_dev: bool) -> Vec<Dependency> {
    let Some(map) = table.as_table() else {
        return Vec::new();
    };

    map.iter()
        // the interpreter constraint is not a dependency
        .filter(|(name, _)| name.as_str() != "python")
        .map(|(name, value)| {
            let version = match value {
                toml::Value::String(v) => v.clone(),
                toml::Value::Table(t) => t
                    .get("version")
                    .and_then(|v| v.as_str())
                    .unwrap_or("*")
                    .to_string(),
                _ => "*".to_string(),
            };
            Dependency::new(name, version, is_dev)
        })
        .collect()
}

static REQUIREMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)\s*(?:\[[^\]]*\])?\s*([^;]*)")
        .expect("Invalid requirement pattern")
});

fn parse_requirement(spec: &str, is_dev: bool) -> Option<Dependency> {
    let caps = REQUIREMENT_RE.captures(spec.trim())?;
    let name = caps.get(1)?.as_str();
    let version = caps
        .get(2)
        .map(|m| m.as_str().trim())
        .filter(|v| !v.is_empty())
        .unwrap_or("*");
    Some(Dependency::new(name, version, is_dev))
}

/// Parses a pip requirements file. Options, includes and editable installs are skipped.
pub fn parse_requirements(content: &str) -> Vec<Dependency> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty() && !line.starts_with('-'))
        .filter_map(|line| parse_requirement(line, false))
        .collect()
}

/// Parses `require` directives of a go.mod, both single-line and block form.
pub fn parse_go_mod(content: &str) -> Vec<Dependency> {
    let mut deps = Vec::new();
    let mut in_block = false;

    for raw in content.lines() {
        let line = raw.split("//").next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        if in_block {
            if line == ")" {
                in_block = false;
            } else if let Some(dep) = parse_go_requirement(line) {
                deps.push(dep);
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("require") {
            let rest = rest.trim();
            if rest == "(" {
                in_block = true;
            } else if let Some(dep) = parse_go_requirement(rest) {
                deps.push(dep);
            }
        }
    }

    deps
}

fn parse_go_requirement(line: &str) -> Option<Dependency> {
    let mut parts = line.split_whitespace();
    let module = parts.next()?;
    let version = parts.next().unwrap_or("*");
    Some(Dependency::new(module, version, false))
}
