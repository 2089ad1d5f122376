//! Session reports and the persisted token-usage JSON.

pub mod files;
pub mod pricing;

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::SessionMode;
use crate::pipeline::AgentRunResult;

pub use files::ReportDirectory;
pub use pricing::{estimate_cost, ModelPricing};

/// Aggregate over one `init`/`update`/`refresh` invocation.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub session_id: String,
    pub project_path: PathBuf,
    pub model: String,
    pub command: SessionMode,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration: Duration,
    /// One entry per planned agent, in execution order.
    pub results: Vec<AgentRunResult>,
}

impl SessionReport {
    pub fn total_prompt_tokens(&self) -> u64 {
        self.results.iter().map(|r| r.prompt_tokens).sum()
    }

    pub fn total_completion_tokens(&self) -> u64 {
        self.results.iter().map(|r| r.completion_tokens).sum()
    }

    pub fn total_tokens(&self) -> u64 {
        self.results.iter().map(|r| r.total_tokens).sum()
    }

    pub fn successful_agents(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed_agents(&self) -> usize {
        self.results.len() - self.successful_agents()
    }

    /// `None` when pricing for the model is unknown.
    pub fn total_cost_usd(&self) -> Option<f64> {
        estimate_cost(
            &self.model,
            self.total_prompt_tokens(),
            self.total_completion_tokens(),
        )
    }

    /// Process exit code: partial success is still success; only a session
    /// where no planned agent succeeded is reported as a failure.
    pub fn exit_code(&self) -> u8 {
        if self.successful_agents() > 0 {
            0
        } else {
            1
        }
    }

    pub fn to_token_report(&self) -> TokenUsageReport {
        TokenUsageReport {
            session_id: self.session_id.clone(),
            project_path: self.project_path.display().to_string(),
            model: self.model.clone(),
            command: self.command.as_str().to_string(),
            start_time: self.start_time,
            end_time: Some(self.end_time),
            total_duration_seconds: self.duration.as_secs_f64(),
            total_prompt_tokens: self.total_prompt_tokens(),
            total_completion_tokens: self.total_completion_tokens(),
            total_tokens: self.total_tokens(),
            total_cost_usd: self.total_cost_usd().unwrap_or(0.0),
            successful_agents: self.successful_agents(),
            failed_agents: self.failed_agents(),
            agent_usage: self
                .results
                .iter()
                .map(|r| AgentUsage {
                    agent_name: r.role.as_str().to_string(),
                    prompt_tokens: r.prompt_tokens,
                    completion_tokens: r.completion_tokens,
                    total_tokens: r.total_tokens,
                    model: self.model.clone(),
                    start_time: Some(r.started_at),
                    end_time: Some(r.finished_at),
                    duration_seconds: r.duration.as_secs_f64(),
                    success: r.success,
                    error: r.error.as_ref().map(|e| e.to_string()),
                })
                .collect(),
        }
    }
}

/// On-disk token usage report, read back by the `tokens` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenUsageReport {
    pub session_id: String,
    pub project_path: String,
    pub model: String,
    pub command: String,
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub total_duration_seconds: f64,
    #[serde(default)]
    pub total_prompt_tokens: u64,
    #[serde(default)]
    pub total_completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub total_cost_usd: f64,
    #[serde(default)]
    pub successful_agents: usize,
    #[serde(default)]
    pub failed_agents: usize,
    #[serde(default)]
    pub agent_usage: Vec<AgentUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentUsage {
    pub agent_name: String,
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

fn default_success() -> bool {
    true
}

const RULE: &str = "============================================================";

/// Human-readable summary shown after a session and by `tokens`.
pub fn format_token_report(report: &TokenUsageReport) -> String {
    let mut lines = vec![
        String::new(),
        RULE.to_string(),
        "TOKEN USAGE REPORT".to_string(),
        RULE.to_string(),
        format!("Command: {}", report.command),
        format!("Model: {}", report.model),
        format!("Total Duration: {:.1}s", report.total_duration_seconds),
        format!(
            "Successful Agents: {}/{}",
            report.successful_agents,
            report.agent_usage.len()
        ),
        String::new(),
        format!("Total Prompt Tokens: {}", group_digits(report.total_prompt_tokens)),
        format!(
            "Total Completion Tokens: {}",
            group_digits(report.total_completion_tokens)
        ),
        format!("Total Tokens: {}", group_digits(report.total_tokens)),
    ];

    // a priced model with zero tokens still has a known cost of $0
    match pricing::model_family(&report.model) {
        Some(family) => lines.push(format!(
            "Estimated Cost: ${:.4} USD ({} pricing)",
            report.total_cost_usd, family
        )),
        None => lines.push("Cost calculation not available".to_string()),
    }

    if !report.agent_usage.is_empty() {
        lines.push(String::new());
        lines.push("Per-Agent Breakdown:".to_string());
        for usage in &report.agent_usage {
            let mark = if usage.success { "✓" } else { "✗" };
            let duration = if usage.duration_seconds > 0.0 {
                format!("{:.1}s", usage.duration_seconds)
            } else {
                "N/A".to_string()
            };
            lines.push(format!(
                "  {} {:<16} | Tokens: {:>7} | Duration: {:>7}",
                mark,
                usage.agent_name,
                group_digits(usage.total_tokens),
                duration
            ));
            if let Some(error) = usage.error.as_deref().filter(|_| !usage.success) {
                lines.push(format!("     Error: {}", error));
            }
        }
    }

    lines.push(RULE.to_string());
    lines.join("\n")
}

/// One-line listing entry for `tokens --list-all`.
pub fn format_report_listing(report: &TokenUsageReport) -> String {
    format!(
        "Command: {} | Model: {} | Tokens: {} | Cost: ${:.4} | Date: {}",
        report.command,
        report.model,
        group_digits(report.total_tokens),
        report.total_cost_usd,
        report.start_time.format("%Y-%m-%d %H:%M")
    )
}

fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentRole;
    use crate::pipeline::{AgentError, AgentErrorKind};
    use chrono::NaiveDate;

    fn at(sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(10, 0, sec)
            .unwrap()
    }

    fn result(role: AgentRole, success: bool) -> AgentRunResult {
        AgentRunResult {
            role,
            success,
            output_markdown: success.then(|| "# doc".to_string()),
            error: (!success).then(|| AgentError::new(AgentErrorKind::Invocation, "boom")),
            started_at: at(0),
            finished_at: at(2),
            duration: Duration::from_secs(2),
            prompt_tokens: 1000,
            completion_tokens: 500,
            total_tokens: 1500,
        }
    }

    fn session(results: Vec<AgentRunResult>) -> SessionReport {
        SessionReport {
            session_id: "session-1".to_string(),
            project_path: PathBuf::from("/tmp/project"),
            model: "gpt-4o".to_string(),
            command: SessionMode::Init,
            start_time: at(0),
            end_time: at(30),
            duration: Duration::from_secs(30),
            results,
        }
    }

    #[test]
    fn test_totals_and_exit_code() {
        let report = session(vec![
            result(AgentRole::ProjectBrief, true),
            result(AgentRole::ProductContext, false),
        ]);
        assert_eq!(report.total_tokens(), 3000);
        assert_eq!(report.successful_agents(), 1);
        assert_eq!(report.failed_agents(), 1);
        assert_eq!(report.exit_code(), 0);

        let failed = session(vec![result(AgentRole::ProjectBrief, false)]);
        assert_eq!(failed.exit_code(), 1);
    }

    #[test]
    fn test_token_report_json_shape() {
        let report = session(vec![
            result(AgentRole::ProjectBrief, true),
            result(AgentRole::AiGuidelines, false),
        ]);
        let json = serde_json::to_value(report.to_token_report()).unwrap();

        for key in [
            "session_id",
            "project_path",
            "model",
            "command",
            "start_time",
            "end_time",
            "total_duration_seconds",
            "total_prompt_tokens",
            "total_completion_tokens",
            "total_tokens",
            "total_cost_usd",
            "successful_agents",
            "failed_agents",
            "agent_usage",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["command"], "init");
        assert_eq!(json["start_time"], "2025-03-14T10:00:00");
        assert_eq!(json["total_tokens"], 3000);

        let usage = &json["agent_usage"][1];
        assert_eq!(usage["agent_name"], "aiGuidelines");
        assert_eq!(usage["success"], false);
        assert_eq!(usage["duration_seconds"], 2.0);
        assert!(usage["error"].as_str().unwrap().contains("boom"));
        assert!(json["agent_usage"][0]["error"].is_null());
    }

    #[test]
    fn test_loads_report_with_fractional_timestamps() {
        let json = r#"{
            "session_id": "abc",
            "project_path": "/p",
            "model": "gpt-4o-mini",
            "command": "update",
            "start_time": "2025-01-02T03:04:05.123456",
            "end_time": null,
            "total_tokens": 42,
            "agent_usage": [{"agent_name": "progress", "start_time": null}]
        }"#;
        let report: TokenUsageReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.total_tokens, 42);
        assert!(report.end_time.is_none());
        assert!(report.agent_usage[0].success);
    }

    #[test]
    fn test_format_token_report() {
        let report = session(vec![
            result(AgentRole::ProjectBrief, true),
            result(AgentRole::Progress, false),
        ])
        .to_token_report();

        let text = format_token_report(&report);
        assert!(text.contains("TOKEN USAGE REPORT"));
        assert!(text.contains("Successful Agents: 1/2"));
        assert!(text.contains("Total Tokens: 3,000"));
        assert!(text.contains("Estimated Cost: $"));
        assert!(text.contains("✗ progress"));
        assert!(text.contains("Error: "));
    }

    #[test]
    fn test_unknown_model_has_no_cost() {
        let mut report = session(vec![result(AgentRole::ProjectBrief, true)]);
        report.model = "local-llama".to_string();
        assert_eq!(report.total_cost_usd(), None);

        let text = format_token_report(&report.to_token_report());
        assert!(text.contains("Cost calculation not available"));
    }

    #[test]
    fn test_priced_model_without_tokens_shows_zero_cost() {
        let mut report = session(vec![result(AgentRole::ProjectBrief, false)]);
        report.model = "gpt-4.1-mini".to_string();
        for r in &mut report.results {
            r.prompt_tokens = 0;
            r.completion_tokens = 0;
            r.total_tokens = 0;
        }
        assert_eq!(report.total_cost_usd(), Some(0.0));

        let text = format_token_report(&report.to_token_report());
        assert!(text.contains("Estimated Cost: $0.0000 USD (gpt-4.1-mini pricing)"));
        assert!(!text.contains("not available"));
    }

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(1234567), "1,234,567");
    }
}
