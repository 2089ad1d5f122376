use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use memory_banker::{AgentRole, AgentRunResult, PipelineObserver, SessionMode};

/// Console progress: one spinner per running agent, a result line when it ends.
#[derive(Default)]
pub struct SpinnerObserver {
    current: Mutex<Option<ProgressBar>>,
}

impl SpinnerObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.cyan} [{prefix}] {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl PipelineObserver for SpinnerObserver {
    fn session_started(&self, mode: SessionMode, plan: &[AgentRole]) {
        let names = plan
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!("Running {} agent(s) for {}: {}", plan.len(), mode, names);
    }

    fn agent_started(&self, role: AgentRole, position: usize, total: usize) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::spinner_style());
        bar.set_prefix(format!("{}/{}", position, total));
        bar.set_message(format!("{}: {}", role, role.spec().description));
        bar.enable_steady_tick(Duration::from_millis(120));

        if let Ok(mut current) = self.current.lock() {
            *current = Some(bar);
        }
    }

    fn agent_finished(&self, result: &AgentRunResult) {
        if let Ok(mut current) = self.current.lock() {
            if let Some(bar) = current.take() {
                bar.finish_and_clear();
            }
        }

        let mark = if result.success { "✓" } else { "✗" };
        let mut line = format!(
            "{} {} ({:.1}s)",
            mark,
            result.role,
            result.duration.as_secs_f64()
        );
        if let Some(error) = &result.error {
            line.push_str(&format!(" - {}", error));
        }
        println!("{}", line);
    }
}
