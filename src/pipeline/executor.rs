use std::time::Instant;

use chrono::Local;

use crate::agents::{AgentInvoker, AgentPrompt, AgentRole};
use crate::config::{RunConfig, SessionMode};
use crate::context::ProjectContext;
use crate::error::MemoryBankError;
use crate::report::SessionReport;
use crate::store::MemoryBankStore;

use super::context::{build_prompt, AccumulatedContext};
use super::result::{AgentError, AgentErrorKind, AgentRunResult, AgentState, RunTiming};

/// Progress hook. Every method has a no-op default.
pub trait PipelineObserver: Send + Sync {
    fn session_started(&self, _mode: SessionMode, _plan: &[AgentRole]) {}

    fn agent_started(&self, _role: AgentRole, _position: usize, _total: usize) {}

    fn agent_finished(&self, _result: &AgentRunResult) {}
}

pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Runs a plan one agent at a time.
pub struct PipelineExecutor<'a> {
    invoker: &'a dyn AgentInvoker,
    store: &'a MemoryBankStore,
    config: &'a RunConfig,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(
        invoker: &'a dyn AgentInvoker,
        store: &'a MemoryBankStore,
        config: &'a RunConfig,
    ) -> Self {
        Self {
            invoker,
            store,
            config,
        }
    }

    /// Executes every planned agent to a terminal state. A failing agent never
    /// stops the session; each success is persisted before the next agent runs.
    pub async fn run(
        &self,
        context: &ProjectContext,
        observer: &dyn PipelineObserver,
    ) -> SessionReport {
        let session_id = uuid::Uuid::new_v4().to_string();
        let start_time = Local::now().naive_local();
        let session_clock = Instant::now();
        let plan = &self.config.plan;

        tracing::info!(
            session = %session_id,
            command = %self.config.mode,
            agents = plan.len(),
            "Starting memory bank session"
        );

        let project_context = context.render();
        let mut accumulated = AccumulatedContext::default();
        if self.config.mode.seeds_from_disk() {
            self.seed_unplanned(&mut accumulated);
        }

        observer.session_started(self.config.mode, plan);

        let mut results = Vec::with_capacity(plan.len());
        for (index, role) in plan.iter().copied().enumerate() {
            let previous = if self.config.mode.seeds_from_disk() {
                self.read_existing(role)
            } else {
                None
            };
            let prompt = build_prompt(role, &project_context, &accumulated, previous.as_deref());

            observer.agent_started(role, index + 1, plan.len());
            tracing::info!(agent = %role, state = %AgentState::Running, "Agent started");

            let result = self.run_agent(role, &prompt, &mut accumulated).await;

            match &result.error {
                None => tracing::info!(
                    agent = %role,
                    tokens = result.total_tokens,
                    elapsed_ms = result.duration.as_millis() as u64,
                    "Agent succeeded"
                ),
                Some(error) => tracing::warn!(
                    agent = %role,
                    state = %result.state(),
                    "Agent did not succeed: {}",
                    error
                ),
            }

            observer.agent_finished(&result);
            results.push(result);
        }

        let report = SessionReport {
            session_id,
            project_path: self.config.project_path.clone(),
            model: self.config.model.clone(),
            command: self.config.mode,
            start_time,
            end_time: Local::now().naive_local(),
            duration: session_clock.elapsed(),
            results,
        };

        tracing::info!(
            succeeded = report.successful_agents(),
            failed = report.failed_agents(),
            "Memory bank session finished"
        );
        report
    }

    async fn run_agent(
        &self,
        role: AgentRole,
        prompt: &AgentPrompt,
        accumulated: &mut AccumulatedContext,
    ) -> AgentRunResult {
        let started_at = Local::now().naive_local();
        let clock = Instant::now();
        let timeout = self.config.timeout;

        let outcome = tokio::time::timeout(
            timeout,
            self.invoker.invoke(role, prompt, &self.config.model, timeout),
        )
        .await;

        let timing = RunTiming {
            started_at,
            finished_at: Local::now().naive_local(),
            duration: clock.elapsed(),
        };

        let call = match outcome {
            Err(_elapsed) => {
                return AgentRunResult::failed(
                    role,
                    MemoryBankError::AgentTimeout(timeout.as_secs()).into(),
                    timing,
                );
            }
            Ok(Err(err)) => return AgentRunResult::failed(role, err.into(), timing),
            Ok(Ok(call)) => call,
        };

        if call.markdown.trim().is_empty() {
            return AgentRunResult::failed(
                role,
                AgentError::new(AgentErrorKind::Invocation, "agent returned empty output"),
                timing,
            );
        }

        match self.store.write(role, &call.markdown) {
            Ok(_) => {
                accumulated.record(role, &call.markdown);
                AgentRunResult::succeeded(role, call, timing)
            }
            Err(err) => AgentRunResult::unpersisted(role, call, err.into(), timing),
        }
    }

    /// Seeds on-disk documents of roles that are not in the plan.
    fn seed_unplanned(&self, accumulated: &mut AccumulatedContext) {
        for role in self.store.list_existing() {
            if self.config.plan.contains(&role) {
                continue;
            }
            if let Some(markdown) = self.read_existing(role) {
                tracing::debug!(agent = %role, "Seeding context from existing file");
                accumulated.seed(role, &markdown);
            }
        }
    }

    fn read_existing(&self, role: AgentRole) -> Option<String> {
        match self.store.read(role) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(agent = %role, "Could not read existing memory bank file: {}", e);
                None
            }
        }
    }
}
