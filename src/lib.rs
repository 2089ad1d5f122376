pub mod agents;
pub mod config;
pub mod context;
pub mod error;
pub mod git;
pub mod pipeline;
pub mod report;
pub mod store;

pub use agents::{
    select_agents, AgentCallResult, AgentClient, AgentClientConfig, AgentInvoker, AgentPrompt,
    AgentRole,
};
pub use config::{RunConfig, RunOptions, SessionMode};
pub use context::{ContextCollector, ProjectContext};
pub use error::{MemoryBankError, Result};
pub use git::{ChangeStatus, ChangedFile, CommitSummary, GitAnalyzer};
pub use pipeline::{
    run_session, AgentError, AgentErrorKind, AgentRunResult, AgentState, NoopObserver,
    PipelineExecutor, PipelineObserver, SessionOutcome,
};
pub use report::{ReportDirectory, SessionReport, TokenUsageReport};
pub use store::MemoryBankStore;
