//! Pipeline executor: runs the agent plan sequentially, feeding each agent
//! the project context plus every earlier successful output of the session.

pub mod context;
pub mod executor;
pub mod result;

use std::path::PathBuf;

use crate::agents::AgentInvoker;
use crate::config::{RunConfig, SessionMode};
use crate::context::ContextCollector;
use crate::error::{MemoryBankError, Result};
use crate::report::{ReportDirectory, SessionReport};
use crate::store::MemoryBankStore;

pub use context::{build_prompt, AccumulatedContext, MAX_PRIOR_OUTPUT_CHARS};
pub use executor::{NoopObserver, PipelineExecutor, PipelineObserver};
pub use result::{AgentError, AgentErrorKind, AgentRunResult, AgentState};

/// What a finished session leaves behind.
#[derive(Debug)]
pub struct SessionOutcome {
    pub report: SessionReport,
    /// Saved token report, `None` when it could not be written.
    pub report_path: Option<PathBuf>,
}

/// Runs one `init`/`update`/`refresh` session end to end: preconditions,
/// context collection, agent execution and report persistence.
pub async fn run_session(
    config: &RunConfig,
    invoker: &dyn AgentInvoker,
    observer: &dyn PipelineObserver,
) -> Result<SessionOutcome> {
    let store = MemoryBankStore::new(&config.project_path);

    match config.mode {
        SessionMode::Update if !store.exists() => {
            return Err(MemoryBankError::MemoryBankNotFound(
                store.dir().display().to_string(),
            ));
        }
        SessionMode::Init => {
            let existing = store.list_existing();
            if !existing.is_empty() {
                tracing::warn!(
                    "{} existing memory bank files will be overwritten; consider 'update'",
                    existing.len()
                );
            }
        }
        _ => {}
    }

    let context = ContextCollector::new().collect(&config.project_path)?;
    let report = PipelineExecutor::new(invoker, &store, config)
        .run(&context, observer)
        .await;

    let reports = ReportDirectory::new(store.reports_dir());
    let report_path = match reports.save(&report.to_token_report()) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!("Could not save token usage report: {}", e);
            None
        }
    };

    Ok(SessionOutcome {
        report,
        report_path,
    })
}
