use std::path::Path;
use std::process::ExitCode;

use memory_banker::context::resolve_project_path;
use memory_banker::error::Result;
use memory_banker::report::{format_report_listing, format_token_report};
use memory_banker::{
    run_session, AgentClient, AgentClientConfig, MemoryBankStore, ReportDirectory, RunConfig,
    RunOptions, SessionMode,
};

use super::progress::SpinnerObserver;
use super::{GlobalArgs, SessionArgs};

/// Runs `init`, `update` or `refresh` and maps the session to an exit code.
pub async fn run_session_command(
    mode: SessionMode,
    global: &GlobalArgs,
    args: &SessionArgs,
) -> Result<ExitCode> {
    let config = RunConfig::new(
        mode,
        RunOptions {
            project_path: global.project_path.clone(),
            model: global.model.clone(),
            api_key: global.api_key.clone(),
            api_base: global.api_base.clone(),
            timeout_secs: global.timeout,
            agents: args.agents.clone(),
        },
    )?;

    let verb = match mode {
        SessionMode::Init => "Initializing",
        SessionMode::Update => "Updating",
        SessionMode::Refresh => "Refreshing",
    };
    println!(
        "{} memory bank for project at: {}",
        verb,
        config.project_path.display()
    );
    if let Some(base) = &config.api_base {
        println!("Using custom API base: {}", base);
    }
    println!(
        "Model: {} | Timeout: {}s per agent",
        config.model,
        config.timeout.as_secs()
    );

    let client = AgentClient::new(AgentClientConfig::new(
        config.api_key.clone(),
        config.api_base.as_deref(),
    ))?;
    let observer = SpinnerObserver::new();

    let outcome = run_session(&config, &client, &observer).await?;
    let report = &outcome.report;

    println!("{}", format_token_report(&report.to_token_report()));
    if let Some(path) = &outcome.report_path {
        println!("Token usage saved to: {}", path.display());
    }

    let store = MemoryBankStore::new(&config.project_path);
    if report.successful_agents() == report.results.len() {
        println!("Memory bank {} complete: {}", mode, store.dir().display());
    } else {
        println!(
            "Memory bank {} finished with {} of {} agents failed. Files in: {}",
            mode,
            report.failed_agents(),
            report.results.len(),
            store.dir().display()
        );
    }

    Ok(ExitCode::from(report.exit_code()))
}

/// `tokens`: shows one report, the latest one, or a listing of all of them.
pub fn show_tokens(project_path: &Path, list_all: bool, report_file: Option<&Path>) -> Result<()> {
    if let Some(file) = report_file {
        let report = ReportDirectory::load(file)?;
        println!("{}", format_token_report(&report));
        return Ok(());
    }

    let project_path = resolve_project_path(project_path)?;
    let reports = ReportDirectory::new(MemoryBankStore::new(&project_path).reports_dir());
    let files = reports.list()?;

    if files.is_empty() {
        println!("No token usage reports found.");
        println!("Reports are saved to: {}", reports.dir().display());
        return Ok(());
    }

    if list_all {
        println!("Available Token Usage Reports ({} found):", files.len());
        println!("Directory: {}", reports.dir().display());
        println!();
        for file in &files {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match ReportDirectory::load(file) {
                Ok(report) => {
                    println!("{}", name);
                    println!("   {}", format_report_listing(&report));
                }
                Err(e) => println!("   Error reading {}: {}", name, e),
            }
        }
        println!("\nTo view a specific report: memory-banker tokens -f <report-file>");
        return Ok(());
    }

    let latest = &files[0];
    println!(
        "Displaying latest token usage report: {}",
        latest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    );
    let report = ReportDirectory::load(latest)?;
    println!("{}", format_token_report(&report));
    Ok(())
}
