mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memory_banker::SessionMode;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memory_banker=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init(args) => {
            cli::run_session_command(SessionMode::Init, &cli.global, &args).await
        }
        Commands::Update(args) => {
            cli::run_session_command(SessionMode::Update, &cli.global, &args).await
        }
        Commands::Refresh(args) => {
            cli::run_session_command(SessionMode::Refresh, &cli.global, &args).await
        }
        Commands::Tokens {
            list_all,
            report_file,
        } => cli::show_tokens(&cli.global.project_path, list_all, report_file.as_deref())
            .map(|_| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => Ok(code),
        // validation failures happen before any agent runs
        Err(e) if e.is_validation() => {
            eprintln!("Error: {}", e);
            Ok(ExitCode::from(2))
        }
        Err(e) => Err(e.into()),
    }
}
