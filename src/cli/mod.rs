mod commands;
mod progress;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use memory_banker::config::{API_BASE_ENV, API_KEY_ENV, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};

pub use commands::{run_session_command, show_tokens};

#[derive(Parser)]
#[command(name = "memory-banker")]
#[command(about = "Generate Cline-style memory banks for a project with a pipeline of AI agents")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Create a memory bank for the current directory
    memory-banker init

    # Regenerate only two documents, reusing the others as context
    memory-banker update --agents progress --agents activeContext

    # Rebuild everything for another project with a longer timeout
    memory-banker --project-path ../service --timeout 600 refresh

    # Show the latest token usage report
    memory-banker tokens

    # List all saved reports
    memory-banker tokens --list-all
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Path to the project directory
    #[arg(long, global = true, default_value = ".")]
    pub project_path: PathBuf,

    /// LLM model to use
    #[arg(long, global = true, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// API key for the model provider
    #[arg(long, global = true, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, global = true, env = API_BASE_ENV)]
    pub api_base: Option<String>,

    /// Per-agent timeout in seconds
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,
}

#[derive(Args, Debug, Default)]
pub struct SessionArgs {
    /// Run only these agents (repeatable or comma-separated). Valid roles:
    /// projectbrief, productContext, activeContext, systemPatterns,
    /// techContext, progress, aiGuidelines
    #[arg(long = "agents", value_name = "ROLE")]
    pub agents: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new memory bank
    Init(SessionArgs),

    /// Regenerate memory bank files, using existing files as context
    Update(SessionArgs),

    /// Regenerate memory bank files from scratch
    Refresh(SessionArgs),

    /// View token usage reports and costs
    Tokens {
        /// List all available reports
        #[arg(short = 'l', long)]
        list_all: bool,

        /// Display a specific report file
        #[arg(short = 'f', long)]
        report_file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_repeated_agents_and_global_options() {
        let cli = Cli::try_parse_from([
            "memory-banker",
            "update",
            "--agents",
            "progress",
            "--agents",
            "projectbrief,techContext",
            "--timeout",
            "120",
            "--api-key",
            "sk-test",
        ])
        .unwrap();

        assert_eq!(cli.global.timeout, 120);
        assert_eq!(cli.global.api_key.as_deref(), Some("sk-test"));
        match cli.command {
            Commands::Update(args) => {
                assert_eq!(args.agents, vec!["progress", "projectbrief,techContext"])
            }
            _ => panic!("expected update"),
        }
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(Cli::try_parse_from(["memory-banker", "--timeout", "0", "init"]).is_err());
    }

    #[test]
    fn test_tokens_flags() {
        let cli = Cli::try_parse_from(["memory-banker", "tokens", "-l"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Tokens {
                list_all: true,
                report_file: None
            }
        ));
        assert_eq!(cli.global.model, DEFAULT_MODEL);
    }
}
