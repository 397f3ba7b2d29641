//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tokio::task::JoinError;

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

mod completions;
mod discover;
pub mod upload;

/// dpu - data-platform uploader
///
/// Finds orchestration (airflow/src) and transform (dbt) project files
/// under a directory tree and uploads them to an S3 bucket.
#[derive(Parser, Debug)]
#[command(name = "dpu")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover project files and upload them to S3
    Upload(upload::UploadArgs),

    /// List the project files under a directory
    Discover(discover::DiscoverArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Upload(args) => upload::execute(args, output_config).await,
        Commands::Discover(args) => discover::execute(args, output_config).await,
        Commands::Completions(args) => completions::execute(args),
    }
}

/// Run file discovery on the blocking pool so Ctrl-C stays responsive
pub(crate) async fn discover_files(root: &Path) -> Result<Vec<PathBuf>, JoinError> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || dpu_core::find_files(root)).await
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
    fn test_upload_defaults() {
        let cli = Cli::try_parse_from(["dpu", "upload"]).unwrap();
        let Commands::Upload(args) = cli.command else {
            panic!("expected upload command");
        };
        assert_eq!(args.concurrency, dpu_core::DEFAULT_CONCURRENCY);
        assert!(!args.dry_run);
        assert!(args.file_timeout.is_none());
    }

    #[test]
    fn test_upload_env_file_spellings() {
        for flag in ["--env-file", "--env_file", "-e"] {
            let cli = Cli::try_parse_from(["dpu", "upload", flag, "prod.env"]).unwrap();
            let Commands::Upload(args) = cli.command else {
                panic!("expected upload command");
            };
            assert_eq!(args.env_file, PathBuf::from("prod.env"));
        }
    }

    #[test]
    fn test_upload_rejects_zero_concurrency() {
        assert!(Cli::try_parse_from(["dpu", "upload", "--concurrency", "0"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["dpu", "discover", "proj", "--json", "-q"]).unwrap();
        assert!(cli.json);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Discover(_)));
    }

    #[tokio::test]
    async fn test_discover_files_off_runtime() {
        let temp = tempfile::tempdir().unwrap();
        let model = temp.path().join("proj/dbt/models/m.sql");
        std::fs::create_dir_all(model.parent().unwrap()).unwrap();
        std::fs::write(&model, b"select 1").unwrap();
        std::fs::create_dir_all(temp.path().join("proj/notes")).unwrap();
        std::fs::write(temp.path().join("proj/notes/todo.txt"), b"x").unwrap();

        let files = discover_files(temp.path()).await.unwrap();
        assert_eq!(files, vec![model]);
    }
}
