//! discover command - List the files an upload would ship
//!
//! Runs file discovery on a directory without touching storage.

use std::path::PathBuf;

use clap::Args;

use super::discover_files;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List project files under a directory
#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Root directory to scan
    pub root: PathBuf,
}

/// Execute the discover command
pub async fn execute(args: DiscoverArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    if !args.root.exists() {
        formatter.error(&format!(
            "Input root directory {} does not exist",
            args.root.display()
        ));
        return ExitCode::NotFound;
    }

    if !args.root.is_dir() {
        formatter.error(&format!("{} is not a directory", args.root.display()));
        return ExitCode::UsageError;
    }

    match discover_files(&args.root).await {
        Ok(files) => {
            formatter.discovered(&args.root, &files);
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("File discovery failed: {e}"));
            ExitCode::GeneralError
        }
    }
}
