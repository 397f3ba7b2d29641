//! upload command - Discover project files and upload them
//!
//! Loads settings from an env file, discovers files under the root
//! directory, makes sure the bucket exists and uploads every file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use dpu_core::config::DEFAULT_ENV_FILE;
use dpu_core::{
    BatchSummary, DEFAULT_CONCURRENCY, EnvConfig, UploadOptions, UploadOutcome, Uploader,
};
use dpu_s3::S3Client;

use super::discover_files;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

/// Upload discovered project files to S3
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Path to the env file with S3_BUCKET_NAME and ROOT_DIRECTORY
    #[arg(
        short = 'e',
        long = "env-file",
        visible_alias = "env_file",
        env = "DPU_ENV_FILE",
        default_value = DEFAULT_ENV_FILE
    )]
    pub env_file: PathBuf,

    /// Maximum number of concurrent uploads
    #[arg(short = 'j', long, default_value_t = DEFAULT_CONCURRENCY, value_parser = parse_concurrency)]
    pub concurrency: usize,

    /// Deadline for each file upload, in seconds
    #[arg(long, value_name = "SECS")]
    pub file_timeout: Option<u64>,

    /// Stop starting new uploads after this many seconds
    #[arg(long, value_name = "SECS")]
    pub batch_timeout: Option<u64>,

    /// Only show what would be uploaded (dry run)
    #[arg(long)]
    pub dry_run: bool,
}

impl UploadArgs {
    fn options(&self) -> UploadOptions {
        UploadOptions {
            concurrency: self.concurrency,
            file_timeout: self.file_timeout.map(Duration::from_secs),
            batch_timeout: self.batch_timeout.map(Duration::from_secs),
        }
    }
}

fn parse_concurrency(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("concurrency must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid concurrency '{raw}': {e}")),
    }
}

/// Execute the upload command
pub async fn execute(args: UploadArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let env = match EnvConfig::load(&args.env_file) {
        Ok(env) => env,
        Err(e) => {
            formatter.error(&format!("Failed to load env file: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let settings = match env.settings() {
        Ok(s) => s,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };
    tracing::info!("Environment variables validated");

    let files = match discover_files(&settings.root_directory).await {
        Ok(files) => files,
        Err(e) => {
            formatter.error(&format!("File discovery failed: {e}"));
            return ExitCode::GeneralError;
        }
    };
    tracing::info!(
        "Files to copy: {}",
        files
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(",")
    );

    if files.is_empty() {
        formatter.warning(&format!(
            "No project files found under {}",
            settings.root_directory.display()
        ));
    }

    if args.dry_run {
        formatter.upload_plan(&settings.storage.bucket, &files);
        return ExitCode::Success;
    }

    let client = match S3Client::new(&settings.storage).await {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            return ExitCode::NetworkError;
        }
    };

    let progress = ProgressBar::new(&output_config, files.len() as u64);
    let bar = progress.clone();
    let uploader = Uploader::new(Arc::new(client), settings.storage.clone(), args.options())
        .on_complete(move |outcome| {
            bar.inc(1);
            if let UploadOutcome::Failed(failure) = outcome {
                bar.set_message(&format!("failed: {}", failure.path.display()));
            }
        });

    let result = uploader.upload_batch(files).await;
    progress.finish_and_clear();

    match result {
        Ok(summary) => report(&summary, &formatter),
        Err(e) => {
            formatter.error(&format!(
                "Failed to create bucket {}: {e}",
                settings.storage.bucket
            ));
            ExitCode::from_error(&e)
        }
    }
}

/// Print the batch result; any failed file makes the run fail
fn report(summary: &BatchSummary, formatter: &Formatter) -> ExitCode {
    formatter.batch_summary(summary);
    if summary.is_success() {
        ExitCode::Success
    } else {
        ExitCode::GeneralError
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpu_core::{BucketStatus, Error, FailedUpload, UploadedFile};

    fn quiet() -> Formatter {
        Formatter::new(OutputConfig {
            quiet: true,
            ..Default::default()
        })
    }

    fn summary(failed: Vec<FailedUpload>) -> BatchSummary {
        BatchSummary {
            bucket: "data-platform".into(),
            bucket_status: BucketStatus::AlreadyOwned,
            started_at: jiff::Timestamp::UNIX_EPOCH,
            finished_at: jiff::Timestamp::UNIX_EPOCH,
            succeeded: vec![UploadedFile {
                path: PathBuf::from("proj/dbt/dbt_project.yml"),
                key: "proj/dbt/dbt_project.yml".into(),
                size_bytes: 12,
                size_human: "12 B".into(),
                overwritten: false,
            }],
            failed,
        }
    }

    #[test]
    fn test_report_all_uploaded_succeeds() {
        assert_eq!(report(&summary(Vec::new()), &quiet()), ExitCode::Success);
    }

    #[test]
    fn test_report_any_failure_is_general_error() {
        let failure = FailedUpload {
            path: PathBuf::from("proj/dbt/models/m.sql"),
            key: "proj/dbt/models/m.sql".into(),
            kind: Error::Network(String::new()).kind(),
            error: "connection reset".into(),
        };
        assert_eq!(
            report(&summary(vec![failure]), &quiet()),
            ExitCode::GeneralError
        );
    }

    #[test]
    fn test_parse_concurrency() {
        assert_eq!(parse_concurrency("5"), Ok(5));
        assert!(parse_concurrency("0").is_err());
        assert!(parse_concurrency("-1").is_err());
        assert!(parse_concurrency("many").is_err());
    }

    #[test]
    fn test_options_from_args() {
        let args = UploadArgs {
            env_file: PathBuf::from(".env"),
            concurrency: 8,
            file_timeout: Some(30),
            batch_timeout: None,
            dry_run: false,
        };
        let options = args.options();
        assert_eq!(options.concurrency, 8);
        assert_eq!(options.file_timeout, Some(Duration::from_secs(30)));
        assert!(options.batch_timeout.is_none());
    }
}
