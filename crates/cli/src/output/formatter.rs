//! Rendering of upload results, dry-run plans and discovery listings
//!
//! Every command prints through a [`Formatter`] so JSON mode always yields
//! exactly one document on stdout and quiet mode only lets errors through.

use std::path::{Path, PathBuf};

use dpu_core::{BatchSummary, FailedUpload, UploadedFile, object_key};
use serde::Serialize;

use super::OutputConfig;

const GREEN: &str = "32";
const RED: &str = "31";
const YELLOW: &str = "33";

/// A file that a dry run would upload
#[derive(Debug, Serialize)]
struct PlannedUpload<'a> {
    path: &'a Path,
    key: String,
}

#[derive(Debug, Serialize)]
struct UploadPlan<'a> {
    bucket: &'a str,
    files: Vec<PlannedUpload<'a>>,
}

#[derive(Debug, Serialize)]
struct Discovery<'a> {
    root: &'a Path,
    count: usize,
    files: &'a [PathBuf],
}

/// Output formatter for dpu commands
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Report a finished batch
    ///
    /// JSON mode prints the whole summary. Text mode lists each failed file
    /// and each replaced object on stderr, then a one-line total.
    pub fn batch_summary(&self, summary: &BatchSummary) {
        if self.config.json {
            self.json(summary);
            return;
        }

        for failure in &summary.failed {
            self.error(&failure_line(failure));
        }
        for file in summary.succeeded.iter().filter(|f| f.overwritten) {
            self.warning(&replaced_line(file));
        }

        if summary.is_success() {
            self.success(&summary.to_string());
        } else {
            self.warning(&format!(
                "Completed with errors: {} succeeded, {} failed",
                summary.success_count(),
                summary.failure_count()
            ));
        }
    }

    /// Report what a dry run would upload to `bucket`
    pub fn upload_plan(&self, bucket: &str, files: &[PathBuf]) {
        if self.config.json {
            self.json(&UploadPlan {
                bucket,
                files: files
                    .iter()
                    .map(|path| PlannedUpload {
                        path,
                        key: object_key(path),
                    })
                    .collect(),
            });
            return;
        }

        for path in files {
            self.println(&plan_line(bucket, path));
        }
    }

    /// List the files discovered under `root`
    pub fn discovered(&self, root: &Path, files: &[PathBuf]) {
        if self.config.json {
            self.json(&Discovery {
                root,
                count: files.len(),
                files,
            });
            return;
        }

        for file in files {
            self.println(&file.display().to_string());
        }
        self.success(&format!("Found {} file(s).", files.len()));
    }

    pub fn success(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        println!("{}", self.mark(GREEN, "✓", message));
    }

    /// Errors are printed even in quiet mode
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({ "error": message });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&error).unwrap_or_else(|_| message.to_string())
            );
        } else {
            eprintln!("{}", self.mark(RED, "✗", message));
        }
    }

    pub fn warning(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        eprintln!("{}", self.mark(YELLOW, "⚠", message));
    }

    /// Print a JSON document, even in quiet mode
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    pub fn println(&self, message: &str) {
        if self.config.quiet {
            return;
        }
        println!("{message}");
    }

    fn mark(&self, color: &str, symbol: &str, message: &str) -> String {
        if self.colors_enabled() {
            format!("\x1b[{color}m{symbol}\x1b[0m {message}")
        } else {
            format!("{symbol} {message}")
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}

fn failure_line(failure: &FailedUpload) -> String {
    format!(
        "Failed to upload {} [{}]: {}",
        failure.path.display(),
        failure.kind,
        failure.error
    )
}

fn replaced_line(file: &UploadedFile) -> String {
    format!("Replaced existing object {} ({})", file.key, file.size_human)
}

fn plan_line(bucket: &str, path: &Path) -> String {
    format!(
        "Would upload: {} -> s3://{bucket}/{}",
        path.display(),
        object_key(path)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> FailedUpload {
        FailedUpload {
            path: PathBuf::from("proj/dbt/models/m.sql"),
            key: "proj/dbt/models/m.sql".into(),
            kind: "timeout",
            error: "Timeout: upload exceeded 30000ms".into(),
        }
    }

    #[test]
    fn test_formatter_default() {
        let formatter = Formatter::default();
        assert!(!formatter.config.json);
        assert!(formatter.colors_enabled());
    }

    #[test]
    fn test_json_mode_disables_colors() {
        let formatter = Formatter::new(OutputConfig {
            json: true,
            ..Default::default()
        });
        assert!(!formatter.colors_enabled());
    }

    #[test]
    fn test_mark_respects_no_color() {
        let plain = Formatter::new(OutputConfig {
            no_color: true,
            ..Default::default()
        });
        assert_eq!(plain.mark(RED, "✗", "boom"), "✗ boom");

        let colored = Formatter::default();
        assert_eq!(colored.mark(RED, "✗", "boom"), "\x1b[31m✗\x1b[0m boom");
    }

    #[test]
    fn test_failure_line_names_file_and_class() {
        let line = failure_line(&failure());
        assert!(line.starts_with("Failed to upload proj/dbt/models/m.sql [timeout]"));
        assert!(line.ends_with("exceeded 30000ms"));
    }

    #[test]
    fn test_replaced_line() {
        let file = UploadedFile {
            path: PathBuf::from("proj/airflow/src/dags/d.py"),
            key: "proj/airflow/src/dags/d.py".into(),
            size_bytes: 2048,
            size_human: "2 KiB".into(),
            overwritten: true,
        };
        assert_eq!(
            replaced_line(&file),
            "Replaced existing object proj/airflow/src/dags/d.py (2 KiB)"
        );
    }

    #[test]
    fn test_plan_line_uses_object_key() {
        let line = plan_line("data-platform", Path::new("proj/dbt/dbt_project.yml"));
        assert_eq!(
            line,
            "Would upload: proj/dbt/dbt_project.yml -> s3://data-platform/proj/dbt/dbt_project.yml"
        );
    }

    #[test]
    fn test_upload_plan_json_shape() {
        let files = vec![PathBuf::from("proj/dbt/models/m.sql")];
        let plan = UploadPlan {
            bucket: "data-platform",
            files: files
                .iter()
                .map(|path| PlannedUpload {
                    path,
                    key: object_key(path),
                })
                .collect(),
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["bucket"], "data-platform");
        assert_eq!(json["files"][0]["key"], "proj/dbt/models/m.sql");
    }
}
