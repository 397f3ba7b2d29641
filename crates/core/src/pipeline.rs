//! Upload pipeline
//!
//! Makes sure the destination bucket exists, then uploads a batch of files
//! on tokio worker tasks with a bounded number of uploads in flight. A file
//! that fails is recorded in the [`BatchSummary`] and never stops the rest
//! of the batch.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::time::Instant;

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::traits::ObjectStore;

/// Uploads in flight when no limit is configured
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Tuning for a pipeline run
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Maximum number of concurrent uploads (at least 1)
    pub concurrency: usize,

    /// Deadline for a single file (read + probe + write)
    pub file_timeout: Option<Duration>,

    /// Deadline after which queued files are no longer started
    pub batch_timeout: Option<Duration>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            file_timeout: None,
            batch_timeout: None,
        }
    }
}

/// How the destination bucket was provisioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketStatus {
    Created,
    AlreadyExists,
    AlreadyOwned,
}

/// A file that was written to the bucket
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub path: PathBuf,
    pub key: String,
    pub size_bytes: u64,
    pub size_human: String,
    /// An object already existed under `key` and was replaced
    pub overwritten: bool,
}

/// A file that could not be uploaded
#[derive(Debug, Clone, Serialize)]
pub struct FailedUpload {
    pub path: PathBuf,
    pub key: String,
    /// Error class, see [`Error::kind`]
    pub kind: &'static str,
    pub error: String,
}

impl FailedUpload {
    fn new(path: PathBuf, error: &Error) -> Self {
        Self {
            key: object_key(&path),
            path,
            kind: error.kind(),
            error: error.to_string(),
        }
    }
}

/// Outcome of one file, handed to the completion hook
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    Uploaded(UploadedFile),
    Failed(FailedUpload),
}

/// Result of a whole batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub bucket: String,
    pub bucket_status: BucketStatus,
    pub started_at: jiff::Timestamp,
    pub finished_at: jiff::Timestamp,
    pub succeeded: Vec<UploadedFile>,
    pub failed: Vec<FailedUpload>,
}

impl BatchSummary {
    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// Number of files the batch accounted for
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn overwritten_count(&self) -> usize {
        self.succeeded.iter().filter(|f| f.overwritten).count()
    }

    /// Whether every file was uploaded
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.succeeded.iter().map(|f| f.size_bytes).sum()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Uploaded {} file(s) ({}) to bucket {}",
            self.success_count(),
            humansize::format_size(self.total_bytes(), humansize::BINARY),
            self.bucket
        )?;
        if self.overwritten_count() > 0 {
            write!(f, ", {} replaced", self.overwritten_count())?;
        }
        if !self.is_success() {
            write!(f, ", {} failed", self.failure_count())?;
        }
        Ok(())
    }
}

/// Object key for a local file: its path with `/` separators
pub fn object_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

type CompletionHook = Arc<dyn Fn(&UploadOutcome) + Send + Sync>;

/// Uploads discovered files to one bucket
pub struct Uploader<S: ObjectStore + ?Sized> {
    store: Arc<S>,
    config: Arc<StorageConfig>,
    options: UploadOptions,
    on_complete: Option<CompletionHook>,
}

impl<S: ObjectStore + ?Sized> Clone for Uploader<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
            options: self.options.clone(),
            on_complete: self.on_complete.clone(),
        }
    }
}

impl<S: ObjectStore + ?Sized + 'static> Uploader<S> {
    pub fn new(store: Arc<S>, config: StorageConfig, options: UploadOptions) -> Self {
        Self {
            store,
            config: Arc::new(config),
            options,
            on_complete: None,
        }
    }

    /// Call `hook` as each file finishes, successfully or not
    pub fn on_complete(mut self, hook: impl Fn(&UploadOutcome) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(hook));
        self
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    /// Create the bucket unless it already exists
    ///
    /// "Already exists" is success; any other error is returned.
    pub async fn ensure_bucket(&self) -> Result<BucketStatus> {
        let bucket = &self.config.bucket;
        match self
            .store
            .create_bucket(bucket, self.config.region.clone())
            .await
        {
            Ok(()) => {
                tracing::info!("Bucket {bucket} created successfully.");
                Ok(BucketStatus::Created)
            }
            Err(Error::BucketExists { owned_by_you, .. }) => {
                tracing::info!("S3 bucket {bucket} exists.");
                Ok(if owned_by_you {
                    BucketStatus::AlreadyOwned
                } else {
                    BucketStatus::AlreadyExists
                })
            }
            Err(e) => {
                tracing::error!("Error creating S3 bucket {bucket}: {e}");
                Err(e)
            }
        }
    }

    /// Upload a single file under its path as key
    ///
    /// An existing object is replaced; the returned record says so.
    pub async fn upload_one(&self, path: &Path) -> Result<UploadedFile> {
        let work = self.put_file(path);
        match self.options.file_timeout {
            Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| {
                Error::Timeout(format!(
                    "upload of {} exceeded {}ms",
                    path.display(),
                    limit.as_millis()
                ))
            })?,
            None => work.await,
        }
    }

    async fn put_file(&self, path: &Path) -> Result<UploadedFile> {
        let bucket = &self.config.bucket;
        let key = object_key(path);

        let data = tokio::fs::read(path).await?;

        let overwritten = self.store.object_exists(bucket, &key).await?;
        if overwritten {
            tracing::warn!(
                "File {key} already exists in bucket {bucket}. Replacing existing file"
            );
        }

        let content_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string());
        let size = data.len() as u64;

        self.store.put_object(bucket, &key, data, content_type).await?;

        Ok(UploadedFile {
            path: path.to_path_buf(),
            key,
            size_bytes: size,
            size_human: humansize::format_size(size, humansize::BINARY),
            overwritten,
        })
    }

    /// Ensure the bucket, then upload every file concurrently
    ///
    /// Fails only when the bucket cannot be provisioned. Each file shows up
    /// exactly once in the summary, as a success or a failure.
    pub async fn upload_batch(&self, files: Vec<PathBuf>) -> Result<BatchSummary> {
        let started_at = jiff::Timestamp::now();
        let bucket_status = self.ensure_bucket().await?;

        let concurrency = self.options.concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let deadline = self.options.batch_timeout.map(|t| Instant::now() + t);

        tracing::info!(
            files = files.len(),
            concurrency,
            bucket = %self.config.bucket,
            "Uploading files"
        );

        let tasks: Vec<_> = files
            .into_iter()
            .map(|path| {
                let uploader = self.clone();
                let semaphore = Arc::clone(&semaphore);
                let task_path = path.clone();
                let handle = tokio::spawn(async move {
                    let outcome = uploader.admit_and_upload(&semaphore, deadline, &path).await;
                    uploader.record(path, outcome)
                });
                (task_path, handle)
            })
            .collect();

        let (paths, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
        let joined = futures::future::join_all(handles).await;

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (path, result) in paths.into_iter().zip(joined) {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    let err = Error::General(format!("upload task failed: {join_err}"));
                    self.record(path, Err(err))
                }
            };
            match outcome {
                UploadOutcome::Uploaded(file) => succeeded.push(file),
                UploadOutcome::Failed(failure) => failed.push(failure),
            }
        }

        let summary = BatchSummary {
            bucket: self.config.bucket.clone(),
            bucket_status,
            started_at,
            finished_at: jiff::Timestamp::now(),
            succeeded,
            failed,
        };
        tracing::info!(
            succeeded = summary.success_count(),
            failed = summary.failure_count(),
            "Batch finished"
        );
        Ok(summary)
    }

    async fn admit_and_upload(
        &self,
        semaphore: &Semaphore,
        deadline: Option<Instant>,
        path: &Path,
    ) -> Result<UploadedFile> {
        let _permit = semaphore
            .acquire()
            .await
            .map_err(|e| Error::General(e.to_string()))?;

        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::Cancelled(format!(
                "batch deadline passed before {} started",
                path.display()
            )));
        }

        self.upload_one(path).await
    }

    /// Log an outcome and pass it to the completion hook
    fn record(&self, path: PathBuf, result: Result<UploadedFile>) -> UploadOutcome {
        let outcome = match result {
            Ok(file) => {
                tracing::info!(
                    "File {} uploaded to s3 bucket {}",
                    file.key,
                    self.config.bucket
                );
                UploadOutcome::Uploaded(file)
            }
            Err(e) => {
                tracing::error!("Error uploading file {}: {e}", path.display());
                UploadOutcome::Failed(FailedUpload::new(path, &e))
            }
        };
        if let Some(hook) = &self.on_complete {
            hook(&outcome);
        }
        outcome
    }
}
