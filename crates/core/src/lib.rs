//! dpu-core: Core library for the dpu uploader
//!
//! This crate provides the core functionality for dpu, including:
//! - Env-file configuration loading and validation
//! - Project layout rules and file discovery
//! - ObjectStore trait for S3 operations
//! - The concurrent upload pipeline
//!
//! This crate is designed to be independent of any specific S3 SDK,
//! allowing for easy testing and potential future support for other backends.

pub mod config;
pub mod discovery;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod traits;

pub use config::{Credentials, EnvConfig, Settings, StorageConfig};
pub use discovery::{Walk, find_files, walk};
pub use error::{Error, Result};
pub use layout::LayoutRule;
pub use pipeline::{
    BatchSummary, BucketStatus, DEFAULT_CONCURRENCY, FailedUpload, UploadOptions, UploadOutcome,
    UploadedFile, Uploader, object_key,
};
pub use traits::ObjectStore;
