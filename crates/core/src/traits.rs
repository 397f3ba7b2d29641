//! ObjectStore trait definition
//!
//! This trait defines the storage operations the upload pipeline needs.
//! It keeps the core decoupled from the specific S3 SDK implementation.

use async_trait::async_trait;

use crate::error::Result;

/// Trait for S3-compatible storage operations
///
/// This trait is implemented by the S3 adapter and can be mocked for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create a bucket, optionally constrained to a region
    ///
    /// An existing bucket is reported as [`crate::Error::BucketExists`].
    async fn create_bucket(&self, bucket: &str, region: Option<String>) -> Result<()>;

    /// Check whether an object exists (HEAD)
    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool>;

    /// Write an object, replacing any existing one
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<()>;
}
