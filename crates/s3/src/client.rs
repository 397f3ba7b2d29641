//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from dpu-core.

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};

use dpu_core::{Error, ObjectStore, Result, StorageConfig};

/// Region in which S3 rejects an explicit location constraint
const DEFAULT_S3_REGION: &str = "us-east-1";

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client from a storage configuration
    ///
    /// Static credentials are used when configured, otherwise the default
    /// AWS credential chain (environment, profile, instance metadata).
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }

        match &config.credentials {
            Some(creds) => {
                let credentials = aws_credential_types::Credentials::new(
                    creds.access_key_id.clone(),
                    creds.secret_access_key.clone(),
                    creds.session_token.clone(),
                    None, // expiry
                    "dpu-static-credentials",
                );
                loader = loader.credentials_provider(credentials);
            }
            None => tracing::debug!("No static credentials, using default credential chain"),
        }

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn create_bucket(&self, bucket: &str, region: Option<String>) -> Result<()> {
        let mut request = self.inner.create_bucket().bucket(bucket);

        if let Some(constraint) = region.as_deref().and_then(location_constraint) {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(constraint))
                    .build(),
            );
        }

        let err = match request.send().await {
            Ok(_) => return Ok(()),
            Err(e) => e,
        };

        let message = DisplayErrorContext(&err).to_string();
        let service = err.into_service_error();
        let existing = match &service {
            CreateBucketError::BucketAlreadyOwnedByYou(_) => Some(true),
            CreateBucketError::BucketAlreadyExists(_) => Some(false),
            other => already_exists(other.code()),
        };

        match existing {
            Some(owned_by_you) => Err(Error::BucketExists {
                bucket: bucket.to_string(),
                owned_by_you,
            }),
            None => Err(classify(service.code(), message)),
        }
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let err = match self.inner.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => return Ok(true),
            Err(e) => e,
        };

        let message = DisplayErrorContext(&err).to_string();
        let service = err.into_service_error();
        if service.is_not_found() || matches!(service.code(), Some("NotFound" | "NoSuchKey")) {
            Ok(false)
        } else {
            Err(classify(service.code(), message))
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<()> {
        let body = aws_sdk_s3::primitives::ByteStream::from(data);

        let mut request = self.inner.put_object().bucket(bucket).key(key).body(body);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request.send().await.map_err(|e| {
            let message = DisplayErrorContext(&e).to_string();
            classify(e.into_service_error().code(), message)
        })?;

        Ok(())
    }
}

/// Location constraint for a region; none for the default region
fn location_constraint(region: &str) -> Option<&str> {
    let region = region.trim();
    if region.is_empty() || region == DEFAULT_S3_REGION {
        None
    } else {
        Some(region)
    }
}

/// Error codes meaning the bucket is already there
fn already_exists(code: Option<&str>) -> Option<bool> {
    match code {
        Some("BucketAlreadyOwnedByYou") => Some(true),
        Some("BucketAlreadyExists") => Some(false),
        _ => None,
    }
}

/// Map an S3 error code to the core error class
fn classify(code: Option<&str>, message: String) -> Error {
    match code {
        Some(
            "AccessDenied"
            | "InvalidAccessKeyId"
            | "SignatureDoesNotMatch"
            | "ExpiredToken"
            | "InvalidToken",
        ) => Error::Auth(message),
        Some("NoSuchBucket" | "NoSuchKey" | "NotFound") => Error::NotFound(message),
        _ => Error::Network(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpu_core::Credentials;

    #[test]
    fn test_location_constraint() {
        assert_eq!(location_constraint("ap-southeast-2"), Some("ap-southeast-2"));
        assert_eq!(location_constraint("us-east-1"), None);
        assert_eq!(location_constraint(""), None);
    }

    #[test]
    fn test_already_exists_codes() {
        assert_eq!(already_exists(Some("BucketAlreadyOwnedByYou")), Some(true));
        assert_eq!(already_exists(Some("BucketAlreadyExists")), Some(false));
        assert_eq!(already_exists(Some("AccessDenied")), None);
        assert_eq!(already_exists(None), None);
    }

    #[test]
    fn test_classify() {
        assert!(matches!(
            classify(Some("AccessDenied"), "denied".into()),
            Error::Auth(_)
        ));
        assert!(matches!(
            classify(Some("InvalidAccessKeyId"), "bad key".into()),
            Error::Auth(_)
        ));
        assert!(matches!(
            classify(Some("NoSuchBucket"), "gone".into()),
            Error::NotFound(_)
        ));
        assert!(matches!(
            classify(Some("SlowDown"), "throttled".into()),
            Error::Network(_)
        ));
        assert!(matches!(
            classify(None, "dispatch failure".into()),
            Error::Network(_)
        ));
    }

    #[tokio::test]
    async fn test_new_with_static_credentials() {
        let mut config = StorageConfig::new("data-platform").with_region("ap-southeast-2");
        config.credentials = Some(Credentials {
            access_key_id: "AKIDEXAMPLE".into(),
            secret_access_key: "secret".into(),
            session_token: None,
        });
        config.endpoint_url = Some("http://localhost:9000".into());
        config.force_path_style = true;

        let client = S3Client::new(&config).await.unwrap();
        let region = client.inner().config().region().map(|r| r.to_string());
        assert_eq!(region.as_deref(), Some("ap-southeast-2"));
    }
}
