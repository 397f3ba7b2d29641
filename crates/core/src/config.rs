//! Configuration loading
//!
//! Settings come from a dotenv-style file. Two keys are required
//! (`S3_BUCKET_NAME` and `ROOT_DIRECTORY`); region, static credentials and a
//! custom endpoint are optional. Without a static credential pair the S3
//! adapter falls back to the ambient AWS credential chain.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

/// Env file used when none is given on the command line
pub const DEFAULT_ENV_FILE: &str = ".env";

pub const KEY_BUCKET: &str = "S3_BUCKET_NAME";
pub const KEY_ROOT_DIRECTORY: &str = "ROOT_DIRECTORY";
pub const KEY_REGION: &str = "AWS_REGION";
pub const KEY_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const KEY_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const KEY_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const KEY_ENDPOINT_URL: &str = "S3_ENDPOINT_URL";
pub const KEY_FORCE_PATH_STYLE: &str = "S3_FORCE_PATH_STYLE";

/// Keys that must be present with a non-empty value
pub const REQUIRED_KEYS: [&str; 2] = [KEY_BUCKET, KEY_ROOT_DIRECTORY];

/// Static AWS credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Destination bucket and how to reach it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageConfig {
    /// Bucket name
    pub bucket: String,

    /// Region for bucket placement and the client; provider default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Static credentials; ambient credential chain when unset
    #[serde(skip)]
    pub credentials: Option<Credentials>,

    /// Custom endpoint for S3-compatible backends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,

    /// Use path-style bucket addressing
    pub force_path_style: bool,
}

impl StorageConfig {
    /// Create a config for a bucket with provider defaults for everything else
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: None,
            credentials: None,
            endpoint_url: None,
            force_path_style: false,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

/// Validated settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory tree to scan; known to exist
    pub root_directory: PathBuf,

    /// Storage destination
    pub storage: StorageConfig,
}

/// Raw key/value pairs read from an env file
#[derive(Debug, Clone)]
pub struct EnvConfig {
    source: PathBuf,
    vars: BTreeMap<String, String>,
}

impl EnvConfig {
    /// Read an env file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let iter = dotenvy::from_path_iter(path).map_err(|e| match e {
            dotenvy::Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                Error::NotFound(format!("Env file {}", path.display()))
            }
            other => Error::Config(format!("Cannot read {}: {other}", path.display())),
        })?;

        let mut vars = BTreeMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| {
                Error::Config(format!("Cannot parse {}: {e}", path.display()))
            })?;
            vars.insert(key, value);
        }

        tracing::debug!(path = %path.display(), keys = vars.len(), "Loaded env file");
        Ok(Self {
            source: path.to_path_buf(),
            vars,
        })
    }

    /// Build from in-memory pairs
    pub fn from_vars<I, K, V>(source: impl Into<PathBuf>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            source: source.into(),
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Path the values were read from
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Check that the file is non-empty, has every required key and no empty values
    pub fn validate(&self) -> Result<()> {
        let source = self.source.display();

        if self.vars.is_empty() {
            return Err(Error::Config(format!(
                "No environment variables found in {source}"
            )));
        }

        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !self.vars.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Missing required keys in {source}: {}",
                missing.join(",")
            )));
        }

        let empty: Vec<&str> = self
            .vars
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(key, _)| key.as_str())
            .collect();
        if !empty.is_empty() {
            return Err(Error::Config(format!(
                "Keys with empty values in {source}: {}",
                empty.join(",")
            )));
        }

        Ok(())
    }

    /// Validate and convert into run settings
    ///
    /// Fails with `NotFound` when `ROOT_DIRECTORY` does not exist.
    pub fn settings(&self) -> Result<Settings> {
        self.validate()?;

        let root_directory = PathBuf::from(self.required(KEY_ROOT_DIRECTORY)?);
        if !root_directory.exists() {
            return Err(Error::NotFound(format!(
                "Input root directory {} does not exist",
                root_directory.display()
            )));
        }

        let credentials = match (
            self.get(KEY_ACCESS_KEY_ID),
            self.get(KEY_SECRET_ACCESS_KEY),
        ) {
            (Some(id), Some(secret)) => Some(Credentials {
                access_key_id: id.to_string(),
                secret_access_key: secret.to_string(),
                session_token: self.get(KEY_SESSION_TOKEN).map(str::to_string),
            }),
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!(
                    "Only one of {KEY_ACCESS_KEY_ID}/{KEY_SECRET_ACCESS_KEY} is set, using default credential chain"
                );
                None
            }
            (None, None) => None,
        };

        let endpoint_url = match self.get(KEY_ENDPOINT_URL) {
            Some(raw) => {
                url::Url::parse(raw)?;
                Some(raw.to_string())
            }
            None => None,
        };

        let force_path_style = match self.get(KEY_FORCE_PATH_STYLE) {
            Some(raw) => parse_bool(KEY_FORCE_PATH_STYLE, raw)?,
            None => false,
        };

        Ok(Settings {
            root_directory,
            storage: StorageConfig {
                bucket: self.required(KEY_BUCKET)?.to_string(),
                region: self.get(KEY_REGION).map(str::to_string),
                credentials,
                endpoint_url,
                force_path_style,
            },
        })
    }

    fn required(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| Error::Config(format!("Missing required key {key}")))
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!(
            "Invalid boolean for {key}: '{other}'"
        ))),
    }
}
