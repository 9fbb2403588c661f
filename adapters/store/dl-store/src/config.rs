//! Store client configuration.

use object_store::ClientOptions;
use std::path::PathBuf;
use std::time::Duration;

/// Where buckets live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Amazon S3 or an S3-compatible endpoint
    S3,

    /// Local directory tree; each bucket is a subdirectory of `root`
    Local { root: PathBuf },
}

/// Configuration for the object store client.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend kind
    pub backend: StoreBackend,

    /// AWS region for S3 access
    pub region: String,

    /// Optional S3 endpoint URL (for LocalStack)
    pub endpoint: Option<String>,

    /// Optional AWS access key ID
    pub access_key: Option<String>,

    /// Optional AWS secret access key
    pub secret_key: Option<String>,

    /// Optional AWS session token (for temporary credentials)
    pub session_token: Option<String>,

    /// Request timeout for a single GET or PUT
    pub request_timeout: Duration,
}

impl StoreConfig {
    /// S3 configuration for the given region.
    pub fn s3(region: impl Into<String>) -> Self {
        Self {
            backend: StoreBackend::S3,
            region: region.into(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            session_token: None,
            request_timeout: Duration::from_secs(300),
        }
    }

    /// Local filesystem configuration rooted at `root`.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self {
            backend: StoreBackend::Local { root: root.into() },
            ..Self::s3("local")
        }
    }

    /// Set the S3 endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set AWS credentials.
    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self.session_token = session_token;
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// HTTP client options for S3 stores.
    ///
    /// The worker handles one object at a time, so a small idle pool is enough.
    pub(crate) fn client_options(&self) -> ClientOptions {
        let options = ClientOptions::new()
            .with_pool_max_idle_per_host(4)
            .with_pool_idle_timeout(Duration::from_secs(90))
            .with_timeout(self.request_timeout)
            .with_connect_timeout(Duration::from_secs(10));

        if self.endpoint.is_some() {
            options.with_allow_http(true)
        } else {
            options
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s3_config_defaults() {
        let config = StoreConfig::s3("eu-west-1");

        assert_eq!(config.backend, StoreBackend::S3);
        assert_eq!(config.region, "eu-west-1");
        assert!(config.endpoint.is_none());
        assert!(config.access_key.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_local_config() {
        let config = StoreConfig::local("/tmp/lake");
        assert_eq!(
            config.backend,
            StoreBackend::Local {
                root: PathBuf::from("/tmp/lake")
            }
        );
    }

    #[test]
    fn test_config_builder() {
        let config = StoreConfig::s3("us-east-1")
            .with_endpoint("http://localhost:4566")
            .with_credentials("test", "secret", Some("token".to_string()))
            .with_request_timeout(Duration::from_secs(30));

        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.access_key.as_deref(), Some("test"));
        assert_eq!(config.secret_key.as_deref(), Some("secret"));
        assert_eq!(config.session_token.as_deref(), Some("token"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
