//! Client configuration and URL resolution.

use std::time::Duration;
use url::Url;

use crate::error::ApiResult;

/// Default timeout for backend requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of automatic retries for transient read failures.
const DEFAULT_MAX_RETRIES: u8 = 2;

/// Base delay for exponential retry backoff.
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

/// Configuration for the backend API client.
///
/// The base URL is validated at construction; the request path builds
/// endpoint URLs infallibly and a misconfigured URL surfaces at wiring time.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    base_url: Url,
    token: String,
    timeout: Duration,
    max_retries: u8,
    retry_base_delay_ms: u64,
}

impl ApiConfig {
    /// Create a configuration from a base URL and bearer token.
    pub fn new(base_url: &str, token: impl Into<String>) -> ApiResult<Self> {
        let base_url = Url::parse(base_url.trim().trim_end_matches('/'))?;
        Ok(Self {
            base_url,
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
        })
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override retry behavior for transient read failures.
    #[must_use]
    pub const fn with_retries(mut self, max_retries: u8, base_delay_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay_ms = base_delay_ms;
        self
    }

    /// Number of automatic retries for transient read failures.
    #[must_use]
    pub const fn max_retries(&self) -> u8 {
        self.max_retries
    }

    /// Base delay for exponential retry backoff.
    #[must_use]
    pub const fn retry_base_delay_ms(&self) -> u64 {
        self.retry_base_delay_ms
    }

    /// Bearer token for the `Authorization` header.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve an endpoint path against the base URL.
    ///
    /// Keeps any path prefix of the base URL (reverse-proxy setups), unlike
    /// `Url::join` which would drop it for absolute paths.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}
