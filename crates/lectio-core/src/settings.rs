//! Settings domain types and validation.
//!
//! Pure domain types with no infrastructure dependencies; persistence is
//! behind the `SettingsRepository` port.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of queue items whose text is prefetched into the cache.
pub const DEFAULT_PREFETCH_COUNT: u32 = 5;

/// Upper bound on prefetch to keep queue loading cheap on mobile links.
pub const MAX_PREFETCH_COUNT: u32 = 10;

/// Application settings structure.
///
/// All fields are optional to support partial updates and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Backend base URL (scheme + host + optional port).
    pub base_url: Option<String>,

    /// Bearer token for backend requests.
    pub api_token: Option<String>,

    /// Whether finishing an item automatically starts the next session item.
    pub auto_advance_after_completion: Option<bool>,

    /// Number of queue items to prefetch for offline reading (1-10).
    pub prefetch_count: Option<u32>,

    /// Label sent as the `source` of progress posts.
    pub progress_source: Option<String>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            base_url: None,
            api_token: None,
            auto_advance_after_completion: Some(true),
            prefetch_count: Some(DEFAULT_PREFETCH_COUNT),
            progress_source: None,
        }
    }

    /// Whether enough is configured to talk to the backend at all.
    #[must_use]
    pub fn is_backend_configured(&self) -> bool {
        self.base_url.as_deref().is_some_and(|url| !url.trim().is_empty())
            && self.api_token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

/// Settings validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Base URL must start with http:// or https://: {0}")]
    InvalidBaseUrl(String),

    #[error("Prefetch count must be between 1 and {MAX_PREFETCH_COUNT}, got {0}")]
    InvalidPrefetchCount(u32),
}

/// Validate a settings update before persisting it.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if let Some(url) = settings.base_url.as_deref() {
        let trimmed = url.trim();
        if !trimmed.is_empty()
            && !trimmed.starts_with("http://")
            && !trimmed.starts_with("https://")
        {
            return Err(SettingsError::InvalidBaseUrl(trimmed.to_string()));
        }
    }
    if let Some(count) = settings.prefetch_count {
        if count == 0 || count > MAX_PREFETCH_COUNT {
            return Err(SettingsError::InvalidPrefetchCount(count));
        }
    }
    Ok(())
}
