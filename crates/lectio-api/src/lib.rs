//! HTTP backend client for lectio.
//!
//! Implements `lectio_core::ports::BackendPort` over the reading backend's
//! REST API with bearer-token auth. Wire shapes (including legacy progress
//! field names) are decoded here and converted to domain types at the port
//! boundary.

#![deny(unsafe_code)]

mod client;
mod config;
mod error;
mod models;
mod port;

// ============================================================================
// Public API
// ============================================================================

// Client
pub use client::LectioApiClient;

// Configuration
pub use config::ApiConfig;

// Error type (for wiring-time failures, e.g. an invalid base URL)
pub use error::ApiError;

// Silence unused dev-dependency warnings
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tokio_test as _;
