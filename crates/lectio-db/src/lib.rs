//! `SQLite` persistence adapter for lectio.
//!
//! Implements the repository ports defined in `lectio-core`: the content
//! cache, the pending progress outbox, the single Now Playing session row,
//! and application settings. The schema is created by [`setup_database`];
//! adapters wire everything through [`CoreFactory`].

#![deny(unsafe_code)]

pub mod factory;
pub mod repositories;
pub mod setup;

// Re-export factory for convenient access
pub use factory::CoreFactory;

// Re-export repository implementations
pub use repositories::{
    SqliteContentCacheRepository, SqliteNowPlayingRepository, SqlitePendingProgressRepository,
    SqliteSettingsRepository,
};

// Re-export setup functions for convenient access
pub use setup::setup_database;
#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_database;
