//! Database module for metadata lookups.
//!
//! This module provides the read-only query gateway behind the HTTP API via
//! the Repository pattern, so the Postgres store can be swapped for an
//! in-memory one in development and tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Route handlers (routes/) - validation, fan-out         │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  MetadataRepository (repository/) - Abstract Interface  │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────────┐
//!     │                                  │
//! ┌───▼───────────────┐      ┌───────────▼──────────┐
//! │ PostgresRepository │      │ LocalRepository      │
//! │ (diesel + r2d2)    │      │ (in-memory)          │
//! └────────────────────┘      └──────────────────────┘
//! ```
//!
//! - `repository`: Trait definition and error types
//! - `repositories::postgres`: Postgres implementation with Diesel
//! - `repositories::local`: In-memory implementation for unit testing and local development
//! - `factory`: Factory for creating repository instances

// Feature flag priority: postgres > local
#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repositories;
pub mod repository;

#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresConfig;
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone, Default)]
pub struct PostgresConfig {
    _private: (),
}

#[cfg(not(feature = "postgres-repo"))]
impl PostgresConfig {
    pub fn with_url(_database_url: impl Into<String>) -> Self {
        Self::default()
    }

    pub fn with_max_pool_size(self, _max_pool_size: u32) -> Self {
        self
    }
}

pub use factory::{RepositoryFactory, RepositoryType};
pub use repositories::{LocalQuery, LocalRepository};
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    ErrorContext, MetadataRepository, RepositoryError, RepositoryResult, FACET_LIMIT,
    SUGGEST_LIMIT,
};
