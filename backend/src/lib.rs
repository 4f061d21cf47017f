//! # Meta Gateway
//!
//! Read-only HTTP gateway in front of the item and user metadata store.
//!
//! Clients ask for facets of a batch of items (reposts, sizes, previews),
//! the recent score history of a user, or username completions. The gateway
//! validates the request, runs the store lookups (concurrently where they
//! are independent) and answers with JSON.
//!
//! ## Architecture
//!
//! - [`api`]: Response types shared by the route logic and the HTTP layer
//! - [`db`]: Repository trait, Postgres and in-memory implementations
//! - [`routes`]: Validation and lookup logic of each endpoint
//! - [`metrics`]: Request timers and the optional Datadog reporter
//! - [`config`]: Command-line and environment configuration
//! - [`http`]: Axum router, handlers and response dispatch

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod metrics;
pub mod routes;

#[cfg(feature = "http-server")]
pub mod http;
