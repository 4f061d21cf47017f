//! HTTP server module for the gateway.
//!
//! This module provides an axum-based HTTP server that exposes the metadata
//! lookups as a read-only REST API.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Parameter extraction                                   │
//! │  - Dispatch: HandlerResult -> status, headers, body       │
//! │  - CORS, tracing, panic recovery, per-route timers        │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Route Layer (routes/)                                    │
//! │  - Validation                                             │
//! │  - Concurrent facet lookups                               │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Repository Layer (db/)                                   │
//! │  - LocalRepository / PostgresRepository                   │
//! └──────────────────────────────────────────────────────────┘
//! ```

#[cfg(feature = "http-server")]
pub mod handlers;

#[cfg(feature = "http-server")]
pub mod router;

#[cfg(feature = "http-server")]
pub mod state;

#[cfg(feature = "http-server")]
pub mod error;

#[cfg(feature = "http-server")]
pub mod dto;

#[cfg(feature = "http-server")]
pub mod outcome;

#[cfg(feature = "http-server")]
pub mod timing;

#[cfg(feature = "http-server")]
pub use router::{create_app, create_router};

#[cfg(feature = "http-server")]
pub use outcome::Dispatch;

#[cfg(feature = "http-server")]
pub use state::AppState;
