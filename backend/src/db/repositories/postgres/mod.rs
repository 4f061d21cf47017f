//! Postgres repository implementation using Diesel.
//!
//! The gateway never owns the schema: it only reads the `tags`, `sizes`,
//! `item_previews`, `users` and `user_score` tables, so no migrations are
//! run here.
//!
//! ## Features
//!
//! - Connection pooling with r2d2, capped by `max_pool_size`
//! - Connectivity check when the repository is created
//! - Query counters for monitoring
//!
//! Every query binds its arguments; item id lists travel as a single
//! `BIGINT[]` parameter compared with `= ANY($1)`. Suggestion prefixes are
//! escaped so that `_` and `%` match themselves.

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::sql_types::{Array, BigInt, Text};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

use crate::api::{ItemId, PreviewInfo, ScorePoint, SizeInfo};
use crate::db::repository::{
    like_prefix_pattern, ErrorContext, MetadataRepository, RepositoryError, RepositoryResult,
    FACET_LIMIT, LIKE_ESCAPE, REPOST_MIN_CONFIDENCE, REPOST_TAG, SUGGEST_LIMIT,
};

mod models;

use models::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL or key/value DSN
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of idle connections kept open
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Maximum lifetime of a pooled connection in seconds
    pub max_lifetime_sec: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 4,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            max_lifetime_sec: 300,
        }
    }
}

impl PostgresConfig {
    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }

    /// Override the maximum pool size.
    pub fn with_max_pool_size(mut self, max_pool_size: u32) -> Self {
        self.max_pool_size = max_pool_size;
        self
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and verify that the store is reachable.
    ///
    /// This blocks while the pool opens its first connections; call it from
    /// a blocking context.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size.min(config.max_pool_size)))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .max_lifetime(Some(Duration::from_secs(config.max_lifetime_sec)))
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("ping"),
                )
            })?;
            sql_query("SELECT 1")
                .execute(&mut conn)
                .map_err(|e| RepositoryError::from(e).with_operation("ping"))?;
        }

        Ok(Self {
            pool,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run a blocking database operation on a pooled connection.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> QueryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();

        task::spawn_blocking(move || {
            total_queries.fetch_add(1, Ordering::Relaxed);
            let result = pool
                .get()
                .map_err(RepositoryError::from)
                .and_then(|mut conn| f(&mut conn).map_err(RepositoryError::from));

            if result.is_err() {
                failed_queries.fetch_add(1, Ordering::Relaxed);
            }
            result.map_err(|e| e.with_operation(operation))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new(operation),
            )
        })?
    }

    /// Total queries executed and how many of them failed.
    pub fn query_stats(&self) -> (u64, u64) {
        (
            self.total_queries.load(Ordering::Relaxed),
            self.failed_queries.load(Ordering::Relaxed),
        )
    }
}

fn raw_ids(ids: &[ItemId]) -> Vec<i64> {
    ids.iter().map(ItemId::value).collect()
}

#[async_trait]
impl MetadataRepository for PostgresRepository {
    async fn fetch_reposts(&self, ids: &[ItemId]) -> RepositoryResult<Vec<ItemId>> {
        let ids = raw_ids(ids);
        let rows: Vec<RepostRow> = self
            .with_conn("fetch_reposts", move |conn| {
                sql_query(format!(
                    "SELECT item_id::bigint AS item_id FROM tags \
                     WHERE item_id = ANY($1) AND confidence > {REPOST_MIN_CONFIDENCE} \
                     AND lower(tag) = $2 \
                     LIMIT {FACET_LIMIT}"
                ))
                .bind::<Array<BigInt>, _>(ids)
                .bind::<Text, _>(REPOST_TAG)
                .load(conn)
            })
            .await?;

        Ok(rows.into_iter().map(|row| ItemId::new(row.item_id)).collect())
    }

    async fn fetch_sizes(&self, ids: &[ItemId]) -> RepositoryResult<Vec<SizeInfo>> {
        let ids = raw_ids(ids);
        let rows: Vec<SizeRow> = self
            .with_conn("fetch_sizes", move |conn| {
                sql_query(format!(
                    "SELECT id::bigint AS id, width::int AS width, height::int AS height \
                     FROM sizes WHERE id = ANY($1) LIMIT {FACET_LIMIT}"
                ))
                .bind::<Array<BigInt>, _>(ids)
                .load(conn)
            })
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn fetch_previews(&self, ids: &[ItemId]) -> RepositoryResult<Vec<PreviewInfo>> {
        let ids = raw_ids(ids);
        let rows: Vec<PreviewRow> = self
            .with_conn("fetch_previews", move |conn| {
                sql_query(format!(
                    "SELECT id::bigint AS id, width::int AS width, height::int AS height, \
                     encode(preview, 'base64') AS pixels \
                     FROM item_previews WHERE id = ANY($1) LIMIT {FACET_LIMIT}"
                ))
                .bind::<Array<BigInt>, _>(ids)
                .load(conn)
            })
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn fetch_score_history(
        &self,
        name: &str,
        since: i64,
    ) -> RepositoryResult<Vec<ScorePoint>> {
        let name = name.to_string();
        let rows: Vec<ScoreRow> = self
            .with_conn("fetch_score_history", move |conn| {
                sql_query(
                    "SELECT user_score.timestamp::bigint AS timestamp, \
                     user_score.score::int AS score \
                     FROM user_score, users \
                     WHERE lower(users.name) = lower($1) \
                     AND users.id = user_score.user_id \
                     AND user_score.timestamp > $2",
                )
                .bind::<Text, _>(name)
                .bind::<BigInt, _>(since)
                .load(conn)
            })
            .await?;

        Ok(rows.into_iter().map(|row| (row.timestamp, row.score)).collect())
    }

    async fn suggest_names(&self, prefix: &str) -> RepositoryResult<Vec<String>> {
        let pattern = like_prefix_pattern(prefix);
        let rows: Vec<NameRow> = self
            .with_conn("suggest_names", move |conn| {
                sql_query(format!(
                    "SELECT name FROM users WHERE lower(name) LIKE lower($1) ESCAPE '{LIKE_ESCAPE}' \
                     ORDER BY score DESC LIMIT {SUGGEST_LIMIT}"
                ))
                .bind::<Text, _>(pattern)
                .load(conn)
            })
            .await?;

        Ok(rows.into_iter().map(|row| row.name).collect())
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            sql_query("SELECT 1").execute(conn).map(|_| true)
        })
        .await
    }
}
