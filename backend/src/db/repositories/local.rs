//! In-memory metadata store for local development and tests.
//!
//! The lookups mirror the Postgres queries: the same filters, the same
//! limits and insertion order standing in for the store's natural scan
//! order. On top of that the repository counts issued queries and can be
//! told to fail or stall a given query, which the tests use to observe the
//! handlers from the outside.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use parking_lot::RwLock;

use crate::api::{ItemId, PreviewInfo, ScorePoint, SizeInfo};
use crate::db::repository::{
    ErrorContext, MetadataRepository, RepositoryError, RepositoryResult, FACET_LIMIT,
    REPOST_MIN_CONFIDENCE, REPOST_TAG, SUGGEST_LIMIT,
};

/// Query kinds understood by the failure and latency hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalQuery {
    Reposts,
    Sizes,
    Previews,
    ScoreHistory,
    SuggestNames,
}

impl LocalQuery {
    fn operation(self) -> &'static str {
        match self {
            LocalQuery::Reposts => "fetch_reposts",
            LocalQuery::Sizes => "fetch_sizes",
            LocalQuery::Previews => "fetch_previews",
            LocalQuery::ScoreHistory => "fetch_score_history",
            LocalQuery::SuggestNames => "suggest_names",
        }
    }
}

#[derive(Debug, Clone)]
struct TagRow {
    item_id: ItemId,
    tag: String,
    confidence: f64,
}

#[derive(Debug, Clone)]
struct PreviewRow {
    id: ItemId,
    width: i32,
    height: i32,
    preview: Vec<u8>,
}

#[derive(Debug, Clone)]
struct UserRow {
    id: i64,
    name: String,
    score: i32,
}

#[derive(Debug, Clone)]
struct ScoreRow {
    user_id: i64,
    timestamp: i64,
    score: i32,
}

#[derive(Debug, Default)]
struct LocalData {
    tags: Vec<TagRow>,
    sizes: Vec<SizeInfo>,
    previews: Vec<PreviewRow>,
    users: Vec<UserRow>,
    user_scores: Vec<ScoreRow>,
}

/// In-memory implementation of [`MetadataRepository`].
#[derive(Debug, Default)]
pub struct LocalRepository {
    data: RwLock<LocalData>,
    queries: AtomicUsize,
    failing: RwLock<HashSet<LocalQuery>>,
    delays: RwLock<HashMap<LocalQuery, Duration>>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Seeding ====================

    /// Attach a tag to an item.
    pub fn add_tag(&self, item_id: i64, tag: impl Into<String>, confidence: f64) {
        self.data.write().tags.push(TagRow {
            item_id: ItemId::new(item_id),
            tag: tag.into(),
            confidence,
        });
    }

    /// Record the dimensions of an item.
    pub fn add_size(&self, item_id: i64, width: i32, height: i32) {
        self.data.write().sizes.push(SizeInfo {
            id: ItemId::new(item_id),
            width,
            height,
        });
    }

    /// Store raw preview bytes for an item.
    pub fn add_preview(&self, item_id: i64, width: i32, height: i32, preview: impl Into<Vec<u8>>) {
        self.data.write().previews.push(PreviewRow {
            id: ItemId::new(item_id),
            width,
            height,
            preview: preview.into(),
        });
    }

    /// Register a user and return its id.
    pub fn add_user(&self, name: impl Into<String>, score: i32) -> i64 {
        let mut data = self.data.write();
        let id = data.users.len() as i64 + 1;
        data.users.push(UserRow {
            id,
            name: name.into(),
            score,
        });
        id
    }

    /// Append a score sample for a user id returned by [`Self::add_user`].
    pub fn add_user_score(&self, user_id: i64, timestamp: i64, score: i32) {
        self.data.write().user_scores.push(ScoreRow {
            user_id,
            timestamp,
            score,
        });
    }

    // ==================== Test hooks ====================

    /// Number of queries issued so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Make every subsequent `query` fail with a query error.
    pub fn fail_query(&self, query: LocalQuery) {
        self.failing.write().insert(query);
    }

    /// Delay every subsequent `query` by `delay` before it answers.
    pub fn delay_query(&self, query: LocalQuery, delay: Duration) {
        self.delays.write().insert(query, delay);
    }

    async fn begin(&self, query: LocalQuery) -> RepositoryResult<()> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        let delay = self.delays.read().get(&query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.read().contains(&query) {
            return Err(RepositoryError::query_with_context(
                "injected failure",
                ErrorContext::new(query.operation()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataRepository for LocalRepository {
    async fn fetch_reposts(&self, ids: &[ItemId]) -> RepositoryResult<Vec<ItemId>> {
        self.begin(LocalQuery::Reposts).await?;

        let data = self.data.read();
        Ok(data
            .tags
            .iter()
            .filter(|row| ids.contains(&row.item_id))
            .filter(|row| row.confidence > REPOST_MIN_CONFIDENCE)
            .filter(|row| row.tag.to_lowercase() == REPOST_TAG)
            .map(|row| row.item_id)
            .take(FACET_LIMIT)
            .collect())
    }

    async fn fetch_sizes(&self, ids: &[ItemId]) -> RepositoryResult<Vec<SizeInfo>> {
        self.begin(LocalQuery::Sizes).await?;

        let data = self.data.read();
        Ok(data
            .sizes
            .iter()
            .filter(|row| ids.contains(&row.id))
            .take(FACET_LIMIT)
            .cloned()
            .collect())
    }

    async fn fetch_previews(&self, ids: &[ItemId]) -> RepositoryResult<Vec<PreviewInfo>> {
        self.begin(LocalQuery::Previews).await?;

        let data = self.data.read();
        Ok(data
            .previews
            .iter()
            .filter(|row| ids.contains(&row.id))
            .take(FACET_LIMIT)
            .map(|row| PreviewInfo {
                id: row.id,
                width: row.width,
                height: row.height,
                pixels: STANDARD.encode(&row.preview),
            })
            .collect())
    }

    async fn fetch_score_history(
        &self,
        name: &str,
        since: i64,
    ) -> RepositoryResult<Vec<ScorePoint>> {
        self.begin(LocalQuery::ScoreHistory).await?;

        let data = self.data.read();
        let name = name.to_lowercase();
        let user_ids: HashSet<i64> = data
            .users
            .iter()
            .filter(|user| user.name.to_lowercase() == name)
            .map(|user| user.id)
            .collect();

        Ok(data
            .user_scores
            .iter()
            .filter(|row| user_ids.contains(&row.user_id) && row.timestamp > since)
            .map(|row| (row.timestamp, row.score))
            .collect())
    }

    async fn suggest_names(&self, prefix: &str) -> RepositoryResult<Vec<String>> {
        self.begin(LocalQuery::SuggestNames).await?;

        let data = self.data.read();
        let prefix = prefix.to_lowercase();
        let mut matches: Vec<&UserRow> = data
            .users
            .iter()
            .filter(|user| user.name.to_lowercase().starts_with(&prefix))
            .collect();
        // stable: equal scores keep insertion order
        matches.sort_by(|a, b| b.score.cmp(&a.score));

        Ok(matches
            .into_iter()
            .take(SUGGEST_LIMIT)
            .map(|user| user.name.clone())
            .collect())
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}
