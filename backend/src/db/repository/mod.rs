//! Repository trait for read-only metadata lookups.
//!
//! Every method maps to exactly one query against the metadata store. The
//! limits below are part of the query contract and are shared by all
//! implementations so that the in-memory store behaves like Postgres.

use async_trait::async_trait;

use crate::api::{ItemId, PreviewInfo, ScorePoint, SizeInfo};

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Maximum rows returned per item facet.
pub const FACET_LIMIT: usize = 150;

/// Maximum usernames returned by a suggestion lookup.
pub const SUGGEST_LIMIT: usize = 20;

/// Tags with a confidence at or below this value never count as reposts.
pub const REPOST_MIN_CONFIDENCE: f64 = 0.3;

/// Tag marking an item as a repost (matched case-insensitively).
pub const REPOST_TAG: &str = "repost";

/// Escape character of the `LIKE` patterns built by [`like_prefix_pattern`].
pub const LIKE_ESCAPE: char = '\\';

/// `LIKE` pattern matching every string that starts with `prefix`.
///
/// `%`, `_` and the escape character itself are escaped, so the prefix is
/// matched literally. The query has to declare `ESCAPE` with [`LIKE_ESCAPE`].
pub fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Repository trait for the metadata store.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`: one instance is shared by every
/// request and by the concurrent facet lookups of a single request.
#[async_trait]
pub trait MetadataRepository: Send + Sync {
    /// Items of `ids` carrying the repost tag with confidence above
    /// [`REPOST_MIN_CONFIDENCE`], at most [`FACET_LIMIT`].
    async fn fetch_reposts(&self, ids: &[ItemId]) -> RepositoryResult<Vec<ItemId>>;

    /// Stored sizes for `ids`, at most [`FACET_LIMIT`].
    async fn fetch_sizes(&self, ids: &[ItemId]) -> RepositoryResult<Vec<SizeInfo>>;

    /// Previews for `ids` with base64 encoded pixels, at most [`FACET_LIMIT`].
    async fn fetch_previews(&self, ids: &[ItemId]) -> RepositoryResult<Vec<PreviewInfo>>;

    /// Score samples of the user called `name` (case-insensitive) newer than
    /// the unix timestamp `since`, in store order.
    async fn fetch_score_history(&self, name: &str, since: i64)
        -> RepositoryResult<Vec<ScorePoint>>;

    /// Usernames starting with `prefix` (case-insensitive), highest score
    /// first, at most [`SUGGEST_LIMIT`]. Every character of `prefix` is
    /// literal, `LIKE` wildcards included.
    async fn suggest_names(&self, prefix: &str) -> RepositoryResult<Vec<String>>;

    /// Check that the store answers queries.
    async fn health_check(&self) -> RepositoryResult<bool>;
}
