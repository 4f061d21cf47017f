//! `GET /items`: three metadata facets for a list of item ids.
//!
//! The reposts, sizes and previews lookups are independent, so they are
//! spawned as separate tasks and joined before the response is assembled.
//! Each task owns its own result slot; nothing is shared between them except
//! the read-only repository and id list.
//!
//! Failure policy is all-or-nothing: the handler always waits for all three
//! tasks, then a single failed facet fails the whole request.

use std::sync::{Arc, LazyLock};
use std::time::Instant;

use regex::Regex;
use tokio::task::JoinError;
use tracing::debug;

use super::HandlerResult;
use crate::api::{ItemId, ItemsResponse};
use crate::db::repository::{ErrorContext, MetadataRepository, RepositoryError, RepositoryResult};

pub const INVALID_IDS_MESSAGE: &str = "Invalid value for parameter ids";

static IDS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(?:,[0-9]+)*$").expect("valid regex"));

/// Parse the `ids` parameter: a non-empty comma separated list of decimal
/// ids without whitespace or empty entries.
///
/// Returns `None` when the parameter is missing, malformed or holds an id
/// that does not fit in an `i64`.
pub fn parse_item_ids(raw: Option<&str>) -> Option<Vec<ItemId>> {
    let raw = raw?;
    if !IDS_PATTERN.is_match(raw) {
        return None;
    }

    raw.split(',')
        .map(|id| id.parse::<i64>().ok().map(ItemId::new))
        .collect()
}

/// Validate `ids` and fetch every facet concurrently.
pub async fn fetch_items(
    repository: Arc<dyn MetadataRepository>,
    raw_ids: Option<&str>,
) -> RepositoryResult<HandlerResult<ItemsResponse>> {
    let started = Instant::now();

    let Some(ids) = parse_item_ids(raw_ids) else {
        debug!(ids = ?raw_ids, "rejecting invalid item id list");
        return Ok(HandlerResult::error(400, INVALID_IDS_MESSAGE));
    };
    let ids: Arc<[ItemId]> = ids.into();

    let reposts = tokio::spawn({
        let repository = Arc::clone(&repository);
        let ids = Arc::clone(&ids);
        async move { repository.fetch_reposts(&ids).await }
    });
    let sizes = tokio::spawn({
        let repository = Arc::clone(&repository);
        let ids = Arc::clone(&ids);
        async move { repository.fetch_sizes(&ids).await }
    });
    let previews = tokio::spawn({
        let repository = Arc::clone(&repository);
        let ids = Arc::clone(&ids);
        async move { repository.fetch_previews(&ids).await }
    });

    let (reposts, sizes, previews) = tokio::join!(reposts, sizes, previews);
    let duration = started.elapsed().as_secs_f64();

    Ok(HandlerResult::Success(ItemsResponse {
        duration,
        reposts: joined(reposts, "fetch_reposts")?,
        sizes: joined(sizes, "fetch_sizes")?,
        previews: joined(previews, "fetch_previews")?,
    }))
}

fn joined<T>(
    result: Result<RepositoryResult<T>, JoinError>,
    operation: &str,
) -> RepositoryResult<T> {
    result.map_err(|e| {
        RepositoryError::internal_with_context(
            format!("Task join error: {}", e),
            ErrorContext::new(operation),
        )
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{LocalQuery, LocalRepository};
    use std::time::Duration;

    fn ids(values: &[i64]) -> Vec<ItemId> {
        values.iter().copied().map(ItemId::new).collect()
    }

    #[test]
    fn test_parse_valid_lists() {
        assert_eq!(parse_item_ids(Some("1")), Some(ids(&[1])));
        assert_eq!(parse_item_ids(Some("1,2,3")), Some(ids(&[1, 2, 3])));
        assert_eq!(parse_item_ids(Some("007,0")), Some(ids(&[7, 0])));
    }

    #[test]
    fn test_parse_rejects_malformed_lists() {
        for raw in [
            "", "abc", "1,", ",1", "1,,2", "1, 2", " 1", "1 ", "-1", "1;2", "1.5", "١٢",
        ] {
            assert_eq!(parse_item_ids(Some(raw)), None, "accepted {:?}", raw);
        }
        assert_eq!(parse_item_ids(None), None);
    }

    #[test]
    fn test_parse_rejects_overflowing_ids() {
        assert_eq!(parse_item_ids(Some("99999999999999999999")), None);
        assert_eq!(
            parse_item_ids(Some("9223372036854775807")),
            Some(ids(&[i64::MAX]))
        );
    }

    #[tokio::test]
    async fn test_invalid_ids_issue_no_queries() {
        let repo = Arc::new(LocalRepository::new());

        let result = fetch_items(repo.clone(), Some("1,a")).await.unwrap();

        let rejection = result.rejection().unwrap();
        assert_eq!(rejection.status, 400);
        assert_eq!(rejection.message, INVALID_IDS_MESSAGE);
        assert_eq!(repo.query_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_ids_yield_empty_facets() {
        let repo = Arc::new(LocalRepository::new());

        let response = fetch_items(repo.clone(), Some("5,6"))
            .await
            .unwrap()
            .success()
            .unwrap();

        assert!(response.reposts.is_empty());
        assert!(response.sizes.is_empty());
        assert!(response.previews.is_empty());
        assert!(response.duration >= 0.0);
        assert_eq!(repo.query_count(), 3);
    }

    #[tokio::test]
    async fn test_facets_are_fetched_concurrently() {
        let repo = Arc::new(LocalRepository::new());
        for query in [LocalQuery::Reposts, LocalQuery::Sizes, LocalQuery::Previews] {
            repo.delay_query(query, Duration::from_millis(200));
        }

        let started = Instant::now();
        let response = fetch_items(repo.clone(), Some("1"))
            .await
            .unwrap()
            .success()
            .unwrap();

        // sequential lookups would take at least 600ms
        assert!(started.elapsed() < Duration::from_millis(550));
        assert!(response.duration >= 0.2);
    }

    #[tokio::test]
    async fn test_one_failed_facet_fails_the_request() {
        let repo = Arc::new(LocalRepository::new());
        repo.add_tag(1, "repost", 0.9);
        repo.fail_query(LocalQuery::Previews);

        let err = fetch_items(repo.clone(), Some("1")).await.unwrap_err();

        assert_eq!(err.context().operation.as_deref(), Some("fetch_previews"));
        // the other facets were still awaited
        assert_eq!(repo.query_count(), 3);
    }
}
