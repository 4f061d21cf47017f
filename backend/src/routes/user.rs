//! `GET /user/{user}` and `GET /user/suggest/{prefix}`.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::HandlerResult;
use crate::api::{UserResponse, UserSuggestResponse};
use crate::db::repository::{MetadataRepository, RepositoryResult};

/// Score history reaches back this many days.
pub const HISTORY_DAYS: i64 = 7;

/// Shortest prefix, after sanitizing, that triggers a lookup.
pub const MIN_PREFIX_CHARS: usize = 3;

pub const PREFIX_TOO_SHORT_MESSAGE: &str = "Need at least 3 characters";

/// Unix timestamp of the oldest sample included in a history.
pub fn history_cutoff(now: DateTime<Utc>) -> i64 {
    (now - Duration::days(HISTORY_DAYS)).timestamp()
}

/// Score history of `user` over the last [`HISTORY_DAYS`] days.
///
/// An unknown user is not an error, it just has no history.
pub async fn fetch_user(
    repository: &dyn MetadataRepository,
    user: &str,
) -> RepositoryResult<HandlerResult<UserResponse>> {
    fetch_user_at(repository, user, Utc::now()).await
}

/// [`fetch_user`] with an explicit clock.
pub async fn fetch_user_at(
    repository: &dyn MetadataRepository,
    user: &str,
    now: DateTime<Utc>,
) -> RepositoryResult<HandlerResult<UserResponse>> {
    let benis_history = repository
        .fetch_score_history(user, history_cutoff(now))
        .await?;

    Ok(HandlerResult::Success(UserResponse { benis_history }))
}

/// Strip `%` so callers cannot smuggle their own LIKE wildcards.
pub fn sanitize_prefix(raw: &str) -> String {
    raw.replace('%', "")
}

/// Up to 20 usernames starting with `prefix`, best score first.
pub async fn suggest_users(
    repository: &dyn MetadataRepository,
    prefix: &str,
) -> RepositoryResult<HandlerResult<UserSuggestResponse>> {
    let prefix = sanitize_prefix(prefix);
    if prefix.chars().count() < MIN_PREFIX_CHARS {
        debug!(prefix = %prefix, "prefix too short for suggestions");
        return Ok(HandlerResult::error(412, PREFIX_TOO_SHORT_MESSAGE));
    }

    let names = repository.suggest_names(&prefix).await?;
    Ok(HandlerResult::Success(UserSuggestResponse { names }))
}
