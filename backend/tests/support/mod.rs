#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};

use meta_gateway::db::LocalRepository;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Timestamps of the two recent score samples seeded for "alice".
pub fn recent_timestamps() -> (i64, i64) {
    let now = Utc::now();
    (
        (now - Duration::days(2)).timestamp(),
        (now - Duration::hours(3)).timestamp(),
    )
}

/// Store with the fixture data used by the end-to-end tests.
///
/// - item 1 tagged "repost" (0.5), item 3 tagged "repost" below threshold
/// - size of item 2 is 100x200, no previews
/// - users alice (10), alina (5), bob (7); alice has two recent and one old sample
pub fn seeded_repository() -> Arc<LocalRepository> {
    let repo = LocalRepository::new();

    repo.add_tag(1, "repost", 0.5);
    repo.add_tag(3, "repost", 0.2);
    repo.add_tag(2, "cat", 0.9);
    repo.add_size(2, 100, 200);

    let alice = repo.add_user("alice", 10);
    repo.add_user("alina", 5);
    let bob = repo.add_user("bob", 7);

    let (first, second) = recent_timestamps();
    let old = (Utc::now() - Duration::days(30)).timestamp();
    repo.add_user_score(alice, old, 1);
    repo.add_user_score(alice, first, 42);
    repo.add_user_score(alice, second, 57);
    repo.add_user_score(bob, first, 3);

    Arc::new(repo)
}

#[cfg(feature = "http-server")]
pub use self::http::*;

#[cfg(feature = "http-server")]
mod http {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{HeaderMap, Request, StatusCode};
    use tower::ServiceExt;

    use meta_gateway::db::{LocalRepository, MetadataRepository};
    use meta_gateway::http::{create_app, AppState};
    use meta_gateway::metrics::RequestMetrics;

    /// Response parts the tests look at.
    pub struct TestResponse {
        pub status: StatusCode,
        pub headers: HeaderMap,
        pub body: Vec<u8>,
    }

    impl TestResponse {
        pub fn text(&self) -> &str {
            std::str::from_utf8(&self.body).unwrap()
        }

        pub fn json(&self) -> serde_json::Value {
            serde_json::from_slice(&self.body).unwrap()
        }
    }

    pub struct TestApp {
        pub repo: Arc<LocalRepository>,
        pub metrics: RequestMetrics,
        state: AppState,
    }

    impl TestApp {
        pub fn new(repo: Arc<LocalRepository>) -> Self {
            let metrics = RequestMetrics::new().unwrap();
            let repository: Arc<dyn MetadataRepository> = repo.clone();
            let state = AppState::new(repository, metrics.clone());
            Self {
                repo,
                metrics,
                state,
            }
        }

        /// Send a GET through the full middleware stack.
        pub async fn get(&self, uri: &str) -> TestResponse {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let response = create_app(self.state.clone())
                .oneshot(request)
                .await
                .unwrap();

            let status = response.status();
            let headers = response.headers().clone();
            let body = to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap()
                .to_vec();

            TestResponse {
                status,
                headers,
                body,
            }
        }
    }
}
