//! Periodic push of request metrics to Datadog.
//!
//! Every sample period the reporter turns the route summaries (count, mean
//! and latency percentiles) and the process gauges into series and posts
//! them to the Datadog v1 series API. A failed push is
//! logged and skipped; request serving never depends on it.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{RequestMetrics, PROCESS_PREFIX};

pub const DEFAULT_ENDPOINT: &str = "https://api.datadoghq.com/api/v1/series";
pub const SAMPLE_PERIOD: Duration = Duration::from_secs(60);
pub const METRIC_PREFIX: &str = "pr0gramm.meta.webapp.request";
pub const PROCESS_METRIC_PREFIX: &str = "pr0gramm.meta.webapp.process";

/// Latency percentiles reported per route, with their series suffix.
pub const PERCENTILES: [(&str, f64); 3] = [("p50", 0.5), ("p95", 0.95), ("p99", 0.99)];

/// Error pushing a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("datadog request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Body of a series submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPayload {
    pub series: Vec<Series>,
}

/// One gauge series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub metric: String,
    pub points: Vec<(i64, f64)>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub host: String,
}

/// Background reporter pushing [`RequestMetrics`] to Datadog.
pub struct DatadogReporter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    host: String,
    period: Duration,
    metrics: RequestMetrics,
}

impl DatadogReporter {
    pub fn new(api_key: impl Into<String>, host: impl Into<String>, metrics: RequestMetrics) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            host: host.into(),
            period: SAMPLE_PERIOD,
            metrics,
        }
    }

    /// Post to `endpoint` instead of the public Datadog API.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Build the payload for the current state of the metrics.
    pub fn series(&self, timestamp: i64) -> SeriesPayload {
        let mut series = Vec::new();

        for summary in self.metrics.route_summaries() {
            let metric = |stat: &str| format!("{}.{}.{}", METRIC_PREFIX, summary.route, stat);
            series.push(self.gauge(metric("count"), timestamp, summary.count as f64));
            series.push(self.gauge(metric("mean"), timestamp, summary.mean_seconds()));
            for (stat, q) in PERCENTILES {
                series.push(self.gauge(metric(stat), timestamp, summary.quantile_seconds(q)));
            }
        }

        for (name, value) in self.metrics.process_samples() {
            let stat = name.strip_prefix(PROCESS_PREFIX).unwrap_or(&name);
            series.push(self.gauge(
                format!("{}.{}", PROCESS_METRIC_PREFIX, stat),
                timestamp,
                value,
            ));
        }

        SeriesPayload { series }
    }

    fn gauge(&self, metric: String, timestamp: i64, value: f64) -> Series {
        Series {
            metric,
            points: vec![(timestamp, value)],
            kind: "gauge",
            host: self.host.clone(),
        }
    }

    /// Push one report.
    pub async fn report(&self) -> Result<(), ReportError> {
        let payload = self.series(Utc::now().timestamp());
        if payload.series.is_empty() {
            return Ok(());
        }

        self.client
            .post(&self.endpoint)
            .header("DD-API-KEY", &self.api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        debug!(series = payload.series.len(), "reported metrics to datadog");
        Ok(())
    }

    /// Report every period until `shutdown` flips to `true` or its sender
    /// goes away.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(host = %self.host, "Starting datadog reporter");

        let mut ticker = tokio::time::interval(self.period);
        // the first tick fires immediately and there is nothing to report yet
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.report().await {
                        warn!(error = %e, "datadog report failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Datadog reporter stopped");
    }
}
