//! Request timing metrics.
//!
//! [`RequestMetrics`] is an explicitly constructed sink: the server builds
//! one at startup, hands it to the router through the application state and
//! to the optional [`DatadogReporter`]. Nothing is registered globally.
//!
//! # Metric Specification
//!
//! - **Name**: `meta_gateway_request_duration_seconds`
//! - **Type**: Histogram
//! - **Labels**:
//!   - `route`: route name (`items`, `user`, `user-suggest`)
//!
//! [`RequestMetrics::new`] also registers the process collector (resident
//! and virtual memory, CPU time, open file descriptors, threads) on Linux.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use prometheus::core::Metric as _;
use prometheus::proto::MetricType;
use prometheus::{Encoder, Histogram, HistogramOpts, HistogramVec, Registry, TextEncoder};

pub mod datadog;

pub use datadog::{DatadogReporter, ReportError};

pub const REQUEST_DURATION: &str = "meta_gateway_request_duration_seconds";

/// Name prefix of the process collector's metrics.
pub const PROCESS_PREFIX: &str = "process_";

/// Count and total latency of one route since startup.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub route: String,
    pub count: u64,
    pub sum_seconds: f64,
    /// `(upper bound, cumulative count)` of every histogram bucket
    pub buckets: Vec<(f64, u64)>,
}

impl RouteSummary {
    /// Mean latency in seconds, zero before the first request.
    pub fn mean_seconds(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_seconds / self.count as f64
        }
    }

    /// Latency below which a fraction `q` of the requests finished,
    /// interpolated linearly inside the bucket holding that rank.
    ///
    /// Ranks beyond the last bucket report its upper bound.
    pub fn quantile_seconds(&self, q: f64) -> f64 {
        if self.count == 0 {
            return 0.0;
        }

        let rank = q.clamp(0.0, 1.0) * self.count as f64;
        let mut lower = 0.0;
        let mut below = 0u64;
        for &(upper, cumulative) in &self.buckets {
            if cumulative as f64 >= rank {
                let in_bucket = cumulative.saturating_sub(below);
                if in_bucket == 0 {
                    return lower;
                }
                return lower + (upper - lower) * (rank - below as f64) / in_bucket as f64;
            }
            lower = upper;
            below = cumulative;
        }
        lower
    }
}

/// Prometheus-backed per-route request timers.
#[derive(Clone)]
pub struct RequestMetrics {
    registry: Registry,
    request_duration: HistogramVec,
    routes: Arc<Mutex<BTreeSet<String>>>,
}

impl RequestMetrics {
    /// Create metrics backed by a fresh registry, including process metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let metrics = Self::with_registry(Registry::new())?;
        metrics.register_process_collector()?;
        Ok(metrics)
    }

    /// Create and register metrics with the given registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be registered (e.g., if a
    /// metric with the same name already exists in the registry).
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let request_duration = HistogramVec::new(
            HistogramOpts::new(REQUEST_DURATION, "Wall-clock duration of request dispatch"),
            &["route"],
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            registry,
            request_duration,
            routes: Arc::new(Mutex::new(BTreeSet::new())),
        })
    }

    /// Register the collector for this process's resource usage.
    ///
    /// Only Linux exposes these figures; elsewhere nothing is registered.
    pub fn register_process_collector(&self) -> Result<(), prometheus::Error> {
        #[cfg(target_os = "linux")]
        self.registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;
        Ok(())
    }

    /// Timer for `route`; the route shows up in summaries from now on.
    pub fn route_timer(&self, route: &str) -> Histogram {
        self.routes.lock().insert(route.to_string());
        self.request_duration.with_label_values(&[route])
    }

    /// Record one request of `route`.
    pub fn observe(&self, route: &str, elapsed: Duration) {
        self.route_timer(route).observe(elapsed.as_secs_f64());
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Summaries of every known route, ordered by route name.
    pub fn route_summaries(&self) -> Vec<RouteSummary> {
        let routes = self.routes.lock().clone();
        routes
            .into_iter()
            .map(|route| {
                let sample = self
                    .request_duration
                    .with_label_values(&[route.as_str()])
                    .metric();
                let histogram = sample.get_histogram();
                RouteSummary {
                    count: histogram.sample_count(),
                    sum_seconds: histogram.sample_sum(),
                    buckets: histogram
                        .bucket
                        .iter()
                        .map(|bucket| (bucket.upper_bound(), bucket.cumulative_count()))
                        .collect(),
                    route,
                }
            })
            .collect()
    }

    /// Current gauge and counter values of the process collector, by name.
    pub fn process_samples(&self) -> Vec<(String, f64)> {
        self.registry
            .gather()
            .iter()
            .filter(|family| family.name().starts_with(PROCESS_PREFIX))
            .filter_map(|family| {
                let metric = family.get_metric().first()?;
                let value = match family.get_field_type() {
                    MetricType::GAUGE => metric.get_gauge().value(),
                    MetricType::COUNTER => metric.get_counter().value(),
                    _ => return None,
                };
                Some((family.name().to_string(), value))
            })
            .collect()
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
