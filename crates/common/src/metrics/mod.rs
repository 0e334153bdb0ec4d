//! Prometheus metrics
//!
//! Per-route request latency plus domain counters: launch decisions by
//! reason, policy writes by source, package applications, tag bulk blocks,
//! recorded usage and report reviews.

use crate::access::launch::LaunchDecision;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

// Metric names; every series carries the `safeview_` prefix
const EPISODES_BLOCKED_TOTAL: &str = "safeview_episodes_blocked_total";
const LAUNCH_DECISIONS_TOTAL: &str = "safeview_launch_decisions_total";
const PACKAGE_TITLES_TOTAL: &str = "safeview_package_titles_total";
const POLICY_WRITES_TOTAL: &str = "safeview_policy_writes_total";
const REPORT_REVIEWS_TOTAL: &str = "safeview_report_reviews_total";
const REQUEST_DURATION_SECONDS: &str = "safeview_request_duration_seconds";
const REQUESTS_TOTAL: &str = "safeview_requests_total";
const USAGE_MINUTES_TOTAL: &str = "safeview_usage_minutes_total";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 25ms, P99 < 100ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms - P50 target
    0.050,  // 50ms
    0.100,  // 100ms - P99 target
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        REQUESTS_TOTAL,
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Launch checks
    describe_counter!(
        LAUNCH_DECISIONS_TOTAL,
        Unit::Count,
        "Launch checks by outcome and deny reason"
    );

    // Policy store
    describe_counter!(
        POLICY_WRITES_TOTAL,
        Unit::Count,
        "Policies created or changed, by source"
    );

    describe_counter!(
        EPISODES_BLOCKED_TOTAL,
        Unit::Count,
        "Episodes newly blocked through tag bulk actions"
    );

    // Packages
    describe_counter!(
        PACKAGE_TITLES_TOTAL,
        Unit::Count,
        "Package member titles processed on apply, by result"
    );

    // Usage
    describe_counter!(
        USAGE_MINUTES_TOTAL,
        Unit::Count,
        "Minutes of usage recorded from devices"
    );

    // Moderation
    describe_counter!(
        REPORT_REVIEWS_TOTAL,
        Unit::Count,
        "Content report reviews, by outcome"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            REQUESTS_TOTAL,
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            REQUEST_DURATION_SECONDS,
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

pub fn record_launch(decision: &LaunchDecision) {
    let (outcome, reason) = match decision.reason() {
        None => ("allow", "none"),
        Some(reason) => ("deny", reason.as_str()),
    };

    counter!(
        LAUNCH_DECISIONS_TOTAL,
        "outcome" => outcome,
        "reason" => reason
    )
    .increment(1);
}

/// `source` is one of "direct", "package" or "update"
pub fn record_policy_write(source: &'static str, count: usize) {
    counter!(
        POLICY_WRITES_TOTAL,
        "source" => source
    )
    .increment(count as u64);
}

pub fn record_package_application(created: usize, skipped: usize) {
    counter!(
        PACKAGE_TITLES_TOTAL,
        "result" => "created"
    )
    .increment(created as u64);

    counter!(
        PACKAGE_TITLES_TOTAL,
        "result" => "skipped"
    )
    .increment(skipped as u64);
}

pub fn record_episodes_blocked(count: usize) {
    counter!(EPISODES_BLOCKED_TOTAL).increment(count as u64);
}

pub fn record_usage(minutes: i32) {
    counter!(USAGE_MINUTES_TOTAL).increment(minutes.max(0) as u64);
}

pub fn record_report_review(status: &'static str) {
    counter!(
        REPORT_REVIEWS_TOTAL,
        "status" => status
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::launch::{DenyReason, LaunchTarget};

    #[test]
    fn test_latency_buckets() {
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }

        assert!(LATENCY_BUCKETS.contains(&0.025));
        assert!(LATENCY_BUCKETS.contains(&0.100));
    }

    #[test]
    fn test_recorders_without_exporter() {
        // no recorder installed: these are no-ops but must not panic
        let metrics = RequestMetrics::start("POST", "/v1/launch/check");
        metrics.finish(200);

        record_launch(&LaunchDecision::Deny(DenyReason::Bedtime));
        record_launch(&LaunchDecision::Allow(LaunchTarget {
            deep_link: "https://www.netflix.com/".into(),
            fallback_url: "https://www.netflix.com/".into(),
        }));
        record_package_application(3, 2);
        record_usage(15);
    }
}
