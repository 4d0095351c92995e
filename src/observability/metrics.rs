//! # Metrics
//!
//! Prometheus metrics for monitoring the scrape pipeline.
//!
//! ## Metrics Exposed
//!
//! - `kubeview_scrapes_total` - Total number of scrape requests
//! - `kubeview_scrape_errors_total` - Failed scrape requests, by reason
//! - `kubeview_scrape_duration_seconds` - End-to-end scrape duration
//! - `kubeview_upstream_errors_total` - Failed cluster API list calls, by kind
//! - `kubeview_secrets_filtered_total` - Release secrets dropped from responses
//! - `kubeview_values_redacted_total` - Secret values replaced with the sentinel
//! - `kubeview_certificates_redacted_total` - Certificate blocks replaced

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

use crate::scrape::{ResourceKind, SanitizeReport};

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static SCRAPES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("kubeview_scrapes_total", "Total number of scrape requests")
        .expect("Failed to create SCRAPES_TOTAL metric - this should never happen")
});

static SCRAPE_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "kubeview_scrape_errors_total",
            "Total number of failed scrape requests by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create SCRAPE_ERRORS_TOTAL metric - this should never happen")
});

static SCRAPE_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "kubeview_scrape_duration_seconds",
            "Duration of scrape requests in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create SCRAPE_DURATION metric - this should never happen")
});

static UPSTREAM_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "kubeview_upstream_errors_total",
            "Total number of failed Kubernetes API list calls by resource kind",
        ),
        &["kind"],
    )
    .expect("Failed to create UPSTREAM_ERRORS_TOTAL metric - this should never happen")
});

static SECRETS_FILTERED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "kubeview_secrets_filtered_total",
        "Total number of Helm release secrets dropped from responses",
    )
    .expect("Failed to create SECRETS_FILTERED_TOTAL metric - this should never happen")
});

static VALUES_REDACTED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "kubeview_values_redacted_total",
        "Total number of secret values replaced with the redaction sentinel",
    )
    .expect("Failed to create VALUES_REDACTED_TOTAL metric - this should never happen")
});

static CERTIFICATES_REDACTED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "kubeview_certificates_redacted_total",
        "Total number of PEM certificate blocks redacted",
    )
    .expect("Failed to create CERTIFICATES_REDACTED_TOTAL metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(SCRAPES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SCRAPE_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SCRAPE_DURATION.clone()))?;
    REGISTRY.register(Box::new(UPSTREAM_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRETS_FILTERED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VALUES_REDACTED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CERTIFICATES_REDACTED_TOTAL.clone()))?;

    Ok(())
}

pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    REGISTRY.gather()
}

pub fn increment_scrapes() {
    SCRAPES_TOTAL.inc();
}

pub fn increment_scrape_errors(reason: &str) {
    SCRAPE_ERRORS_TOTAL.with_label_values(&[reason]).inc();
}

pub fn observe_scrape_duration(duration: f64) {
    SCRAPE_DURATION.observe(duration);
}

pub fn increment_upstream_errors(kind: ResourceKind) {
    UPSTREAM_ERRORS_TOTAL
        .with_label_values(&[kind.field_name()])
        .inc();
}

pub fn record_sanitize_report(report: &SanitizeReport, deep_certificates_redacted: usize) {
    SECRETS_FILTERED_TOTAL.inc_by(report.secrets_filtered as u64);
    VALUES_REDACTED_TOTAL.inc_by(report.values_redacted as u64);
    CERTIFICATES_REDACTED_TOTAL
        .inc_by((report.certificates_redacted + deep_certificates_redacted) as u64);
}
