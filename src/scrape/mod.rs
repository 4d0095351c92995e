//! # Scrape Pipeline
//!
//! Collector → Sanitizer → Aggregator, run once per request with no state
//! carried between requests.
//!
//! - [`collector`]: concurrent per-kind list queries, fail fast
//! - [`sanitizer`]: release-secret filtering and redaction
//! - [`aggregator`]: JSON serialization and the HTTP response

pub mod aggregator;
pub mod collector;
pub mod envelope;
pub mod error;
pub mod sanitizer;

pub use aggregator::ScrapeResponse;
pub use collector::Collector;
pub use envelope::{ResourceKind, ScrapeEnvelope};
pub use error::ScrapeError;
pub use sanitizer::SanitizeReport;

use std::time::{Duration, Instant};
use tracing::{info, info_span, Instrument};

use crate::cluster::{ClusterReader, NamespaceSelector};
use crate::config::ServerConfig;
use crate::observability::metrics;

/// Per-process pipeline settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeOptions {
    /// Upper bound for the collection stage
    pub timeout: Duration,
    /// Walk the whole envelope for certificates before serializing
    pub deep_certificate_redaction: bool,
}

impl From<&ServerConfig> for ScrapeOptions {
    fn from(config: &ServerConfig) -> Self {
        Self {
            timeout: config.scrape_timeout(),
            deep_certificate_redaction: config.deep_certificate_redaction,
        }
    }
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct ScrapePipeline<R> {
    collector: Collector<R>,
    options: ScrapeOptions,
}

impl<R: ClusterReader> ScrapePipeline<R> {
    pub fn new(reader: R, options: ScrapeOptions) -> Self {
        Self {
            collector: Collector::new(reader),
            options,
        }
    }

    pub fn reader(&self) -> &R {
        self.collector.reader()
    }

    /// Collect, then sanitize. Dropping the returned future drops every in-flight query.
    pub async fn snapshot(
        &self,
        selector: &NamespaceSelector,
    ) -> Result<(ScrapeEnvelope, SanitizeReport), ScrapeError> {
        let collection = self.collector.collect(selector);
        let mut envelope = tokio::time::timeout(self.options.timeout, collection)
            .await
            .map_err(|_elapsed| ScrapeError::Timeout(self.options.timeout))??;
        let report = sanitizer::sanitize(&mut envelope);
        Ok((envelope, report))
    }

    /// Run the full pipeline and produce the serialized response
    pub async fn run(&self, selector: &NamespaceSelector) -> Result<ScrapeResponse, ScrapeError> {
        let span = info_span!("scrape", namespace = %selector);
        async {
            let start = Instant::now();
            metrics::increment_scrapes();

            let result = self.run_inner(selector, start).await;
            metrics::observe_scrape_duration(start.elapsed().as_secs_f64());
            if let Err(e) = &result {
                metrics::increment_scrape_errors(e.reason());
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_inner(
        &self,
        selector: &NamespaceSelector,
        start: Instant,
    ) -> Result<ScrapeResponse, ScrapeError> {
        let (envelope, report) = self.snapshot(selector).await?;
        let response = aggregator::render(&envelope, self.options.deep_certificate_redaction)?;

        metrics::record_sanitize_report(&report, response.deep_certificates_redacted);
        let certificates_redacted =
            report.certificates_redacted + response.deep_certificates_redacted;
        info!(
            objects = envelope.total_objects(),
            secrets_filtered = report.secrets_filtered,
            values_redacted = report.values_redacted,
            certificates_redacted,
            bytes = response.body().len(),
            elapsed = ?start.elapsed(),
            "Scrape complete"
        );
        Ok(response)
    }
}
