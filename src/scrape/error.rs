//! # Scrape Errors

use std::time::Duration;
use thiserror::Error;

use super::envelope::ResourceKind;

/// Every way a scrape request can fail. None of them is retried.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// A cluster API list call failed (network, auth, forbidden, not found)
    #[error("failed to list {kind}: {source}")]
    Upstream {
        kind: ResourceKind,
        #[source]
        source: anyhow::Error,
    },
    /// The envelope could not be encoded
    #[error("failed to serialize scrape result: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Collection did not finish within the configured timeout
    #[error("scrape did not complete within {0:?}")]
    Timeout(Duration),
}

impl ScrapeError {
    /// Short label for logs and metrics
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ScrapeError::Upstream { .. } => "upstream",
            ScrapeError::Serialization(_) => "serialization",
            ScrapeError::Timeout(_) => "timeout",
        }
    }
}
