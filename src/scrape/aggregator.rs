//! # Aggregator
//!
//! Turns a sanitized [`ScrapeEnvelope`] into the JSON response body.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::error;

use super::envelope::ScrapeEnvelope;
use super::error::ScrapeError;
use super::sanitizer::redact_certificates_in_value;

/// Serialized envelope, ready to be sent
#[derive(Debug, Clone)]
pub struct ScrapeResponse {
    body: Vec<u8>,
    /// Certificates found by the whole-envelope walk, zero when it is disabled
    pub deep_certificates_redacted: usize,
}

impl ScrapeResponse {
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Serialize the envelope. With `deep_redaction` every string in every kind
/// is also scanned for certificates, not only Secrets and ConfigMaps.
pub fn render(
    envelope: &ScrapeEnvelope,
    deep_redaction: bool,
) -> Result<ScrapeResponse, ScrapeError> {
    if !deep_redaction {
        return Ok(ScrapeResponse {
            body: serde_json::to_vec(envelope)?,
            deep_certificates_redacted: 0,
        });
    }

    let mut tree = serde_json::to_value(envelope)?;
    let deep_certificates_redacted = redact_certificates_in_value(&mut tree);
    Ok(ScrapeResponse {
        body: serde_json::to_vec(&tree)?,
        deep_certificates_redacted,
    })
}

/// JSON body with an `Access-Control-Allow-Origin: *` header
pub fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
        ],
        body,
    )
        .into_response()
}

impl IntoResponse for ScrapeResponse {
    fn into_response(self) -> Response {
        json_response(StatusCode::OK, self.body)
    }
}

impl IntoResponse for ScrapeError {
    fn into_response(self) -> Response {
        match &self {
            // Already logged per kind by the collector
            ScrapeError::Upstream { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
            ScrapeError::Serialization(e) => {
                // Never leak encoder detail to the client
                error!("Failed to marshal scrape result: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
            ScrapeError::Timeout(_) => {
                error!("Scrape failed: {self}");
                (StatusCode::GATEWAY_TIMEOUT, self.to_string()).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::envelope::ResourceKind;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    const CERT: &str = "-----BEGIN CERTIFICATE-----\nQUJDREVG\n-----END CERTIFICATE-----";

    fn envelope_with_pod_cert() -> ScrapeEnvelope {
        ScrapeEnvelope {
            pods: vec![serde_json::from_value(json!({
                "metadata": {"name": "web", "annotations": {"ca": CERT}}
            }))
            .unwrap()],
            ..ScrapeEnvelope::default()
        }
    }

    #[test]
    fn test_render_plain() {
        let response = render(&envelope_with_pod_cert(), false).unwrap();
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["pods"][0]["metadata"]["annotations"]["ca"], CERT);
        assert_eq!(response.deep_certificates_redacted, 0);
        for kind in ResourceKind::ALL {
            assert!(body[kind.field_name()].is_array());
        }
    }

    #[test]
    fn test_render_deep_redaction() {
        let response = render(&envelope_with_pod_cert(), true).unwrap();
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(
            body["pods"][0]["metadata"]["annotations"]["ca"],
            "__CERTIFICATE REDACTED__"
        );
        assert_eq!(response.deep_certificates_redacted, 1);
    }

    #[test]
    fn test_render_keeps_key_order_in_both_modes() {
        for deep in [false, true] {
            let response = render(&envelope_with_pod_cert(), deep).unwrap();
            let text = std::str::from_utf8(response.body()).unwrap();
            let positions: Vec<usize> = ResourceKind::ALL
                .iter()
                .map(|kind| text.find(&format!("\"{}\":", kind.field_name())).unwrap())
                .collect();
            assert!(
                positions.windows(2).all(|pair| pair[0] < pair[1]),
                "keys out of order with deep={deep}: {text}"
            );
        }
    }

    #[test]
    fn test_response_headers() {
        let response = ScrapeResponse {
            body: b"{}".to_vec(),
            deep_certificates_redacted: 0,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[test]
    fn test_error_status_codes() {
        let upstream = ScrapeError::Upstream {
            kind: ResourceKind::Secret,
            source: anyhow::anyhow!("secrets is forbidden"),
        };
        assert_eq!(
            upstream.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let timeout = ScrapeError::Timeout(std::time::Duration::from_secs(1));
        assert_eq!(timeout.into_response().status(), StatusCode::GATEWAY_TIMEOUT);
    }

    struct ErrorEvents(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for ErrorEvents {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn error_events_while(f: impl FnOnce()) -> usize {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(ErrorEvents(Arc::clone(&count)));
        tracing::subscriber::with_default(subscriber, f);
        count.load(Ordering::SeqCst)
    }

    #[test]
    fn test_upstream_error_response_does_not_log_again() {
        let upstream = ScrapeError::Upstream {
            kind: ResourceKind::Pod,
            source: anyhow::anyhow!("connection refused"),
        };
        assert_eq!(error_events_while(|| drop(upstream.into_response())), 0);

        let timeout = ScrapeError::Timeout(std::time::Duration::from_secs(1));
        assert_eq!(error_events_while(|| drop(timeout.into_response())), 1);
    }
}
