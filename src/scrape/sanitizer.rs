//! # Sanitizer
//!
//! Redaction applied to a collected [`ScrapeEnvelope`] before it leaves the process.
//!
//! - Helm release bookkeeping secrets are dropped entirely
//! - Every Secret `data` / `stringData` value is replaced with [`VALUE_SENTINEL`]
//! - PEM certificate blocks in Secret annotations and ConfigMap `data` /
//!   `binaryData` are replaced with [`CERTIFICATE_SENTINEL`]; surrounding text
//!   is kept verbatim
//!
//! Sentinels never match the certificate pattern or the release prefix, so
//! sanitizing twice yields the same output.

use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::ByteString;
use regex::{bytes, Regex};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::LazyLock;

use super::envelope::ScrapeEnvelope;
use crate::constants::{CERTIFICATE_SENTINEL, RELEASE_SECRET_PREFIX, VALUE_SENTINEL};

// BEGIN delimiter, a dash-free body, END delimiter. Any case, five or more dashes.
// The body cannot cross another delimiter, so a BEGIN without END never
// swallows text up to a later block.
const CERTIFICATE_PATTERN_SOURCE: &str =
    r"-{5,}[ \t]*BEGIN\s+CERTIFICATE[ \t]*-{5,}[^-]+-{5,}[ \t]*END\s+CERTIFICATE[ \t]*-{5,}";

static CERTIFICATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i){CERTIFICATE_PATTERN_SOURCE}"))
        .expect("Failed to compile CERTIFICATE_PATTERN - this should never happen")
});

// Byte variant runs without Unicode so the body also matches non-UTF-8 bytes
static CERTIFICATE_PATTERN_BYTES: LazyLock<bytes::Regex> = LazyLock::new(|| {
    bytes::Regex::new(&format!("(?i-u){CERTIFICATE_PATTERN_SOURCE}"))
        .expect("Failed to compile CERTIFICATE_PATTERN_BYTES - this should never happen")
});

/// What a sanitize pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    /// Release bookkeeping secrets removed from the envelope
    pub secrets_filtered: usize,
    /// Secret values replaced wholesale
    pub values_redacted: usize,
    /// Certificate blocks replaced inside annotations and ConfigMaps
    pub certificates_redacted: usize,
}

/// Sanitize every Secret and ConfigMap in the envelope, in place
pub fn sanitize(envelope: &mut ScrapeEnvelope) -> SanitizeReport {
    let mut report = SanitizeReport {
        secrets_filtered: filter_release_secrets(&mut envelope.secrets),
        ..SanitizeReport::default()
    };

    for secret in &mut envelope.secrets {
        redact_secret(secret, &mut report);
    }
    for config_map in &mut envelope.configmaps {
        redact_config_map(config_map, &mut report);
    }

    report
}

/// True for secrets written by Helm to track releases
pub fn is_release_secret(secret: &Secret) -> bool {
    secret
        .metadata
        .name
        .as_deref()
        .is_some_and(|name| name.starts_with(RELEASE_SECRET_PREFIX))
}

/// Remove release secrets, keeping the order of the rest. Returns how many were removed.
pub fn filter_release_secrets(secrets: &mut Vec<Secret>) -> usize {
    let before = secrets.len();
    secrets.retain(|secret| !is_release_secret(secret));
    before - secrets.len()
}

/// Replace every data value with the value sentinel and strip certificates from annotations
pub fn redact_secret(secret: &mut Secret, report: &mut SanitizeReport) {
    if let Some(data) = secret.data.as_mut() {
        for value in data.values_mut() {
            *value = ByteString(VALUE_SENTINEL.as_bytes().to_vec());
            report.values_redacted += 1;
        }
    }

    if let Some(string_data) = secret.string_data.as_mut() {
        for value in string_data.values_mut() {
            VALUE_SENTINEL.clone_into(value);
            report.values_redacted += 1;
        }
    }

    // last-applied-configuration included; only the certificate text is touched
    if let Some(annotations) = secret.metadata.annotations.as_mut() {
        for value in annotations.values_mut() {
            report.certificates_redacted += redact_string_in_place(value);
        }
    }
}

/// Strip certificates from ConfigMap string and binary data
pub fn redact_config_map(config_map: &mut ConfigMap, report: &mut SanitizeReport) {
    if let Some(data) = config_map.data.as_mut() {
        for value in data.values_mut() {
            report.certificates_redacted += redact_string_in_place(value);
        }
    }

    if let Some(binary_data) = config_map.binary_data.as_mut() {
        for value in binary_data.values_mut() {
            report.certificates_redacted += redact_bytes_in_place(&mut value.0);
        }
    }
}

/// Replace each PEM certificate block in `text` with the certificate sentinel
pub fn redact_certificates(text: &str) -> Cow<'_, str> {
    CERTIFICATE_PATTERN.replace_all(text, CERTIFICATE_SENTINEL)
}

/// Byte-level [`redact_certificates`], for data that need not be UTF-8
pub fn redact_certificate_bytes(data: &[u8]) -> Cow<'_, [u8]> {
    CERTIFICATE_PATTERN_BYTES.replace_all(data, CERTIFICATE_SENTINEL.as_bytes())
}

/// Walk a JSON tree and redact certificates in every string leaf.
/// Returns the number of certificate blocks replaced.
pub fn redact_certificates_in_value(value: &mut Value) -> usize {
    match value {
        Value::Object(map) => map.values_mut().map(redact_certificates_in_value).sum(),
        Value::Array(items) => items.iter_mut().map(redact_certificates_in_value).sum(),
        Value::String(text) => redact_string_in_place(text),
        Value::Null | Value::Bool(_) | Value::Number(_) => 0,
    }
}

fn redact_string_in_place(value: &mut String) -> usize {
    let found = CERTIFICATE_PATTERN.find_iter(value.as_str()).count();
    if found > 0 {
        *value = redact_certificates(value.as_str()).into_owned();
    }
    found
}

fn redact_bytes_in_place(value: &mut Vec<u8>) -> usize {
    let found = CERTIFICATE_PATTERN_BYTES.find_iter(value.as_slice()).count();
    if found > 0 {
        *value = redact_certificate_bytes(value.as_slice()).into_owned();
    }
    found
}
