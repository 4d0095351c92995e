//! # Constants
//!
//! Shared constants used throughout kubeview.
//!
//! These values represent reasonable defaults and can be overridden via
//! environment variables where applicable (see [`crate::config`]).

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 8000;

/// Namespace scope meaning "every namespace in the cluster"
pub const WILDCARD_NAMESPACE: &str = "*";

/// Default upper bound for collecting a single scrape (seconds)
pub const DEFAULT_SCRAPE_TIMEOUT_SECS: u64 = 30;

/// Name prefix of Helm v3 release bookkeeping secrets, never shown
pub const RELEASE_SECRET_PREFIX: &str = "sh.helm.release";

/// Replaces every Secret `data` / `stringData` value
pub const VALUE_SENTINEL: &str = "__VALUE REDACTED__";

/// Replaces every PEM certificate block found in scanned text
pub const CERTIFICATE_SENTINEL: &str = "__CERTIFICATE REDACTED__";

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "kubeview=info,tower_http=info";
