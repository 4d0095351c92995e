//! # Server Configuration
//!
//! Process-level settings loaded from environment variables.

use std::time::Duration;

/// Server configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// HTTP listen port
    pub port: u16,
    /// Namespace the deployment is restricted to, or `*` for the whole cluster.
    /// Reported to the frontend through `/api/config`
    pub namespace_scope: String,
    /// Upper bound for collecting one scrape (seconds)
    pub scrape_timeout_secs: u64,
    /// Also walk the whole serialized envelope for certificates,
    /// not only Secrets and ConfigMaps
    pub deep_certificate_redaction: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            port: DEFAULT_PORT,
            namespace_scope: WILDCARD_NAMESPACE.to_string(),
            scrape_timeout_secs: DEFAULT_SCRAPE_TIMEOUT_SECS,
            deep_certificate_redaction: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            port: env_var_or_default("PORT", DEFAULT_PORT),
            namespace_scope: env_var_or_default_str("NAMESPACE_SCOPE", WILDCARD_NAMESPACE),
            scrape_timeout_secs: env_var_or_default(
                "SCRAPE_TIMEOUT_SECS",
                DEFAULT_SCRAPE_TIMEOUT_SECS,
            ),
            deep_certificate_redaction: env_var_or_default_bool(
                "DEEP_CERTIFICATE_REDACTION",
                false,
            ),
        }
    }

    /// Get scrape timeout duration
    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_secs)
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as boolean or return default
fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map_or(default, |v| parse_bool(&v))
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
