//! # Status
//!
//! Build metadata fixed at compile time, plus the single health flag that
//! startup flips once the cluster client is available.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

/// Immutable facts about this binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMetadata {
    pub version: &'static str,
    pub build_info: &'static str,
    pub rust_version: &'static str,
}

pub const BUILD: BuildMetadata = BuildMetadata {
    version: env!("CARGO_PKG_VERSION"),
    build_info: env!("KUBEVIEW_BUILD_INFO"),
    rust_version: env!("KUBEVIEW_RUSTC_VERSION"),
};

/// Process health, written at startup and read from request handlers
#[derive(Debug, Default)]
pub struct HealthFlag(AtomicBool);

impl HealthFlag {
    pub fn new(healthy: bool) -> Self {
        Self(AtomicBool::new(healthy))
    }

    pub fn set(&self, healthy: bool) {
        self.0.store(healthy, Ordering::Release);
    }

    pub fn is_healthy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Body of `/api/status`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub healthy: bool,
    pub version: &'static str,
    pub build_info: &'static str,
    pub hostname: String,
    pub os: &'static str,
    pub architecture: &'static str,
    pub cpu_count: usize,
    pub rust_version: &'static str,
    pub client_address: String,
    pub server_host: String,
    pub started_at: DateTime<Utc>,
}

impl StatusReport {
    pub fn collect(
        healthy: bool,
        started_at: DateTime<Utc>,
        client_address: String,
        server_host: String,
    ) -> Self {
        Self {
            healthy,
            version: BUILD.version,
            build_info: BUILD.build_info,
            hostname: hostname(),
            os: std::env::consts::OS,
            architecture: std::env::consts::ARCH,
            cpu_count: std::thread::available_parallelism()
                .map_or(1, std::num::NonZeroUsize::get),
            rust_version: BUILD.rust_version,
            client_address,
            server_host,
            started_at,
        }
    }
}

// Kubernetes sets HOSTNAME to the pod name
fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "hostname not available".to_string())
}
