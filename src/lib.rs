//! # kubeview
//!
//! Read-only visualization backend for Kubernetes.
//!
//! Every request lists a fixed set of resource kinds in one namespace (or all
//! of them), strips secret material and embedded certificates, and returns a
//! single JSON snapshot for the graph renderer.
//!
//! ```text
//! Collector ──▶ Sanitizer ──▶ Aggregator ──▶ response
//! ```
//!
//! Nothing is cached between requests.

pub mod cluster;
pub mod config;
pub mod constants;
pub mod observability;
pub mod scrape;
pub mod server;
pub mod status;
