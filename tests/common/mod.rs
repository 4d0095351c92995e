//! Common test utilities for scrape pipeline and route tests
//!
//! Provides [`FakeCluster`], an in-memory [`ClusterReader`] serving JSON
//! fixtures, with per-kind failure and hang injection.

#![allow(dead_code, reason = "each test binary uses a subset of the fixtures")]

use anyhow::{bail, Result};
use async_trait::async_trait;
use kubeview::cluster::{ClusterObject, ClusterReader, NamespaceSelector, NamespacedObject};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const CERT: &str = "-----BEGIN CERTIFICATE-----\n\
    MIIBszCCAVmgAwIBAgIUZXhhbXBsZS1jZXJ0aWZpY2F0ZQ==\n\
    c2Vjb25kLWxpbmUtb2YtY2VydGlmaWNhdGUtYm9keQ==\n\
    -----END CERTIFICATE-----";

/// Marker recorded when a hanging query is dropped before completing
struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeCluster {
    objects: HashMap<String, Vec<Value>>,
    failures: HashMap<String, String>,
    hangs: HashSet<String>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
    dropped: Arc<AtomicUsize>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `objects` for the plural resource name, in the given order
    pub fn with_objects(mut self, plural: &str, objects: Vec<Value>) -> Self {
        self.objects
            .entry(plural.to_string())
            .or_default()
            .extend(objects);
        self
    }

    /// Make every list of `plural` fail with `message`
    pub fn failing(mut self, plural: &str, message: &str) -> Self {
        self.failures.insert(plural.to_string(), message.to_string());
        self
    }

    /// Make every list of `plural` never complete
    pub fn hanging(mut self, plural: &str) -> Self {
        self.hangs.insert(plural.to_string());
        self
    }

    /// `(plural, namespace)` of every list call so far; cluster-scoped calls use `<cluster>`
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// How many hanging queries were cancelled by their caller
    pub fn dropped_queries(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    async fn serve<K: DeserializeOwned + Send>(
        &self,
        plural: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<K>> {
        self.calls.lock().unwrap().push((
            plural.to_string(),
            namespace.unwrap_or("<cluster>").to_string(),
        ));

        if self.hangs.contains(plural) {
            let _guard = DropCounter(Arc::clone(&self.dropped));
            std::future::pending::<()>().await;
        }
        // Let sibling queries start before failing
        tokio::task::yield_now().await;
        if let Some(message) = self.failures.get(plural) {
            bail!("{message}");
        }

        let objects = self.objects.get(plural).cloned().unwrap_or_default();
        objects
            .into_iter()
            .filter(|object| match namespace {
                None | Some("*") => true,
                Some(ns) => object["metadata"]["namespace"] == ns,
            })
            .map(|object| {
                serde_json::from_value::<K>(object).map_err(anyhow::Error::from)
            })
            .collect()
    }
}

#[async_trait]
impl ClusterReader for FakeCluster {
    async fn list_namespaced<K: NamespacedObject>(
        &self,
        selector: &NamespaceSelector,
    ) -> Result<Vec<K>> {
        self.serve(&K::plural(&()), Some(selector.as_str())).await
    }

    async fn list_cluster<K: ClusterObject>(&self) -> Result<Vec<K>> {
        self.serve(&K::plural(&()), None).await
    }
}

pub fn object(namespace: &str, name: &str) -> Value {
    json!({"metadata": {"name": name, "namespace": namespace}})
}

pub fn secret(namespace: &str, name: &str, data: Value) -> Value {
    json!({
        "metadata": {"name": name, "namespace": namespace},
        "type": "Opaque",
        "data": data
    })
}

pub fn config_map(namespace: &str, name: &str, data: Value) -> Value {
    json!({
        "metadata": {"name": name, "namespace": namespace},
        "data": data
    })
}

pub fn persistent_volume(name: &str) -> Value {
    json!({"metadata": {"name": name}, "spec": {"capacity": {"storage": "1Gi"}}})
}
