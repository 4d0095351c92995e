//! # Collector
//!
//! Issues one list query per [`ResourceKind`] and assembles the raw envelope.
//!
//! All queries run concurrently. The first failure wins: the remaining
//! in-flight queries are dropped and the caller gets that single error. No
//! partial envelope is ever produced.

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::{
    ConfigMap, Endpoints, PersistentVolume, PersistentVolumeClaim, Pod, Secret, Service,
};
use k8s_openapi::api::networking::v1::Ingress;
use std::time::Instant;
use tracing::{debug, error};

use super::envelope::{ResourceKind, ScrapeEnvelope};
use super::error::ScrapeError;
use crate::cluster::{ClusterObject, ClusterReader, NamespaceSelector, NamespacedObject};
use crate::observability::metrics;

#[derive(Debug, Clone)]
pub struct Collector<R> {
    reader: R,
}

impl<R: ClusterReader> Collector<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// List every kind for the selector. PersistentVolumes are always cluster-wide.
    pub async fn collect(
        &self,
        selector: &NamespaceSelector,
    ) -> Result<ScrapeEnvelope, ScrapeError> {
        let (
            pods,
            services,
            endpoints,
            persistentvolumes,
            persistentvolumeclaims,
            deployments,
            daemonsets,
            replicasets,
            statefulsets,
            ingresses,
            configmaps,
            secrets,
        ) = futures::try_join!(
            self.namespaced::<Pod>(ResourceKind::Pod, selector),
            self.namespaced::<Service>(ResourceKind::Service, selector),
            self.namespaced::<Endpoints>(ResourceKind::Endpoints, selector),
            self.cluster::<PersistentVolume>(ResourceKind::PersistentVolume),
            self.namespaced::<PersistentVolumeClaim>(
                ResourceKind::PersistentVolumeClaim,
                selector,
            ),
            self.namespaced::<Deployment>(ResourceKind::Deployment, selector),
            self.namespaced::<DaemonSet>(ResourceKind::DaemonSet, selector),
            self.namespaced::<ReplicaSet>(ResourceKind::ReplicaSet, selector),
            self.namespaced::<StatefulSet>(ResourceKind::StatefulSet, selector),
            self.namespaced::<Ingress>(ResourceKind::Ingress, selector),
            self.namespaced::<ConfigMap>(ResourceKind::ConfigMap, selector),
            self.namespaced::<Secret>(ResourceKind::Secret, selector),
        )?;

        Ok(ScrapeEnvelope {
            pods,
            services,
            endpoints,
            persistentvolumes,
            persistentvolumeclaims,
            deployments,
            daemonsets,
            replicasets,
            statefulsets,
            ingresses,
            configmaps,
            secrets,
        })
    }

    async fn namespaced<K: NamespacedObject>(
        &self,
        kind: ResourceKind,
        selector: &NamespaceSelector,
    ) -> Result<Vec<K>, ScrapeError> {
        let start = Instant::now();
        let result = self.reader.list_namespaced::<K>(selector).await;
        finish(kind, selector, start, result)
    }

    async fn cluster<K: ClusterObject>(&self, kind: ResourceKind) -> Result<Vec<K>, ScrapeError> {
        let start = Instant::now();
        let result = self.reader.list_cluster::<K>().await;
        finish(kind, &NamespaceSelector::All, start, result)
    }
}

fn finish<K>(
    kind: ResourceKind,
    selector: &NamespaceSelector,
    start: Instant,
    result: anyhow::Result<Vec<K>>,
) -> Result<Vec<K>, ScrapeError> {
    match result {
        Ok(items) => {
            debug!(
                kind = %kind,
                namespace = %selector,
                count = items.len(),
                elapsed = ?start.elapsed(),
                "Collected objects"
            );
            Ok(items)
        }
        Err(source) => {
            error!(kind = %kind, namespace = %selector, "Kubernetes API list failed: {:#}", source);
            metrics::increment_upstream_errors(kind);
            Err(ScrapeError::Upstream { kind, source })
        }
    }
}
