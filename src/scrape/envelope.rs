//! # Envelope
//!
//! The per-request snapshot: one ordered list per [`ResourceKind`].

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::{
    ConfigMap, Endpoints, PersistentVolume, PersistentVolumeClaim, Pod, Secret, Service,
};
use k8s_openapi::api::networking::v1::Ingress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every resource kind the scrape covers, in envelope order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Pod,
    Service,
    Endpoints,
    PersistentVolume,
    PersistentVolumeClaim,
    Deployment,
    DaemonSet,
    ReplicaSet,
    StatefulSet,
    Ingress,
    ConfigMap,
    Secret,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 12] = [
        ResourceKind::Pod,
        ResourceKind::Service,
        ResourceKind::Endpoints,
        ResourceKind::PersistentVolume,
        ResourceKind::PersistentVolumeClaim,
        ResourceKind::Deployment,
        ResourceKind::DaemonSet,
        ResourceKind::ReplicaSet,
        ResourceKind::StatefulSet,
        ResourceKind::Ingress,
        ResourceKind::ConfigMap,
        ResourceKind::Secret,
    ];

    /// Envelope key, identical to the API's plural resource name
    #[must_use]
    pub fn field_name(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "pods",
            ResourceKind::Service => "services",
            ResourceKind::Endpoints => "endpoints",
            ResourceKind::PersistentVolume => "persistentvolumes",
            ResourceKind::PersistentVolumeClaim => "persistentvolumeclaims",
            ResourceKind::Deployment => "deployments",
            ResourceKind::DaemonSet => "daemonsets",
            ResourceKind::ReplicaSet => "replicasets",
            ResourceKind::StatefulSet => "statefulsets",
            ResourceKind::Ingress => "ingresses",
            ResourceKind::ConfigMap => "configmaps",
            ResourceKind::Secret => "secrets",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Aggregated scrape result returned to the frontend
///
/// Field order is the serialized key order. Lists are never skipped, so an
/// empty kind always serializes as `[]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeEnvelope {
    pub pods: Vec<Pod>,
    pub services: Vec<Service>,
    pub endpoints: Vec<Endpoints>,
    pub persistentvolumes: Vec<PersistentVolume>,
    pub persistentvolumeclaims: Vec<PersistentVolumeClaim>,
    pub deployments: Vec<Deployment>,
    pub daemonsets: Vec<DaemonSet>,
    pub replicasets: Vec<ReplicaSet>,
    pub statefulsets: Vec<StatefulSet>,
    pub ingresses: Vec<Ingress>,
    pub configmaps: Vec<ConfigMap>,
    pub secrets: Vec<Secret>,
}

impl ScrapeEnvelope {
    /// Number of objects held for one kind
    #[must_use]
    pub fn count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Pod => self.pods.len(),
            ResourceKind::Service => self.services.len(),
            ResourceKind::Endpoints => self.endpoints.len(),
            ResourceKind::PersistentVolume => self.persistentvolumes.len(),
            ResourceKind::PersistentVolumeClaim => self.persistentvolumeclaims.len(),
            ResourceKind::Deployment => self.deployments.len(),
            ResourceKind::DaemonSet => self.daemonsets.len(),
            ResourceKind::ReplicaSet => self.replicasets.len(),
            ResourceKind::StatefulSet => self.statefulsets.len(),
            ResourceKind::Ingress => self.ingresses.len(),
            ResourceKind::ConfigMap => self.configmaps.len(),
            ResourceKind::Secret => self.secrets.len(),
        }
    }

    #[must_use]
    pub fn total_objects(&self) -> usize {
        ResourceKind::ALL.iter().map(|kind| self.count(*kind)).sum()
    }
}
