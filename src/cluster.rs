//! # Cluster Access
//!
//! Read-only view of the Kubernetes API used by the scrape pipeline.
//!
//! The pipeline only ever needs "list every object of kind K", either inside
//! a namespace selector or cluster-wide. [`ClusterReader`] captures exactly
//! that so the pipeline can run against a live [`kube::Client`] or a fixture.

use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};
use kube::{api::ListParams, Api, Client, Resource};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::debug;

use crate::constants::WILDCARD_NAMESPACE;

/// Which namespaces a scrape covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceSelector {
    /// Every namespace in the cluster
    All,
    /// A single named namespace
    Namespace(String),
}

impl NamespaceSelector {
    /// `*` and the empty string select every namespace
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == WILDCARD_NAMESPACE {
            Self::All
        } else {
            Self::Namespace(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => WILDCARD_NAMESPACE,
            Self::Namespace(name) => name,
        }
    }
}

impl fmt::Display for NamespaceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A built-in kind that lives inside a namespace
pub trait NamespacedObject:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + DeserializeOwned
    + fmt::Debug
    + Send
    + Sync
    + 'static
{
}

impl<K> NamespacedObject for K where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + DeserializeOwned
        + fmt::Debug
        + Send
        + Sync
        + 'static
{
}

/// A built-in kind with no namespace (PersistentVolume, Namespace, ...)
pub trait ClusterObject:
    Resource<DynamicType = (), Scope = ClusterResourceScope>
    + Clone
    + DeserializeOwned
    + fmt::Debug
    + Send
    + Sync
    + 'static
{
}

impl<K> ClusterObject for K where
    K: Resource<DynamicType = (), Scope = ClusterResourceScope>
        + Clone
        + DeserializeOwned
        + fmt::Debug
        + Send
        + Sync
        + 'static
{
}

/// Read interface to the cluster API
///
/// Implementations return items in the order the API returned them.
#[async_trait]
pub trait ClusterReader: Send + Sync {
    /// List every object of kind `K` matching the namespace selector
    async fn list_namespaced<K: NamespacedObject>(
        &self,
        selector: &NamespaceSelector,
    ) -> Result<Vec<K>>;

    /// List every object of a cluster-scoped kind `K`
    async fn list_cluster<K: ClusterObject>(&self) -> Result<Vec<K>>;
}

/// [`ClusterReader`] backed by a live Kubernetes client
#[derive(Clone)]
pub struct KubeReader {
    client: Client,
}

impl fmt::Debug for KubeReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeReader").finish_non_exhaustive()
    }
}

impl KubeReader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a reader from the in-cluster service account or the local kubeconfig
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl ClusterReader for KubeReader {
    async fn list_namespaced<K: NamespacedObject>(
        &self,
        selector: &NamespaceSelector,
    ) -> Result<Vec<K>> {
        let api: Api<K> = match selector {
            NamespaceSelector::All => Api::all(self.client.clone()),
            NamespaceSelector::Namespace(ns) => Api::namespaced(self.client.clone(), ns),
        };
        let list = api.list(&ListParams::default()).await?;
        debug!(
            kind = %K::plural(&()),
            namespace = %selector,
            count = list.items.len(),
            "Listed objects"
        );
        Ok(list.items)
    }

    async fn list_cluster<K: ClusterObject>(&self) -> Result<Vec<K>> {
        let api: Api<K> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await?;
        debug!(kind = %K::plural(&()), count = list.items.len(), "Listed objects");
        Ok(list.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_wildcard() {
        assert_eq!(NamespaceSelector::parse("*"), NamespaceSelector::All);
        assert_eq!(NamespaceSelector::parse(""), NamespaceSelector::All);
        assert_eq!(NamespaceSelector::parse("  "), NamespaceSelector::All);
    }

    #[test]
    fn test_selector_named() {
        let selector = NamespaceSelector::parse("default");
        assert_eq!(selector, NamespaceSelector::Namespace("default".to_string()));
        assert_eq!(selector.to_string(), "default");
        assert_eq!(NamespaceSelector::All.to_string(), "*");
    }
}
