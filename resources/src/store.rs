// Copyright (c) The oauth2-proxy-manager Authors. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::api::PostParams;
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::error::{Error, Result};

/// A namespaced Kubernetes object the manager reads and writes.
pub trait Object:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<K> Object for K where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// The subset of the API server the reconciler relies on.
///
/// Every write carries the object's `resourceVersion` as-is, so a stale
/// version token surfaces as [`Error::Conflict`].
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch an object by name, `None` when it does not exist.
    async fn get<K: Object>(&self, namespace: &str, name: &str) -> Result<Option<K>>;

    async fn create<K: Object>(&self, namespace: &str, resource: &K) -> Result<K>;

    /// Replace the whole object, the equivalent of an HTTP `PUT`.
    async fn replace<K: Object>(&self, namespace: &str, name: &str, resource: &K) -> Result<K>;
}

/// Store backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        KubeStore { client }
    }
}

#[async_trait]
impl Store for KubeStore {
    async fn get<K: Object>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name).await.map_err(|e| Error::from_kube(&K::kind(&()), name, e))
    }

    async fn create<K: Object>(&self, namespace: &str, resource: &K) -> Result<K> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let name = resource.name_any();
        debug!("The creating {} resource:\n {:?}\n", K::kind(&()), resource);

        api.create(&PostParams::default(), resource)
            .await
            .map_err(|e| Error::from_kube(&K::kind(&()), &name, e))
    }

    async fn replace<K: Object>(&self, namespace: &str, name: &str, resource: &K) -> Result<K> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        debug!("The replacing {} resource:\n {:?}\n", K::kind(&()), resource);

        api.replace(name, &PostParams::default(), resource)
            .await
            .map_err(|e| Error::from_kube(&K::kind(&()), name, e))
    }
}
