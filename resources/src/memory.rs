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

//! An in-memory [`Store`] that mimics the parts of the API server the
//! reconciler depends on: resource versions, conflicts on stale versions,
//! and the allocated, immutable `clusterIP` of services.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::store::{Object, Store};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verb {
    Create,
    Replace,
}

/// A successful write, recorded in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    pub verb: Verb,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

type Key = (String, String, String);

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    objects: BTreeMap<Key, Value>,
    operations: Vec<Operation>,
    version: u64,
    addresses: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All writes performed so far.
    pub fn operations(&self) -> Vec<Operation> {
        self.lock().operations.clone()
    }

    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    /// Bump the resource version of an object as if another writer touched it.
    pub fn touch<K: Object>(&self, namespace: &str, name: &str) {
        let mut inner = self.lock();
        inner.version += 1;
        let version = inner.version.to_string();
        if let Some(value) = inner.objects.get_mut(&key::<K>(namespace, name)) {
            value["metadata"]["resourceVersion"] = Value::String(version);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn key<K: Object>(namespace: &str, name: &str) -> Key {
    (K::kind(&()).to_string(), namespace.to_string(), name.to_string())
}

fn to_value<K: Object>(resource: &K) -> Result<Value> {
    serde_json::to_value(resource).map_err(Error::SerializationError)
}

fn from_value<K: Object>(value: Value) -> Result<K> {
    serde_json::from_value(value).map_err(Error::SerializationError)
}

#[async_trait]
impl Store for MemoryStore {
    async fn get<K: Object>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        let value = self.lock().objects.get(&key::<K>(namespace, name)).cloned();
        value.map(from_value).transpose()
    }

    async fn create<K: Object>(&self, namespace: &str, resource: &K) -> Result<K> {
        let name = resource.name_any();
        let key = key::<K>(namespace, &name);
        let mut value = to_value(resource)?;

        let mut inner = self.lock();
        if inner.objects.contains_key(&key) {
            return Err(Error::Conflict { kind: key.0, name });
        }

        inner.version += 1;
        value["metadata"]["namespace"] = Value::String(namespace.into());
        value["metadata"]["resourceVersion"] = Value::String(inner.version.to_string());

        if key.0 == "Service" && value["spec"]["clusterIP"].is_null() {
            inner.addresses += 1;
            let address = format!("10.96.{}.{}", (inner.addresses >> 8) & 0xff, inner.addresses & 0xff);
            value["spec"]["clusterIP"] = Value::String(address.clone());
            value["spec"]["clusterIPs"] = Value::Array(vec![Value::String(address)]);
        }

        inner.objects.insert(key.clone(), value.clone());
        inner.operations.push(Operation { verb: Verb::Create, kind: key.0, namespace: key.1, name });

        from_value(value)
    }

    async fn replace<K: Object>(&self, namespace: &str, name: &str, resource: &K) -> Result<K> {
        let key = key::<K>(namespace, name);
        let mut value = to_value(resource)?;

        let mut inner = self.lock();
        let Some(current) = inner.objects.get(&key) else {
            return Err(Error::NotFound { kind: key.0, name: name.into() });
        };

        let expected = &current["metadata"]["resourceVersion"];
        match &value["metadata"]["resourceVersion"] {
            Value::Null if key.0 == "Service" => {
                return Err(Error::Invalid {
                    kind: key.0,
                    name: name.into(),
                    reason: "metadata.resourceVersion: must be specified for an update".into(),
                });
            }
            Value::Null => {}
            version if version != expected => {
                return Err(Error::Conflict { kind: key.0, name: name.into() });
            }
            _ => {}
        }

        if key.0 == "Service" && value["spec"]["clusterIP"] != current["spec"]["clusterIP"] {
            return Err(Error::Invalid {
                kind: key.0,
                name: name.into(),
                reason: "spec.clusterIP: field is immutable".into(),
            });
        }

        inner.version += 1;
        value["metadata"]["namespace"] = Value::String(namespace.into());
        value["metadata"]["resourceVersion"] = Value::String(inner.version.to_string());

        inner.objects.insert(key.clone(), value.clone());
        inner.operations.push(Operation { verb: Verb::Replace, kind: key.0, namespace: key.1, name: name.into() });

        from_value(value)
    }
}
