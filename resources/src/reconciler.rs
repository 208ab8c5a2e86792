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

use std::fmt;

use kube::ResourceExt;
use opm_common::config::Environment;
use opm_common::settings::Settings;
use tracing::{debug, error, info, warn};

use super::error::{Error, Result};
use super::store::{Object, Store};
use super::{config_map, deployment, ingress, secret, service};

/// Attempts made for one resource before a version conflict is reported.
pub const MAX_CONFLICT_RETRIES: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Service,
    Secret,
    ConfigMap,
    Deployment,
    Ingress,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
}

/// What happened to each derived resource of one [`Settings`].
///
/// Resources are applied in order and the first failure stops the
/// sequence, so kinds after a failure are absent from `applied`.
#[derive(Debug, Default)]
pub struct Report {
    pub applied: Vec<(ResourceKind, Outcome)>,
    pub failure: Option<(ResourceKind, Error)>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.applied.iter().filter(|(_, o)| *o == outcome).count()
    }

    fn record(&mut self, kind: ResourceKind, result: Result<Outcome>) -> bool {
        match result {
            Ok(outcome) => {
                self.applied.push((kind, outcome));
                true
            }
            Err(err) => {
                self.failure = Some((kind, err));
                false
            }
        }
    }
}

/// Drives the derived resources of an oauth2-proxy instance towards the
/// shape described by its [`Settings`].
pub struct Reconciler<S> {
    store: S,
    env: Environment,
}

impl<S: Store> Reconciler<S> {
    pub fn new(store: S, env: Environment) -> Self {
        Reconciler { store, env }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create or update the service, secret, configmap, deployment and the
    /// shared ingress, in that order.
    pub async fn apply(&self, settings: &Settings) -> Report {
        info!("Applying oauth2-proxy ({})...", settings);
        let mut report = Report::default();
        self.apply_in_order(settings, &mut report).await;

        match &report.failure {
            None => info!("Applied oauth2-proxy ({})", settings),
            Some((kind, err)) => error!("Failed to apply {} of oauth2-proxy ({}): {}", kind, settings, err),
        }

        report
    }

    /// Returns at the first failed kind, leaving the rest untouched.
    async fn apply_in_order(&self, settings: &Settings, report: &mut Report) {
        let env = &self.env;

        if !report.record(ResourceKind::Service, self.ensure(service::new(settings, env), service::merge).await) {
            return;
        }
        if !report.record(ResourceKind::Secret, self.ensure(secret::new(settings, env), replace).await) {
            return;
        }
        if !report.record(ResourceKind::ConfigMap, self.ensure(config_map::new(settings, env), replace).await) {
            return;
        }
        if !report.record(ResourceKind::Deployment, self.ensure(deployment::new(settings, env), replace).await) {
            return;
        }
        report.record(ResourceKind::Ingress, self.ensure(ingress::new(settings, env), ingress::merge).await);
    }

    /// Derived resources are left in place when their ingress goes away.
    // TODO: delete the derived resources once ownership of the shared ingress path is tracked.
    pub async fn remove(&self, settings: &Settings) {
        info!("Delete oauth2-proxy ({}): derived resources are kept", settings);
    }

    /// Create the resource when it is missing, otherwise merge the existing
    /// object into the desired one and replace it. Version conflicts re-run
    /// the whole get-merge-write cycle.
    async fn ensure<K, F>(&self, desired: K, merge: F) -> Result<Outcome>
    where
        K: Object,
        F: Fn(&K, K) -> K,
    {
        let namespace = &self.env.namespace;
        let kind = K::kind(&());
        let name = desired.name_any();

        let mut attempt = 1;
        loop {
            let result = match self.store.get::<K>(namespace, &name).await? {
                None => {
                    info!("Creating {} {}...", kind, name);
                    self.store.create(namespace, &desired).await.map(|_| Outcome::Created)
                }
                Some(existing) => {
                    debug!("The {} {} already exists", kind, name);
                    let resource = merge(&existing, desired.clone());
                    info!("Updating {} {}...", kind, name);
                    self.store.replace(namespace, &name, &resource).await.map(|_| Outcome::Updated)
                }
            };

            match result {
                Err(Error::Conflict { .. }) if attempt < MAX_CONFLICT_RETRIES => {
                    warn!("Conflict on {} {} (attempt {}), retrying", kind, name, attempt);
                    attempt += 1;
                }
                Ok(outcome) => {
                    info!("{:?} {} {}", outcome, kind, name);
                    return Ok(outcome);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Resources without server-managed fields are replaced wholesale.
fn replace<K>(_existing: &K, desired: K) -> K {
    desired
}
