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

use k8s_openapi::api::networking::v1::Ingress;
use kube::ResourceExt;
use opm_common::annotations::{self, ValidationError};
use opm_common::settings::Settings;
use opm_resources::reconciler::{Outcome, Reconciler, ResourceKind};
use opm_resources::store::Store;
use tracing::{debug, info};

use crate::errors::{Error, Result};

/// A change of an ingress, as seen by the manager.
#[derive(Clone, Debug)]
pub enum IngressEvent {
    Added(Ingress),
    Updated(Ingress),
    Deleted(Ingress),
}

impl IngressEvent {
    pub fn ingress(&self) -> &Ingress {
        match self {
            IngressEvent::Added(ingress) | IngressEvent::Updated(ingress) | IngressEvent::Deleted(ingress) => ingress,
        }
    }
}

/// What the dispatcher did with an event.
#[derive(Debug)]
pub enum Dispatched {
    /// The ingress does not carry the oauth2-proxy annotations.
    Skipped(ValidationError),
    Applied(Vec<(ResourceKind, Outcome)>),
    /// The ingress was deleted; its derived resources are kept.
    Removed(Settings),
}

/// Handle a single ingress event: decode its annotations, then apply or
/// remove the oauth2-proxy they describe.
pub async fn dispatch<S: Store>(reconciler: &Reconciler<S>, event: &IngressEvent) -> Result<Dispatched> {
    let ingress = event.ingress();
    let key = format!("{}/{}", ingress.namespace().unwrap_or_default(), ingress.name_any());

    match event {
        IngressEvent::Added(_) => info!("Added Ingress {}", key),
        IngressEvent::Updated(_) => info!("Updated Ingress {}", key),
        IngressEvent::Deleted(_) => info!("Deleted Ingress {}", key),
    }

    let settings = match annotations::decode(&ingress.metadata) {
        Ok(settings) => settings,
        Err(err) => {
            debug!("Skip Ingress {}: {}", key, err);
            return Ok(Dispatched::Skipped(err));
        }
    };

    if let IngressEvent::Deleted(_) = event {
        reconciler.remove(&settings).await;
        return Ok(Dispatched::Removed(settings));
    }

    let report = reconciler.apply(&settings).await;
    match report.failure {
        Some((kind, err)) => Err(Error::ApplyError(kind, err)),
        None => Ok(Dispatched::Applied(report.applied)),
    }
}
