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

use std::collections::HashSet;
use std::sync::Arc;

use futures::{StreamExt, TryStreamExt};
use k8s_openapi::api::networking::v1::Ingress;
use kube::runtime::reflector::ObjectRef;
use kube::runtime::{watcher, WatchStreamExt};
use kube::Api;
use tracing::{error, info, warn};

use crate::context::Context;
use crate::dispatcher::{self, IngressEvent};
use crate::errors::Error;

/// Watch ingresses in all namespaces and dispatch their changes one at a
/// time, in delivery order, until the stream ends.
pub async fn new(ctx: &Arc<Context>) {
    info!("Observing Ingress, oauth2-proxy resources go to namespace {}", ctx.config.namespace);

    let api = Api::<Ingress>::all(ctx.k8s.clone());
    let mut obs = watcher(api, watcher::Config::default()).default_backoff().boxed();
    let mut tracker = Tracker::default();

    loop {
        let event = obs.try_next().await.map_err(Error::ResolveIngressStreamFailed);

        match event {
            Ok(Some(event)) => {
                for event in tracker.track(event) {
                    if let Err(err) = dispatcher::dispatch(&ctx.reconciler, &event).await {
                        error!("Handle ingress failed (retryable: {}): {}", err.is_retryable(), err);
                    }
                }
            }
            Ok(None) => {
                warn!("The ingress stream ended");
                break;
            }
            Err(err) => {
                error!("{}", err);
                continue;
            }
        }
    }
}

/// Tells additions from updates, which the watcher reports alike.
#[derive(Default)]
pub struct Tracker {
    seen: HashSet<ObjectRef<Ingress>>,
}

impl Tracker {
    pub fn track(&mut self, event: watcher::Event<Ingress>) -> Vec<IngressEvent> {
        match event {
            watcher::Event::Applied(ingress) => vec![self.applied(ingress)],
            watcher::Event::Deleted(ingress) => {
                self.seen.remove(&ObjectRef::from_obj(&ingress));
                vec![IngressEvent::Deleted(ingress)]
            }
            watcher::Event::Restarted(ingresses) => {
                // Ingresses deleted while the watch was down are only forgotten.
                let current: HashSet<_> = ingresses.iter().map(ObjectRef::from_obj).collect();
                self.seen.retain(|key| current.contains(key));

                ingresses.into_iter().map(|ingress| self.applied(ingress)).collect()
            }
        }
    }

    fn applied(&mut self, ingress: Ingress) -> IngressEvent {
        if self.seen.insert(ObjectRef::from_obj(&ingress)) {
            IngressEvent::Added(ingress)
        } else {
            IngressEvent::Updated(ingress)
        }
    }
}

#[cfg(test)]
mod tests {
    use kube::core::ObjectMeta;

    use super::*;

    fn ingress(name: &str) -> Ingress {
        Ingress {
            metadata: ObjectMeta { name: Some(name.into()), namespace: Some("default".into()), ..Default::default() },
            ..Default::default()
        }
    }

    fn kinds(events: &[IngressEvent]) -> Vec<&'static str> {
        events
            .iter()
            .map(|event| match event {
                IngressEvent::Added(_) => "added",
                IngressEvent::Updated(_) => "updated",
                IngressEvent::Deleted(_) => "deleted",
            })
            .collect()
    }

    #[test]
    fn test_track_added_then_updated() {
        let mut tracker = Tracker::default();

        assert_eq!(kinds(&tracker.track(watcher::Event::Applied(ingress("a")))), vec!["added"]);
        assert_eq!(kinds(&tracker.track(watcher::Event::Applied(ingress("a")))), vec!["updated"]);
        assert_eq!(kinds(&tracker.track(watcher::Event::Applied(ingress("b")))), vec!["added"]);
    }

    #[test]
    fn test_track_deleted() {
        let mut tracker = Tracker::default();
        tracker.track(watcher::Event::Applied(ingress("a")));

        assert_eq!(kinds(&tracker.track(watcher::Event::Deleted(ingress("a")))), vec!["deleted"]);
        assert_eq!(kinds(&tracker.track(watcher::Event::Applied(ingress("a")))), vec!["added"]);
    }

    #[test]
    fn test_track_restarted() {
        let mut tracker = Tracker::default();
        tracker.track(watcher::Event::Applied(ingress("a")));
        tracker.track(watcher::Event::Applied(ingress("gone")));

        let events = tracker.track(watcher::Event::Restarted(vec![ingress("a"), ingress("b")]));
        assert_eq!(kinds(&events), vec!["updated", "added"]);

        // forgotten while the watch was down, so it shows up as new again
        assert_eq!(kinds(&tracker.track(watcher::Event::Applied(ingress("gone")))), vec!["added"]);
    }
}
