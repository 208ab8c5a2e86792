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

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::core::ObjectMeta;
use kube::ResourceExt;
use opm_common::config::Environment;
use opm_common::settings::Settings;
use tracing::debug;

use super::{labels, selector};

pub fn new(settings: &Settings, env: &Environment) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(settings.resource_name()),
            namespace: Some(env.namespace.clone()),
            labels: Some(labels(settings)),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("NodePort".into()),
            ports: Some(vec![ServicePort {
                name: Some("http".into()),
                port: 80,
                protocol: Some("TCP".into()),
                target_port: Some(IntOrString::String("http".into())),
                ..Default::default()
            }]),
            selector: Some(selector(settings)),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Carry the fields allocated by the API server over to the desired service.
///
/// The cluster address and resource version must survive the update, and
/// node ports are kept per port name so the exposed port does not move.
pub fn merge(existing: &Service, mut desired: Service) -> Service {
    debug!("Detected ResourceVersion: {:?}", existing.resource_version());
    desired.metadata.resource_version = existing.resource_version();

    let Some(current) = &existing.spec else {
        return desired;
    };
    let spec = desired.spec.get_or_insert_with(Default::default);

    debug!("Detected ClusterIP: {:?}", current.cluster_ip);
    spec.cluster_ip = current.cluster_ip.clone();
    spec.cluster_ips = current.cluster_ips.clone();

    if let (Some(ports), Some(allocated)) = (spec.ports.as_mut(), current.ports.as_ref()) {
        for port in ports.iter_mut() {
            port.node_port = allocated.iter().find(|p| p.name == port.name).and_then(|p| p.node_port);
        }
    }

    desired
}
