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

use std::collections::BTreeMap;

use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule, IngressServiceBackend,
    IngressSpec, IngressTLS, ServiceBackendPort,
};
use kube::core::ObjectMeta;
use kube::ResourceExt;
use opm_common::annotations::INGRESS_CLASS;
use opm_common::config::Environment;
use opm_common::settings::{Settings, RESOURCE_PREFIX};
use tracing::debug;

/// The single ingress shared by every oauth2-proxy instance.
pub const NAME: &str = RESOURCE_PREFIX;

/// Build the shared ingress holding only the path of the given settings.
pub fn new(settings: &Settings, env: &Environment) -> Ingress {
    let annotations = BTreeMap::from([(INGRESS_CLASS.to_string(), env.ingress.class.clone())]);

    let tls = env.ingress.tls().map(|(secret, hosts)| {
        vec![IngressTLS { hosts: Some(hosts.to_vec()), secret_name: Some(secret.to_string()) }]
    });

    Ingress {
        metadata: ObjectMeta {
            name: Some(NAME.into()),
            namespace: Some(env.namespace.clone()),
            annotations: Some(annotations),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                host: Some(env.domain.clone()),
                http: Some(HTTPIngressRuleValue { paths: vec![path(settings)] }),
            }]),
            tls,
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn path(settings: &Settings) -> HTTPIngressPath {
    HTTPIngressPath {
        path: Some(settings.path()),
        path_type: "ImplementationSpecific".into(),
        backend: IngressBackend {
            service: Some(IngressServiceBackend {
                name: settings.resource_name(),
                port: Some(ServiceBackendPort { number: Some(80), ..Default::default() }),
            }),
            ..Default::default()
        },
    }
}

/// Merge the paths of other instances into the desired ingress.
///
/// The desired ingress carries a single path. Paths of the existing ingress
/// keep their order; one with the same path string is replaced in place,
/// otherwise the new path is appended.
pub fn merge(existing: &Ingress, mut desired: Ingress) -> Ingress {
    desired.metadata.resource_version = existing.resource_version();

    let Some(http) = desired
        .spec
        .as_mut()
        .and_then(|spec| spec.rules.as_mut())
        .and_then(|rules| rules.first_mut())
        .and_then(|rule| rule.http.as_mut())
    else {
        return desired;
    };

    let mut paths = existing_paths(existing);
    for entry in std::mem::take(&mut http.paths) {
        match paths.iter_mut().find(|p| p.path == entry.path) {
            Some(current) => *current = entry,
            None => paths.push(entry),
        }
    }

    debug!("The merged paths of Ingress {}: {:?}", NAME, paths.iter().map(|p| &p.path).collect::<Vec<_>>());
    http.paths = paths;

    desired
}

fn existing_paths(existing: &Ingress) -> Vec<HTTPIngressPath> {
    existing
        .spec
        .as_ref()
        .and_then(|spec| spec.rules.as_ref())
        .and_then(|rules| rules.first())
        .and_then(|rule| rule.http.as_ref())
        .map(|http| http.paths.clone())
        .unwrap_or_default()
}

/// The paths served by the shared ingress, in order.
pub fn paths(ingress: &Ingress) -> Vec<String> {
    existing_paths(ingress).into_iter().filter_map(|p| p.path).collect()
}

#[cfg(test)]
mod tests {
    use opm_common::config::IngressOptions;

    use super::*;

    fn settings(app_name: &str) -> Settings {
        Settings { app_name: app_name.into(), organization: "acme".into(), ..Default::default() }
    }

    fn env() -> Environment {
        Environment { domain: "auth.example.com".into(), ..Default::default() }
    }

    fn backend(ingress: &Ingress, index: usize) -> String {
        let rule = &ingress.spec.as_ref().unwrap().rules.as_ref().unwrap()[0];
        let path = &rule.http.as_ref().unwrap().paths[index];
        path.backend.service.as_ref().unwrap().name.clone()
    }

    #[test]
    fn test_new() {
        let ingress = new(&settings("foo"), &env());

        assert_eq!(ingress.name_any(), "oauth2-proxy");
        assert_eq!(ingress.annotations().get(INGRESS_CLASS), Some(&"nginx".to_string()));
        assert_eq!(paths(&ingress), vec!["/github/foo"]);
        assert_eq!(backend(&ingress, 0), "oauth2-proxy-github-acme-foo");

        let spec = ingress.spec.unwrap();
        assert_eq!(spec.rules.unwrap()[0].host, Some("auth.example.com".into()));
        assert!(spec.tls.is_none());
    }

    #[test]
    fn test_new_with_tls() {
        let env = Environment {
            ingress: IngressOptions {
                class: "nginx-internal".into(),
                tls_secret_name: Some("wildcard".into()),
                tls_hosts: vec!["auth.example.com".into(), "login.example.com".into()],
            },
            ..env()
        };
        let ingress = new(&settings("foo"), &env);

        assert_eq!(ingress.annotations().get(INGRESS_CLASS), Some(&"nginx-internal".to_string()));
        let tls = &ingress.spec.unwrap().tls.unwrap()[0];
        assert_eq!(tls.secret_name, Some("wildcard".into()));
        assert_eq!(tls.hosts.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_merge_appends_new_path() {
        let mut existing = merge(&new(&settings("a"), &env()), new(&settings("b"), &env()));
        existing.metadata.resource_version = Some("7".into());

        let merged = merge(&existing, new(&settings("c"), &env()));

        assert_eq!(paths(&merged), vec!["/github/a", "/github/b", "/github/c"]);
        assert_eq!(merged.resource_version(), Some("7".into()));
    }

    #[test]
    fn test_merge_replaces_same_path() {
        let existing = merge(&new(&settings("a"), &env()), new(&settings("b"), &env()));

        let other = Settings { app_name: "a".into(), organization: "umbrella".into(), ..Default::default() };
        let merged = merge(&existing, new(&other, &env()));

        assert_eq!(paths(&merged), vec!["/github/a", "/github/b"]);
        assert_eq!(backend(&merged, 0), "oauth2-proxy-github-umbrella-a");
        assert_eq!(backend(&merged, 1), "oauth2-proxy-github-acme-b");
    }

    #[test]
    fn test_merge_into_empty_ingress() {
        let existing =
            Ingress { metadata: ObjectMeta { name: Some(NAME.into()), ..Default::default() }, ..Default::default() };

        let merged = merge(&existing, new(&settings("a"), &env()));
        assert_eq!(paths(&merged), vec!["/github/a"]);
    }
}
