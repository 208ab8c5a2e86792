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

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, ContainerPort, EnvVar, EnvVarSource, HTTPGetAction, PodSpec,
    PodTemplateSpec, Probe, SecretKeySelector, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::core::ObjectMeta;
use opm_common::config::Environment;
use opm_common::settings::Settings;

use super::secret::{CLIENT_ID_KEY, CLIENT_SECRET_KEY};
use super::{args, config_map, labels, selector};

const CONTAINER_NAME: &str = "oauth2-proxy";
const CONTAINER_PORT: i32 = 4180;
const CONFIG_VOLUME: &str = "configmain";
const CONFIG_DIR: &str = "/etc/oauth2_proxy";
const HEALTH_PATH: &str = "/ping";

pub fn new(settings: &Settings, env: &Environment) -> Deployment {
    let name = settings.resource_name();

    let metadata = ObjectMeta {
        name: Some(name.clone()),
        namespace: Some(env.namespace.clone()),
        labels: Some(labels(settings)),
        ..Default::default()
    };

    let pod = PodSpec {
        containers: vec![container(settings, env)],
        volumes: Some(vec![Volume {
            name: CONFIG_VOLUME.into(),
            config_map: Some(ConfigMapVolumeSource {
                default_mode: Some(420),
                name: Some(name),
                ..Default::default()
            }),
            ..Default::default()
        }]),
        ..Default::default()
    };

    let spec = DeploymentSpec {
        replicas: Some(1),
        selector: LabelSelector { match_labels: Some(selector(settings)), ..Default::default() },
        template: PodTemplateSpec {
            metadata: Some(ObjectMeta { labels: Some(labels(settings)), ..Default::default() }),
            spec: Some(pod),
        },
        ..Default::default()
    };

    Deployment { metadata, spec: Some(spec), ..Default::default() }
}

/// Build and return the oauth2-proxy container, configured through flags and
/// with credentials injected from the generated secret.
fn container(settings: &Settings, env: &Environment) -> Container {
    let cookie_name = settings.cookie_name();
    let teams = settings.teams.join(",");
    let provider = env.provider.to_string();
    let prefix = settings.path();
    let redirect_url = format!("https://{}{}/callback", env.domain, prefix);
    let config = format!("{}/{}", CONFIG_DIR, config_map::CONFIG_FILE);

    let arguments = args(
        &[
            ("http-address", "0.0.0.0:4180"),
            ("cookie-domain", env.cookie_domain.as_str()),
            ("cookie-name", cookie_name.as_str()),
            ("email-domain", "*"),
            ("github-org", settings.organization.as_str()),
            ("github-team", teams.as_str()),
            ("provider", provider.as_str()),
            ("proxy-prefix", prefix.as_str()),
            ("redirect-url", redirect_url.as_str()),
            ("upstream", "file:///dev/null"),
            ("whitelist-domain", env.whitelist_domain.as_str()),
            ("config", config.as_str()),
        ],
        2,
    );

    let secret = settings.resource_name();
    let environments = vec![
        secret_env("OAUTH2_PROXY_CLIENT_ID", &secret, CLIENT_ID_KEY),
        secret_env("OAUTH2_PROXY_CLIENT_SECRET", &secret, CLIENT_SECRET_KEY),
        secret_env("OAUTH2_PROXY_COOKIE_SECRET", &secret, &settings.cookie_secret_key()),
    ];

    Container {
        name: CONTAINER_NAME.into(),
        image: Some(env.image.clone()),
        args: Some(arguments),
        env: Some(environments),
        ports: Some(vec![ContainerPort {
            name: Some("http".into()),
            protocol: Some("TCP".into()),
            container_port: CONTAINER_PORT,
            ..Default::default()
        }]),
        liveness_probe: Some(Probe {
            initial_delay_seconds: Some(0),
            timeout_seconds: Some(1),
            http_get: Some(health_check()),
            ..Default::default()
        }),
        readiness_probe: Some(Probe {
            initial_delay_seconds: Some(0),
            timeout_seconds: Some(1),
            success_threshold: Some(1),
            period_seconds: Some(10),
            http_get: Some(health_check()),
            ..Default::default()
        }),
        volume_mounts: Some(vec![VolumeMount {
            name: CONFIG_VOLUME.into(),
            mount_path: CONFIG_DIR.into(),
            ..Default::default()
        }]),
        ..Default::default()
    }
}

fn secret_env(name: &str, secret: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.into(),
        value: None,
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: Some(secret.into()),
                key: key.into(),
                ..Default::default()
            }),
            ..Default::default()
        }),
    }
}

fn health_check() -> HTTPGetAction {
    HTTPGetAction { path: Some(HEALTH_PATH.into()), port: IntOrString::String("http".into()), ..Default::default() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            app_name: "foo".into(),
            organization: "acme".into(),
            teams: vec!["core".into(), "ops".into()],
            ..Default::default()
        }
    }

    fn env() -> Environment {
        Environment {
            domain: "auth.example.com".into(),
            cookie_domain: ".example.com".into(),
            whitelist_domain: ".example.com".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_container_args() {
        let container = container(&settings(), &env());

        assert_eq!(container.name, "oauth2-proxy");
        assert_eq!(container.image, Some("quay.io/pusher/oauth2_proxy:v3.2.0".into()));
        assert_eq!(
            container.args,
            Some(vec![
                "--http-address=0.0.0.0:4180".into(),
                "--cookie-domain=.example.com".into(),
                "--cookie-name=_github_acme_foo_oauth2_proxy".into(),
                "--email-domain=*".into(),
                "--github-org=acme".into(),
                "--github-team=core,ops".into(),
                "--provider=github".into(),
                "--proxy-prefix=/github/foo".into(),
                "--redirect-url=https://auth.example.com/github/foo/callback".into(),
                "--upstream=file:///dev/null".into(),
                "--whitelist-domain=.example.com".into(),
                "--config=/etc/oauth2_proxy/oauth2_proxy.cfg".into(),
            ])
        );
    }

    #[test]
    fn test_container_env_comes_from_secret() {
        let container = container(&settings(), &env());
        let environments = container.env.unwrap();

        assert_eq!(environments.len(), 3);
        for env in &environments {
            assert!(env.value.is_none());
            let selector = env.value_from.as_ref().unwrap().secret_key_ref.as_ref().unwrap();
            assert_eq!(selector.name, Some("oauth2-proxy-github-acme-foo".into()));
        }
        assert_eq!(
            environments[2].value_from.as_ref().unwrap().secret_key_ref.as_ref().unwrap().key,
            "github-acme-foo-cookie-secret"
        );
    }

    #[test]
    fn test_container_probes() {
        let container = container(&settings(), &env());

        for probe in [container.liveness_probe.unwrap(), container.readiness_probe.unwrap()] {
            assert_eq!(probe.http_get.unwrap().path, Some("/ping".into()));
        }
    }

    #[test]
    fn test_new() {
        let deployment = new(&settings(), &env());
        let spec = deployment.spec.unwrap();
        let pod = spec.template.spec.unwrap();

        assert_eq!(deployment.metadata.name, Some("oauth2-proxy-github-acme-foo".into()));
        assert_eq!(spec.replicas, Some(1));
        assert_eq!(spec.selector.match_labels, Some(selector(&settings())));
        assert_eq!(spec.template.metadata.unwrap().labels, Some(labels(&settings())));

        let volume = &pod.volumes.unwrap()[0];
        let source = volume.config_map.as_ref().unwrap();
        assert_eq!(source.name, Some("oauth2-proxy-github-acme-foo".into()));
        assert_eq!(source.default_mode, Some(420));
    }
}
