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

use k8s_openapi::api::core::v1::Secret;
use kube::core::ObjectMeta;
use opm_common::config::Environment;
use opm_common::settings::Settings;

use super::{hash, labels};

pub const CLIENT_ID_KEY: &str = "client-id";
pub const CLIENT_SECRET_KEY: &str = "client-secret";

/// The cookie secret is derived from the settings and the configured salt,
/// so it stays the same across reconciles and restarts.
pub fn cookie_secret(settings: &Settings, env: &Environment) -> String {
    hash(format!(
        "{}{}{}{}{}",
        settings.provider,
        settings.organization,
        settings.teams.join(""),
        settings.app_name,
        env.cookie_salt
    ))
}

pub fn new(settings: &Settings, env: &Environment) -> Secret {
    let data = BTreeMap::from([
        (settings.cookie_secret_key(), cookie_secret(settings, env)),
        (CLIENT_SECRET_KEY.to_string(), env.client_secret.clone()),
        (CLIENT_ID_KEY.to_string(), env.client_id.clone()),
    ]);

    Secret {
        metadata: ObjectMeta {
            name: Some(settings.resource_name()),
            namespace: Some(env.namespace.clone()),
            labels: Some(labels(settings)),
            ..ObjectMeta::default()
        },
        type_: Some("Opaque".into()),
        string_data: Some(data),
        ..Secret::default()
    }
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
            cookie_salt: "salt".into(),
            client_id: "id".into(),
            client_secret: "secret".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_cookie_secret() {
        assert_eq!(cookie_secret(&settings(), &env()), hash("githubacmecoreopsfoosalt"));
        assert_eq!(cookie_secret(&settings(), &env()), cookie_secret(&settings(), &env()));

        let mut other = settings();
        other.teams = vec!["core".into()];
        assert_ne!(cookie_secret(&other, &env()), cookie_secret(&settings(), &env()));
    }

    #[test]
    fn test_new() {
        let secret = new(&settings(), &env());
        let data = secret.string_data.unwrap();

        assert_eq!(secret.metadata.name, Some("oauth2-proxy-github-acme-foo".into()));
        assert_eq!(secret.type_, Some("Opaque".into()));
        assert_eq!(data.len(), 3);
        assert_eq!(data.get("client-id"), Some(&"id".to_string()));
        assert_eq!(data.get("client-secret"), Some(&"secret".to_string()));
        assert_eq!(data.get("github-acme-foo-cookie-secret"), Some(&hash("githubacmecoreopsfoosalt")));
    }
}
