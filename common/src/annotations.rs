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

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use thiserror::Error;
use tracing::debug;

use crate::settings::{Provider, Settings};

pub const INGRESS_CLASS: &str = "kubernetes.io/ingress.class";
pub const AUTH_URL: &str = "nginx.ingress.kubernetes.io/auth-url";
pub const AUTH_SIGNIN: &str = "nginx.ingress.kubernetes.io/auth-signin";
pub const APP_NAME: &str = "oauth2-proxy-manager.k8s.io/app-name";
pub const GITHUB_ORG: &str = "oauth2-proxy-manager.k8s.io/github-org";
pub const GITHUB_TEAMS: &str = "oauth2-proxy-manager.k8s.io/github-teams";

/// Only ingresses of this class are managed.
pub const MANAGED_CLASS: &str = "nginx";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ingress is not of the managed class")]
    NotManaged,

    #[error("missing annotation for {0}")]
    MissingField(&'static str),

    #[error("empty annotation for {0}")]
    EmptyField(&'static str),
}

/// Extract the proxy [`Settings`] from the annotations of an ingress.
///
/// Annotations are checked in a fixed order and the first failure is
/// returned. The teams annotation is split on `,` as-is, without trimming
/// or deduplication, and is the only one allowed to be empty.
pub fn decode(meta: &ObjectMeta) -> Result<Settings, ValidationError> {
    let empty = BTreeMap::new();
    let annotations = meta.annotations.as_ref().unwrap_or(&empty);

    match annotations.get(INGRESS_CLASS) {
        Some(class) if class == MANAGED_CLASS => {}
        _ => return Err(ValidationError::NotManaged),
    }

    let auth_url = required(annotations, AUTH_URL, "auth_url")?;
    let auth_signin = required(annotations, AUTH_SIGNIN, "auth_signin")?;
    let app_name = required(annotations, APP_NAME, "app_name")?;
    let organization = required(annotations, GITHUB_ORG, "organization")?;
    let teams = annotations.get(GITHUB_TEAMS).ok_or(ValidationError::MissingField("teams"))?;

    debug!(auth_url, auth_signin, app_name, organization, teams = teams.as_str(), "Decoded annotations");

    Ok(Settings {
        app_name: app_name.to_string(),
        auth_url: auth_url.to_string(),
        auth_signin: auth_signin.to_string(),
        provider: Provider::GitHub,
        organization: organization.to_string(),
        teams: teams.split(',').map(String::from).collect(),
    })
}

fn required<'a>(
    annotations: &'a BTreeMap<String, String>,
    key: &str,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match annotations.get(key) {
        None => Err(ValidationError::MissingField(field)),
        Some(value) if value.is_empty() => Err(ValidationError::EmptyField(field)),
        Some(value) => Ok(value.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotations() -> BTreeMap<String, String> {
        BTreeMap::from([
            (INGRESS_CLASS.into(), "nginx".into()),
            (AUTH_URL.into(), "https://x/auth".into()),
            (AUTH_SIGNIN.into(), "https://x/signin".into()),
            (APP_NAME.into(), "foo".into()),
            (GITHUB_ORG.into(), "acme".into()),
            (GITHUB_TEAMS.into(), "core".into()),
        ])
    }

    fn meta(annotations: BTreeMap<String, String>) -> ObjectMeta {
        ObjectMeta { name: Some("web".into()), annotations: Some(annotations), ..Default::default() }
    }

    fn without(key: &str) -> ObjectMeta {
        let mut annotations = annotations();
        annotations.remove(key);
        meta(annotations)
    }

    #[test]
    fn test_decode() {
        let settings = decode(&meta(annotations())).unwrap();

        assert_eq!(
            settings,
            Settings {
                app_name: "foo".into(),
                auth_url: "https://x/auth".into(),
                auth_signin: "https://x/signin".into(),
                provider: Provider::GitHub,
                organization: "acme".into(),
                teams: vec!["core".into()],
            }
        );
    }

    #[test]
    fn test_decode_is_deterministic() {
        let meta = meta(annotations());
        assert_eq!(decode(&meta), decode(&meta));
    }

    #[test]
    fn test_decode_without_annotations() {
        let meta = ObjectMeta { name: Some("web".into()), ..Default::default() };
        assert_eq!(decode(&meta), Err(ValidationError::NotManaged));
    }

    #[test]
    fn test_decode_missing_class() {
        assert_eq!(decode(&without(INGRESS_CLASS)), Err(ValidationError::NotManaged));
    }

    #[test]
    fn test_decode_other_class() {
        let mut annotations = annotations();
        annotations.insert(INGRESS_CLASS.into(), "traefik".into());
        assert_eq!(decode(&meta(annotations)), Err(ValidationError::NotManaged));
    }

    #[test]
    fn test_decode_missing_auth_url() {
        assert_eq!(decode(&without(AUTH_URL)), Err(ValidationError::MissingField("auth_url")));
    }

    #[test]
    fn test_decode_missing_auth_signin() {
        assert_eq!(decode(&without(AUTH_SIGNIN)), Err(ValidationError::MissingField("auth_signin")));
    }

    #[test]
    fn test_decode_missing_app_name() {
        assert_eq!(decode(&without(APP_NAME)), Err(ValidationError::MissingField("app_name")));
    }

    #[test]
    fn test_decode_missing_organization() {
        assert_eq!(decode(&without(GITHUB_ORG)), Err(ValidationError::MissingField("organization")));
    }

    #[test]
    fn test_decode_missing_teams() {
        assert_eq!(decode(&without(GITHUB_TEAMS)), Err(ValidationError::MissingField("teams")));
    }

    #[test]
    fn test_decode_reports_first_missing_key() {
        let mut annotations = annotations();
        annotations.remove(AUTH_SIGNIN);
        annotations.remove(GITHUB_TEAMS);
        assert_eq!(decode(&meta(annotations)), Err(ValidationError::MissingField("auth_signin")));
    }

    #[test]
    fn test_decode_empty_app_name() {
        let mut annotations = annotations();
        annotations.insert(APP_NAME.into(), "".into());
        assert_eq!(decode(&meta(annotations)), Err(ValidationError::EmptyField("app_name")));
    }

    #[test]
    fn test_decode_teams_verbatim() {
        let mut annotations = annotations();
        annotations.insert(GITHUB_TEAMS.into(), "core, ops,core".into());
        let settings = decode(&meta(annotations)).unwrap();

        assert_eq!(settings.teams, vec!["core", " ops", "core"]);
    }

    #[test]
    fn test_decode_empty_teams() {
        let mut annotations = annotations();
        annotations.insert(GITHUB_TEAMS.into(), "".into());
        let settings = decode(&meta(annotations)).unwrap();

        assert_eq!(settings.teams, vec![""]);
    }
}
