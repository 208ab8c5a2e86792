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

use crate::settings::Provider;

pub const DEFAULT_NAMESPACE: &str = "oauth2-proxy";
pub const DEFAULT_IMAGE: &str = "quay.io/pusher/oauth2_proxy:v3.2.0";
pub const DEFAULT_INGRESS_CLASS: &str = "nginx";

/// Cluster-wide settings every generated resource is built from.
///
/// Built once at startup and handed to the reconciler, so resource builders
/// stay pure functions of (settings, environment).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Environment {
    /// Namespace holding every resource the manager owns.
    pub namespace: String,
    /// Host of the shared ingress, also used in redirect urls.
    pub domain: String,
    pub cookie_domain: String,
    pub cookie_salt: String,
    pub whitelist_domain: String,
    pub provider: Provider,
    pub client_id: String,
    pub client_secret: String,
    pub image: String,
    pub ingress: IngressOptions,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngressOptions {
    pub class: String,
    pub tls_secret_name: Option<String>,
    pub tls_hosts: Vec<String>,
}

impl IngressOptions {
    /// TLS is only configured when both a secret and at least one host are known.
    pub fn tls(&self) -> Option<(&str, &[String])> {
        match &self.tls_secret_name {
            Some(name) if !name.is_empty() && !self.tls_hosts.is_empty() => {
                Some((name.as_str(), self.tls_hosts.as_slice()))
            }
            _ => None,
        }
    }
}

impl Default for IngressOptions {
    fn default() -> Self {
        IngressOptions { class: DEFAULT_INGRESS_CLASS.into(), tls_secret_name: None, tls_hosts: vec![] }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            namespace: DEFAULT_NAMESPACE.into(),
            domain: String::new(),
            cookie_domain: String::new(),
            cookie_salt: String::new(),
            whitelist_domain: String::new(),
            provider: Provider::GitHub,
            client_id: String::new(),
            client_secret: String::new(),
            image: DEFAULT_IMAGE.into(),
            ingress: IngressOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_requires_secret_and_hosts() {
        let mut options = IngressOptions::default();
        assert!(options.tls().is_none());

        options.tls_secret_name = Some("tls".into());
        assert!(options.tls().is_none());

        options.tls_hosts = vec!["a.example.com".into()];
        assert_eq!(options.tls(), Some(("tls", &["a.example.com".to_string()][..])));
    }
}
