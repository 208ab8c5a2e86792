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

use opm_common::config::{Environment, IngressOptions, DEFAULT_IMAGE, DEFAULT_INGRESS_CLASS, DEFAULT_NAMESPACE};
use opm_common::settings::Provider;
use tracing::Level;

/// The configuration parameters for the application.
///
/// These can either be passed on the command line, or pulled from environment variables.
/// The latter is preferred as environment variables are one of the recommended ways to
/// get configuration from Kubernetes Secrets in deployment.
///
/// For development convenience, these can also be read from a `.env` file in the working
/// directory where the application is started.
#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The domain oauth2-proxy instances are exposed on.
    #[clap(long, env = "OAUTH2_PROXY_DOMAIN")]
    pub domain: String,

    #[clap(long, env = "COOKIE_DOMAIN", default_value = "")]
    pub cookie_domain: String,

    /// Salt mixed into every generated cookie secret.
    #[clap(long, env = "COOKIE_SALT", hide_env_values = true)]
    pub cookie_salt: String,

    #[clap(long, env = "WHITELIST_DOMAIN", default_value = "")]
    pub whitelist_domain: String,

    /// The identity provider, only `github` is supported.
    #[clap(long, env = "PROVIDER", default_value = "github")]
    pub provider: Provider,

    #[clap(long, env = "OAUTH2_PROXY_CLIENT_ID")]
    pub client_id: String,

    #[clap(long, env = "OAUTH2_PROXY_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// The class of the shared ingress, `nginx` when empty.
    #[clap(long, env = "INGRESS_CLASS")]
    pub ingress_class: Option<String>,

    #[clap(long, env = "TLS_SECRET_NAME")]
    pub tls_secret_name: Option<String>,

    /// Comma separated hosts covered by the TLS secret.
    #[clap(long, env = "TLS_HOSTS")]
    pub tls_hosts: Option<String>,

    /// The namespace the oauth2-proxy resources are created in.
    #[clap(long, env = "OAUTH2_PROXY_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    #[clap(long, env = "OAUTH2_PROXY_IMAGE", default_value = DEFAULT_IMAGE)]
    pub image: String,

    #[clap(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: Level,

    /// Any non-empty value turns on debug logging, whatever `LOG_LEVEL` says.
    #[clap(long, env = "DEBUG")]
    pub debug: Option<String>,
}

impl Config {
    /// The most verbose level the subscriber lets through.
    pub fn max_level(&self) -> Level {
        match &self.debug {
            Some(debug) if !debug.is_empty() => Level::DEBUG,
            _ => self.log_level,
        }
    }

    /// The settings every generated resource is built from.
    pub fn environment(&self) -> Environment {
        let class = match &self.ingress_class {
            Some(class) if !class.is_empty() => class.clone(),
            _ => DEFAULT_INGRESS_CLASS.into(),
        };
        let tls_hosts = match &self.tls_hosts {
            Some(hosts) if !hosts.is_empty() => hosts.split(',').map(String::from).collect(),
            _ => vec![],
        };

        Environment {
            namespace: self.namespace.clone(),
            domain: self.domain.clone(),
            cookie_domain: self.cookie_domain.clone(),
            cookie_salt: self.cookie_salt.clone(),
            whitelist_domain: self.whitelist_domain.clone(),
            provider: self.provider,
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            image: self.image.clone(),
            ingress: IngressOptions { class, tls_secret_name: self.tls_secret_name.clone(), tls_hosts },
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    const REQUIRED: [&str; 7] = [
        "oauth2-proxy-manager",
        "--domain=auth.example.com",
        "--cookie-salt=salt",
        "--client-id=id",
        "--client-secret=secret",
        "--namespace=oauth2-proxy",
        "--log-level=debug",
    ];

    #[test]
    fn test_environment_defaults() {
        let config = Config::try_parse_from(REQUIRED).unwrap();
        let env = config.environment();

        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(env.domain, "auth.example.com");
        assert_eq!(env.provider, Provider::GitHub);
        assert_eq!(env.image, DEFAULT_IMAGE);
        assert_eq!(env.ingress, IngressOptions::default());
    }

    #[test]
    fn test_environment_ingress_options() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--ingress-class=", "--tls-secret-name=wildcard", "--tls-hosts=a.example.com,b.example.com"]);
        let env = Config::try_parse_from(args).unwrap().environment();

        assert_eq!(env.ingress.class, "nginx");
        assert_eq!(env.ingress.tls_hosts, vec!["a.example.com", "b.example.com"]);
        assert!(env.ingress.tls().is_some());
    }

    #[test]
    fn test_max_level() {
        let mut args = REQUIRED.to_vec();
        args.retain(|arg| !arg.starts_with("--log-level"));
        args.push("--log-level=warn");
        assert_eq!(Config::try_parse_from(args.clone()).unwrap().max_level(), Level::WARN);

        args.push("--debug=1");
        assert_eq!(Config::try_parse_from(args.clone()).unwrap().max_level(), Level::DEBUG);
    }

    #[test]
    fn test_unsupported_provider() {
        let mut args = REQUIRED.to_vec();
        args.push("--provider=gitlab");
        assert!(Config::try_parse_from(args).is_err());
    }
}
